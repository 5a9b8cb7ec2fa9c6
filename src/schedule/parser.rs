use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;

use super::{DaySchedule, Rule, ScheduleParser};
use crate::day::Day;
use crate::error::ParseError;
use crate::time_of_day::{parse_time, TimeOfDay};

/// Parse an opening-hours specification into a normalized [`DaySchedule`].
///
/// `spec` is one or more clauses separated by `/`. Each clause is a day or
/// day range followed by one or more comma-separated time ranges:
///
/// ```
/// use openhours::day::Day;
/// use openhours::schedule::parse_schedule;
///
/// let schedule = parse_schedule("Mon-Fri 9am-5pm / Sat 10am - 2pm, 6pm-1am").unwrap();
/// assert_eq!(schedule.intervals(Day::Wed).len(), 1);
/// assert_eq!(schedule.intervals(Day::Sat).len(), 2);
/// assert_eq!(schedule.intervals(Day::Sun).len(), 1); // 00:00-01:00 carried over
/// ```
pub fn parse_schedule(spec: &str) -> Result<DaySchedule, ParseError> {
    let schedule_pair = ScheduleParser::parse(Rule::schedule, spec)
        .map_err(|e| {
            let column = match e.line_col {
                LineColLocation::Pos((_, col)) => col,
                LineColLocation::Span((_, col), _) => col,
            };
            ParseError::MalformedSchedule(format!(
                "'{}' cannot be read as day and time ranges (at column {})",
                spec, column
            ))
        })?
        .next()
        .ok_or_else(|| ParseError::MalformedSchedule(format!("'{}' is empty", spec)))?;

    let mut schedule = DaySchedule::new();

    for clause in schedule_pair.into_inner() {
        match clause.as_rule() {
            Rule::clause => apply_clause(&mut schedule, clause)?,
            Rule::EOI => {}
            rule => {
                return Err(ParseError::MalformedSchedule(format!(
                    "unexpected {:?} in '{}'",
                    rule, spec
                )))
            }
        }
    }

    Ok(schedule)
}

fn apply_clause(schedule: &mut DaySchedule, clause: Pair<Rule>) -> Result<(), ParseError> {
    let clause_str = clause.as_str().trim().to_owned();
    let mut inner = clause.into_inner();

    let day_range = inner
        .next()
        .ok_or_else(|| ParseError::MalformedSchedule(format!("missing days in '{}'", clause_str)))?;
    let days = expand_day_range(day_range)?;

    for time_range in inner {
        let (open, close) = parse_time_range(time_range, &clause_str)?;
        for day in &days {
            schedule.add_range(*day, open, close);
        }
    }

    Ok(())
}

fn expand_day_range(day_range: Pair<Rule>) -> Result<Vec<Day>, ParseError> {
    let mut tokens = day_range.into_inner();
    let start = match tokens.next() {
        Some(token) => Day::from_token(token.as_str())?,
        None => return Err(ParseError::MalformedSchedule("missing day".to_owned())),
    };

    match tokens.next() {
        Some(token) => Ok(Day::range(start, Day::from_token(token.as_str())?)),
        None => Ok(vec![start]),
    }
}

fn parse_time_range(
    time_range: Pair<Rule>,
    clause_str: &str,
) -> Result<(TimeOfDay, TimeOfDay), ParseError> {
    let mut times = time_range.into_inner();
    match (times.next(), times.next()) {
        (Some(open), Some(close)) => Ok((parse_time(open.as_str())?, parse_time(close.as_str())?)),
        _ => Err(ParseError::MalformedSchedule(format!(
            "incomplete time range in '{}'",
            clause_str
        ))),
    }
}
