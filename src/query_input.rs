use crate::day::Day;
use crate::error::ParseError;
use crate::time_of_day::{parse_time, TimeOfDay};

/// Split free text such as `"Mon 10am"` or `"Monday 9:15 PM"` into a day and a
/// time. The day is everything before the first run of whitespace, the time is
/// the remainder.
pub fn parse_query(input: &str) -> Result<(Day, TimeOfDay), ParseError> {
    let trimmed = input.trim();
    let (day_token, time_token) = trimmed
        .split_once(char::is_whitespace)
        .ok_or_else(|| ParseError::MalformedTime(trimmed.to_owned()))?;

    let day = Day::from_token(day_token)?;
    let time = parse_time(time_token.trim_start())?;

    Ok((day, time))
}
