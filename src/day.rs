use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::Serialize;

use crate::error::ParseError;

/// Day of the week. Ordered Mon..Sun; `next` wraps Sun back to Mon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(i32)]
pub enum Day {
    Mon = 0,
    Tue = 1,
    Wed = 2,
    Thu = 3,
    Fri = 4,
    Sat = 5,
    Sun = 6,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Mon),
            1 => Some(Self::Tue),
            2 => Some(Self::Wed),
            3 => Some(Self::Thu),
            4 => Some(Self::Fri),
            5 => Some(Self::Sat),
            6 => Some(Self::Sun),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Day {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
            Day::Sun => "Sun",
        }
    }

    /// Resolve a human day token. Only the first three characters matter and
    /// case is ignored, so "Monday", "mon" and "MON" all resolve to `Mon`.
    pub fn from_token(token: &str) -> Result<Day, ParseError> {
        let mut prefix = token.trim().chars().take(3);
        let capitalized: String = match prefix.next() {
            Some(first) => first
                .to_uppercase()
                .chain(prefix.flat_map(char::to_lowercase))
                .collect(),
            None => return Err(ParseError::UnknownDay(token.to_owned())),
        };

        Self::ALL
            .into_iter()
            .find(|day| day.abbrev() == capitalized)
            .ok_or_else(|| ParseError::UnknownDay(token.to_owned()))
    }

    /// Expand an inclusive day range over the weekly cycle.
    ///
    /// When `start` comes after `end` in Mon..Sun order the range wraps through
    /// the end of the week: `Sat-Mon` is `[Sat, Sun, Mon]`. A reversed range
    /// typed by mistake is indistinguishable from an intended wrap.
    pub fn range(start: Day, end: Day) -> Vec<Day> {
        let (start_index, end_index) = (start.index(), end.index());
        if start_index <= end_index {
            Self::ALL[start_index..=end_index].to_vec()
        } else {
            Self::ALL[start_index..]
                .iter()
                .chain(Self::ALL[..=end_index].iter())
                .copied()
                .collect()
        }
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl FromStr for Day {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::from_token(s)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_conversion() {
        assert_eq!(Day::from_i32(0), Some(Day::Mon));
        assert_eq!(Day::from_i32(6), Some(Day::Sun));
        assert_eq!(Day::from_i32(7), None);
        assert_eq!(Day::from_i32(-1), None);
        assert_eq!(Day::Fri.as_i32(), 4);
    }

    #[test]
    fn test_next_wraps_at_end_of_week() {
        assert_eq!(Day::Mon.next(), Day::Tue);
        assert_eq!(Day::Sat.next(), Day::Sun);
        assert_eq!(Day::Sun.next(), Day::Mon);
    }

    #[test]
    fn test_from_token_uses_first_three_chars() {
        assert_eq!(Day::from_token("Monday"), Ok(Day::Mon));
        assert_eq!(Day::from_token("mon"), Ok(Day::Mon));
        assert_eq!(Day::from_token("MON"), Ok(Day::Mon));
        assert_eq!(Day::from_token("thursday"), Ok(Day::Thu));
        assert_eq!(Day::from_token("SUNDAY"), Ok(Day::Sun));
        assert_eq!("Wed".parse::<Day>(), Ok(Day::Wed));
    }

    #[test]
    fn test_from_token_rejects_unknown() {
        assert_eq!(
            Day::from_token("Xyz"),
            Err(ParseError::UnknownDay("Xyz".to_string()))
        );
        assert_eq!(Day::from_token(""), Err(ParseError::UnknownDay(String::new())));
        assert!(Day::from_token("Mo").is_err());
        assert!(Day::from_token("10am").is_err());
    }

    #[test]
    fn test_range_contiguous() {
        assert_eq!(
            Day::range(Day::Mon, Day::Fri),
            vec![Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri]
        );
        assert_eq!(Day::range(Day::Wed, Day::Wed), vec![Day::Wed]);
        assert_eq!(Day::range(Day::Mon, Day::Sun), Day::ALL.to_vec());
    }

    #[test]
    fn test_range_wraps_around_week() {
        assert_eq!(
            Day::range(Day::Sat, Day::Mon),
            vec![Day::Sat, Day::Sun, Day::Mon]
        );
        assert_eq!(Day::range(Day::Sun, Day::Mon), vec![Day::Sun, Day::Mon]);
        // Reversed "typo" ranges also wrap
        assert_eq!(Day::range(Day::Fri, Day::Mon).len(), 4);
        assert_eq!(Day::range(Day::Tue, Day::Mon).len(), 7);
    }

    #[test]
    fn test_from_weekday() {
        assert_eq!(Day::from(Weekday::Mon), Day::Mon);
        assert_eq!(Day::from(Weekday::Sun), Day::Sun);
    }
}
