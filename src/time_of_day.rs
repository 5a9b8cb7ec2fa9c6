use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use crate::error::ParseError;

const SECONDS_PER_DAY: u32 = 86_400;

/// A time of day in `[00:00:00, 24:00:00)` with second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    secs: u32,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { secs: 0 };

    /// Closing time given to the first half of an interval that runs past midnight.
    pub const END_OF_DAY: TimeOfDay = TimeOfDay {
        secs: SECONDS_PER_DAY - 1,
    };

    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        Some(TimeOfDay {
            secs: hour * 3600 + minute * 60 + second,
        })
    }

    /// Inverse of [`TimeOfDay::seconds_from_midnight`]; `None` outside a single day.
    pub fn from_seconds(secs: i64) -> Option<Self> {
        u32::try_from(secs)
            .ok()
            .filter(|s| *s < SECONDS_PER_DAY)
            .map(|secs| TimeOfDay { secs })
    }

    pub fn seconds_from_midnight(self) -> i64 {
        i64::from(self.secs)
    }

    pub fn hour(self) -> u32 {
        self.secs / 3600
    }

    pub fn minute(self) -> u32 {
        (self.secs % 3600) / 60
    }

    pub fn second(self) -> u32 {
        self.secs % 60
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        TimeOfDay {
            secs: time.num_seconds_from_midnight(),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Parse a human time token into a [`TimeOfDay`].
///
/// Accepted forms, case-insensitive with all whitespace removed first:
/// `5:30pm`, `9am` (12-hour) and `14:00`, `21` (24-hour). A trailing
/// meridiem selects the 12-hour branch, a colon selects the minutes form.
pub fn parse_time(token: &str) -> Result<TimeOfDay, ParseError> {
    let malformed = || ParseError::MalformedTime(token.to_owned());

    let cleaned: String = token
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let (body, meridiem) = if let Some(body) = cleaned.strip_suffix("am") {
        (body, Some(Meridiem::Am))
    } else if let Some(body) = cleaned.strip_suffix("pm") {
        (body, Some(Meridiem::Pm))
    } else {
        (cleaned.as_str(), None)
    };

    let (hour_part, minute_part) = match body.split_once(':') {
        Some((hour, minute)) => (hour, Some(minute)),
        None => (body, None),
    };

    let hour = parse_digits(hour_part, 1..=2).ok_or_else(malformed)?;
    let minute = match minute_part {
        Some(minute) => parse_digits(minute, 2..=2).ok_or_else(malformed)?,
        None => 0,
    };

    let hour = match meridiem {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return Err(malformed());
            }
            match meridiem {
                Meridiem::Am => hour % 12,
                Meridiem::Pm => hour % 12 + 12,
            }
        }
        None => hour,
    };

    TimeOfDay::from_hms(hour, minute, 0).ok_or_else(malformed)
}

/// Parse an all-ASCII-digit string whose length lies within `len`.
fn parse_digits(s: &str, len: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !len.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::from_hms(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_parse_time_accepted_forms() {
        assert_eq!(parse_time("9am").unwrap(), t(9, 0));
        assert_eq!(parse_time("5:30pm").unwrap(), t(17, 30));
        assert_eq!(parse_time("14:00").unwrap(), t(14, 0));
        assert_eq!(parse_time("21").unwrap(), t(21, 0));
        assert_eq!(parse_time("0").unwrap(), TimeOfDay::MIDNIGHT);
        assert_eq!(parse_time("7:05").unwrap(), t(7, 5));
    }

    #[test]
    fn test_parse_time_twelve_hour_wraparound() {
        assert_eq!(parse_time("12am").unwrap(), TimeOfDay::MIDNIGHT);
        assert_eq!(parse_time("12pm").unwrap(), t(12, 0));
        assert_eq!(parse_time("12:30am").unwrap(), t(0, 30));
        assert_eq!(parse_time("11:59pm").unwrap(), t(23, 59));
    }

    #[test]
    fn test_parse_time_case_and_whitespace() {
        assert_eq!(parse_time("9 PM").unwrap(), t(21, 0));
        assert_eq!(parse_time(" 9:15 Am ").unwrap(), t(9, 15));
        assert_eq!(parse_time("11:30 pm").unwrap(), t(23, 30));
    }

    #[test]
    fn test_parse_time_rejects_invalid() {
        for token in [
            "25:00", "13:60", "", "invalid", "24", "0am", "13pm", "9:5pm", "9:", ":30", "-1",
            "9amx", "1:2:3", "123",
        ] {
            assert_eq!(
                parse_time(token),
                Err(ParseError::MalformedTime(token.to_string())),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_display_and_seconds() {
        let time = t(17, 30);
        assert_eq!(time.to_string(), "17:30:00");
        assert_eq!(TimeOfDay::END_OF_DAY.to_string(), "23:59:59");
        assert_eq!(time.seconds_from_midnight(), 63_000);
        assert_eq!(TimeOfDay::from_seconds(63_000), Some(time));
        assert_eq!(TimeOfDay::from_seconds(86_400), None);
        assert_eq!(TimeOfDay::from_seconds(-1), None);
    }

    #[test]
    fn test_from_naive_time() {
        let naive = NaiveTime::from_hms_opt(8, 45, 12).unwrap();
        assert_eq!(TimeOfDay::from(naive), TimeOfDay::from_hms(8, 45, 12).unwrap());
    }

    proptest! {
        #[test]
        fn prop_twenty_four_hour_form_round_trips(hour in 0u32..24, minute in 0u32..60) {
            let parsed = parse_time(&format!("{:02}:{:02}", hour, minute)).unwrap();
            prop_assert_eq!(parsed, t(hour, minute));
        }

        #[test]
        fn prop_twelve_hour_form_matches_twenty_four_hour(hour in 0u32..24, minute in 0u32..60) {
            let display_hour = if hour % 12 == 0 { 12 } else { hour % 12 };
            let meridiem = if hour < 12 { "am" } else { "pm" };
            let token = format!("{}:{:02}{}", display_hour, minute, meridiem);
            let parsed = parse_time(&token).unwrap();
            prop_assert_eq!(parsed, t(hour, minute));
        }
    }
}
