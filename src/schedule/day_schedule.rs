use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::day::Day;
use crate::error::ParseError;
use crate::time_of_day::TimeOfDay;

/// A half-open span `[open, close)` on one specific day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    open: TimeOfDay,
    close: TimeOfDay,
}

impl Interval {
    /// Build an interval that satisfies `open < close`.
    pub fn new(open: TimeOfDay, close: TimeOfDay) -> Result<Self, ParseError> {
        if open >= close {
            return Err(ParseError::MalformedSchedule(format!(
                "interval {}-{} does not close after it opens",
                open, close
            )));
        }
        Ok(Interval { open, close })
    }

    pub fn open(&self) -> TimeOfDay {
        self.open
    }

    pub fn close(&self) -> TimeOfDay {
        self.close
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.open <= time && time < self.close
    }
}

/// Normalized weekly schedule: for every day, its intervals in chronological
/// insertion order. Overlapping intervals are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySchedule {
    days: [Vec<Interval>; 7],
}

impl DaySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intervals(&self, day: Day) -> &[Interval] {
        &self.days[day.index()]
    }

    pub(crate) fn push(&mut self, day: Day, interval: Interval) {
        self.days[day.index()].push(interval);
    }

    /// Place `interval` ahead of everything already stored for `day`.
    pub(crate) fn prepend(&mut self, day: Day, interval: Interval) {
        self.days[day.index()].insert(0, interval);
    }

    /// Add an `open`-`close` range for `day`. A range whose close is not after
    /// its open runs past midnight and is split: the part up to
    /// [`TimeOfDay::END_OF_DAY`] stays on `day`, the remainder is prepended to
    /// the following day. A close of exactly midnight leaves nothing to carry.
    pub fn add_range(&mut self, day: Day, open: TimeOfDay, close: TimeOfDay) {
        if close > open {
            self.push(day, Interval { open, close });
            return;
        }

        if open < TimeOfDay::END_OF_DAY {
            self.push(
                day,
                Interval {
                    open,
                    close: TimeOfDay::END_OF_DAY,
                },
            );
        }
        if close > TimeOfDay::MIDNIGHT {
            self.prepend(
                day.next(),
                Interval {
                    open: TimeOfDay::MIDNIGHT,
                    close,
                },
            );
        }
    }

    pub fn is_open_at(&self, day: Day, time: TimeOfDay) -> bool {
        self.intervals(day)
            .iter()
            .any(|interval| interval.contains(time))
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }

    /// Every stored interval with its day, Mon..Sun and in per-day order.
    pub fn iter(&self) -> impl Iterator<Item = (Day, &Interval)> {
        Day::ALL
            .into_iter()
            .flat_map(move |day| self.intervals(day).iter().map(move |iv| (day, iv)))
    }
}

impl Serialize for DaySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Day::ALL.len()))?;
        for day in Day::ALL {
            map.serialize_entry(day.abbrev(), self.intervals(day))?;
        }
        map.end()
    }
}
