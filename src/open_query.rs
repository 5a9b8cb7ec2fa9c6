use std::collections::BTreeSet;

use log::{warn, Level};
use logging_timer::timer;
use serde::Serialize;

use crate::database::Database;
use crate::day::Day;
use crate::error::OpenHoursError;
use crate::generations::{load_active, LoadedSchedule};
use crate::time_of_day::TimeOfDay;

/// A business whose stored schedule could not be evaluated. The rest of the
/// query is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleWarning {
    pub business_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpenResult {
    pub open: BTreeSet<String>,
    pub warnings: Vec<ScheduleWarning>,
}

impl OpenResult {
    pub fn contains(&self, business_name: &str) -> bool {
        self.open.contains(business_name)
    }
}

/// Names of the businesses open at `time` on `day`, evaluated against one
/// snapshot of the active schedules.
pub fn is_open(db: &Database, day: Day, time: TimeOfDay) -> Result<OpenResult, OpenHoursError> {
    let _tmr = timer!(Level::Trace; "is_open", "{} {}", day, time);

    let conn = db.get_connection()?;
    let schedules = load_active(&conn)?;

    Ok(open_businesses(&schedules, day, time))
}

/// Evaluate already-loaded schedules. A business is open when any of its
/// intervals for `day` satisfies `open <= time < close`.
pub fn open_businesses(schedules: &[LoadedSchedule], day: Day, time: TimeOfDay) -> OpenResult {
    let mut result = OpenResult::default();

    for loaded in schedules {
        match &loaded.schedule {
            Ok(schedule) => {
                if schedule.is_open_at(day, time) {
                    result.open.insert(loaded.business_name.clone());
                }
            }
            Err(e) => {
                warn!(
                    "Error processing schedule for '{}': {}",
                    loaded.business_name, e
                );
                result.warnings.push(ScheduleWarning {
                    business_name: loaded.business_name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    result
}
