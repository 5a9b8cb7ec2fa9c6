use log::{debug, info, warn, Level};
use logging_timer::timer;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::businesses::Business;
use crate::database::Database;
use crate::day::Day;
use crate::error::{OpenHoursError, ParseError};
use crate::schedule::{parse_schedule, DaySchedule, Interval};
use crate::time_of_day::TimeOfDay;

/// One `(business name, schedule text)` pair as handed over by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub name: String,
    pub schedule: String,
}

impl ScheduleRecord {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        ScheduleRecord {
            name: name.into(),
            schedule: schedule.into(),
        }
    }
}

/// One version of a business's schedule. Generations are never deleted; at
/// most one per business is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleGeneration {
    pub generation_id: i64,
    pub business_id: i64,
    pub raw_spec: String,
    pub is_active: bool,
    pub created_at: i64, // Unix timestamp (UTC)
}

/// The active schedule of one business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSchedule {
    pub business_name: String,
    pub generation_id: i64,
    pub schedule: DaySchedule,
}

/// An active generation as read back from storage. `schedule` is an error
/// when the stored intervals no longer form a valid [`DaySchedule`].
#[derive(Debug, Clone)]
pub struct LoadedSchedule {
    pub business_name: String,
    pub generation_id: i64,
    pub schedule: Result<DaySchedule, ParseError>,
}

impl ScheduleGeneration {
    /// Insert a new active generation and its normalized intervals.
    ///
    /// IMPORTANT: Caller must hold an immediate transaction and must have
    /// deactivated the business's previous generation.
    pub fn create_immediate(
        conn: &Connection,
        business: &Business,
        raw_spec: &str,
        schedule: &DaySchedule,
    ) -> Result<Self, OpenHoursError> {
        let created_at = chrono::Utc::now().timestamp();

        let generation_id: i64 = conn.query_row(
            "INSERT INTO schedule_generations (business_id, raw_spec, is_active, created_at)
             VALUES (?, ?, 1, ?)
             RETURNING generation_id",
            params![business.business_id(), raw_spec, created_at],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare_cached(
            "INSERT INTO schedule_intervals (generation_id, day, position, open_secs, close_secs)
             VALUES (?, ?, ?, ?, ?)",
        )?;

        for day in Day::ALL {
            for (position, interval) in schedule.intervals(day).iter().enumerate() {
                stmt.execute(params![
                    generation_id,
                    day.as_i32(),
                    position as i64,
                    interval.open().seconds_from_midnight(),
                    interval.close().seconds_from_midnight(),
                ])?;
            }
        }

        Ok(ScheduleGeneration {
            generation_id,
            business_id: business.business_id(),
            raw_spec: raw_spec.to_owned(),
            is_active: true,
            created_at,
        })
    }

    /// Clear the active flag on every active generation of a business.
    /// Returns the number of generations deactivated.
    ///
    /// IMPORTANT: Caller must hold an immediate transaction
    pub fn deactivate_for_business_immediate(
        conn: &Connection,
        business_id: i64,
    ) -> Result<usize, OpenHoursError> {
        let rows = conn.execute(
            "UPDATE schedule_generations SET is_active = 0
             WHERE business_id = ? AND is_active = 1",
            [business_id],
        )?;
        Ok(rows)
    }

    /// Every generation for a business, newest first. `None` if the business
    /// is unknown.
    pub fn history(
        conn: &Connection,
        business_name: &str,
    ) -> Result<Option<Vec<Self>>, OpenHoursError> {
        let business = match Business::get_by_name(conn, business_name)? {
            Some(business) => business,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            "SELECT generation_id, business_id, raw_spec, is_active, created_at
             FROM schedule_generations
             WHERE business_id = ?
             ORDER BY generation_id DESC",
        )?;

        let rows = stmt.query_map([business.business_id()], |row| {
            Ok(ScheduleGeneration {
                generation_id: row.get(0)?,
                business_id: row.get(1)?,
                raw_spec: row.get(2)?,
                is_active: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let generations: Result<Vec<_>, _> = rows.collect();
        Ok(Some(generations?))
    }

    /// Rebuild the normalized schedule stored for one generation.
    pub fn load_schedule(
        conn: &Connection,
        generation_id: i64,
    ) -> Result<DaySchedule, OpenHoursError> {
        let mut stmt = conn.prepare(
            "SELECT day, open_secs, close_secs
             FROM schedule_intervals
             WHERE generation_id = ?
             ORDER BY day ASC, position ASC",
        )?;

        let rows = stmt.query_map([generation_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?;

        let mut schedule = DaySchedule::new();
        for row in rows {
            let (day, open_secs, close_secs) = row?;
            let (day, interval) = interval_from_row(day, open_secs, close_secs)?;
            schedule.push(day, interval);
        }

        Ok(schedule)
    }
}

fn interval_from_row(
    day: i64,
    open_secs: i64,
    close_secs: i64,
) -> Result<(Day, Interval), ParseError> {
    let day = i32::try_from(day)
        .ok()
        .and_then(Day::from_i32)
        .ok_or_else(|| ParseError::UnknownDay(day.to_string()))?;

    let bound = |secs: i64| {
        TimeOfDay::from_seconds(secs).ok_or_else(|| {
            ParseError::MalformedSchedule(format!("stored time {} is outside a day", secs))
        })
    };

    let interval = Interval::new(bound(open_secs)?, bound(close_secs)?)?;
    Ok((day, interval))
}

/// Parse `spec` and make it the active schedule for `business_name`,
/// deactivating whatever was active before. Nothing changes if `spec` is invalid.
pub fn ingest(
    db: &Database,
    business_name: &str,
    spec: &str,
) -> Result<ScheduleGeneration, OpenHoursError> {
    let mut created = ingest_batch(db, &[ScheduleRecord::new(business_name, spec)])?;
    created
        .pop()
        .ok_or_else(|| OpenHoursError::Error("Ingest produced no generation".to_string()))
}

/// Ingest a batch of records as a single transaction.
///
/// Every record is validated and parsed before anything is written; any bad
/// record rejects the whole batch and leaves stored schedules untouched.
/// When a business appears more than once, its last record ends up active.
pub fn ingest_batch(
    db: &Database,
    records: &[ScheduleRecord],
) -> Result<Vec<ScheduleGeneration>, OpenHoursError> {
    let _tmr = timer!(Level::Trace; "ingest_batch", "{} records", records.len());

    let mut parsed = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let record_number = index + 1;
        if record.name.trim().is_empty() {
            return Err(OpenHoursError::InvalidRecord(format!(
                "record {}: business name is empty",
                record_number
            )));
        }

        let schedule =
            parse_schedule(&record.schedule).map_err(|source| OpenHoursError::InvalidSpec {
                record: record_number,
                business: record.name.clone(),
                source,
            })?;
        parsed.push((record, schedule));
    }

    let conn = db.get_connection()?;

    let generations = Database::immediate_transaction(&conn, |c| {
        let mut generations = Vec::with_capacity(parsed.len());

        for (record, schedule) in &parsed {
            let business = Business::get_or_create_immediate(c, &record.name)?;
            let deactivated =
                ScheduleGeneration::deactivate_for_business_immediate(c, business.business_id())?;
            let generation =
                ScheduleGeneration::create_immediate(c, &business, &record.schedule, schedule)?;

            debug!(
                "Business '{}': generation {} active, {} previous deactivated",
                business.name(),
                generation.generation_id,
                deactivated
            );
            generations.push(generation);
        }

        Ok(generations)
    })?;

    info!("Ingested {} schedule record(s)", generations.len());
    Ok(generations)
}

/// Read every active generation with its intervals in a single statement, so
/// the result reflects one consistent snapshot of the store.
pub fn load_active(conn: &Connection) -> Result<Vec<LoadedSchedule>, OpenHoursError> {
    let mut stmt = conn.prepare(
        "SELECT b.name, g.generation_id, i.day, i.open_secs, i.close_secs
         FROM schedule_generations g
         INNER JOIN businesses b ON b.business_id = g.business_id
         LEFT JOIN schedule_intervals i ON i.generation_id = g.generation_id
         WHERE g.is_active = 1
         ORDER BY b.name ASC, g.generation_id ASC, i.day ASC, i.position ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, Option<i64>>(2)?,
            row.get::<_, Option<i64>>(3)?,
            row.get::<_, Option<i64>>(4)?,
        ))
    })?;

    let mut loaded: Vec<LoadedSchedule> = Vec::new();

    for row in rows {
        let (business_name, generation_id, day, open_secs, close_secs) = row?;

        let is_new_generation = loaded
            .last()
            .map_or(true, |current| current.generation_id != generation_id);
        if is_new_generation {
            loaded.push(LoadedSchedule {
                business_name,
                generation_id,
                schedule: Ok(DaySchedule::new()),
            });
        }

        let (Some(day), Some(open_secs), Some(close_secs)) = (day, open_secs, close_secs) else {
            continue;
        };

        let Some(current) = loaded.last_mut() else {
            continue;
        };
        if current.schedule.is_err() {
            continue;
        }

        match interval_from_row(day, open_secs, close_secs) {
            Ok((day, interval)) => {
                if let Ok(schedule) = current.schedule.as_mut() {
                    schedule.push(day, interval);
                }
            }
            Err(e) => current.schedule = Err(e),
        }
    }

    Ok(loaded)
}

/// One entry per business that currently has an active generation.
/// Generations whose stored intervals cannot be read are skipped with a warning.
pub fn active_schedules(db: &Database) -> Result<Vec<ActiveSchedule>, OpenHoursError> {
    let conn = db.get_connection()?;

    let active = load_active(&conn)?
        .into_iter()
        .filter_map(|loaded| match loaded.schedule {
            Ok(schedule) => Some(ActiveSchedule {
                business_name: loaded.business_name,
                generation_id: loaded.generation_id,
                schedule,
            }),
            Err(e) => {
                warn!(
                    "Skipping schedule for '{}' (generation {}): {}",
                    loaded.business_name, loaded.generation_id, e
                );
                None
            }
        })
        .collect();

    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DB_FILENAME;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(&dir.path().join(DB_FILENAME), 2).expect("Failed to open db");
        (dir, db)
    }

    fn active_count(db: &Database, business_name: &str) -> i64 {
        let conn = db.get_connection().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM schedule_generations g
             JOIN businesses b ON b.business_id = g.business_id
             WHERE b.name = ? AND g.is_active = 1",
            [business_name],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_ingest_creates_active_generation() {
        let (_dir, db) = open_temp();

        let generation = ingest(&db, "Day Cafe", "Mon-Fri 9am-5pm").unwrap();
        assert!(generation.is_active);
        assert_eq!(generation.raw_spec, "Mon-Fri 9am-5pm");

        let active = active_schedules(&db).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].business_name, "Day Cafe");
        assert_eq!(active[0].generation_id, generation.generation_id);
        assert_eq!(
            active[0].schedule,
            parse_schedule("Mon-Fri 9am-5pm").unwrap()
        );
    }

    #[test]
    fn test_stored_schedule_preserves_prepend_order() {
        let (_dir, db) = open_temp();
        let spec = "Sat 8am-11am / Fri 6pm-2am";
        let generation = ingest(&db, "Late Bar", spec).unwrap();

        let conn = db.get_connection().unwrap();
        let loaded = ScheduleGeneration::load_schedule(&conn, generation.generation_id).unwrap();
        assert_eq!(loaded, parse_schedule(spec).unwrap());
    }

    #[test]
    fn test_reingest_same_spec_is_idempotent() {
        let (_dir, db) = open_temp();

        let first = ingest(&db, "Night Restaurant", "Mon-Sat 6pm-2am").unwrap();
        let second = ingest(&db, "Night Restaurant", "Mon-Sat 6pm-2am").unwrap();
        assert_ne!(first.generation_id, second.generation_id);
        assert_eq!(active_count(&db, "Night Restaurant"), 1);

        let conn = db.get_connection().unwrap();
        assert_eq!(
            ScheduleGeneration::load_schedule(&conn, first.generation_id).unwrap(),
            ScheduleGeneration::load_schedule(&conn, second.generation_id).unwrap()
        );

        let active = active_schedules(&db).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].generation_id, second.generation_id);
    }

    #[test]
    fn test_history_keeps_deactivated_generations() {
        let (_dir, db) = open_temp();

        ingest(&db, "Bakery", "Mon-Fri 7am-3pm").unwrap();
        ingest(&db, "Bakery", "Tue-Sun 6am-2pm").unwrap();

        let conn = db.get_connection().unwrap();
        let history = ScheduleGeneration::history(&conn, "Bakery").unwrap().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].raw_spec, "Tue-Sun 6am-2pm");
        assert!(history[0].is_active);
        assert_eq!(history[1].raw_spec, "Mon-Fri 7am-3pm");
        assert!(!history[1].is_active);

        assert_eq!(ScheduleGeneration::history(&conn, "Unknown").unwrap(), None);
    }

    #[test]
    fn test_bad_record_rejects_whole_batch() {
        let (_dir, db) = open_temp();
        ingest(&db, "Alpha", "Mon-Fri 9am-5pm").unwrap();
        ingest(&db, "Beta", "Sat-Sun 10am-4pm").unwrap();

        let result = ingest_batch(
            &db,
            &[
                ScheduleRecord::new("Alpha", "Mon 8am-8pm"),
                ScheduleRecord::new("Gamma", "Tue 9am-5pm"),
                ScheduleRecord::new("Beta", "Someday 10am-4pm"),
            ],
        );

        match result {
            Err(OpenHoursError::InvalidSpec {
                record,
                business,
                source,
            }) => {
                assert_eq!(record, 3);
                assert_eq!(business, "Beta");
                assert_eq!(source, ParseError::UnknownDay("Someday".to_string()));
            }
            other => panic!("expected InvalidSpec, got {:?}", other),
        }

        let active = active_schedules(&db).unwrap();
        let names: Vec<&str> = active.iter().map(|a| a.business_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert_eq!(active[0].schedule, parse_schedule("Mon-Fri 9am-5pm").unwrap());

        let conn = db.get_connection().unwrap();
        assert_eq!(Business::get_by_name(&conn, "Gamma").unwrap(), None);
    }

    #[test]
    fn test_failed_ingest_keeps_previous_active() {
        let (_dir, db) = open_temp();
        ingest(&db, "Alpha", "Mon-Fri 9am-5pm").unwrap();

        let result = ingest(&db, "Alpha", "Mon-Fri 9am-25:00");
        assert!(matches!(
            result,
            Err(OpenHoursError::InvalidSpec { source: ParseError::MalformedTime(_), .. })
        ));
        assert_eq!(active_count(&db, "Alpha"), 1);
    }

    #[test]
    fn test_empty_name_is_invalid_record() {
        let (_dir, db) = open_temp();
        let result = ingest_batch(&db, &[ScheduleRecord::new("  ", "Mon 9am-5pm")]);
        assert!(matches!(result, Err(OpenHoursError::InvalidRecord(_))));
    }

    #[test]
    fn test_duplicate_business_in_batch_last_wins() {
        let (_dir, db) = open_temp();
        let created = ingest_batch(
            &db,
            &[
                ScheduleRecord::new("Diner", "Mon 9am-5pm"),
                ScheduleRecord::new("Diner", "Tue 9am-5pm"),
            ],
        )
        .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(active_count(&db, "Diner"), 1);

        let active = active_schedules(&db).unwrap();
        assert_eq!(active[0].schedule, parse_schedule("Tue 9am-5pm").unwrap());
    }

    #[test]
    fn test_load_active_reports_corrupt_rows() {
        let (_dir, db) = open_temp();
        ingest(&db, "Good", "Mon 9am-5pm").unwrap();
        let bad = ingest(&db, "Bad", "Mon 9am-5pm").unwrap();

        let conn = db.get_connection().unwrap();
        conn.execute(
            "UPDATE schedule_intervals SET day = 9 WHERE generation_id = ?",
            [bad.generation_id],
        )
        .unwrap();

        let loaded = load_active(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        let bad_loaded = loaded.iter().find(|l| l.business_name == "Bad").unwrap();
        assert_eq!(bad_loaded.schedule, Err(ParseError::UnknownDay("9".to_string())));

        let active = active_schedules(&db).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].business_name, "Good");
    }
}
