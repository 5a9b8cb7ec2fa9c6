use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::error::OpenHoursError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Business {
    business_id: i64,
    name: String,
}

/// A business together with whether it currently has an active schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BusinessSummary {
    pub business_id: i64,
    pub name: String,
    pub has_active_schedule: bool,
    pub generation_count: i64,
}

impl Business {
    pub fn business_id(&self) -> i64 {
        self.business_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Self>, OpenHoursError> {
        conn.query_row(
            "SELECT business_id, name FROM businesses WHERE name = ?",
            [name],
            |row| {
                Ok(Business {
                    business_id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(OpenHoursError::DatabaseError)
    }

    /// Look up a business by its exact name, creating it if absent.
    ///
    /// IMPORTANT: Caller must hold an immediate transaction
    pub fn get_or_create_immediate(conn: &Connection, name: &str) -> Result<Self, OpenHoursError> {
        conn.execute("INSERT OR IGNORE INTO businesses (name) VALUES (?)", [name])?;

        let business_id: i64 = conn.query_row(
            "SELECT business_id FROM businesses WHERE name = ?",
            [name],
            |row| row.get(0),
        )?;

        Ok(Business {
            business_id,
            name: name.to_owned(),
        })
    }

    /// All businesses ordered by name, with their active-schedule status.
    pub fn list(conn: &Connection) -> Result<Vec<BusinessSummary>, OpenHoursError> {
        let mut stmt = conn.prepare(
            "SELECT
                b.business_id,
                b.name,
                COALESCE(SUM(g.is_active), 0),
                COUNT(g.generation_id)
            FROM businesses b
            LEFT JOIN schedule_generations g ON g.business_id = b.business_id
            GROUP BY b.business_id, b.name
            ORDER BY b.name ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(BusinessSummary {
                business_id: row.get(0)?,
                name: row.get(1)?,
                has_active_schedule: row.get::<_, i64>(2)? > 0,
                generation_count: row.get(3)?,
            })
        })?;

        let results: Result<Vec<_>, _> = rows.collect();
        results.map_err(OpenHoursError::DatabaseError)
    }
}
