//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A registered tag holder. Pre-provisioned externally; the application only
/// reads this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub hexcode: String,
    pub name: String,
    pub email: String,
}

/// One attendance row. `time_out` is NULL while the user is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub name: String,
    pub time_in: NaiveDateTime,
    pub time_out: Option<NaiveDateTime>,
}

impl AttendanceRecord {
    /// Whether this record marks the user as currently present.
    pub fn is_open(&self) -> bool {
        self.time_out.is_none()
    }
}
