//! Registry and attendance log store operations
//!
//! Every operation re-reads current state; callers hold no cached copies
//! across scans. The open-record invariant (at most one row per name with
//! `time_out IS NULL`) is enforced here, backed by a partial unique index.

use crate::db::models::{AttendanceRecord, User};
use crate::events::AttendanceAction;
use crate::Result;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

/// Look up a registered user by tag code. Exact match, as provisioned.
pub async fn lookup_user(pool: &SqlitePool, hexcode: &str) -> Result<Option<User>> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT hexcode, name, email FROM users WHERE hexcode = ?")
            .bind(hexcode)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(hexcode, name, email)| User {
        hexcode,
        name,
        email,
    }))
}

/// Whether `name` currently has an open record (is considered present).
pub async fn has_open_record(pool: &SqlitePool, name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM logs WHERE name = ? AND time_out IS NULL)",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Toggle attendance for `name` in a single transaction.
///
/// Closes the open record if one exists (Time Out); otherwise inserts a new
/// open record (Time In). Callers never need to check state first.
pub async fn toggle_attendance(
    pool: &SqlitePool,
    name: &str,
    now: NaiveDateTime,
) -> Result<AttendanceAction> {
    let mut tx = pool.begin().await?;

    let closed = sqlx::query("UPDATE logs SET time_out = ? WHERE name = ? AND time_out IS NULL")
        .bind(now)
        .bind(name)
        .execute(&mut *tx)
        .await?;

    let action = if closed.rows_affected() > 0 {
        AttendanceAction::TimeOut
    } else {
        sqlx::query("INSERT INTO logs (name, time_in) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        AttendanceAction::TimeIn
    };

    tx.commit().await?;
    Ok(action)
}

/// Full attendance log, most recent time-in first.
pub async fn list_records(pool: &SqlitePool) -> Result<Vec<AttendanceRecord>> {
    let rows: Vec<(i64, String, NaiveDateTime, Option<NaiveDateTime>)> = sqlx::query_as(
        "SELECT id, name, time_in, time_out FROM logs ORDER BY time_in DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, time_in, time_out)| AttendanceRecord {
            id,
            name,
            time_in,
            time_out,
        })
        .collect())
}
