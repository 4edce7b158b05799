//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table family. All public functions are re-exported
//! here so callers only import `crate::db::repository::*`.
//!
//! Column conventions: ids are TEXT uuids, instants are RFC 3339 with
//! nanoseconds in UTC (lexicographically sortable), dates are `%Y-%m-%d`,
//! and tag lists are JSON arrays.

mod appointment;
mod emergency_contact;
mod hospital;
mod insurance;
mod orders;
mod profile;
mod setting;
mod timeline;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;

pub use appointment::*;
pub use emergency_contact::*;
pub use hospital::*;
pub use insurance::*;
pub use orders::*;
pub use profile::*;
pub use setting::*;
pub use timeline::*;

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("invalid uuid '{raw}': {e}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("invalid timestamp '{raw}': {e}")))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("invalid date '{raw}': {e}")))
}

pub(crate) fn fmt_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn tags_to_json(tags: &[String]) -> Result<String, DatabaseError> {
    Ok(serde_json::to_string(tags)?)
}

pub(crate) fn tags_from_json(raw: &str) -> Result<Vec<String>, DatabaseError> {
    Ok(serde_json::from_str(raw)?)
}

/// Move a row's `status` from `from` to `to` in one statement.
///
/// Returns false when the stored status is no longer `from`, i.e. another
/// connection advanced the row after it was read. Callers re-read and guard
/// again; status graphs are acyclic, so that retry loop always ends.
pub(crate) fn swap_status(
    conn: &Connection,
    table: &str,
    id: &Uuid,
    from: &str,
    to: &str,
    now: &DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        &format!("UPDATE {table} SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2"),
        params![id.to_string(), from, to, fmt_timestamp(now)],
    )?;
    Ok(changed == 1)
}
