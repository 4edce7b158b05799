use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_timestamp, parse_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::TimelineEventType;
use crate::models::{NewTimelineEvent, TimelineEvent};

/// Timeline rows are never updated; every change is a new event.
pub fn append_timeline_event(
    conn: &Connection,
    user_id: &Uuid,
    event: NewTimelineEvent,
    now: &DateTime<Utc>,
) -> Result<TimelineEvent, DatabaseError> {
    if event.title.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "timeline event title cannot be empty".into(),
        ));
    }

    let stored = TimelineEvent {
        id: Uuid::new_v4(),
        user_id: *user_id,
        event_type: event.event_type,
        title: event.title.trim().to_string(),
        description: event.description,
        event_date: event.event_date,
        metadata: event.metadata,
        created_at: *now,
    };

    conn.execute(
        "INSERT INTO timeline_events (id, user_id, event_type, title, description, event_date, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            stored.id.to_string(),
            stored.user_id.to_string(),
            stored.event_type.as_str(),
            stored.title,
            stored.description,
            stored.event_date.to_string(),
            serde_json::to_string(&stored.metadata)?,
            fmt_timestamp(&stored.created_at),
        ],
    )?;
    Ok(stored)
}

/// Events for a user, newest first. Both bounds are inclusive and optional.
pub fn list_timeline_events(
    conn: &Connection,
    user_id: &Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<TimelineEvent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, event_type, title, description, event_date, metadata, created_at
         FROM timeline_events
         WHERE user_id = ?1
           AND (?2 IS NULL OR event_date >= ?2)
           AND (?3 IS NULL OR event_date <= ?3)
         ORDER BY event_date DESC, created_at DESC",
    )?;

    let rows = stmt.query_map(
        params![
            user_id.to_string(),
            from.map(|d| d.to_string()),
            to.map(|d| d.to_string()),
        ],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        },
    )?;

    let mut events = Vec::new();
    for row in rows {
        let (id, user_id, event_type, title, description, event_date, metadata, created_at) = row?;
        events.push(TimelineEvent {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            event_type: event_type.parse::<TimelineEventType>()?,
            title,
            description,
            event_date: parse_date(&event_date)?,
            metadata: serde_json::from_str(&metadata)?,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(events)
}
