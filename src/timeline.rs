//! Health timeline view: events grouped by calendar day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository::list_timeline_events;
use crate::db::DatabaseError;
use crate::models::enums::TimelineEventType;
use crate::models::TimelineEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub event_types: Option<Vec<TimelineEventType>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineData {
    pub days: Vec<TimelineDay>,
    pub total_events: usize,
}

/// Newest day first. Within a day, events keep the order they came in.
pub fn group_by_day(events: Vec<TimelineEvent>) -> Vec<TimelineDay> {
    let mut by_day: BTreeMap<NaiveDate, Vec<TimelineEvent>> = BTreeMap::new();
    for event in events {
        by_day.entry(event.event_date).or_default().push(event);
    }
    by_day
        .into_iter()
        .rev()
        .map(|(date, events)| TimelineDay { date, events })
        .collect()
}

pub fn get_timeline_data(
    conn: &Connection,
    user_id: &Uuid,
    filter: &TimelineFilter,
) -> Result<TimelineData, DatabaseError> {
    let mut events = list_timeline_events(conn, user_id, filter.from, filter.to)?;
    if let Some(ref types) = filter.event_types {
        events.retain(|e| types.contains(&e.event_type));
    }
    let total_events = events.len();
    Ok(TimelineData {
        days: group_by_day(events),
        total_events,
    })
}
