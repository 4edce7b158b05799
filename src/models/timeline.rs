use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TimelineEventType;

/// Append-only health timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: TimelineEventType,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTimelineEvent {
    pub event_type: TimelineEventType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub metadata: serde_json::Value,
}
