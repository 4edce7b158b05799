//! Health timeline: grouped reads and append-only writes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::append_timeline_event;
use crate::models::enums::TimelineEventType;
use crate::models::{NewTimelineEvent, TimelineEvent};
use crate::timeline::{get_timeline_data, TimelineData, TimelineFilter};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimelineQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub event_type: Option<TimelineEventType>,
}

/// `GET /api/users/:user_id/timeline?from=&to=&event_type=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<TimelineData>, ApiError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(ApiError::BadRequest(format!("from ({from}) is after to ({to})")));
        }
    }
    let filter = TimelineFilter {
        from: query.from,
        to: query.to,
        event_types: query.event_type.map(|t| vec![t]),
    };
    let conn = ctx.core.open_db()?;
    Ok(Json(get_timeline_data(&conn, &user_id, &filter)?))
}

/// `POST /api/users/:user_id/timeline`
pub async fn append(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(event): Json<NewTimelineEvent>,
) -> Result<(StatusCode, Json<TimelineEvent>), ApiError> {
    let conn = ctx.core.open_db()?;
    let event = append_timeline_event(&conn, &user_id, event, &ctx.now())?;
    tracing::info!(%user_id, event_id = %event.id, event_type = %event.event_type, "Timeline event recorded");
    Ok((StatusCode::CREATED, Json(event)))
}
