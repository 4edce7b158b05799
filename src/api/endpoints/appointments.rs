//! Hospital appointments.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StatusUpdate};
use crate::db::repository::{book_appointment, list_appointments, update_appointment_status};
use crate::models::enums::AppointmentStatus;
use crate::models::{Appointment, BookingRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentQuery {
    pub upcoming: bool,
}

/// `GET /api/users/:user_id/appointments?upcoming=true`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let now = ctx.now();
    let conn = ctx.core.open_db()?;
    let upcoming_after = query.upcoming.then_some(&now);
    Ok(Json(list_appointments(&conn, &user_id, upcoming_after)?))
}

/// `POST /api/users/:user_id/appointments`
pub async fn book(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let conn = ctx.core.open_db()?;
    let appointment = book_appointment(&conn, &user_id, request, &ctx.now())?;
    tracing::info!(
        %user_id,
        appointment_id = %appointment.id,
        hospital_id = %appointment.hospital_id,
        "Appointment booked"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `PATCH /api/appointments/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<AppointmentStatus>>,
) -> Result<Json<Appointment>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(update_appointment_status(&conn, &id, update.status, &ctx.now())?))
}
