//! Hospital directory: search for everyone, create/update/retire for admins.
//!
//! Every write is published on the hospital change feed so open
//! `/ws/hospitals` sockets see it without polling.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{
    deactivate_hospital, get_hospital, insert_hospital, search_hospitals, update_hospital,
};
use crate::db::DatabaseError;
use crate::models::{Hospital, HospitalInput, HospitalQuery};
use crate::realtime::ChangeEvent;

const MAX_PAGE: u32 = 100;

fn validate_input(input: &HospitalInput) -> Result<(), ApiError> {
    for (field, value) in [
        ("name", &input.name),
        ("address", &input.address),
        ("state", &input.state),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} cannot be blank")));
        }
    }
    if !(0.0..=5.0).contains(&input.rating) {
        return Err(ApiError::Validation(format!(
            "rating must be between 0 and 5, got {}",
            input.rating
        )));
    }
    Ok(())
}

/// `GET /api/hospitals?state=&specialty=&search=&emergency_only=&order=&offset=&limit=`
pub async fn search(
    State(ctx): State<ApiContext>,
    Query(mut query): Query<HospitalQuery>,
) -> Result<Json<Vec<Hospital>>, ApiError> {
    query.limit = query.limit.clamp(1, MAX_PAGE);
    let conn = ctx.core.open_db()?;
    Ok(Json(search_hospitals(&conn, &query)?))
}

/// `GET /api/hospitals/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hospital>, ApiError> {
    let conn = ctx.core.open_db()?;
    let hospital = get_hospital(&conn, &id)?.ok_or_else(|| DatabaseError::not_found("hospital", id))?;
    Ok(Json(hospital))
}

/// `POST /api/hospitals`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(input): Json<HospitalInput>,
) -> Result<(StatusCode, Json<Hospital>), ApiError> {
    validate_input(&input)?;
    let hospital = Hospital::from_input(input, ctx.now());

    let conn = ctx.core.open_db()?;
    insert_hospital(&conn, &hospital)?;
    tracing::info!(hospital_id = %hospital.id, name = %hospital.name, "Hospital created");

    ctx.publish_hospital(ChangeEvent::Insert(hospital.clone()));
    Ok((StatusCode::CREATED, Json(hospital)))
}

/// `PUT /api/hospitals/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(input): Json<HospitalInput>,
) -> Result<Json<Hospital>, ApiError> {
    validate_input(&input)?;
    let conn = ctx.core.open_db()?;
    let mut hospital =
        get_hospital(&conn, &id)?.ok_or_else(|| DatabaseError::not_found("hospital", id))?;
    hospital.apply_input(input, ctx.now());
    update_hospital(&conn, &hospital)?;
    tracing::info!(hospital_id = %id, "Hospital updated");

    ctx.publish_hospital(ChangeEvent::Update(hospital.clone()));
    Ok(Json(hospital))
}

/// `DELETE /api/hospitals/:id`: soft delete.
///
/// Published as an update carrying `is_active = false`; live lists drop
/// retired rows on their own.
pub async fn retire(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    let hospital = deactivate_hospital(&conn, &id, &ctx.now())?;
    tracing::info!(hospital_id = %id, "Hospital retired");

    ctx.publish_hospital(ChangeEvent::Update(hospital));
    Ok(StatusCode::NO_CONTENT)
}
