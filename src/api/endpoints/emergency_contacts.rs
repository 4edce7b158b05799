//! Emergency contacts. Exactly one contact per user is primary once any exist.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{
    add_emergency_contact, delete_emergency_contact, list_emergency_contacts, set_primary_contact,
};
use crate::models::{EmergencyContact, NewEmergencyContact};

/// `GET /api/users/:user_id/emergency-contacts`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<EmergencyContact>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(list_emergency_contacts(&conn, &user_id)?))
}

/// `POST /api/users/:user_id/emergency-contacts`
pub async fn add(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(contact): Json<NewEmergencyContact>,
) -> Result<(StatusCode, Json<EmergencyContact>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let contact = add_emergency_contact(&mut conn, &user_id, contact, &ctx.now())?;
    tracing::info!(%user_id, contact_id = %contact.id, primary = contact.is_primary, "Emergency contact added");
    Ok((StatusCode::CREATED, Json(contact)))
}

/// `PUT /api/emergency-contacts/:id/primary`
pub async fn make_primary(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = ctx.core.open_db()?;
    set_primary_contact(&mut conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/emergency-contacts/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    delete_emergency_contact(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
