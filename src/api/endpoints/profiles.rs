//! Profile read/write plus the completion score, reminders and reminder
//! notifications derived from it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{delete_profile, get_profile, upsert_profile};
use crate::db::DatabaseError;
use crate::models::Profile;
use crate::notifications::{notify_reminders, Notification, NotificationGate};
use crate::profile_completion::{
    calculate_completion, profile_reminders, CompletionResult, ProfileReminder,
};
use crate::settings::load_settings;

/// `GET /api/users/:user_id/profile`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    let conn = ctx.core.open_db()?;
    let profile =
        get_profile(&conn, &user_id)?.ok_or_else(|| DatabaseError::not_found("profile", user_id))?;
    Ok(Json(profile))
}

/// `PUT /api/users/:user_id/profile`: validate, then create or replace.
///
/// The path decides whose profile this is; a `user_id` in the body is ignored.
pub async fn put(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(mut profile): Json<Profile>,
) -> Result<Json<Profile>, ApiError> {
    profile.user_id = user_id;
    profile.updated_at = ctx.now();
    profile.normalize();
    profile.validate()?;

    let conn = ctx.core.open_db()?;
    upsert_profile(&conn, &profile)?;
    tracing::info!(%user_id, "Profile saved");
    Ok(Json(profile))
}

/// `DELETE /api/users/:user_id/profile`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    delete_profile(&conn, &user_id)?;
    tracing::info!(%user_id, "Profile deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/users/:user_id/profile/completion`
///
/// A user without a profile gets a zero score rather than a 404, so the
/// client can render the progress ring from the first launch.
pub async fn completion(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CompletionResult>, ApiError> {
    let conn = ctx.core.open_db()?;
    let profile = get_profile(&conn, &user_id)?;
    Ok(Json(calculate_completion(profile.as_ref())))
}

/// `GET /api/users/:user_id/profile/reminders`
pub async fn reminders(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ProfileReminder>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let profile = get_profile(&conn, &user_id)?;
    let result = calculate_completion(profile.as_ref());
    Ok(Json(profile_reminders(&result)))
}

/// `GET /api/users/:user_id/notifications`
///
/// Profile reminders as device notifications, gated on the stored
/// permission. Empty until the user has granted it.
pub async fn notifications(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let settings = load_settings(&conn, &user_id)?;
    let gate = NotificationGate::new(settings.notification_permission);

    let profile = get_profile(&conn, &user_id)?;
    let reminders = profile_reminders(&calculate_completion(profile.as_ref()));
    let mut outbox = Vec::new();
    let shown = notify_reminders(&gate, &mut outbox, &reminders);
    tracing::debug!(%user_id, permission = %gate.permission(), shown, "Notifications prepared");
    Ok(Json(outbox))
}
