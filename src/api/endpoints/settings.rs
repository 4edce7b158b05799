//! Per-user client settings: premium card snooze, onboarding, notifications.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::enums::NotificationPermission;
use crate::settings::{load_settings, save_settings, LocalSettings};

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: LocalSettings,
    pub show_premium_card: bool,
}

impl SettingsResponse {
    fn new(settings: LocalSettings, ctx: &ApiContext) -> Self {
        let show_premium_card = settings.should_show_premium_card(ctx.now());
        Self {
            settings,
            show_premium_card,
        }
    }
}

/// `GET /api/users/:user_id/settings`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let settings = load_settings(&conn, &user_id)?;
    Ok(Json(SettingsResponse::new(settings, &ctx)))
}

/// `POST /api/users/:user_id/settings/premium-card/dismiss`
pub async fn dismiss_premium_card(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SettingsResponse>, ApiError> {
    update(&ctx, &user_id, |s, now| s.dismiss_premium_card(now))
}

/// `POST /api/users/:user_id/settings/onboarding/complete`
pub async fn complete_onboarding(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SettingsResponse>, ApiError> {
    update(&ctx, &user_id, |s, _| s.complete_onboarding())
}

#[derive(Debug, Deserialize)]
pub struct PermissionUpdate {
    pub permission: NotificationPermission,
}

/// `PUT /api/users/:user_id/settings/notification-permission`
///
/// Records the answer the device got from its own permission prompt.
pub async fn set_notification_permission(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<PermissionUpdate>,
) -> Result<Json<SettingsResponse>, ApiError> {
    update(&ctx, &user_id, |s, _| s.notification_permission = body.permission)
}

fn update(
    ctx: &ApiContext,
    user_id: &Uuid,
    change: impl FnOnce(&mut LocalSettings, chrono::DateTime<chrono::Utc>),
) -> Result<Json<SettingsResponse>, ApiError> {
    let now = ctx.now();
    let conn = ctx.core.open_db()?;
    let mut settings = load_settings(&conn, user_id)?;
    change(&mut settings, now);
    save_settings(&conn, user_id, &settings, &now)?;
    tracing::debug!(%user_id, "Settings saved");
    Ok(Json(SettingsResponse::new(settings, ctx)))
}
