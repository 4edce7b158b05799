//! Life-stage and location based recommendations.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::get_profile;
use crate::models::enums::LifeStage;
use crate::recommendations::{get_smart_recommendations, Recommendation};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    pub life_stage: Option<LifeStage>,
    #[serde(default)]
    pub location: Option<String>,
}

/// `GET /api/recommendations?life_stage=&location=`
pub async fn by_query(
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let stage = query.life_stage.unwrap_or(LifeStage::Other);
    let location = query.location.unwrap_or_default();
    Ok(Json(get_smart_recommendations(stage, &location)))
}

/// `GET /api/users/:user_id/recommendations?location=`
///
/// Stage comes from the stored profile. Location falls back to the
/// profile's state when the query does not name one.
pub async fn for_user(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let profile = get_profile(&conn, &user_id)?;

    let stage = query
        .life_stage
        .or_else(|| profile.as_ref().map(|p| p.effective_life_stage()))
        .unwrap_or(LifeStage::Other);
    let location = query
        .location
        .filter(|l| !l.trim().is_empty())
        .or_else(|| profile.and_then(|p| p.state))
        .unwrap_or_default();

    tracing::debug!(%user_id, %stage, %location, "Building recommendations");
    Ok(Json(get_smart_recommendations(stage, &location)))
}
