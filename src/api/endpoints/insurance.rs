//! Insurance marketplace: plan catalog, comparison and purchases.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StatusUpdate};
use crate::db::repository::{
    create_purchase, get_plans, insert_plan, list_active_plans, list_purchases,
    update_purchase_status,
};
use crate::insurance::{
    compare_plans, filter_plans, sort_plans, ComparisonError, PlanComparison, PlanFilter, PlanSort,
    MAX_COMPARE, MIN_COMPARE,
};
use crate::models::enums::{PlanType, PurchaseStatus};
use crate::models::{InsurancePlan, InsurancePurchase, PlanInput};

/// Query string form of [`PlanFilter`]. Features arrive comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanListQuery {
    pub max_premium: Option<i64>,
    pub min_coverage: Option<i64>,
    pub plan_type: Option<PlanType>,
    pub provider: Option<String>,
    pub features: Option<String>,
    pub sort: PlanSort,
}

impl PlanListQuery {
    fn filter(&self) -> PlanFilter {
        PlanFilter {
            max_premium: self.max_premium,
            min_coverage: self.min_coverage,
            plan_type: self.plan_type,
            provider: self.provider.clone().filter(|p| !p.trim().is_empty()),
            features: self
                .features
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// `GET /api/insurance/plans`
pub async fn list_plans(
    State(ctx): State<ApiContext>,
    Query(query): Query<PlanListQuery>,
) -> Result<Json<Vec<InsurancePlan>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let mut plans = filter_plans(list_active_plans(&conn)?, &query.filter());
    sort_plans(&mut plans, query.sort);
    Ok(Json(plans))
}

/// `POST /api/insurance/plans`
pub async fn create_plan(
    State(ctx): State<ApiContext>,
    Json(input): Json<PlanInput>,
) -> Result<(StatusCode, Json<InsurancePlan>), ApiError> {
    if input.name.trim().is_empty() || input.provider.trim().is_empty() {
        return Err(ApiError::Validation("plan needs a provider and a name".into()));
    }
    if input.monthly_premium < 0 || input.coverage_amount < 0 {
        return Err(ApiError::Validation("premium and coverage cannot be negative".into()));
    }
    let plan = InsurancePlan::from_input(input, ctx.now());
    let conn = ctx.core.open_db()?;
    insert_plan(&conn, &plan)?;
    tracing::info!(plan_id = %plan.id, provider = %plan.provider, "Insurance plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub plan_ids: Vec<Uuid>,
}

/// `POST /api/insurance/compare`
///
/// The selection size is checked before any lookup, so a bad selection is
/// a 400 even when one of the ids is also unknown.
pub async fn compare(
    State(ctx): State<ApiContext>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<PlanComparison>, ApiError> {
    let count = request.plan_ids.len();
    if !(MIN_COMPARE..=MAX_COMPARE).contains(&count) {
        return Err(ComparisonError::WrongCount(count).into());
    }

    let conn = ctx.core.open_db()?;
    let plans = get_plans(&conn, &request.plan_ids)?;
    Ok(Json(compare_plans(plans)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PurchaseListQuery {
    pub status: Option<PurchaseStatus>,
}

/// `GET /api/users/:user_id/insurance/purchases?status=`
pub async fn list_user_purchases(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PurchaseListQuery>,
) -> Result<Json<Vec<InsurancePurchase>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(list_purchases(&conn, &user_id, query.status)?))
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub plan_id: Uuid,
}

/// `POST /api/users/:user_id/insurance/purchases`
pub async fn purchase(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<InsurancePurchase>), ApiError> {
    let conn = ctx.core.open_db()?;
    let purchase = create_purchase(&conn, &user_id, &request.plan_id, &ctx.now())?;
    tracing::info!(%user_id, purchase_id = %purchase.id, plan_id = %purchase.plan_id, "Insurance purchase started");
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// `PATCH /api/insurance/purchases/:id/status`
pub async fn set_purchase_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<PurchaseStatus>>,
) -> Result<Json<InsurancePurchase>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(update_purchase_status(&conn, &id, update.status, &ctx.now())?))
}
