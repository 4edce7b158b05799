//! Home test kits and pharmacy deliveries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StatusUpdate};
use crate::db::repository::{
    create_pharmacy_order, create_test_kit_order, list_pharmacy_orders, list_test_kit_orders,
    list_test_kits, update_pharmacy_order_status, update_test_kit_order_status,
};
use crate::lifecycle::{test_kit_status_display, StatusDisplay};
use crate::models::enums::{PharmacyOrderStatus, TestKitOrderStatus};
use crate::models::{
    HomeTestKit, NewPharmacyOrder, NewTestKitOrder, PharmacyOrder, TestKitOrder,
};

/// A kit order with the text and badge colour the tracker shows for its status.
#[derive(Debug, Serialize)]
pub struct TestKitOrderView {
    #[serde(flatten)]
    pub order: TestKitOrder,
    pub display: StatusDisplay,
}

impl From<TestKitOrder> for TestKitOrderView {
    fn from(order: TestKitOrder) -> Self {
        let display = test_kit_status_display(order.status);
        Self { order, display }
    }
}

/// `GET /api/test-kits`
pub async fn test_kits(State(ctx): State<ApiContext>) -> Result<Json<Vec<HomeTestKit>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(list_test_kits(&conn)?))
}

/// `GET /api/users/:user_id/test-kit-orders`
pub async fn list_kit_orders(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<TestKitOrderView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let orders = list_test_kit_orders(&conn, &user_id)?;
    Ok(Json(orders.into_iter().map(TestKitOrderView::from).collect()))
}

/// `POST /api/users/:user_id/test-kit-orders`
pub async fn order_kit(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<NewTestKitOrder>,
) -> Result<(StatusCode, Json<TestKitOrderView>), ApiError> {
    let conn = ctx.core.open_db()?;
    let order = create_test_kit_order(&conn, &user_id, request, &ctx.now())?;
    tracing::info!(%user_id, order_id = %order.id, kit_id = %order.kit_id, "Test kit ordered");
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// `PATCH /api/test-kit-orders/:id/status`
pub async fn set_kit_order_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<TestKitOrderStatus>>,
) -> Result<Json<TestKitOrderView>, ApiError> {
    let conn = ctx.core.open_db()?;
    let order = update_test_kit_order_status(&conn, &id, update.status, &ctx.now())?;
    Ok(Json(order.into()))
}

/// `GET /api/users/:user_id/pharmacy-orders`
pub async fn list_pharmacy(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<PharmacyOrder>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(list_pharmacy_orders(&conn, &user_id)?))
}

/// `POST /api/users/:user_id/pharmacy-orders`
pub async fn order_pharmacy(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<NewPharmacyOrder>,
) -> Result<(StatusCode, Json<PharmacyOrder>), ApiError> {
    let conn = ctx.core.open_db()?;
    let order = create_pharmacy_order(&conn, &user_id, request, &ctx.now())?;
    tracing::info!(
        %user_id,
        order_id = %order.id,
        items = order.items.len(),
        "Pharmacy order placed"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// `PATCH /api/pharmacy-orders/:id/status`
pub async fn set_pharmacy_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<PharmacyOrderStatus>>,
) -> Result<Json<PharmacyOrder>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(update_pharmacy_order_status(&conn, &id, update.status, &ctx.now())?))
}
