//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! REST routes are nested under `/api/`; the hospital feed socket lives at
//! `/ws/hospitals`.
//!
//! Middleware stack (outermost → innermost):
//! 1. CORS → 2. Cache-Control → 3. Rate limiter → 4. Access log

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::api::websocket;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>, cors_origin: Option<&str>) -> Router {
    build_router(ApiContext::new(core), cors_origin)
}

/// Build router from a pre-constructed `ApiContext`, so tests can keep a
/// handle on the shared feed and limiter.
#[cfg(test)]
pub(crate) fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx, None)
}

fn build_router(ctx: ApiContext, cors_origin: Option<&str>) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        // Profiles
        .route(
            "/users/:user_id/profile",
            get(endpoints::profiles::get)
                .put(endpoints::profiles::put)
                .delete(endpoints::profiles::delete),
        )
        .route(
            "/users/:user_id/profile/completion",
            get(endpoints::profiles::completion),
        )
        .route(
            "/users/:user_id/profile/reminders",
            get(endpoints::profiles::reminders),
        )
        .route(
            "/users/:user_id/notifications",
            get(endpoints::profiles::notifications),
        )
        // Recommendations
        .route("/recommendations", get(endpoints::recommendations::by_query))
        .route(
            "/users/:user_id/recommendations",
            get(endpoints::recommendations::for_user),
        )
        // Hospital directory
        .route(
            "/hospitals",
            get(endpoints::hospitals::search).post(endpoints::hospitals::create),
        )
        .route(
            "/hospitals/:id",
            get(endpoints::hospitals::detail)
                .put(endpoints::hospitals::update)
                .delete(endpoints::hospitals::retire),
        )
        // Insurance
        .route(
            "/insurance/plans",
            get(endpoints::insurance::list_plans).post(endpoints::insurance::create_plan),
        )
        .route("/insurance/compare", post(endpoints::insurance::compare))
        .route(
            "/users/:user_id/insurance/purchases",
            get(endpoints::insurance::list_user_purchases).post(endpoints::insurance::purchase),
        )
        .route(
            "/insurance/purchases/:id/status",
            patch(endpoints::insurance::set_purchase_status),
        )
        // Timeline
        .route(
            "/users/:user_id/timeline",
            get(endpoints::timeline::list).post(endpoints::timeline::append),
        )
        // Appointments
        .route(
            "/users/:user_id/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::book),
        )
        .route(
            "/appointments/:id/status",
            patch(endpoints::appointments::set_status),
        )
        // Emergency contacts
        .route(
            "/users/:user_id/emergency-contacts",
            get(endpoints::emergency_contacts::list).post(endpoints::emergency_contacts::add),
        )
        .route(
            "/emergency-contacts/:id/primary",
            put(endpoints::emergency_contacts::make_primary),
        )
        .route(
            "/emergency-contacts/:id",
            axum::routing::delete(endpoints::emergency_contacts::delete),
        )
        // Orders
        .route("/test-kits", get(endpoints::orders::test_kits))
        .route(
            "/users/:user_id/test-kit-orders",
            get(endpoints::orders::list_kit_orders).post(endpoints::orders::order_kit),
        )
        .route(
            "/test-kit-orders/:id/status",
            patch(endpoints::orders::set_kit_order_status),
        )
        .route(
            "/users/:user_id/pharmacy-orders",
            get(endpoints::orders::list_pharmacy).post(endpoints::orders::order_pharmacy),
        )
        .route(
            "/pharmacy-orders/:id/status",
            patch(endpoints::orders::set_pharmacy_status),
        )
        // Settings
        .route("/users/:user_id/settings", get(endpoints::settings::get))
        .route(
            "/users/:user_id/settings/premium-card/dismiss",
            post(endpoints::settings::dismiss_premium_card),
        )
        .route(
            "/users/:user_id/settings/onboarding/complete",
            post(endpoints::settings::complete_onboarding),
        )
        .route(
            "/users/:user_id/settings/notification-permission",
            put(endpoints::settings::set_notification_permission),
        )
        // Routes with state: .with_state() converts Router<ApiContext> → Router<()>
        // so from_fn middleware (state = ()) is compatible.
        .with_state(ctx.clone())
        .layer(from_fn(middleware::access_log::log_access))
        .layer(from_fn(middleware::rate::limit))
        // Extension must be outermost so all middleware can read ApiContext.
        .layer(axum::Extension(ctx.clone()));

    let ws_routes = Router::new()
        .route("/ws/hospitals", get(websocket::hospitals))
        .with_state(ctx);

    let router = Router::new()
        .nest("/api", api)
        .merge(ws_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    match cors_layer(cors_origin) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS for the configured web origin. An origin that is not a valid header
/// value is logged and CORS stays off.
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers(Any),
        ),
        Err(e) => {
            tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin");
            None
        }
    }
}
