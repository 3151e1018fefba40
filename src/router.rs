use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allow_origin);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/cars",
            get(handlers::cars::list_cars).post(handlers::cars::create_car),
        )
        .route("/api/cars/:id", get(handlers::cars::get_car))
        .route("/api/cars/:id/quote", get(handlers::cars::get_quote))
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route(
            "/api/bookings/:id/status",
            patch(handlers::bookings::update_status),
        )
        .route("/api/profiles/me", get(handlers::profiles::get_my_profile))
        .route("/api/profiles", post(handlers::profiles::upsert_profile))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers(Any);

    match origin {
        "*" => layer.allow_origin(Any),
        other => match HeaderValue::from_str(other) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                tracing::warn!(origin = other, "invalid CORS_ALLOW_ORIGIN, allowing any origin");
                layer.allow_origin(Any)
            }
        },
    }
}
