//! HTTP API server for the gift registry.
//!
//! Exposes REST endpoints for profiles, gifts, and the guest-facing
//! reservation flow, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::GiftListView;
use registry::ReservationCoordinator;
use store::GiftStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: GiftStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/profiles", post(routes::profiles::create::<S>))
        .route("/profiles/{id}", get(routes::profiles::get::<S>))
        .route("/profiles/{id}", patch(routes::profiles::update::<S>))
        .route("/profiles/{id}/gifts", post(routes::gifts::create::<S>))
        .route("/profiles/{id}/gifts", get(routes::gifts::list::<S>))
        .route(
            "/profiles/{id}/reservations",
            get(routes::reservations::list_for_profile::<S>),
        )
        .route("/gifts/{id}", patch(routes::gifts::update::<S>))
        .route("/gifts/{id}", delete(routes::gifts::delete::<S>))
        .route("/gifts/{id}/reserve", post(routes::reservations::reserve::<S>))
        .route("/gifts/{id}/release", post(routes::reservations::release::<S>))
        .route("/registry/{slug}", get(routes::profiles::share_page::<S>))
        .route("/reconcile", post(routes::reservations::reconcile::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
///
/// The gift list view doubles as the coordinator's projection
/// invalidator, so reservation writes drop the cached lists.
pub fn create_state<S: GiftStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let gift_lists = GiftListView::new(store.clone());
    let coordinator = ReservationCoordinator::new(store.clone(), gift_lists.clone());

    Arc::new(AppState {
        store,
        coordinator,
        gift_lists,
    })
}
