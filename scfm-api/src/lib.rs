//! scfm-api library - SCF Music distribution HTTP service
//!
//! Artists submit releases for review, follow their simulated store delivery,
//! manage artist profiles and payouts, and talk to admins through tickets.

use std::sync::Arc;

use axum::Router;
use scfm_common::assets::AssetStore;
use scfm_common::config::TomlConfig;
use scfm_common::events::EventBus;
use scfm_common::Repository;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};
use services::distribution::DistributionSimulator;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub assets: AssetStore,
    pub events: EventBus,
    pub distribution: DistributionSimulator,
    pub config: Arc<TomlConfig>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, assets: AssetStore, config: TomlConfig) -> Self {
        let events = EventBus::new(1000);
        let distribution =
            DistributionSimulator::new(events.clone(), config.distribution.time_scale);
        Self {
            repo,
            assets,
            events,
            distribution,
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// `/health`, the catalog and register/login are public. Everything else
/// needs a bearer session; `/api/admin/*` additionally needs the admin role.
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::middleware;
    use axum::routing::{delete, get, post, put};

    let admin = Router::new()
        .route("/api/admin/releases", get(api::admin::list_releases))
        .route("/api/admin/releases/:id/approve", post(api::admin::approve_release))
        .route("/api/admin/releases/:id/reject", post(api::admin::reject_release))
        .route("/api/admin/releases/:id/financials", put(api::admin::update_financials))
        .route("/api/admin/users", get(api::admin::list_users))
        .route("/api/admin/users/:id", put(api::admin::update_user))
        .route("/api/admin/users/:id/ban", post(api::admin::ban_user))
        .route("/api/admin/tickets", get(api::admin::list_tickets))
        .route("/api/admin/tickets/:id/status", put(api::admin::set_ticket_status))
        .layer(middleware::from_fn(api::auth::require_admin));

    // Uploads carry raw bytes; the per-kind limit is enforced by the asset store
    let max_upload = state
        .config
        .limits
        .max_audio_bytes
        .max(state.config.limits.max_artwork_bytes) as usize;
    let uploads = Router::new()
        .route("/api/assets/audio", post(api::assets::upload_audio))
        .route("/api/assets/artwork", post(api::assets::upload_artwork))
        .layer(DefaultBodyLimit::max(max_upload.saturating_add(1)));

    let protected = Router::new()
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/me", get(api::auth::me))
        .route("/api/releases", get(api::releases::list_releases).post(api::releases::submit_release))
        .route("/api/releases/:id", get(api::releases::get_release).put(api::releases::edit_release))
        .route("/api/releases/:id/distribution", get(api::releases::get_distribution))
        .route(
            "/api/drafts",
            get(api::drafts::load_draft)
                .put(api::drafts::save_draft)
                .delete(api::drafts::clear_draft),
        )
        .route("/api/artists", get(api::artists::list_artists).post(api::artists::create_artist))
        .route("/api/artists/:id", delete(api::artists::delete_artist))
        .route("/api/tickets", get(api::tickets::list_tickets).post(api::tickets::create_ticket))
        .route("/api/tickets/:id", get(api::tickets::get_ticket))
        .route("/api/tickets/:id/replies", post(api::tickets::reply))
        .route("/api/tickets/:id/read", post(api::tickets::mark_read))
        .route("/api/payouts", get(api::earnings::payouts))
        .route("/api/stats", get(api::earnings::stats))
        .route(
            "/api/payment-details",
            get(api::earnings::get_payment_details).put(api::earnings::put_payment_details),
        )
        .route(api::auth::EVENTS_PATH, get(api::sse::event_stream))
        .merge(uploads)
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/catalog", get(api::catalog::get_catalog))
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/login", post(api::auth::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
