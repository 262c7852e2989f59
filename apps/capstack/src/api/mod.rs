//! # HTTP API
//!
//! axum router over the embedded store. Public routes cover server health
//! and authentication; every `/finance` and `/savings` route requires a
//! bearer token.

mod error;
pub mod handlers;
pub mod middleware;
pub mod types;

pub use error::ApiError;

use crate::auth::TokenSigner;
use crate::config::ServerConfig;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use capstack_core::ScoringTables;
use capstack_core::discipline::DisciplineProtocol;
use capstack_core::storage::Store;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub tables: Arc<ScoringTables>,
    pub signer: Arc<TokenSigner>,
    pub protocol: Arc<DisciplineProtocol>,
}

impl AppState {
    pub fn new(store: Store, tables: ScoringTables, signer: TokenSigner) -> Self {
        Self {
            store: Arc::new(store),
            tables: Arc::new(tables),
            signer: Arc::new(signer),
            protocol: Arc::new(DisciplineProtocol::default()),
        }
    }
}

/// Current time in Unix milliseconds, for stored records.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current time in Unix seconds, for token claims.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o.trim()).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Build the application router.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let protected = Router::new()
        // finance
        .route("/finance/healthscore", get(handlers::health_score))
        .route("/finance/survival", get(handlers::survival))
        .route("/finance/incomescore", get(handlers::income_score))
        .route("/finance/insights", get(handlers::comprehensive_insights))
        .route("/finance/calculate", post(handlers::calculate))
        .route(
            "/finance/profile",
            get(handlers::get_profile).put(handlers::put_profile),
        )
        .route("/finance/asset-allocation", get(handlers::asset_allocation))
        .route(
            "/finance/asset-allocation/update",
            post(handlers::update_asset_allocation),
        )
        .route("/finance/emergency-status", get(handlers::emergency_status))
        .route(
            "/finance/emergency-simulation",
            post(handlers::emergency_simulation),
        )
        .route("/finance/sip-plan", post(handlers::sip_plan))
        // savings
        .route("/savings/status", get(handlers::savings_status))
        .route("/savings/plans", post(handlers::create_plan))
        .route("/savings/check", post(handlers::check_transaction))
        .route("/savings/process", post(handlers::process_transaction))
        .route("/savings/autosave", post(handlers::auto_save))
        .route("/savings/lock", post(handlers::lock_savings))
        .route("/savings/unlock/{lock_id}", post(handlers::unlock_savings))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let public = Router::new()
        .route("/health", get(handlers::server_health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/verify", get(handlers::verify));

    let mut app = public.merge(protected).with_state(state);
    if let Some(limiter) = middleware::rate_limiter(config.rate_limit) {
        app = app.layer(from_fn_with_state(limiter, middleware::rate_limit));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.cors_origins)),
    )
}
