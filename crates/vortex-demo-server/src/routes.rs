//! Router configuration

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me));

    let demo_routes = Router::new()
        .route("/users", get(handlers::list_demo_users))
        .route("/protected", get(handlers::protected));

    let vortex_routes = Router::new()
        .route("/jwt", post(handlers::generate_jwt))
        .route("/invitations", get(handlers::invitations_legacy))
        .route("/invitations/by-target", get(handlers::invitations_by_target))
        .route(
            "/invitations/by-group/:group_type/:group_id",
            get(handlers::invitations_by_group),
        )
        .route("/invitations/accept", post(handlers::accept_invitations))
        .route(
            "/invitations/:id",
            get(handlers::get_invitation).delete(handlers::revoke_invitation),
        )
        .route("/invitations/:id/reinvite", post(handlers::reinvite));

    // Wildcard origins cannot be combined with credentials, so the
    // request's own origin, method and headers are echoed back instead
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/demo", demo_routes)
        .nest("/api/vortex", vortex_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
