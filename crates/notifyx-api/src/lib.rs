pub mod auth;
pub mod automations;
pub mod error;
pub mod instances;
pub mod middleware;
pub mod scripts;
pub mod send;
pub mod webhooks;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::auth::AppState;

/// Full API surface. The webhook dispatcher and auth endpoints are public;
/// everything else sits behind the bearer-token middleware.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/webhooks/{path}",
            post(webhooks::dispatch).options(webhooks::dispatch_options),
        )
        .route("/api/test-webhook", get(webhooks::test_webhook))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/automations", get(automations::list).post(automations::create))
        .route(
            "/api/automations/{id}",
            get(automations::get_one)
                .put(automations::update)
                .delete(automations::remove),
        )
        .route(
            "/api/automations/{id}/logs",
            get(automations::list_logs).delete(automations::clear_logs),
        )
        .route("/api/scripts", get(scripts::list).post(scripts::create))
        .route(
            "/api/scripts/{id}",
            get(scripts::get_one).put(scripts::update).delete(scripts::remove),
        )
        .route("/api/instances", get(instances::list).post(instances::create))
        .route("/api/instances/{name}/qrcode", get(instances::qr_code))
        .route("/api/instances/{name}/contacts", get(instances::contacts))
        .route("/api/instances/{name}/disconnect", post(instances::disconnect))
        .route("/api/instances/{name}", delete(instances::remove))
        .route("/api/send", post(send::text))
        .route("/api/send/sequence", post(send::sequence))
        .route("/api/send/bulk", post(send::bulk))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
