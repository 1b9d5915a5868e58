//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::context::AppContext;

pub mod feed;
pub mod health;
pub mod subscriptions;
pub mod tokens;
pub mod transfer;

/// Create the application router.
pub fn build_router(context: AppContext) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Public feed
        .route("/feed/{token}", get(feed::serve_feed))
        // One-shot import/export
        .route("/calendar/import", post(transfer::import_calendar))
        .route("/calendar/export", get(transfer::export_calendar))
        // Subscription management
        .route("/subscriptions", post(subscriptions::create_subscription))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/subscriptions/{id}", patch(subscriptions::edit_subscription))
        .route("/subscriptions/{id}", delete(subscriptions::delete_subscription))
        .route("/subscriptions/{id}/sync", post(subscriptions::sync_subscription))
        // Feed token management
        .route("/feed-tokens", post(tokens::create_token))
        .route("/feed-tokens", get(tokens::list_tokens))
        .route("/feed-tokens/{token}", delete(tokens::revoke_token))
        .with_state(context)
}
