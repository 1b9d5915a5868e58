//! Subscription management endpoints.

use axum::extract::{Path, State};
use axum::Json;
use calbridge_domain::{NewSubscription, Subscription, SubscriptionEdit};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::extract::OwnerId;

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub remote_url: String,
    pub display_name: String,
    pub color: Option<String>,
    #[serde(default = "default_auto_sync")]
    pub auto_sync_enabled: bool,
}

fn default_auto_sync() -> bool {
    true
}

/// Attach a remote ICS feed.
pub async fn create_subscription(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<CreateSubscriptionRequest>,
) -> ApiResult<Json<Subscription>> {
    validate_feed_url(&body.remote_url)?;

    if body.display_name.trim().is_empty() {
        return Err(ApiError::bad_request("display_name must not be empty"));
    }

    let subscription = context
        .subscriptions
        .create(NewSubscription {
            owner_id,
            remote_url: body.remote_url,
            display_name: body.display_name,
            color: body.color,
            auto_sync_enabled: body.auto_sync_enabled,
        })
        .await?;

    Ok(Json(subscription))
}

/// List the caller's subscriptions with their sync metadata.
pub async fn list_subscriptions(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
) -> ApiResult<Json<Vec<Subscription>>> {
    let subscriptions = context.subscriptions.list_for_owner(&owner_id).await?;
    Ok(Json(subscriptions))
}

/// Edit a subscription; absent fields are left unchanged.
pub async fn edit_subscription(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
    Json(edit): Json<SubscriptionEdit>,
) -> ApiResult<Json<Subscription>> {
    require_owned(&context, &owner_id, &id).await?;

    if let Some(url) = &edit.remote_url {
        validate_feed_url(url)?;
    }

    let subscription = context.subscriptions.edit(&id, edit).await?;
    Ok(Json(subscription))
}

/// Delete a subscription and every event mirrored from it.
pub async fn delete_subscription(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_owned(&context, &owner_id, &id).await?;

    if !context.subscriptions.delete(&id).await? {
        return Err(ApiError::not_found("subscription not found"));
    }

    Ok(Json(json!({ "success": true })))
}

/// Reconcile one subscription on demand, returning the counts.
pub async fn sync_subscription(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_owned(&context, &owner_id, &id).await?;

    let outcome = context.sync.sync_subscription(&id).await?;

    Ok(Json(json!({
        "added": outcome.counts.added,
        "updated": outcome.counts.updated,
        "deleted": outcome.counts.deleted,
        "not_modified": outcome.not_modified,
    })))
}

/// Resolve `id` and confirm it belongs to the caller.
///
/// Another owner's subscription is reported as absent, not forbidden.
async fn require_owned(context: &AppContext, owner_id: &str, id: &str) -> ApiResult<()> {
    context
        .subscriptions
        .get(id)
        .await?
        .filter(|subscription| subscription.owner_id == owner_id)
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("subscription not found"))
}

fn validate_feed_url(raw: &str) -> ApiResult<()> {
    let url = Url::parse(raw).map_err(|_| ApiError::bad_request("invalid feed URL"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ApiError::bad_request(format!("unsupported URL scheme: {other}"))),
    }
}
