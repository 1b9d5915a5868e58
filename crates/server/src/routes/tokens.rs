//! Feed token management endpoints.
//!
//! The token value appears in the creation response and nowhere else;
//! listings include it because the owner already holds it, but a revoked
//! token stays listed so its access history remains visible.

use axum::extract::{Path, State};
use axum::Json;
use calbridge_domain::{FeedToken, NewFeedToken};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::extract::OwnerId;

#[derive(Debug, Default, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub include_private: bool,
    pub expires_at_ms: Option<i64>,
}

/// Issue a feed token for the caller. An empty JSON object yields a
/// non-expiring token over public events only.
pub async fn create_token(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<CreateTokenRequest>,
) -> ApiResult<Json<FeedToken>> {
    let token = context
        .tokens
        .create(NewFeedToken {
            owner_id,
            include_private: body.include_private,
            expires_at_ms: body.expires_at_ms,
        })
        .await?;

    Ok(Json(token))
}

/// List the caller's tokens, revoked ones included.
pub async fn list_tokens(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
) -> ApiResult<Json<Vec<FeedToken>>> {
    let tokens = context.tokens.list_for_owner(&owner_id).await?;
    Ok(Json(tokens))
}

/// Soft-revoke one of the caller's tokens.
pub async fn revoke_token(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    Path(token): Path<String>,
) -> ApiResult<Json<Value>> {
    if !context.tokens.revoke(&token, &owner_id).await? {
        return Err(ApiError::not_found("feed token not found"));
    }

    Ok(Json(json!({ "success": true })))
}
