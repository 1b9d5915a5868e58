//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::ApiResult;

/// Report service and database health.
pub async fn health(State(context): State<AppContext>) -> ApiResult<Json<Value>> {
    context.db.health_check()?;
    Ok(Json(json!({ "status": "ok" })))
}
