//! One-shot import/export endpoints.

use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::extract::OwnerId;

/// JSON import body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub ical_data: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Import an ICS document into the caller's calendar.
///
/// Accepts either a multipart upload (`file` field) or a JSON body with
/// `icalData`. Events whose UID the owner already has are skipped.
pub async fn import_calendar(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    request: Request,
) -> ApiResult<Json<Value>> {
    let ical_data = read_import_body(request).await?;

    if ical_data.trim().is_empty() {
        return Err(ApiError::bad_request("empty calendar data"));
    }

    let outcome = context.transfer.import_ics(&owner_id, &ical_data).await?;

    Ok(Json(json!({
        "success": true,
        "imported": outcome.imported,
        "skipped": outcome.skipped,
    })))
}

/// Export the caller's events as a `text/calendar` attachment.
///
/// `start`/`end` are individually optional ISO-8601 instants bounding the
/// window; a missing bound leaves that side open.
pub async fn export_calendar(
    State(context): State<AppContext>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<ExportQuery>,
) -> ApiResult<(HeaderMap, String)> {
    let window = match (&query.start, &query.end) {
        (None, None) => None,
        (start, end) => {
            let start_ms = start.as_deref().map(parse_instant).transpose()?.unwrap_or(i64::MIN);
            let end_ms = end.as_deref().map(parse_instant).transpose()?.unwrap_or(i64::MAX);
            Some((start_ms, end_ms))
        }
    };

    let body = context.transfer.export_ics(&owner_id, window, None).await?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/calendar; charset=utf-8"));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"calendar.ics\""),
    );

    Ok((headers, body))
}

async fn read_import_body(request: Request) -> ApiResult<String> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::bad_request("invalid multipart body"))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::bad_request("invalid multipart body"))?
        {
            if field.name() == Some("file") {
                return field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("unreadable file field"));
            }
        }

        Err(ApiError::bad_request("missing file field"))
    } else {
        let Json(body) = Json::<ImportRequest>::from_request(request, &())
            .await
            .map_err(|_| ApiError::bad_request("invalid JSON body"))?;
        Ok(body.ical_data)
    }
}

fn parse_instant(raw: &str) -> ApiResult<i64> {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.timestamp_millis())
        .map_err(|_| ApiError::bad_request(format!("invalid ISO-8601 instant: {raw}")))
}
