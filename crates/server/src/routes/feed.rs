//! Public feed endpoint.
//!
//! Unauthenticated; the token in the path is the whole capability. Cache
//! headers are identical on `200` and `304` so intermediaries revalidate
//! consistently.

use axum::extract::{Path, State};
use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, LAST_MODIFIED,
};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use calbridge_core::{http_date, FeedRequest, PublishedFeed};
use calbridge_domain::constants::FEED_CACHE_MAX_AGE_SECS;

use crate::context::AppContext;
use crate::error::ApiResult;

/// Serve a token-scoped ICS feed with conditional cache semantics.
pub async fn serve_feed(
    State(context): State<AppContext>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let if_none_match = header_str(&headers, IF_NONE_MATCH);
    let if_modified_since = header_str(&headers, IF_MODIFIED_SINCE);

    let feed = context
        .publisher
        .publish(FeedRequest {
            token: &token,
            if_none_match: if_none_match.as_deref(),
            if_modified_since: if_modified_since.as_deref(),
        })
        .await?;

    Ok(feed_response(feed))
}

fn feed_response(feed: PublishedFeed) -> Response {
    let mut headers = HeaderMap::new();
    set_header(&mut headers, ETAG, &feed.etag);
    set_header(&mut headers, LAST_MODIFIED, &http_date(feed.last_modified));
    set_header(
        &mut headers,
        CACHE_CONTROL,
        &format!("private, must-revalidate, max-age={FEED_CACHE_MAX_AGE_SECS}"),
    );
    set_header(&mut headers, ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    set_header(&mut headers, ACCESS_CONTROL_EXPOSE_HEADERS, "ETag, Last-Modified");

    match feed.body {
        Some(body) => {
            set_header(&mut headers, CONTENT_TYPE, "text/calendar; charset=utf-8");
            (StatusCode::OK, headers, body).into_response()
        }
        None => (StatusCode::NOT_MODIFIED, headers).into_response(),
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}
