use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use log::{Level, debug, error, info, log_enabled};
use url::form_urlencoded;

use crate::{
    ics::{self, EventFilter},
    server::AppState,
    upstream,
};

/// Welcome page, embedded at build time.
pub const WELCOME_PAGE: &[u8] = include_bytes!("welcome.html");

const PRIVATE_PREFIX: &str = "/private";

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Decoded value of the first `name` parameter in the query string. Keys
/// and values are form-decoded, invalid UTF-8 is replaced lossily.
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Handles one edge request. Every route of the service goes through here.
pub async fn handle_request(state: &AppState, request: Request<Body>) -> Response {
    info!("SERVICE_VERSION: {}", state.config.service_version);

    if is_mutating(request.method()) {
        return (StatusCode::METHOD_NOT_ALLOWED, "This method is not allowed").into_response();
    }

    let uri = request.uri().clone();
    info!("URL: {}", uri);

    let path = uri.path();
    if path == "/" {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            WELCOME_PAGE,
        )
            .into_response();
    }

    if path.starts_with(PRIVATE_PREFIX) {
        let filter = state
            .config
            .event_filter(query_param(&uri, "filter").as_deref());
        return match proxy_feed(state, path, request.headers().clone(), &filter).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to proxy calendar feed for {}: {:#}", path, e);
                (StatusCode::BAD_GATEWAY, "Failed to fetch upstream calendar").into_response()
            }
        };
    }

    (
        StatusCode::NOT_FOUND,
        "The page you requested could not be found",
    )
        .into_response()
}

async fn proxy_feed(
    state: &AppState,
    path: &str,
    headers: axum::http::HeaderMap,
    filter: &EventFilter,
) -> Result<Response> {
    let feed = upstream::fetch_feed(&state.client, &state.config.upstream_url, path, headers).await?;

    let parsed = ics::parse(&feed.body, &state.config.parse_options());
    let total = parsed.events.len();
    let filtered = filter.apply(parsed);
    debug!(
        "Kept {} of {} events where {} contains {:?}",
        filtered.events.len(),
        total,
        filter.field,
        filter.needle
    );
    if log_enabled!(Level::Debug) {
        match serde_json::to_string(&filtered.events) {
            Ok(json) => debug!("Filtered events: {}", json),
            Err(e) => debug!("Could not render filtered events: {}", e),
        }
    }

    let mut response = (StatusCode::OK, ics::to_ics(&filtered)).into_response();
    let headers = response.headers_mut();
    *headers = upstream::forwarded_response_headers(&feed.headers);
    // Upstream caching policy wins; the TTL only fills in a missing one.
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_str(&format!("max-age={}", state.config.cache_ttl))?,
        );
    }
    Ok(response)
}
