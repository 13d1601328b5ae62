use anyhow::{Context, Result, bail};
use axum::http::HeaderMap;
use log::debug;
use reqwest::{Client, Response};

/// Headers that describe a single connection or the original payload and
/// must not be copied across the proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "host",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "proxy-authorization",
    "proxy-authenticate",
];

/// An upstream calendar response with its body decoded as text.
#[derive(Debug)]
pub struct UpstreamFeed {
    pub headers: HeaderMap,
    pub body: String,
}

fn strip_headers(headers: &mut HeaderMap, extra: &[&str]) {
    for name in HOP_BY_HOP.iter().chain(extra) {
        headers.remove(*name);
    }
}

/// Request headers forwarded to the upstream. `accept-encoding` is dropped
/// so the feed comes back as plain text.
pub fn forwarded_request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = incoming.clone();
    strip_headers(&mut headers, &["accept-encoding", "content-length"]);
    headers
}

/// Response headers passed back to the caller. The body is rewritten, so
/// its length and encoding no longer apply.
pub fn forwarded_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    strip_headers(&mut headers, &["content-length", "content-encoding"]);
    headers
}

async fn fetch_ics_data(client: &Client, url: &str, headers: HeaderMap) -> Result<Response> {
    let response = client
        .get(url)
        .headers(forwarded_request_headers(&headers))
        .send()
        .await
        .with_context(|| format!("Failed to download ICS file. URL: {}", url))?;

    if !response.status().is_success() {
        bail!(
            "Failed to download ICS file. Status code: {} URL: {}",
            response.status(),
            url
        );
    }

    Ok(response)
}

/// Fetches `path` from the calendar backend at `base_url`.
pub async fn fetch_feed(
    client: &Client,
    base_url: &str,
    path: &str,
    headers: HeaderMap,
) -> Result<UpstreamFeed> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);
    debug!("Downloading calendar from {}...", url);

    let response = fetch_ics_data(client, &url, headers).await?;
    let headers = response.headers().clone();

    let ics_content = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read ICS content. URL: {}", url))?;

    let ics_text = std::str::from_utf8(&ics_content)
        .with_context(|| format!("Invalid UTF-8 in ICS content. URL: {}", url))?;

    debug!("Downloaded {} bytes from {}", ics_content.len(), url);

    Ok(UpstreamFeed {
        headers,
        body: ics_text.to_string(),
    })
}
