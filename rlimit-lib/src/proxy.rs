//! The forwarding proxy: thin axum glue in front of the dispatcher.
//!
//! Every inbound request, regardless of method or path, is rewritten to the
//! configured upstream and handed to the [`RateLimitedDispatcher`]. Whatever
//! comes back (the upstream's real response or the limiter's synthetic
//! `429`) is relayed to the original caller unmodified.

use std::net::IpAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::header::{CONTENT_LENGTH, HOST, HeaderMap, HeaderName, HeaderValue, TRANSFER_ENCODING};
use log::{debug, error};

use crate::ratelimit::RateLimitedDispatcher;
use crate::types::Result;
use crate::upstream::Upstream;

/// Shared state handed to every request handler
#[derive(Debug, Clone)]
pub struct ProxyState {
    dispatcher: RateLimitedDispatcher,
    upstream: Upstream,
}

impl ProxyState {
    /// Create the proxy state from a dispatcher and a validated upstream
    #[must_use]
    pub const fn new(dispatcher: RateLimitedDispatcher, upstream: Upstream) -> Self {
        Self {
            dispatcher,
            upstream,
        }
    }
}

/// Build the proxy router: every method on every path forwards upstream.
///
/// The router relies on the client's socket address for `X-Forwarded-For`,
/// so it must be served with
/// [`into_make_service_with_connect_info`](Router::into_make_service_with_connect_info).
#[must_use]
pub fn router(state: ProxyState) -> Router {
    Router::new().fallback(forward).with_state(state)
}

/// Hop-by-hop headers are scoped to a single connection and must not be
/// forwarded to the next one.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy end-to-end headers, dropping hop-by-hop ones and any explicitly
/// skipped names.
fn end_to_end_headers(headers: &HeaderMap, skip: &[HeaderName]) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name) && !skip.contains(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Whether the inbound request carries a body worth forwarding, declared
/// either by a non-zero `Content-Length` or by chunked transfer framing.
fn request_has_body(headers: &HeaderMap) -> bool {
    if headers.contains_key(TRANSFER_ENCODING) {
        return true;
    }
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .is_some_and(|length| length > 0)
}

/// Record the calling client in `X-Forwarded-For`, appending to any value
/// set by an earlier proxy in the chain.
fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let name = HeaderName::from_static("x-forwarded-for");
    let value = match headers.get(&name).and_then(|prior| prior.to_str().ok()) {
        Some(prior) => format!("{prior}, {client}"),
        None => client.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(name, value);
    }
}

async fn forward(
    State(state): State<ProxyState>,
    ConnectInfo(client): ConnectInfo<std::net::SocketAddr>,
    request: Request,
) -> Response {
    match proxy_request(&state, client.ip(), request).await {
        Ok(response) => response,
        Err(err) => {
            error!("forwarding failed: {err}");
            (StatusCode::BAD_GATEWAY, "Bad Gateway (rlimit)\n").into_response()
        }
    }
}

async fn proxy_request(state: &ProxyState, client: IpAddr, request: Request) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let target = state.upstream.rewrite(parts.uri.path(), parts.uri.query());
    debug!("{} {} -> {target}", parts.method, parts.uri);

    let mut outbound = reqwest::Request::new(parts.method, target);
    // Host belongs to the new destination; Content-Length passes through
    // untouched since the body is relayed byte for byte.
    let mut headers = end_to_end_headers(&parts.headers, &[HOST]);
    append_forwarded_for(&mut headers, client);
    *outbound.headers_mut() = headers;
    // A bodyless request (a GET and friends) must stay bodyless; wrapping
    // the empty stream would force chunked framing onto every forward.
    if request_has_body(&parts.headers) {
        *outbound.body_mut() = Some(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream_response = state.dispatcher.dispatch(outbound).await?;

    let status = upstream_response.status();
    let headers = end_to_end_headers(upstream_response.headers(), &[]);
    let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop_detection() {
        assert!(is_hop_by_hop(&HeaderName::from_static("connection")));
        assert!(is_hop_by_hop(&HeaderName::from_static("transfer-encoding")));
        assert!(!is_hop_by_hop(&HeaderName::from_static("content-type")));
        assert!(!is_hop_by_hop(&HeaderName::from_static("x-request-id")));
    }

    #[test]
    fn test_end_to_end_headers_filtering() {
        let mut headers = HeaderMap::new();
        headers.insert("host", "proxy.local".parse().unwrap());
        headers.insert("connection", "keep-alive".parse().unwrap());
        headers.insert("x-custom", "kept".parse().unwrap());
        headers.insert("accept", "*/*".parse().unwrap());

        let filtered = end_to_end_headers(&headers, &[HOST]);
        assert!(!filtered.contains_key("host"));
        assert!(!filtered.contains_key("connection"));
        assert_eq!(filtered.get("x-custom").unwrap(), "kept");
        assert_eq!(filtered.get("accept").unwrap(), "*/*");
    }

    #[test]
    fn test_request_body_detection() {
        let mut headers = HeaderMap::new();
        assert!(!request_has_body(&headers));

        headers.insert(CONTENT_LENGTH, "0".parse().unwrap());
        assert!(!request_has_body(&headers));

        headers.insert(CONTENT_LENGTH, "4".parse().unwrap());
        assert!(request_has_body(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(TRANSFER_ENCODING, "chunked".parse().unwrap());
        assert!(request_has_body(&headers));
    }

    #[test]
    fn test_forwarded_for_appending() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "127.0.0.1".parse().unwrap());
        assert_eq!(headers.get("x-forwarded-for").unwrap(), "127.0.0.1");

        append_forwarded_for(&mut headers, "10.0.0.9".parse().unwrap());
        assert_eq!(
            headers.get("x-forwarded-for").unwrap(),
            "127.0.0.1, 10.0.0.9"
        );
    }
}
