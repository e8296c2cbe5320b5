//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: path and method checks,
//! dispatch to the info endpoint, `Server` header and access logging.

use crate::config::AppState;
use crate::handler::info;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::request_info::protocol_label;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// The only path served
pub const INFO_PATH: &str = "/";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let peer_address = peer_addr.ip().to_string();

    let mut response = route_request(&req, &peer_address);

    if let Some(ref server) = state.server_header {
        response.headers_mut().insert(SERVER, server.clone());
    }

    if state.config.logging.access_log {
        let entry = access_entry(&req, &response, peer_address, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and method
fn route_request<B>(req: &Request<B>, peer_address: &str) -> Response<Full<Bytes>> {
    if req.uri().path() != INFO_PATH {
        return http::build_404_response();
    }

    match *req.method() {
        Method::GET | Method::HEAD => info::respond(req, peer_address),
        Method::OPTIONS => http::build_options_response(),
        _ => http::build_405_response(),
    }
}

fn access_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    remote_addr: String,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    };

    let mut entry = AccessLogEntry::new(
        remote_addr,
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.protocol = protocol_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}
