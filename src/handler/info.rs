//! The info endpoint: echo peer address, protocol and client hints as JSON.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};

use crate::http;
use crate::request_info::ResponseInfo;

/// Answer `GET /` (and `HEAD /`, without a body) for one request.
pub fn respond<B>(req: &Request<B>, peer_address: &str) -> Response<Full<Bytes>> {
    let info = ResponseInfo::collect(req.headers(), req.version(), peer_address);

    match serde_json::to_vec(&info) {
        Ok(body) => http::build_json_response(Bytes::from(body), req.method() == Method::HEAD),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response info: {e}"));
            http::build_500_response()
        }
    }
}
