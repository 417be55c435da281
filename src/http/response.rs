//! HTTP response building module
//!
//! Provides builders for the various responses of the file store surface.
//! Every response, including errors, carries `Access-Control-Allow-Origin: *`
//! so the front end can be served from any origin.

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use std::time::SystemTime;

const ALLOWED_METHODS: &str = "DELETE, GET, PUT, OPTIONS";

/// Start a response builder with the CORS header attached
fn base_builder(status: StatusCode) -> Builder {
    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
}

/// Build a JSON response with the given status
pub fn build_json_response(status: StatusCode, json: String) -> Response<Full<Bytes>> {
    base_builder(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .header("Content-Length", json.len())
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a plain-text error response with the given status
pub fn build_error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> Response<Full<Bytes>> {
    let message = message.into();
    base_builder(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", message.len())
        .body(Full::new(Bytes::from(message)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Build the 200 response for a stored file read
///
/// Stored files are always plain UTF-8 text; Last-Modified comes from the
/// file's mtime.
pub fn build_file_response(content: Vec<u8>, modified: SystemTime) -> Response<Full<Bytes>> {
    base_builder(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", content.len())
        .header("Last-Modified", http_date(modified))
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            log_build_error("file", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build the 204 preflight response for OPTIONS requests to any path
pub fn build_preflight_response() -> Response<Full<Bytes>> {
    base_builder(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "Not found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    base_builder(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Allow", ALLOWED_METHODS)
        .body(Full::new(Bytes::from("Method not allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("Method not allowed")))
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Build a static file response for the front-end fallback
pub fn build_static_file_response(
    data: Vec<u8>,
    content_type: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(data)
    };

    base_builder(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("static", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Format a timestamp as an HTTP date (RFC 7231, always GMT)
fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Log response build error
fn log_build_error(which: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {which} response: {error}"));
}
