//! File store endpoints
//!
//! Implements the list/read/write/delete operations and maps `StoreError`
//! to the status codes and bodies of the HTTP surface.

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppState;
use crate::http;
use crate::logger;
use crate::store::StoreError;

#[derive(Serialize)]
struct SaveResult<'a> {
    saved: &'a str,
    created: bool,
    size: usize,
}

#[derive(Serialize)]
struct DeleteResult<'a> {
    deleted: &'a str,
    existed: bool,
}

/// `GET /list`
pub async fn handle_list(state: &Arc<AppState>) -> Response<Full<Bytes>> {
    match state.store.list().await {
        Ok(entries) => json_response(StatusCode::OK, &entries),
        Err(e) => {
            logger::log_error(&format!("Failed to list storage directory: {e}"));
            http::build_500_response()
        }
    }
}

/// `GET /files?name=<n>`
pub async fn handle_read(state: &Arc<AppState>, name: Option<String>) -> Response<Full<Bytes>> {
    let Some(name) = name else {
        return store_error_response(StoreError::InvalidName, "File is not valid UTF-8");
    };
    match state.store.read(&name).await {
        Ok(file) => http::build_file_response(file.content, file.modified),
        Err(e) => store_error_response(e, "File is not valid UTF-8"),
    }
}

/// `PUT /files?name=<n>` with the new content as the request body
pub async fn handle_write(
    req: Request<Incoming>,
    state: &Arc<AppState>,
    name: Option<String>,
) -> Response<Full<Bytes>> {
    let Some(name) = name else {
        return store_error_response(StoreError::InvalidName, "Body must be UTF-8 text");
    };
    // Name is checked before the declared length, matching the read path
    if let Err(e) = state.store.validate_name(&name) {
        return store_error_response(e, "Body must be UTF-8 text");
    }

    let max = state.store.max_file_size();
    let declared = declared_length(&req);
    if declared == 0 || declared > max {
        let status = if declared > max {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };
        return http::build_error_response(status, format!("Bad size (got {declared}, max {max})"));
    }

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            return http::build_error_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };

    match state.store.write(&name, &body).await {
        Ok(outcome) => {
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            json_response(
                status,
                &SaveResult {
                    saved: &name,
                    created: outcome.created,
                    size: outcome.size,
                },
            )
        }
        Err(e) => store_error_response(e, "Body must be UTF-8 text"),
    }
}

/// `DELETE /files?name=<n>`
pub async fn handle_delete(state: &Arc<AppState>, name: Option<String>) -> Response<Full<Bytes>> {
    let Some(name) = name else {
        return store_error_response(StoreError::InvalidName, "Body must be UTF-8 text");
    };
    match state.store.delete(&name).await {
        Ok(existed) => {
            // existed:false responds 201, not 404; clients rely on the
            // distinction
            let status = if existed {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            json_response(
                status,
                &DeleteResult {
                    deleted: &name,
                    existed,
                },
            )
        }
        Err(e) => store_error_response(e, "Body must be UTF-8 text"),
    }
}

/// Declared Content-Length, treating absent or malformed values as zero
fn declared_length(req: &Request<Incoming>) -> u64 {
    req.headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Map a store error to its HTTP response
///
/// The UTF-8 message differs between the read path ("File is not valid
/// UTF-8") and the write path ("Body must be UTF-8 text").
fn store_error_response(err: StoreError, not_utf8_message: &'static str) -> Response<Full<Bytes>> {
    match err {
        StoreError::InvalidName => {
            http::build_error_response(StatusCode::BAD_REQUEST, "Invalid filename or extension")
        }
        StoreError::NotFound => http::build_error_response(StatusCode::NOT_FOUND, "Not found"),
        StoreError::TooLarge => {
            http::build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "File too large")
        }
        StoreError::NotUtf8 => {
            http::build_error_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, not_utf8_message)
        }
        StoreError::Io(e) => {
            logger::log_error(&format!("Filesystem operation failed: {e}"));
            http::build_500_response()
        }
    }
}

fn json_response(status: StatusCode, value: &impl Serialize) -> Response<Full<Bytes>> {
    match serde_json::to_string(value) {
        Ok(json) => http::build_json_response(status, json),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            http::build_500_response()
        }
    }
}
