//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: preflight handling, method
//! dispatch for the file store endpoints, and the static fallback.

use http_body_util::Full;
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::handler::{files, static_files};
use crate::http;
use crate::logger;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path();

    let access_log = state.config.logging.access_log;
    if access_log {
        logger::log_request(&method, &uri, req.version());
    }
    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let name = query_param(uri.query(), "name");

    let response = match (&method, path) {
        // Preflight applies to any path
        (&Method::OPTIONS, _) => http::build_preflight_response(),
        (&Method::GET, "/list") => files::handle_list(&state).await,
        (&Method::GET, "/files") => files::handle_read(&state, name).await,
        (&Method::PUT, "/files") => files::handle_write(req, &state, name).await,
        (&Method::DELETE, "/files") => files::handle_delete(&state, name).await,
        (&Method::PUT | &Method::DELETE, _) => http::build_404_response(),
        (&Method::GET | &Method::HEAD, _) => {
            static_files::serve(&state, path, method == Method::HEAD).await
        }
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    };

    if access_log {
        let size = response.body().size_hint().exact().unwrap_or(0);
        logger::log_response(response.status().as_u16(), size as usize);
    }
    Ok(response)
}

/// Extract a single query parameter, percent-decoded
///
/// Takes the first occurrence when the parameter is repeated; absence yields
/// `None`, which callers treat as an invalid name.
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| *k == key)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_basic() {
        assert_eq!(
            query_param(Some("name=notes.txt"), "name"),
            Some("notes.txt".to_string())
        );
    }

    #[test]
    fn test_query_param_absent() {
        assert_eq!(query_param(Some("other=x"), "name"), None);
        assert_eq!(query_param(None, "name"), None);
    }

    #[test]
    fn test_query_param_first_occurrence_wins() {
        assert_eq!(
            query_param(Some("name=a.txt&name=b.txt"), "name"),
            Some("a.txt".to_string())
        );
    }

    #[test]
    fn test_query_param_percent_decoding() {
        assert_eq!(
            query_param(Some("name=my%20notes.txt"), "name"),
            Some("my notes.txt".to_string())
        );
        assert_eq!(
            query_param(Some("name=my+notes.txt"), "name"),
            Some("my notes.txt".to_string())
        );
    }

    #[test]
    fn test_query_param_empty_value() {
        assert_eq!(query_param(Some("name="), "name"), Some(String::new()));
    }
}
