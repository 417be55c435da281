//! HTTP protocol layer module
//!
//! Provides response building and MIME detection, decoupled from the file
//! store business logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_500_response, build_error_response,
    build_file_response, build_json_response, build_preflight_response,
    build_static_file_response,
};
