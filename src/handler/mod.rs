//! Request handler module
//!
//! Responsible for request routing dispatch and the file store endpoints,
//! plus the static fallback for the bundled front end.

pub mod files;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
