//! Request handler module
//!
//! Responsible for request routing dispatch and the info endpoint.

pub mod info;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
