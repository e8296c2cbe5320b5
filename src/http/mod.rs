//! HTTP protocol layer module
//!
//! Provides response builders shared by the request handler.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_500_response, build_json_response,
    build_options_response,
};
