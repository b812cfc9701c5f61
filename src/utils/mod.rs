//! Utility modules supporting the API clients.
//!
//! - [`HttpClient`]: shared reqwest client with configured timeouts

mod http;

pub use http::HttpClient;
