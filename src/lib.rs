//! # Question Explorer
//!
//! Recursively expands a seed question into a tree of follow-up questions.
//! Every node is answered by a research provider, written to an append-only
//! transcript, and used to generate the next round of questions.
//!
//! ## Architecture
//!
//! - [`models`]: `ResearchAnswer` and the append-only `History`
//! - [`clients`]: research provider and question generator traits, with
//!   Perplexity and OpenAI implementations
//! - [`explorer`]: depth-bounded pre-order expansion and candidate throttling
//! - [`transcript`]: incremental transcript records
//! - [`config`]: configuration management
//! - [`utils`]: HTTP client construction
//! - [`mock`]: in-memory doubles for tests

pub mod clients;
pub mod config;
pub mod explorer;
pub mod mock;
pub mod models;
pub mod transcript;
pub mod utils;

// Re-export commonly used types
pub use explorer::{ExploreError, Explorer};
pub use models::{History, ResearchAnswer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
