//! Shared types for QuillDB: type-safe identifiers, executor configuration
//! and per-query options.
//!
//! This crate sits at the bottom of the workspace dependency graph and must
//! stay free of heavyweight dependencies.

pub mod config;
pub mod ids;
pub mod options;

pub use config::ExecutorConfig;
pub use ids::{DatabaseId, LiveQueryId, NamespaceId, SessionId};
pub use options::Options;
