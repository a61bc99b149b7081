//! Core engine — the scan → resolve → execute pipeline.

pub mod executor;
pub mod resolver;
pub mod scanner;
