//! TALOS — Threshold-Aware Live Options Scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod broker;
pub mod config;
pub mod display;
pub mod engine;
pub mod strategy;
pub mod types;
