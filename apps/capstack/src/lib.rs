//! # Capstack Library
//!
//! This library exposes the Capstack modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;

// Re-export capstack_core for convenience
pub use capstack_core;
