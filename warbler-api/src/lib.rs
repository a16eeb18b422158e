//! # Warbler API Server Library
//!
//! HTTP surface of the Warbler backend. The domain logic lives in
//! `warbler-shared`; this crate adds configuration, routing and the mapping
//! of domain outcomes to HTTP responses.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers
//! - `telemetry`: Tracing subscriber setup

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;
