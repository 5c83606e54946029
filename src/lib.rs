//! Wayfarer is a forwarding HTTP gateway.
//!
//! A request to `/proxy/<segment>/<path>` is forwarded to the upstream
//! origin encoded (base64) in `<segment>`. HTML responses are rewritten so
//! that relative links, form actions, and CSS `url(...)` references keep
//! routing through the gateway, and headers that would stop the page from
//! rendering under a foreign origin are stripped. Everything else streams
//! back unchanged.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, encode, decode, health).
//! - [`config`] -- Settings validation and the derived runtime configuration.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`landing`] -- Built-in landing page and the plain-text 404 fallback.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- The ordered filter chain wrapped around the routes.
//! - [`proxy`] -- Target resolution, forwarding, and HTML rewriting.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `sentry-integration` | Sentry error tracking |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod landing;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod server;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
