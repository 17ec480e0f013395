//! HTTP API — axum router in front of the [`Summarizer`](crate::Summarizer).
//!
//! ```text
//! ┌──────────┐   POST /summarize    ┌──────────────┐      ┌────────────┐
//! │  Client  │─────────────────────▶│  API Server  │─────▶│ Summarizer │
//! └──────────┘   GET  /health       │   (axum)     │      └────────────┘
//!                                   └──────────────┘
//! ```
//!
//! Every response carries an `x-process-time` header with the handling time
//! in seconds.

pub mod routes;
pub mod types;

pub use routes::{AppState, PROCESS_TIME_HEADER, router, serve};
pub use types::*;
