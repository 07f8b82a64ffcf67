//! Tracing setup: structured JSON logs with optional OTLP span export.
//!
//! # Telemetry invariants
//!
//! - **No plaintext field values, ciphertext, or key material** may appear in
//!   any span attribute or log field. Record ids are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
