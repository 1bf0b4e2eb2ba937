//! cardflow-core library.
//!
//! Turns board activity (items and their change history) into per-bucket
//! counts: a single-instant snapshot and a dense, day-aligned time series.
//!
//! # Layout
//!
//! - [`event`] — raw action decoding, normalization, filtering.
//! - [`timeseries`] — date ranges, the bucket counter, the assembler.
//! - [`snapshot`] — current item distribution per bucket.
//! - [`cache`] — CSV/scalar artifacts that avoid recomputation.
//! - [`source`] — the [`source::BoardSource`] trait and the Trello client.
//! - [`pipeline`] — collection flows that tie a source to the aggregators.
//! - [`config`] / [`error`] — configuration and error codes.
//! - [`instant`] — the canonical UTC instant text form.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module, each mapped to an
//!   [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod instant;
pub mod pipeline;
pub mod snapshot;
pub mod source;
pub mod timeseries;

/// Canonical text format for instants in cache files and day keys.
pub const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
