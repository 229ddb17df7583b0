//! Image recompression service.
//!
//! Uploads are decoded, flattened to RGB and re-encoded as JPEG at a
//! caller-chosen quality. Every result is kept in a process-wide registry so
//! it can be downloaded individually or bundled into a zip.

pub mod codec;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod server;
pub mod telemetry;
