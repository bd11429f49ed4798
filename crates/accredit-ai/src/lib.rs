//! Core library for the accreditation assessment service.
//!
//! The interesting machinery lives under [`workflows::assessment`]: the
//! versioned answer ledger, cross-unit reference resolution, evidence
//! linkage, the sandboxed formula engine, and the score-band registry.
//! [`workflows::template`] ingests matrix templates from CSV exports.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
