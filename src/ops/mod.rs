//! High-level operations.
//!
//! This module contains the diagnostics surface: engine status, the engine
//! self test, and troubleshooting guidance.

pub mod status;
pub mod test_backend;
pub mod troubleshoot;

pub use status::{backend_status, fallback_note, format_status, is_backend_available};
pub use test_backend::{format_report, test_backend, BackendTestReport, CheckResult};
pub use troubleshoot::{
    format_guidance, troubleshooting_guidance, troubleshooting_guidance_for, Guidance,
};
