//! Backend for the CivicFix issue-reporting platform.
//!
//! The crate exposes three collaborating components behind axum routers:
//! the contractor directory, the service request ledger that gates report
//! links on contractor verification, and the image scan gateway that
//! classifies civic-issue photos through an external vision model.

pub mod config;
pub mod contractors;
pub mod error;
pub mod scan;
pub mod service_requests;
pub mod store;
pub mod telemetry;
