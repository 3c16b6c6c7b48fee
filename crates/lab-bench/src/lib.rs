//! Lab Bench
//!
//! Command-line harness for guided simulations.
//!
//! # Core Operations
//!
//! - **Config**: TOML file plus `LAB_*` environment overrides
//! - **Walkthrough**: activate each task, apply its scripted solution, record the panel
//!
//! # Architecture
//!
//! ```text
//! LabConfig ─→ SpeechDelivery + ExplanationCache
//!                      ↓
//! Domain ─→ GuideSession ─drive(solutions)→ WalkthroughReport
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod solutions;
pub mod walkthrough;

pub use config::LabConfig;
pub use walkthrough::{Domain, StepReport, WalkthroughOptions, WalkthroughReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
