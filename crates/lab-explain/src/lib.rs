//! Lab Explain
//!
//! Memoized AI explanations of simulation state.
//!
//! # Core Operations
//!
//! - **Signature**: snapshot → deterministic cache key
//! - **Explain**: cache hit returns stored text; miss asks the backend
//! - **Fallback**: backend failures yield fixed text and are never cached
//!
//! # Architecture
//!
//! ```text
//! snapshot → SignatureFn → ExplanationCache ─hit→ text
//!                                 │miss
//!                                 ↓
//!                        ExplanationBackend (HTTP)
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod signature;

pub use backend::{
    ExplanationBackend, ExplanationContext, ExplanationRequest, ExplanationResponse,
    HttpExplanationBackend,
};
pub use cache::{CacheStats, ExplanationCache};
pub use config::{ExplanationConfig, DEFAULT_STUDENT_QUERY, FALLBACK_EXPLANATION};
pub use error::{ExplainError, ExplainResult};
pub use signature::{canonical_signature, projected, SignatureFn};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for requesting explanations
    pub use crate::backend::{ExplanationBackend, HttpExplanationBackend};
    pub use crate::cache::ExplanationCache;
    pub use crate::config::ExplanationConfig;
    pub use crate::signature::SignatureFn;
}
