//! Lab Guide
//!
//! Narrated guidance on top of the task runner.
//!
//! # Core Operations
//!
//! - **Observe**: task fields → announce on a change of active task identity
//! - **Defer**: hold an announcement until the user interacts, unmutes or reopens
//! - **Explain**: fetch an explanation, dropped if the context moved on
//! - **Deliver**: run speech commands against a [`lab_speech::SpeechDelivery`]
//!
//! # Architecture
//!
//! ```text
//! TaskRunner ─observe→ NarrationController ─commands→ GuideSession
//!                            ↑ events                     │
//!                 gesture/mute/close/open                 ↓
//!                                              SpeechDelivery + panel
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod controller;
pub mod script;
pub mod session;
pub mod state;

pub use config::GuideConfig;
pub use controller::{
    DisplayKind, ExplanationTicket, NarrationCommand, NarrationController, SpeechKind, SpeechToken,
};
pub use script::{GuideMessage, GuideScript};
pub use session::{ExplanationJob, ExplanationReply, GuideSession, PanelLine, SessionSummary};
pub use state::NarrationState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for guided sessions
    pub use crate::config::GuideConfig;
    pub use crate::controller::{NarrationCommand, NarrationController};
    pub use crate::script::{GuideMessage, GuideScript};
    pub use crate::session::GuideSession;
    pub use crate::state::NarrationState;
}
