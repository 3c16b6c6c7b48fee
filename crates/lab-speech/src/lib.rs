//! Lab Speech
//!
//! Speech delivery for narration.
//!
//! # Delivery paths
//!
//! - **On-device**: local engine, fixed rate/pitch, regional voice preference
//! - **Proxy**: sanitize, cap, map language, fetch audio, play through a sink
//! - **Router**: picks a path by sanitized length
//!
//! All paths implement [`SpeechDelivery`]; callers only `speak` and `cancel`.
//!
//! ```text
//! text ─→ SpeechRouter ─short→ OnDeviceSpeech ─→ SpeechEngine
//!                      └─long─→ ProxySpeech ─→ TtsClient ─→ AudioSink
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod delivery;
pub mod error;
pub mod language;
pub mod on_device;
pub mod proxy;
pub mod router;
pub mod sanitize;
pub mod spool;

pub use config::SpeechConfig;
pub use delivery::{
    CancelHandle, PlaybackControl, PlaybackOutcome, PlaybackReporter, SpeechDelivery, Utterance,
    UtteranceId,
};
pub use error::{SpeechError, SpeechResult};
pub use language::LanguageHint;
pub use on_device::{ConsoleSpeechEngine, OnDeviceSpeech, SpeechEngine, SynthesisRequest, Voice};
pub use proxy::{AudioClip, AudioSink, HttpTtsClient, ProxySpeech, TtsClient, TtsRequest};
pub use router::SpeechRouter;
pub use spool::SpoolAudioSink;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for speaking
    pub use crate::delivery::{PlaybackOutcome, SpeechDelivery, Utterance, UtteranceId};
    pub use crate::error::{SpeechError, SpeechResult};
    pub use crate::language::LanguageHint;
}
