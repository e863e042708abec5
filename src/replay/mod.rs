//! Replay Module
//!
//! Record a game as a command transcript and verify it by replaying.
//!
//! ## Flow
//!
//! 1. Wrap a fresh [`Simulation`](crate::game::Simulation) in a [`Recorder`]
//! 2. Drive the game through [`Recorder::apply`]
//! 3. [`Recorder::finish`] seals the [`Transcript`] with the final hash
//! 4. Anyone holding the config can run [`verify_transcript`]

pub mod transcript;
pub mod recorder;
pub mod verify;

pub use transcript::{StateCheckpoint, Transcript, TranscriptError, TranscriptMetadata, TRANSCRIPT_VERSION};
pub use recorder::Recorder;
pub use verify::{verify_transcript, VerificationError, VerificationReport};
