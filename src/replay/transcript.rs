//! Game Transcript
//!
//! Records everything needed to replay a game and check it ended in the
//! same state: the command stream, periodic state hashes and the final hash.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::StateHash;
use crate::game::command::Command;

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Complete transcript of one recorded game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Recording metadata.
    pub metadata: TranscriptMetadata,

    /// State hash before the first command.
    pub initial_state_hash: StateHash,

    /// Every command applied, in order (rejected ones included).
    pub commands: Vec<Command>,

    /// State hash checkpoints (every N ticks for partial verification).
    pub checkpoints: Vec<StateCheckpoint>,

    /// State hash after the last command; `None` until finished.
    pub final_state_hash: Option<StateHash>,
}

/// Recording metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    /// Fingerprint of the config the game ran on.
    pub config_hash: StateHash,

    /// When recording started.
    pub recorded_at: DateTime<Utc>,

    /// Crate version that produced the transcript.
    pub crate_version: String,
}

/// State checkpoint for partial verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Tick number.
    pub tick: u32,

    /// Number of commands applied when the hash was taken.
    pub command_index: u32,

    /// State hash at this point.
    pub state_hash: StateHash,
}

/// Errors that can occur with transcripts.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Binary encoding failed.
    #[error("binary encoding failed: {0}")]
    Binary(#[from] bincode::Error),

    /// JSON encoding failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Version mismatch.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Version found in the data
        got: u8,
    },
}

impl Transcript {
    /// Start an empty transcript.
    pub fn new(metadata: TranscriptMetadata, initial_state_hash: StateHash) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            metadata,
            initial_state_hash,
            commands: Vec::new(),
            checkpoints: Vec::new(),
            final_state_hash: None,
        }
    }

    /// Record a state checkpoint.
    pub fn add_checkpoint(&mut self, tick: u32, state_hash: StateHash) {
        self.checkpoints.push(StateCheckpoint {
            tick,
            command_index: self.commands.len() as u32,
            state_hash,
        });
    }

    /// Seal the transcript with the final hash.
    pub fn finalize(&mut self, final_state_hash: StateHash) {
        self.final_state_hash = Some(final_state_hash);
    }

    /// Check if transcript is complete.
    pub fn is_complete(&self) -> bool {
        self.final_state_hash.is_some()
    }

    /// Number of tick commands recorded.
    pub fn tick_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Tick { .. }))
            .count()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Transcript = bincode::deserialize(data)?;
        transcript.check_version()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, TranscriptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, TranscriptError> {
        let transcript: Transcript = serde_json::from_str(json)?;
        transcript.check_version()
    }

    fn check_version(self) -> Result<Self, TranscriptError> {
        if self.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: self.version,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Cell;
    use crate::game::tower::TowerId;

    fn sample() -> Transcript {
        let metadata = TranscriptMetadata {
            config_hash: [5; 32],
            recorded_at: Utc::now(),
            crate_version: "0.1.0".into(),
        };
        let mut transcript = Transcript::new(metadata, [1; 32]);
        transcript.commands.push(Command::Tick { now_ms: 0.0 });
        transcript.commands.push(Command::BuildTower {
            tower_type: "basic".into(),
            cell: Cell::new(2, 0),
        });
        transcript.commands.push(Command::StartNextWave);
        transcript.commands.push(Command::Tick { now_ms: 16.5 });
        transcript.add_checkpoint(2, [7; 32]);
        transcript.commands.push(Command::UpgradeTower { tower_id: TowerId(1) });
        transcript.finalize([9; 32]);
        transcript
    }

    #[test]
    fn test_checkpoint_records_command_index() {
        let transcript = sample();
        assert_eq!(transcript.checkpoints[0].tick, 2);
        assert_eq!(transcript.checkpoints[0].command_index, 4);
        assert_eq!(transcript.tick_count(), 2);
        assert!(transcript.is_complete());
    }

    #[test]
    fn test_binary_and_json_encodings_agree() {
        let transcript = sample();

        let bytes = transcript.to_bytes().unwrap();
        let from_bytes = Transcript::from_bytes(&bytes).unwrap();
        let from_json = Transcript::from_json(&transcript.to_json().unwrap()).unwrap();

        assert_eq!(from_bytes, transcript);
        assert_eq!(from_json, transcript);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut transcript = sample();
        transcript.version = 42;
        let bytes = transcript.to_bytes().unwrap();
        assert!(matches!(
            Transcript::from_bytes(&bytes),
            Err(TranscriptError::VersionMismatch { expected: 1, got: 42 })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(Transcript::from_bytes(&[0xff, 0x00]), Err(TranscriptError::Binary(_))));
        assert!(matches!(Transcript::from_json("[]"), Err(TranscriptError::Json(_))));
    }
}
