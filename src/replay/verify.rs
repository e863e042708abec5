//! Verification API
//!
//! Verify a recorded game by deterministic replay: rebuild the simulation
//! from the config, re-apply every command and compare state hashes at
//! each checkpoint and at the end.

use thiserror::Error;
use tracing::{debug, info};

use crate::core::hash::StateHash;
use crate::game::config::{ConfigError, GameConfig};
use crate::game::simulation::Simulation;
use crate::game::state::GamePhase;
use crate::replay::transcript::{Transcript, TRANSCRIPT_VERSION};

/// Summary of a successful replay.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationReport {
    /// Commands re-applied.
    pub commands_replayed: usize,

    /// Checkpoints that matched.
    pub checkpoints_verified: usize,

    /// Final state hash (from replay).
    pub final_state_hash: StateHash,

    /// Phase the replay ended in.
    pub final_phase: GamePhase,

    /// Ticks simulated.
    pub final_tick: u32,

    /// Money at the end.
    pub money: u32,

    /// Lives at the end.
    pub lives: u32,

    /// Waves started.
    pub wave: u32,
}

/// Errors that can occur during verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Transcript version mismatch.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Transcript was recorded against a different config.
    #[error("transcript was recorded with a different config")]
    ConfigMismatch {
        /// Hash in the transcript.
        expected: StateHash,
        /// Hash of the supplied config.
        computed: StateHash,
    },

    /// Supplied config does not validate.
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Initial state hash mismatch.
    #[error("initial state hash mismatch")]
    InitialStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Checkpoint hash mismatch.
    #[error("checkpoint mismatch at tick {tick}")]
    CheckpointMismatch {
        /// Tick where mismatch occurred.
        tick: u32,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// A checkpoint points past the end of the command list.
    #[error("checkpoint at tick {tick} was never reached")]
    CheckpointNotReached {
        /// Tick of the unreached checkpoint.
        tick: u32,
    },

    /// Final state hash mismatch.
    #[error("final state hash mismatch")]
    FinalStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Transcript is incomplete.
    #[error("transcript is incomplete")]
    IncompleteTranscript,
}

/// Verify a transcript by full replay against `config`.
pub fn verify_transcript(
    config: &GameConfig,
    transcript: &Transcript,
) -> Result<VerificationReport, VerificationError> {
    if transcript.version != TRANSCRIPT_VERSION {
        return Err(VerificationError::VersionMismatch {
            expected: TRANSCRIPT_VERSION,
            got: transcript.version,
        });
    }
    let expected_final = transcript
        .final_state_hash
        .ok_or(VerificationError::IncompleteTranscript)?;

    let config_hash = config.fingerprint();
    if config_hash != transcript.metadata.config_hash {
        return Err(VerificationError::ConfigMismatch {
            expected: transcript.metadata.config_hash,
            computed: config_hash,
        });
    }

    // 1. Reconstruct initial state
    let mut sim = Simulation::new(config.clone())?;
    let initial = sim.state_hash();
    if initial != transcript.initial_state_hash {
        return Err(VerificationError::InitialStateMismatch {
            expected: transcript.initial_state_hash,
            computed: initial,
        });
    }

    // 2. Replay with checkpoint verification
    let mut checkpoints = transcript.checkpoints.iter().peekable();
    let mut verified = 0;

    for (index, command) in transcript.commands.iter().enumerate() {
        sim.apply(command);
        let applied = index as u32 + 1;

        while let Some(checkpoint) = checkpoints.next_if(|c| c.command_index == applied) {
            let computed = sim.state_hash();
            if computed != checkpoint.state_hash || sim.state().tick != checkpoint.tick {
                return Err(VerificationError::CheckpointMismatch {
                    tick: checkpoint.tick,
                    expected: checkpoint.state_hash,
                    computed,
                });
            }
            debug!("Checkpoint at tick {} verified", checkpoint.tick);
            verified += 1;
        }
    }

    if let Some(checkpoint) = checkpoints.next() {
        return Err(VerificationError::CheckpointNotReached { tick: checkpoint.tick });
    }

    // 3. Final state
    let computed = sim.state_hash();
    if computed != expected_final {
        return Err(VerificationError::FinalStateMismatch {
            expected: expected_final,
            computed,
        });
    }

    info!(
        "Transcript verified: {} commands, {} checkpoints, final hash {}",
        transcript.commands.len(),
        verified,
        hex::encode(&computed[..8])
    );

    let state = sim.state();
    Ok(VerificationReport {
        commands_replayed: transcript.commands.len(),
        checkpoints_verified: verified,
        final_state_hash: computed,
        final_phase: state.phase,
        final_tick: state.tick,
        money: state.money,
        lives: state.lives,
        wave: state.wave,
    })
}
