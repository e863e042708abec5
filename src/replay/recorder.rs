//! Command Recorder
//!
//! Wraps a [`Simulation`] and writes every command it applies into a
//! [`Transcript`], hashing the state every `checkpoint_interval` ticks.

use chrono::Utc;
use tracing::debug;

use crate::game::command::{Command, CommandOutcome};
use crate::game::simulation::Simulation;
use crate::replay::transcript::{Transcript, TranscriptMetadata};

/// Records a game as it is played.
#[derive(Debug)]
pub struct Recorder {
    simulation: Simulation,
    transcript: Transcript,
    checkpoint_interval: u32,
}

impl Recorder {
    /// Start recording. The simulation should be fresh (or just reset).
    pub fn new(simulation: Simulation) -> Self {
        let metadata = TranscriptMetadata {
            config_hash: simulation.config().fingerprint(),
            recorded_at: Utc::now(),
            crate_version: crate::VERSION.to_string(),
        };
        let checkpoint_interval = simulation.config().settings.checkpoint_interval;
        let transcript = Transcript::new(metadata, simulation.state_hash());
        Self {
            simulation,
            transcript,
            checkpoint_interval,
        }
    }

    /// The wrapped simulation (read-only; mutate through [`Recorder::apply`]).
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Transcript so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Apply `command` and record it.
    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        let tick_before = self.simulation.state().tick;
        let outcome = self.simulation.apply(&command);
        self.transcript.commands.push(command);

        let tick = self.simulation.state().tick;
        if self.checkpoint_interval > 0 && tick != tick_before && tick % self.checkpoint_interval == 0 {
            let hash = self.simulation.state_hash();
            debug!("Checkpoint at tick {}: {}", tick, hex::encode(&hash[..8]));
            self.transcript.add_checkpoint(tick, hash);
        }

        outcome
    }

    /// Stop recording; returns the simulation and the sealed transcript.
    pub fn finish(mut self) -> (Simulation, Transcript) {
        self.transcript.finalize(self.simulation.state_hash());
        (self.simulation, self.transcript)
    }
}
