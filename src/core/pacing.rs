//! Delays that make process interleavings observable
//!
//! Simulated processes start a little apart from each other, hold every
//! resource for a random time and pause briefly after each release. All of
//! these only ever block the calling process' own thread.

use crate::core::types::ProcessId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Timing configuration for simulated processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay between starting consecutive processes
    pub stagger_ms: u64,
    /// Minimum time a resource is held
    pub min_hold_ms: u64,
    /// Maximum time a resource is held
    pub max_hold_ms: u64,
    /// Pause after each release
    pub settle_ms: u64,
    /// Seed for reproducible hold times; entropy when unset
    pub seed: Option<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        PacingConfig {
            stagger_ms: 250,
            min_hold_ms: 400,
            max_hold_ms: 1600,
            settle_ms: 300,
            seed: None,
        }
    }
}

impl PacingConfig {
    /// No delays at all, for tests and benchmarks
    pub fn immediate() -> Self {
        PacingConfig {
            stagger_ms: 0,
            min_hold_ms: 0,
            max_hold_ms: 0,
            settle_ms: 0,
            seed: None,
        }
    }

    /// Random source for one process
    ///
    /// With a seed, each process gets its own deterministic stream derived
    /// from the seed and its id.
    pub fn rng_for(&self, process: ProcessId) -> ProcessRng {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(process as u64)),
            None => StdRng::from_os_rng(),
        };
        ProcessRng { rng }
    }

    /// Sleep before starting the next process
    pub fn stagger(&self) {
        sleep_ms(self.stagger_ms);
    }

    /// Sleep after a release
    pub fn settle(&self) {
        sleep_ms(self.settle_ms);
    }
}

/// Per-process random delay source
pub struct ProcessRng {
    rng: StdRng,
}

impl ProcessRng {
    /// Pick a hold duration within the configured range
    ///
    /// A reversed range is treated as its minimum.
    pub fn hold_duration(&mut self, config: &PacingConfig) -> Duration {
        let delay_ms = if config.max_hold_ms <= config.min_hold_ms {
            config.min_hold_ms
        } else {
            self.rng
                .random_range(config.min_hold_ms..=config.max_hold_ms)
        };
        Duration::from_millis(delay_ms)
    }

    /// Sleep for a random hold duration
    pub fn hold(&mut self, config: &PacingConfig) {
        let delay = self.hold_duration(config);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

fn sleep_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
