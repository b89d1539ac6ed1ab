use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// Root directory scanned recursively for figures on every operation.
    pub figure_library_path: PathBuf,
    /// Delay between the last transition and the next automatic advance.
    #[serde(default = "Configuration::default_interval", with = "humantime_serde")]
    pub interval: Duration,
    /// Optional deterministic seed for the traversal shuffle.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
    /// Capacity of the command queue feeding the slideshow task.
    #[serde(default = "Configuration::default_command_queue_capacity")]
    pub command_queue_capacity: usize,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.figure_library_path.as_os_str().is_empty(),
            "figure-library-path must not be empty"
        );
        ensure!(!self.interval.is_zero(), "interval must be greater than zero");
        ensure!(
            self.command_queue_capacity > 0,
            "command-queue-capacity must be greater than zero"
        );
        Ok(self)
    }

    /// Shuffle source honoring `shuffle-seed` when present.
    pub fn shuffle_rng(&self) -> StdRng {
        match self.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    const fn default_interval() -> Duration {
        DEFAULT_INTERVAL
    }

    const fn default_command_queue_capacity() -> usize {
        16
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            figure_library_path: PathBuf::new(),
            interval: Self::default_interval(),
            shuffle_seed: None,
            command_queue_capacity: Self::default_command_queue_capacity(),
        }
    }
}
