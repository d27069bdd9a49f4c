use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::exercises::{CaptureSettings, DragSettings, PuzzleSettings, RepetitionSettings};
use crate::gesture::{CircleThresholds, ClassifierThresholds, GraspThresholds};
use crate::puzzle::MAX_GRID_SIZE;
use crate::stats::ReportingSettings;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// The camera preview is mirrored, so landmark x is flipped before use.
    pub mirror_x: bool,
    /// Consecutive failed reads before the source is treated as gone.
    pub max_consecutive_failures: u32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            mirror_x: true,
            max_consecutive_failures: 30,
        }
    }
}

/// Every tunable of the engine. Any field missing from the file keeps its
/// default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub classifier: ClassifierThresholds,
    pub circle: CircleThresholds,
    pub grasp: GraspThresholds,
    pub input: InputSettings,
    pub capture: CaptureSettings,
    pub drag: DragSettings,
    pub puzzle: PuzzleSettings,
    pub repetition: RepetitionSettings,
    pub reporting: ReportingSettings,
    /// Fixed RNG seed for reproducible boards and respawns.
    pub seed: Option<u64>,
}

impl EngineSettings {
    /// Read settings from `path`. A missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let mut settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", path.display()))?;
        settings.clamp_ranges();
        Ok(settings)
    }

    fn clamp_ranges(&mut self) {
        let grid = self.puzzle.grid_size;
        if !(2..=MAX_GRID_SIZE).contains(&grid) {
            self.puzzle.grid_size = grid.clamp(2, MAX_GRID_SIZE);
            log_warn!(
                "puzzle grid_size {} out of range, using {}",
                grid,
                self.puzzle.grid_size
            );
        }
    }

    /// Like [`EngineSettings::from_file`], but never fails: problems are
    /// logged and the defaults are used instead.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_file(path) {
            Ok(settings) => settings,
            Err(err) => {
                log_warn!("{err:#}; falling back to default settings");
                Self::default()
            }
        }
    }
}
