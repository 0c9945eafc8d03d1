use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::governor::domain::profile_tuning::ProfileTuning;
use crate::governor::domain::sampling_profile::SamplingProfile;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed governor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid governor config: {0}")]
    Invalid(String),
}

/// Every number the capture governor uses, tunable without a rebuild.
///
/// Defaults reproduce the shipped behavior. Missing fields in a config file
/// fall back to these defaults; a profile that is present must be complete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    pub performance: ProfileTuning,
    pub balanced: ProfileTuning,
    /// Capture costs kept for the rolling average.
    pub cost_history_len: usize,
    pub failure_streak_cap: u32,
    /// Synthetic cost pushed on failure, as a multiple of the frame budget.
    pub failure_cost_multiplier: f32,
    pub normal_fps_cap: u32,
    pub critical_fps_cap: u32,
    pub min_fps: u32,
    pub user_fps_range: (u32, u32),
    pub display_fps_range: (u32, u32),
    pub default_frame_budget_ms: f32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            performance: ProfileTuning::performance(),
            balanced: ProfileTuning::balanced(),
            cost_history_len: 8,
            failure_streak_cap: 12,
            failure_cost_multiplier: 1.6,
            normal_fps_cap: 60,
            critical_fps_cap: 20,
            min_fps: 20,
            user_fps_range: (30, 120),
            display_fps_range: (30, 240),
            default_frame_budget_ms: 16.0,
        }
    }
}

impl GovernorConfig {
    pub fn tuning(&self, profile: SamplingProfile) -> &ProfileTuning {
        match profile {
            SamplingProfile::Performance => &self.performance,
            SamplingProfile::Balanced => &self.balanced,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.performance.validate("performance")?;
        self.balanced.validate("balanced")?;

        if self.cost_history_len == 0 {
            return Err(ConfigError::Invalid("cost_history_len must be at least 1".into()));
        }
        if self.failure_streak_cap == 0 {
            return Err(ConfigError::Invalid("failure_streak_cap must be at least 1".into()));
        }
        if !(self.failure_cost_multiplier > 0.0) || !(self.default_frame_budget_ms > 0.0) {
            return Err(ConfigError::Invalid(
                "failure_cost_multiplier and default_frame_budget_ms must be positive".into(),
            ));
        }
        if self.min_fps == 0 || self.critical_fps_cap == 0 || self.normal_fps_cap == 0 {
            return Err(ConfigError::Invalid("fps caps must be positive".into()));
        }
        for (name, (lo, hi)) in [
            ("user_fps_range", self.user_fps_range),
            ("display_fps_range", self.display_fps_range),
        ] {
            if lo == 0 || lo > hi {
                return Err(ConfigError::Invalid(format!("{name} must satisfy 0 < lo <= hi")));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GovernorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
