use serde::{Deserialize, Serialize};

use crate::governor::domain::governor_config::ConfigError;
use crate::governor::domain::throttle_level::ThrottleLevel;

/// Empirically tuned numbers for one sampling profile.
///
/// Three-element arrays are indexed by blur-radius bucket (radius 0-4, 5-10,
/// above 10) or by throttle level (normal, degraded, critical).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileTuning {
    pub critical_failure_streak: u32,
    pub critical_cost_ratio: f32,
    pub degraded_failure_streak: u32,
    pub degraded_cost_ratio: f32,
    /// How long Critical stays pinned once entered.
    pub critical_cooldown_ms: u64,
    pub degraded_fps_cap: u32,
    pub radius_fps_caps: [u32; 3],
    pub base_scales: [f32; 3],
    pub degraded_scale_factor: f32,
    pub critical_scale_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub blur_radius_factors: [f32; 3],
}

impl ProfileTuning {
    /// Tuning for frame-rate-critical scenes.
    pub fn performance() -> Self {
        Self {
            critical_failure_streak: 2,
            critical_cost_ratio: 1.15,
            degraded_failure_streak: 1,
            degraded_cost_ratio: 0.78,
            critical_cooldown_ms: 900,
            degraded_fps_cap: 28,
            radius_fps_caps: [36, 28, 20],
            base_scales: [0.22, 0.17, 0.13],
            degraded_scale_factor: 0.82,
            critical_scale_factor: 0.70,
            min_scale: 0.10,
            max_scale: 0.22,
            blur_radius_factors: [0.65, 0.52, 0.40],
        }
    }

    /// Tuning for ordinary UI screens.
    pub fn balanced() -> Self {
        Self {
            critical_failure_streak: 3,
            critical_cost_ratio: 1.35,
            degraded_failure_streak: 1,
            degraded_cost_ratio: 0.95,
            critical_cooldown_ms: 700,
            degraded_fps_cap: 36,
            radius_fps_caps: [45, 36, 24],
            base_scales: [0.30, 0.24, 0.18],
            degraded_scale_factor: 0.85,
            critical_scale_factor: 0.72,
            min_scale: 0.12,
            max_scale: 0.30,
            blur_radius_factors: [0.78, 0.62, 0.50],
        }
    }

    /// Larger radii hide more sampling error, so they get a lower rate cap.
    pub fn radius_fps_cap(&self, blur_radius: u32) -> u32 {
        self.radius_fps_caps[radius_bucket(blur_radius)]
    }

    /// Fraction of the source size to sample at.
    pub fn capture_scale(&self, blur_radius: u32, level: ThrottleLevel) -> f32 {
        let base = self.base_scales[radius_bucket(blur_radius)];
        let factor = match level {
            ThrottleLevel::Normal => 1.0,
            ThrottleLevel::Degraded => self.degraded_scale_factor,
            ThrottleLevel::Critical => self.critical_scale_factor,
        };
        (base * factor).clamp(self.min_scale, self.max_scale)
    }

    /// Multiplier the compositor applies to the user's blur radius.
    pub fn blur_radius_factor(&self, level: ThrottleLevel) -> f32 {
        self.blur_radius_factors[level.index()]
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |what: &str| Err(ConfigError::Invalid(format!("{name}: {what}")));

        if self.degraded_failure_streak == 0 || self.degraded_failure_streak > self.critical_failure_streak {
            return invalid("failure streaks must satisfy 1 <= degraded <= critical");
        }
        if !(self.degraded_cost_ratio > 0.0 && self.degraded_cost_ratio <= self.critical_cost_ratio) {
            return invalid("cost ratios must satisfy 0 < degraded <= critical");
        }
        if self.degraded_fps_cap == 0 || self.radius_fps_caps.contains(&0) {
            return invalid("fps caps must be positive");
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale && self.max_scale <= 1.0) {
            return invalid("scales must satisfy 0 < min <= max <= 1");
        }
        if self.base_scales.iter().any(|s| !(*s > 0.0 && *s <= 1.0)) {
            return invalid("base scales must be in (0, 1]");
        }
        let factors = [self.degraded_scale_factor, self.critical_scale_factor];
        if factors.iter().chain(&self.blur_radius_factors).any(|f| !(*f > 0.0 && *f <= 1.0)) {
            return invalid("scale and blur factors must be in (0, 1]");
        }
        Ok(())
    }
}

fn radius_bucket(blur_radius: u32) -> usize {
    match blur_radius {
        0..=4 => 0,
        5..=10 => 1,
        _ => 2,
    }
}
