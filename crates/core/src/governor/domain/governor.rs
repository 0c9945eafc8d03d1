use std::collections::VecDeque;

use crate::governor::domain::governor_config::GovernorConfig;
use crate::governor::domain::sampling_profile::SamplingProfile;
use crate::governor::domain::throttle_level::ThrottleLevel;

/// Feedback controller for backdrop capture.
///
/// Tracks recent capture cost against the frame budget and the current
/// failure streak, and condenses them into a [`ThrottleLevel`] that drives
/// capture rate, capture resolution and blur strength. The level is
/// recomputed after every attempt; once Critical is entered it stays pinned
/// for the profile's cooldown.
pub struct Governor {
    config: GovernorConfig,
    level: ThrottleLevel,
    cost_history_ms: VecDeque<u64>,
    failure_streak: u32,
    cooldown_until_ms: u64,
    frame_budget_ms: f32,
}

impl Governor {
    pub fn new(config: GovernorConfig) -> Self {
        let frame_budget_ms = config.default_frame_budget_ms;
        let capacity = config.cost_history_len;
        Self {
            config,
            level: ThrottleLevel::Normal,
            cost_history_ms: VecDeque::with_capacity(capacity + 1),
            failure_streak: 0,
            cooldown_until_ms: 0,
            frame_budget_ms,
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn level(&self) -> ThrottleLevel {
        self.level
    }

    pub fn failure_streak(&self) -> u32 {
        self.failure_streak
    }

    pub fn cooldown_until_ms(&self) -> u64 {
        self.cooldown_until_ms
    }

    pub fn frame_budget_ms(&self) -> f32 {
        self.frame_budget_ms
    }

    pub fn is_cooling_down(&self, now_ms: u64) -> bool {
        now_ms < self.cooldown_until_ms
    }

    pub fn average_cost_ms(&self) -> f32 {
        if self.cost_history_ms.is_empty() {
            return 0.0;
        }
        let total: u64 = self.cost_history_ms.iter().sum();
        total as f32 / self.cost_history_ms.len() as f32
    }

    /// Rolling average cost divided by the last frame budget.
    pub fn cost_ratio(&self) -> f32 {
        if self.frame_budget_ms > 0.0 {
            self.average_cost_ms() / self.frame_budget_ms
        } else {
            0.0
        }
    }

    /// Capture rate cap for the next request.
    ///
    /// The minimum of the clamped user rate, the clamped display refresh
    /// rate, the blur-radius cap and the throttle cap, floored at `min_fps`.
    pub fn effective_fps(
        &self,
        user_fps: u32,
        display_hz: f32,
        blur_radius: u32,
        profile: SamplingProfile,
        now_ms: u64,
    ) -> u32 {
        let config = &self.config;
        let tuning = config.tuning(profile);

        let user = user_fps.clamp(config.user_fps_range.0, config.user_fps_range.1);
        let display = (display_hz.round() as u32).clamp(config.display_fps_range.0, config.display_fps_range.1);
        let radius_cap = tuning.radius_fps_cap(blur_radius);
        let throttle_cap = if self.level == ThrottleLevel::Critical || self.is_cooling_down(now_ms) {
            config.critical_fps_cap
        } else if self.level == ThrottleLevel::Degraded {
            tuning.degraded_fps_cap
        } else {
            config.normal_fps_cap
        };

        user.min(display)
            .min(radius_cap)
            .min(throttle_cap)
            .max(config.min_fps)
    }

    /// Fraction of the source size to sample at the current level.
    pub fn capture_scale(&self, blur_radius: u32, profile: SamplingProfile) -> f32 {
        self.config.tuning(profile).capture_scale(blur_radius, self.level)
    }

    /// Blur radius multiplier for the current level.
    pub fn blur_radius_factor(&self, profile: SamplingProfile) -> f32 {
        self.config.tuning(profile).blur_radius_factor(self.level)
    }

    /// Folds a published capture into the statistics.
    pub fn record_success(&mut self, cost_ms: u64, effective_fps: u32, now_ms: u64, profile: SamplingProfile) {
        self.push_cost(cost_ms);
        self.frame_budget_ms = frame_budget_ms(effective_fps);
        self.failure_streak = self.failure_streak.saturating_sub(1);
        self.recalculate(now_ms, profile);
    }

    /// Folds a failed or rejected capture into the statistics.
    ///
    /// Pushes a synthetic cost above the frame budget so that persistent
    /// failures bias the level toward throttling.
    pub fn record_failure(&mut self, effective_fps: u32, now_ms: u64, profile: SamplingProfile) {
        self.failure_streak = (self.failure_streak + 1).min(self.config.failure_streak_cap);
        let budget = frame_budget_ms(effective_fps);
        let fallback = (budget * self.config.failure_cost_multiplier).round().max(1.0) as u64;
        self.push_cost(fallback);
        self.frame_budget_ms = budget;
        self.recalculate(now_ms, profile);
    }

    /// Recomputes the level from the failure streak, the cost ratio and the
    /// cooldown deadline.
    pub fn recalculate(&mut self, now_ms: u64, profile: SamplingProfile) -> ThrottleLevel {
        let previous = self.level;
        let ratio = self.cost_ratio();

        self.level = if self.is_cooling_down(now_ms) {
            ThrottleLevel::Critical
        } else {
            let tuning = self.config.tuning(profile);
            let streak = self.failure_streak;
            if streak >= tuning.critical_failure_streak || ratio >= tuning.critical_cost_ratio {
                self.cooldown_until_ms = now_ms + tuning.critical_cooldown_ms;
                ThrottleLevel::Critical
            } else if streak >= tuning.degraded_failure_streak || ratio >= tuning.degraded_cost_ratio {
                ThrottleLevel::Degraded
            } else {
                self.cooldown_until_ms = 0;
                ThrottleLevel::Normal
            }
        };

        if self.level != previous {
            log::info!(
                "Capture governor {previous} -> {} ({profile}, cost ratio {ratio:.2}, failure streak {})",
                self.level,
                self.failure_streak
            );
        }
        self.level
    }

    /// Back to Normal with no history.
    pub fn reset(&mut self) {
        self.level = ThrottleLevel::Normal;
        self.cost_history_ms.clear();
        self.failure_streak = 0;
        self.cooldown_until_ms = 0;
        self.frame_budget_ms = self.config.default_frame_budget_ms;
    }

    fn push_cost(&mut self, cost_ms: u64) {
        self.cost_history_ms.push_back(cost_ms);
        while self.cost_history_ms.len() > self.config.cost_history_len {
            self.cost_history_ms.pop_front();
        }
    }

    #[cfg(test)]
    pub(crate) fn set_level(&mut self, level: ThrottleLevel) {
        self.level = level;
    }
}

impl Default for Governor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}

/// Milliseconds available per frame at `fps`, at least 1.
pub fn frame_budget_ms(fps: u32) -> f32 {
    (1000.0 / fps.max(1) as f32).max(1.0)
}
