use crate::governor::domain::throttle_level::ThrottleLevel;

/// Snapshot of the sampler's counters and governor state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SamplerStats {
    /// Attempts handed to the capture worker.
    pub dispatched: u64,
    /// Frames made visible to consumers.
    pub published: u64,
    /// Attempts recorded as failures, white-frame rejections included.
    pub failed: u64,
    pub rejected_white: u64,
    /// Results dropped because a clear happened while they were in flight.
    pub discarded: u64,
    pub buffer_allocations: u64,
    pub level: ThrottleLevel,
    pub failure_streak: u32,
    pub average_cost_ms: f32,
}

impl SamplerStats {
    /// Fraction of dispatched attempts that were published.
    pub fn publish_rate(&self) -> f64 {
        if self.dispatched == 0 {
            return 0.0;
        }
        self.published as f64 / self.dispatched as f64
    }

    /// Multi-line report, or `None` if nothing was dispatched.
    pub fn summary_string(&self) -> Option<String> {
        if self.dispatched == 0 {
            return None;
        }

        let lines = [
            format!("Sampler summary ({} attempts):", self.dispatched),
            format!(
                "  published   : {:6}  ({:4.1}%)",
                self.published,
                self.publish_rate() * 100.0
            ),
            format!(
                "  failed      : {:6}  (white {})",
                self.failed, self.rejected_white
            ),
            format!("  discarded   : {:6}", self.discarded),
            format!("  allocations : {:6}", self.buffer_allocations),
            format!(
                "  governor    : {} (streak {}, avg cost {:.1}ms)",
                self.level, self.failure_streak, self.average_cost_ms
            ),
        ];
        Some(lines.join("\n"))
    }

    pub fn log_summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_stats_have_no_summary() {
        assert!(SamplerStats::default().summary_string().is_none());
        assert_relative_eq!(SamplerStats::default().publish_rate(), 0.0);
    }

    #[test]
    fn test_summary_includes_counters() {
        let stats = SamplerStats {
            dispatched: 4,
            published: 3,
            failed: 1,
            rejected_white: 1,
            buffer_allocations: 1,
            level: ThrottleLevel::Degraded,
            failure_streak: 1,
            average_cost_ms: 4.0,
            ..Default::default()
        };
        let text = stats.summary_string().unwrap();
        assert!(text.contains("Sampler summary (4 attempts)"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("white 1"));
        assert!(text.contains("degraded (streak 1, avg cost 4.0ms)"));
        assert_relative_eq!(stats.publish_rate(), 0.75);
    }
}
