use crate::governor::domain::governor_config::GovernorConfig;

/// Construction options for [`FrameSampler`](super::frame_sampler::FrameSampler).
#[derive(Clone, Debug)]
pub struct SamplerConfig {
    pub governor: GovernorConfig,
    /// When false every capture request degrades to a clear and nothing is
    /// ever published.
    pub blur_supported: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            governor: GovernorConfig::default(),
            blur_supported: true,
        }
    }
}

impl SamplerConfig {
    pub fn with_governor(governor: GovernorConfig) -> Self {
        Self {
            governor,
            ..Self::default()
        }
    }

    pub fn unsupported() -> Self {
        Self {
            blur_supported: false,
            ..Self::default()
        }
    }
}
