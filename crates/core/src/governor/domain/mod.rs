pub mod governor;
pub mod governor_config;
pub mod profile_tuning;
pub mod sampling_profile;
pub mod throttle_level;
