use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tuning family chosen by the caller for a capture context.
///
/// `Performance` protects an interactive, frame-rate-critical scene (e.g. a
/// running game) and samples smaller and less often. `Balanced` is for
/// ordinary UI screens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingProfile {
    Performance,
    #[default]
    Balanced,
}

impl SamplingProfile {
    pub const ALL: &[SamplingProfile] = &[SamplingProfile::Performance, SamplingProfile::Balanced];
}

impl fmt::Display for SamplingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingProfile::Performance => write!(f, "performance"),
            SamplingProfile::Balanced => write!(f, "balanced"),
        }
    }
}

impl FromStr for SamplingProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "performance" | "perf" => Ok(SamplingProfile::Performance),
            "balanced" => Ok(SamplingProfile::Balanced),
            other => Err(format!(
                "unknown sampling profile '{other}' (expected performance or balanced)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::performance("performance", SamplingProfile::Performance)]
    #[case::short("perf", SamplingProfile::Performance)]
    #[case::balanced("Balanced", SamplingProfile::Balanced)]
    fn test_parse(#[case] input: &str, #[case] expected: SamplingProfile) {
        assert_eq!(input.parse::<SamplingProfile>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_fails() {
        assert!("turbo".parse::<SamplingProfile>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for profile in SamplingProfile::ALL {
            assert_eq!(profile.to_string().parse::<SamplingProfile>().unwrap(), *profile);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&SamplingProfile::Performance).unwrap();
        assert_eq!(json, "\"performance\"");
    }
}
