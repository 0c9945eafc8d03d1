use std::fmt;

/// Summary of recent capture load, worst last.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThrottleLevel {
    #[default]
    Normal,
    Degraded,
    Critical,
}

impl ThrottleLevel {
    pub(crate) fn index(self) -> usize {
        match self {
            ThrottleLevel::Normal => 0,
            ThrottleLevel::Degraded => 1,
            ThrottleLevel::Critical => 2,
        }
    }
}

impl fmt::Display for ThrottleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrottleLevel::Normal => write!(f, "normal"),
            ThrottleLevel::Degraded => write!(f, "degraded"),
            ThrottleLevel::Critical => write!(f, "critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_order_by_severity() {
        assert!(ThrottleLevel::Normal < ThrottleLevel::Degraded);
        assert!(ThrottleLevel::Degraded < ThrottleLevel::Critical);
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(ThrottleLevel::default(), ThrottleLevel::Normal);
    }
}
