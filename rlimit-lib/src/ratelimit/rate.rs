use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::types::ErrorKind;

/// Default number of slots in the capacity pool, 2.
pub const DEFAULT_RATE_COUNT: usize = 2;

/// Default duration a slot stays held after acquisition, 3 seconds.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(3);

/// How many outbound requests may be started per time window.
///
/// The `window` is used as a fixed hold time per admission, not a rolling
/// clock: every admitted request occupies one of `count` slots for the full
/// `window`, regardless of how quickly the upstream answers. The resulting
/// throughput ceiling is `count / window`, independent of upstream latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// Number of slots in the capacity pool
    pub count: NonZeroUsize,

    /// Duration a slot stays held after acquisition
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Rate {
    /// Create a new rate of `count` admissions per `window`
    #[must_use]
    pub const fn new(count: NonZeroUsize, window: Duration) -> Self {
        Self { count, window }
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self {
            count: NonZeroUsize::new(DEFAULT_RATE_COUNT).expect("default count is non-zero"),
            window: DEFAULT_RATE_WINDOW,
        }
    }
}

impl FromStr for Rate {
    type Err = ErrorKind;

    /// Parse a rate from its `COUNT/WINDOW` form, e.g. `2/3s` or `10/500ms`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ErrorKind::InvalidRate(s.to_string());
        let (count, window) = s.split_once('/').ok_or_else(invalid)?;
        let count: NonZeroUsize = count.trim().parse().map_err(|_| invalid())?;
        let window = humantime::parse_duration(window.trim()).map_err(|_| invalid())?;
        Ok(Self { count, window })
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.count,
            humantime::format_duration(self.window)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        let rate = Rate::default();
        assert_eq!(rate.count.get(), 2);
        assert_eq!(rate.window, Duration::from_secs(3));
    }

    #[test]
    fn test_parse_rate() {
        let rate: Rate = "3/1s".parse().unwrap();
        assert_eq!(rate.count.get(), 3);
        assert_eq!(rate.window, Duration::from_secs(1));

        let rate: Rate = "10/500ms".parse().unwrap();
        assert_eq!(rate.count.get(), 10);
        assert_eq!(rate.window, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_rate_rejects_garbage() {
        assert!("".parse::<Rate>().is_err());
        assert!("3".parse::<Rate>().is_err());
        assert!("0/1s".parse::<Rate>().is_err());
        assert!("three/1s".parse::<Rate>().is_err());
        assert!("3/eventually".parse::<Rate>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let rate: Rate = "5/2s".parse().unwrap();
        assert_eq!(rate.to_string(), "5/2s");
        assert_eq!(rate.to_string().parse::<Rate>().unwrap(), rate);
    }

    #[test]
    fn test_rate_serialization() {
        let rate: Rate = "4/250ms".parse().unwrap();
        let toml = toml::to_string(&rate).unwrap();
        let deserialized: Rate = toml::from_str(&toml).unwrap();
        assert_eq!(rate, deserialized);
    }
}
