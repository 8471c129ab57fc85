//! Engine configuration, loaded from environment variables with sensible
//! defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::matcher::MatcherConfig;
use crate::scan::DEFAULT_FETCH_TIMEOUT;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of known-spam reference images (default: `references`).
    pub store_dir: PathBuf,
    /// Matching thresholds.
    pub matcher: MatcherConfig,
    /// Independent per-URL fetch timeout (default: 8 s).
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("references"),
            matcher: MatcherConfig::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from `HASHWARD_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = MatcherConfig::default();

        let store_dir = std::env::var("HASHWARD_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("references"));

        let threshold = std::env::var("HASHWARD_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.threshold);

        let min_votes = std::env::var("HASHWARD_MIN_VOTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.min_votes);

        let min_grid_matches = std::env::var("HASHWARD_MIN_GRID_MATCHES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.min_grid_matches);

        let frame_limit = std::env::var("HASHWARD_FRAME_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.frame_limit);

        let fetch_timeout = std::env::var("HASHWARD_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT);

        Self {
            store_dir,
            matcher: MatcherConfig {
                threshold,
                min_votes,
                min_grid_matches,
                frame_limit,
            },
            fetch_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_dir, PathBuf::from("references"));
        assert_eq!(config.matcher.threshold, 10);
        assert_eq!(config.matcher.min_votes, 2);
        assert_eq!(config.matcher.min_grid_matches, 4);
        assert_eq!(config.matcher.frame_limit, 8);
        assert_eq!(config.fetch_timeout, Duration::from_secs(8));
    }
}
