use std::time::Duration;

use glassprobe_config::{
    DEFAULT_DEADLINE_SECS, DEFAULT_PERCENT_LIMIT, DEFAULT_USER_AGENT, DETAIL_PAGE_MARKER,
    MAX_DEADLINE_SECS, MAX_PERCENT_LIMIT, MIN_PERCENT_LIMIT, PROGRESS_INTERVAL_MS,
};
use glassprobe_infra::SinkDestination;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("percent limit must be in 1..=100, got {0}")]
    PercentLimit(u32),
    #[error("deadline must be greater than zero")]
    ZeroDeadline,
    #[error("deadline must be at most 86400 seconds, got {0:?}")]
    DeadlineTooLong(Duration),
    #[error("progress interval must be greater than zero")]
    ZeroInterval,
}

/// Everything a session or orchestrator needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct MeasureConfig {
    pub percent_limit: u32,
    /// Per-session deadline. The alternate attempt gets a fresh one.
    pub deadline: Duration,
    pub user_agent: String,
    pub progress_interval: Duration,
    pub sink: SinkDestination,
    pub detail_page_marker: String,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            percent_limit: DEFAULT_PERCENT_LIMIT,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress_interval: Duration::from_millis(PROGRESS_INTERVAL_MS),
            sink: SinkDestination::Discard,
            detail_page_marker: DETAIL_PAGE_MARKER.to_string(),
        }
    }
}

impl MeasureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PERCENT_LIMIT..=MAX_PERCENT_LIMIT).contains(&self.percent_limit) {
            return Err(ConfigError::PercentLimit(self.percent_limit));
        }
        if self.deadline.is_zero() {
            return Err(ConfigError::ZeroDeadline);
        }
        if self.deadline > Duration::from_secs(MAX_DEADLINE_SECS) {
            return Err(ConfigError::DeadlineTooLong(self.deadline));
        }
        if self.progress_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Pooled client carrying the configured user agent, with the deadline
    /// doubling as the per-request client timeout.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        glassprobe_infra::default_http_client(&self.user_agent, Some(self.deadline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MeasureConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.percent_limit, 100);
        assert_eq!(cfg.deadline, Duration::from_secs(30));
        assert_eq!(cfg.progress_interval, Duration::from_millis(200));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = MeasureConfig {
            percent_limit: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::PercentLimit(0)));
        cfg.percent_limit = 101;
        assert_eq!(cfg.validate(), Err(ConfigError::PercentLimit(101)));
        cfg.percent_limit = 10;
        cfg.deadline = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDeadline));
    }

    #[test]
    fn rejects_deadline_past_the_cap() {
        let cfg = MeasureConfig {
            deadline: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DeadlineTooLong(Duration::from_secs(u64::MAX)))
        );

        let at_cap = MeasureConfig {
            deadline: Duration::from_secs(MAX_DEADLINE_SECS),
            ..Default::default()
        };
        assert_eq!(at_cap.validate(), Ok(()));
    }
}
