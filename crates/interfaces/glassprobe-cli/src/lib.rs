pub mod commands;
pub mod progress;
pub mod report;

use std::time::Duration;

use clap::{Args, ValueEnum};
use glassprobe_config::{
    DEFAULT_DEADLINE_SECS, DEFAULT_PERCENT_LIMIT, DEFAULT_USER_AGENT, DISCARD_SINK,
};
use glassprobe_infra::SinkDestination;
use glassprobe_pipeline::MeasureConfig;

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

/// Flags shared by every measuring command.
#[derive(Args, Clone, Debug)]
pub struct MeasureOpts {
    #[arg(short = 'L', long = "limit", default_value_t = DEFAULT_PERCENT_LIMIT, help = "Limit download percentage")]
    pub percent_limit: u32,
    #[arg(short = 'T', long = "timeout", default_value_t = DEFAULT_DEADLINE_SECS, help = "Deadline per attempt in seconds")]
    pub timeout_secs: u64,
    #[arg(short = 'W', long = "write", default_value = DISCARD_SINK, help = "File path for saving downloaded bytes")]
    pub sink: String,
    #[arg(short = 'U', long = "user-agent", env = "GLASSPROBE_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl MeasureOpts {
    pub fn to_config(&self) -> MeasureConfig {
        MeasureConfig {
            percent_limit: self.percent_limit,
            deadline: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            sink: SinkDestination::parse(&self.sink),
            ..Default::default()
        }
    }
}

impl Default for MeasureOpts {
    fn default() -> Self {
        Self {
            percent_limit: DEFAULT_PERCENT_LIMIT,
            timeout_secs: DEFAULT_DEADLINE_SECS,
            sink: DISCARD_SINK.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
