//! Command-line surface.
//!
//! One subcommand per operation. Selector-style flags (`--order`, `--sort`,
//! `--on-failure`) parse into the typed enums at the boundary, so an invalid
//! value dies in argument parsing and never reaches the engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::analytics::{ConversionSort, DurationOrder, Report};
use crate::ingest::FailurePolicy;

#[derive(Debug, Parser)]
#[command(name = "lbtrail", version, about = "Load-balancer access log analyzer")]
pub struct Cli {
    /// Emit results as JSON instead of tab-separated text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse an access-log file and append its records to the store.
    Import {
        log_file: PathBuf,

        /// What to do with unparsable lines: skip or abort.
        #[arg(long)]
        on_failure: Option<FailurePolicy>,
    },

    /// Write every stored record back out as access-log lines.
    Export { out_file: PathBuf },

    /// Top client/user-agent pairs by request count.
    IpUserAgents {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Requests per minute over the whole collection.
    QueryFrequency,

    /// Top user agents by request count.
    TopUserAgents {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// 5xx counts per status code within the trailing window.
    Errors {
        #[arg(long, default_value_t = 60)]
        window_minutes: i64,
    },

    /// Longest or shortest requests by duration.
    Durations {
        #[arg(long, default_value = "longest")]
        order: DurationOrder,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Most common GET request prefixes.
    Patterns {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// How many path slashes to keep in the pattern.
        #[arg(long, default_value_t = 1)]
        slash_count: usize,
    },

    /// Per-worker request count and average duration.
    Workers,

    /// Conversions per referer domain.
    Conversions {
        #[arg(long, default_value = "count")]
        sort: ConversionSort,
    },

    /// Count and average duration of worker-served requests in the window.
    Window {
        #[arg(long, default_value_t = 60)]
        window_minutes: i64,
    },

    /// Busiest N-minute periods.
    ActivePeriods {
        #[arg(long, default_value_t = 5)]
        bucket_minutes: u32,
    },
}

/// What a parsed invocation asks the runtime to do.
#[derive(Debug)]
pub enum Action {
    Import {
        log_file: PathBuf,
        on_failure: Option<FailurePolicy>,
    },
    Export {
        out_file: PathBuf,
    },
    Report(Report),
}

impl Command {
    pub fn into_action(self) -> Action {
        match self {
            Command::Import {
                log_file,
                on_failure,
            } => Action::Import {
                log_file,
                on_failure,
            },
            Command::Export { out_file } => Action::Export { out_file },
            Command::IpUserAgents { limit } => Action::Report(Report::IpUserAgent { limit }),
            Command::QueryFrequency => Action::Report(Report::QueryFrequency),
            Command::TopUserAgents { limit } => Action::Report(Report::TopUserAgents { limit }),
            Command::Errors { window_minutes } => {
                Action::Report(Report::ErrorDistribution { window_minutes })
            }
            Command::Durations { order, limit } => {
                Action::Report(Report::RequestDurations { order, limit })
            }
            Command::Patterns { limit, slash_count } => {
                Action::Report(Report::CommonPatterns { limit, slash_count })
            }
            Command::Workers => Action::Report(Report::WorkerStats),
            Command::Conversions { sort } => Action::Report(Report::ConversionStats { sort }),
            Command::Window { window_minutes } => {
                Action::Report(Report::TrailingWindow { window_minutes })
            }
            Command::ActivePeriods { bucket_minutes } => {
                Action::Report(Report::ActivePeriods { bucket_minutes })
            }
        }
    }
}
