//! Analytics engine.
//!
//! Each analytic is a typed operation descriptor ([`Report`]) carrying its
//! own parameters — grouping key, window, ordering and limit are fixed by
//! the variant, never assembled from caller-supplied strings. Running a
//! report is a pure function of the record collection plus the wall clock
//! for trailing-window variants.

pub mod ops;
pub mod time;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

pub use ops::{ConversionSort, DurationOrder};

use crate::parser::model::LogRecord;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// One analytical question, with its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Top client/user-agent pairs by request count.
    IpUserAgent { limit: usize },
    /// Requests per minute over the whole collection.
    QueryFrequency,
    /// Top user agents by request count.
    TopUserAgents { limit: usize },
    /// 5xx counts per status code within the trailing window.
    ErrorDistribution { window_minutes: i64 },
    /// Longest or shortest requests by duration.
    RequestDurations { order: DurationOrder, limit: usize },
    /// Most common GET request prefixes.
    CommonPatterns { limit: usize, slash_count: usize },
    /// Per-worker request count and average duration.
    WorkerStats,
    /// Conversions per referer domain.
    ConversionStats { sort: ConversionSort },
    /// Windowed aggregate over worker-served requests.
    TrailingWindow { window_minutes: i64 },
    /// Busiest N-minute periods.
    ActivePeriods { bucket_minutes: u32 },
}

/// The rows a report produced. Serializes as the bare row list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportOutput {
    IpUserAgent(Vec<ops::IpUserAgentRow>),
    Buckets(Vec<ops::BucketRow>),
    UserAgents(Vec<ops::UserAgentRow>),
    Statuses(Vec<ops::StatusRow>),
    Durations(Vec<ops::DurationRow>),
    Patterns(Vec<ops::PatternRow>),
    Workers(Vec<ops::WorkerRow>),
    Domains(Vec<ops::DomainRow>),
    Window(ops::WindowSummary),
}

impl Report {
    /// Run the report against an immutable snapshot of records.
    ///
    /// "Now" for trailing-window variants is the wall clock at the call.
    pub fn run(&self, records: &[LogRecord]) -> ReportOutput {
        let now = Utc::now();
        match *self {
            Report::IpUserAgent { limit } => {
                ReportOutput::IpUserAgent(ops::ip_user_agent_frequency(records, limit))
            }
            Report::QueryFrequency => ReportOutput::Buckets(ops::query_frequency(records)),
            Report::TopUserAgents { limit } => {
                ReportOutput::UserAgents(ops::top_user_agents(records, limit))
            }
            Report::ErrorDistribution { window_minutes } => {
                ReportOutput::Statuses(ops::error_distribution(records, window_minutes, now))
            }
            Report::RequestDurations { order, limit } => {
                ReportOutput::Durations(ops::request_durations(records, order, limit))
            }
            Report::CommonPatterns { limit, slash_count } => {
                ReportOutput::Patterns(ops::common_patterns(records, limit, slash_count))
            }
            Report::WorkerStats => ReportOutput::Workers(ops::worker_stats(records)),
            Report::ConversionStats { sort } => {
                ReportOutput::Domains(ops::conversion_stats(records, sort))
            }
            Report::TrailingWindow { window_minutes } => {
                ReportOutput::Window(ops::trailing_window(records, window_minutes, now))
            }
            Report::ActivePeriods { bucket_minutes } => {
                ReportOutput::Buckets(ops::active_periods(records, bucket_minutes))
            }
        }
    }
}
