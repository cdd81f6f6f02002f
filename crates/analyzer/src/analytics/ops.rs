//! Aggregation operations over a record collection.
//!
//! Every operation is a pure function of the record slice and its explicit
//! parameters: full-scan, group by exact key equality, aggregate, order.
//! Top-N ordering is metric-descending with a stable tie-break on the
//! group's first-seen position, and a limit larger than the number of
//! distinct groups returns all of them.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::time::{minute_bucket, period_bucket, within_window};
use super::AnalyticsError;
use crate::parser::model::LogRecord;

// ─── Result rows ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpUserAgentRow {
    pub ip_address: String,
    pub user_agent: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    pub bucket: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAgentRow {
    pub user_agent: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub status_code: u16,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationRow {
    pub request: String,
    pub time_taken: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRow {
    pub pattern: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerRow {
    pub worker: String,
    pub count: u64,
    pub avg_time_taken: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRow {
    pub domain: String,
    pub count: u64,
}

/// Aggregate over a trailing window of worker-served requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub count: u64,
    pub avg_time_taken: Option<f64>,
}

// ─── Typed selectors ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationOrder {
    Longest,
    Shortest,
}

impl std::str::FromStr for DurationOrder {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "longest" => Ok(DurationOrder::Longest),
            "shortest" => Ok(DurationOrder::Shortest),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "order must be 'longest' or 'shortest', got {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionSort {
    Domain,
    Count,
}

impl std::str::FromStr for ConversionSort {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domain" => Ok(ConversionSort::Domain),
            "count" => Ok(ConversionSort::Count),
            other => Err(AnalyticsError::InvalidParameter(format!(
                "sort must be 'domain' or 'count', got {:?}",
                other
            ))),
        }
    }
}

// ─── Grouping helpers ───────────────────────────────────────────

/// Count occurrences per key, preserving first-seen group order.
fn count_groups<K, I>(keys: I) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, u64)> = Vec::new();
    for key in keys {
        match index.get(&key) {
            Some(&i) => groups[i].1 += 1,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, 1));
            }
        }
    }
    groups
}

/// Order groups count-descending (stable, so ties keep first-seen order)
/// and keep the top `limit`.
fn top_by_count<K>(mut groups: Vec<(K, u64)>, limit: usize) -> Vec<(K, u64)> {
    if limit == 0 {
        return Vec::new();
    }
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups.truncate(limit);
    groups
}

// ─── Operations ─────────────────────────────────────────────────

/// Top client/user-agent pairs by request count.
pub fn ip_user_agent_frequency(records: &[LogRecord], limit: usize) -> Vec<IpUserAgentRow> {
    let groups = count_groups(
        records
            .iter()
            .map(|r| (r.ip_address.clone(), r.user_agent.clone())),
    );
    top_by_count(groups, limit)
        .into_iter()
        .map(|((ip_address, user_agent), count)| IpUserAgentRow {
            ip_address,
            user_agent,
            count,
        })
        .collect()
}

/// Request count per minute, ascending by bucket label. Records whose
/// timestamp does not resolve to a calendar date are skipped.
pub fn query_frequency(records: &[LogRecord]) -> Vec<BucketRow> {
    let mut groups = count_groups(records.iter().filter_map(|r| minute_bucket(&r.timestamp)));
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
        .into_iter()
        .map(|(bucket, count)| BucketRow { bucket, count })
        .collect()
}

/// Top user agents by request count.
pub fn top_user_agents(records: &[LogRecord], limit: usize) -> Vec<UserAgentRow> {
    let groups = count_groups(records.iter().map(|r| r.user_agent.clone()));
    top_by_count(groups, limit)
        .into_iter()
        .map(|(user_agent, count)| UserAgentRow { user_agent, count })
        .collect()
}

/// Count per 5xx status code within the trailing `window_minutes` ending at
/// `now`. Groups come back in first-seen order; an empty window is an empty
/// result, not an error.
pub fn error_distribution(
    records: &[LogRecord],
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Vec<StatusRow> {
    count_groups(
        records
            .iter()
            .filter(|r| (500..=599).contains(&r.status_code))
            .filter(|r| within_window(&r.timestamp, now, window_minutes))
            .map(|r| r.status_code),
    )
    .into_iter()
    .map(|(status_code, count)| StatusRow { status_code, count })
    .collect()
}

/// The `limit` longest (or shortest) requests by duration. Per-record, no
/// grouping; ties keep insertion order.
pub fn request_durations(
    records: &[LogRecord],
    order: DurationOrder,
    limit: usize,
) -> Vec<DurationRow> {
    if limit == 0 {
        return Vec::new();
    }
    let mut rows: Vec<DurationRow> = records
        .iter()
        .map(|r| DurationRow {
            request: r.request.clone(),
            time_taken: r.time_taken,
        })
        .collect();
    match order {
        DurationOrder::Longest => rows.sort_by(|a, b| b.time_taken.cmp(&a.time_taken)),
        DurationOrder::Shortest => rows.sort_by(|a, b| a.time_taken.cmp(&b.time_taken)),
    }
    rows.truncate(limit);
    rows
}

/// Most common GET request prefixes. The pattern is the request truncated
/// just before its `slash_count + 1`-th slash, so `slash_count = 1` keeps
/// the method plus the first path segment (`GET /users/5 …` → `GET /users`).
pub fn common_patterns(
    records: &[LogRecord],
    limit: usize,
    slash_count: usize,
) -> Vec<PatternRow> {
    let groups = count_groups(
        records
            .iter()
            .filter(|r| r.request.split(' ').next() == Some("GET"))
            .map(|r| request_pattern(&r.request, slash_count)),
    );
    top_by_count(groups, limit)
        .into_iter()
        .map(|(pattern, count)| PatternRow { pattern, count })
        .collect()
}

/// Everything before the `slash_count + 1`-th `/`, or the whole request
/// when it has that many slashes or fewer.
fn request_pattern(request: &str, slash_count: usize) -> String {
    let mut seen = 0;
    for (i, b) in request.bytes().enumerate() {
        if b == b'/' {
            seen += 1;
            if seen > slash_count {
                return request[..i].to_string();
            }
        }
    }
    request.to_string()
}

/// Request count and average duration per backend worker, first-seen order.
/// Records without a worker name are excluded.
pub fn worker_stats(records: &[LogRecord]) -> Vec<WorkerRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, u64, u64)> = Vec::new();
    for record in records {
        let Some(worker) = record.balancer_worker_name.as_deref() else {
            continue;
        };
        match index.get(worker) {
            Some(&i) => {
                groups[i].1 += 1;
                groups[i].2 += record.time_taken;
            }
            None => {
                index.insert(worker, groups.len());
                groups.push((worker.to_string(), 1, record.time_taken));
            }
        }
    }
    groups
        .into_iter()
        .map(|(worker, count, total)| WorkerRow {
            worker,
            count,
            avg_time_taken: total as f64 / count as f64,
        })
        .collect()
}

/// Conversions per referer domain. The domain is the third slash-delimited
/// segment of the referer (`scheme://domain/...`); records with an empty
/// referer, or one too short to carry that segment, are excluded.
pub fn conversion_stats(records: &[LogRecord], sort: ConversionSort) -> Vec<DomainRow> {
    let mut groups = count_groups(
        records
            .iter()
            .filter(|r| !r.referer.is_empty())
            .filter_map(|r| referer_domain(&r.referer)),
    );
    match sort {
        ConversionSort::Count => groups.sort_by(|a, b| b.1.cmp(&a.1)),
        ConversionSort::Domain => groups.sort_by(|a, b| b.0.cmp(&a.0)),
    }
    groups
        .into_iter()
        .map(|(domain, count)| DomainRow { domain, count })
        .collect()
}

fn referer_domain(referer: &str) -> Option<String> {
    referer.split('/').nth(2).map(str::to_string)
}

/// Count and average duration over worker-served requests in the trailing
/// `window_minutes` ending at `now`.
pub fn trailing_window(
    records: &[LogRecord],
    window_minutes: i64,
    now: DateTime<Utc>,
) -> WindowSummary {
    let mut count = 0u64;
    let mut total = 0u64;
    for record in records {
        if record.balancer_worker_name.is_some()
            && within_window(&record.timestamp, now, window_minutes)
        {
            count += 1;
            total += record.time_taken;
        }
    }
    WindowSummary {
        count,
        avg_time_taken: (count > 0).then(|| total as f64 / count as f64),
    }
}

/// Busiest `bucket_minutes`-wide periods, count-descending. The same `N`
/// fixes both the bucket width and the number of buckets returned.
pub fn active_periods(records: &[LogRecord], bucket_minutes: u32) -> Vec<BucketRow> {
    if bucket_minutes == 0 {
        return Vec::new();
    }
    let groups = count_groups(
        records
            .iter()
            .filter_map(|r| period_bucket(&r.timestamp, bucket_minutes)),
    );
    top_by_count(groups, bucket_minutes as usize)
        .into_iter()
        .map(|(bucket, count)| BucketRow { bucket, count })
        .collect()
}
