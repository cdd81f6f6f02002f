//! Access-log parsing module.
//!
//! Converts one raw reverse-proxy/load-balancer access-log line into a
//! structured [`model::LogRecord`], or a [`model::ParseError`] describing
//! why the line does not match the grammar.
//!
//! Parsing is pure: no side effects, no shared state, and a rejected line
//! never produces a partially-filled record.

pub mod line;
pub mod model;

pub use line::parse_line;
pub use model::{LogRecord, ParseError};

/// Upper bound on a single log line. Anything larger is rejected before
/// tokenization to keep memory bounded on hostile input.
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB
