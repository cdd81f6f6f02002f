//! Load-balancer access log parser and analytics engine.
//!
//! Access-log lines are parsed into structured records, persisted through a
//! pluggable store, and queried via typed report operations. The binary in
//! `main.rs` wires the pieces together; everything here is usable as a
//! library.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod ingest;
pub mod parser;
pub mod runtime;
pub mod store;
