//! Statistics of a peer connection.
//!
//! - `stats`: the W3C statistics dictionaries carried by a report
//! - `accumulator`: counters updated while the pipeline runs, and the
//!   snapshot that turns them into a report
//! - `report`: [`RTCStatsReport`], the value returned by `get_stats`
//!
//! Reports are pulled: nothing is computed until the application asks, and
//! taking a snapshot never changes connection state. Candidate pair and
//! track counters start over on ICE restart.

pub mod accumulator;
pub mod report;
pub mod stats;

pub use report::{RTCStatsReport, RTCStatsReportEntry};
pub use stats::{RTCStats, RTCStatsId, RTCStatsType};

#[cfg(test)]
mod statistics_test;
