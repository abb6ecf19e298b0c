//! Reporting for the linesim engine.
//!
//! Turns a finished [`Engine`](linesim_core::engine::Engine) into a
//! [`RunReport`], runs independent replications of one configuration, and
//! aggregates per-metric samples into a [`ReplicationSummary`].
//!
//! # Usage
//!
//! ```ignore
//! let config = SimConfig::default().with_warmup(2000);
//! let reports = run_replications(&config, 10)?;
//! let summary = ReplicationSummary::from_reports(&reports);
//! println!("{summary}");
//! ```

pub mod replicate;
pub mod report;
pub mod summary;

pub use replicate::{
    replication_config, run_replication, run_replication_observed, run_replications,
};
pub use report::{InspectorReport, QueueReport, RunReport, StationReport};
pub use summary::{MetricSummary, ReplicationSummary, Summary};

#[cfg(feature = "parallel")]
pub use replicate::run_replications_parallel;
