//! Per-run report.
//!
//! Every figure covers the statistics window `[stats_start, clock]`. Ongoing
//! busy and blocked intervals are settled up to the report time, so a
//! station still assembling at the end is credited for the partial job.

use std::fmt;

use linesim_core::engine::Engine;
use linesim_core::id::{InspectorId, QueueId, WorkstationId};
use linesim_core::policy::TieBreak;
use linesim_core::query::EngineSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReport {
    pub id: WorkstationId,
    /// Cumulative over the whole run.
    pub products_made: u64,
    pub busy_time: f64,
    /// Fraction of the window spent assembling.
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueReport {
    pub id: QueueId,
    pub departures: u64,
    pub average_occupancy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorReport {
    pub id: InspectorId,
    pub busy_time: f64,
    pub blocked_time: f64,
    /// Fraction of the window spent holding a finished component.
    pub blocked_probability: f64,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub tie_break: TieBreak,
    pub clock: f64,
    pub stats_start: f64,
    /// Products departed inside the window.
    pub products: u64,
    /// Products per unit time over the window.
    pub throughput: f64,
    pub workstations: Vec<StationReport>,
    pub queues: Vec<QueueReport>,
    pub inspectors: Vec<InspectorReport>,
}

/// `part / window`, or `0.0` for an empty window.
fn ratio(part: f64, window: f64) -> f64 {
    if window > 0.0 { part / window } else { 0.0 }
}

impl RunReport {
    pub fn from_engine(engine: &Engine) -> Self {
        let config = engine.config();
        Self::from_snapshot(config.seed, config.tie_break, &engine.snapshot())
    }

    pub fn from_snapshot(seed: u64, tie_break: TieBreak, snap: &EngineSnapshot) -> Self {
        let window = snap.window();
        Self {
            seed,
            tie_break,
            clock: snap.clock,
            stats_start: snap.stats_start,
            products: snap.products_in_window,
            throughput: ratio(snap.products_in_window as f64, window),
            workstations: snap
                .workstations
                .iter()
                .map(|w| StationReport {
                    id: w.id,
                    products_made: w.products_made,
                    busy_time: w.busy_time,
                    utilization: ratio(w.busy_time, window),
                })
                .collect(),
            queues: snap
                .queues
                .iter()
                .map(|q| QueueReport {
                    id: q.id,
                    departures: q.departures,
                    average_occupancy: q.average_occupancy,
                })
                .collect(),
            inspectors: snap
                .inspectors
                .iter()
                .map(|i| InspectorReport {
                    id: i.id,
                    busy_time: i.busy_time,
                    blocked_time: i.blocked_time,
                    blocked_probability: ratio(i.blocked_time, window),
                    completed: i.completed,
                })
                .collect(),
        }
    }

    pub fn window(&self) -> f64 {
        self.clock - self.stats_start
    }

    /// Named scalar metrics, in a fixed order, for aggregation across runs.
    pub fn metrics(&self) -> Vec<(String, f64)> {
        let mut out = vec![("throughput".to_string(), self.throughput)];
        for w in &self.workstations {
            out.push((format!("{}.utilization", w.id.name()), w.utilization));
            out.push((format!("{}.products", w.id.name()), w.products_made as f64));
        }
        for q in &self.queues {
            out.push((format!("{}.occupancy", q.id.name()), q.average_occupancy));
        }
        for i in &self.inspectors {
            out.push((format!("{}.blocked", i.id.name()), i.blocked_probability));
        }
        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run seed={} policy={}", self.seed, self.tie_break)?;
        writeln!(
            f,
            "  clock {:.1} (window from {:.1}), {} products, throughput {:.4}",
            self.clock, self.stats_start, self.products, self.throughput
        )?;
        for w in &self.workstations {
            writeln!(
                f,
                "  {:<5} made {:>5}  busy {:>10.2}  utilization {:.3}",
                w.id.name(),
                w.products_made,
                w.busy_time,
                w.utilization
            )?;
        }
        for q in &self.queues {
            writeln!(
                f,
                "  {:<5} departures {:>5}  avg occupancy {:.3}",
                q.id.name(),
                q.departures,
                q.average_occupancy
            )?;
        }
        for i in &self.inspectors {
            writeln!(
                f,
                "  {:<5} busy {:>10.1}  blocked {:>10.1}  p(blocked) {:.3}",
                i.id.name(),
                i.busy_time,
                i.blocked_time,
                i.blocked_probability
            )?;
        }
        Ok(())
    }
}
