//! Read-only views of engine state.
//!
//! Snapshots are plain data computed as of the engine clock, with ongoing
//! busy and blocked intervals already included. They are what reporting
//! code consumes; nothing here feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::id::{ComponentId, InspectorId, QueueId, WorkstationId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorSnapshot {
    pub id: InspectorId,
    pub blocked: bool,
    /// Component being inspected or held while blocked.
    pub held: Option<ComponentId>,
    pub busy_time: f64,
    pub blocked_time: f64,
    pub completed: u64,
    pub blocked_episodes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub id: QueueId,
    pub length: usize,
    pub capacity: usize,
    pub departures: u64,
    /// Time-weighted mean length over the statistics window.
    pub average_occupancy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstationSnapshot {
    pub id: WorkstationId,
    pub busy: bool,
    pub busy_time: f64,
    /// Cumulative over the whole run, warm-up included.
    pub products_made: u64,
}

/// Engine-wide counters plus one snapshot per entity, in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub clock: f64,
    pub stats_start: f64,
    pub products_departed: u64,
    /// Products departed since the statistics window started.
    pub products_in_window: u64,
    pub target_products: u64,
    pub dispatched: u64,
    pub inspectors: Vec<InspectorSnapshot>,
    pub queues: Vec<QueueSnapshot>,
    pub workstations: Vec<WorkstationSnapshot>,
}

impl EngineSnapshot {
    /// Length of the statistics window.
    pub fn window(&self) -> f64 {
        self.clock - self.stats_start
    }

    pub fn inspector(&self, id: InspectorId) -> &InspectorSnapshot {
        &self.inspectors[id.index()]
    }

    pub fn queue(&self, id: QueueId) -> &QueueSnapshot {
        &self.queues[id.index()]
    }

    pub fn workstation(&self, id: WorkstationId) -> &WorkstationSnapshot {
        &self.workstations[id.index()]
    }
}
