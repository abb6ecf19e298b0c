//! Serde structs for scenario files.
//!
//! A scenario names entities by their fixed topology names (`insp1`, `c12`,
//! `w3`, ...). Every section is optional; anything left out keeps the
//! engine default. The loader resolves names into typed ids.

use serde::Deserialize;

/// Top-level scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioData {
    pub seed: Option<u64>,
    pub target_products: Option<u64>,
    pub warmup_products: Option<u64>,
    pub replications: Option<usize>,
    /// Policy name, e.g. `"lowest-index"` or `"random"`.
    pub tie_break: Option<String>,
    pub queues: Vec<QueueData>,
    pub inspectors: Vec<InspectorData>,
    pub workstations: Vec<WorkstationData>,
}

/// Capacity override for one queue.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueData {
    pub name: String,
    pub capacity: usize,
}

/// Inspection rates for one inspector.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectorData {
    pub name: String,
    pub rates: Vec<RateData>,
}

/// Inspection rate for one component type.
#[derive(Debug, Clone, Deserialize)]
pub struct RateData {
    pub component: String,
    pub rate: f64,
}

/// Assembly rate for one workstation.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkstationData {
    pub name: String,
    pub rate: f64,
}
