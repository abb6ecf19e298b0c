//! Run configuration and its validation.
//!
//! The topology is fixed; configuration only tunes queue capacities, service
//! rates, the stopping rule, the C1 tie-break policy, and the seed.
//! [`SimConfig::validate`] runs before the event loop starts so a bad
//! configuration is rejected before any event is dispatched.

use serde::{Deserialize, Serialize};

use crate::id::{ComponentType, EntityId, QueueId, WorkstationId};
use crate::policy::TieBreak;
use crate::queue::DEFAULT_CAPACITY;
use crate::rng::MAX_UNIT_EXPONENTIAL;

/// Default inspection rates (per time unit) for C1, C2, C3.
pub const DEFAULT_INSPECTOR_RATES: [f64; 3] = [0.09654, 0.06436, 0.04847];

/// Default assembly rates (per time unit) for W1, W2, W3.
pub const DEFAULT_WORKSTATION_RATES: [f64; 3] = [0.2172, 0.09015, 0.1137];

/// Errors that reject a configuration before the run starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("queue {queue} has zero capacity")]
    ZeroCapacity { queue: &'static str },
    #[error("rate for {entity} must be positive with a finite mean service time, got {rate}")]
    InvalidRate { entity: &'static str, rate: f64 },
    #[error("target product count must be at least 1")]
    ZeroTarget,
    #[error("warm-up of {warmup} products must be below the target of {target}")]
    WarmupNotBelowTarget { warmup: u64, target: u64 },
    #[error("unknown entity identifier '{0}'")]
    UnknownEntity(String),
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),
}

/// Everything one run needs besides its random streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Capacity per queue, in [`QueueId::ALL`] order.
    pub capacities: [usize; 5],
    /// Inspection rate per component type, in [`ComponentType::ALL`] order.
    pub inspector_rates: [f64; 3],
    /// Assembly rate per workstation, in [`WorkstationId::ALL`] order.
    pub workstation_rates: [f64; 3],
    /// The run stops once this many products have left the system.
    pub target_products: u64,
    /// Statistics restart once this many products have left the system.
    /// Zero disables the warm-up reset.
    pub warmup_products: u64,
    pub tie_break: TieBreak,
    /// Root seed for the run's stream set.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacities: [DEFAULT_CAPACITY; 5],
            inspector_rates: DEFAULT_INSPECTOR_RATES,
            workstation_rates: DEFAULT_WORKSTATION_RATES,
            target_products: 5000,
            warmup_products: 0,
            tie_break: TieBreak::default(),
            seed: 420,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_target(mut self, target: u64) -> Self {
        self.target_products = target;
        self
    }

    pub fn with_warmup(mut self, warmup: u64) -> Self {
        self.warmup_products = warmup;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_capacity(mut self, queue: QueueId, capacity: usize) -> Self {
        self.capacities[queue.index()] = capacity;
        self
    }

    pub fn with_inspector_rate(mut self, kind: ComponentType, rate: f64) -> Self {
        self.inspector_rates[kind.index()] = rate;
        self
    }

    pub fn with_workstation_rate(mut self, station: WorkstationId, rate: f64) -> Self {
        self.workstation_rates[station.index()] = rate;
        self
    }

    /// Set a queue capacity by queue name (`"c11"`, ..., `"c3"`).
    pub fn with_capacity_named(self, queue: &str, capacity: usize) -> Result<Self, ConfigError> {
        match EntityId::from_name(queue) {
            Some(EntityId::Queue(q)) => Ok(self.with_capacity(q, capacity)),
            _ => Err(ConfigError::UnknownEntity(queue.to_string())),
        }
    }

    /// Set a service rate by name: a component type (`"c1"`, `"c2"`, `"c3"`)
    /// sets its inspection rate, a workstation (`"w1"`, ...) its assembly
    /// rate.
    pub fn with_rate_named(self, name: &str, rate: f64) -> Result<Self, ConfigError> {
        if let Some(kind) = ComponentType::from_name(name) {
            return Ok(self.with_inspector_rate(kind, rate));
        }
        match EntityId::from_name(name) {
            Some(EntityId::Workstation(w)) => Ok(self.with_workstation_rate(w, rate)),
            Some(_) => Err(ConfigError::UnknownEntity(name.to_string())),
            None => Err(ConfigError::UnknownComponentType(name.to_string())),
        }
    }

    pub fn capacity(&self, queue: QueueId) -> usize {
        self.capacities[queue.index()]
    }

    pub fn inspector_rate(&self, kind: ComponentType) -> f64 {
        self.inspector_rates[kind.index()]
    }

    pub fn workstation_rate(&self, station: WorkstationId) -> f64 {
        self.workstation_rates[station.index()]
    }

    /// Check every parameter. The first violation found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for q in QueueId::ALL {
            if self.capacity(q) == 0 {
                return Err(ConfigError::ZeroCapacity { queue: q.name() });
            }
        }
        for kind in ComponentType::ALL {
            check_rate(kind.name(), self.inspector_rate(kind))?;
        }
        for w in WorkstationId::ALL {
            check_rate(w.name(), self.workstation_rate(w))?;
        }
        if self.target_products == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.warmup_products >= self.target_products {
            return Err(ConfigError::WarmupNotBelowTarget {
                warmup: self.warmup_products,
                target: self.target_products,
            });
        }
        Ok(())
    }
}

/// A rate is usable when every service time it can yield is finite.
fn check_rate(entity: &'static str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate > 0.0 && (MAX_UNIT_EXPONENTIAL / rate).is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { entity, rate })
    }
}
