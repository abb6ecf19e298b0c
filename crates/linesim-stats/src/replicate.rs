//! Independent replications of one configuration.
//!
//! Replication `k` runs with seed `config.seed + k`. Each replication owns its
//! own [`Engine`] and stream set, so runs share no mutable state and the
//! parallel path produces the same reports as the sequential one.

use linesim_core::config::SimConfig;
use linesim_core::engine::{Engine, EngineError};
use linesim_core::observe::Listener;
use tracing::info;

use crate::report::RunReport;

/// Run one replication to its target and report on it.
pub fn run_replication(config: SimConfig) -> Result<RunReport, EngineError> {
    let mut engine = Engine::new(config)?;
    engine.run()?;
    Ok(RunReport::from_engine(&engine))
}

/// Like [`run_replication`], with `listener` receiving every observation.
pub fn run_replication_observed(
    config: SimConfig,
    listener: Listener,
) -> Result<RunReport, EngineError> {
    let mut engine = Engine::new(config)?;
    engine.subscribe(listener);
    engine.run()?;
    Ok(RunReport::from_engine(&engine))
}

/// Configuration of replication `k`: the base config with seed `seed + k`.
pub fn replication_config(base: &SimConfig, k: usize) -> SimConfig {
    base.clone().with_seed(base.seed.wrapping_add(k as u64))
}

/// Run `count` replications one after another.
pub fn run_replications(config: &SimConfig, count: usize) -> Result<Vec<RunReport>, EngineError> {
    config.validate()?;
    info!(count, base_seed = config.seed, "running replications");
    (0..count)
        .map(|k| run_replication(replication_config(config, k)))
        .collect()
}

/// Run `count` replications on the rayon thread pool. Reports come back in
/// replication order.
#[cfg(feature = "parallel")]
pub fn run_replications_parallel(
    config: &SimConfig,
    count: usize,
) -> Result<Vec<RunReport>, EngineError> {
    use rayon::prelude::*;

    config.validate()?;
    info!(count, base_seed = config.seed, "running replications in parallel");
    (0..count)
        .into_par_iter()
        .map(|k| run_replication(replication_config(config, k)))
        .collect()
}
