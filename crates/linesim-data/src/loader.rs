//! Scenario loading: reads a file, resolves entity names, builds a validated
//! [`SimConfig`].
//!
//! The format (RON/JSON/TOML) is chosen by file extension.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use linesim_core::config::{ConfigError, SimConfig};
use linesim_core::id::{ComponentType, InspectorId, QueueId, WorkstationId};
use linesim_core::policy::TieBreak;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::schema::ScenarioData;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// No scenario file with the given base name exists in the directory.
    #[error("scenario '{name}' not found in {dir}")]
    MissingScenario { name: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name does not match any entity of the expected kind.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// The same entity is configured twice.
    #[error("duplicate entry for '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved configuration failed validation.
    #[error("invalid scenario {file}: {source}")]
    Invalid {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported scenario file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Find `{name}.ron`, `{name}.toml`, or `{name}.json` in `dir`.
///
/// Errors if none exists, or if more than one format exists for the name.
pub fn find_scenario(dir: &Path, name: &str) -> Result<PathBuf, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }
    found.ok_or_else(|| DataLoadError::MissingScenario {
        name: name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Parse `content` as `format`. `file` is only used in error messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Resolution
// ===========================================================================

/// A loaded scenario: the run configuration plus an optional replication
/// count.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub config: SimConfig,
    pub replications: Option<usize>,
}

fn unresolved(file: &Path, name: &str, expected_kind: &'static str) -> DataLoadError {
    DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    }
}

/// Record `name` as seen, failing on a repeat.
fn check_duplicate(seen: &mut HashSet<String>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if seen.insert(name.to_string()) {
        Ok(())
    } else {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    }
}

/// Resolve names in `data` and build a validated scenario on top of the
/// default configuration.
pub fn resolve_scenario(data: ScenarioData, file: &Path) -> Result<Scenario, DataLoadError> {
    let mut config = SimConfig::default();

    if let Some(seed) = data.seed {
        config = config.with_seed(seed);
    }
    if let Some(target) = data.target_products {
        config = config.with_target(target);
    }
    if let Some(warmup) = data.warmup_products {
        config = config.with_warmup(warmup);
    }
    if let Some(name) = &data.tie_break {
        let policy = TieBreak::from_name(name).ok_or_else(|| unresolved(file, name, "tie-break policy"))?;
        config = config.with_tie_break(policy);
    }

    let mut seen = HashSet::new();
    for q in &data.queues {
        let id = QueueId::from_name(&q.name).ok_or_else(|| unresolved(file, &q.name, "queue"))?;
        check_duplicate(&mut seen, &q.name, file)?;
        config = config.with_capacity(id, q.capacity);
    }

    for insp in &data.inspectors {
        let id = InspectorId::from_name(&insp.name)
            .ok_or_else(|| unresolved(file, &insp.name, "inspector"))?;
        for r in &insp.rates {
            let kind = ComponentType::from_name(&r.component)
                .filter(|k| id.component_types().contains(k))
                .ok_or_else(|| unresolved(file, &r.component, "component type for this inspector"))?;
            check_duplicate(&mut seen, &format!("{}.{}", insp.name, r.component), file)?;
            config = config.with_inspector_rate(kind, r.rate);
        }
    }

    for w in &data.workstations {
        let id = WorkstationId::from_name(&w.name)
            .ok_or_else(|| unresolved(file, &w.name, "workstation"))?;
        check_duplicate(&mut seen, &w.name, file)?;
        config = config.with_workstation_rate(id, w.rate);
    }

    config.validate().map_err(|source| DataLoadError::Invalid {
        file: file.to_path_buf(),
        source,
    })?;

    Ok(Scenario {
        config,
        replications: data.replications,
    })
}

/// Load and resolve a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario, DataLoadError> {
    let data: ScenarioData = deserialize_file(path)?;
    let scenario = resolve_scenario(data, path)?;
    debug!(file = %path.display(), seed = scenario.config.seed, "loaded scenario");
    Ok(scenario)
}

// ===========================================================================
// Tests
// ===========================================================================
