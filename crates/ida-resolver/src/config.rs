use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ida_protocol::CategoryTag;
use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ResolveError;

/// Largest per-cube group that may be expanded into its power set (2^16 subsets).
pub const MAX_GROUP_CAP: usize = 16;

pub const DEFAULT_CONFIG_PATH: &str = "configs/resolver.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Keep at most this many matches per (category, cube) group before subset
    /// expansion; the best-scoring ones survive.
    #[schemars(range(min = 1, max = 16))]
    pub max_candidates_per_cube: usize,
    /// Matches scoring below this are dropped before grouping.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_score: f64,
    /// A granularity-level selection may hold at most one level per dimension.
    pub one_level_per_dimension: bool,
    pub categories: CategoryToggles,
    pub search: SearchConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_candidates_per_cube: 12,
            min_score: 0.0,
            one_level_per_dimension: true,
            categories: CategoryToggles::default(),
            search: SearchConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ResolveError> {
        if !(1..=MAX_GROUP_CAP).contains(&self.max_candidates_per_cube) {
            return Err(ResolveError::Config(format!(
                "max_candidates_per_cube must be between 1 and {MAX_GROUP_CAP}"
            )));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ResolveError::Config(
                "min_score must be between 0 and 1 (inclusive)".into(),
            ));
        }
        if self.search.max_evaluations == 0 {
            return Err(ResolveError::Config(
                "search.max_evaluations must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Per-category switches; a disabled category contributes only the empty selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryToggles {
    pub aggregate_measures: bool,
    pub aggregate_measure_predicates: bool,
    pub base_measure_predicates: bool,
    pub levels: bool,
    pub level_predicates: bool,
    pub comparative_measures: bool,
    pub comparative_measure_predicates: bool,
    pub join_condition_predicates: bool,
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            aggregate_measures: true,
            aggregate_measure_predicates: true,
            base_measure_predicates: true,
            levels: true,
            level_predicates: true,
            comparative_measures: true,
            comparative_measure_predicates: true,
            join_condition_predicates: true,
        }
    }
}

impl CategoryToggles {
    pub fn is_enabled(&self, category: CategoryTag) -> bool {
        match category {
            CategoryTag::AggregateMeasures => self.aggregate_measures,
            CategoryTag::AggregateMeasurePredicates => self.aggregate_measure_predicates,
            CategoryTag::BaseMeasurePredicates => self.base_measure_predicates,
            CategoryTag::Levels => self.levels,
            CategoryTag::LevelPredicates => self.level_predicates,
            CategoryTag::ComparativeMeasures => self.comparative_measures,
            CategoryTag::ComparativeMeasurePredicates => self.comparative_measure_predicates,
            CategoryTag::JoinConditionPredicates => self.join_condition_predicates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Per-cube optimum in closed form.
    #[default]
    ClosedForm,
    /// Full enumeration of the assignment space; bounded by `max_evaluations`.
    Exhaustive,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::ClosedForm => "closed_form",
            StrategyKind::Exhaustive => "exhaustive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub strategy: StrategyKind,
    /// Upper bound on evaluated assignments.
    #[schemars(range(min = 1))]
    pub max_evaluations: u64,
    /// Optional wall-clock limit per resolution.
    pub time_limit_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::ClosedForm,
            max_evaluations: 1_000_000,
            time_limit_ms: None,
        }
    }
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema = schemars::schema_for!(ResolverConfig);
    let schema_value = serde_json::to_value(&schema).expect("schema value");
    validator_for(&schema_value).expect("valid schema")
});

/// Returns the JSON schema describing the resolver configuration.
///
/// # Panics
///
/// Panics if schema generation fails; this indicates a programming error.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(ResolverConfig);
    serde_json::to_value(&schema).expect("schema json")
}

pub fn parse_config(content: &str) -> Result<ResolverConfig> {
    let raw: toml::Value = toml::from_str(content)?;
    let json_value = serde_json::to_value(&raw)?;
    let validation_errors: Vec<_> = CONFIG_SCHEMA
        .iter_errors(&json_value)
        .map(|e| e.to_string())
        .collect();
    if !validation_errors.is_empty() {
        return Err(anyhow::anyhow!(validation_errors.join(", ")));
    }
    let cfg: ResolverConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ResolverConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading resolver config at {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing resolver config at {}", path.display()))
}

/// Resolve a config file path independent of the current working directory.
///
/// Search order (first existing wins): `IDA_CONFIG_DIR`, the current working
/// directory, then the workspace root during development.
pub fn resolve_config_path(rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return rel_path.exists().then(|| rel_path.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(cfg_dir) = std::env::var("IDA_CONFIG_DIR") {
        if !cfg_dir.trim().is_empty() {
            candidates.push(PathBuf::from(cfg_dir));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }
    candidates.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../"));

    candidates
        .into_iter()
        .map(|base| base.join(rel))
        .find(|p| p.exists())
}

/// Config from `IDA_CONFIG` or the default location; falls back to built-in
/// defaults (with an error log) when the file is missing or invalid.
pub fn load_effective_config() -> ResolverConfig {
    let path = match std::env::var("IDA_CONFIG") {
        Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
        _ => resolve_config_path(DEFAULT_CONFIG_PATH),
    };
    let Some(path) = path else {
        return ResolverConfig::default();
    };
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!(path = %path.display(), "invalid resolver config: {err:#}");
            ResolverConfig::default()
        }
    }
}
