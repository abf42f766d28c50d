//! Candidate resolution for the conversational OLAP assistant.
//!
//! Scored candidate matches are expanded into per-category selection domains,
//! searched jointly with the choice of cube for the highest-scoring consistent
//! assignment, and materialized into an [`ida_protocol::AnalysisSituation`].

mod config;
pub mod constraint;
pub mod domain;
mod error;
pub mod explain;
pub mod materialize;
pub mod model;
mod resolver;
pub mod score;
pub mod search;

pub use config::{
    config_schema_json, load_config, load_effective_config, parse_config, resolve_config_path,
    CategoryToggles, ResolverConfig, SearchConfig, StrategyKind, DEFAULT_CONFIG_PATH,
    MAX_GROUP_CAP,
};
pub use constraint::{ConstraintSet, Violation};
pub use domain::{CandidateSelection, CategoryDomain, DomainLimits};
pub use error::ResolveError;
pub use explain::{CategoryContribution, Diagnostic, ScoreExplanation};
pub use materialize::materialize;
pub use model::{Entity, SolverModel};
pub use resolver::{resolve, Resolution, Resolver};
pub use search::{
    strategy_for, ClosedFormStrategy, ExhaustiveStrategy, SearchBudget, SearchStrategy, Solution,
};
