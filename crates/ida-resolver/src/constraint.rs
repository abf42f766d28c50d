//! Hard feasibility rules over assignments.
//!
//! Every rule judges one category selection against the entity's cube, so the
//! problem stays separable per cube: a whole assignment is feasible iff each of
//! its selections is admitted.

use std::collections::BTreeMap;
use std::fmt;

use ida_protocol::{CategoryTag, CubeId, DimensionId};
use serde::Serialize;

use crate::config::ResolverConfig;
use crate::domain::CandidateSelection;
use crate::model::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A non-empty selection was generated from a cube other than the entity's.
    CubeMismatch {
        category: CategoryTag,
        expected: Option<CubeId>,
        found: CubeId,
    },
    /// More than one granularity level chosen for the same dimension.
    MultipleLevelsPerDimension {
        category: CategoryTag,
        dimension: DimensionId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::CubeMismatch {
                category,
                expected: Some(expected),
                found,
            } => write!(f, "{category}: selection from {found} but cube is {expected}"),
            Violation::CubeMismatch {
                category,
                expected: None,
                found,
            } => write!(f, "{category}: selection from {found} but no cube chosen"),
            Violation::MultipleLevelsPerDimension {
                category,
                dimension,
            } => write!(f, "{category}: several levels for dimension {dimension}"),
        }
    }
}

/// A feasibility rule over a single category selection.
pub trait SelectionRule: Send + Sync + fmt::Debug {
    /// Stable identifier for logs.
    fn id(&self) -> &'static str;

    /// Checks `selection`, assigned to `category`, against the entity cube `cube`.
    fn check(
        &self,
        category: CategoryTag,
        selection: &CandidateSelection,
        cube: Option<&CubeId>,
    ) -> Option<Violation>;
}

/// Every member of a non-empty selection must belong to the entity's cube.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubeConsistency;

impl SelectionRule for CubeConsistency {
    fn id(&self) -> &'static str {
        "cube_consistency"
    }

    fn check(
        &self,
        category: CategoryTag,
        selection: &CandidateSelection,
        cube: Option<&CubeId>,
    ) -> Option<Violation> {
        selection
            .members()
            .iter()
            .find(|m| Some(&m.cube) != cube)
            .map(|m| Violation::CubeMismatch {
                category,
                expected: cube.cloned(),
                found: m.cube.clone(),
            })
    }
}

/// A granularity-level selection holds at most one level per dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneLevelPerDimension;

impl SelectionRule for OneLevelPerDimension {
    fn id(&self) -> &'static str {
        "one_level_per_dimension"
    }

    fn check(
        &self,
        category: CategoryTag,
        selection: &CandidateSelection,
        _cube: Option<&CubeId>,
    ) -> Option<Violation> {
        if category != CategoryTag::Levels || selection.len() < 2 {
            return None;
        }
        let mut counts: BTreeMap<&DimensionId, usize> = BTreeMap::new();
        for dimension in selection.members().iter().filter_map(|m| m.dimension()) {
            *counts.entry(dimension).or_default() += 1;
        }
        counts
            .into_iter()
            .find(|(_, n)| *n > 1)
            .map(|(dimension, _)| Violation::MultipleLevelsPerDimension {
                category,
                dimension: dimension.clone(),
            })
    }
}

/// The rules an assignment must satisfy. Cube consistency is always present.
#[derive(Debug)]
pub struct ConstraintSet {
    rules: Vec<Box<dyn SelectionRule>>,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            rules: vec![Box::new(CubeConsistency)],
        }
    }
}

impl ConstraintSet {
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut set = Self::default();
        if config.one_level_per_dimension {
            set = set.with_rule(OneLevelPerDimension);
        }
        set
    }

    pub fn with_rule(mut self, rule: impl SelectionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Whether `selection` may be assigned to `category` when the entity cube is `cube`.
    pub fn admits(
        &self,
        category: CategoryTag,
        selection: &CandidateSelection,
        cube: Option<&CubeId>,
    ) -> bool {
        self.rules
            .iter()
            .all(|rule| rule.check(category, selection, cube).is_none())
    }

    pub fn violations(&self, entity: &Entity) -> Vec<Violation> {
        entity
            .selections()
            .flat_map(|(tag, selection)| {
                self.rules
                    .iter()
                    .filter_map(move |rule| rule.check(tag, selection, entity.cube()))
            })
            .collect()
    }

    pub fn is_feasible(&self, entity: &Entity) -> bool {
        entity
            .selections()
            .all(|(tag, selection)| self.admits(tag, selection, entity.cube()))
    }
}
