use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::{
    CategoryTag, ContractError, CubeId, DimensionId, ElementId, ExtraKind, PatternPart, TypeId,
    Validate,
};

/// Category-specific attributes of a candidate match.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(untagged)]
pub enum CategoryExtra {
    ComparativeMeasure {
        measure: ElementId,
        part: PatternPart,
    },
    Dimension {
        dimension: DimensionId,
    },
    Comparative {
        part: PatternPart,
    },
    #[default]
    None,
}

impl CategoryExtra {
    pub fn dimension(dimension: impl Into<DimensionId>) -> Self {
        CategoryExtra::Dimension {
            dimension: dimension.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CategoryExtra::None)
    }

    fn kind(&self) -> ExtraKind {
        match self {
            CategoryExtra::ComparativeMeasure { .. } => ExtraKind::ComparativeMeasure,
            CategoryExtra::Dimension { .. } => ExtraKind::Dimension,
            CategoryExtra::Comparative { .. } => ExtraKind::Comparative,
            CategoryExtra::None => ExtraKind::None,
        }
    }
}

/// A scored hypothesis linking one user term to one cube element.
///
/// Produced by the matching layer once per utterance and never mutated afterwards.
/// Equality, hashing and ordering take every field into account (the score by its
/// bit pattern), so matches can live in ordered sets and selections compare by
/// member set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub category: CategoryTag,
    pub term: String,
    pub cube: CubeId,
    pub element: ElementId,
    #[serde(default)]
    pub element_type: TypeId,
    pub score: f64,
    #[serde(default, skip_serializing_if = "CategoryExtra::is_none")]
    pub extra: CategoryExtra,
}

impl CandidateMatch {
    /// Builds a match and validates it against its category.
    pub fn try_new(
        category: CategoryTag,
        term: impl Into<String>,
        cube: impl Into<CubeId>,
        element: impl Into<ElementId>,
        element_type: impl Into<TypeId>,
        score: f64,
        extra: CategoryExtra,
    ) -> Result<Self, ContractError> {
        let candidate = Self {
            category,
            term: term.into(),
            cube: cube.into(),
            element: element.into(),
            element_type: element_type.into(),
            score,
            extra,
        };
        candidate.validate()?;
        Ok(candidate)
    }

    pub fn dimension(&self) -> Option<&DimensionId> {
        match &self.extra {
            CategoryExtra::Dimension { dimension } => Some(dimension),
            _ => None,
        }
    }

    pub fn part(&self) -> Option<PatternPart> {
        match &self.extra {
            CategoryExtra::ComparativeMeasure { part, .. } | CategoryExtra::Comparative { part } => {
                Some(*part)
            }
            _ => None,
        }
    }

    pub fn measure(&self) -> Option<&ElementId> {
        match &self.extra {
            CategoryExtra::ComparativeMeasure { measure, .. } => Some(measure),
            _ => None,
        }
    }
}

impl Validate for CandidateMatch {
    fn validate(&self) -> Result<(), ContractError> {
        if self.term.trim().is_empty() {
            return Err(ContractError::EmptyField("term"));
        }
        if self.cube.trim().is_empty() {
            return Err(ContractError::EmptyField("cube"));
        }
        if self.element.trim().is_empty() {
            return Err(ContractError::EmptyField("element"));
        }
        if !(0.0..=1.0).contains(&self.score) {
            return Err(ContractError::ScoreOutOfRange {
                element: self.element.clone(),
                score: self.score,
            });
        }
        let expected = self.category.required_extra();
        let found = self.extra.kind();
        if expected != found {
            return Err(if expected == ExtraKind::None {
                ContractError::UnexpectedExtra {
                    category: self.category,
                }
            } else {
                ContractError::MissingExtra {
                    category: self.category,
                    expected: expected.describe(),
                }
            });
        }
        match &self.extra {
            CategoryExtra::Dimension { dimension } if dimension.trim().is_empty() => {
                Err(ContractError::EmptyField("dimension"))
            }
            CategoryExtra::ComparativeMeasure { measure, .. } if measure.trim().is_empty() => {
                Err(ContractError::EmptyField("measure"))
            }
            _ => Ok(()),
        }
    }
}

impl Ord for CandidateMatch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.cube.cmp(&other.cube))
            .then_with(|| self.element.cmp(&other.element))
            .then_with(|| self.term.cmp(&other.term))
            .then_with(|| self.element_type.cmp(&other.element_type))
            .then_with(|| self.extra.cmp(&other.extra))
            .then_with(|| self.score.total_cmp(&other.score))
    }
}

impl PartialOrd for CandidateMatch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CandidateMatch {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CandidateMatch {}

impl Hash for CandidateMatch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.category.hash(state);
        self.cube.hash(state);
        self.element.hash(state);
        self.term.hash(state);
        self.element_type.hash(state);
        self.extra.hash(state);
        self.score.to_bits().hash(state);
    }
}

/// Candidate matches of one utterance, keyed by category.
///
/// This is the input contract of the resolver. Serialized as a JSON object whose
/// keys are category slugs.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CategoryMatches {
    by_category: BTreeMap<CategoryTag, BTreeSet<CandidateMatch>>,
}

impl CategoryMatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a match under its own category. Returns `false` for an exact duplicate.
    pub fn insert(&mut self, candidate: CandidateMatch) -> bool {
        self.by_category
            .entry(candidate.category)
            .or_default()
            .insert(candidate)
    }

    /// Matches of one category, in their total order. Empty when none were supplied.
    pub fn get(&self, category: CategoryTag) -> impl Iterator<Item = &CandidateMatch> + '_ {
        self.by_category.get(&category).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryTag, &BTreeSet<CandidateMatch>)> + '_ {
        self.by_category.iter().map(|(tag, set)| (*tag, set))
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct cubes over all categories.
    pub fn cubes(&self) -> BTreeSet<CubeId> {
        self.by_category
            .values()
            .flatten()
            .map(|m| m.cube.clone())
            .collect()
    }
}

impl FromIterator<CandidateMatch> for CategoryMatches {
    fn from_iter<I: IntoIterator<Item = CandidateMatch>>(iter: I) -> Self {
        let mut matches = CategoryMatches::new();
        matches.extend(iter);
        matches
    }
}

impl Extend<CandidateMatch> for CategoryMatches {
    fn extend<I: IntoIterator<Item = CandidateMatch>>(&mut self, iter: I) {
        for candidate in iter {
            self.insert(candidate);
        }
    }
}

impl Validate for CategoryMatches {
    fn validate(&self) -> Result<(), ContractError> {
        for (category, set) in &self.by_category {
            for candidate in set {
                if candidate.category != *category {
                    return Err(ContractError::CategoryMismatch {
                        expected: *category,
                        found: candidate.category,
                    });
                }
                candidate.validate()?;
            }
        }
        Ok(())
    }
}
