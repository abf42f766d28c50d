use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic category of a cube element a user term can be matched against.
///
/// The declaration order is the canonical order used everywhere results are
/// summed or iterated, so it must stay stable.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CategoryTag {
    AggregateMeasures,
    AggregateMeasurePredicates,
    BaseMeasurePredicates,
    Levels,
    LevelPredicates,
    ComparativeMeasures,
    ComparativeMeasurePredicates,
    JoinConditionPredicates,
}

/// Which category-specific attributes a match must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtraKind {
    None,
    Dimension,
    Comparative,
    ComparativeMeasure,
}

impl ExtraKind {
    pub fn describe(self) -> &'static str {
        match self {
            ExtraKind::None => "no extra attributes",
            ExtraKind::Dimension => "a dimension",
            ExtraKind::Comparative => "a pattern part",
            ExtraKind::ComparativeMeasure => "a measure and a pattern part",
        }
    }
}

impl CategoryTag {
    pub const ALL: [CategoryTag; 8] = [
        CategoryTag::AggregateMeasures,
        CategoryTag::AggregateMeasurePredicates,
        CategoryTag::BaseMeasurePredicates,
        CategoryTag::Levels,
        CategoryTag::LevelPredicates,
        CategoryTag::ComparativeMeasures,
        CategoryTag::ComparativeMeasurePredicates,
        CategoryTag::JoinConditionPredicates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTag::AggregateMeasures => "aggregate_measures",
            CategoryTag::AggregateMeasurePredicates => "aggregate_measure_predicates",
            CategoryTag::BaseMeasurePredicates => "base_measure_predicates",
            CategoryTag::Levels => "levels",
            CategoryTag::LevelPredicates => "level_predicates",
            CategoryTag::ComparativeMeasures => "comparative_measures",
            CategoryTag::ComparativeMeasurePredicates => "comparative_measure_predicates",
            CategoryTag::JoinConditionPredicates => "join_condition_predicates",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            CategoryTag::AggregateMeasures => "Measures",
            CategoryTag::AggregateMeasurePredicates => "Filter conditions",
            CategoryTag::BaseMeasurePredicates => "Base measure conditions",
            CategoryTag::Levels => "Granularity levels",
            CategoryTag::LevelPredicates => "Slice conditions",
            CategoryTag::ComparativeMeasures => "Comparative measures",
            CategoryTag::ComparativeMeasurePredicates => "Comparative measure predicates",
            CategoryTag::JoinConditionPredicates => "Join conditions",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        CategoryTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == normalized)
    }

    /// Extra attributes a match of this category has to carry.
    pub fn required_extra(&self) -> ExtraKind {
        match self {
            CategoryTag::Levels | CategoryTag::LevelPredicates => ExtraKind::Dimension,
            CategoryTag::ComparativeMeasures => ExtraKind::ComparativeMeasure,
            CategoryTag::ComparativeMeasurePredicates => ExtraKind::Comparative,
            CategoryTag::AggregateMeasures
            | CategoryTag::AggregateMeasurePredicates
            | CategoryTag::BaseMeasurePredicates
            | CategoryTag::JoinConditionPredicates => ExtraKind::None,
        }
    }

    pub fn is_dimension_scoped(&self) -> bool {
        self.required_extra() == ExtraKind::Dimension
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of a comparative analysis pattern a comparative match belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatternPart {
    SetOfInterest,
    SetOfComparison,
}

impl PatternPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternPart::SetOfInterest => "set_of_interest",
            PatternPart::SetOfComparison => "set_of_comparison",
        }
    }

    /// Accepts both the snake_case slug and the camelCase spelling used in the metadata store.
    pub fn from_slug(value: &str) -> Option<Self> {
        match value.trim() {
            "set_of_interest" | "setOfInterest" => Some(PatternPart::SetOfInterest),
            "set_of_comparison" | "setOfComparison" => Some(PatternPart::SetOfComparison),
            _ => None,
        }
    }
}
