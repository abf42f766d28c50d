use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{CubeId, DimensionId, ElementId};

/// Qualification of one dimension of the analysed cube.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DimensionQualification {
    pub dimension: DimensionId,
    #[serde(default)]
    pub granularity_level: Option<ElementId>,
    #[serde(default)]
    pub slice_conditions: BTreeSet<ElementId>,
}

impl DimensionQualification {
    pub fn new(dimension: impl Into<DimensionId>) -> Self {
        Self {
            dimension: dimension.into(),
            ..Self::default()
        }
    }

    pub fn is_filled(&self) -> bool {
        self.granularity_level.is_some()
    }
}

/// The structured query the conversation is building toward.
///
/// The resolver only proposes the initial fill from free text; the dialogue layer
/// mutates it afterwards. An unset cube with empty collections is the "undefined"
/// sentinel returned when nothing could be resolved.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AnalysisSituation {
    #[serde(default)]
    pub cube: Option<CubeId>,
    #[serde(default)]
    pub measures: BTreeSet<ElementId>,
    #[serde(default)]
    pub base_measure_conditions: BTreeSet<ElementId>,
    #[serde(default)]
    pub filter_conditions: BTreeSet<ElementId>,
    #[serde(default)]
    pub comparative_measures: BTreeSet<ElementId>,
    #[serde(default)]
    pub comparative_measure_predicates: BTreeSet<ElementId>,
    #[serde(default)]
    pub join_condition_predicates: BTreeSet<ElementId>,
    #[serde(default)]
    pub dimension_qualifications: BTreeMap<DimensionId, DimensionQualification>,
}

impl AnalysisSituation {
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_undefined(&self) -> bool {
        *self == Self::undefined()
    }

    pub fn is_cube_defined(&self) -> bool {
        self.cube.is_some()
    }

    /// Whether a query can be issued: a cube, at least one measure and a
    /// granularity level on every qualified dimension.
    pub fn is_executable(&self) -> bool {
        self.is_cube_defined()
            && !self.measures.is_empty()
            && self
                .dimension_qualifications
                .values()
                .all(DimensionQualification::is_filled)
    }

    /// Returns the qualification of `dimension`, creating an empty one when absent.
    pub fn dimension_qualification_mut(
        &mut self,
        dimension: &DimensionId,
    ) -> &mut DimensionQualification {
        self.dimension_qualifications
            .entry(dimension.clone())
            .or_insert_with(|| DimensionQualification::new(dimension.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_undefined() {
        let situation = AnalysisSituation::undefined();
        assert!(situation.is_undefined());
        assert!(!situation.is_cube_defined());
        assert!(!situation.is_executable());
    }

    #[test]
    fn executable_needs_levels_on_every_dimension() {
        let mut situation = AnalysisSituation {
            cube: Some("sales".into()),
            measures: ["revenue".to_string()].into_iter().collect(),
            ..AnalysisSituation::default()
        };
        assert!(situation.is_executable());

        let dq = situation.dimension_qualification_mut(&"time".to_string());
        dq.slice_conditions.insert("year_2020".into());
        assert!(!situation.is_executable());

        situation
            .dimension_qualification_mut(&"time".to_string())
            .granularity_level = Some("month".into());
        assert!(situation.is_executable());
        assert!(!situation.is_undefined());
    }

    #[test]
    fn serializes_without_unset_fields() {
        let value = serde_json::to_value(AnalysisSituation::undefined()).unwrap();
        assert!(value.get("cube").is_none());
        assert_eq!(value["measures"], serde_json::json!([]));

        let dq = serde_json::to_value(DimensionQualification::new("d2")).unwrap();
        assert!(dq.get("granularity_level").is_none());
    }
}
