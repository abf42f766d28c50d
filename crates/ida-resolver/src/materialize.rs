use std::collections::BTreeSet;

use ida_protocol::{AnalysisSituation, CandidateMatch, CategoryTag, ElementId};

use crate::domain::CandidateSelection;
use crate::model::Entity;

/// Flattens a winning assignment into an [`AnalysisSituation`].
///
/// An entity without a cube materializes to the undefined sentinel. Level and
/// level-predicate members are grouped by their dimension; when a dimension
/// carries several levels (only possible with the one-level rule disabled) the
/// best-scoring one becomes the granularity level.
pub fn materialize(entity: &Entity) -> AnalysisSituation {
    let Some(cube) = entity.cube() else {
        return AnalysisSituation::undefined();
    };
    let mut situation = AnalysisSituation {
        cube: Some(cube.clone()),
        ..AnalysisSituation::default()
    };

    for (tag, selection) in entity.selections() {
        match tag {
            CategoryTag::AggregateMeasures => situation.measures = elements(selection),
            CategoryTag::AggregateMeasurePredicates => {
                situation.filter_conditions = elements(selection)
            }
            CategoryTag::BaseMeasurePredicates => {
                situation.base_measure_conditions = elements(selection)
            }
            CategoryTag::ComparativeMeasures => {
                situation.comparative_measures = elements(selection)
            }
            CategoryTag::ComparativeMeasurePredicates => {
                situation.comparative_measure_predicates = elements(selection)
            }
            CategoryTag::JoinConditionPredicates => {
                situation.join_condition_predicates = elements(selection)
            }
            CategoryTag::Levels => {
                for level in &ranked(selection) {
                    let Some(dimension) = level.dimension() else {
                        continue;
                    };
                    let granularity = &mut situation
                        .dimension_qualification_mut(dimension)
                        .granularity_level;
                    match granularity {
                        None => *granularity = Some(level.element.clone()),
                        Some(kept) => tracing::warn!(
                            dimension = %dimension,
                            kept = %kept,
                            ignored = %level.element,
                            "several granularity levels for one dimension"
                        ),
                    }
                }
            }
            CategoryTag::LevelPredicates => {
                for predicate in selection.matches() {
                    if let Some(dimension) = predicate.dimension() {
                        situation
                            .dimension_qualification_mut(dimension)
                            .slice_conditions
                            .insert(predicate.element.clone());
                    }
                }
            }
        }
    }
    situation
}

fn elements(selection: &CandidateSelection) -> BTreeSet<ElementId> {
    selection.elements().cloned().collect()
}

// Highest score first, then smallest element id.
fn ranked(selection: &CandidateSelection) -> Vec<&CandidateMatch> {
    let mut members: Vec<_> = selection.matches().collect();
    members.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.element.cmp(&b.element))
    });
    members
}
