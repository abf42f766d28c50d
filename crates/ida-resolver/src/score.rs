use ida_protocol::CategoryTag;

use crate::constraint::ConstraintSet;
use crate::model::Entity;

/// Objective value of an assignment: zero without a cube, otherwise the plain sum
/// of the per-category selection scores in canonical category order.
pub fn score(entity: &Entity) -> f64 {
    if entity.cube().is_none() {
        return 0.0;
    }
    sum_scores(entity.selections().map(|(_, s)| s.score()))
}

/// Left-to-right sum starting at `0.0`. Every strategy adds in the same order so
/// equal assignments produce bit-identical totals.
pub(crate) fn sum_scores(scores: impl IntoIterator<Item = f64>) -> f64 {
    scores.into_iter().fold(0.0, |acc, s| acc + s)
}

/// Margin a total must clear to beat an incumbent from another cube.
pub(crate) const SCORE_EPSILON: f64 = 1e-9;

/// Whether `candidate` beats `incumbent` by more than rounding noise.
pub(crate) fn improves(candidate: f64, incumbent: f64) -> bool {
    candidate > incumbent + SCORE_EPSILON
}

/// Score of a feasible assignment, `None` when any constraint is violated.
/// Comparisons treat `None` as negative infinity.
pub fn evaluate(entity: &Entity, constraints: &ConstraintSet) -> Option<f64> {
    constraints.is_feasible(entity).then(|| score(entity))
}

/// Per-category contributions of an assignment, in canonical order.
pub fn contributions(entity: &Entity) -> Vec<(CategoryTag, f64)> {
    let defined = entity.cube().is_some();
    entity
        .selections()
        .map(|(tag, s)| (tag, if defined { s.score() } else { 0.0 }))
        .collect()
}
