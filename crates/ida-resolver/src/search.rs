//! Search drivers over a [`SolverModel`].
//!
//! Two strategies ship: the closed-form per-cube optimum used in production and an
//! exhaustive enumeration of the full assignment space that serves as an oracle.
//! Both break cube ties the same way. Cubes are visited in ascending order and a
//! later cube replaces the incumbent only when its total is higher by more than
//! `SCORE_EPSILON`. Any defined cube is preferred over the undefined state.

use std::time::{Duration, Instant};

use ida_protocol::{CategoryTag, CubeId};
use serde::Serialize;

use crate::config::{SearchConfig, StrategyKind};
use crate::constraint::ConstraintSet;
use crate::domain::CandidateSelection;
use crate::model::{Entity, SolverModel};
use crate::score::{improves, sum_scores};

/// How often the exhaustive walk looks at the clock.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Work limits for one resolution. Hitting either limit stops the search with the
/// best feasible assignment found so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    pub deadline: Option<Instant>,
    pub max_evaluations: Option<u64>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            deadline: config
                .time_limit_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
            max_evaluations: Some(config.max_evaluations),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_evaluations(mut self, max: u64) -> Self {
        self.max_evaluations = Some(max);
        self
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn exhausted(&self, evaluations: u64) -> bool {
        self.max_evaluations.is_some_and(|max| evaluations >= max)
    }
}

/// Outcome of a search run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub entity: Entity,
    pub score: f64,
    /// Assignments evaluated (per-cube optima for the closed form).
    pub evaluations: u64,
    /// `false` when a budget stopped the search before the space was covered.
    pub complete: bool,
    pub strategy: &'static str,
}

impl Solution {
    fn undefined(strategy: &'static str, evaluations: u64, complete: bool) -> Self {
        Self {
            entity: Entity::undefined(),
            score: 0.0,
            evaluations,
            complete,
            strategy,
        }
    }
}

/// Search driver contract.
pub trait SearchStrategy: Send + Sync + std::fmt::Debug {
    /// Stable identifier for logs and explanations.
    fn id(&self) -> &'static str;

    /// Best feasible assignment of `model` found within `budget`.
    fn solve(
        &self,
        model: &SolverModel,
        constraints: &ConstraintSet,
        budget: &SearchBudget,
    ) -> Solution;
}

pub fn strategy_for(kind: StrategyKind) -> Box<dyn SearchStrategy> {
    match kind {
        StrategyKind::ClosedForm => Box::new(ClosedFormStrategy),
        StrategyKind::Exhaustive => Box::new(ExhaustiveStrategy),
    }
}

/// Per-cube argmax. For a fixed cube every category is independent, so the
/// optimum is the best admissible selection of each category summed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosedFormStrategy;

impl ClosedFormStrategy {
    /// Best admissible selection of every category for `cube`.
    pub fn best_for_cube(
        model: &SolverModel,
        constraints: &ConstraintSet,
        cube: &CubeId,
    ) -> Entity {
        let mut entity = Entity::with_cube(cube.clone());
        for domain in model.domains() {
            let best = domain
                .selections_for(cube)
                .filter(|s| constraints.admits(domain.category(), s, Some(cube)))
                .max_by(|a, b| a.preference(b));
            if let Some(best) = best {
                if best.preference(CandidateSelection::empty_ref()).is_gt() {
                    entity.assign(domain.category(), best.clone());
                }
            }
        }
        entity
    }
}

impl SearchStrategy for ClosedFormStrategy {
    fn id(&self) -> &'static str {
        "closed_form"
    }

    fn solve(
        &self,
        model: &SolverModel,
        constraints: &ConstraintSet,
        budget: &SearchBudget,
    ) -> Solution {
        let mut best: Option<(Entity, f64)> = None;
        let mut evaluations = 0u64;
        let mut complete = true;
        for cube in model.cubes() {
            if budget.expired() || budget.exhausted(evaluations) {
                complete = false;
                break;
            }
            let entity = Self::best_for_cube(model, constraints, cube);
            let total = sum_scores(entity.selections().map(|(_, s)| s.score()));
            evaluations += 1;
            tracing::trace!(cube = %cube, score = total, "cube optimum");
            if best.as_ref().is_none_or(|(_, incumbent)| improves(total, *incumbent)) {
                best = Some((entity, total));
            }
        }
        match best {
            Some((entity, score)) => Solution {
                entity,
                score,
                evaluations,
                complete,
                strategy: self.id(),
            },
            None => Solution::undefined(self.id(), evaluations, complete),
        }
    }
}

/// Walks the whole cross product `(undefined | cubes) x domain_1 x ... x domain_n`
/// with an odometer over indices; the product is never materialised.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveStrategy;

impl SearchStrategy for ExhaustiveStrategy {
    fn id(&self) -> &'static str {
        "exhaustive"
    }

    fn solve(
        &self,
        model: &SolverModel,
        constraints: &ConstraintSet,
        budget: &SearchBudget,
    ) -> Solution {
        let cubes: Vec<Option<&CubeId>> = std::iter::once(None)
            .chain(model.cubes().iter().map(Some))
            .collect();
        let domains: Vec<(CategoryTag, Vec<&CandidateSelection>)> = model
            .domains()
            .map(|d| (d.category(), d.selections().collect()))
            .collect();

        // indices[0] is the cube and varies slowest so cubes are visited in order.
        let mut radix = Vec::with_capacity(domains.len() + 1);
        radix.push(cubes.len());
        radix.extend(domains.iter().map(|(_, sels)| sels.len()));
        let mut indices = vec![0usize; radix.len()];

        let mut best: Option<(Vec<usize>, f64)> = None;
        let mut evaluations = 0u64;
        let mut complete = true;
        loop {
            if budget.exhausted(evaluations)
                || (evaluations % DEADLINE_CHECK_INTERVAL == 0 && budget.expired())
            {
                complete = false;
                break;
            }
            evaluations += 1;

            let cube = cubes[indices[0]];
            let feasible = domains
                .iter()
                .zip(&indices[1..])
                .all(|((tag, sels), &i)| constraints.admits(*tag, sels[i], cube));
            if feasible {
                let total = if cube.is_some() {
                    sum_scores(domains.iter().zip(&indices[1..]).map(|((_, s), &i)| s[i].score()))
                } else {
                    0.0
                };
                // Within one cube totals compare exactly so the cube optimum matches
                // the closed form bit for bit.
                let replace = match &best {
                    None => true,
                    Some((incumbent, score)) => match cubes[incumbent[0]] {
                        incumbent_cube if incumbent_cube == cube => total > *score,
                        None => total >= *score,
                        Some(_) => improves(total, *score),
                    },
                };
                if replace {
                    best = Some((indices.clone(), total));
                }
            }

            if !advance(&mut indices, &radix) {
                break;
            }
        }

        if !complete {
            tracing::warn!(evaluations, "exhaustive search stopped by budget");
        }
        match best {
            Some((indices, score)) => {
                let mut entity = Entity::undefined();
                entity.set_cube(cubes[indices[0]].cloned());
                for ((tag, sels), &i) in domains.iter().zip(&indices[1..]) {
                    entity.assign(*tag, sels[i].clone());
                }
                Solution {
                    entity,
                    score,
                    evaluations,
                    complete,
                    strategy: self.id(),
                }
            }
            None => Solution::undefined(self.id(), evaluations, complete),
        }
    }
}

/// Increments a mixed-radix counter, last position fastest. Returns `false` after
/// the final combination.
fn advance(indices: &mut [usize], radix: &[usize]) -> bool {
    for pos in (0..indices.len()).rev() {
        indices[pos] += 1;
        if indices[pos] < radix[pos] {
            return true;
        }
        indices[pos] = 0;
    }
    false
}
