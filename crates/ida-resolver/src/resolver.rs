use ida_protocol::{AnalysisSituation, CategoryMatches, Validate};

use crate::config::ResolverConfig;
use crate::constraint::ConstraintSet;
use crate::explain::ScoreExplanation;
use crate::materialize::materialize;
use crate::model::SolverModel;
use crate::search::{strategy_for, SearchBudget, SearchStrategy, Solution};
use crate::ResolveError;

/// Turns one utterance's candidate matches into an analysis situation.
///
/// Stateless between calls; a single resolver can be shared across sessions.
#[derive(Debug)]
pub struct Resolver {
    config: ResolverConfig,
    strategy: Box<dyn SearchStrategy>,
    constraints: ConstraintSet,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        config.validate()?;
        Ok(Self {
            strategy: strategy_for(config.search.strategy),
            constraints: ConstraintSet::from_config(&config),
            config,
        })
    }

    /// Replaces the search driver chosen by the configuration.
    pub fn with_strategy(mut self, strategy: Box<dyn SearchStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn strategy_id(&self) -> &'static str {
        self.strategy.id()
    }

    /// Resolves `matches` within the configured search budget.
    pub fn resolve(&self, matches: &CategoryMatches) -> Result<Resolution, ResolveError> {
        self.resolve_with_budget(matches, &SearchBudget::from_config(&self.config.search))
    }

    /// Resolves `matches` within `budget`. Malformed matches are rejected; an empty
    /// or unresolvable input yields the undefined situation.
    pub fn resolve_with_budget(
        &self,
        matches: &CategoryMatches,
        budget: &SearchBudget,
    ) -> Result<Resolution, ResolveError> {
        matches.validate()?;
        let model = SolverModel::build(matches, &self.config);
        tracing::info!(
            strategy = self.strategy.id(),
            matches = matches.len(),
            cubes = model.cubes().len(),
            "resolving candidate matches"
        );
        let solution = self.strategy.solve(&model, &self.constraints, budget);
        if !solution.complete {
            tracing::warn!(
                strategy = solution.strategy,
                evaluations = solution.evaluations,
                "search budget exhausted; returning best assignment found"
            );
        }
        let situation = materialize(&solution.entity);
        tracing::info!(
            cube = situation.cube.as_deref().unwrap_or("<undefined>"),
            score = solution.score,
            evaluations = solution.evaluations,
            "resolution finished"
        );
        Ok(Resolution {
            situation,
            solution,
        })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        let config = ResolverConfig::default();
        Self {
            strategy: strategy_for(config.search.strategy),
            constraints: ConstraintSet::from_config(&config),
            config,
        }
    }
}

/// The materialized situation together with the search outcome behind it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub situation: AnalysisSituation,
    pub solution: Solution,
}

impl Resolution {
    pub fn score(&self) -> f64 {
        self.solution.score
    }

    pub fn explain(&self) -> ScoreExplanation {
        let explanation = ScoreExplanation::from_solution(&self.solution);
        tracing::info!(
            cube = explanation.cube.as_deref().unwrap_or("<undefined>"),
            total = explanation.total,
            diagnostics = explanation.diagnostics.len(),
            "score explanation"
        );
        explanation
    }

    pub fn into_situation(self) -> AnalysisSituation {
        self.situation
    }
}

/// Resolves with the default configuration.
pub fn resolve(matches: &CategoryMatches) -> Result<AnalysisSituation, ResolveError> {
    Resolver::default()
        .resolve(matches)
        .map(Resolution::into_situation)
}
