//! Breakdown of a resolution's score plus informational diagnostics.

use std::collections::BTreeMap;

use ida_protocol::{CategoryTag, CubeId, ElementId};
use serde::Serialize;

use crate::score::contributions;
use crate::search::Solution;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryContribution {
    pub category: CategoryTag,
    pub score: f64,
    pub elements: Vec<ElementId>,
}

/// Observations about the winning assignment. They do not affect feasibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// One element selected through several matches.
    DuplicateElement {
        element: ElementId,
        categories: Vec<CategoryTag>,
    },
    /// One user term backing several selected matches.
    ReusedTerm {
        term: String,
        elements: Vec<ElementId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreExplanation {
    pub cube: Option<CubeId>,
    pub total: f64,
    pub strategy: &'static str,
    pub evaluations: u64,
    pub complete: bool,
    pub contributions: Vec<CategoryContribution>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScoreExplanation {
    pub fn from_solution(solution: &Solution) -> Self {
        let entity = &solution.entity;
        let contributions = contributions(entity)
            .into_iter()
            .filter_map(|(category, score)| {
                let selection = entity.selection(category);
                (!selection.is_empty()).then(|| CategoryContribution {
                    category,
                    score,
                    elements: selection.elements().cloned().collect(),
                })
            })
            .collect();

        let mut by_element: BTreeMap<&ElementId, Vec<CategoryTag>> = BTreeMap::new();
        let mut by_term: BTreeMap<&str, Vec<ElementId>> = BTreeMap::new();
        for m in entity.all_matches() {
            by_element.entry(&m.element).or_default().push(m.category);
            by_term
                .entry(m.term.as_str())
                .or_default()
                .push(m.element.clone());
        }
        let duplicates = by_element
            .into_iter()
            .filter(|(_, cats)| cats.len() > 1)
            .map(|(element, categories)| Diagnostic::DuplicateElement {
                element: element.clone(),
                categories,
            });
        let reused = by_term
            .into_iter()
            .filter(|(_, elements)| elements.len() > 1)
            .map(|(term, elements)| Diagnostic::ReusedTerm {
                term: term.to_string(),
                elements,
            });

        Self {
            cube: entity.cube().cloned(),
            total: solution.score,
            strategy: solution.strategy,
            evaluations: solution.evaluations,
            complete: solution.complete,
            contributions,
            diagnostics: duplicates.chain(reused).collect(),
        }
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
