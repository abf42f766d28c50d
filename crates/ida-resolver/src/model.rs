use std::collections::{BTreeMap, BTreeSet};

use ida_protocol::{CandidateMatch, CategoryMatches, CategoryTag, CubeId};
use serde::Serialize;

use crate::config::ResolverConfig;
use crate::domain::{CandidateSelection, CategoryDomain, DomainLimits};

/// Decision state explored by the search: one cube choice and one selection per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    cube: Option<CubeId>,
    selections: BTreeMap<CategoryTag, CandidateSelection>,
}

impl Entity {
    /// No cube and the empty selection everywhere. Feasible, score zero.
    pub fn undefined() -> Self {
        Self {
            cube: None,
            selections: CategoryTag::ALL
                .into_iter()
                .map(|tag| (tag, CandidateSelection::empty()))
                .collect(),
        }
    }

    pub fn with_cube(cube: impl Into<CubeId>) -> Self {
        Self {
            cube: Some(cube.into()),
            ..Self::undefined()
        }
    }

    pub fn cube(&self) -> Option<&CubeId> {
        self.cube.as_ref()
    }

    pub fn set_cube(&mut self, cube: Option<CubeId>) {
        self.cube = cube;
    }

    pub fn assign(&mut self, category: CategoryTag, selection: CandidateSelection) {
        self.selections.insert(category, selection);
    }

    pub fn selection(&self, category: CategoryTag) -> &CandidateSelection {
        self.selections
            .get(&category)
            .unwrap_or(CandidateSelection::empty_ref())
    }

    /// Selections in canonical category order.
    pub fn selections(&self) -> impl Iterator<Item = (CategoryTag, &CandidateSelection)> + '_ {
        CategoryTag::ALL
            .into_iter()
            .map(move |tag| (tag, self.selection(tag)))
    }

    /// Every selected match across all categories.
    pub fn all_matches(&self) -> impl Iterator<Item = &CandidateMatch> + '_ {
        self.selections().flat_map(|(_, s)| s.matches())
    }

    pub fn is_all_empty(&self) -> bool {
        self.selections().all(|(_, s)| s.is_empty())
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::undefined()
    }
}

/// The decision structure of one resolution call: the cube-choice domain plus one
/// selection domain per category. Built, searched and discarded per utterance.
#[derive(Debug, Clone)]
pub struct SolverModel {
    cubes: BTreeSet<CubeId>,
    domains: BTreeMap<CategoryTag, CategoryDomain>,
}

impl SolverModel {
    pub fn build(matches: &CategoryMatches, config: &ResolverConfig) -> Self {
        let limits = DomainLimits::from(config);
        let domains: BTreeMap<_, _> = CategoryTag::ALL
            .into_iter()
            .map(|tag| {
                let domain = if config.categories.is_enabled(tag) {
                    CategoryDomain::build(tag, matches.get(tag), &limits)
                } else {
                    CategoryDomain::empty(tag)
                };
                (tag, domain)
            })
            .collect();
        Self::from_domains(domains)
    }

    /// Assembles a model from prebuilt domains; categories without a domain get
    /// the empty-only one.
    pub fn from_domains(mut domains: BTreeMap<CategoryTag, CategoryDomain>) -> Self {
        for tag in CategoryTag::ALL {
            domains
                .entry(tag)
                .or_insert_with(|| CategoryDomain::empty(tag));
        }
        let cubes = domains
            .values()
            .flat_map(|d| d.cubes())
            .cloned()
            .collect();
        Self { cubes, domains }
    }

    /// Cubes observed in any category, ascending.
    pub fn cubes(&self) -> &BTreeSet<CubeId> {
        &self.cubes
    }

    pub fn domain(&self, category: CategoryTag) -> &CategoryDomain {
        &self.domains[&category]
    }

    pub fn domains(&self) -> impl Iterator<Item = &CategoryDomain> + '_ {
        CategoryTag::ALL.into_iter().map(move |tag| self.domain(tag))
    }

    pub fn has_candidates(&self) -> bool {
        !self.cubes.is_empty()
    }

    /// Size of the full assignment space, `(|cubes| + 1) * prod |domain|`, saturating.
    pub fn state_space_size(&self) -> u128 {
        self.domains()
            .fold((self.cubes.len() as u128).saturating_add(1), |acc, d| {
                acc.saturating_mul(d.len() as u128)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ida_protocol::CategoryExtra;

    fn candidate(
        category: CategoryTag,
        cube: &str,
        element: &str,
        extra: CategoryExtra,
    ) -> CandidateMatch {
        CandidateMatch::try_new(category, element, cube, element, "t", 0.5, extra).unwrap()
    }

    #[test]
    fn every_category_gets_a_domain() {
        let model = SolverModel::build(&CategoryMatches::new(), &ResolverConfig::default());
        assert_eq!(model.domains().count(), CategoryTag::ALL.len());
        assert!(model.domains().all(|d| d.len() == 1));
        assert!(!model.has_candidates());
        assert_eq!(model.state_space_size(), 1);
    }

    #[test]
    fn cubes_collected_across_categories() {
        let matches: CategoryMatches = [
            candidate(CategoryTag::AggregateMeasures, "cubeB", "m1", CategoryExtra::None),
            candidate(
                CategoryTag::Levels,
                "cubeA",
                "l1",
                CategoryExtra::dimension("d1"),
            ),
        ]
        .into_iter()
        .collect();
        let model = SolverModel::build(&matches, &ResolverConfig::default());
        let cubes: Vec<_> = model.cubes().iter().cloned().collect();
        assert_eq!(cubes, vec!["cubeA".to_string(), "cubeB".to_string()]);
        // (2 cubes + undefined) * 2 * 2 * 1^6
        assert_eq!(model.state_space_size(), 12);
    }

    #[test]
    fn disabled_category_is_ignored() {
        let matches: CategoryMatches = [candidate(
            CategoryTag::Levels,
            "cubeA",
            "l1",
            CategoryExtra::dimension("d1"),
        )]
        .into_iter()
        .collect();
        let mut config = ResolverConfig::default();
        config.categories.levels = false;
        let model = SolverModel::build(&matches, &config);
        assert_eq!(model.domain(CategoryTag::Levels).len(), 1);
        assert!(!model.has_candidates());
    }

    #[test]
    fn entity_defaults_to_empty_selections() {
        let mut entity = Entity::with_cube("cubeA");
        assert!(entity.is_all_empty());
        let selection = CandidateSelection::new([candidate(
            CategoryTag::AggregateMeasures,
            "cubeA",
            "m1",
            CategoryExtra::None,
        )]);
        entity.assign(CategoryTag::AggregateMeasures, selection);
        assert!(!entity.is_all_empty());
        assert_eq!(entity.all_matches().count(), 1);
        assert_eq!(entity.selections().count(), CategoryTag::ALL.len());
    }
}
