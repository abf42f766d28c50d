//! Category domains: every subset of a category's candidate matches, grouped by cube.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ida_protocol::{CandidateMatch, CategoryTag, CubeId, ElementId};
use serde::Serialize;

use crate::config::{ResolverConfig, MAX_GROUP_CAP};

/// A chosen subset of one category's candidate matches, all from the same cube.
///
/// Two selections are equal iff their member sets are equal; the cube and the
/// score are derived from the members. Members are shared between all subsets of
/// a group, so a selection only owns pointers.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSelection {
    cube: Option<CubeId>,
    members: BTreeSet<Arc<CandidateMatch>>,
    score: f64,
}

static EMPTY_SELECTION: CandidateSelection = CandidateSelection {
    cube: None,
    members: BTreeSet::new(),
    score: 0.0,
};

impl CandidateSelection {
    pub fn empty() -> Self {
        EMPTY_SELECTION.clone()
    }

    pub(crate) fn empty_ref() -> &'static CandidateSelection {
        &EMPTY_SELECTION
    }

    /// Wraps a set of matches. The selection's cube is taken from the first member;
    /// mixed-cube member sets are representable but never feasible.
    pub fn new(members: impl IntoIterator<Item = CandidateMatch>) -> Self {
        Self::from_shared(members.into_iter().map(Arc::new))
    }

    pub(crate) fn from_shared(members: impl IntoIterator<Item = Arc<CandidateMatch>>) -> Self {
        let members: BTreeSet<Arc<CandidateMatch>> = members.into_iter().collect();
        let cube = members.first().map(|m| m.cube.clone());
        let score = members.iter().map(|m| m.score).fold(0.0, |acc, s| acc + s);
        Self {
            cube,
            members,
            score,
        }
    }

    /// Cube the selection was generated from; `None` for the empty selection.
    pub fn cube(&self) -> Option<&CubeId> {
        self.cube.as_ref()
    }

    pub fn members(&self) -> &BTreeSet<Arc<CandidateMatch>> {
        &self.members
    }

    /// Member matches in their total order.
    pub fn matches(&self) -> impl Iterator<Item = &CandidateMatch> + '_ {
        self.members.iter().map(Arc::as_ref)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementId> + '_ {
        self.members.iter().map(|m| &m.element)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Sum of member scores; zero for the empty selection.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn belongs_to(&self, cube: &CubeId) -> bool {
        self.cube.as_ref() == Some(cube)
    }

    /// Preference between two selections competing for the same slot: higher
    /// score, then more members, then the smaller member set.
    pub(crate) fn preference(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.members.len().cmp(&other.members.len()))
            .then_with(|| other.members.cmp(&self.members))
    }
}

impl Default for CandidateSelection {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for CandidateSelection {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for CandidateSelection {}

impl Ord for CandidateSelection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.members.cmp(&other.members)
    }
}

impl PartialOrd for CandidateSelection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for CandidateSelection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.members.hash(state);
    }
}

/// Bounds applied before power-set expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainLimits {
    pub max_candidates_per_cube: usize,
    pub min_score: f64,
}

impl Default for DomainLimits {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for DomainLimits {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            max_candidates_per_cube: config.max_candidates_per_cube,
            min_score: config.min_score,
        }
    }
}

impl DomainLimits {
    fn group_cap(&self) -> usize {
        self.max_candidates_per_cube.clamp(1, MAX_GROUP_CAP)
    }
}

/// Record of a per-cube group that lost candidates to the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CappedGroup {
    pub cube: CubeId,
    pub kept: usize,
    pub dropped: usize,
}

/// All candidate selections of one category. Always contains the empty selection.
#[derive(Debug, Clone)]
pub struct CategoryDomain {
    category: CategoryTag,
    selections: BTreeSet<CandidateSelection>,
    capped: Vec<CappedGroup>,
}

impl CategoryDomain {
    /// Domain of a category without candidates: only the empty selection.
    pub fn empty(category: CategoryTag) -> Self {
        Self {
            category,
            selections: BTreeSet::from([CandidateSelection::empty()]),
            capped: Vec::new(),
        }
    }

    /// Groups `matches` by cube and expands every group into its power set.
    ///
    /// Matches below `limits.min_score` are dropped first; each group is then cut to
    /// its best `limits.max_candidates_per_cube` members (never more than
    /// [`MAX_GROUP_CAP`]) so a group of `n` survivors yields exactly `2^n` selections.
    pub fn build<'a>(
        category: CategoryTag,
        matches: impl IntoIterator<Item = &'a CandidateMatch>,
        limits: &DomainLimits,
    ) -> Self {
        let mut groups: BTreeMap<&CubeId, Vec<&CandidateMatch>> = BTreeMap::new();
        for candidate in matches {
            if candidate.score < limits.min_score {
                continue;
            }
            groups.entry(&candidate.cube).or_default().push(candidate);
        }

        let cap = limits.group_cap();
        let mut domain = Self::empty(category);
        for (cube, mut group) in groups {
            group.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.cmp(b)));
            group.dedup();
            if group.len() > cap {
                let dropped = group.len() - cap;
                tracing::warn!(
                    category = %category,
                    cube = %cube,
                    kept = cap,
                    dropped,
                    "candidate group capped before subset expansion"
                );
                group.truncate(cap);
                domain.capped.push(CappedGroup {
                    cube: cube.clone(),
                    kept: cap,
                    dropped,
                });
            }
            let shared: Vec<Arc<CandidateMatch>> =
                group.into_iter().cloned().map(Arc::new).collect();
            domain.selections.extend(power_set(&shared));
        }
        tracing::debug!(
            category = %category,
            selections = domain.selections.len(),
            "category domain built"
        );
        domain
    }

    pub fn category(&self) -> CategoryTag {
        self.category
    }

    pub fn selections(&self) -> impl Iterator<Item = &CandidateSelection> + '_ {
        self.selections.iter()
    }

    /// Non-empty selections generated from `cube`.
    pub fn selections_for<'a>(
        &'a self,
        cube: &'a CubeId,
    ) -> impl Iterator<Item = &'a CandidateSelection> + 'a {
        self.selections.iter().filter(move |s| s.belongs_to(cube))
    }

    pub fn contains(&self, selection: &CandidateSelection) -> bool {
        self.selections.contains(selection)
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Cubes that contributed at least one candidate.
    pub fn cubes(&self) -> BTreeSet<&CubeId> {
        self.selections.iter().filter_map(|s| s.cube()).collect()
    }

    pub fn capped_groups(&self) -> &[CappedGroup] {
        &self.capped
    }
}

/// Every subset of `items`, the empty one included. `items.len()` must be small
/// enough for a bitmask; callers cap it at [`MAX_GROUP_CAP`].
fn power_set<'a>(
    items: &'a [Arc<CandidateMatch>],
) -> impl Iterator<Item = CandidateSelection> + 'a {
    debug_assert!(items.len() <= MAX_GROUP_CAP);
    (0u64..(1u64 << items.len())).map(move |mask| {
        CandidateSelection::from_shared(
            items
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1u64 << bit) != 0)
                .map(|(_, m)| Arc::clone(m)),
        )
    })
}
