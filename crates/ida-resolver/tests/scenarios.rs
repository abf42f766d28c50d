use std::collections::BTreeSet;
use std::time::Instant;

use ida_protocol::{
    CandidateMatch, CategoryExtra, CategoryMatches, CategoryTag, ContractError,
    DimensionQualification, PatternPart,
};
use ida_resolver::{
    parse_config, resolve, ExhaustiveStrategy, ResolveError, Resolver, ResolverConfig,
    SearchBudget, StrategyKind,
};

fn measure(cube: &str, element: &str, score: f64) -> CandidateMatch {
    CandidateMatch::try_new(
        CategoryTag::AggregateMeasures,
        element,
        cube,
        element,
        "measure",
        score,
        CategoryExtra::None,
    )
    .expect("valid measure")
}

fn scoped(category: CategoryTag, cube: &str, element: &str, dimension: &str, score: f64) -> CandidateMatch {
    CandidateMatch::try_new(
        category,
        element,
        cube,
        element,
        "level",
        score,
        CategoryExtra::dimension(dimension),
    )
    .expect("valid dimension-scoped match")
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn full_group_beats_any_subset_and_other_cubes() {
    let matches: CategoryMatches = [
        measure("cubeA", "m1", 0.9),
        measure("cubeA", "m2", 0.4),
        measure("cubeB", "m3", 0.7),
    ]
    .into_iter()
    .collect();
    let resolution = Resolver::default().resolve(&matches).expect("resolve");
    assert_eq!(resolution.situation.cube.as_deref(), Some("cubeA"));
    assert_eq!(resolution.situation.measures, set(&["m1", "m2"]));
    assert!((resolution.score() - 1.3).abs() < 1e-12);
}

#[test]
fn near_equal_totals_keep_the_first_cube() {
    let matches: CategoryMatches = [
        measure("cubeA", "m1", 0.3),
        measure("cubeB", "m2", 0.1),
        measure("cubeB", "m3", 0.2),
    ]
    .into_iter()
    .collect();
    for kind in [StrategyKind::ClosedForm, StrategyKind::Exhaustive] {
        let mut config = ResolverConfig::default();
        config.search.strategy = kind;
        let resolution = Resolver::new(config).expect("valid config").resolve(&matches).expect("resolve");
        assert_eq!(resolution.situation.cube.as_deref(), Some("cubeA"), "{kind:?}");
        assert_eq!(resolution.situation.measures, set(&["m1"]));
    }
}

#[test]
fn no_candidates_resolve_to_undefined() {
    let situation = resolve(&CategoryMatches::new()).expect("resolve");
    assert!(situation.is_undefined());
    assert_eq!(situation.cube, None);
}

#[test]
fn single_cube_wins_across_categories() {
    let matches: CategoryMatches = [
        measure("cubeA", "m1", 0.9),
        scoped(CategoryTag::Levels, "cubeB", "l1", "d1", 0.95),
    ]
    .into_iter()
    .collect();
    let situation = resolve(&matches).expect("resolve");
    assert_eq!(situation.cube.as_deref(), Some("cubeB"));
    assert!(situation.measures.is_empty());
    assert_eq!(situation.dimension_qualifications.len(), 1);
    assert_eq!(
        situation.dimension_qualifications["d1"],
        DimensionQualification {
            dimension: "d1".into(),
            granularity_level: Some("l1".into()),
            slice_conditions: BTreeSet::new(),
        }
    );
}

#[test]
fn slice_without_level_keeps_granularity_open() {
    let matches: CategoryMatches = [
        measure("cubeA", "m1", 0.5),
        scoped(CategoryTag::LevelPredicates, "cubeA", "p1", "d2", 0.6),
    ]
    .into_iter()
    .collect();
    let situation = resolve(&matches).expect("resolve");
    let d2 = &situation.dimension_qualifications["d2"];
    assert_eq!(d2.granularity_level, None);
    assert_eq!(d2.slice_conditions, set(&["p1"]));
    assert!(!situation.is_executable());
}

#[test]
fn one_level_per_dimension_is_configurable() {
    let matches: CategoryMatches = [
        scoped(CategoryTag::Levels, "cubeA", "month", "time", 0.6),
        scoped(CategoryTag::Levels, "cubeA", "year", "time", 0.5),
    ]
    .into_iter()
    .collect();

    let strict = Resolver::default().resolve(&matches).expect("resolve");
    assert_eq!(strict.score(), 0.6);
    assert_eq!(
        strict.situation.dimension_qualifications["time"]
            .granularity_level
            .as_deref(),
        Some("month")
    );

    let config = parse_config("one_level_per_dimension = false").expect("config");
    let loose = Resolver::new(config).expect("resolver").resolve(&matches).expect("resolve");
    assert!((loose.score() - 1.1).abs() < 1e-12);
    // both levels are selected; materialization keeps the best one
    assert_eq!(
        loose.situation.dimension_qualifications["time"]
            .granularity_level
            .as_deref(),
        Some("month")
    );
}

#[test]
fn disabled_categories_do_not_influence_the_cube() {
    let matches: CategoryMatches = [
        measure("cubeA", "m1", 0.4),
        scoped(CategoryTag::Levels, "cubeB", "l1", "d1", 0.9),
    ]
    .into_iter()
    .collect();
    let config = parse_config("[categories]\nlevels = false").expect("config");
    let situation = Resolver::new(config)
        .expect("resolver")
        .resolve(&matches)
        .expect("resolve")
        .into_situation();
    assert_eq!(situation.cube.as_deref(), Some("cubeA"));
    assert!(situation.dimension_qualifications.is_empty());
}

#[test]
fn min_score_prefilters_weak_matches() {
    let matches: CategoryMatches = [measure("cubeA", "m1", 0.05)].into_iter().collect();
    let config = ResolverConfig {
        min_score: 0.1,
        ..ResolverConfig::default()
    };
    let situation = Resolver::new(config)
        .expect("resolver")
        .resolve(&matches)
        .expect("resolve")
        .into_situation();
    assert!(situation.is_undefined());
}

#[test]
fn oversized_groups_are_capped_not_rejected() {
    let matches: CategoryMatches = (0..30)
        .map(|i| measure("cubeA", &format!("m{i:02}"), (i as f64 + 1.0) / 100.0))
        .collect();
    let config = ResolverConfig {
        max_candidates_per_cube: 4,
        ..ResolverConfig::default()
    };
    let situation = Resolver::new(config)
        .expect("resolver")
        .resolve(&matches)
        .expect("resolve")
        .into_situation();
    assert_eq!(situation.measures, set(&["m26", "m27", "m28", "m29"]));
}

#[test]
fn comparative_categories_materialize() {
    let comparative = CandidateMatch::try_new(
        CategoryTag::ComparativeMeasures,
        "growth",
        "cubeA",
        "growth_rate",
        "comparative",
        0.7,
        CategoryExtra::ComparativeMeasure {
            measure: "sales".into(),
            part: PatternPart::SetOfComparison,
        },
    )
    .expect("valid");
    let predicate = CandidateMatch::try_new(
        CategoryTag::ComparativeMeasurePredicates,
        "higher than",
        "cubeA",
        "growth_gt",
        "comparative",
        0.3,
        CategoryExtra::Comparative {
            part: PatternPart::SetOfInterest,
        },
    )
    .expect("valid");
    let situation = resolve(&[comparative, predicate].into_iter().collect()).expect("resolve");
    assert_eq!(situation.comparative_measures, set(&["growth_rate"]));
    assert_eq!(situation.comparative_measure_predicates, set(&["growth_gt"]));
}

#[test]
fn malformed_input_is_rejected_not_coerced() {
    let raw = serde_json::json!({
        "aggregate_measures": [{
            "category": "aggregate_measures",
            "term": "sales",
            "cube": "cubeA",
            "element": "m1",
            "score": 1.5
        }]
    });
    let matches: CategoryMatches = serde_json::from_value(raw).expect("schema-compatible");
    let err = resolve(&matches).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Contract(ContractError::ScoreOutOfRange { .. })
    ));
}

#[test]
fn misfiled_match_is_rejected() {
    let raw = serde_json::json!({
        "levels": [{
            "category": "aggregate_measures",
            "term": "sales",
            "cube": "cubeA",
            "element": "m1",
            "score": 0.5
        }]
    });
    let matches: CategoryMatches = serde_json::from_value(raw).expect("schema-compatible");
    assert!(matches!(
        resolve(&matches),
        Err(ResolveError::Contract(ContractError::CategoryMismatch { .. }))
    ));
}

#[test]
fn exhausted_budget_returns_feasible_best_so_far() {
    let matches: CategoryMatches = [
        measure("cubeA", "m1", 0.2),
        measure("cubeB", "m2", 0.9),
        scoped(CategoryTag::Levels, "cubeA", "l1", "d1", 0.3),
    ]
    .into_iter()
    .collect();
    let resolver = Resolver::default().with_strategy(Box::new(ExhaustiveStrategy));
    let resolution = resolver
        .resolve_with_budget(&matches, &SearchBudget::unlimited().with_max_evaluations(10))
        .expect("resolve");
    assert!(!resolution.solution.complete);
    assert_eq!(resolution.solution.evaluations, 10);
    assert!(resolver.constraints().is_feasible(&resolution.solution.entity));

    let expired = Resolver::default()
        .resolve_with_budget(&matches, &SearchBudget::unlimited().with_deadline(Instant::now()))
        .expect("resolve");
    assert!(!expired.solution.complete);
    assert!(expired.situation.is_undefined());
}

#[test]
fn strategies_agree_on_a_mixed_utterance() {
    let matches: CategoryMatches = [
        measure("cubeA", "m1", 0.6),
        measure("cubeB", "m2", 0.5),
        scoped(CategoryTag::Levels, "cubeB", "l1", "d1", 0.3),
        scoped(CategoryTag::LevelPredicates, "cubeA", "p1", "d1", 0.1),
    ]
    .into_iter()
    .collect();
    let closed = Resolver::default().resolve(&matches).expect("closed form");
    let mut config = ResolverConfig::default();
    config.search.strategy = StrategyKind::Exhaustive;
    let oracle = Resolver::new(config)
        .expect("resolver")
        .resolve(&matches)
        .expect("exhaustive");
    assert_eq!(closed.score().to_bits(), oracle.score().to_bits());
    assert_eq!(closed.situation, oracle.situation);
    assert_eq!(closed.situation.cube.as_deref(), Some("cubeB"));
}
