use genesis_bonds::graph::DependencyGraph;
use genesis_bonds::toxicity::{analyze, BondToxicity, ToxicityAnalysis, ToxicityConfig};
use genesis_ir::types::{CallKind, ComponentDescriptor, ComponentKind, EdgeInput};
use genesis_ir::violation::{Severity, ViolationCode};

fn components(names: &[&str]) -> Vec<ComponentDescriptor> {
    names
        .iter()
        .map(|n| ComponentDescriptor::new(*n, "orders", ComponentKind::Aggregate))
        .collect()
}

fn direct(source: &str, target: &str, weight: u64) -> EdgeInput {
    EdgeInput::new(source, target, CallKind::DirectCall, weight)
}

fn run(names: &[&str], edges: &[EdgeInput]) -> ToxicityAnalysis {
    let graph = DependencyGraph::build(&components(names), edges).unwrap();
    analyze(&graph, &ToxicityConfig::default())
}

fn bond<'a>(analysis: &'a ToxicityAnalysis, source: &str, target: &str) -> &'a BondToxicity {
    analysis
        .bonds
        .iter()
        .find(|b| b.source == source && b.target == target)
        .unwrap()
}

#[test]
fn test_concentrated_bond_is_toxic() {
    let analysis = run(&["a", "b", "c"], &[direct("a", "b", 9), direct("a", "c", 1)]);

    let ab = bond(&analysis, "a", "b");
    assert!((ab.coupling_strength - 0.9).abs() < 1e-9);
    assert!(ab.is_toxic);
    assert!(ab.exceeds_threshold);

    let ac = bond(&analysis, "a", "c");
    assert!((ac.coupling_strength - 0.1).abs() < 1e-9);
    assert!(!ac.is_toxic);
}

#[test]
fn test_threshold_is_exclusive() {
    let analysis = run(&["a", "b", "c"], &[direct("a", "b", 3), direct("a", "c", 2)]);
    assert!(!bond(&analysis, "a", "b").is_toxic);

    let graph = DependencyGraph::build(
        &components(&["a", "b", "c"]),
        &[direct("a", "b", 3), direct("a", "c", 2)],
    )
    .unwrap();
    let strict = analyze(
        &graph,
        &ToxicityConfig {
            toxicity_threshold: 0.5,
        },
    );
    assert!(bond(&strict, "a", "b").is_toxic);
}

#[test]
fn test_three_node_direct_cycle_is_toxic() {
    let analysis = run(
        &["a", "b", "c", "d"],
        &[
            direct("a", "b", 1),
            direct("a", "d", 9),
            direct("b", "c", 1),
            direct("b", "d", 9),
            direct("c", "a", 1),
            direct("c", "d", 9),
        ],
    );
    assert_eq!(analysis.cycles, vec![vec!["a".to_string(), "b".into(), "c".into()]]);
    for (s, t) in [("a", "b"), ("b", "c"), ("c", "a")] {
        let b = bond(&analysis, s, t);
        assert!(b.coupling_strength < 0.6);
        assert!(b.on_cycle);
        assert!(b.is_toxic);
        assert!(b
            .violations()
            .iter()
            .any(|v| v.code == ViolationCode::CyclicDependency && v.severity == Severity::Error));
    }
    assert!(!bond(&analysis, "a", "d").on_cycle);
}

#[test]
fn test_event_driven_cycle_is_not_toxic() {
    let event = |s: &str, t: &str| EdgeInput::new(s, t, CallKind::EventDriven, 1);
    let analysis = run(
        &["a", "b", "c"],
        &[
            event("a", "b"),
            direct("a", "c", 4),
            event("b", "a"),
            direct("b", "c", 4),
        ],
    );
    assert!(analysis.cycles.is_empty());
    assert!(!bond(&analysis, "a", "b").is_toxic);
    assert!(!bond(&analysis, "b", "a").is_toxic);
}

#[test]
fn test_self_loop_is_not_a_cycle_but_counts_in_coupling() {
    let analysis = run(&["a", "b"], &[direct("a", "a", 1), direct("a", "b", 1)]);
    assert!(analysis.cycles.is_empty());

    let self_bond = bond(&analysis, "a", "a");
    assert!(self_bond.self_loop);
    assert!(!self_bond.on_cycle);
    assert!((self_bond.coupling_strength - 0.5).abs() < 1e-9);

    let ab = bond(&analysis, "a", "b");
    assert!((ab.coupling_strength - 0.5).abs() < 1e-9);
    assert!(!ab.is_toxic);

    let codes: Vec<_> = analysis.violations_for("a").iter().map(|v| v.code).collect();
    assert_eq!(codes, vec![ViolationCode::SelfDependency]);
}

#[test]
fn test_empty_graph_has_no_hubs_or_toxicity() {
    let analysis = run(&["a", "b", "c"], &[]);
    assert!(analysis.bonds.is_empty());
    for name in ["a", "b", "c"] {
        assert_eq!(analysis.hub_concentration(name), 0.0);
        assert_eq!(analysis.bonds_of(name).count(), 0);
        assert!(analysis.violations_for(name).is_empty());
    }
}

#[test]
fn test_hub_concentration_normalizes_by_graph_size() {
    // Star: hub calls every leaf, every leaf calls the hub.
    let mut edges = Vec::new();
    for leaf in ["l1", "l2", "l3"] {
        edges.push(direct("hub", leaf, 1));
        edges.push(EdgeInput::new(leaf, "hub", CallKind::EventDriven, 1));
    }
    let analysis = run(&["hub", "l1", "l2", "l3"], &edges);
    assert!((analysis.hub_concentration("hub") - 1.0).abs() < 1e-9);
    assert!((analysis.hub_concentration("l1") - 2.0 / 6.0).abs() < 1e-9);
}

#[test]
fn test_single_component_hub_is_zero() {
    let analysis = run(&["solo"], &[direct("solo", "solo", 3)]);
    assert_eq!(analysis.hub_concentration("solo"), 0.0);
}

#[test]
fn test_zero_weight_bonds_have_no_coupling() {
    let analysis = run(&["a", "b"], &[direct("a", "b", 0)]);
    let ab = bond(&analysis, "a", "b");
    assert_eq!(ab.coupling_strength, 0.0);
    assert!(!ab.is_toxic);
}

#[test]
fn test_bonds_of_covers_both_directions() {
    let analysis = run(
        &["a", "b", "c"],
        &[direct("a", "b", 9), direct("a", "c", 1), direct("c", "b", 1)],
    );
    // b only receives: a->b (toxic) and c->b (toxic, sole outbound bond of c).
    let into_b: Vec<(&str, bool)> = analysis
        .bonds_of("b")
        .map(|t| (t.source.as_str(), t.is_toxic))
        .collect();
    assert_eq!(into_b, vec![("a", true), ("c", true)]);
    assert!(analysis.violations_for("b").is_empty());

    let of_a: Vec<&str> = analysis.bonds_of("a").map(|t| t.target.as_str()).collect();
    assert_eq!(of_a, vec!["b", "c"]);
    assert_eq!(analysis.violations_for("a").len(), 1);
}

#[test]
fn test_self_loop_listed_once() {
    let analysis = run(&["a"], &[direct("a", "a", 2)]);
    assert_eq!(analysis.bonds_of("a").count(), 1);
}

#[test]
fn test_analysis_is_repeatable() {
    let edges = [direct("a", "b", 2), direct("b", "a", 2), direct("b", "c", 1)];
    let first = run(&["a", "b", "c"], &edges);
    let second = run(&["a", "b", "c"], &edges);
    assert_eq!(first, second);
}

#[test]
fn test_large_ring_is_indexed_per_component() {
    let names: Vec<String> = (0..20_000).map(|i| format!("c{i:05}")).collect();
    let decls: Vec<ComponentDescriptor> = names
        .iter()
        .map(|n| ComponentDescriptor::new(n.as_str(), "ring", ComponentKind::Event))
        .collect();
    let edges: Vec<EdgeInput> = names
        .iter()
        .zip(names.iter().cycle().skip(1))
        .map(|(s, t)| EdgeInput::new(s.as_str(), t.as_str(), CallKind::EventDriven, 1))
        .collect();
    let graph = DependencyGraph::build(&decls, &edges).unwrap();
    let analysis = analyze(&graph, &ToxicityConfig::default());

    assert!(analysis.cycles.is_empty());
    for name in &names {
        // One bond in, one bond out.
        assert_eq!(analysis.bonds_of(name).count(), 2);
        assert_eq!(analysis.violations_for(name).len(), 1);
    }
}
