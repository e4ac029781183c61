use genesis_codon::grammar::{CodonGrammar, CodonPattern};
use genesis_codon::validate::{match_pattern, MatchOptions, PatternValidator};
use genesis_ir::trace::{OperationKind, Trace};
use genesis_ir::violation::{Location, Severity, ViolationCode};
use proptest::prelude::*;

use OperationKind::*;

fn strict() -> PatternValidator<'static> {
    PatternValidator::new(CodonGrammar::canonical(), MatchOptions::strict())
}

fn relaxed() -> PatternValidator<'static> {
    PatternValidator::new(CodonGrammar::canonical(), MatchOptions::relaxed())
}

fn trace(kinds: &[OperationKind]) -> Trace {
    Trace::from_kinds("component_under_test", kinds)
}

#[test]
fn test_cag_full_match() {
    let result = strict().validate(&trace(&[ReceiveCommand, MutateState, EmitEvent]));
    assert_eq!(result.matched_pattern, Some(CodonPattern::Cag));
    assert_eq!(result.coverage, 1.0);
    assert!(result.violations.is_empty());
}

#[test]
fn test_missing_event_fails_strict() {
    let result = strict().validate(&trace(&[ReceiveCommand, MutateState]));
    assert_eq!(result.matched_pattern, None);
    assert!(result.coverage < 1.0);

    let unsatisfied: Vec<_> = result
        .violations
        .iter()
        .filter(|v| v.code == ViolationCode::UnsatisfiedPatternStep)
        .collect();
    assert_eq!(unsatisfied.len(), 1);
    assert_eq!(unsatisfied[0].severity, Severity::Error);
    assert_eq!(unsatisfied[0].location, Location::Operation { index: 2 });
    assert!(unsatisfied[0].message.contains("emit_event"));
}

#[test]
fn test_missing_event_is_tolerated_when_relaxed() {
    let result = relaxed().validate(&trace(&[ReceiveCommand, MutateState]));
    assert_eq!(result.matched_pattern, Some(CodonPattern::Cag));
    assert!((result.coverage - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].severity, Severity::Warning);
    assert!(!result.has_errors());
}

#[test]
fn test_direct_state_mutation_without_handler() {
    for validator in [strict(), relaxed()] {
        let result = validator.validate(&trace(&[MutateState, EmitEvent]));
        assert!(result
            .violations
            .iter()
            .any(|v| v.code == ViolationCode::DirectStateMutation
                && v.severity == Severity::Error
                && v.location == Location::Operation { index: 0 }));
        assert_eq!(result.matched_pattern, None);
    }
}

#[test]
fn test_direct_state_mutation_only_before_first_handler() {
    let result = relaxed().validate(&trace(&[
        InvokeConnector,
        MutateState,
        ReceiveCommand,
        MutateState,
        EmitEvent,
    ]));
    let direct: Vec<_> = result
        .violations
        .iter()
        .filter(|v| v.code == ViolationCode::DirectStateMutation)
        .collect();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].location, Location::Operation { index: 1 });
}

#[test]
fn test_ctc_match() {
    let result = strict().validate(&trace(&[
        ReceiveCommand,
        InvokeTransformation,
        InvokeTransformation,
        InvokeConnector,
    ]));
    assert_eq!(result.matched_pattern, Some(CodonPattern::Ctc));
    assert_eq!(result.coverage, 1.0);
    assert!(result.violations.is_empty());
}

#[test]
fn test_gcag_and_gcac_are_distinguished() {
    let gcag = strict().validate(&trace(&[ReceiveEvent, InvokeConnector, MutateState, EmitEvent]));
    assert_eq!(gcag.matched_pattern, Some(CodonPattern::Gcag));

    let gcac = strict().validate(&trace(&[
        ReceiveEvent,
        InvokeConnector,
        MutateState,
        InvokeConnector,
    ]));
    assert_eq!(gcac.matched_pattern, Some(CodonPattern::Gcac));
}

#[test]
fn test_choreography_match() {
    let result = strict().validate(&trace(&[ReceiveEvent, EmitEvent, EmitEvent]));
    assert_eq!(result.matched_pattern, Some(CodonPattern::Choreography));
    assert!(result.violations.is_empty());
}

#[test]
fn test_choreography_forbids_trailing_mutation() {
    let result = relaxed().validate(&trace(&[ReceiveEvent, EmitEvent, MutateState]));
    assert_eq!(result.matched_pattern, Some(CodonPattern::Choreography));
    let trailing = result
        .violations
        .iter()
        .find(|v| v.code == ViolationCode::TrailingOperation)
        .unwrap();
    assert_eq!(trailing.severity, Severity::Error);
    assert_eq!(trailing.location, Location::Operation { index: 2 });
}

#[test]
fn test_trailing_operation_is_a_warning() {
    let result = relaxed().validate(&trace(&[
        ReceiveCommand,
        MutateState,
        EmitEvent,
        InvokeConnector,
    ]));
    assert_eq!(result.matched_pattern, Some(CodonPattern::Cag));
    assert!((result.coverage - 0.75).abs() < 1e-9);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].code, ViolationCode::TrailingOperation);
    assert_eq!(result.violations[0].severity, Severity::Warning);
}

#[test]
fn test_trailing_operation_fails_strict_match() {
    let result = strict().validate(&trace(&[
        ReceiveCommand,
        MutateState,
        EmitEvent,
        InvokeConnector,
    ]));
    assert_eq!(result.matched_pattern, None);
    assert!(result
        .violations
        .iter()
        .all(|v| v.code == ViolationCode::TrailingOperation));
}

#[test]
fn test_empty_trace_is_a_warning() {
    let result = strict().validate(&trace(&[]));
    assert_eq!(result.matched_pattern, None);
    assert_eq!(result.coverage, 0.0);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].code, ViolationCode::EmptyTrace);
    assert_eq!(result.violations[0].severity, Severity::Warning);
}

#[test]
fn test_required_patterns_reject_other_codons() {
    let validator = PatternValidator::new(
        CodonGrammar::canonical(),
        MatchOptions::strict().with_required_patterns([CodonPattern::Gcag, CodonPattern::Gcac]),
    );
    let result = validator.validate(&trace(&[ReceiveCommand, MutateState, EmitEvent]));
    assert_eq!(result.matched_pattern, Some(CodonPattern::Cag));
    let v = result
        .violations
        .iter()
        .find(|v| v.code == ViolationCode::DisallowedPattern)
        .unwrap();
    assert!(v.message.contains("GCAG"));
    assert_eq!(
        v.location,
        Location::Component {
            name: "component_under_test".into()
        }
    );
}

#[test]
fn test_required_patterns_accept_listed_codon() {
    let validator = PatternValidator::new(
        CodonGrammar::canonical(),
        MatchOptions::strict().with_required_patterns([CodonPattern::Cag]),
    );
    let result = validator.validate(&trace(&[ReceiveCommand, MutateState, EmitEvent]));
    assert!(result.violations.is_empty());
}

#[test]
fn test_skipped_group_still_lets_later_groups_match() {
    let candidate = match_pattern(CodonPattern::Cag, &trace(&[ReceiveCommand, EmitEvent]));
    assert_eq!(candidate.consumed, 2);
    assert_eq!(candidate.unsatisfied.len(), 1);
    assert_eq!(candidate.first_failure(), Some(1));
    assert!((candidate.coverage - 2.0 / 3.0).abs() < 1e-9);
    assert!(!candidate.is_complete(2));
}

#[test]
fn test_restricted_grammar_changes_candidates() {
    let grammar = CodonGrammar::from_patterns(&[CodonPattern::Ctc]);
    let validator = PatternValidator::new(&grammar, MatchOptions::relaxed());
    let result = validator.validate(&trace(&[ReceiveCommand, MutateState, EmitEvent]));
    assert_eq!(result.matched_pattern, None);
    assert!(result.has_errors());
}

fn pattern_strategy() -> impl Strategy<Value = CodonPattern> {
    prop::sample::select(CodonPattern::ALL.to_vec())
}

fn any_kind() -> impl Strategy<Value = OperationKind> {
    prop::sample::select(OperationKind::ALL.to_vec())
}

/// Expand a pattern into a fully matching trace, repeating each
/// repeatable group `extra + 1` times.
fn full_trace(pattern: CodonPattern, extra: &[usize]) -> Vec<OperationKind> {
    let mut kinds = Vec::new();
    for (i, group) in pattern.shape().iter().enumerate() {
        let n = if group.cardinality.max().is_none() {
            1 + extra.get(i).copied().unwrap_or(0)
        } else {
            group.cardinality.min()
        };
        kinds.extend(std::iter::repeat(group.kind).take(n));
    }
    kinds
}

proptest! {
    #[test]
    fn prop_validate_is_deterministic(kinds in prop::collection::vec(any_kind(), 0..12)) {
        let t = trace(&kinds);
        let first = relaxed().validate(&t);
        let second = relaxed().validate(&t);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_coverage_is_a_fraction(kinds in prop::collection::vec(any_kind(), 0..12)) {
        let result = strict().validate(&trace(&kinds));
        prop_assert!((0.0..=1.0).contains(&result.coverage));
    }

    #[test]
    fn prop_full_shapes_match_their_pattern(
        pattern in pattern_strategy(),
        extra in prop::collection::vec(0usize..3, 4),
    ) {
        let result = strict().validate(&trace(&full_trace(pattern, &extra)));
        prop_assert_eq!(result.matched_pattern, Some(pattern));
        prop_assert_eq!(result.coverage, 1.0);
        prop_assert!(result.violations.is_empty());
    }

    #[test]
    fn prop_extra_repetition_never_lowers_coverage(
        pattern in pattern_strategy(),
        extra in prop::collection::vec(0usize..3, 4),
        bump in 0usize..4,
    ) {
        let before = strict().validate(&trace(&full_trace(pattern, &extra)));
        let mut more = extra.clone();
        more[bump] += 1;
        let after = strict().validate(&trace(&full_trace(pattern, &more)));
        prop_assert!(after.coverage >= before.coverage);
    }
}
