use std::collections::BTreeSet;

use genesis_ir::trace::{OperationKind, Trace};
use genesis_ir::violation::{Location, Violation, ViolationCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grammar::{CodonGrammar, CodonPattern};

/// Coverage values closer than this are considered equal.
const COVERAGE_EPSILON: f64 = 1e-9;

/// Matching options derived from the compliance configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOptions {
    /// Minimum coverage for the best candidate to count as a match.
    pub min_coverage: f64,
    /// When non-empty, a component must match one of these.
    pub required_patterns: BTreeSet<CodonPattern>,
}

impl MatchOptions {
    pub fn strict() -> Self {
        Self {
            min_coverage: 1.0,
            required_patterns: BTreeSet::new(),
        }
    }

    pub fn relaxed() -> Self {
        Self {
            min_coverage: 0.5,
            required_patterns: BTreeSet::new(),
        }
    }

    pub fn with_required_patterns(mut self, patterns: impl IntoIterator<Item = CodonPattern>) -> Self {
        self.required_patterns = patterns.into_iter().collect();
        self
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::relaxed()
    }
}

/// Outcome of matching one trace against the grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched_pattern: Option<CodonPattern>,
    /// Fraction of the trace explained by the best candidate (0.0-1.0).
    pub coverage: f64,
    pub violations: Vec<Violation>,
}

impl MatchResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(Violation::is_error)
    }
}

/// A required group the candidate could not satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsatisfiedGroup {
    pub group_index: usize,
    /// Trace position where the group was expected.
    pub at: usize,
}

/// Structural match of a single candidate pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub pattern: CodonPattern,
    /// Operations consumed by the shape, from the start of the trace.
    pub consumed: usize,
    pub unsatisfied: Vec<UnsatisfiedGroup>,
    pub coverage: f64,
}

impl CandidateMatch {
    /// Trace position of the first failed group, if any.
    pub fn first_failure(&self) -> Option<usize> {
        self.unsatisfied.first().map(|u| u.at)
    }

    pub fn is_complete(&self, trace_len: usize) -> bool {
        self.unsatisfied.is_empty() && self.consumed == trace_len
    }
}

/// Greedy left-to-right match of `pattern` against `trace`.
///
/// A group that cannot be satisfied is recorded and skipped, so later
/// groups still get a chance to consume operations. Coverage is
/// `consumed / (trace length + unsatisfied groups)`.
pub fn match_pattern(pattern: CodonPattern, trace: &Trace) -> CandidateMatch {
    let ops = trace.operations();
    let mut pos = 0;
    let mut unsatisfied = Vec::new();

    for (group_index, group) in pattern.shape().iter().enumerate() {
        let mut count = 0;
        while pos < ops.len() && group.accepts(ops[pos].kind, count) {
            pos += 1;
            count += 1;
        }
        if count < group.cardinality.min() {
            unsatisfied.push(UnsatisfiedGroup {
                group_index,
                at: pos,
            });
        }
    }

    let denominator = ops.len() + unsatisfied.len();
    let coverage = if denominator == 0 {
        0.0
    } else {
        pos as f64 / denominator as f64
    };

    CandidateMatch {
        pattern,
        consumed: pos,
        unsatisfied,
        coverage,
    }
}

/// Matches component traces against a codon grammar.
///
/// Holds only shared references and immutable options, so one validator
/// can serve any number of worker threads.
#[derive(Debug, Clone)]
pub struct PatternValidator<'g> {
    grammar: &'g CodonGrammar,
    options: MatchOptions,
}

impl<'g> PatternValidator<'g> {
    pub fn new(grammar: &'g CodonGrammar, options: MatchOptions) -> Self {
        Self { grammar, options }
    }

    pub fn validate(&self, trace: &Trace) -> MatchResult {
        let component = trace.component();
        let Some(entry) = trace.entry_kind() else {
            debug!(component, "empty trace");
            return MatchResult {
                matched_pattern: None,
                coverage: 0.0,
                violations: vec![Violation::warning(
                    ViolationCode::EmptyTrace,
                    Location::Component {
                        name: component.to_string(),
                    },
                    format!("'{component}' has no recorded operations"),
                )],
            };
        };

        let mut violations = direct_state_mutations(trace);

        let best = self
            .grammar
            .lookup(entry)
            .into_iter()
            .map(|pattern| match_pattern(pattern, trace))
            .fold(None::<CandidateMatch>, |best, candidate| match best {
                Some(b) if candidate.coverage <= b.coverage + COVERAGE_EPSILON => Some(b),
                _ => Some(candidate),
            });

        let (matched_pattern, coverage) = match best {
            None => {
                violations.push(Violation::error(
                    ViolationCode::UnsatisfiedPatternStep,
                    Location::Operation { index: 0 },
                    format!("no codon pattern begins with `{entry}`"),
                ));
                (None, 0.0)
            }
            Some(best) => {
                let accepted = best.coverage + COVERAGE_EPSILON >= self.options.min_coverage;
                violations.extend(step_violations(&best, trace, accepted));
                (accepted.then_some(best.pattern), best.coverage)
            }
        };

        if let Some(v) = self.required_pattern_violation(component, matched_pattern) {
            violations.push(v);
        }

        violations.sort_by(|a, b| {
            (&a.location, a.code, a.severity).cmp(&(&b.location, b.code, b.severity))
        });

        debug!(
            component,
            pattern = ?matched_pattern,
            coverage,
            violations = violations.len(),
            "trace validated"
        );

        MatchResult {
            matched_pattern,
            coverage,
            violations,
        }
    }

    fn required_pattern_violation(
        &self,
        component: &str,
        matched: Option<CodonPattern>,
    ) -> Option<Violation> {
        let required = &self.options.required_patterns;
        if required.is_empty() || matched.is_some_and(|p| required.contains(&p)) {
            return None;
        }
        let allowed = required
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ");
        let found = matched.map_or("no pattern".to_string(), |p| p.to_string());
        Some(Violation::error(
            ViolationCode::DisallowedPattern,
            Location::Component {
                name: component.to_string(),
            },
            format!("'{component}' matches {found}; required one of: {allowed}"),
        ))
    }
}

/// Every `MutateState` that no command or event handed control to.
fn direct_state_mutations(trace: &Trace) -> Vec<Violation> {
    trace
        .operations()
        .iter()
        .take_while(|op| !op.kind.is_receive())
        .filter(|op| op.kind == OperationKind::MutateState)
        .map(|op| {
            Violation::error(
                ViolationCode::DirectStateMutation,
                Location::Operation {
                    index: op.sequence_index,
                },
                "state mutated without a preceding command or event; direct database access bypasses connector",
            )
        })
        .collect()
}

fn step_violations(best: &CandidateMatch, trace: &Trace, accepted: bool) -> Vec<Violation> {
    let shape = best.pattern.shape();
    let missing = best.unsatisfied.iter().map(|u| {
        let group = shape[u.group_index];
        let message = format!(
            "{} expects {} at operation #{}",
            best.pattern, group, u.at
        );
        let location = Location::Operation { index: u.at };
        if accepted {
            Violation::warning(ViolationCode::UnsatisfiedPatternStep, location, message)
        } else {
            Violation::error(ViolationCode::UnsatisfiedPatternStep, location, message)
        }
    });

    let forbidden = best.pattern.forbidden_kinds();
    let trailing = trace.operations()[best.consumed..].iter().map(|op| {
        let location = Location::Operation {
            index: op.sequence_index,
        };
        if forbidden.contains(&op.kind) {
            Violation::error(
                ViolationCode::TrailingOperation,
                location,
                format!("`{}` may not follow a {} codon", op.kind, best.pattern),
            )
        } else {
            Violation::warning(
                ViolationCode::TrailingOperation,
                location,
                format!("`{}` is not part of the {} codon", op.kind, best.pattern),
            )
        }
    });

    missing.chain(trailing).collect()
}
