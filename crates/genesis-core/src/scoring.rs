//! Compliance scoring and recommendation ranking.

use std::cmp::Ordering;

use genesis_bonds::toxicity::BondToxicity;
use genesis_ir::violation::{Severity, Violation, ViolationCode};
use serde::{Deserialize, Serialize};

use crate::config::ScoreWeights;

/// An actionable finding, ranked for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub code: ViolationCode,
    pub component: String,
    /// Score points this finding costs its component.
    pub deficit: f64,
    pub text: String,
}

impl Recommendation {
    pub fn from_violation(component: &str, violation: &Violation, deficit: f64) -> Self {
        Self {
            severity: violation.severity,
            code: violation.code,
            component: component.to_string(),
            deficit,
            text: format!(
                "{component}: {} ({}). {}",
                violation.message,
                violation.location,
                advice(violation.code)
            ),
        }
    }
}

fn advice(code: ViolationCode) -> &'static str {
    match code {
        ViolationCode::UnknownComponent => "Declare the component or fix the reference.",
        ViolationCode::EmptyTrace => "Implement the component's handler.",
        ViolationCode::MalformedOperation => "Use only recognized operation kinds.",
        ViolationCode::UnsatisfiedPatternStep => "Add the missing step to complete the codon.",
        ViolationCode::TrailingOperation => "Move the extra operation into its own handler.",
        ViolationCode::DirectStateMutation => "Route the mutation through a command or event.",
        ViolationCode::DisallowedPattern => "Restructure the component around an allowed pattern.",
        ViolationCode::ValencyImbalance => "Balance the workflow's inputs and outputs.",
        ViolationCode::ToxicBond => "Spread the calls or decouple them with events.",
        ViolationCode::CyclicDependency => "Break the cycle with an event-driven call.",
        ViolationCode::SelfDependency => "Remove the self-call.",
    }
}

/// Errors first, then by descending deficit. Code, component and text
/// break the remaining ties.
pub fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.deficit.total_cmp(&a.deficit))
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.component.cmp(&b.component))
            .then_with(|| a.text.cmp(&b.text))
    });
}

/// Sub-scores of one component, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub pattern: f64,
    pub bonds: f64,
    pub hubs: f64,
}

impl SubScores {
    pub fn weighted(&self, weights: &ScoreWeights) -> f64 {
        (weights.pattern * self.pattern + weights.bonds * self.bonds + weights.hubs * self.hubs)
            .clamp(0.0, 100.0)
    }
}

/// Everything the scorer reads about one component.
#[derive(Debug, Clone, Copy)]
pub struct ComponentFindings<'a> {
    pub component: &'a str,
    /// Pattern coverage; 0 when the trace was skipped.
    pub coverage: f64,
    /// Bonds in which the component is source or target.
    pub bonds: &'a [BondToxicity],
    pub hub_concentration: f64,
    pub violations: &'a [Violation],
}

impl ComponentFindings<'_> {
    pub fn toxic_fraction(&self) -> f64 {
        if self.bonds.is_empty() {
            return 0.0;
        }
        let toxic = self.bonds.iter().filter(|b| b.is_toxic).count();
        toxic as f64 / self.bonds.len() as f64
    }

    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            pattern: 100.0 * self.coverage.clamp(0.0, 1.0),
            bonds: 100.0 * (1.0 - self.toxic_fraction()),
            hubs: 100.0 * (1.0 - self.hub_concentration.clamp(0.0, 1.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentScore {
    pub sub_scores: SubScores,
    pub overall: f64,
    /// Ranked.
    pub recommendations: Vec<Recommendation>,
}

pub fn score(findings: &ComponentFindings<'_>, weights: &ScoreWeights) -> ComponentScore {
    let sub_scores = findings.sub_scores();
    let overall = sub_scores.weighted(weights);

    let pattern_findings = findings
        .violations
        .iter()
        .filter(|v| v.code.is_pattern_finding())
        .count();
    let pattern_deficit = weights.pattern * (100.0 - sub_scores.pattern);

    let mut recommendations: Vec<Recommendation> = findings
        .violations
        .iter()
        .map(|v| {
            let deficit = if v.code.is_pattern_finding() {
                pattern_deficit / pattern_findings as f64
            } else if v.code.is_bond_finding() {
                bond_deficit(v, findings, weights)
            } else {
                0.0
            };
            Recommendation::from_violation(findings.component, v, deficit)
        })
        .collect();

    // Inbound toxic bonds lower this score too; their findings belong to
    // the source, so they are recommended here with this component's cost.
    recommendations.extend(
        findings
            .bonds
            .iter()
            .filter(|b| b.is_toxic && b.source != findings.component)
            .flat_map(|b| {
                let found = b.violations();
                let deficit = bond_share(findings, weights) / found.len() as f64;
                found
                    .into_iter()
                    .map(move |v| Recommendation::from_violation(findings.component, &v, deficit))
            }),
    );
    rank(&mut recommendations);

    ComponentScore {
        sub_scores,
        overall,
        recommendations,
    }
}

/// An outbound toxic bond's cost, shared by every finding on that bond.
fn bond_deficit(
    violation: &Violation,
    findings: &ComponentFindings<'_>,
    weights: &ScoreWeights,
) -> f64 {
    let Some(bond) = findings
        .bonds
        .iter()
        .find(|b| b.location() == violation.location)
    else {
        return 0.0;
    };
    if !bond.is_toxic {
        return 0.0;
    }
    let on_same_bond = findings
        .violations
        .iter()
        .filter(|v| v.code.is_bond_finding() && v.location == violation.location)
        .count();
    bond_share(findings, weights) / on_same_bond as f64
}

/// Points one toxic bond costs the component.
fn bond_share(findings: &ComponentFindings<'_>, weights: &ScoreWeights) -> f64 {
    weights.bonds * 100.0 / findings.bonds.len() as f64
}

/// Pass rule for one component.
pub fn passes(overall: f64, violations: &[Violation], min_overall_score: f64, strict: bool) -> bool {
    let blocking = |v: &Violation| v.is_error() || strict;
    overall >= min_overall_score && !violations.iter().any(blocking)
}

/// Arithmetic mean of component scores; an empty project scores 100.
pub fn project_score(scores: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = scores
        .into_iter()
        .fold((0.0, 0usize), |(s, n), score| (s + score, n + 1));
    if count == 0 {
        100.0
    } else {
        sum / count as f64
    }
}

/// Location ordering for reports: operations by index, then components,
/// then bonds.
pub(crate) fn violation_order(a: &Violation, b: &Violation) -> Ordering {
    (&a.location, a.code, a.severity, &a.message).cmp(&(
        &b.location,
        b.code,
        b.severity,
        &b.message,
    ))
}
