//! Compliance report assembly.
//!
//! Assembly is pure: it takes finished component results and returns a
//! new report without touching its inputs.

use genesis_bonds::toxicity::BondToxicity;
use genesis_codon::grammar::CodonPattern;
use genesis_codon::valency::ValencyReport;
use genesis_codon::validate::MatchResult;
use genesis_ir::types::ComponentDescriptor;
use genesis_ir::violation::{Location, Severity, Violation};
use serde::{Deserialize, Serialize};

use crate::scoring::{project_score, rank, Recommendation, SubScores};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub component: ComponentDescriptor,
    /// Absent when the trace could not be read.
    pub match_result: Option<MatchResult>,
    /// Pattern, bond and valency findings plus this component's input errors.
    pub violations: Vec<Violation>,
    pub toxicity_by_bond: Vec<BondToxicity>,
    pub hub_concentration: f64,
    #[serde(default)]
    pub valency: Vec<ValencyReport>,
    pub sub_scores: SubScores,
    pub overall_score: f64,
    pub passed: bool,
    pub recommendations: Vec<Recommendation>,
}

impl ComponentReport {
    pub fn name(&self) -> &str {
        &self.component.name
    }

    pub fn matched_pattern(&self) -> Option<CodonPattern> {
        self.match_result.as_ref().and_then(|m| m.matched_pattern)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Ordered by component name.
    pub components: Vec<ComponentReport>,
    pub project_score: f64,
    /// Every component's recommendations and the input errors, ranked.
    pub recommendations: Vec<Recommendation>,
    /// Input errors that belong to no declared component.
    pub input_errors: Vec<Violation>,
    pub cycles: Vec<Vec<String>>,
    pub strict_mode: bool,
    pub passed: bool,
}

impl ComplianceReport {
    /// The exit-status signal: true when every component passed and no
    /// input was rejected.
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn component(&self, name: &str) -> Option<&ComponentReport> {
        self.components
            .binary_search_by(|c| c.name().cmp(name))
            .ok()
            .map(|i| &self.components[i])
    }

    pub fn error_count(&self) -> usize {
        self.all_violations().filter(|v| v.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.all_violations().filter(|v| !v.is_error()).count()
    }

    pub fn all_violations(&self) -> impl Iterator<Item = &Violation> {
        self.components
            .iter()
            .flat_map(|c| c.violations.iter())
            .chain(self.input_errors.iter())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Merge finished component reports into a project report.
pub fn assemble(
    mut components: Vec<ComponentReport>,
    input_errors: Vec<Violation>,
    cycles: Vec<Vec<String>>,
    strict_mode: bool,
) -> ComplianceReport {
    components.sort_by(|a, b| a.name().cmp(b.name()));

    let mut recommendations: Vec<Recommendation> = components
        .iter()
        .flat_map(|c| c.recommendations.iter().cloned())
        .chain(input_errors.iter().map(|v| {
            let component = match &v.location {
                Location::Component { name } => name.as_str(),
                Location::Bond { source, .. } => source.as_str(),
                Location::Operation { .. } => "",
            };
            Recommendation::from_violation(component, v, 0.0)
        }))
        .collect();
    rank(&mut recommendations);

    let passed = input_errors.is_empty() && components.iter().all(|c| c.passed);

    ComplianceReport {
        project_score: project_score(components.iter().map(|c| c.overall_score)),
        components,
        recommendations,
        input_errors,
        cycles,
        strict_mode,
        passed,
    }
}
