use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use genesis_bonds::graph::DependencyGraph;
use genesis_bonds::toxicity::ToxicityAnalysis;
use genesis_codon::grammar::CodonGrammar;
use genesis_codon::valency::{check_workflow, ValencyReport};
use genesis_codon::validate::{MatchResult, PatternValidator};
use genesis_ir::parse::{parse_input, ParseError};
use genesis_ir::trace::Trace;
use genesis_ir::types::{AnalysisInput, ComponentDescriptor, TraceInput, WorkflowInput};
use genesis_ir::violation::{Location, Violation, ViolationCode};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ComplianceConfig, ConfigError};
use crate::report::{assemble, ComplianceReport, ComponentReport};
use crate::scoring::{passes, score, violation_order, ComponentFindings};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Input parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runs the full analysis for one configuration.
///
/// Holds only validated, immutable state; one analyzer may serve
/// concurrent `analyze` calls.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: ComplianceConfig,
    grammar: &'static CodonGrammar,
}

/// Per-component inputs after grouping by name.
#[derive(Default)]
struct ComponentInputs<'a> {
    traces: BTreeMap<&'a str, &'a TraceInput>,
    workflows: BTreeMap<&'a str, Vec<&'a WorkflowInput>>,
    errors: Vec<Violation>,
}

impl Analyzer {
    pub fn new(config: ComplianceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            grammar: CodonGrammar::canonical(),
        })
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    pub fn analyze(&self, input: &AnalysisInput) -> ComplianceReport {
        info!(
            components = input.components.len(),
            traces = input.traces.len(),
            edges = input.edges.len(),
            workflows = input.workflows.len(),
            strict = self.config.strict_mode,
            "analysis started"
        );

        let declared = declared_components(&input.components);
        let mut grouped = group_inputs(input, &declared);

        // The graph needs every edge; it is the one synchronous step.
        let (graph, graph_errors) =
            DependencyGraph::build_lenient(&input.components, &input.edges);
        grouped
            .errors
            .extend(graph_errors.iter().map(|e| e.to_violation()));
        let toxicity = genesis_bonds::analyze(&graph, &self.config.toxicity_config());

        let validator = PatternValidator::new(self.grammar, self.config.match_options());
        let components: Vec<ComponentReport> = declared
            .par_iter()
            .map(|descriptor| self.component_report(descriptor, &grouped, &validator, &toxicity))
            .collect();

        let mut input_errors = std::mem::take(&mut grouped.errors);
        input_errors.sort_by(violation_order);

        let report = assemble(
            components,
            input_errors,
            toxicity.cycles.clone(),
            self.config.strict_mode,
        );

        info!(
            project_score = report.project_score,
            errors = report.error_count(),
            warnings = report.warning_count(),
            passed = report.passed(),
            "analysis finished"
        );
        report
    }

    /// Parse an input document, analyze it and serialize the report.
    pub fn analyze_json(&self, json: &str) -> Result<String, EngineError> {
        let input = parse_input(json)?;
        Ok(self.analyze(&input).to_json()?)
    }

    fn component_report(
        &self,
        descriptor: &ComponentDescriptor,
        grouped: &ComponentInputs<'_>,
        validator: &PatternValidator<'_>,
        toxicity: &ToxicityAnalysis,
    ) -> ComponentReport {
        let name = descriptor.name.as_str();

        let match_result = validate_unit(name, grouped.traces.get(name).copied(), validator);
        let mut violations = match &match_result {
            Ok(result) => result.violations.clone(),
            Err(err) => vec![err.clone()],
        };
        let coverage = match_result.as_ref().map_or(0.0, |r| r.coverage);

        let valency: Vec<ValencyReport> = grouped
            .workflows
            .get(name)
            .map(|flows| flows.iter().copied().map(check_workflow).collect())
            .unwrap_or_default();
        violations.extend(valency.iter().filter_map(|r| r.to_violation(name)));
        violations.extend(toxicity.violations_for(name));
        violations.sort_by(violation_order);

        let toxicity_by_bond: Vec<_> = toxicity.bonds_of(name).cloned().collect();
        let hub_concentration = toxicity.hub_concentration(name);

        let scored = score(
            &ComponentFindings {
                component: name,
                coverage,
                bonds: &toxicity_by_bond,
                hub_concentration,
                violations: &violations,
            },
            &self.config.score_weights,
        );
        let passed = passes(
            scored.overall,
            &violations,
            self.config.min_overall_score,
            self.config.strict_mode,
        );

        debug!(
            component = name,
            score = scored.overall,
            violations = violations.len(),
            passed,
            "component scored"
        );

        ComponentReport {
            component: descriptor.clone(),
            match_result: match_result.ok(),
            violations,
            toxicity_by_bond,
            hub_concentration,
            valency,
            sub_scores: scored.sub_scores,
            overall_score: scored.overall,
            passed,
            recommendations: scored.recommendations,
        }
    }
}

/// Validate one component's trace. A missing trace is validated as an
/// empty one; a malformed trace skips the unit and returns its error.
fn validate_unit(
    component: &str,
    trace: Option<&TraceInput>,
    validator: &PatternValidator<'_>,
) -> Result<MatchResult, Violation> {
    let trace = match trace {
        Some(input) => Trace::from_raw(component, &input.operations).map_err(|err| {
            warn!(component, error = %err, "trace skipped");
            err.to_violation()
        })?,
        None => {
            warn!(component, "no trace supplied");
            Trace::from_kinds(component, &[])
        }
    };
    Ok(validator.validate(&trace))
}

/// Declared components in name order, first declaration of a name kept.
fn declared_components(components: &[ComponentDescriptor]) -> Vec<&ComponentDescriptor> {
    let mut by_name: BTreeMap<&str, &ComponentDescriptor> = BTreeMap::new();
    for component in components {
        by_name.entry(component.name.as_str()).or_insert(component);
    }
    by_name.into_values().collect()
}

fn group_inputs<'a>(
    input: &'a AnalysisInput,
    declared: &[&ComponentDescriptor],
) -> ComponentInputs<'a> {
    let is_declared = |name: &str| {
        declared
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .is_ok()
    };
    let mut grouped = ComponentInputs::default();

    for trace in &input.traces {
        let name = trace.component.as_str();
        if !is_declared(name) {
            warn!(component = name, "trace for undeclared component");
            grouped.errors.push(unknown_component(name, "trace"));
            continue;
        }
        match grouped.traces.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(trace);
            }
            Entry::Occupied(_) => warn!(component = name, "duplicate trace ignored"),
        }
    }

    for workflow in &input.workflows {
        let name = workflow.component.as_str();
        if !is_declared(name) {
            warn!(component = name, workflow = %workflow.name, "workflow for undeclared component");
            grouped.errors.push(unknown_component(name, "workflow"));
            continue;
        }
        grouped.workflows.entry(name).or_default().push(workflow);
    }

    grouped
}

fn unknown_component(name: &str, referrer: &str) -> Violation {
    Violation::error(
        ViolationCode::UnknownComponent,
        Location::Component {
            name: name.to_string(),
        },
        format!("{referrer} references undeclared component '{name}'"),
    )
}
