//! Valency conservation for declared workflows.
//!
//! In a closed workflow every bond a step produces must be consumed by
//! another step: the summed input valency equals the summed output valency.

use genesis_ir::types::WorkflowInput;
use genesis_ir::violation::{Location, Violation, ViolationCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValencyReport {
    pub workflow: String,
    pub input_valency: u64,
    pub output_valency: u64,
    pub conserved: bool,
}

impl ValencyReport {
    pub fn imbalance(&self) -> u64 {
        self.input_valency.abs_diff(self.output_valency)
    }

    pub fn to_violation(&self, component: &str) -> Option<Violation> {
        if self.conserved {
            return None;
        }
        Some(Violation::error(
            ViolationCode::ValencyImbalance,
            Location::Component {
                name: component.to_string(),
            },
            format!(
                "workflow '{}' is not conserved: input valency {} vs output valency {} (imbalance {})",
                self.workflow,
                self.input_valency,
                self.output_valency,
                self.imbalance()
            ),
        ))
    }
}

pub fn check_workflow(workflow: &WorkflowInput) -> ValencyReport {
    let (input_valency, output_valency) = workflow
        .steps
        .iter()
        .fold((0u64, 0u64), |(i, o), step| {
            (i + u64::from(step.valency[0]), o + u64::from(step.valency[1]))
        });

    ValencyReport {
        workflow: workflow.name.clone(),
        input_valency,
        output_valency,
        conserved: input_valency == output_valency,
    }
}
