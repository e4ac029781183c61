use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trace::RawOperation;

/// Everything the engine needs for one analysis run, as supplied by
/// the scaffolding and extraction collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub components: Vec<ComponentDescriptor>,
    #[serde(default)]
    pub traces: Vec<TraceInput>,
    #[serde(default)]
    pub edges: Vec<EdgeInput>,
    #[serde(default)]
    pub workflows: Vec<WorkflowInput>,
}

// ── Components ───────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Aggregate,
    Connector,
    Transformation,
    Event,
    Saga,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub name: String,
    pub domain_tag: String,
    pub kind: ComponentKind,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, domain_tag: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            domain_tag: domain_tag.into(),
            kind,
        }
    }
}

// ── Traces ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInput {
    pub component: String,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
}

// ── Edges ────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CallKind {
    DirectCall,
    EventDriven,
    SharedState,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallKind::DirectCall => "direct-call",
            CallKind::EventDriven => "event-driven",
            CallKind::SharedState => "shared-state",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed call between components. Weight defaults to a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInput {
    pub source: String,
    pub target: String,
    pub call_kind: CallKind,
    #[serde(default = "default_weight")]
    pub weight: u64,
}

fn default_weight() -> u64 {
    1
}

impl EdgeInput {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        call_kind: CallKind,
        weight: u64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            call_kind,
            weight,
        }
    }
}

// ── Workflows ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub component: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

/// A workflow step consumes `valency[0]` bonds and produces `valency[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub primitive: String,
    #[serde(default)]
    pub valency: [u32; 2],
}
