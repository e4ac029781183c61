use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::violation::{Location, Violation, ViolationCode};

/// The closed vocabulary of operations a component may perform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ReceiveCommand,
    MutateState,
    EmitEvent,
    InvokeTransformation,
    InvokeConnector,
    ReceiveEvent,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::ReceiveCommand,
        OperationKind::MutateState,
        OperationKind::EmitEvent,
        OperationKind::InvokeTransformation,
        OperationKind::InvokeConnector,
        OperationKind::ReceiveEvent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::ReceiveCommand => "receive_command",
            OperationKind::MutateState => "mutate_state",
            OperationKind::EmitEvent => "emit_event",
            OperationKind::InvokeTransformation => "invoke_transformation",
            OperationKind::InvokeConnector => "invoke_connector",
            OperationKind::ReceiveEvent => "receive_event",
        }
    }

    fn pascal_name(self) -> &'static str {
        match self {
            OperationKind::ReceiveCommand => "ReceiveCommand",
            OperationKind::MutateState => "MutateState",
            OperationKind::EmitEvent => "EmitEvent",
            OperationKind::InvokeTransformation => "InvokeTransformation",
            OperationKind::InvokeConnector => "InvokeConnector",
            OperationKind::ReceiveEvent => "ReceiveEvent",
        }
    }

    /// Kinds that hand control to a component from the outside.
    pub fn is_receive(self) -> bool {
        matches!(
            self,
            OperationKind::ReceiveCommand | OperationKind::ReceiveEvent
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized operation kind '{0}'")]
pub struct UnknownOperationKind(pub String);

impl FromStr for OperationKind {
    type Err = UnknownOperationKind;

    /// Accepts both `snake_case` and `PascalCase` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        OperationKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == trimmed || k.pascal_name() == trimmed)
            .ok_or_else(|| UnknownOperationKind(s.to_string()))
    }
}

/// An operation as supplied by an extractor, before its kind is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOperation {
    pub kind: String,
    #[serde(default)]
    pub target: Option<String>,
}

/// One recorded step of a component's behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    #[serde(default)]
    pub target: Option<String>,
    pub sequence_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    #[error("Malformed operation in '{component}' at index {index}: unrecognized kind '{kind}'")]
    MalformedOperation {
        component: String,
        index: usize,
        kind: String,
    },
}

impl TraceError {
    pub fn to_violation(&self) -> Violation {
        match self {
            TraceError::MalformedOperation { index, .. } => Violation::error(
                ViolationCode::MalformedOperation,
                Location::Operation { index: *index },
                self.to_string(),
            ),
        }
    }
}

/// Ordered operations of exactly one component.
///
/// Sequence indices are assigned on construction and are strictly
/// increasing from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    component: String,
    operations: Vec<Operation>,
}

impl Trace {
    pub fn new<I>(component: impl Into<String>, steps: I) -> Self
    where
        I: IntoIterator<Item = (OperationKind, Option<String>)>,
    {
        let operations = steps
            .into_iter()
            .enumerate()
            .map(|(sequence_index, (kind, target))| Operation {
                kind,
                target,
                sequence_index,
            })
            .collect();
        Self {
            component: component.into(),
            operations,
        }
    }

    /// Build a trace of untargeted operations.
    pub fn from_kinds(component: impl Into<String>, kinds: &[OperationKind]) -> Self {
        Self::new(component, kinds.iter().map(|k| (*k, None)))
    }

    /// Check every raw operation kind; the first unrecognized one rejects the trace.
    pub fn from_raw(component: &str, raw: &[RawOperation]) -> Result<Self, TraceError> {
        let mut steps = Vec::with_capacity(raw.len());
        for (index, op) in raw.iter().enumerate() {
            let kind = op
                .kind
                .parse::<OperationKind>()
                .map_err(|_| TraceError::MalformedOperation {
                    component: component.to_string(),
                    index,
                    kind: op.kind.clone(),
                })?;
            steps.push((kind, op.target.clone()));
        }
        Ok(Self::new(component, steps))
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn entry_kind(&self) -> Option<OperationKind> {
        self.operations.first().map(|op| op.kind)
    }
}
