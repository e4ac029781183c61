use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CallKind;

/// Every finding the engine can report, input errors included.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    // Input errors.
    UnknownComponent,
    EmptyTrace,
    MalformedOperation,
    // Pattern findings.
    UnsatisfiedPatternStep,
    TrailingOperation,
    DirectStateMutation,
    DisallowedPattern,
    ValencyImbalance,
    // Bond findings.
    ToxicBond,
    CyclicDependency,
    SelfDependency,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationCode::UnknownComponent => "UNKNOWN_COMPONENT",
            ViolationCode::EmptyTrace => "EMPTY_TRACE",
            ViolationCode::MalformedOperation => "MALFORMED_OPERATION",
            ViolationCode::UnsatisfiedPatternStep => "UNSATISFIED_PATTERN_STEP",
            ViolationCode::TrailingOperation => "TRAILING_OPERATION",
            ViolationCode::DirectStateMutation => "DIRECT_STATE_MUTATION",
            ViolationCode::DisallowedPattern => "DISALLOWED_PATTERN",
            ViolationCode::ValencyImbalance => "VALENCY_IMBALANCE",
            ViolationCode::ToxicBond => "TOXIC_BOND",
            ViolationCode::CyclicDependency => "CYCLIC_DEPENDENCY",
            ViolationCode::SelfDependency => "SELF_DEPENDENCY",
        }
    }

    pub fn is_input_error(self) -> bool {
        matches!(
            self,
            ViolationCode::UnknownComponent
                | ViolationCode::EmptyTrace
                | ViolationCode::MalformedOperation
        )
    }

    /// Findings that lower a component's pattern coverage.
    pub fn is_pattern_finding(self) -> bool {
        matches!(
            self,
            ViolationCode::EmptyTrace
                | ViolationCode::MalformedOperation
                | ViolationCode::UnsatisfiedPatternStep
                | ViolationCode::TrailingOperation
                | ViolationCode::DirectStateMutation
                | ViolationCode::DisallowedPattern
        )
    }

    pub fn is_bond_finding(self) -> bool {
        matches!(
            self,
            ViolationCode::ToxicBond
                | ViolationCode::CyclicDependency
                | ViolationCode::SelfDependency
        )
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered so that `Error > Warning`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Where a violation was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    Operation {
        index: usize,
    },
    Component {
        name: String,
    },
    Bond {
        source: String,
        target: String,
        call_kind: CallKind,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Operation { index } => write!(f, "operation #{index}"),
            Location::Component { name } => write!(f, "component '{name}'"),
            Location::Bond {
                source,
                target,
                call_kind,
            } => write!(f, "bond {source} -> {target} ({call_kind})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub code: ViolationCode,
    pub location: Location,
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    pub fn error(code: ViolationCode, location: Location, message: impl Into<String>) -> Self {
        Self {
            code,
            location,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(code: ViolationCode, location: Location, message: impl Into<String>) -> Self {
        Self {
            code,
            location,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}: {}",
            self.code,
            severity_label(self.severity),
            self.location,
            self.message
        )
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}
