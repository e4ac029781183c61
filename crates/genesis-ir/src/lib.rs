//! Shared data model for the codon validation and bond analysis engine.

pub mod parse;
pub mod trace;
pub mod types;
pub mod violation;

pub use parse::{parse_input, ParseError};
pub use trace::{Operation, OperationKind, RawOperation, Trace, TraceError};
pub use types::{
    AnalysisInput, CallKind, ComponentDescriptor, ComponentKind, EdgeInput, TraceInput,
    WorkflowInput, WorkflowStep,
};
pub use violation::{Location, Severity, Violation, ViolationCode};
