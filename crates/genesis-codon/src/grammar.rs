//! The codon grammar: the closed catalog of permitted operation shapes.
//!
//! Each pattern is a sequence of groups. A group names one operation kind
//! and a cardinality; matching consumes operations group by group.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use genesis_ir::trace::OperationKind;
use serde::{Deserialize, Serialize};

use OperationKind::*;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum CodonPattern {
    /// Command → Aggregate → Genesis event.
    #[serde(rename = "CAG", alias = "cag")]
    Cag,
    /// Command → Transformation → Connector.
    #[serde(rename = "CTC", alias = "ctc")]
    Ctc,
    /// Event → Connector → Aggregate → Genesis event.
    #[serde(rename = "GCAG", alias = "gcag")]
    Gcag,
    /// Event → Connector → Aggregate → Connector.
    #[serde(rename = "GCAC", alias = "gcac")]
    Gcac,
    /// Event in, events out, no state touched.
    #[serde(rename = "Choreography", alias = "choreography")]
    Choreography,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one.
    Once,
    /// One or more.
    Repeatable,
    /// Zero or one.
    Optional,
}

impl Cardinality {
    pub fn min(self) -> usize {
        match self {
            Cardinality::Once | Cardinality::Repeatable => 1,
            Cardinality::Optional => 0,
        }
    }

    pub fn max(self) -> Option<usize> {
        match self {
            Cardinality::Once | Cardinality::Optional => Some(1),
            Cardinality::Repeatable => None,
        }
    }

    pub fn is_required(self) -> bool {
        self.min() > 0
    }

    fn describe(self) -> &'static str {
        match self {
            Cardinality::Once => "exactly one",
            Cardinality::Repeatable => "at least one",
            Cardinality::Optional => "at most one",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub kind: OperationKind,
    pub cardinality: Cardinality,
}

impl Group {
    pub const fn once(kind: OperationKind) -> Self {
        Self {
            kind,
            cardinality: Cardinality::Once,
        }
    }

    pub const fn repeatable(kind: OperationKind) -> Self {
        Self {
            kind,
            cardinality: Cardinality::Repeatable,
        }
    }

    pub const fn optional(kind: OperationKind) -> Self {
        Self {
            kind,
            cardinality: Cardinality::Optional,
        }
    }

    pub fn accepts(&self, kind: OperationKind, already_consumed: usize) -> bool {
        self.kind == kind
            && self
                .cardinality
                .max()
                .map_or(true, |max| already_consumed < max)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.cardinality.describe(), self.kind)
    }
}

const CAG_SHAPE: &[Group] = &[
    Group::once(ReceiveCommand),
    Group::once(MutateState),
    Group::repeatable(EmitEvent),
];

const CTC_SHAPE: &[Group] = &[
    Group::once(ReceiveCommand),
    Group::repeatable(InvokeTransformation),
    Group::once(InvokeConnector),
];

const GCAG_SHAPE: &[Group] = &[
    Group::once(ReceiveEvent),
    Group::once(InvokeConnector),
    Group::once(MutateState),
    Group::repeatable(EmitEvent),
];

const GCAC_SHAPE: &[Group] = &[
    Group::once(ReceiveEvent),
    Group::once(InvokeConnector),
    Group::once(MutateState),
    Group::once(InvokeConnector),
];

const CHOREOGRAPHY_SHAPE: &[Group] = &[Group::once(ReceiveEvent), Group::repeatable(EmitEvent)];

impl CodonPattern {
    pub const ALL: [CodonPattern; 5] = [
        CodonPattern::Cag,
        CodonPattern::Ctc,
        CodonPattern::Gcag,
        CodonPattern::Gcac,
        CodonPattern::Choreography,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CodonPattern::Cag => "CAG",
            CodonPattern::Ctc => "CTC",
            CodonPattern::Gcag => "GCAG",
            CodonPattern::Gcac => "GCAC",
            CodonPattern::Choreography => "Choreography",
        }
    }

    pub fn shape(self) -> &'static [Group] {
        match self {
            CodonPattern::Cag => CAG_SHAPE,
            CodonPattern::Ctc => CTC_SHAPE,
            CodonPattern::Gcag => GCAG_SHAPE,
            CodonPattern::Gcac => GCAC_SHAPE,
            CodonPattern::Choreography => CHOREOGRAPHY_SHAPE,
        }
    }

    /// Operation kinds that may start a match of this pattern.
    pub fn entry_kinds(self) -> &'static [OperationKind] {
        match self {
            CodonPattern::Cag | CodonPattern::Ctc => &[ReceiveCommand],
            CodonPattern::Gcag | CodonPattern::Gcac | CodonPattern::Choreography => {
                &[ReceiveEvent]
            }
        }
    }

    /// Kinds that may never follow a match of this pattern.
    pub fn forbidden_kinds(self) -> &'static [OperationKind] {
        match self {
            CodonPattern::Choreography => &[MutateState],
            _ => &[],
        }
    }

    /// Number of required groups; longer shapes are more specific.
    pub fn required_len(self) -> usize {
        self.shape()
            .iter()
            .filter(|g| g.cardinality.is_required())
            .count()
    }
}

impl fmt::Display for CodonPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown codon pattern '{0}'")]
pub struct UnknownPattern(pub String);

impl FromStr for CodonPattern {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodonPattern::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPattern(s.to_string()))
    }
}

/// Read-only pattern catalog ordered by decreasing specificity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodonGrammar {
    patterns: Vec<CodonPattern>,
}

impl CodonGrammar {
    /// The five canonical codons, initialized once per process.
    pub fn canonical() -> &'static CodonGrammar {
        static GRAMMAR: OnceLock<CodonGrammar> = OnceLock::new();
        GRAMMAR.get_or_init(|| CodonGrammar::from_patterns(&CodonPattern::ALL))
    }

    /// Build a grammar over a subset of patterns. Equal specificity keeps
    /// declaration order, which is the tie-break for ambiguous matches.
    pub fn from_patterns(patterns: &[CodonPattern]) -> Self {
        let mut patterns = patterns.to_vec();
        patterns.sort();
        patterns.dedup();
        patterns.sort_by_key(|p| Reverse(p.required_len()));
        Self { patterns }
    }

    pub fn patterns(&self) -> &[CodonPattern] {
        &self.patterns
    }

    /// All patterns that may start with `entry`, most specific first.
    pub fn lookup(&self, entry: OperationKind) -> Vec<CodonPattern> {
        self.patterns
            .iter()
            .copied()
            .filter(|p| p.entry_kinds().contains(&entry))
            .collect()
    }
}
