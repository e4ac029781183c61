pub mod grammar;
pub mod valency;
pub mod validate;

pub use grammar::{Cardinality, CodonGrammar, CodonPattern, Group};
pub use valency::{check_workflow, ValencyReport};
pub use validate::{match_pattern, CandidateMatch, MatchOptions, MatchResult, PatternValidator};
