//! Compliance scoring, report assembly and the analysis entry point.

pub mod config;
pub mod engine;
pub mod report;
pub mod scoring;

pub use config::{parse_config, ComplianceConfig, ConfigError, ScoreWeights};
pub use engine::{Analyzer, EngineError};
pub use report::{assemble, ComplianceReport, ComponentReport};
pub use scoring::{rank, score, ComponentFindings, ComponentScore, Recommendation, SubScores};
