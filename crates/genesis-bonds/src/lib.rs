pub mod cycles;
pub mod distance;
pub mod graph;
pub mod toxicity;

pub use graph::{Bond, BondKey, DependencyGraph, GraphBuilder, GraphError};
pub use toxicity::{analyze, BondToxicity, ToxicityAnalysis, ToxicityConfig};
