pub mod builder;
pub mod check;
pub mod graph;
mod report;

// Re-export key types for easier access
pub use builder::DependencyGraphBuilder;
pub use check::Rejection;
pub use graph::{
    CallArguments, CandidateKind, CandidateNode, CandidateNodeId, DependencyGraph,
    RequirementNode, RequirementNodeId, SelectedComponent, Selection,
};
