// zaf-core/src/lib.rs
pub mod dependency;
pub mod manager;

pub use dependency::{DependencyGraph, DependencyGraphBuilder, Selection};
pub use manager::ComponentManager;
