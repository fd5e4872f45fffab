// zaf-common/src/lib.rs
pub mod config;
pub mod dependency;
pub mod error;
pub mod model;
pub mod registry;
pub mod scope;

// Re-export key types
pub use config::ResolverConfig;
pub use dependency::{ComponentTarget, Requirement, RequirementFlags};
pub use error::{Result, ZafError};
pub use model::ComponentDescriptor;
pub use registry::{ComponentInfo, ComponentRegistry};
pub use scope::Scope;
