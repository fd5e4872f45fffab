pub mod definition;
pub mod requirement;

pub use definition::{ComponentTarget, RequirementFlags};
pub use requirement::Requirement;
