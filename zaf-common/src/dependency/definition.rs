// zaf-common/src/dependency/definition.rs
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::model::ComponentDescriptor;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RequirementFlags: u8 {
        /// The consumer wants a live instance, not a reference to the definition.
        const INSTANCE        = 0b00000001;
        /// Candidates are filtered by the caller's fixated entity mapping.
        const FIXATE_ENTITIES = 0b00000010;
    }
}

impl Default for RequirementFlags {
    fn default() -> Self {
        Self::INSTANCE | Self::FIXATE_ENTITIES
    }
}

impl fmt::Display for RequirementFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// What a requirement points at: a logical component name looked up in the
/// registry, or one concrete component used as the sole candidate.
#[derive(Clone)]
pub enum ComponentTarget {
    Named(String),
    Direct(Arc<ComponentDescriptor>),
}

impl ComponentTarget {
    /// Name used in diagnostics and for fixated entity lookups.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Direct(component) => component.callable_name(),
        }
    }

    /// Key used when unifying requirements through `uses`.
    pub fn component_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Direct(component) => component.name(),
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }
}

impl fmt::Debug for ComponentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Direct(component) => f
                .debug_tuple("Direct")
                .field(&component.callable_name())
                .finish(),
        }
    }
}

impl PartialEq for ComponentTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Named(a), Self::Named(b)) => a == b,
            (Self::Direct(a), Self::Direct(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for ComponentTarget {}

impl From<&str> for ComponentTarget {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ComponentTarget {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Arc<ComponentDescriptor>> for ComponentTarget {
    fn from(component: Arc<ComponentDescriptor>) -> Self {
        Self::Direct(component)
    }
}
