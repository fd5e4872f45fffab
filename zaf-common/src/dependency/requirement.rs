// zaf-common/src/dependency/requirement.rs
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Value;

use super::definition::{ComponentTarget, RequirementFlags};
use crate::model::ComponentDescriptor;

/// A named slot on a consumer that the resolver has to fill.
///
/// Two requirements are equal when they share the argument name, since a
/// consumer can only have one requirement per argument.
#[derive(Debug, Clone)]
pub struct Requirement {
    argument: String,
    target: ComponentTarget,
    args: Vec<Value>,
    scope: Option<String>,
    can: BTreeSet<String>,
    uses: BTreeSet<String>,
    flags: RequirementFlags,
}

impl Requirement {
    pub fn new(argument: impl Into<String>, target: impl Into<ComponentTarget>) -> Self {
        Self {
            argument: argument.into(),
            target: target.into(),
            args: Vec::new(),
            scope: None,
            can: BTreeSet::new(),
            uses: BTreeSet::new(),
            flags: RequirementFlags::default(),
        }
    }

    pub fn named(argument: impl Into<String>, component: impl Into<String>) -> Self {
        Self::new(argument, ComponentTarget::Named(component.into()))
    }

    pub fn direct(argument: impl Into<String>, component: Arc<ComponentDescriptor>) -> Self {
        Self::new(argument, ComponentTarget::Direct(component))
    }

    /// A reference requirement as produced by implicit parameter matching.
    pub fn reference(argument: impl Into<String>, component: impl Into<String>) -> Self {
        Self::named(argument, component).instance(false)
    }

    pub fn can<I, S>(mut self, cans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.can.extend(cans.into_iter().map(Into::into));
        self
    }

    pub fn uses<I, S>(mut self, uses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uses.extend(uses.into_iter().map(Into::into));
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn instance(mut self, instance: bool) -> Self {
        self.flags.set(RequirementFlags::INSTANCE, instance);
        self
    }

    pub fn fixate_entities(mut self, fixate: bool) -> Self {
        self.flags.set(RequirementFlags::FIXATE_ENTITIES, fixate);
        self
    }

    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn target(&self) -> &ComponentTarget {
        &self.target
    }

    pub fn component_name(&self) -> &str {
        self.target.display_name()
    }

    pub fn call_args(&self) -> &[Value] {
        &self.args
    }

    pub fn scope_name(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn cans(&self) -> &BTreeSet<String> {
        &self.can
    }

    pub fn used_arguments(&self) -> &BTreeSet<String> {
        &self.uses
    }

    pub fn flags(&self) -> RequirementFlags {
        self.flags
    }

    pub fn is_instance(&self) -> bool {
        self.flags.contains(RequirementFlags::INSTANCE)
    }

    pub fn fixates_entities(&self) -> bool {
        self.flags.contains(RequirementFlags::FIXATE_ENTITIES)
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.argument == other.argument
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.argument.hash(state);
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Requirement(argument=\"{}\", component=\"{}\", instance={} scope={})",
            self.argument,
            self.target.display_name(),
            self.is_instance(),
            self.scope.as_deref().unwrap_or("None")
        )
    }
}
