// zaf-common/src/model/component.rs
use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::dependency::Requirement;
use crate::error::{Result, ZafError};

/// Registration metadata for one callable: either a component that can be
/// injected, or a consumer (for example a test case) that has requirements.
#[derive(Debug, Clone, Default)]
pub struct ComponentDescriptor {
    name: String,
    callable_name: String,
    cans: BTreeSet<String>,
    priority: i32,
    default_scope: Option<String>,
    entity: Option<String>,
    extension: Option<String>,
    doc: Option<String>,
    requirements: Vec<Requirement>,
    parameters: Vec<String>,
    properties: BTreeMap<String, Map<String, Value>>,
}

impl ComponentDescriptor {
    /// The component name defaults to the callable name.
    pub fn new(callable_name: impl Into<String>) -> Self {
        let callable_name = callable_name.into();
        Self {
            name: callable_name.clone(),
            callable_name,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cans<I, S>(mut self, cans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_cans(cans);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.default_scope = Some(scope.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn provided_by_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Adds a declared requirement. Requirements keep declaration order.
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Parameter names of the callable, used for implicit requirements.
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_cans<I, S>(&mut self, cans: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cans.extend(cans.into_iter().map(Into::into));
    }

    /// Creates `namespace` or extends it. Existing keys may not be overridden.
    pub fn add_properties(&mut self, namespace: &str, properties: Map<String, Value>) -> Result<()> {
        match self.properties.get_mut(namespace) {
            Some(existing) => {
                let clashing: Vec<&str> = properties
                    .keys()
                    .filter(|key| existing.contains_key(key.as_str()))
                    .map(String::as_str)
                    .collect();
                if !clashing.is_empty() {
                    return Err(ZafError::ComponentProperty(format!(
                        "Properties '{}' already exists on '{}.{}'",
                        clashing.join(", "),
                        self.callable_name,
                        namespace
                    )));
                }
                existing.extend(properties);
            }
            None => {
                self.properties.insert(namespace.to_string(), properties);
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callable_name(&self) -> &str {
        &self.callable_name
    }

    pub fn cans(&self) -> &BTreeSet<String> {
        &self.cans
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn default_scope(&self) -> Option<&str> {
        self.default_scope.as_deref()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn properties(&self, namespace: &str) -> Option<&Map<String, Value>> {
        self.properties.get(namespace)
    }

    pub fn property(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.properties.get(namespace).and_then(|ns| ns.get(key))
    }
}
