// zaf-common/src/registry.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{Result, ZafError};
use super::model::ComponentDescriptor;

/// Summary of one registered component, for listings and troubleshooting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub callable_name: String,
    pub doc: String,
    pub default_scope_name: Option<String>,
    pub cans: BTreeSet<String>,
    pub requires: Vec<String>,
    pub extension: Option<String>,
    pub priority: i32,
}

/// Maps logical component names to their candidates in registration order.
///
/// Populated while plugins load and read-only while graphs are resolved.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Vec<Arc<ComponentDescriptor>>>,
    entity_component_names: BTreeMap<String, BTreeSet<String>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, component: ComponentDescriptor) -> Arc<ComponentDescriptor> {
        let component = Arc::new(component);
        self.register_arc(Arc::clone(&component));
        component
    }

    pub fn register_arc(&mut self, component: Arc<ComponentDescriptor>) {
        debug!(
            "[REGISTRY] Registering '{}' as component '{}' (priority {})",
            component.callable_name(),
            component.name(),
            component.priority()
        );
        if let Some(entity) = component.entity() {
            self.entity_component_names
                .entry(entity.to_string())
                .or_default()
                .insert(component.name().to_string());
        }
        self.components
            .entry(component.name().to_string())
            .or_default()
            .push(component);
    }

    /// Candidates registered under `name`; empty when nothing is registered.
    pub fn get(&self, name: &str) -> &[Arc<ComponentDescriptor>] {
        self.components.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.entity_component_names.clear();
    }

    /// Builds the component name -> entity mapping used to fixate entities.
    pub fn component_name_to_entity_mapping<S: AsRef<str>>(
        &self,
        entities: &[S],
    ) -> Result<HashMap<String, String>> {
        let mut mapping = HashMap::new();
        for entity in entities {
            let entity = entity.as_ref();
            let Some(component_names) = self.entity_component_names.get(entity) else {
                continue;
            };
            for component_name in component_names {
                if let Some(previous) = mapping.insert(component_name.clone(), entity.to_string())
                {
                    return Err(ZafError::EntityMapping(format!(
                        "Can't create mapping for entities '{previous}' and '{entity}' with same component name '{component_name}'"
                    )));
                }
            }
        }
        Ok(mapping)
    }

    pub fn components_info(&self) -> Vec<ComponentInfo> {
        self.components
            .iter()
            .flat_map(|(name, components)| {
                components.iter().map(move |component| ComponentInfo {
                    name: name.clone(),
                    callable_name: component.callable_name().to_string(),
                    doc: component
                        .doc()
                        .map(|d| d.trim().to_string())
                        .unwrap_or_else(|| "No description".to_string()),
                    default_scope_name: component.default_scope().map(str::to_string),
                    cans: component.cans().clone(),
                    requires: component
                        .requirements()
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                    extension: component.extension().map(str::to_string),
                    priority: component.priority(),
                })
            })
            .collect()
    }

    /// The component listing as a JSON array.
    pub fn components_info_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.components_info())?)
    }

    /// Logs every registered component to assist in troubleshooting.
    pub fn log_components_info(&self) {
        for info in self.components_info() {
            match serde_json::to_string(&info) {
                Ok(line) => debug!("[REGISTRY] {}", line),
                Err(e) => debug!("[REGISTRY] {:?} (not serializable: {})", info, e),
            }
        }
    }
}
