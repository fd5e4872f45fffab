// zaf-core/src/manager.rs
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use zaf_common::config::ResolverConfig;
use zaf_common::dependency::Requirement;
use zaf_common::error::{Result, ZafError};
use zaf_common::model::ComponentDescriptor;
use zaf_common::registry::ComponentRegistry;
use zaf_common::scope::Scope;

use crate::dependency::{CallArguments, DependencyGraph, DependencyGraphBuilder, Selection};

/// Entry point for hosts: resolves consumers against a shared, read-only
/// component registry. Each call builds and discards its own graph, so one
/// manager can serve resolutions from several threads.
#[derive(Debug, Clone)]
pub struct ComponentManager {
    registry: Arc<ComponentRegistry>,
    config: ResolverConfig,
}

impl ComponentManager {
    pub fn new(registry: Arc<ComponentRegistry>, config: ResolverConfig) -> Self {
        Self { registry, config }
    }

    /// Uses the configuration from the environment.
    pub fn from_env(registry: Arc<ComponentRegistry>) -> Result<Self> {
        Ok(Self::new(registry, ResolverConfig::load()?))
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn builder(&self) -> DependencyGraphBuilder<'_> {
        DependencyGraphBuilder::new(&self.registry)
            .with_implicit_requirements(self.config.implicit_requirements)
    }

    pub fn build_graph(
        &self,
        root: &Arc<ComponentDescriptor>,
        top_level_scope: &Scope,
        extra_requirements: &[Requirement],
        call: CallArguments,
    ) -> Result<DependencyGraph> {
        self.builder()
            .create_dependency_graph(root, top_level_scope, extra_requirements, call)
    }

    /// Builds a fresh graph for `root`, resolves it and returns the chosen
    /// component for every requirement.
    pub fn resolve(
        &self,
        root: &Arc<ComponentDescriptor>,
        top_level_scope: &Scope,
        extra_requirements: &[Requirement],
        fixated_entities: &HashMap<String, String>,
        call: CallArguments,
    ) -> Result<Selection> {
        let mut graph = self.build_graph(root, top_level_scope, extra_requirements, call)?;
        match graph.resolve(top_level_scope, fixated_entities) {
            Ok(()) => {
                let selection = graph.selection();
                debug!(
                    "Resolved {} requirement(s) for '{}'",
                    selection.len(),
                    root.callable_name()
                );
                Ok(selection)
            }
            Err(e @ ZafError::ComponentDependency(_)) => {
                warn!(
                    "Could not resolve requirements for '{}'",
                    root.callable_name()
                );
                if self.config.log_components_on_failure {
                    self.registry.log_components_info();
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Fixated entity mapping for the given entities, see
    /// `ComponentRegistry::component_name_to_entity_mapping`.
    pub fn fixated_entities<S: AsRef<str>>(&self, entities: &[S]) -> Result<HashMap<String, String>> {
        self.registry.component_name_to_entity_mapping(entities)
    }
}
