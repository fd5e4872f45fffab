// zaf-core/src/dependency/builder.rs

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, trace};
use zaf_common::dependency::{ComponentTarget, Requirement};
use zaf_common::error::{Result, ZafError};
use zaf_common::model::ComponentDescriptor;
use zaf_common::registry::ComponentRegistry;
use zaf_common::scope::Scope;

use super::graph::{
    CallArguments, CandidateKind, CandidateNode, CandidateNodeId, DependencyGraph, RequirementNode,
};

/// Builds dependency graphs from the registered components.
pub struct DependencyGraphBuilder<'a> {
    registry: &'a ComponentRegistry,
    implicit_requirements: bool,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self {
            registry,
            implicit_requirements: true,
        }
    }

    /// Toggles matching parameter names against component names.
    pub fn with_implicit_requirements(mut self, enabled: bool) -> Self {
        self.implicit_requirements = enabled;
        self
    }

    /// Expands `root` into a graph. `extra_requirements` are added to the
    /// root's declared requirements and `call` is kept on the root node.
    pub fn create_dependency_graph(
        &self,
        root: &Arc<ComponentDescriptor>,
        top_level_scope: &Scope,
        extra_requirements: &[Requirement],
        call: CallArguments,
    ) -> Result<DependencyGraph> {
        debug!(
            "Building dependency graph for '{}' (top level scope '{}')",
            root.callable_name(),
            top_level_scope.name()
        );
        let mut graph = DependencyGraph::empty();
        let mut visiting = HashSet::new();
        let root_id = self.recursively_create_nodes(
            &mut graph,
            Arc::clone(root),
            call,
            CandidateKind::Reference,
            true,
            extra_requirements,
            &mut visiting,
        )?;
        graph.set_root(root_id);
        Ok(graph)
    }

    #[allow(clippy::too_many_arguments)]
    fn recursively_create_nodes(
        &self,
        graph: &mut DependencyGraph,
        component: Arc<ComponentDescriptor>,
        call: CallArguments,
        kind: CandidateKind,
        is_top_level: bool,
        extra_requirements: &[Requirement],
        visiting: &mut HashSet<*const ComponentDescriptor>,
    ) -> Result<CandidateNodeId> {
        let key = Arc::as_ptr(&component);
        if !visiting.insert(key) {
            error!(
                "Dependency cycle detected involving: {}",
                component.callable_name()
            );
            return Err(ZafError::Configuration(format!(
                "Dependency cycle detected involving '{}'",
                component.callable_name()
            )));
        }

        let requires = self.get_requires(&component, extra_requirements)?;
        let mut slots = Vec::with_capacity(requires.len());
        for requirement in requires {
            let candidates = self.translate_requirement_to_candidates(&requirement)?;
            trace!(
                "Requirement '{}' on '{}' has {} candidate(s) for '{}'",
                requirement.argument(),
                component.callable_name(),
                candidates.len(),
                requirement.component_name()
            );

            let mut candidate_ids = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                let id = if requirement.is_instance() {
                    self.recursively_create_nodes(
                        graph,
                        candidate,
                        CallArguments::positional(requirement.call_args().to_vec()),
                        CandidateKind::Instance,
                        false,
                        &[],
                        visiting,
                    )?
                } else {
                    graph.push_candidate(CandidateNode::new(
                        candidate,
                        CandidateKind::Reference,
                        Vec::new(),
                        CallArguments::default(),
                    ))
                };
                candidate_ids.push(id);
            }

            let argument = requirement.argument().to_string();
            let node = RequirementNode::new(requirement, candidate_ids, is_top_level);
            slots.push((argument, graph.push_requirement(node)));
        }

        visiting.remove(&key);
        Ok(graph.push_candidate(CandidateNode::new(component, kind, slots, call)))
    }

    /// Explicit requirements first, then implicit ones for arguments that
    /// are not already taken.
    fn get_requires(
        &self,
        component: &ComponentDescriptor,
        extra_requirements: &[Requirement],
    ) -> Result<Vec<Requirement>> {
        let mut requires = get_explicit_requires(component, extra_requirements)?;

        if self.implicit_requirements {
            for implicit in self.get_implicit_requires(component) {
                if !requires.contains(&implicit) {
                    requires.push(implicit);
                }
            }
        }
        validate_uses(component, &requires)?;
        Ok(requires)
    }

    /// Parameters whose name matches a registered component name,
    /// ignoring case, become reference requirements on that component.
    fn get_implicit_requires(&self, component: &ComponentDescriptor) -> Vec<Requirement> {
        component
            .parameters()
            .iter()
            .flat_map(|parameter| {
                let lowered = parameter.to_lowercase();
                self.registry
                    .names()
                    .filter(move |name| name.to_lowercase() == lowered)
                    .map(move |name| Requirement::reference(parameter.as_str(), name))
            })
            .collect()
    }

    fn translate_requirement_to_candidates(
        &self,
        requirement: &Requirement,
    ) -> Result<Vec<Arc<ComponentDescriptor>>> {
        match requirement.target() {
            ComponentTarget::Named(name) if name.trim().is_empty() => {
                Err(ZafError::Configuration(format!(
                    "Component '{name}' of requirement '{}' is invalid. Components must be named or given directly.",
                    requirement.argument()
                )))
            }
            ComponentTarget::Named(name) => Ok(self.registry.get(name).to_vec()),
            ComponentTarget::Direct(component) => Ok(vec![Arc::clone(component)]),
        }
    }
}

/// Declared requirements followed by `extra_requirements`. Argument names
/// must be unique.
fn get_explicit_requires(
    component: &ComponentDescriptor,
    extra_requirements: &[Requirement],
) -> Result<Vec<Requirement>> {
    let requirements: Vec<Requirement> = component
        .requirements()
        .iter()
        .chain(extra_requirements)
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    for requirement in &requirements {
        if !seen.insert(requirement.argument()) {
            return Err(ZafError::Configuration(format!(
                "Explicit requirements may not share the same name: '{}' on '{}'",
                requirement.argument(),
                component.callable_name()
            )));
        }
    }
    Ok(requirements)
}

fn validate_uses(component: &ComponentDescriptor, requirements: &[Requirement]) -> Result<()> {
    for requirement in requirements {
        for used in requirement.used_arguments() {
            if used == requirement.argument() {
                return Err(ZafError::Configuration(format!(
                    "Requirement '{}' on '{}' may not use itself",
                    used,
                    component.callable_name()
                )));
            }
            if !requirements.iter().any(|r| r.argument() == used) {
                return Err(ZafError::Configuration(format!(
                    "Requirement '{}' on '{}' uses unknown requirement '{}'",
                    requirement.argument(),
                    component.callable_name(),
                    used
                )));
            }
        }
    }
    Ok(())
}
