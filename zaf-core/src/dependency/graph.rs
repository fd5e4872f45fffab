// zaf-core/src/dependency/graph.rs

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};
use zaf_common::dependency::{ComponentTarget, Requirement};
use zaf_common::error::{Result, ZafError};
use zaf_common::model::ComponentDescriptor;
use zaf_common::scope::Scope;

use super::check::{CandidateCheck, CheckCapabilities, CheckFixated, CheckScopes, Rejection};
use super::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequirementNodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CandidateNodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    /// Constructed by the host; its own requirements are expanded.
    Instance,
    /// Handed over as a definition; never expanded.
    Reference,
}

/// Arguments forwarded to a callable when the host invokes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArguments {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl CallArguments {
    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
        }
    }
}

/// A requirement slot together with the candidates still considered viable.
#[derive(Debug, Clone)]
pub struct RequirementNode {
    requirement: Requirement,
    cans: BTreeSet<String>,
    candidates: Vec<CandidateNodeId>,
    rejected: Vec<CandidateNodeId>,
    required: bool,
    selection_performed: bool,
}

impl RequirementNode {
    pub(crate) fn new(
        requirement: Requirement,
        candidates: Vec<CandidateNodeId>,
        required: bool,
    ) -> Self {
        Self {
            cans: requirement.cans().clone(),
            requirement,
            candidates,
            rejected: Vec::new(),
            required,
            selection_performed: false,
        }
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn argument(&self) -> &str {
        self.requirement.argument()
    }

    pub fn component_name(&self) -> &str {
        self.requirement.component_name()
    }

    /// Demanded capabilities, including those merged in through `uses`.
    pub fn cans(&self) -> &BTreeSet<String> {
        &self.cans
    }

    pub fn candidates(&self) -> &[CandidateNodeId] {
        &self.candidates
    }

    /// Candidates removed by a filter pass, kept for diagnostics.
    pub fn rejected(&self) -> &[CandidateNodeId] {
        &self.rejected
    }

    /// Only requirements of the root are required; deeper ones may be pruned.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn selection_performed(&self) -> bool {
        self.selection_performed
    }
}

/// One concrete component that could satisfy a requirement.
#[derive(Debug, Clone)]
pub struct CandidateNode {
    component: Arc<ComponentDescriptor>,
    kind: CandidateKind,
    requirements: Vec<(String, RequirementNodeId)>,
    call: CallArguments,
    selected: bool,
    selected_scope: Option<String>,
    rejection: Option<Rejection>,
}

impl CandidateNode {
    pub(crate) fn new(
        component: Arc<ComponentDescriptor>,
        kind: CandidateKind,
        requirements: Vec<(String, RequirementNodeId)>,
        call: CallArguments,
    ) -> Self {
        Self {
            component,
            kind,
            requirements,
            call,
            selected: false,
            selected_scope: None,
            rejection: None,
        }
    }

    pub fn component(&self) -> &Arc<ComponentDescriptor> {
        &self.component
    }

    pub fn short_name(&self) -> &str {
        self.component.callable_name()
    }

    pub fn priority(&self) -> i32 {
        self.component.priority()
    }

    pub fn kind(&self) -> CandidateKind {
        self.kind
    }

    pub fn is_instance(&self) -> bool {
        self.kind == CandidateKind::Instance
    }

    /// Requirement slots in declaration order.
    pub fn requirements(&self) -> impl Iterator<Item = (&str, RequirementNodeId)> {
        self.requirements.iter().map(|(arg, id)| (arg.as_str(), *id))
    }

    pub fn requirement(&self, argument: &str) -> Option<RequirementNodeId> {
        self.requirements
            .iter()
            .find(|(arg, _)| arg == argument)
            .map(|(_, id)| *id)
    }

    pub fn call(&self) -> &CallArguments {
        &self.call
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn selected_scope(&self) -> Option<&str> {
        self.selected_scope.as_deref()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.rejection.is_none()
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }
}

/// The component chosen for one requirement argument.
#[derive(Debug, Clone, Serialize)]
pub struct SelectedComponent {
    pub argument: String,
    pub candidate: CandidateNodeId,
    #[serde(skip)]
    pub component: Arc<ComponentDescriptor>,
    pub component_name: String,
    pub callable_name: String,
    pub scope: Option<String>,
    pub kind: CandidateKind,
    pub call: CallArguments,
    pub dependencies: Selection,
}

/// Chosen components per requirement argument, nested for instances.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Selection {
    pub entries: Vec<SelectedComponent>,
}

impl Selection {
    pub fn get(&self, argument: &str) -> Option<&SelectedComponent> {
        self.entries.iter().find(|entry| entry.argument == argument)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Alternating requirement and candidate nodes, rooted at the consumer the
/// host wants to call.
///
/// Nodes live in two arenas and refer to each other by id. Combining
/// requirements through `uses` rewrites the id in a consumer's slot, so the
/// same requirement node becomes reachable from several places.
///
/// A graph is built for one resolution; `resolve` refuses to run twice.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    requirements: Vec<RequirementNode>,
    candidates: Vec<CandidateNode>,
    root: CandidateNodeId,
    resolved: bool,
}

impl DependencyGraph {
    pub(crate) fn empty() -> Self {
        Self {
            requirements: Vec::new(),
            candidates: Vec::new(),
            root: CandidateNodeId(0),
            resolved: false,
        }
    }

    pub(crate) fn push_requirement(&mut self, node: RequirementNode) -> RequirementNodeId {
        self.requirements.push(node);
        RequirementNodeId(self.requirements.len() - 1)
    }

    pub(crate) fn push_candidate(&mut self, node: CandidateNode) -> CandidateNodeId {
        self.candidates.push(node);
        CandidateNodeId(self.candidates.len() - 1)
    }

    pub(crate) fn set_root(&mut self, root: CandidateNodeId) {
        self.root = root;
    }

    pub fn root(&self) -> CandidateNodeId {
        self.root
    }

    pub fn root_node(&self) -> &CandidateNode {
        self.candidate(self.root)
    }

    pub fn candidate(&self, id: CandidateNodeId) -> &CandidateNode {
        &self.candidates[id.0]
    }

    pub fn requirement(&self, id: RequirementNodeId) -> &RequirementNode {
        &self.requirements[id.0]
    }

    /// The requirement node currently behind `argument` on the root.
    pub fn root_requirement(&self, argument: &str) -> Option<&RequirementNode> {
        self.root_node()
            .requirement(argument)
            .map(|id| self.requirement(id))
    }

    /// The requirement node behind `argument` on `candidate`.
    pub fn child_requirement(
        &self,
        candidate: CandidateNodeId,
        argument: &str,
    ) -> Option<RequirementNodeId> {
        self.candidate(candidate).requirement(argument)
    }

    pub fn selected(&self, requirement: RequirementNodeId) -> Option<CandidateNodeId> {
        self.requirement(requirement)
            .candidates
            .iter()
            .copied()
            .find(|id| self.candidate(*id).selected)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Resolves the graph by selecting one candidate per requirement.
    ///
    /// `top_level_scope` is the shortest scope the root runs in.
    /// `fixated_entities` maps component names to the entity every
    /// fixating requirement on that name must use.
    pub fn resolve(
        &mut self,
        top_level_scope: &Scope,
        fixated_entities: &HashMap<String, String>,
    ) -> Result<()> {
        if self.resolved {
            return Err(ZafError::GraphAlreadyResolved);
        }
        self.resolved = true;

        debug!(
            "Resolving dependency graph for '{}' in scope '{}'",
            self.root_node().short_name(),
            top_level_scope.path()
        );
        self.remove_not_fulfilled();
        self.combine_uses();
        self.select_scopes(top_level_scope);

        self.remove_not_matching_fixated_entities(fixated_entities);
        self.remove_not_fulfilled();
        self.remove_with_shorter_scope_than_parent(top_level_scope);

        self.assert_requirements_fulfilled()?;
        self.make_selections();
        Ok(())
    }

    /// Removes candidates whose capabilities, or whose own requirements,
    /// cannot be fulfilled.
    pub fn remove_not_fulfilled(&mut self) {
        debug!("Removing candidates with unfulfilled capabilities");
        self.remove_from_root(&CheckCapabilities);
    }

    pub fn remove_not_matching_fixated_entities(
        &mut self,
        fixated_entities: &HashMap<String, String>,
    ) {
        debug!(
            "Removing candidates not matching fixated entities {:?}",
            fixated_entities
        );
        self.remove_from_root(&CheckFixated::new(fixated_entities));
    }

    /// Must run after `select_scopes`.
    pub fn remove_with_shorter_scope_than_parent(&mut self, top_level_scope: &Scope) {
        debug!("Removing candidates with a shorter scope than their consumer");
        self.remove_from_root(&CheckScopes::new(top_level_scope));
    }

    fn remove_from_root(&mut self, checker: &dyn CandidateCheck) {
        let root = self.root;
        for requirement in self.slot_ids(root) {
            self.recursively_remove(requirement, root, checker);
        }
    }

    fn recursively_remove(
        &mut self,
        requirement: RequirementNodeId,
        parent: CandidateNodeId,
        checker: &dyn CandidateCheck,
    ) {
        let mut kept = Vec::new();
        let mut rejected = Vec::new();

        for candidate in self.requirements[requirement.0].candidates.clone() {
            if !self.candidate(candidate).is_instance() && !checker.applies_to_references() {
                kept.push(candidate);
                continue;
            }

            let mut all_fulfilled = true;
            for nested in self.slot_ids(candidate) {
                self.recursively_remove(nested, candidate, checker);
                if self.requirements[nested.0].candidates.is_empty() {
                    all_fulfilled = false;
                    break;
                }
            }

            let rejection = match checker.check(self, parent, requirement, candidate) {
                Err(rejection) => Some(rejection),
                Ok(()) if !all_fulfilled => Some(Rejection::UnfulfilledRequirements),
                Ok(()) => None,
            };
            match rejection {
                Some(rejection) => {
                    trace!(
                        "Rejecting '{}' for requirement '{}': {}",
                        self.candidate(candidate).short_name(),
                        self.requirements[requirement.0].argument(),
                        rejection
                    );
                    self.candidates[candidate.0].rejection = Some(rejection);
                    rejected.push(candidate);
                }
                None => kept.push(candidate),
            }
        }

        let node = &mut self.requirements[requirement.0];
        node.candidates = kept;
        node.rejected.extend(rejected);
    }

    /// Combines requirement nodes connected through `uses` so that the same
    /// selection is made for both.
    pub fn combine_uses(&mut self) {
        debug!("Combining requirements connected through 'uses'");
        self.recursively_combine_uses(self.root, &HashMap::new());
    }

    fn recursively_combine_uses(
        &mut self,
        candidate: CandidateNodeId,
        parent_uses_mapping: &HashMap<String, RequirementNodeId>,
    ) {
        let slot_count = self.candidates[candidate.0].requirements.len();
        for index in 0..slot_count {
            let requirement = self.candidates[candidate.0].requirements[index].1;
            let mut uses_mapping = parent_uses_mapping.clone();

            let used_arguments = self.requirements[requirement.0]
                .requirement
                .used_arguments()
                .clone();
            // The builder only accepts `uses` that name a sibling requirement.
            let used_ids: Vec<RequirementNodeId> = used_arguments
                .iter()
                .filter_map(|used_argument| self.candidate(candidate).requirement(used_argument))
                .collect();
            debug_assert_eq!(used_ids.len(), used_arguments.len());
            for used in used_ids {
                match self.requirements[used.0].requirement.target() {
                    ComponentTarget::Named(name) => {
                        uses_mapping.entry(name.clone()).or_insert(used);
                    }
                    ComponentTarget::Direct(component) => {
                        uses_mapping.insert(component.name().to_string(), used);
                    }
                }
            }

            // Only named requirements merge; a direct target keeps its own node.
            let combined = match self.requirements[requirement.0].requirement.target() {
                ComponentTarget::Named(name) => uses_mapping
                    .get(name)
                    .copied()
                    .filter(|combined| *combined != requirement),
                ComponentTarget::Direct(_) => None,
            };

            match combined {
                Some(combined) => {
                    let cans = self.requirements[requirement.0].cans.clone();
                    debug!(
                        "Combining requirement '{}' on '{}' which can '{}' with uses '{}' which can '{}'",
                        self.requirements[requirement.0].argument(),
                        self.candidate(candidate).short_name(),
                        join(&cans),
                        self.requirements[combined.0].argument(),
                        join(&self.requirements[combined.0].cans)
                    );
                    self.requirements[combined.0].cans.extend(cans);
                    self.candidates[candidate.0].requirements[index].1 = combined;
                }
                None => {
                    for child in self.requirements[requirement.0].candidates.clone() {
                        self.recursively_combine_uses(child, &uses_mapping);
                    }
                }
            }
        }
    }

    /// Assigns a scope to every reachable candidate. Must run before
    /// `remove_with_shorter_scope_than_parent`.
    pub fn select_scopes(&mut self, top_level_scope: &Scope) {
        debug!("Selecting scopes below '{}'", top_level_scope.name());
        let root = self.root;
        self.candidates[root.0].selected_scope = Some(top_level_scope.name().to_string());
        self.recursively_select_scopes(root, top_level_scope.name());
    }

    fn recursively_select_scopes(&mut self, candidate: CandidateNodeId, parent_scope: &str) {
        for requirement in self.slot_ids(candidate) {
            if self.requirements[requirement.0].selection_performed {
                continue;
            }
            for child in self.requirements[requirement.0].candidates.clone() {
                if self.candidates[child.0].selected_scope.is_some() {
                    continue;
                }
                let node = &self.requirements[requirement.0];
                let scope = node
                    .requirement
                    .scope_name()
                    .or_else(|| self.candidates[child.0].component.default_scope())
                    .unwrap_or(parent_scope)
                    .to_string();
                let expand = node.requirement.is_instance();

                trace!(
                    "Scope '{}' selected for '{}'",
                    scope,
                    self.candidates[child.0].short_name()
                );
                self.candidates[child.0].selected_scope = Some(scope.clone());
                if expand {
                    self.recursively_select_scopes(child, &scope);
                }
            }
        }
    }

    /// Fails with the full rejection tree when a root requirement has no
    /// candidates left.
    pub fn assert_requirements_fulfilled(&self) -> Result<()> {
        let fulfilled = self.root_node().requirements().all(|(_, id)| {
            let node = self.requirement(id);
            !node.is_required() || !node.candidates.is_empty()
        });
        if fulfilled {
            return Ok(());
        }

        let msg = report::render_failure(self);
        debug!("{}", msg);
        Err(ZafError::ComponentDependency(msg))
    }

    /// Selects the candidate with the highest priority for each requirement.
    /// Equal priorities keep registration order.
    pub fn make_selections(&mut self) {
        debug!("Making selections");
        self.recursively_make_selections(self.root);
    }

    fn recursively_make_selections(&mut self, candidate: CandidateNodeId) {
        for requirement in self.slot_ids(candidate) {
            if self.requirements[requirement.0].selection_performed {
                continue;
            }
            self.requirements[requirement.0].selection_performed = true;

            let Some(best) = self.highest_priority(requirement) else {
                trace!(
                    "Nothing to select for '{}'",
                    self.requirements[requirement.0].argument()
                );
                continue;
            };
            self.candidates[best.0].selected = true;
            trace!(
                "Selected '{}' for requirement '{}'",
                self.candidate(best).short_name(),
                self.requirements[requirement.0].argument()
            );
            if self.requirements[requirement.0].requirement.is_instance() {
                self.recursively_make_selections(best);
            }
        }
    }

    fn highest_priority(&self, requirement: RequirementNodeId) -> Option<CandidateNodeId> {
        let mut best: Option<CandidateNodeId> = None;
        for &candidate in &self.requirements[requirement.0].candidates {
            match best {
                Some(current)
                    if self.candidate(current).priority() >= self.candidate(candidate).priority() => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    /// Walks the selected candidates from the root.
    pub fn selection(&self) -> Selection {
        self.collect_selection(self.root)
    }

    fn collect_selection(&self, candidate: CandidateNodeId) -> Selection {
        let entries = self
            .candidate(candidate)
            .requirements()
            .filter_map(|(argument, requirement)| {
                let chosen = self.selected(requirement)?;
                let node = self.candidate(chosen);
                let dependencies = if node.is_instance() {
                    self.collect_selection(chosen)
                } else {
                    Selection::default()
                };
                Some(SelectedComponent {
                    argument: argument.to_string(),
                    candidate: chosen,
                    component: Arc::clone(&node.component),
                    component_name: node.component.name().to_string(),
                    callable_name: node.short_name().to_string(),
                    scope: node.selected_scope.clone(),
                    kind: node.kind,
                    call: node.call.clone(),
                    dependencies,
                })
            })
            .collect();
        Selection { entries }
    }

    fn slot_ids(&self, candidate: CandidateNodeId) -> Vec<RequirementNodeId> {
        self.candidates[candidate.0]
            .requirements
            .iter()
            .map(|(_, id)| *id)
            .collect()
    }
}

fn join(cans: &BTreeSet<String>) -> String {
    cans.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
