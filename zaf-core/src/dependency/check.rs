// zaf-core/src/dependency/check.rs
use std::collections::HashMap;
use std::fmt;

use zaf_common::scope::Scope;

use super::graph::{CandidateNodeId, DependencyGraph, RequirementNodeId};

/// Why a candidate was removed from a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The candidate lacks these capabilities.
    CansNotFulfilled(Vec<String>),
    /// One of the candidate's own requirements has no candidates left.
    UnfulfilledRequirements,
    /// The candidate's scope is shorter-lived than its consumer's.
    InvalidScope { scope: String, valid_scopes: Vec<String> },
    /// The requirement is pinned to another entity.
    FixatedOnOtherEntity(String),
}

impl Rejection {
    pub fn short_code(&self) -> char {
        match self {
            Self::CansNotFulfilled(_) => 'C',
            Self::UnfulfilledRequirements => 'U',
            Self::InvalidScope { .. } => 'S',
            Self::FixatedOnOtherEntity(_) => 'E',
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CansNotFulfilled(missing) => {
                write!(f, "Cans not fulfilled '{}'", missing.join(", "))
            }
            Self::UnfulfilledRequirements => write!(f, "Unfulfilled requirements"),
            Self::InvalidScope {
                scope,
                valid_scopes,
            } => write!(
                f,
                "Scope '{}' is not one of the valid scopes '{}'",
                scope,
                valid_scopes.join(", ")
            ),
            Self::FixatedOnOtherEntity(entity) => {
                write!(f, "Fixated on another component entity '{entity}'")
            }
        }
    }
}

/// A structural constraint applied by `DependencyGraph::recursively_remove`.
pub(crate) trait CandidateCheck {
    /// Reference candidates are handles to definitions and are only checked
    /// when this returns true.
    fn applies_to_references(&self) -> bool {
        true
    }

    fn check(
        &self,
        graph: &DependencyGraph,
        parent: CandidateNodeId,
        requirement: RequirementNodeId,
        candidate: CandidateNodeId,
    ) -> Result<(), Rejection>;
}

/// The candidate must advertise every capability the requirement demands.
pub(crate) struct CheckCapabilities;

impl CandidateCheck for CheckCapabilities {
    fn check(
        &self,
        graph: &DependencyGraph,
        _parent: CandidateNodeId,
        requirement: RequirementNodeId,
        candidate: CandidateNodeId,
    ) -> Result<(), Rejection> {
        let demanded = graph.requirement(requirement).cans();
        let offered = graph.candidate(candidate).component().cans();
        let missing: Vec<String> = demanded.difference(offered).cloned().collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Rejection::CansNotFulfilled(missing))
        }
    }
}

/// The candidate's scope must be the parent's scope or one of its ancestors.
pub(crate) struct CheckScopes<'a> {
    top_level_scope: &'a Scope,
}

impl<'a> CheckScopes<'a> {
    pub(crate) fn new(top_level_scope: &'a Scope) -> Self {
        Self { top_level_scope }
    }
}

impl CandidateCheck for CheckScopes<'_> {
    fn applies_to_references(&self) -> bool {
        false
    }

    fn check(
        &self,
        graph: &DependencyGraph,
        parent: CandidateNodeId,
        _requirement: RequirementNodeId,
        candidate: CandidateNodeId,
    ) -> Result<(), Rejection> {
        let candidate_scope = graph.candidate(candidate).selected_scope().unwrap_or("None");
        // A parent outside the top-level hierarchy leaves nothing valid below it.
        let parent_scope = graph
            .candidate(parent)
            .selected_scope()
            .and_then(|name| self.top_level_scope.find_ancestor(name).ok());

        match parent_scope {
            Some(parent_scope) if parent_scope.contains(candidate_scope) => Ok(()),
            _ => Err(Rejection::InvalidScope {
                scope: candidate_scope.to_string(),
                valid_scopes: parent_scope
                    .unwrap_or(self.top_level_scope)
                    .hierarchy()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }),
        }
    }
}

/// Pins requirements to the entity named in the caller's mapping.
pub(crate) struct CheckFixated<'a> {
    fixated_entities: &'a HashMap<String, String>,
}

impl<'a> CheckFixated<'a> {
    pub(crate) fn new(fixated_entities: &'a HashMap<String, String>) -> Self {
        Self { fixated_entities }
    }
}

impl CandidateCheck for CheckFixated<'_> {
    fn check(
        &self,
        graph: &DependencyGraph,
        _parent: CandidateNodeId,
        requirement: RequirementNodeId,
        candidate: CandidateNodeId,
    ) -> Result<(), Rejection> {
        let requirement = graph.requirement(requirement).requirement();
        if !requirement.fixates_entities() {
            return Ok(());
        }
        match self
            .fixated_entities
            .get(requirement.target().component_name())
        {
            Some(entity) if graph.candidate(candidate).component().entity() != Some(entity.as_str()) => {
                Err(Rejection::FixatedOnOtherEntity(entity.clone()))
            }
            _ => Ok(()),
        }
    }
}
