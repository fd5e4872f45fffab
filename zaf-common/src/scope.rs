// zaf-common/src/scope.rs
use std::fmt;
use std::sync::Arc;

use super::error::{Result, ZafError};

/// A named lifetime boundary.
///
/// Scopes form a chain from the shortest-lived scope (for example `test`) up
/// to the longest-lived root (for example `session`). A component may only
/// depend on components living in the same scope or in one of its ancestors.
#[derive(Debug, PartialEq, Eq)]
pub struct Scope {
    name: String,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn root(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
        })
    }

    /// Creates a scope below `parent`. A name may appear only once per chain.
    pub fn new(name: impl Into<String>, parent: Option<Arc<Scope>>) -> Result<Arc<Self>> {
        let name = name.into();
        if let Some(parent) = &parent {
            if parent.hierarchy().contains(&name.as_str()) {
                return Err(ZafError::Scope(format!(
                    "Multiple scopes with name '{name}' in the same hierarchy"
                )));
            }
        }
        Ok(Arc::new(Self { name, parent }))
    }

    /// Builds a chain from the longest-lived name to the shortest-lived one and
    /// returns the shortest-lived scope.
    pub fn chain<I, S>(names: I) -> Result<Arc<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut current: Option<Arc<Scope>> = None;
        for name in names {
            current = Some(Scope::new(name, current)?);
        }
        current.ok_or_else(|| ZafError::Scope("A scope chain needs at least one name".into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// Finds `name` among self and its ancestors.
    pub fn find_ancestor(&self, name: &str) -> Result<&Scope> {
        let mut current = self;
        loop {
            if current.name == name {
                return Ok(current);
            }
            match &current.parent {
                Some(parent) => current = parent.as_ref(),
                None => {
                    return Err(ZafError::Scope(format!(
                        "No scope found with name '{name}'"
                    )))
                }
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_ancestor(name).is_ok()
    }

    /// Scope names ordered from the root down to self.
    pub fn hierarchy(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            names.push(scope.name.as_str());
            current = scope.parent.as_deref();
        }
        names.reverse();
        names
    }

    pub fn path(&self) -> String {
        self.hierarchy().join("->")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
