use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ZafError {
    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Component Configuration Error: {0}")]
    Configuration(String),

    /// Carries the full rejection tree, one line per requirement and candidate.
    #[error("{0}")]
    ComponentDependency(String),

    #[error("Scope Error: {0}")]
    Scope(String),

    #[error("Dependency graph has already been resolved; build a new graph per resolution")]
    GraphAlreadyResolved,

    #[error("Component Property Error: {0}")]
    ComponentProperty(String),

    #[error("Entity Mapping Error: {0}")]
    EntityMapping(String),
}

impl From<serde_json::Error> for ZafError {
    fn from(err: serde_json::Error) -> Self {
        ZafError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ZafError>;
