// zaf-common/src/config.rs
use std::env;

use tracing::debug;

use super::error::{Result, ZafError};

const IMPLICIT_REQUIREMENTS_VAR: &str = "ZAF_IMPLICIT_REQUIREMENTS";
const LOG_COMPONENTS_ON_FAILURE_VAR: &str = "ZAF_LOG_COMPONENTS_ON_FAILURE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Match consumer parameter names case-insensitively against registered
    /// component names and add them as reference requirements.
    pub implicit_requirements: bool,
    /// Dump the whole component registry when a resolution fails.
    pub log_components_on_failure: bool,
}

impl ResolverConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading zaf resolver configuration");

        let implicit_requirements = read_flag(IMPLICIT_REQUIREMENTS_VAR, true)?;
        let log_components_on_failure = read_flag(LOG_COMPONENTS_ON_FAILURE_VAR, false)?;

        debug!(
            "Resolver configuration loaded: implicit_requirements={}, log_components_on_failure={}",
            implicit_requirements, log_components_on_failure
        );
        Ok(Self {
            implicit_requirements,
            log_components_on_failure,
        })
    }

    pub fn with_implicit_requirements(mut self, enabled: bool) -> Self {
        self.implicit_requirements = enabled;
        self
    }

    pub fn with_log_components_on_failure(mut self, enabled: bool) -> Self {
        self.log_components_on_failure = enabled;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            implicit_requirements: true,
            log_components_on_failure: false,
        }
    }
}

pub fn load_config() -> Result<ResolverConfig> {
    ResolverConfig::load()
}

fn read_flag(var: &str, default: bool) -> Result<bool> {
    match env::var(var).ok().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_flag(&raw).ok_or_else(|| {
            ZafError::Config(format!(
                "{var} must be a boolean (1/0, true/false, yes/no, on/off), got '{raw}'"
            ))
        }),
        None => {
            debug!("{} not set, falling back to default: {}", var, default);
            Ok(default)
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
