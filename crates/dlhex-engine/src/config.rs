//! Engine configuration

use crate::EngineError;
use dlhex_core::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Support-set learning options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningOptions {
    pub enabled: bool,
    /// Support sets with more body literals are dropped
    pub max_support_set_size: Option<usize>,
    /// Support sets kept per DL atom
    pub max_support_sets: Option<usize>,
}

impl Default for LearningOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_support_set_size: None,
            max_support_sets: None,
        }
    }
}

/// ABox repair options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairOptions {
    pub enabled: bool,
    /// Deleted assertions in total
    pub max_deletions: Option<usize>,
    /// Distinct concept/role names with a deleted assertion
    pub max_deleted_predicates: Option<usize>,
    /// Distinct individuals with a deleted assertion
    pub max_deleted_constants: Option<usize>,
    /// Deleted assertions of any single concept/role name
    pub max_deletions_per_predicate: Option<usize>,
    /// When non-empty, only assertions of these names may be deleted
    pub allowed_predicates: BTreeSet<Symbol>,
    pub denied_predicates: BTreeSet<Symbol>,
    /// When non-empty, only assertions over these individuals may be deleted
    pub allowed_constants: BTreeSet<Symbol>,
    pub denied_constants: BTreeSet<Symbol>,
}

impl RepairOptions {
    /// Reject names both allowed and denied
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(name) = self.allowed_predicates.intersection(&self.denied_predicates).next() {
            return Err(EngineError::Configuration(format!(
                "predicate {} is both allowed and denied for deletion",
                name
            )));
        }
        if let Some(name) = self.allowed_constants.intersection(&self.denied_constants).next() {
            return Err(EngineError::Configuration(format!(
                "constant {} is both allowed and denied for deletion",
                name
            )));
        }
        Ok(())
    }

    /// Whether assertions of the (unsigned) name `predicate` may be deleted
    pub fn may_delete_predicate(&self, predicate: &str) -> bool {
        !self.denied_predicates.contains(predicate)
            && (self.allowed_predicates.is_empty() || self.allowed_predicates.contains(predicate))
    }

    pub fn may_delete_constant(&self, constant: &str) -> bool {
        !self.denied_constants.contains(constant)
            && (self.allowed_constants.is_empty() || self.allowed_constants.contains(constant))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub learning: LearningOptions,
    pub repair: RepairOptions,
    /// Stop after this many accepted answer sets
    pub max_models: Option<usize>,
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(text)
            .map_err(|e| EngineError::Configuration(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.repair.validate()?;
        if self.max_models == Some(0) {
            return Err(EngineError::Configuration(
                "max_models must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
