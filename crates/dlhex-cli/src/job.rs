//! Job files: one program, its engine configuration and where the ontologies live

use anyhow::{Context, Result};
use dlhex_engine::{EngineConfig, HexProgram};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn current_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Contents of a job file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Directory ontology identifiers are resolved against, relative to the job file
    #[serde(default = "current_dir")]
    pub ontology_dir: PathBuf,
    #[serde(default)]
    pub config: EngineConfig,
    pub program: HexProgram,
}

impl Job {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read job file {}", path.display()))?;
        let mut job: Job = serde_json::from_str(&text)
            .with_context(|| format!("invalid job file {}", path.display()))?;
        job.config.validate()?;
        if job.ontology_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            job.ontology_dir = base.join(&job.ontology_dir);
        }
        Ok(job)
    }
}
