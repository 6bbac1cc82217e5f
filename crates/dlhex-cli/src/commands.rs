//! CLI command definitions and handlers

use crate::job::Job;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dlhex_core::Symbol;
use dlhex_engine::{
    evaluate, solve, DlAtom, EngineConfig, EngineContext, QueryInput, QueryShape, UpdatePredicates,
};
use dlhex_ontology::FileOntologyLoader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "dlhex")]
#[command(about = "Answer set programs with description logic atoms")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a job file and print its answer sets
    Run {
        /// Job file (JSON)
        #[arg(short, long)]
        job: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the subsumptions derived from an ontology
    Classify {
        /// Ontology file (N-Triples)
        #[arg(long)]
        ontology: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check ABox consistency and list conflicting assertions
    Check {
        /// Ontology file (N-Triples)
        #[arg(long)]
        ontology: PathBuf,

        /// Also list the instances of this concept (`-C` for its complement)
        #[arg(short, long)]
        concept: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

impl OutputFormat {
    fn render(&self, value: &serde_json::Value, text: impl FnOnce() -> String) -> Result<String> {
        Ok(match self {
            OutputFormat::Text => text(),
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
        })
    }
}

/// Command execution result
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Splits an ontology path into the loader directory and the ontology identifier
fn ontology_location(path: &Path) -> Result<(PathBuf, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} is not an ontology file", path.display()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_string()))
}

/// Query against the baseline ABox only; the update predicates never occur
fn baseline_query(ontology: &str, query: QueryShape) -> DlAtom {
    DlAtom {
        ontology: Symbol::new(ontology),
        updates: UpdatePredicates {
            concept_plus: "dlhex_cp".into(),
            concept_minus: "dlhex_cm".into(),
            role_plus: "dlhex_rp".into(),
            role_minus: "dlhex_rm".into(),
        },
        query,
        use_abox: true,
    }
}

/// Execute CLI commands
#[derive(Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute a CLI command
    pub fn execute(&mut self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Run { job, format, output } => self.execute_run(job, format, output),
            Commands::Classify { ontology, format } => self.execute_classify(ontology, format),
            Commands::Check {
                ontology,
                concept,
                format,
            } => self.execute_check(ontology, concept, format),
        }
    }

    fn execute_run(&self, path: PathBuf, format: OutputFormat, output: Option<PathBuf>) -> Result<CommandResult> {
        let job = Job::from_file(&path)?;
        info!("Running job {} ({} rules)", path.display(), job.program.len());

        let mut context = EngineContext::new(job.config, FileOntologyLoader::new(job.ontology_dir));
        let answers = solve(&job.program, &mut context)?;
        let stats = context.stats;

        let data = serde_json::json!({
            "answer_sets": answers,
            "stats": stats,
        });
        let result = format.render(&data, || {
            let mut text = String::new();
            for (i, answer) in answers.iter().enumerate() {
                text.push_str(&format!("Answer {}: {}\n", i + 1, answer));
            }
            if answers.is_empty() {
                text.push_str("UNSATISFIABLE\n");
            }
            text.push_str(&format!(
                "Candidates: {}, rejected: {}, oracle calls: {}, support sets: {}",
                stats.candidates, stats.rejected, stats.oracle_calls, stats.support_sets
            ));
            text
        })?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &result)?;
        } else {
            println!("{}", result);
        }

        Ok(CommandResult {
            success: true,
            message: format!("Found {} answer sets", answers.len()),
            data: Some(data),
        })
    }

    fn execute_classify(&self, ontology: PathBuf, format: OutputFormat) -> Result<CommandResult> {
        let (dir, name) = ontology_location(&ontology)?;
        let mut context = EngineContext::new(EngineConfig::default(), FileOntologyLoader::new(dir));
        let entry = context.ontology(&name)?;
        let classification = entry.classification()?;

        let subsumptions: Vec<(String, String)> = classification
            .sub_facts()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let data = serde_json::json!({
            "ontology": name,
            "subsumptions": subsumptions,
        });
        let result = format.render(&data, || {
            let mut text = format!("{} subsumptions in {}:", subsumptions.len(), name);
            for (a, b) in &subsumptions {
                text.push_str(&format!("\n  {} ⊑ {}", a, b));
            }
            text
        })?;
        println!("{}", result);

        Ok(CommandResult {
            success: true,
            message: format!("Classified {}", name),
            data: Some(data),
        })
    }

    fn execute_check(&self, ontology: PathBuf, concept: Option<String>, format: OutputFormat) -> Result<CommandResult> {
        let (dir, name) = ontology_location(&ontology)?;
        let mut context = EngineContext::new(EngineConfig::default(), FileOntologyLoader::new(dir));

        let consistent = !evaluate(
            &mut context,
            &baseline_query(&name, QueryShape::Consistent),
            &QueryInput::default(),
            None,
        )?
        .is_empty();
        let entry = context.ontology(&name)?;
        let conflicts: Vec<Vec<String>> = entry
            .abox_conflicts()?
            .iter()
            .map(|c| c.assertions.iter().map(|a| a.to_string()).collect())
            .collect();

        let instances: Option<Vec<String>> = match &concept {
            Some(c) => {
                let query = match c.strip_prefix('-') {
                    Some(base) => QueryShape::Concept {
                        concept: base.into(),
                        negated: true,
                    },
                    None => QueryShape::Concept {
                        concept: c.as_str().into(),
                        negated: false,
                    },
                };
                let answer = evaluate(&mut context, &baseline_query(&name, query), &QueryInput::default(), None)?;
                Some(answer.into_iter().filter_map(|t| t.first().map(|x| x.to_string())).collect())
            }
            None => None,
        };

        let data = serde_json::json!({
            "ontology": name,
            "consistent": consistent,
            "conflicts": conflicts,
            "instances": instances,
        });
        let result = format.render(&data, || {
            let mut text = format!(
                "{} is {}",
                name,
                if consistent { "consistent" } else { "inconsistent" }
            );
            for conflict in &conflicts {
                text.push_str(&format!("\n  conflict: {}", conflict.join(", ")));
            }
            if let (Some(c), Some(xs)) = (&concept, &instances) {
                text.push_str(&format!("\n{}: {}", c, xs.join(", ")));
            }
            text
        })?;
        println!("{}", result);

        Ok(CommandResult {
            success: consistent,
            message: format!("{} conflicts in {}", conflicts.len(), name),
            data: Some(data),
        })
    }
}
