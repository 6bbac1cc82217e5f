//! # dlhex engine
//!
//! DL アトムを含む解集合プログラムの評価エンジン
//!
//! - サポート集合 (ノーグッド) の学習とガードの解決
//! - ABox 修復の補助ルールへの符号化
//! - 推測・検査ループと推論器による事後検証

pub mod atom;
pub mod config;
pub mod context;
pub mod generator;
pub mod guard;
pub mod learner;
pub mod query;
pub mod repair;
pub mod verify;

pub use atom::{DlAtom, DlInvocation, DlKind, HexLiteral, HexProgram, HexRule, QueryShape, UpdateKind, UpdatePredicates};
pub use config::{EngineConfig, LearningOptions, RepairOptions};
pub use context::{EngineContext, EngineStats};
pub use generator::{AnswerSet, Deletion, GeneratorState, ModelGenerator};
pub use guard::{resolve, resolve_instances, AboxSnapshot, Resolution};
pub use learner::{SupportFamily, SupportSetLearner};
pub use query::{evaluate, Answer, QueryInput};
pub use repair::RepairEncoder;
pub use verify::{PostCheckVerifier, Verdict};

use dlhex_asp::AspError;
use dlhex_ontology::OntologyError;
use dlhex_reasoner::ReasonerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Ontology load error: {0}")]
    OntologyLoad(#[from] OntologyError),

    #[error("Reasoner error: {0}")]
    Reasoner(#[from] ReasonerError),

    #[error("Unknown symbol {symbol} in ontology {ontology}")]
    UnknownSymbol { ontology: String, symbol: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("ASP error: {0}")]
    Asp(#[from] AspError),

    #[error("Classification error: {0}")]
    Classification(String),
}

/// Evaluate `program` and collect every accepted answer set
pub fn solve(program: &HexProgram, context: &mut EngineContext) -> Result<Vec<AnswerSet>, EngineError> {
    let mut generator = ModelGenerator::new(program.clone());
    let mut answers = Vec::new();
    while let Some(answer) = generator.next_model(context)? {
        answers.push(answer);
    }
    Ok(answers)
}
