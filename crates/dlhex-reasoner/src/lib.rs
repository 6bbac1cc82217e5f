//! # dlhex reasoner
//!
//! DL 推論器オラクル
//!
//! - `DlReasoner`: 整合性・インスタンス・ロール充足子の問い合わせと ABox の一時更新
//! - `SaturationReasoner`: 分類結果によるラベル飽和の参照実装
//! - `AboxExpansion`: 更新を追加し、スコープ終了時に必ず取り消すガード

pub mod expansion;
pub mod oracle;
pub mod saturation;

pub use expansion::AboxExpansion;
pub use oracle::{AxiomHandle, ConceptExpr, DlReasoner, ReasonerProvider, RoleExpr};
pub use saturation::{SaturationProvider, SaturationReasoner};

use dlhex_ontology::OntologyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReasonerError {
    #[error("Unknown axiom handle: {0}")]
    UnknownHandle(u64),

    #[error("Unsupported expression: {0}")]
    Unsupported(String),

    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    #[error("Reasoner failed: {0}")]
    Failed(String),
}
