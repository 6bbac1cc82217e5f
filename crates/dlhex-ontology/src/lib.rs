//! # dlhex ontology
//!
//! オントロジーの読み込み・キャッシュ・分類
//!
//! - N-Triples からの TBox / ABox 読み込み
//! - `sub/op/conf` の固定 3 ルールによる分類プログラム
//! - オントロジー毎に一度だけ計算される分類と ABox 衝突表

pub mod cache;
pub mod classification;
pub mod loader;
pub mod model;
pub mod names;

pub use cache::{find_conflicts, AboxConflict, CachedOntology, OntologyCache};
pub use classification::Classification;
pub use loader::{parse_ntriples, FileOntologyLoader, MemoryOntologyLoader, OntologyLoader};
pub use model::{Abox, Assertion, ConceptAssertion, Label, Ontology, Position, RoleAssertion, TBoxAxiom};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("Cannot read ontology {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Malformed ontology: {0}")]
    Malformed(String),

    #[error("Ontology not found: {0}")]
    NotFound(String),

    #[error("Classification error: {0}")]
    Classification(String),
}
