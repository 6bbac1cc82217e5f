//! # dlhex ASP
//!
//! 解集合プログラムのグラウンダーとベースソルバー
//!
//! - 選言・選択ヘッド、`not`、`#count`/`#sum` 制約を持つプログラム
//! - 否定を無視した不動点による可能アトムの計算とジョイン
//! - 上界/下界の交互不動点で伝播するバックトラックソルバー

pub mod ground;
pub mod program;
pub mod solver;

pub use ground::{ground, GroundProgram, GroundRule, Grounder};
pub use program::{
    Aggregate, AggregateElement, AggregateFunction, BodyLiteral, CompareOp, Head, Program, Rule,
};
pub use solver::{BacktrackingSolver, BaseSolver, SolverStats};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AspError {
    #[error("Unsafe variable {variable} in rule: {rule}")]
    Unsafe { rule: String, variable: String },

    #[error("Unsupported construct: {0}")]
    Unsupported(String),
}

/// Ground `program` and enumerate all of its answer sets
pub fn solve_all(program: &Program) -> Result<Vec<Vec<dlhex_core::Atom>>, AspError> {
    let mut solver = BacktrackingSolver::new(ground(program)?);
    let mut models = Vec::new();
    while let Some(model) = solver.next_model()? {
        let mut atoms: Vec<dlhex_core::Atom> = model.atoms(solver.table()).cloned().collect();
        atoms.sort();
        models.push(atoms);
    }
    Ok(models)
}
