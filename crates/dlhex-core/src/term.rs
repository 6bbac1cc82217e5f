//! Terms and atoms

use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable bindings produced while matching atoms
pub type Bindings = BTreeMap<Symbol, Term>;

/// Term of a logic program atom
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    /// Symbolic constant
    Const(Symbol),
    /// Integer constant
    Int(i64),
    /// Variable
    Var(Symbol),
}

impl Term {
    pub fn constant<S: Into<Symbol>>(s: S) -> Self {
        Term::Const(s.into())
    }

    pub fn var<S: Into<Symbol>>(s: S) -> Self {
        Term::Var(s.into())
    }

    pub fn int(value: i64) -> Self {
        Term::Int(value)
    }

    pub fn is_ground(&self) -> bool {
        !matches!(self, Term::Var(_))
    }

    /// Constant symbol, if this term is one
    pub fn as_const(&self) -> Option<&Symbol> {
        match self {
            Term::Const(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Replace a bound variable by its value
    pub fn substitute(&self, bindings: &Bindings) -> Term {
        match self {
            Term::Var(v) => bindings.get(v).cloned().unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::constant(s)
    }
}

impl From<Symbol> for Term {
    fn from(s: Symbol) -> Self {
        Term::Const(s)
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::Int(i)
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Const(s) => {
                let plain = s
                    .as_str()
                    .chars()
                    .next()
                    .map(|c| c.is_ascii_lowercase())
                    .unwrap_or(false)
                    && s.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                if plain {
                    write!(f, "{}", s)
                } else {
                    write!(f, "\"{}\"", s)
                }
            }
            Term::Int(i) => write!(f, "{}", i),
            Term::Var(v) => write!(f, "{}", v),
        }
    }
}

/// Predicate applied to a list of terms
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    pub predicate: Symbol,
    #[serde(default)]
    pub args: Vec<Term>,
}

impl Atom {
    pub fn new<P: Into<Symbol>>(predicate: P, args: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    /// Ground atom over symbolic constants
    pub fn ground<P, I, S>(predicate: P, args: I) -> Self
    where
        P: Into<Symbol>,
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        Self {
            predicate: predicate.into(),
            args: args.into_iter().map(|s| Term::Const(s.into())).collect(),
        }
    }

    /// Propositional atom
    pub fn prop<P: Into<Symbol>>(predicate: P) -> Self {
        Self::new(predicate, Vec::new())
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_ground)
    }

    pub fn substitute(&self, bindings: &Bindings) -> Atom {
        Atom {
            predicate: self.predicate.clone(),
            args: self.args.iter().map(|t| t.substitute(bindings)).collect(),
        }
    }

    /// Variables in order of first occurrence
    pub fn variables(&self) -> Vec<Symbol> {
        let mut vars = Vec::new();
        for arg in &self.args {
            if let Term::Var(v) = arg {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
        }
        vars
    }

    /// Extend `bindings` so that this atom becomes equal to `ground`.
    ///
    /// Returns false (leaving `bindings` possibly extended) when the atoms
    /// cannot be unified.
    pub fn match_ground(&self, ground: &Atom, bindings: &mut Bindings) -> bool {
        if self.predicate != ground.predicate || self.args.len() != ground.args.len() {
            return false;
        }
        for (pattern, value) in self.args.iter().zip(&ground.args) {
            match pattern {
                Term::Var(v) => match bindings.get(v) {
                    Some(bound) if bound != value => return false,
                    Some(_) => {}
                    None => {
                        bindings.insert(v.clone(), value.clone());
                    }
                },
                constant => {
                    if constant != value {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Constant arguments as symbols; `None` if any argument is not a symbolic constant
    pub fn const_args(&self) -> Option<Vec<Symbol>> {
        self.args.iter().map(|t| t.as_const().cloned()).collect()
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.predicate)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
