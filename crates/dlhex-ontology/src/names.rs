//! DL name forms
//!
//! 概念 `C`、補概念 `¬C`、存在制限 `∃R` とその補 `¬∃R`、ロール `R` と `¬R`

use dlhex_core::Symbol;

pub const NEGATION: char = '¬';
pub const EXISTS: char = '∃';

/// Toggle the complement marker of `name`
pub fn negate(name: &str) -> Symbol {
    match name.strip_prefix(NEGATION) {
        Some(positive) => Symbol::new(positive),
        None => Symbol::new(format!("{}{}", NEGATION, name)),
    }
}

/// Existential restriction `∃R`
pub fn exists(role: &str) -> Symbol {
    Symbol::new(format!("{}{}", EXISTS, role))
}

pub fn is_negated(name: &str) -> bool {
    name.starts_with(NEGATION)
}

/// Name without its complement marker
pub fn positive(name: &str) -> &str {
    name.strip_prefix(NEGATION).unwrap_or(name)
}

/// Role of a positive existential restriction `∃R`
pub fn existential_role(name: &str) -> Option<&str> {
    name.strip_prefix(EXISTS)
}

pub fn is_existential(name: &str) -> bool {
    existential_role(positive(name)).is_some()
}
