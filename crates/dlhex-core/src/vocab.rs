//! Reserved predicate names
//!
//! Every predicate introduced by the engine starts with [`PREFIX`]; user
//! programs must not define predicates with this prefix.

use crate::symbol::Symbol;

pub const PREFIX: &str = "dlhex_";

/// Guard literal: `dlhex_guard(Name, Args...)`
pub const GUARD: &str = "dlhex_guard";
/// Domain of individuals: `dlhex_dom(X)`
pub const DOM: &str = "dlhex_dom";
/// Baseline concept assertion: `dlhex_abox_c(Concept, X)`
pub const ABOX_C: &str = "dlhex_abox_c";
/// Baseline role assertion: `dlhex_abox_r(Role, X, Y)`
pub const ABOX_R: &str = "dlhex_abox_r";
/// Deleted concept assertion: `dlhex_bar_c(Concept, X)`
pub const BAR_C: &str = "dlhex_bar_c";
/// Deleted role assertion: `dlhex_bar_r(Role, X, Y)`
pub const BAR_R: &str = "dlhex_bar_r";
/// Name that must not be deleted: `dlhex_protect_pred(Name)`
pub const PROTECT_PRED: &str = "dlhex_protect_pred";
/// Individual that must not be deleted: `dlhex_protect_const(X)`
pub const PROTECT_CONST: &str = "dlhex_protect_const";
/// Name with at least one deleted assertion
pub const DELETED_PRED: &str = "dlhex_deleted_pred";
/// Individual with at least one deleted assertion
pub const DELETED_CONST: &str = "dlhex_deleted_const";

pub fn guard() -> Symbol {
    Symbol::new(GUARD)
}

pub fn dom() -> Symbol {
    Symbol::new(DOM)
}

/// Replacement atom for the `k`-th DL atom being true
pub fn replacement(k: usize) -> Symbol {
    Symbol::new(format!("{}e{}", PREFIX, k))
}

/// Replacement atom for the `k`-th DL atom being false
pub fn negated_replacement(k: usize) -> Symbol {
    Symbol::new(format!("{}ne{}", PREFIX, k))
}

/// Support atom of the `k`-th DL atom
pub fn support(k: usize) -> Symbol {
    Symbol::new(format!("{}supp{}", PREFIX, k))
}

pub fn is_auxiliary(predicate: &str) -> bool {
    predicate.starts_with(PREFIX)
}

/// Index of a replacement atom predicate, with `true` for `e<k>` and `false` for `ne<k>`
pub fn parse_replacement(predicate: &str) -> Option<(usize, bool)> {
    let rest = predicate.strip_prefix(PREFIX)?;
    if let Some(k) = rest.strip_prefix("ne") {
        return k.parse().ok().map(|k| (k, false));
    }
    rest.strip_prefix('e')?.parse().ok().map(|k| (k, true))
}
