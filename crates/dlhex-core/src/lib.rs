//! # dlhex core
//!
//! ASP と DL クエリ評価で共有するデータモデル
//! シンボル、アトム、解釈、ノーグッドを提供

pub mod interpretation;
pub mod nogood;
pub mod symbol;
pub mod table;
pub mod term;
pub mod vocab;

pub use interpretation::Interpretation;
pub use nogood::{GroundNogood, Literal, LiteralKind, Nogood};
pub use symbol::Symbol;
pub use table::{AtomId, AtomTable};
pub use term::{Atom, Bindings, Term};

#[cfg(test)]
mod tests {
    use super::*;

    mod symbol_tests {
        use super::*;

        #[test]
        fn test_symbol_equality_follows_contents() {
            let a = Symbol::new("Person");
            let b: Symbol = "Person".to_string().into();
            assert_eq!(a, b);
            assert_eq!(a, "Person");
            assert!(Symbol::new("A") < Symbol::new("B"));
        }

        #[test]
        fn test_symbol_serde_as_string() {
            let s = Symbol::new("bob");
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, "\"bob\"");
            let back: Symbol = serde_json::from_str(&json).unwrap();
            assert_eq!(back, s);
        }

        #[test]
        fn test_symbol_is_empty() {
            assert!(Symbol::new("").is_empty());
            assert_eq!(Symbol::new("abc").len(), 3);
        }
    }

    mod atom_tests {
        use super::*;

        #[test]
        fn test_atom_display() {
            let atom = Atom::new("p", vec![Term::constant("a"), Term::int(3), Term::var("X")]);
            assert_eq!(atom.to_string(), "p(a,3,X)");
            assert_eq!(Atom::prop("q").to_string(), "q");
            assert_eq!(Atom::ground("c", ["Person", "bob"]).to_string(), "c(\"Person\",bob)");
        }

        #[test]
        fn test_match_ground_binds_variables() {
            let pattern = Atom::new("r", vec![Term::var("X"), Term::var("X")]);
            let mut bindings = Bindings::new();
            assert!(pattern.match_ground(&Atom::ground("r", ["a", "a"]), &mut bindings));
            assert_eq!(bindings.get(&Symbol::new("X")), Some(&Term::constant("a")));

            let mut bindings = Bindings::new();
            assert!(!pattern.match_ground(&Atom::ground("r", ["a", "b"]), &mut bindings));
        }

        #[test]
        fn test_substitute_and_variables() {
            let pattern = Atom::new("r", vec![Term::var("Y"), Term::constant("c"), Term::var("X")]);
            assert_eq!(pattern.variables(), vec![Symbol::new("Y"), Symbol::new("X")]);

            let mut bindings = Bindings::new();
            bindings.insert(Symbol::new("X"), Term::constant("x"));
            let partial = pattern.substitute(&bindings);
            assert!(!partial.is_ground());
            bindings.insert(Symbol::new("Y"), Term::constant("y"));
            assert_eq!(pattern.substitute(&bindings), Atom::ground("r", ["y", "c", "x"]));
        }
    }

    mod table_tests {
        use super::*;

        #[test]
        fn test_intern_is_idempotent() {
            let mut table = AtomTable::new();
            let a = table.intern(Atom::ground("p", ["a"]));
            let b = table.intern(Atom::ground("p", ["b"]));
            assert_ne!(a, b);
            assert_eq!(table.intern(Atom::ground("p", ["a"])), a);
            assert_eq!(table.len(), 2);
            assert_eq!(table.atom(b), &Atom::ground("p", ["b"]));
        }

        #[test]
        fn test_indexes() {
            let mut table = AtomTable::new();
            table.intern(Atom::ground("r", ["a", "b"]));
            table.intern(Atom::ground("r", ["a", "c"]));
            table.intern(Atom::ground("r", ["b", "c"]));
            table.intern(Atom::ground("p", ["a"]));

            let r = Symbol::new("r");
            assert_eq!(table.by_predicate(&r, 2).len(), 3);
            assert_eq!(table.by_first_arg(&r, 2, &Term::constant("a")).len(), 2);
            assert!(table.by_predicate(&r, 3).is_empty());

            let pattern = Atom::new("r", vec![Term::constant("b"), Term::var("Y")]);
            assert_eq!(table.candidates(&pattern).len(), 1);
        }
    }

    mod interpretation_tests {
        use super::*;

        #[test]
        fn test_membership_and_order() {
            let mut table = AtomTable::new();
            let ids: Vec<AtomId> = ["a", "b", "c"]
                .iter()
                .map(|c| table.intern(Atom::ground("p", [*c])))
                .collect();
            let mut interpretation = Interpretation::new();
            interpretation.insert(ids[2]);
            interpretation.insert(ids[0]);

            assert!(interpretation.contains(ids[0]));
            assert!(!interpretation.contains(ids[1]));
            assert_eq!(interpretation.iter().collect::<Vec<_>>(), vec![ids[0], ids[2]]);
            let shown: Vec<String> = interpretation.atoms(&table).map(|a| a.to_string()).collect();
            assert_eq!(shown, vec!["p(a)", "p(c)"]);
        }

        #[test]
        fn test_set_operations() {
            let a: Interpretation = [AtomId(1), AtomId(2)].into_iter().collect();
            let b: Interpretation = [AtomId(2), AtomId(3)].into_iter().collect();
            assert_eq!(a.union(&b).len(), 3);
            assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![AtomId(1)]);
            assert!(!a.is_subset(&b));
        }
    }

    mod nogood_tests {
        use super::*;

        fn input(c: &str, x: &str) -> Atom {
            Atom::ground("cp", [c, x])
        }

        #[test]
        fn test_nogood_is_a_set() {
            let a = Nogood::new()
                .with(Literal::pos(input("A", "x"), LiteralKind::Input))
                .with(Literal::neg(Atom::ground("dlhex_e0", ["x"]), LiteralKind::Output));
            let b = Nogood::new()
                .with(Literal::neg(Atom::ground("dlhex_e0", ["x"]), LiteralKind::Output))
                .with(Literal::pos(input("A", "x"), LiteralKind::Input))
                .with(Literal::pos(input("A", "x"), LiteralKind::Input));
            assert_eq!(a, b);
            assert_eq!(a.len(), 2);
            assert_eq!(a.body_len(), 1);
        }

        #[test]
        fn test_guard_and_without() {
            let guard = Literal::pos(Atom::ground("dlhex_guard", ["A", "x"]), LiteralKind::Guard);
            let nogood = Nogood::new()
                .with(Literal::pos(input("A", "x"), LiteralKind::Input))
                .with(guard.clone());
            assert_eq!(nogood.guard(), Some(&guard));
            let reduced = nogood.without(&guard);
            assert!(reduced.is_guard_free());
            assert_eq!(reduced.len(), 1);
        }

        #[test]
        fn test_ground_against_table() {
            let mut table = AtomTable::new();
            let known = table.intern(input("A", "x"));

            let positive_unknown = Nogood::new()
                .with(Literal::pos(input("A", "x"), LiteralKind::Input))
                .with(Literal::pos(input("B", "x"), LiteralKind::Input));
            assert!(positive_unknown.ground(&table).is_none());

            let negative_unknown = Nogood::new()
                .with(Literal::pos(input("A", "x"), LiteralKind::Input))
                .with(Literal::neg(input("B", "x"), LiteralKind::Input));
            let ground = negative_unknown.ground(&table).unwrap();
            assert_eq!(ground.literals(), &[(known, true)]);
        }
    }

    mod vocab_tests {
        use super::*;

        #[test]
        fn test_replacement_names() {
            assert_eq!(vocab::replacement(3).as_str(), "dlhex_e3");
            assert_eq!(vocab::negated_replacement(3).as_str(), "dlhex_ne3");
            assert_eq!(vocab::parse_replacement("dlhex_e12"), Some((12, true)));
            assert_eq!(vocab::parse_replacement("dlhex_ne0"), Some((0, false)));
            assert_eq!(vocab::parse_replacement("dlhex_dom"), None);
            assert!(vocab::is_auxiliary(vocab::BAR_C));
            assert!(!vocab::is_auxiliary("person"));
        }
    }
}
