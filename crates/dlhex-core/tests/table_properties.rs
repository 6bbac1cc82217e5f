use dlhex_core::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

const PREDICATES: [&str; 3] = ["p", "q", "r"];
const CONSTANTS: [&str; 4] = ["a", "b", "c", "d"];

fn atom((p, args): &(usize, Vec<usize>)) -> Atom {
    Atom::ground(PREDICATES[*p], args.iter().map(|c| CONSTANTS[*c]))
}

fn atoms() -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
    prop::collection::vec((0usize..3, prop::collection::vec(0usize..4, 0..3)), 0..20)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    /// Interning is idempotent, ids are dense, and the indexes list exactly
    /// the atoms of their predicate and first argument.
    #[test]
    fn prop_interning_and_indexes(specs in atoms()) {
        let mut table = AtomTable::new();
        let mut distinct = BTreeSet::new();
        for spec in &specs {
            let a = atom(spec);
            let (id, new) = table.insert(a.clone());
            prop_assert_eq!(new, distinct.insert(a.clone()));
            prop_assert_eq!(table.intern(a.clone()), id);
            prop_assert_eq!(table.atom(id), &a);
        }
        prop_assert_eq!(table.len(), distinct.len());

        for (id, a) in table.iter() {
            prop_assert!(id.index() < table.len());
            prop_assert!(table.by_predicate(&a.predicate, a.arity()).contains(&id));
            prop_assert!(table.candidates(a).contains(&id));
        }
        for p in PREDICATES {
            for arity in 0..3 {
                for id in table.by_predicate(&Symbol::new(p), arity) {
                    prop_assert_eq!(table.atom(*id).predicate.as_str(), p);
                    prop_assert_eq!(table.atom(*id).arity(), arity);
                }
            }
        }
    }

    /// Union, difference and inclusion agree with the same operations on id sets.
    #[test]
    fn prop_interpretation_set_laws(
        left in prop::collection::btree_set(0u32..64, 0..16),
        right in prop::collection::btree_set(0u32..64, 0..16),
    ) {
        let i: Interpretation = left.iter().map(|n| AtomId(*n)).collect();
        let j: Interpretation = right.iter().map(|n| AtomId(*n)).collect();

        let union: BTreeSet<u32> = i.union(&j).iter().map(|id| id.0).collect();
        prop_assert_eq!(union, left.union(&right).copied().collect::<BTreeSet<_>>());
        let difference: BTreeSet<u32> = i.difference(&j).iter().map(|id| id.0).collect();
        prop_assert_eq!(difference, left.difference(&right).copied().collect::<BTreeSet<_>>());

        prop_assert!(i.is_subset(&i.union(&j)));
        prop_assert!(i.difference(&j).is_subset(&i));
        prop_assert_eq!(i.is_subset(&j), left.is_subset(&right));
        prop_assert_eq!(i.len(), left.len());
    }
}
