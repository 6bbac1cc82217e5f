use dlhex_ontology::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn class(i: usize) -> String {
    format!("C{}", i)
}

/// Reflexive-transitive reachability over the subclass edges
fn reachable(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<bool>> {
    let mut reach = vec![vec![false; n]; n];
    for (i, row) in reach.iter_mut().enumerate() {
        row[i] = true;
    }
    for (a, b) in edges {
        reach[*a][*b] = true;
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if reach[i][k] && reach[k][j] {
                    reach[i][j] = true;
                }
            }
        }
    }
    reach
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    /// Without disjointness the `sub` relation over positive names is exactly
    /// the transitive closure of the seeds, and contraposition mirrors it.
    #[test]
    fn prop_sub_is_transitive_closure(n in 2usize..7, edges in prop::collection::vec((0usize..7, 0usize..7), 0..10)) {
        let edges: Vec<(usize, usize)> = edges.into_iter().filter(|(a, b)| *a < n && *b < n).collect();
        let mut ontology = Ontology::new("random");
        for i in 0..n {
            ontology.add_axiom(TBoxAxiom::DeclareClass(class(i).into()));
        }
        for (a, b) in &edges {
            ontology.add_axiom(TBoxAxiom::SubClassOf(class(*a).into(), class(*b).into()));
        }

        let classification = Classification::compute(&ontology).unwrap();
        let reach = reachable(n, &edges);
        for i in 0..n {
            for j in 0..n {
                prop_assert_eq!(classification.is_subsumed(&class(i), &class(j)), reach[i][j]);
                prop_assert_eq!(
                    classification.is_subsumed(&format!("¬{}", class(j)), &format!("¬{}", class(i))),
                    reach[i][j]
                );
            }
            prop_assert!(!classification.is_unsatisfiable(&class(i)));
        }
    }

    /// Every derived `sub` fact is transitively closed.
    #[test]
    fn prop_sub_closed_under_composition(
        n in 2usize..6,
        subs in prop::collection::vec((0usize..6, 0usize..6), 0..8),
        disjoint in prop::collection::vec((0usize..6, 0usize..6), 0..3),
    ) {
        let mut ontology = Ontology::new("random");
        for (a, b) in subs.iter().filter(|(a, b)| *a < n && *b < n) {
            ontology.add_axiom(TBoxAxiom::SubClassOf(class(*a).into(), class(*b).into()));
        }
        for (a, b) in disjoint.iter().filter(|(a, b)| *a < n && *b < n) {
            ontology.add_axiom(TBoxAxiom::DisjointClasses(class(*a).into(), class(*b).into()));
        }

        let classification = Classification::compute(&ontology).unwrap();
        let facts: BTreeSet<(String, String)> = classification
            .sub_facts()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        for (a, b) in &facts {
            for (c, d) in &facts {
                if b == c {
                    prop_assert!(classification.is_subsumed(a, d), "missing sub({},{})", a, d);
                }
            }
        }
    }
}

#[test]
fn test_classification_of_loaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let text = "\
<http://ex.org/o#A> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/2002/07/owl#Class> .
<http://ex.org/o#B> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/2002/07/owl#Class> .
<http://ex.org/o#A> <http://www.w3.org/2002/07/owl#equivalentClass> <http://ex.org/o#B> .
";
    std::fs::write(dir.path().join("o.nt"), text).unwrap();

    let loader = FileOntologyLoader::new(dir.path());
    let mut cache = OntologyCache::new();
    let entry = cache.get_or_load("o.nt", &loader).unwrap();
    let classification = entry.classification().unwrap();
    assert!(classification.is_subsumed("A", "B"));
    assert!(classification.is_subsumed("B", "A"));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let loader = FileOntologyLoader::new(dir.path());
    assert!(matches!(loader.load("nope.nt"), Err(OntologyError::Io { .. })));
}
