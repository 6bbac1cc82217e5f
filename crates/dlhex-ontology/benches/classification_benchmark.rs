use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dlhex_ontology::{Assertion, CachedOntology, Classification, Ontology};

/// Class chain Class0 <- Class1 <- ... with a role domain per level and a few individuals
fn create_test_ontology(size: usize) -> Ontology {
    let mut ontology = Ontology::new("bench");
    for i in 1..size {
        ontology = ontology.subclass(format!("Class{}", i), format!("Class{}", i - 1));
    }
    for i in 0..size / 4 {
        ontology = ontology
            .domain(format!("role{}", i), format!("Class{}", i * 4))
            .fact(Assertion::concept(format!("Class{}", i), format!("ind{}", i), false))
            .fact(Assertion::role(format!("role{}", i), format!("ind{}", i), "target", false));
    }
    ontology = ontology.disjoint("Class0", "Outside");
    ontology
}

fn benchmark_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    for size in [8usize, 16, 32] {
        let ontology = create_test_ontology(size);
        group.bench_function(format!("chain_{}", size), |b| {
            b.iter(|| Classification::compute(black_box(&ontology)))
        });
    }
    group.finish();
}

fn benchmark_abox_conflicts(c: &mut Criterion) {
    let ontology = create_test_ontology(16);
    c.bench_function("abox_conflicts_16", |b| {
        b.iter(|| {
            let entry = CachedOntology::new(black_box(ontology.clone()));
            entry.abox_conflicts().map(|c| c.len())
        })
    });
}

criterion_group!(benches, benchmark_classification, benchmark_abox_conflicts);
criterion_main!(benches);
