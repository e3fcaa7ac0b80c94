//! This bench test enumerates and simplifies requirement trees built over a
//! synthetic catalogue of a few dozen courses.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use prereq::{Catalogue, Expression, Requirement, storage::CatalogueEntry};
use serde_json::json;

/// Generates a catalogue of four institutes with ten courses each
fn catalogue() -> Catalogue {
    let entries = ["mat", "stk", "fys", "inf"].into_iter().flat_map(|institute| {
        (0..10).map(move |i| {
            let code = format!("{}{}", institute.to_uppercase(), 1000 + i * 10);
            CatalogueEntry::new(code.parse().unwrap(), String::new(), "mn", institute)
        })
    });
    Catalogue::from_entries(entries).unwrap()
}

fn requirement(catalogue: &Catalogue) -> Requirement {
    Expression::from_value(&json!({
        "relationship": "and",
        "children": [
            {"institute": ["mat"], "quantity": 3},
            {
                "relationship": "or",
                "children": [
                    {"institute": ["stk"], "quantity": 2},
                    {"search": ["FYS10.0"], "quantity": 1},
                ]
            },
            {"coursecode": ["INF1000", "INF1010"]},
        ]
    }))
    .unwrap()
    .resolve(catalogue)
    .unwrap()
}

fn enumerate(c: &mut Criterion) {
    let catalogue = catalogue();
    let requirement = requirement(&catalogue);

    c.bench_function("enumerate combinations", |b| {
        b.iter(|| requirement.combinations());
    });
}

fn simplify(c: &mut Criterion) {
    let catalogue = catalogue();
    let requirement = requirement(&catalogue);

    c.bench_function("simplify", |b| {
        b.iter_batched(
            || requirement.clone(),
            Requirement::simplified,
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, enumerate, simplify);
criterion_main!(benches);
