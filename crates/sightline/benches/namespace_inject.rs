use criterion::{criterion_group, criterion_main, Criterion};
use sightline_core::{inject_namespace, MetricCategory, Scope, ScopeCatalog};
use std::hint::black_box;

fn bench_inject_nested_query(c: &mut Criterion) {
    let query = r#"sum(rate(http_requests_total{code=~"5.."}[5m])) / sum(rate(http_requests_total{}[5m]))"#;
    c.bench_function("inject_nested_query", |b| {
        b.iter(|| inject_namespace(black_box(query), black_box("team-a")));
    });
}

fn bench_namespaced_query_set(c: &mut Criterion) {
    let catalog = ScopeCatalog::standard();
    let scope = Scope::namespaced("team-a").unwrap();
    let category = MetricCategory::new("Workloads & Pods");

    c.bench_function("namespaced_query_set", |b| {
        b.iter(|| {
            catalog
                .lookup(black_box(&category), &scope)
                .map(|set| set.with_namespace("team-a"))
        });
    });
}

criterion_group!(benches, bench_inject_nested_query, bench_namespaced_query_set);
criterion_main!(benches);
