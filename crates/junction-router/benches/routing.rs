//! Routing benchmarks.
//!
//! Run with: `cargo bench -p junction-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use junction_router::{PathNormalizer, RouteTable, VerbSelector};

fn build_table(num_routes: usize) -> RouteTable<String> {
    let mut table = RouteTable::new();

    for i in 0..num_routes / 3 {
        table
            .insert(Method::GET.into(), &format!("/api/v1/resource{i}"), format!("list{i}"))
            .unwrap();
    }

    for i in 0..num_routes / 3 {
        table
            .insert(
                Method::GET.into(),
                &format!("/api/v1/resource{i}/:id@\\d+"),
                format!("show{i}"),
            )
            .unwrap();
    }

    for i in 0..num_routes / 3 {
        table
            .insert(
                Method::GET.into(),
                &format!("/api/v1/org/:org/resource{i}/:id"),
                format!("org{i}"),
            )
            .unwrap();
    }

    table
        .insert(VerbSelector::Any, "/health", "health".to_string())
        .unwrap();

    table
}

fn bench_static_match(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(table.lookup(&Method::GET, "api/v1/resource20").is_some()));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(table.lookup(&Method::GET, "api/v1/resource25/12345").is_some()));
    });
}

fn bench_wildcard_fallback(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("wildcard_fallback", |b| {
        b.iter(|| black_box(table.lookup(&Method::DELETE, "health").is_some()));
    });
}

fn bench_miss(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(table.lookup(&Method::GET, "api/v1/nonexistent/path").is_none()));
    });
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = PathNormalizer::new()
        .with_base_url("https://example.com/app")
        .unwrap()
        .with_entry_stub("index.php");

    c.bench_function("normalize", |b| {
        b.iter(|| black_box(normalizer.normalize("/app/index.php/api/v1/caf%C3%A9/7?x=1")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [12, 48, 99, 498, 999] {
        let table = build_table(num_routes);

        group.bench_with_input(
            BenchmarkId::new("param_match_last", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("api/v1/resource{}/12345", n / 3 - 1);
                b.iter(|| black_box(table.lookup(&Method::GET, &path).is_some()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_param_match,
    bench_wildcard_fallback,
    bench_miss,
    bench_normalize,
    bench_scaling
);
criterion_main!(benches);
