use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use querymap::{Composite, Query, cond, expr, table};

/// A query filtering on `n` columns, alternating AND/OR:
/// SELECT author.* FROM authors AS author WHERE author.col0 = ? OR author.col1 > ? ...
fn build_query(n: usize) -> Query {
    let mut query = table(("authors", "author"));
    for i in 0..n {
        let column = format!("col{i}");
        query = if i % 2 == 0 {
            query.filter(cond! { column => i as i64 })
        } else {
            query.filter_any(cond! { column => expr::gt(i as i64) })
        };
    }
    query
}

fn bench_to_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/to_select");

    for n in [1, 5, 10, 50, 100] {
        let query = build_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| black_box(query.to_select()));
        });
    }

    group.finish();
}

fn bench_build_and_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/build_and_compile");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_query(n).to_select()));
        });
    }

    group.finish();
}

fn bench_nested_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/nested_composite");

    for depth in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut inner = expr::any(cond! { "id" => vec![1_i64, 2, 3] });
                for _ in 0..depth {
                    let mut outer = Composite::new();
                    outer.all(cond! { "name" => "x" }).any(expr::not(inner));
                    inner = outer;
                }
                inner.set_alias("author");
                black_box(inner.compile())
            });
        });
    }

    group.finish();
}

fn bench_bind_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/bind_expansion");

    for n in [5, 20, 100, 500] {
        let ids: Vec<i64> = (0..n).collect();
        let stmt = table("authors")
            .filter(ids)
            .filter(cond! { "name" => "it's" })
            .to_select()
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(querymap::postgres::bind::expand(&stmt.sql, &stmt.params)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_to_select,
    bench_build_and_compile,
    bench_nested_composite,
    bench_bind_expansion
);
criterion_main!(benches);
