use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use safesql::{Statement, Value, expand, values};

/// Build a statement with `n` fragments, every fourth one opening a nested OR group:
/// c0 = ? AND c1 = ? AND c2 = ? AND (c3 = ? OR c4 IN (?, ?, ?)) ...
fn build_statement(n: usize) -> Statement {
    let mut stmt = Statement::open();
    let mut depth = 0;
    for i in 0..n {
        if i % 4 == 3 {
            stmt.and_group();
            depth += 1;
        }
        if i % 4 == 0 && i > 0 {
            stmt.or_in(&format!("c{i} IN (?*)"), values![1, 2, 3])
                .expect("append IN list");
        } else {
            stmt.and_with(format!("c{i} = ?"), values![i as i64])
                .expect("append fragment");
        }
    }
    for _ in 0..depth {
        stmt.end_group().expect("close group");
    }
    stmt
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/compile");

    for n in [1, 5, 10, 50, 100] {
        let stmt = build_statement(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(stmt.compile()));
        });
    }

    group.finish();
}

fn bench_build_and_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/build_and_compile");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let stmt = build_statement(n);
                black_box(stmt.compile());
            });
        });
    }

    group.finish();
}

fn bench_expand_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask/expand");

    for n in [1, 10, 100, 1000] {
        let list: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &list, |b, list| {
            b.iter(|| {
                let args = vec![Value::from(list.clone()), Value::from("active")];
                black_box(expand("SELECT * FROM t WHERE id IN (?*) AND status = ?", args))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_build_and_compile, bench_expand_mask);
criterion_main!(benches);
