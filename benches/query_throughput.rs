//! Query engine micro-benchmarks
//!
//! Measures compilation and evaluation cost for common expression shapes over a
//! generated catalogue document.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use sift::{JsonPath, ResultOptions};
use std::hint::black_box;

/// A store with `n` books spread over a handful of categories.
fn catalogue(n: usize) -> Value {
    let categories = ["reference", "fiction", "poetry", "history"];
    let books: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "category": categories[i % categories.len()],
                "author": format!("Author {i}"),
                "title": format!("Title {i}"),
                "price": (i % 50) as f64 + 0.99,
                "tags": ["paper", "new"]
            })
        })
        .collect();
    json!({"store": {"book": books, "bicycle": {"color": "red", "price": 19.95}}})
}

const EXPRESSIONS: &[(&str, &str)] = &[
    ("member_chain", "$.store.book[*].title"),
    ("recursive_descent", "$..price"),
    ("filter", "$.store.book[?(@.price < 10 && @.category == 'fiction')]"),
    ("function_filter", "$.store.book[?(@.price > avg($.store.book[*].price))].title"),
    ("regex_filter", "$.store.book[?(@.author =~ /Author 1\\d*/)]"),
    ("slice", "$.store.book[1:-1:3]"),
];

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for (name, expr) in EXPRESSIONS {
        group.bench_with_input(BenchmarkId::from_parameter(name), expr, |b, expr| {
            b.iter(|| JsonPath::<Value>::compile(black_box(expr)))
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for size in [100, 1_000] {
        let doc = catalogue(size);
        group.throughput(Throughput::Elements(size as u64));
        for (name, expr) in EXPRESSIONS {
            let Ok(path) = JsonPath::<Value>::compile(expr) else {
                continue;
            };
            group.bench_with_input(BenchmarkId::new(*name, size), &doc, |b, doc| {
                b.iter(|| path.evaluate(black_box(doc), ResultOptions::NONE))
            });
        }
    }
    group.finish();
}

fn bench_options(c: &mut Criterion) {
    let doc = catalogue(1_000);
    let Ok(path) = JsonPath::<Value>::compile("$..*") else {
        return;
    };
    let mut group = c.benchmark_group("result_options");
    for (name, options) in [
        ("none", ResultOptions::NONE),
        ("path", ResultOptions::PATH),
        ("nodups_sort", ResultOptions::NODUPS | ResultOptions::SORT),
    ] {
        group.bench_function(name, |b| b.iter(|| path.evaluate(black_box(&doc), options)));
    }
    group.finish();
}

fn bench_replace(c: &mut Criterion) {
    let doc = catalogue(1_000);
    let Ok(path) = JsonPath::<Value>::compile("$..price") else {
        return;
    };
    c.bench_function("replace_prices", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut doc| path.replace(&mut doc, json!(0)),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_compile, bench_evaluate, bench_options, bench_replace);
criterion_main!(benches);
