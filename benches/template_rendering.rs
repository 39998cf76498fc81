//! Benchmarks for dynamic template rendering.

use batis::core::placeholder::PlaceholderStyle;
use batis::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde::Serialize;
use std::hint::black_box;

#[derive(Serialize)]
struct Filter {
    name: Option<&'static str>,
    role: Option<&'static str>,
    age: Option<i64>,
}

#[derive(Serialize)]
struct Row {
    name: String,
    age: i64,
}

const WHERE_CHAIN: &str = r#"SELECT id, name FROM user {{where .name "" "name = " (arg .name) "" | where .role "AND" "role = " (arg .role) | where .age "AND" "age > " (arg .age)}}"#;

const BULK_INSERT: &str = "INSERT INTO user (name, age) VALUES {{range $i, $r := .}}{{if $i}}, {{end}}({{arg $r.name}}, {{arg $r.age}}){{end}}";

fn bench_where_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("where_chain");
    let parser = TemplateParser::compile(WHERE_CHAIN).unwrap();

    let full = params![Filter {
        name: Some("ann"),
        role: Some("admin"),
        age: Some(30),
    }]
    .unwrap();
    group.bench_function("all_conditions", |b| {
        b.iter(|| parser.render(&PlaceholderStyle::Dollar, black_box(&full)))
    });

    let sparse = params![Filter {
        name: Some("ann"),
        role: None,
        age: None,
    }]
    .unwrap();
    group.bench_function("one_condition", |b| {
        b.iter(|| parser.render(&PlaceholderStyle::Dollar, black_box(&sparse)))
    });

    group.finish();
}

fn bench_bulk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_insert");
    let parser = TemplateParser::compile(BULK_INSERT).unwrap();

    for rows in [10usize, 100, 1000] {
        let data: Vec<Row> = (0..rows)
            .map(|i| Row {
                name: format!("user{}", i),
                age: i as i64,
            })
            .collect();
        let params = params![data].unwrap();

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &params, |b, params| {
            b.iter(|| parser.render(&PlaceholderStyle::Question, black_box(params)))
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_compile");

    group.bench_function("where_chain", |b| {
        b.iter(|| TemplateParser::compile(black_box(WHERE_CHAIN)))
    });
    group.bench_function("bulk_insert", |b| {
        b.iter(|| TemplateParser::compile(black_box(BULK_INSERT)))
    });

    group.finish();
}

criterion_group!(benches, bench_where_chain, bench_bulk_insert, bench_compile);
criterion_main!(benches);
