//! Criterion benchmarks for Quiver.
//!
//! Covers:
//! - Document ingestion into text and tag fields
//! - Token, prefix and boolean query compilation plus iteration
//! - Tag prefix expansion over many distinct values

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quiver::prelude::*;
use std::hint::black_box;

const WORDS: &[&str] = &[
    "search", "engine", "full", "text", "index", "query", "document", "field", "term", "phrase",
    "boolean", "posting", "prefix", "tag", "numeric", "geo", "schema", "iterator", "union",
    "intersect",
];

fn generate_bodies(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            (0..8)
                .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn build_index(count: usize) -> Index {
    let index = Index::create("bench", IndexConfig::default()).unwrap();
    index.create_text_field("body").unwrap();
    index.create_tag_field("tags").unwrap();
    for (i, body) in generate_bodies(count).into_iter().enumerate() {
        index
            .add_document(
                Document::new(format!("doc{i}"), 1.0)
                    .add_text("body", body)
                    .add_text("tags", format!("tag-{i},group-{}", i % 10)),
            )
            .unwrap();
    }
    index
}

fn drain(index: &Index, query: &QueryNode) -> usize {
    match index.search(query).unwrap() {
        Some(mut results) => {
            let mut n = 0;
            while results.next_id().unwrap().is_some() {
                n += 1;
            }
            n
        }
        None => 0,
    }
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");
    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| black_box(build_index(count)));
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let index = build_index(10_000);
    let mut group = c.benchmark_group("query");

    let token = QueryNode::token("body", "index");
    group.bench_function("token", |b| b.iter(|| black_box(drain(&index, &token))));

    let prefix = QueryNode::prefix("body", "in");
    group.bench_function("prefix", |b| b.iter(|| black_box(drain(&index, &prefix))));

    let intersect = QueryNode::intersect(vec![
        QueryNode::token("body", "search"),
        QueryNode::token("body", "engine"),
        QueryNode::not(QueryNode::token("body", "geo")),
    ]);
    group.bench_function("intersect_not", |b| b.iter(|| black_box(drain(&index, &intersect))));

    let union = QueryNode::union(WORDS.iter().take(5).map(|w| QueryNode::token("body", *w)).collect());
    group.bench_function("union", |b| b.iter(|| black_box(drain(&index, &union))));

    let tag_prefix = QueryNode::tag("tags", vec![QueryNode::prefix_any("tag-")]);
    group.bench_function("tag_prefix", |b| b.iter(|| black_box(drain(&index, &tag_prefix))));

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_queries);
criterion_main!(benches);
