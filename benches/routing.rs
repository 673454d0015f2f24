//! Benchmarks for routing latency with varying rule-table sizes.
//!
//! Classification runs on every proxied request and should stay well under
//! a millisecond.

use ccproxy::config::{CcproxyConfig, ConfigSnapshot};
use ccproxy::routing::{
    classify, Message, MessageContent, ModelCatalog, RequestAnalyzer, RequestDescriptor,
    RouteRequest,
};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashSet;

/// `rule_count` model-pattern rules that never match, followed by the
/// standard label rules.
fn create_snapshot(rule_count: usize) -> ConfigSnapshot {
    let mut toml = String::from("context_threshold = 60000\n");
    for i in 0..rule_count {
        toml.push_str(&format!(
            "[[rules]]\nlabel = \"default\"\ntarget_model = \"target-{i}\"\nmatch = {{ kind = \"model\", pattern = \"family-{i}-*\" }}\n"
        ));
    }
    toml.push_str(
        r#"
[[rules]]
label = "think"
target_model = "model-think"

[[rules]]
label = "large_context"
target_model = "model-large"
"#,
    );
    let config = CcproxyConfig::parse(&toml).unwrap();
    ConfigSnapshot::from_config(config, 1).unwrap()
}

/// Large-context request that has to walk the whole table.
fn bench_classify_by_rule_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let descriptor = RequestDescriptor::new("claude-sonnet").with_context_size(75_000);

    for count in [0, 5, 25, 100] {
        let snapshot = create_snapshot(count);
        group.bench_with_input(BenchmarkId::new("rules", count), &count, |b, _| {
            b.iter(|| {
                black_box(classify(
                    black_box(&descriptor),
                    &snapshot,
                    snapshot.model_catalog(),
                    Utc::now(),
                ))
            });
        });
    }

    group.finish();
}

/// Every matching rule is unavailable, so evaluation falls through to
/// passthrough.
fn bench_classify_unavailable_fallthrough(c: &mut Criterion) {
    let snapshot = create_snapshot(25);
    let catalog = ModelCatalog::new(HashSet::from([
        "model-think".to_string(),
        "model-large".to_string(),
    ]));
    let descriptor = RequestDescriptor::new("claude-sonnet")
        .with_thinking(true)
        .with_context_size(75_000);

    c.bench_function("classify_unavailable_fallthrough", |b| {
        b.iter(|| black_box(classify(&descriptor, &snapshot, &catalog, Utc::now())));
    });
}

/// Descriptor derivation with the tiktoken encoder.
fn bench_analyze_request(c: &mut Criterion) {
    let snapshot = create_snapshot(0);
    let analyzer = RequestAnalyzer::new();
    let heuristic = RequestAnalyzer::heuristic();
    let request = RouteRequest {
        model: "claude-sonnet".to_string(),
        messages: (0..20)
            .map(|i| Message {
                role: if i % 2 == 0 { "user" } else { "assistant" }.to_string(),
                content: MessageContent::Text(
                    "The quick brown fox jumps over the lazy dog. ".repeat(20),
                ),
            })
            .collect(),
        ..Default::default()
    };

    c.bench_function("analyze_20_messages_tiktoken", |b| {
        b.iter(|| black_box(analyzer.analyze(black_box(&request), &snapshot)));
    });
    c.bench_function("analyze_20_messages_heuristic", |b| {
        b.iter(|| black_box(heuristic.analyze(black_box(&request), &snapshot)));
    });
}

criterion_group!(
    benches,
    bench_classify_by_rule_count,
    bench_classify_unavailable_fallthrough,
    bench_analyze_request
);
criterion_main!(benches);
