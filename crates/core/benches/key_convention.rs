use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

use resto_core::serializer::{CamelCaseJsonSerializer, JsonSerializer, Serializer, camelize};

/// A list of `n` user records, each with a nested address and tag list.
fn payload(n: usize) -> Value {
    let users: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "user_id": i,
                "first_name": "Ann",
                "last_name": "Lee",
                "home_address": {"street_name": "Main", "zip_code": "12345"},
                "tag_list": [{"tag_name": "a"}, {"tag_name": "b"}],
            })
        })
        .collect();
    json!({"meta": {"status": 200}, "response": {"user_list": users}})
}

fn bench_camelize(c: &mut Criterion) {
    let mut group = c.benchmark_group("camelize");
    for n in [10usize, 100, 1_000] {
        let data = payload(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| camelize(black_box(data)))
        });
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let data = payload(100);
    group.bench_function("plain", |b| b.iter(|| JsonSerializer.encode(black_box(&data))));
    group.bench_function("camel_case", |b| {
        b.iter(|| CamelCaseJsonSerializer.encode(black_box(&data)))
    });
    group.finish();
}

criterion_group!(benches, bench_camelize, bench_encode);
criterion_main!(benches);
