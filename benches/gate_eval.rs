use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gantry_rs::{
    evaluate_instance, evaluate_request, GateBuilder, InstanceDescriptor, PolicyConfiguration,
    RequestDescriptor,
};

/// Policy shaped like a real deployment: a handful of identities and patterns
fn deployment_policy() -> PolicyConfiguration {
    PolicyConfiguration::from_json(
        r#"{
            "privileged_identities": ["admin", "uploader", "pacs-bridge"],
            "readonly_exception_paths": [
                "/tools/find",
                "/tools/lookup",
                "/studies/*/metadata",
                "/exports/**"
            ]
        }"#,
    )
    .unwrap()
}

/// Benchmark the pure request filter (no cache)
fn bench_request_eval(c: &mut Criterion) {
    let eval_counts = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("request_eval");

    for count in eval_counts {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let policy = deployment_policy();
            let request = RequestDescriptor::new("POST", "/instances", "10.0.0.1", "uploader");

            b.iter(|| {
                for _ in 0..count {
                    let decision = evaluate_request(&request, &policy);
                    black_box(decision.allow);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark the gate facade with the decision cache (hot path)
fn bench_request_eval_cached(c: &mut Criterion) {
    let eval_counts = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("request_eval_cached");

    for count in eval_counts {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let gate = GateBuilder::new()
                .policy(deployment_policy())
                .with_decision_cache(1024)
                .build()
                .unwrap();
            let request = RequestDescriptor::new("POST", "/instances", "10.0.0.1", "uploader");

            b.iter(|| {
                for _ in 0..count {
                    let decision = gate.evaluate_request(&request);
                    black_box(decision.allow);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark the worst-case pattern walk (deep URI against every pattern)
fn bench_exception_pattern_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("exception_pattern_walk");
    group.throughput(Throughput::Elements(1));

    group.bench_function("deep_uri", |b| {
        let policy = deployment_policy();
        let request = RequestDescriptor::new(
            "POST",
            "/exports/site-a/2026/08/study-4711/series-3/instance-9.json",
            "10.0.0.1",
            "guest",
        );

        b.iter(|| {
            let decision = evaluate_request(&request, &policy);
            black_box(decision.allow);
        });
    });

    group.finish();
}

/// Benchmark instance admission
fn bench_instance_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("instance_eval");
    group.throughput(Throughput::Elements(1));

    group.bench_function("admit", |b| {
        let policy = deployment_policy();
        let instance = InstanceDescriptor::new("dicom-web")
            .with_tag("PatientIdentityRemoved", "YES")
            .with_tag("Modality", "OT");

        b.iter(|| {
            let decision = evaluate_instance(&instance, &policy);
            black_box(decision.allow);
        });
    });

    group.bench_function("reject", |b| {
        let policy = deployment_policy();
        let instance = InstanceDescriptor::new("dicom-web").with_tag("Modality", "CT");

        b.iter(|| {
            let decision = evaluate_instance(&instance, &policy);
            black_box(decision.allow);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_request_eval,
    bench_request_eval_cached,
    bench_exception_pattern_walk,
    bench_instance_eval
);
criterion_main!(benches);
