use std::time::Duration;

use abathur_kernel::services::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

fn bench_allow_closed(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig {
        failure_threshold: 5,
        open_timeout: Duration::from_secs(30),
        half_open_success_threshold: 2,
    });

    c.bench_function("circuit_breaker_allow_closed", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(registry.allow("test-executor", "run-suite").await);
        });
    });
}

fn bench_record_success_failure_cycle(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig {
        failure_threshold: 5,
        open_timeout: Duration::from_secs(30),
        half_open_success_threshold: 2,
    });

    c.bench_function("circuit_breaker_success_then_failure", |b| {
        b.to_async(&rt).iter(|| async {
            registry.record_success("test-generator", "write-spec").await;
            registry.record_failure("test-generator", "write-spec").await;
        });
    });
}

criterion_group!(benches, bench_allow_closed, bench_record_success_failure_cycle);
criterion_main!(benches);
