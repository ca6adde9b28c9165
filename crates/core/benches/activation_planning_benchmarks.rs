//! Performance benchmarks for capability binding and activation planning
//!
//! Planning runs once per process start, but large plugin sets can declare
//! thousands of components, so it has to scale roughly linearly.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fairy_core::bootstrap::ActivationPlanner;
use fairy_core::components::ComponentDescriptor;
use fairy_core::platform::{PlatformRegistry, PlatformTag};

/// Linear chain: component i depends on the capability of component i - 1
fn chain(size: usize) -> Vec<ComponentDescriptor> {
    (0..size)
        .map(|i| {
            let descriptor = ComponentDescriptor::new(format!("component{}", i))
                .with_capability(format!("svc:{}", i))
                .with_order((size - i) as i32);
            if i == 0 {
                descriptor
            } else {
                descriptor.with_dependency(format!("svc:{}", i - 1))
            }
        })
        .collect()
}

/// Wide graph: every component depends on a small shared base layer
fn fan_out(size: usize) -> Vec<ComponentDescriptor> {
    let base = 8.min(size);
    (0..size)
        .map(|i| {
            let descriptor = ComponentDescriptor::new(format!("component{}", i))
                .with_capability(format!("svc:{}", i))
                .with_order((i % 7) as i32);
            if i < base {
                descriptor
            } else {
                descriptor.with_dependency(format!("svc:{}", i % base))
            }
        })
        .collect()
}

fn benchmark_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("activation_planning");
    let registry = PlatformRegistry::default();
    let planner = ActivationPlanner::new();

    for size in [10usize, 100, 1000, 5000] {
        let chain = registry.bind(&PlatformTag::Application, chain(size)).unwrap();
        group.bench_with_input(BenchmarkId::new("linear_chain", size), &chain, |b, bindings| {
            b.iter(|| planner.plan(black_box(bindings)).unwrap())
        });

        let wide = registry.bind(&PlatformTag::Application, fan_out(size)).unwrap();
        group.bench_with_input(BenchmarkId::new("fan_out", size), &wide, |b, bindings| {
            b.iter(|| planner.plan(black_box(bindings)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("capability_binding");
    let registry = PlatformRegistry::default();

    for size in [100usize, 1000, 5000] {
        let descriptors = fan_out(size);
        group.bench_with_input(BenchmarkId::new("fan_out", size), &descriptors, |b, descriptors| {
            b.iter(|| {
                registry
                    .bind(&PlatformTag::Application, black_box(descriptors.clone()))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_planning, benchmark_binding);
criterion_main!(benches);
