//! Benchmarks for the bean container

use bean_container::{
    ComponentDefinition, Container, FnFactory, HookRecord, Interception, ProxyFactory, TypeKey,
    Value, forward_interface,
};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

#[allow(dead_code)]
#[derive(Default)]
struct SmallService {
    value: i32,
}

#[allow(dead_code)]
struct MediumService {
    name: String,
    values: Vec<i32>,
}

pub trait Fetcher: Send + Sync {
    fn query(&self) -> String;
}

forward_interface!(Fetcher {
    fn query(&self) -> String;
});

fn handler(method: &str, _args: Vec<Value>) -> Value {
    Box::new(method.to_string())
}

fn medium() -> MediumService {
    MediumService {
        name: "test".to_string(),
        values: vec![1, 2, 3, 4, 5],
    }
}

fn with_hooks(container: &Container, count: i32) {
    for priority in 0..count {
        container
            .add_hook(
                HookRecord::new(priority)
                    .before(|instance, _| Ok(Interception::Proceed(instance)))
                    .after(|instance, _| Ok(Interception::Proceed(instance))),
            )
            .unwrap();
    }
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    group.bench_function("definition_small", |b| {
        b.iter(|| {
            let container = Container::new();
            container
                .register("small", ComponentDefinition::default_of::<SmallService>())
                .unwrap();
            black_box(container)
        })
    });

    group.bench_function("definition_with_factory", |b| {
        b.iter(|| {
            let container = Container::new();
            container
                .register("fetcher", ComponentDefinition::declared::<dyn Fetcher>())
                .unwrap();
            container
                .attach_factory("fetcher", Arc::new(ProxyFactory::<dyn Fetcher>::new(handler)))
                .unwrap();
            black_box(container)
        })
    });

    group.bench_function("hooks_8", |b| {
        b.iter(|| {
            let container = Container::new();
            with_hooks(&container, 8);
            black_box(container)
        })
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = Container::new();
    container
        .register("small", ComponentDefinition::default_of::<SmallService>())
        .unwrap();
    container
        .register("medium", ComponentDefinition::of(medium))
        .unwrap();
    container.preinstantiate_singletons().unwrap();

    group.bench_function("get_bean_cached", |b| {
        b.iter(|| black_box(container.get_bean("small").unwrap()))
    });

    group.bench_function("get_named_typed", |b| {
        b.iter(|| black_box(container.get_named::<MediumService>("medium").unwrap()))
    });

    group.bench_function("get_by_type", |b| {
        b.iter(|| black_box(container.get::<SmallService>().unwrap()))
    });

    group.bench_function("contains_check", |b| {
        b.iter(|| black_box(container.contains("small")))
    });

    group.bench_function("get_bean_not_found", |b| {
        b.iter(|| black_box(container.get_bean("missing").is_err()))
    });

    group.bench_function("type_of", |b| {
        b.iter(|| black_box(container.type_of("medium").unwrap() == TypeKey::of::<MediumService>()))
    });

    group.finish();
}

fn bench_prototype_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("prototype");
    group.throughput(Throughput::Elements(1));

    let container = Container::new();
    container
        .register("bare", ComponentDefinition::default_of::<SmallService>().prototype())
        .unwrap();
    container
        .register_factory(
            "produced",
            Arc::new(FnFactory::prototype(|| Ok(Arc::new(SmallService { value: 7 })))),
        )
        .unwrap();
    container
        .register_factory(
            "fetcher",
            Arc::new(ProxyFactory::<dyn Fetcher>::new(handler).prototype()),
        )
        .unwrap();

    group.bench_function("construct_no_hooks", |b| {
        b.iter(|| black_box(container.get_bean("bare").unwrap()))
    });

    group.bench_function("factory_produce", |b| {
        b.iter(|| black_box(container.get_bean("produced").unwrap()))
    });

    group.bench_function("stand_in_produce_and_call", |b| {
        b.iter(|| {
            let fetcher = container.get_named::<dyn Fetcher>("fetcher").unwrap();
            black_box(fetcher.query())
        })
    });

    let hooked = Container::new();
    hooked
        .register("bare", ComponentDefinition::default_of::<SmallService>().prototype())
        .unwrap();
    with_hooks(&hooked, 8);

    group.bench_function("construct_8_hooks", |b| {
        b.iter(|| black_box(hooked.get_bean("bare").unwrap()))
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");

    group.bench_function("concurrent_reads_4", |b| {
        let container = Container::new();
        container
            .register("small", ComponentDefinition::default_of::<SmallService>())
            .unwrap();

        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let c = container.clone();
                    thread::spawn(move || {
                        for _ in 0..100 {
                            let _ = c.get_bean("small").unwrap();
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
        })
    });

    group.bench_function("first_access_race_4", |b| {
        b.iter(|| {
            let container = Container::new();
            container
                .register("medium", ComponentDefinition::of(medium))
                .unwrap();

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let c = container.clone();
                    thread::spawn(move || c.get_bean("medium").unwrap())
                })
                .collect();

            for h in handles {
                black_box(h.join().unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_registration,
    bench_resolution,
    bench_prototype_resolution,
    bench_concurrent,
);

criterion_main!(benches);
