#![no_main]

//! Fuzz target for concurrent container operations
//!
//! Races first access to singletons across threads and checks that each
//! name is constructed at most once and always yields the same instance.

use arbitrary::Arbitrary;
use bean_container::{ComponentDefinition, Container, HookRecord, Instance, Interception};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

const NAMES: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

#[derive(Debug)]
struct ConcurrentService {
    id: u64,
}

/// Thread operation
#[derive(Debug, Clone, Arbitrary)]
enum ThreadOp {
    GetBean(u8),
    GetTyped(u8),
    Contains(u8),
    TypeOf(u8),
    Register(u8, u64),
}

/// Concurrent test scenario
#[derive(Debug, Arbitrary)]
struct ConcurrentScenario {
    // Which names start out as prototypes
    prototype_mask: u8,
    // Which names are halted by the hook
    halt_mask: u8,
    // Number of threads (clamped to 1-8)
    thread_count: u8,
    // Operations per thread (clamped)
    ops_per_thread: Vec<ThreadOp>,
}

fn name(index: u8) -> &'static str {
    NAMES[index as usize % NAMES.len()]
}

fuzz_target!(|scenario: ConcurrentScenario| {
    let container = Container::new();
    let constructed: Arc<Vec<AtomicU32>> =
        Arc::new(NAMES.iter().map(|_| AtomicU32::new(0)).collect());

    for (index, name) in NAMES.iter().enumerate() {
        let counters = Arc::clone(&constructed);
        let definition = ComponentDefinition::of(move || {
            counters[index].fetch_add(1, Ordering::SeqCst);
            ConcurrentService { id: index as u64 }
        });
        let definition = if scenario.prototype_mask & (1 << index) != 0 {
            definition.prototype()
        } else {
            definition
        };
        container.register(name, definition).unwrap();
    }

    let halt_mask = scenario.halt_mask;
    container
        .add_hook(HookRecord::new(0).before(move |instance, name| {
            let index = NAMES.iter().position(|n| *n == name).unwrap_or(0);
            if halt_mask & (1 << index) != 0 {
                return Ok(Interception::Halt);
            }
            Ok(Interception::Proceed(instance))
        }))
        .unwrap();

    // Clamp thread count
    let thread_count = (scenario.thread_count % 8).max(1) as usize;
    let ops = scenario.ops_per_thread;

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let container = container.clone();
            let ops = ops.clone();

            thread::spawn(move || {
                let mut seen = Vec::new();
                for op in ops.into_iter().take(50) {
                    match op {
                        ThreadOp::GetBean(i) => {
                            if let Ok(instance) = container.get_bean(name(i)) {
                                seen.push((name(i), instance));
                            }
                        }
                        ThreadOp::GetTyped(i) => {
                            if let Ok(service) = container.get_named::<ConcurrentService>(name(i)) {
                                assert_eq!(NAMES[service.id as usize], name(i));
                            }
                        }
                        ThreadOp::Contains(i) => {
                            assert!(container.contains(name(i)));
                        }
                        ThreadOp::TypeOf(i) => {
                            let _ = container.type_of(name(i));
                        }
                        ThreadOp::Register(i, id) => {
                            // Duplicate names must be rejected, never replaced
                            let result = container.register(
                                name(i),
                                ComponentDefinition::of(move || ConcurrentService { id }),
                            );
                            assert!(result.is_err());
                        }
                    }
                }
                seen
            })
        })
        .collect();

    let seen: Vec<(&str, Instance)> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    for (index, name) in NAMES.iter().enumerate() {
        let singleton = scenario.prototype_mask & (1 << index) == 0;
        let halted = scenario.halt_mask & (1 << index) != 0;
        if !singleton || halted {
            continue;
        }

        // at most one construction per singleton, however the threads raced
        assert!(constructed[index].load(Ordering::SeqCst) <= 1);

        let mut instances = seen.iter().filter(|(n, _)| n == name).map(|(_, i)| i);
        if let Some(first) = instances.next() {
            assert!(instances.all(|other| Instance::ptr_eq(first, other)));
        }
    }
});
