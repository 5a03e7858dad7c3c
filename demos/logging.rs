//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use bean_container::{ComponentDefinition, Container, FnFactory, HookRecord, Interception};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct AuditLog {
    entries: Vec<String>,
}

fn main() {
    // Trace-level so resolution state changes show up
    bean_container::logging::builder().trace().pretty().init();

    println!("=== Bean Container Logging Demo ===\n");

    // logs: "Creating new bean container"
    let container = Container::new();

    // logs: "Registering component definition"
    container
        .register(
            "database",
            ComponentDefinition::of(|| Database {
                url: "postgres://localhost/mydb".into(),
            }),
        )
        .unwrap();
    container
        .register(
            "auditLog",
            ComponentDefinition::of(|| AuditLog {
                entries: Vec::new(),
            })
            .prototype(),
        )
        .unwrap();

    // logs: "Registering component definition" for the factory-backed clock
    container
        .register_factory(
            "clock",
            Arc::new(FnFactory::singleton(|| Ok(Arc::new(1_700_000_000u64)))),
        )
        .unwrap();

    // logs: "Adding lifecycle hook"
    container
        .add_hook(HookRecord::new(10).before(|instance, name| {
            if name == "auditLog" {
                // logs: "Hook halted the chain"
                return Ok(Interception::Halt);
            }
            Ok(Interception::Proceed(instance))
        }))
        .unwrap();

    // logs: "Container locked - registration closed"
    container.lock();

    // logs: Constructing -> Populated -> PreInit -> PostInit -> Ready
    let _db = container.get_bean("database").unwrap();

    // logs: "Singleton resolved from cache"
    let _db_again = container.get_bean("database").unwrap();

    // logs: FactoryInvoked -> Ready
    let _clock = container.get::<u64>().unwrap();

    let halted = container.get_bean("auditLog").unwrap_err();
    println!("auditLog: {halted}");

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
