//! Example: registering an interface that has no implementation
//!
//! A bootstrap supplier registers a concrete DAO with an init callback, and
//! an interface backed by a prototype `ProxyFactory`. Two hooks observe the
//! DAO's initialization in priority order.
//!
//! ```bash
//! cargo run --example proxy
//! ```

use bean_container::prelude::*;

struct IndexDao;

impl IndexDao {
    fn new() -> Self {
        println!("Constructor");
        IndexDao
    }

    fn query(&self) {
        println!("query");
    }
}

pub trait ImportTestDao: Send + Sync {
    fn query(&self);
    fn find(&self, id: u64) -> String;
}

forward_interface!(ImportTestDao {
    fn query(&self);
    fn find(&self, id: u64) -> String;
});

fn proxy_handler(method: &str, args: Vec<Value>) -> Value {
    println!("proxy -> {method} ({} args)", args.len());
    match method {
        "find" => {
            let id = args
                .into_iter()
                .next()
                .and_then(|arg| arg.downcast::<u64>().ok())
                .map_or(0, |id| *id);
            Box::new(format!("row-{id}"))
        }
        _ => Box::new(()),
    }
}

/// Supplies every definition the demo needs
struct AppDefinitions;

impl DefinitionSupplier for AppDefinitions {
    fn supply(&self, container: &Container) -> Result<()> {
        container.register(
            "indexDao",
            ComponentDefinition::of(IndexDao::new).with_init(|_: &IndexDao| {
                println!("init");
                Ok(())
            }),
        )?;

        container.register("importTestDao", ComponentDefinition::declared::<dyn ImportTestDao>())?;
        container.attach_factory(
            "importTestDao",
            Arc::new(ProxyFactory::<dyn ImportTestDao>::new(proxy_handler).prototype()),
        )?;

        for priority in [15, 11] {
            container.add_hook(
                HookRecord::new(priority)
                    .before(move |instance, name| {
                        if name == "indexDao" {
                            println!("[{priority}] before initialization + {name}");
                        }
                        Ok(Interception::Proceed(instance))
                    })
                    .after(move |instance, name| {
                        if name == "indexDao" {
                            println!("[{priority}] after initialization + {name}");
                        }
                        Ok(Interception::Proceed(instance))
                    }),
            )?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    #[cfg(feature = "logging-pretty")]
    bean_container::logging::init_container_only();

    let container = Container::new();
    container.import(AppDefinitions)?;
    container.lock();

    let dao: Arc<IndexDao> = container.get_named("indexDao")?;
    dao.query();

    println!(
        "importTestDao exposes {} without being built",
        container.type_of("importTestDao")?.name()
    );

    let first = container.get_named::<dyn ImportTestDao>("importTestDao")?;
    first.query();
    println!("{}", first.find(42));

    let second = container.get::<dyn ImportTestDao>()?;
    println!("distinct stand-ins: {}", !Arc::ptr_eq(&first, &second));

    Ok(())
}
