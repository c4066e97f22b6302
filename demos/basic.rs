//! Basic example of the wireup container.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wireup::prelude::*;

// === Define your types ===

#[derive(Default)]
struct ConsoleLogger {
    prefix: String,
    lines: AtomicUsize,
}

impl ConsoleLogger {
    fn log(&self, msg: &str) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        println!("{} {msg}", self.prefix);
    }
}

struct Database {
    url: String,
    logger: Arc<ConsoleLogger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct UserService {
    db: Arc<Database>,
    logger: Arc<ConsoleLogger>,
    page_size: i64,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id} (page size {})", self.page_size));
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

// === Describe them to the container ===

fn catalog() -> Catalog {
    Catalog::new()
        .with(TypeDescriptor::interface("LoggerInterface"))
        .with(
            TypeDescriptor::of::<ConsoleLogger>()
                .implements("LoggerInterface")
                .default_constructor()
                .property("prefix", Some("string"), |logger: &mut ConsoleLogger, v| {
                    logger.prefix = v.to_string_value()?;
                    Ok(())
                })
                .build(),
        )
        .with(
            TypeDescriptor::of::<Database>()
                .constructor(
                    vec![
                        Parameter::typed("url", "string"),
                        Parameter::typed("logger", "LoggerInterface"),
                    ],
                    |args| {
                        Ok(Database {
                            url: args.string(0)?,
                            logger: args.instance(1)?,
                        })
                    },
                )
                .build(),
        )
        .with(
            TypeDescriptor::of::<UserService>()
                .constructor(
                    vec![
                        Parameter::typed("db", "Database"),
                        Parameter::typed("logger", "LoggerInterface"),
                        Parameter::typed("pageSize", "int").with_default(20),
                    ],
                    |args| {
                        Ok(UserService {
                            db: args.instance(0)?,
                            logger: args.instance(1)?,
                            page_size: args.int(2)?,
                        })
                    },
                )
                .build(),
        )
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt().with_env_filter("wireup=debug").init();

    let config = [
        (
            "LoggerInterface",
            Value::map([
                ("class", Value::from("ConsoleLogger")),
                ("$prefix", Value::from("[LOG]")),
            ]),
        ),
        (
            "Database",
            Value::map([
                ("class", Value::from("Database")),
                (
                    "constructorArgs",
                    // Resolved on first use, with access to the container
                    Value::Array(vec![Value::lazy(|c| {
                        let strict = if c.is_strict() { "strict" } else { "lenient" };
                        Ok(Value::from(format!("postgres://localhost/myapp?mode={strict}")))
                    })]),
                ),
            ]),
        ),
        ("users", Value::from("UserService")),
    ];

    let container = Container::with_options(config, catalog(), ContainerOptions::strict());

    // Database and logger are auto-wired from declared parameter types
    let users = container.get_as::<UserService>("users")?;
    println!("{}", users.get_user(42));

    // Singletons: same instance every time
    let again = container.get_as::<UserService>("users")?;
    println!("Same instance: {}", Arc::ptr_eq(&users, &again));
    println!("Shared logger: {}", Arc::ptr_eq(&users.logger, &users.db.logger));
    println!("Log lines written: {}", users.logger.lines.load(Ordering::Relaxed));

    // Misspelled identifiers come back with suggestions
    if let Err(err) = container.get("user") {
        println!("\n{err}");
    }

    println!("\n{container:?}");
    Ok(())
}
