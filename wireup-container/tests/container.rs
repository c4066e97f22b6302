//! End-to-end resolution behaviour of the container.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use wireup_container::error::{MemberKind, NotFoundReason};
use wireup_container::prelude::*;

// === Fixtures ===

#[derive(Default)]
struct ClassA;

#[derive(Default)]
struct ClassB {
    count: i64,
}

struct ClassC {
    a: Arc<ClassA>,
}

struct ClassX;

struct ClassY;

#[derive(Default)]
struct FileLogger;

struct Service {
    logger: Arc<FileLogger>,
    fallback: Option<Arc<FileLogger>>,
}

struct Mailer {
    host: String,
    port: i64,
}

struct Node {
    peer: Option<Arc<Node>>,
}

struct Pair;

struct Counted;

fn catalog() -> Catalog {
    Catalog::new()
        .with(TypeDescriptor::of::<ClassA>().default_constructor().build())
        .with(
            TypeDescriptor::of::<ClassB>()
                .default_constructor()
                .property("count", Some("int"), |b: &mut ClassB, v| {
                    b.count = v.to_int()?;
                    Ok(())
                })
                .build(),
        )
        .with(
            TypeDescriptor::of::<ClassC>()
                .constructor(vec![Parameter::typed("a", "ClassA")], |args| {
                    Ok(ClassC { a: args.instance(0)? })
                })
                .build(),
        )
        .with(
            TypeDescriptor::of::<ClassX>()
                .constructor(vec![Parameter::typed("y", "ClassY")], |args| {
                    args.instance::<ClassY>(0)?;
                    Ok(ClassX)
                })
                .build(),
        )
        .with(
            TypeDescriptor::of::<ClassY>()
                .constructor(vec![Parameter::typed("x", "ClassX")], |args| {
                    args.instance::<ClassX>(0)?;
                    Ok(ClassY)
                })
                .build(),
        )
        .with(TypeDescriptor::interface("LoggerInterface"))
        .with(
            TypeDescriptor::of::<FileLogger>()
                .implements("LoggerInterface")
                .default_constructor()
                .build(),
        )
        .with(
            TypeDescriptor::of::<Service>()
                .constructor(vec![Parameter::typed("logger", "LoggerInterface")], |args| {
                    Ok(Service {
                        logger: args.instance(0)?,
                        fallback: None,
                    })
                })
                .method(
                    "setFallback",
                    vec![Parameter::typed("logger", "LoggerInterface")],
                    |s: &mut Service, args| {
                        s.fallback = Some(args.instance(0)?);
                        Ok(())
                    },
                )
                .build(),
        )
        .with(
            TypeDescriptor::of::<Mailer>()
                .constructor(
                    vec![
                        Parameter::typed("host", "string").with_default("localhost"),
                        Parameter::typed("port", "int").with_default(25),
                    ],
                    |args| {
                        Ok(Mailer {
                            host: args.string(0)?,
                            port: args.int(1)?,
                        })
                    },
                )
                .build(),
        )
        .with(
            TypeDescriptor::of::<Node>()
                .constructor(vec![], |_| Ok(Node { peer: None }))
                .property("peer", Some("?Node"), |n: &mut Node, v| {
                    n.peer = v.as_instance().and_then(|i| i.downcast::<Node>());
                    Ok(())
                })
                .build(),
        )
        .with(
            TypeDescriptor::of::<Pair>()
                .constructor(vec![Parameter::typed("left", "ClassA|ClassB")], |_| Ok(Pair))
                .build(),
        )
}

fn counting_catalog(constructed: Arc<AtomicUsize>, delay: Duration) -> Catalog {
    catalog().with(
        TypeDescriptor::of::<Counted>()
            .constructor(vec![], move |_| {
                constructed.fetch_add(1, Ordering::SeqCst);
                thread::sleep(delay);
                Ok(Counted)
            })
            .build(),
    )
}

fn json(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

fn container(config: &str) -> Container {
    Container::from_value(json(config), catalog(), ContainerOptions::default()).unwrap()
}

fn strict_container(config: &str) -> Container {
    Container::from_value(json(config), catalog(), ContainerOptions::strict()).unwrap()
}

// === Singleton semantics ===

#[test]
fn bare_class_name_resolves_to_singleton() {
    let container = container(r#"{"A": "ClassA"}"#);

    let first = container.get("A").unwrap();
    let second = container.get("A").unwrap();

    assert!(first.is::<ClassA>());
    assert!(first.ptr_eq(&second));
}

#[test]
fn recipe_runs_once() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let container = Container::new(
        [("counted", Value::from("Counted"))],
        counting_catalog(constructed.clone(), Duration::ZERO),
    );

    for _ in 0..5 {
        container.get("counted").unwrap();
    }
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_requests_construct_once() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let container = Container::new(
        [("counted", Value::from("Counted"))],
        counting_catalog(constructed.clone(), Duration::from_millis(20)),
    );

    let instances: Vec<Instance> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| container.get("counted").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|w| w[0].ptr_eq(&w[1])));
}

// === Recipes ===

#[test]
fn property_directive_sets_value() {
    let container = container(r#"{"B": {"class": "ClassB", "$count": 5}}"#);
    assert_eq!(container.get_as::<ClassB>("B").unwrap().count, 5);
}

#[test]
fn constructor_argument_identifier_is_shared() {
    let container = container(r#"{"A": "ClassA", "C": {"class": "ClassC", "constructorArgs": ["A"]}}"#);

    let c = container.get_as::<ClassC>("C").unwrap();
    let a = container.get_as::<ClassA>("A").unwrap();
    assert!(Arc::ptr_eq(&c.a, &a));
}

#[test]
fn named_constructor_arguments_fill_the_rest_with_defaults() {
    let container = container(r#"{"mailer": {"class": "Mailer", "constructorArgs": {"port": 2525}}}"#);

    let mailer = container.get_as::<Mailer>("mailer").unwrap();
    assert_eq!(mailer.host, "localhost");
    assert_eq!(mailer.port, 2525);
}

#[test]
fn unknown_named_argument_is_rejected() {
    let container = container(r#"{"mailer": {"class": "Mailer", "constructorArgs": {"tls": true}}}"#);

    assert!(matches!(
        container.get("mailer").unwrap_err(),
        WireupError::Container(ContainerError::UnknownParameter { parameter, .. }) if parameter == "tls"
    ));
}

#[test]
fn too_many_positional_arguments() {
    let container = container(r#"{"mailer": {"class": "Mailer", "constructorArgs": ["a", 1, 2]}}"#);

    assert!(matches!(
        container.get("mailer").unwrap_err(),
        WireupError::Container(ContainerError::TooManyArguments { expected: 2, supplied: 3, .. })
    ));
}

#[test]
fn invalid_recipe_key() {
    let container = container(r#"{"B": {"class": "ClassB", "count": 5}}"#);
    assert!(matches!(
        container.get("B").unwrap_err(),
        WireupError::Container(ContainerError::InvalidDirective { .. })
    ));
}

#[test]
fn malformed_recipe_and_unknown_class_are_not_found() {
    let container = container(r#"{"noclass": {"$count": 1}, "ghost": "GhostClass"}"#);

    match container.get("noclass").unwrap_err() {
        WireupError::NotFound(err) => assert!(matches!(err.reason, NotFoundReason::MalformedRecipe(_))),
        other => panic!("Expected NotFound, got: {other:?}"),
    }
    match container.get("ghost").unwrap_err() {
        WireupError::NotFound(err) => assert_eq!(err.reason, NotFoundReason::UnknownClass("GhostClass".into())),
        other => panic!("Expected NotFound, got: {other:?}"),
    }
}

#[test]
fn unknown_method_directive() {
    let container = container(r#"{"B": {"class": "ClassB", "explode()": []}}"#);
    assert!(matches!(
        container.get("B").unwrap_err(),
        WireupError::Container(ContainerError::UnknownMember { kind: MemberKind::Method, .. })
    ));
}

// === Auto-wiring ===

#[test]
fn autowires_parameter_by_registered_identifier() {
    let container = container(r#"{"LoggerInterface": "FileLogger", "svc": "Service"}"#);

    let svc = container.get_as::<Service>("svc").unwrap();
    let logger = container.get_as::<FileLogger>("LoggerInterface").unwrap();
    assert!(Arc::ptr_eq(&svc.logger, &logger));
}

#[test]
fn explicit_argument_wins_over_autowiring() {
    let container = container(
        r#"{
            "LoggerInterface": "FileLogger",
            "audit": "FileLogger",
            "svc": {"class": "Service", "constructorArgs": ["audit"]}
        }"#,
    );

    let svc = container.get_as::<Service>("svc").unwrap();
    let audit = container.get_as::<FileLogger>("audit").unwrap();
    let default_logger = container.get_as::<FileLogger>("LoggerInterface").unwrap();
    assert!(Arc::ptr_eq(&svc.logger, &audit));
    assert!(!Arc::ptr_eq(&svc.logger, &default_logger));
}

#[test]
fn method_directive_autowires_its_parameters() {
    let container = container(r#"{"LoggerInterface": "FileLogger", "svc": {"class": "Service", "setFallback()": []}}"#);

    let svc = container.get_as::<Service>("svc").unwrap();
    let fallback = svc.fallback.as_ref().unwrap();
    assert!(Arc::ptr_eq(fallback, &svc.logger));
}

#[test]
fn unregistered_interface_parameter_is_missing() {
    let container = container(r#"{"svc": "Service"}"#);

    match container.get("svc").unwrap_err() {
        WireupError::Container(ContainerError::MissingParameter { class, method, parameter }) => {
            assert_eq!(class, "Service");
            assert_eq!(method, "new");
            assert_eq!(parameter, "logger");
        }
        other => panic!("Expected MissingParameter, got: {other:?}"),
    }
}

#[test]
fn class_name_string_is_auto_instantiated() {
    let container = container(r#"{"svc": {"class": "Service", "constructorArgs": ["FileLogger"]}}"#);

    assert!(container.get_as::<Service>("svc").is_ok());
    assert!(!container.has("FileLogger"));
    assert_eq!(container.cached_len(), 1);
}

#[test]
fn plain_strings_stay_literal() {
    let container = container(r#"{"mailer": {"class": "Mailer", "constructorArgs": ["smtp.example.com"]}}"#);
    assert_eq!(container.get_as::<Mailer>("mailer").unwrap().host, "smtp.example.com");
}

#[test]
fn union_type_cannot_be_autowired() {
    let container = container(r#"{"pair": "Pair", "A": "ClassA"}"#);

    assert!(matches!(
        container.get("pair").unwrap_err(),
        WireupError::Container(ContainerError::UnsupportedType { .. })
    ));
}

#[test]
fn union_type_with_explicit_argument() {
    let config = r#"{"pair": {"class": "Pair", "constructorArgs": ["A"]}, "A": "ClassA"}"#;

    assert!(container(config).get("pair").is_ok());
    assert!(matches!(
        strict_container(config).get("pair").unwrap_err(),
        WireupError::Container(ContainerError::UnsupportedType { .. })
    ));
}

// === Lazy values ===

#[test]
fn lazy_value_receives_container() {
    let catalog = catalog();
    let container = Container::new(
        [
            ("A", Value::from("ClassA")),
            (
                "C",
                Value::map([
                    ("class", Value::from("ClassC")),
                    (
                        "constructorArgs",
                        Value::Array(vec![Value::lazy(|c| Ok(Value::Object(c.get("A")?)))]),
                    ),
                ]),
            ),
        ],
        catalog,
    );

    let c = container.get_as::<ClassC>("C").unwrap();
    assert!(Arc::ptr_eq(&c.a, &container.get_as::<ClassA>("A").unwrap()));
}

#[test]
fn lazy_value_result_is_used_verbatim() {
    let container = Container::new(
        [(
            "mailer",
            Value::map([
                ("class", Value::from("Mailer")),
                // "A" would be an identifier if it came from configuration
                ("constructorArgs", Value::Array(vec![Value::lazy(|_| Ok(Value::from("A")))])),
            ]),
        ), ("A", Value::from("ClassA"))],
        catalog(),
    );

    assert_eq!(container.get_as::<Mailer>("mailer").unwrap().host, "A");
}

#[test]
fn failing_lazy_value_is_wrapped() {
    let container = Container::new(
        [(
            "mailer",
            Value::map([
                ("class", Value::from("Mailer")),
                ("constructorArgs", Value::Array(vec![Value::lazy(|_| Err("vault sealed".into()))])),
            ]),
        )],
        catalog(),
    );

    match container.get("mailer").unwrap_err() {
        WireupError::Container(err @ ContainerError::Closure { .. }) => {
            assert!(err.to_string().contains("vault sealed"));
        }
        other => panic!("Expected Closure, got: {other:?}"),
    }
}

// === Circular references ===

#[test]
fn mutual_constructor_dependency_fails_with_chain() {
    let container = container(r#"{"X": "ClassX", "Y": {"class": "ClassY", "constructorArgs": ["X"]}}"#);

    match container.get("Y").unwrap_err() {
        WireupError::Container(ContainerError::CircularReference(err)) => {
            assert_eq!(err.chain, ["ClassY", "ClassX", "ClassY"]);
            assert!(err.to_string().contains("ClassY → ClassX → ClassY"));
        }
        other => panic!("Expected CircularReference, got: {other:?}"),
    }
}

#[test]
fn identifiers_referencing_each_other() {
    let container = container(
        r#"{
            "X": {"class": "ClassX", "constructorArgs": ["Y"]},
            "Y": {"class": "ClassY", "constructorArgs": ["X"]}
        }"#,
    );

    for id in ["X", "Y"] {
        assert!(matches!(
            container.get(id).unwrap_err(),
            WireupError::Container(ContainerError::CircularReference(_))
        ));
    }
    assert_eq!(container.cached_len(), 0);
}

#[test]
fn self_reference_through_property_fails() {
    let container = container(r#"{"node": {"class": "Node", "$peer": "node"}}"#);

    match container.get("node").unwrap_err() {
        WireupError::Container(ContainerError::CircularReference(err)) => {
            assert_eq!(err.chain, ["node", "node"]);
        }
        other => panic!("Expected CircularReference, got: {other:?}"),
    }
}

#[test]
fn failed_construction_does_not_poison_later_requests() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let catalog = catalog().with({
        let attempts = attempts.clone();
        TypeDescriptor::of::<Counted>()
            .constructor(vec![], move |_| {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err("warming up".into());
                }
                Ok(Counted)
            })
            .build()
    });
    let container = Container::new([("flaky", Value::from("Counted"))], catalog);

    match container.get("flaky").unwrap_err() {
        WireupError::Container(err @ ContainerError::Construction { .. }) => {
            assert!(err.to_string().contains("Counted"));
        }
        other => panic!("Expected Construction, got: {other:?}"),
    }
    assert!(container.get("flaky").is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

// === has ===

#[test]
fn has_agrees_with_get() {
    let container = container(r#"{"A": "ClassA", "svc": "Service"}"#);

    assert!(container.has("A"));
    assert!(container.get("A").is_ok());

    assert!(!container.has("Z"));
    assert!(container.get("Z").unwrap_err().is_not_found());

    // exists, but its parameter cannot be wired
    assert!(container.has("svc"));
    assert!(container.get("svc").unwrap_err().is_container_error());
}

// === Strict mode ===

#[test]
fn strict_mode_accepts_exact_kinds() {
    let container = strict_container(r#"{"B": {"class": "ClassB", "$count": 5}}"#);
    assert_eq!(container.get_as::<ClassB>("B").unwrap().count, 5);
}

#[test]
fn strict_mode_rejects_mismatched_kinds() {
    let config = r#"{"B": {"class": "ClassB", "$count": "5"}}"#;

    match strict_container(config).get("B").unwrap_err() {
        WireupError::Container(ContainerError::TypeMismatch(err)) => {
            assert_eq!(err.expected, "int");
            assert_eq!(err.actual, "string");
            assert!(err.target.contains("count"));
        }
        other => panic!("Expected TypeMismatch, got: {other:?}"),
    }

    assert_eq!(container(config).get_as::<ClassB>("B").unwrap().count, 5);
}

#[test]
fn strict_mode_checks_parameters() {
    let config = r#"{"mailer": {"class": "Mailer", "constructorArgs": ["smtp", "2525"]}}"#;

    assert!(matches!(
        strict_container(config).get("mailer").unwrap_err(),
        WireupError::Container(ContainerError::TypeMismatch(_))
    ));
    assert_eq!(container(config).get_as::<Mailer>("mailer").unwrap().port, 2525);
}

#[test]
fn strict_mode_accepts_interface_implementations() {
    let container = strict_container(r#"{"LoggerInterface": "FileLogger", "svc": "Service"}"#);
    assert!(container.get("svc").is_ok());
}

#[test]
fn strict_mode_rejects_wrong_object() {
    let container = strict_container(r#"{"A": "ClassA", "svc": {"class": "Service", "constructorArgs": ["A"]}}"#);

    match container.get("svc").unwrap_err() {
        WireupError::Container(ContainerError::TypeMismatch(err)) => {
            assert_eq!(err.expected, "LoggerInterface");
            assert_eq!(err.actual, "ClassA");
        }
        other => panic!("Expected TypeMismatch, got: {other:?}"),
    }
}
