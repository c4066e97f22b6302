//! # Wireup: configuration-driven dependency injection for Rust
//!
//! Identifiers map to recipes: a class name, constructor arguments and
//! post-construction property or method directives. Every identifier
//! resolves to one shared instance. Parameters nobody supplies are
//! auto-wired from their declared types, and construction cycles fail with
//! the full chain instead of overflowing the stack.
//!
//! ```
//! use wireup::prelude::*;
//!
//! #[derive(Default)]
//! struct Clock;
//!
//! let catalog = Catalog::new().with(TypeDescriptor::of::<Clock>().default_constructor().build());
//! let container = Container::new([("clock", Value::from("Clock"))], catalog);
//!
//! assert!(container.has("clock"));
//! assert!(container.get_as::<Clock>("clock").is_ok());
//! ```

pub use wireup_container::*;
pub use wireup_support::*;
