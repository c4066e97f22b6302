//! Recipe registry: the configuration the container builds from.
//!
//! The registry maps identifiers to raw configuration values. Entries are
//! interpreted into a [`Recipe`] only when the identifier is first
//! requested, so a malformed entry fails that request and nothing else.
//!
//! # Recipe syntax
//! ```text
//! "Mailer"                                  bare class name
//! {
//!     "class": "Mailer",                    target class (required)
//!     "constructorArgs": ["Transport", 25], positional, or a {name: value} mapping
//!     "$sender": "noreply@example.com",     property directive
//!     "setLogger()": ["Logger"]             method directive
//! }
//! ```

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::{ContainerError, NotFoundError, NotFoundReason, Result};
use crate::value::Value;

/// Key holding the target class.
pub const CLASS_KEY: &str = "class";
/// Key holding the constructor arguments.
pub const ARGUMENTS_KEY: &str = "constructorArgs";
/// Prefix marking a property directive.
pub const PROPERTY_SIGIL: char = '$';
/// Suffix marking a method directive.
pub const METHOD_MARKER: &str = "()";

/// Constructor arguments as written in a recipe.
#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    /// Matched to parameters by position.
    Positional(Vec<Value>),
    /// Matched to parameters by name.
    Named(Vec<(String, Value)>),
}

impl Default for Arguments {
    fn default() -> Self {
        Arguments::Positional(Vec::new())
    }
}

impl Arguments {
    /// The raw argument for the parameter at `index` named `name`, if supplied.
    pub fn lookup(&self, index: usize, name: &str) -> Option<&Value> {
        match self {
            Arguments::Positional(values) => values.get(index),
            Arguments::Named(entries) => entries.iter().find(|(n, _)| n == name).map(|(_, v)| v),
        }
    }
}

/// One member directive, applied after construction in recipe order.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Property { name: String, value: Value },
    Method { name: String, arguments: Vec<Value> },
}

/// How to build one identifier's instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub class: String,
    pub arguments: Arguments,
    pub directives: Vec<Directive>,
}

impl Recipe {
    /// Interprets the raw configuration entry for `id`.
    ///
    /// # Errors
    /// - [`NotFoundReason::MalformedRecipe`]: the entry names no class
    /// - [`ContainerError::InvalidDirective`]: an unrecognized key
    pub fn parse(id: &str, raw: &Value) -> Result<Recipe> {
        let entries = match raw {
            Value::String(class) => {
                return Ok(Recipe {
                    class: class.clone(),
                    arguments: Arguments::default(),
                    directives: Vec::new(),
                });
            }
            Value::Map(entries) => entries,
            other => {
                return Err(malformed(
                    id,
                    format!("expected a class name or a mapping, got {}", other.kind()),
                ));
            }
        };

        let class = match raw.get(CLASS_KEY) {
            Some(Value::String(class)) => class.clone(),
            Some(other) => {
                return Err(malformed(id, format!("\"class\" must be a string, got {}", other.kind())));
            }
            None => return Err(malformed(id, "missing \"class\" key".to_string())),
        };

        let mut arguments = Arguments::default();
        let mut directives = Vec::new();

        for (key, value) in entries {
            if key == CLASS_KEY {
                continue;
            }

            if key == ARGUMENTS_KEY {
                arguments = match value {
                    Value::Array(values) => Arguments::Positional(values.clone()),
                    Value::Map(entries) => Arguments::Named(entries.clone()),
                    Value::Null => Arguments::default(),
                    other => Arguments::Positional(vec![other.clone()]),
                };
                continue;
            }

            if let Some(name) = key.strip_prefix(PROPERTY_SIGIL).filter(|n| !n.is_empty()) {
                directives.push(Directive::Property {
                    name: name.to_string(),
                    value: value.clone(),
                });
                continue;
            }

            if let Some(name) = key.strip_suffix(METHOD_MARKER).filter(|n| !n.is_empty()) {
                let arguments = match value {
                    Value::Array(values) => values.clone(),
                    Value::Null => Vec::new(),
                    other => vec![other.clone()],
                };
                directives.push(Directive::Method {
                    name: name.to_string(),
                    arguments,
                });
                continue;
            }

            return Err(ContainerError::InvalidDirective {
                id: id.to_string(),
                key: key.clone(),
            }
            .into());
        }

        trace!(id, class = %class, directives = directives.len(), "Parsed recipe");
        Ok(Recipe {
            class,
            arguments,
            directives,
        })
    }
}

fn malformed(id: &str, detail: String) -> crate::error::WireupError {
    NotFoundError {
        requested: id.to_string(),
        reason: NotFoundReason::MalformedRecipe(detail),
        suggestions: Vec::new(),
    }
    .into()
}

/// Stores the raw configuration entries.
///
/// Populated once when the container is created; read-only afterwards.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: HashMap<String, Value>,
}

impl Registry {
    pub fn new(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let entries: HashMap<String, Value> = entries.into_iter().collect();
        debug!(entries = entries.len(), "Loaded recipe registry");
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// The class an entry names, without interpreting the rest of it.
    pub fn class_of(&self, id: &str) -> Option<&str> {
        match self.entries.get(id)? {
            Value::String(class) => Some(class),
            entry @ Value::Map(_) => entry.get(CLASS_KEY)?.as_str(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
