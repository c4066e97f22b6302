//! Strict type checking of resolved values.
//!
//! Only consulted when the container runs in strict mode. Primitive values
//! are compared through a fixed kind table (`integer` → `int`, ...);
//! objects must be instances of the declared class or one of its subtypes.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::catalog::Catalog;
use crate::descriptor::DeclaredType;
use crate::error::{ContainerError, TypeMismatchError};
use crate::value::Value;

/// Runtime kind → declared type name.
static KIND_TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("boolean", "bool"),
        ("integer", "int"),
        ("double", "float"),
        ("string", "string"),
        ("array", "array"),
        ("NULL", "null"),
        ("Closure", "callable"),
        ("object", "object"),
    ])
});

/// The declared-type spelling of a value's runtime kind.
pub fn normalized_kind(value: &Value) -> &'static str {
    let kind = value.kind();
    KIND_TABLE.get(kind).copied().unwrap_or(kind)
}

/// Checks values against declared types.
#[derive(Debug, Clone, Copy)]
pub struct StrictChecker<'a> {
    catalog: &'a Catalog,
}

impl<'a> StrictChecker<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Verifies `value` may be assigned to something declared as `declared`.
    ///
    /// `target` names the parameter or property in error messages.
    ///
    /// # Errors
    /// - [`ContainerError::UnsupportedType`]: union or intersection type
    /// - [`ContainerError::TypeMismatch`]: incompatible value
    pub fn check(&self, declared: &DeclaredType, value: &Value, target: &str) -> Result<(), ContainerError> {
        let Some((name, nullable)) = declared.single() else {
            return Err(ContainerError::UnsupportedType {
                target: target.to_string(),
                declared: declared.to_string(),
            });
        };

        trace!(target, declared = %declared, actual = value.kind(), "Strict check");

        if self.accepts(name, nullable, value) {
            return Ok(());
        }

        Err(ContainerError::TypeMismatch(TypeMismatchError {
            target: target.to_string(),
            expected: declared.to_string(),
            actual: value.type_label(),
        }))
    }

    fn accepts(&self, name: &str, nullable: bool, value: &Value) -> bool {
        match (name, value) {
            ("mixed", _) => true,
            (_, Value::Null) => nullable || name == "null",
            ("iterable", Value::Array(_) | Value::Map(_)) => true,
            (_, Value::Object(instance)) => {
                name == "object" || self.catalog.is_subtype(instance.class(), name)
            }
            _ => normalized_kind(value) == name,
        }
    }
}
