//! Error types for wireup container operations.
//!
//! Every failure is one of two kinds:
//! - [`WireupError::NotFound`]: nothing exists to satisfy the request
//! - [`WireupError::Container`]: something exists but cannot be built or wired
//!
//! Low-level failures (a constructor, setter or closure returning an error)
//! are wrapped with the class and member names involved and kept as the
//! error source.

use std::fmt;

use wireup_support::rendering::render_chain;

use crate::descriptor::Visibility;

/// Boxed error returned by user-supplied constructors, setters, methods and closures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all wireup operations.
#[derive(Debug, thiserror::Error)]
pub enum WireupError {
    /// The identifier or its target class cannot be located or constructed.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// The identifier exists but could not be built or wired.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl WireupError {
    /// Returns `true` for [`WireupError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, WireupError::NotFound(_))
    }

    /// Returns `true` for [`WireupError::Container`].
    pub fn is_container_error(&self) -> bool {
        matches!(self, WireupError::Container(_))
    }
}

impl From<NotFoundError> for WireupError {
    fn from(err: NotFoundError) -> Self {
        WireupError::NotFound(err)
    }
}

/// Why a request could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The identifier has no configuration entry.
    NotConfigured,
    /// The entry exists but does not name a class.
    MalformedRecipe(String),
    /// The recipe names a class without a registered descriptor.
    UnknownClass(String),
    /// The class is abstract, an interface, or has no constructor.
    NotInstantiable(String),
}

/// Error when an identifier cannot be satisfied.
///
/// Includes "did you mean?" suggestions drawn from the configured identifiers.
#[derive(Debug)]
pub struct NotFoundError {
    /// The identifier that was requested
    pub requested: String,
    pub reason: NotFoundReason,
    /// Configured identifiers that look like the requested one
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            NotFoundReason::NotConfigured => {
                write!(f, "Identifier not found: {:?}", self.requested)?;
            }
            NotFoundReason::MalformedRecipe(detail) => {
                write!(f, "Malformed recipe for {:?}: {detail}", self.requested)?;
            }
            NotFoundReason::UnknownClass(class) => {
                write!(f, "Class {class} for {:?} is not registered", self.requested)?;
            }
            NotFoundReason::NotInstantiable(class) => {
                write!(f, "Class {class} for {:?} is not instantiable", self.requested)?;
            }
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        match &self.reason {
            NotFoundReason::UnknownClass(_) => write!(
                f,
                "\n  Hint: Did you forget to register its descriptor in the catalog?"
            ),
            NotFoundReason::NotInstantiable(_) => write!(
                f,
                "\n  Hint: Point the recipe at a concrete class with a constructor"
            ),
            _ => Ok(()),
        }
    }
}

/// Kind of class member a recipe directive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Property => write!(f, "Property"),
            MemberKind::Method => write!(f, "Method"),
        }
    }
}

/// Failures while building or wiring an instance.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// A class (or identifier) re-entered its own construction.
    #[error("{}", .0)]
    CircularReference(CircularReferenceError),

    /// A required parameter had no argument, no auto-wire match and no default.
    #[error(
        "Unable to resolve parameter ${parameter} of {class}::{method}: \
         no argument supplied, nothing to auto-wire and no default value"
    )]
    MissingParameter {
        class: String,
        method: String,
        parameter: String,
    },

    /// Strict mode rejected a value.
    #[error("{}", .0)]
    TypeMismatch(TypeMismatchError),

    /// A union or intersection type where a single type is required.
    #[error("Unsupported declared type {declared} for {target}: only a single named type can be resolved or checked")]
    UnsupportedType { target: String, declared: String },

    /// The member exists but is not public (or has no public writer).
    #[error("{kind} {class}::{member} is not publicly accessible ({visibility})")]
    InaccessibleMember {
        class: String,
        member: String,
        kind: MemberKind,
        visibility: Visibility,
    },

    /// The recipe names a member the class does not declare.
    #[error("{kind} {class}::{member} does not exist")]
    UnknownMember {
        class: String,
        member: String,
        kind: MemberKind,
    },

    /// A recipe key that is neither `class`, `constructorArgs`, `$property` nor `method()`.
    #[error(
        "Invalid key {key:?} in recipe for {id:?}\n  \
         Hint: Recipe keys are \"class\", \"constructorArgs\", \"$property\" or \"method()\""
    )]
    InvalidDirective { id: String, key: String },

    /// More positional arguments than the callable declares.
    #[error("{class}::{method} accepts {expected} argument(s), {supplied} supplied")]
    TooManyArguments {
        class: String,
        method: String,
        expected: usize,
        supplied: usize,
    },

    /// A named argument that matches no declared parameter.
    #[error("{class}::{method} has no parameter named ${parameter}")]
    UnknownParameter {
        class: String,
        method: String,
        parameter: String,
    },

    /// The class constructor returned an error.
    #[error("Failed to construct {class}: {source}")]
    Construction {
        class: String,
        #[source]
        source: BoxError,
    },

    /// A property setter returned an error.
    #[error("Failed to assign {class}::${property}: {source}")]
    Assignment {
        class: String,
        property: String,
        #[source]
        source: BoxError,
    },

    /// A method directive returned an error.
    #[error("Failed to call {class}::{method}(): {source}")]
    Invocation {
        class: String,
        method: String,
        #[source]
        source: BoxError,
    },

    /// A lazy configuration value returned an error.
    #[error("Lazy value failed: {source}")]
    Closure {
        #[source]
        source: BoxError,
    },

    /// The configuration handed to the container is unusable.
    #[error("Invalid container configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Error when construction re-enters itself.
///
/// Shows the full chain so you can see WHERE the cycle closes.
#[derive(Debug)]
pub struct CircularReferenceError {
    /// Example: ["ClassY", "ClassX", "ClassY"]
    pub chain: Vec<String>,
}

impl fmt::Display for CircularReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular reference detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: Remove one of the dependencies in the chain, or route it through a separate identifier"
        )
    }
}

/// Error when a strict-mode check fails.
#[derive(Debug)]
pub struct TypeMismatchError {
    /// What was being checked, e.g. `parameter $count of Counter::new`
    pub target: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type mismatch for {}: expected {}, got {}",
            self.target, self.expected, self.actual
        )
    }
}

/// Convenient Result type for wireup operations.
pub type Result<T> = std::result::Result<T, WireupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_with_suggestions() {
        let err = WireupError::NotFound(NotFoundError {
            requested: "Mailr".into(),
            reason: NotFoundReason::NotConfigured,
            suggestions: vec!["Mailer".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("not found"));
        assert!(msg.contains("Mailer"));
        assert!(err.is_not_found());
    }

    #[test]
    fn not_instantiable_has_hint() {
        let err = NotFoundError {
            requested: "Logger".into(),
            reason: NotFoundReason::NotInstantiable("LoggerInterface".into()),
            suggestions: vec![],
        };

        let msg = err.to_string();
        assert!(msg.contains("not instantiable"));
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn circular_reference_display() {
        let err = WireupError::from(ContainerError::CircularReference(CircularReferenceError {
            chain: vec!["ClassY".into(), "ClassX".into(), "ClassY".into()],
        }));

        let msg = format!("{err}");
        assert!(msg.contains("Circular"));
        assert!(msg.contains("ClassY → ClassX → ClassY"));
        assert!(msg.contains("Hint: Remove one of the dependencies"));
        assert!(!msg.contains("lazy value"));
        assert!(err.is_container_error());
    }

    #[test]
    fn construction_keeps_source() {
        use std::error::Error as _;

        let err = ContainerError::Construction {
            class: "Database".into(),
            source: "connection refused".into(),
        };

        assert!(err.to_string().contains("Database"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("connection refused"));
    }

    #[test]
    fn missing_parameter_names_everything() {
        let err = ContainerError::MissingParameter {
            class: "Mailer".into(),
            method: "new".into(),
            parameter: "transport".into(),
        };

        let msg = err.to_string();
        assert!(msg.contains("$transport"));
        assert!(msg.contains("Mailer::new"));
    }
}
