//! # The Container: heart of wireup
//!
//! Turns a configuration mapping of identifiers to recipes into fully
//! wired singleton instances.
//!
//! # Resolution
//! ```text
//! get(id) ──cache hit──────────────────────────────> Instance
//!    │
//!    └─miss─> lock ─> Recipe::parse ─> constructor args ─> new() ─> $property / method()
//!                          │                 │
//!                          │          raw value / auto-wire
//!                          │                 │
//!                          └──── get(nested id) (re-enters) ──┘
//! ```
//!
//! # Examples
//! ```rust
//! use wireup_container::prelude::*;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let catalog = Catalog::new().with(
//!     TypeDescriptor::of::<Counter>()
//!         .default_constructor()
//!         .property("count", Some("int"), |c: &mut Counter, v| {
//!             c.count = v.to_int()?;
//!             Ok(())
//!         })
//!         .build(),
//! );
//!
//! let container = Container::new(
//!     [("counter", Value::map([("class", Value::from("Counter")), ("$count", Value::from(5))]))],
//!     catalog,
//! );
//!
//! let counter = container.get_as::<Counter>("counter").expect("Failed to resolve");
//! assert_eq!(counter.count, 5);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde::Deserialize;
use tracing::{debug, info, instrument, trace};
use wireup_support::rendering::{shorten_type_name, suggest_similar};

use crate::building::ConstructionState;
use crate::cache::InstanceCache;
use crate::catalog::Catalog;
use crate::descriptor::{Args, CONSTRUCTOR, DeclaredType, Parameter, TypeDescriptor};
use crate::error::{
    ContainerError, MemberKind, NotFoundError, NotFoundReason, Result, TypeMismatchError,
};
use crate::registry::{Arguments, Directive, Recipe, Registry};
use crate::strict::StrictChecker;
use crate::value::{Instance, Value};

/// Maximum number of "did you mean?" suggestions in a not-found error.
const MAX_SUGGESTIONS: usize = 3;

/// Container settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Verify every resolved argument and property value against its declared type.
    pub strict_mode: bool,
}

impl ContainerOptions {
    pub fn strict() -> Self {
        Self { strict_mode: true }
    }
}

/// Configuration-driven dependency injection container.
///
/// Every identifier resolves to one shared instance for the container's
/// lifetime. The container is `Send + Sync`; concurrent requests for an
/// uncached identifier are serialized so it is constructed at most once.
pub struct Container {
    registry: Registry,
    catalog: Arc<Catalog>,
    cache: InstanceCache,
    construction: ReentrantMutex<ConstructionState>,
    options: ContainerOptions,
}

impl Container {
    /// Creates a non-strict container.
    pub fn new<K: Into<String>>(config: impl IntoIterator<Item = (K, Value)>, catalog: Catalog) -> Self {
        Self::with_options(config, catalog, ContainerOptions::default())
    }

    pub fn with_options<K: Into<String>>(
        config: impl IntoIterator<Item = (K, Value)>,
        catalog: Catalog,
        options: ContainerOptions,
    ) -> Self {
        let registry = Registry::new(config.into_iter().map(|(id, recipe)| (id.into(), recipe)));

        info!(
            entries = registry.len(),
            types = catalog.len(),
            strict = options.strict_mode,
            "Container created"
        );

        Self {
            registry,
            catalog: Arc::new(catalog),
            cache: InstanceCache::new(),
            construction: ReentrantMutex::new(ConstructionState::default()),
            options,
        }
    }

    /// Creates a container from an already-materialized configuration value,
    /// e.g. one deserialized from JSON.
    ///
    /// # Errors
    /// [`ContainerError::InvalidConfig`] if `config` is not a mapping.
    pub fn from_value(config: Value, catalog: Catalog, options: ContainerOptions) -> Result<Self> {
        match config {
            Value::Map(entries) => Ok(Self::with_options(entries, catalog, options)),
            other => Err(ContainerError::InvalidConfig {
                reason: format!("expected a mapping of identifiers to recipes, got {}", other.kind()),
            }
            .into()),
        }
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.options.strict_mode
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of identifiers constructed so far.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether `id` is cached or configured. Never fails.
    pub fn has(&self, id: &str) -> bool {
        self.cache.contains(id) || self.registry.contains(id)
    }

    /// Like [`Container::has`], but a configured entry must also name a
    /// constructible class.
    pub fn has_constructible(&self, id: &str) -> bool {
        self.cache.contains(id)
            || self
                .registry
                .class_of(id)
                .is_some_and(|class| self.catalog.is_constructible(class))
    }

    /// Returns the instance for `id`, constructing it on first request.
    ///
    /// # Errors
    /// - [`WireupError::NotFound`](crate::error::WireupError::NotFound): `id`
    ///   is not configured, or its class is unknown or not instantiable
    /// - [`WireupError::Container`](crate::error::WireupError::Container): any
    ///   construction or wiring failure
    #[instrument(skip(self), level = "debug", name = "container_get")]
    pub fn get(&self, id: &str) -> Result<Instance> {
        if let Some(instance) = self.cache.get(id) {
            trace!(id, "Cache hit");
            return Ok(instance);
        }

        let state = self.construction.lock();

        // Another thread may have finished it while we waited.
        if let Some(instance) = self.cache.get(id) {
            return Ok(instance);
        }

        let _resolving = match state.resolving.enter(id) {
            Ok(guard) => Some(guard),
            // Re-entered during its own constructor: the class check below
            // reports the constructor chain.
            Err(_) if self.registry.class_of(id).is_some_and(|c| state.building.contains(c)) => None,
            Err(cycle) => return Err(ContainerError::CircularReference(cycle).into()),
        };

        let instance = self.build(id)?;
        Ok(self.cache.insert(id, instance))
    }

    /// Returns the instance for `id` as a `T`.
    ///
    /// # Errors
    /// As [`Container::get`], plus [`ContainerError::TypeMismatch`] if the
    /// instance is not a `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        let instance = self.get(id)?;
        instance.downcast::<T>().ok_or_else(|| {
            ContainerError::TypeMismatch(TypeMismatchError {
                target: format!("identifier {id:?}"),
                expected: shorten_type_name(type_name::<T>()),
                actual: instance.class().to_string(),
            })
            .into()
        })
    }

    fn build(&self, id: &str) -> Result<Instance> {
        let raw = self
            .registry
            .get(id)
            .ok_or_else(|| self.not_found(id, NotFoundReason::NotConfigured))?;
        let recipe = Recipe::parse(id, raw)?;
        let descriptor = self.constructible(id, &recipe.class)?;

        let mut object = self.construct(&descriptor, &recipe.arguments)?;

        for directive in &recipe.directives {
            self.apply(&descriptor, &mut *object, directive)?;
        }

        debug!(id, class = descriptor.name(), "Constructed instance");
        Ok(Instance::from_boxed(descriptor.name(), object))
    }

    fn constructible(&self, id: &str, class: &str) -> Result<Arc<TypeDescriptor>> {
        let descriptor = self
            .catalog
            .get(class)
            .ok_or_else(|| self.not_found(id, NotFoundReason::UnknownClass(class.to_string())))?;

        if !descriptor.is_constructible() {
            return Err(self.not_found(id, NotFoundReason::NotInstantiable(class.to_string())));
        }

        Ok(Arc::clone(descriptor))
    }

    /// Runs the constructor with `class` marked as under construction.
    fn construct(
        &self,
        descriptor: &TypeDescriptor,
        arguments: &Arguments,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        let class = descriptor.name();
        let state = self.construction.lock();
        let _building = state
            .building
            .enter(class)
            .map_err(ContainerError::CircularReference)?;

        let Some(constructor) = descriptor.constructor() else {
            return Err(self.not_found(class, NotFoundReason::NotInstantiable(class.to_string())));
        };

        let args = self.resolve_arguments(class, CONSTRUCTOR, constructor.parameters(), arguments)?;

        trace!(class, args = args.len(), "Invoking constructor");
        constructor.invoke(args).map_err(|source| {
            ContainerError::Construction {
                class: class.to_string(),
                source,
            }
            .into()
        })
    }

    fn apply(
        &self,
        descriptor: &TypeDescriptor,
        object: &mut (dyn Any + Send + Sync),
        directive: &Directive,
    ) -> Result<()> {
        let class = descriptor.name();

        match directive {
            Directive::Property { name, value } => {
                let property = descriptor.property(name).ok_or_else(|| ContainerError::UnknownMember {
                    class: class.to_string(),
                    member: name.clone(),
                    kind: MemberKind::Property,
                })?;

                if !property.is_writable() {
                    return Err(ContainerError::InaccessibleMember {
                        class: class.to_string(),
                        member: name.clone(),
                        kind: MemberKind::Property,
                        visibility: property.visibility(),
                    }
                    .into());
                }

                let value = self.resolve_value(value)?;
                if let Some(declared) = property.declared() {
                    self.verify(declared, &value, || format!("property {class}::${name}"))?;
                }

                trace!(class, property = %name, "Assigning property");
                property.assign(object, value).map_err(|source| {
                    ContainerError::Assignment {
                        class: class.to_string(),
                        property: name.clone(),
                        source,
                    }
                    .into()
                })
            }
            Directive::Method { name, arguments } => {
                let method = descriptor.method(name).ok_or_else(|| ContainerError::UnknownMember {
                    class: class.to_string(),
                    member: name.clone(),
                    kind: MemberKind::Method,
                })?;

                if !method.is_callable() {
                    return Err(ContainerError::InaccessibleMember {
                        class: class.to_string(),
                        member: name.clone(),
                        kind: MemberKind::Method,
                        visibility: method.visibility(),
                    }
                    .into());
                }

                let supplied = Arguments::Positional(arguments.clone());
                let args = self.resolve_arguments(class, name, method.parameters(), &supplied)?;

                trace!(class, method = %name, "Calling method");
                method.invoke(object, args).map_err(|source| {
                    ContainerError::Invocation {
                        class: class.to_string(),
                        method: name.clone(),
                        source,
                    }
                    .into()
                })
            }
        }
    }

    /// Matches declared parameters with supplied arguments.
    ///
    /// For each parameter, in order: an explicit argument wins, then
    /// auto-wiring by declared type, then the default value.
    fn resolve_arguments(
        &self,
        class: &str,
        method: &str,
        parameters: &[Parameter],
        supplied: &Arguments,
    ) -> Result<Args> {
        match supplied {
            Arguments::Positional(values) if values.len() > parameters.len() => {
                return Err(ContainerError::TooManyArguments {
                    class: class.to_string(),
                    method: method.to_string(),
                    expected: parameters.len(),
                    supplied: values.len(),
                }
                .into());
            }
            Arguments::Named(entries) => {
                if let Some((unknown, _)) = entries
                    .iter()
                    .find(|(name, _)| !parameters.iter().any(|p| p.name() == name))
                {
                    return Err(ContainerError::UnknownParameter {
                        class: class.to_string(),
                        method: method.to_string(),
                        parameter: unknown.clone(),
                    }
                    .into());
                }
            }
            Arguments::Positional(_) => {}
        }

        let mut args = Args::default();

        for (index, parameter) in parameters.iter().enumerate() {
            let describe = || format!("parameter ${} of {class}::{method}", parameter.name());

            let value = match supplied.lookup(index, parameter.name()) {
                Some(raw) => {
                    let value = self.resolve_value(raw)?;
                    if let Some(declared) = parameter.declared() {
                        self.verify(declared, &value, describe)?;
                    }
                    value
                }
                None => self.autowire(class, method, parameter)?,
            };

            trace!(class, method, parameter = parameter.name(), kind = value.kind(), "Resolved parameter");
            args.push(parameter.name(), value);
        }

        Ok(args)
    }

    /// Resolves a parameter nobody supplied an argument for.
    fn autowire(&self, class: &str, method: &str, parameter: &Parameter) -> Result<Value> {
        if let Some(declared) = parameter.declared() {
            let Some((wanted, _)) = declared.single() else {
                return Err(ContainerError::UnsupportedType {
                    target: format!("parameter ${} of {class}::{method}", parameter.name()),
                    declared: declared.to_string(),
                }
                .into());
            };

            if !declared.is_builtin() {
                if self.has(wanted) {
                    let value = Value::Object(self.get(wanted)?);
                    self.verify(declared, &value, || {
                        format!("parameter ${} of {class}::{method}", parameter.name())
                    })?;
                    return Ok(value);
                }

                if !parameter.is_optional() && self.catalog.is_constructible(wanted) {
                    return self.instantiate(wanted).map(Value::Object);
                }
            }
        }

        if let Some(default) = parameter.default() {
            return Ok(default.clone());
        }

        Err(ContainerError::MissingParameter {
            class: class.to_string(),
            method: method.to_string(),
            parameter: parameter.name().to_string(),
        }
        .into())
    }

    /// Resolves one raw configuration value.
    ///
    /// Identifiers resolve through [`Container::get`], constructible class
    /// names are instantiated, lazy values are called with the container;
    /// anything else is a literal.
    fn resolve_value(&self, raw: &Value) -> Result<Value> {
        match raw {
            Value::String(id) if self.has(id) => self.get(id).map(Value::Object),
            Value::String(class) if self.catalog.is_constructible(class) => {
                self.instantiate(class).map(Value::Object)
            }
            Value::Lazy(lazy) => {
                trace!("Calling lazy value");
                lazy.call(self)
                    .map_err(|source| ContainerError::Closure { source }.into())
            }
            literal => Ok(literal.clone()),
        }
    }

    /// Builds an unconfigured class with no explicit arguments. Not cached.
    fn instantiate(&self, class: &str) -> Result<Instance> {
        let descriptor = self.constructible(class, class)?;
        let object = self.construct(&descriptor, &Arguments::default())?;

        debug!(class, "Auto-instantiated class");
        Ok(Instance::from_boxed(descriptor.name(), object))
    }

    fn verify(&self, declared: &DeclaredType, value: &Value, target: impl FnOnce() -> String) -> Result<()> {
        if !self.options.strict_mode {
            return Ok(());
        }
        StrictChecker::new(&self.catalog)
            .check(declared, value, &target())
            .map_err(Into::into)
    }

    fn not_found(&self, id: &str, reason: NotFoundReason) -> crate::error::WireupError {
        let suggestions = match reason {
            NotFoundReason::NotConfigured => suggest_similar(id, &self.registry.ids(), MAX_SUGGESTIONS),
            _ => Vec::new(),
        };

        NotFoundError {
            requested: id.to_string(),
            reason,
            suggestions,
        }
        .into()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("configured", &self.registry.len())
            .field("cached", &self.cache.len())
            .field("types", &self.catalog.len())
            .field("strict", &self.options.strict_mode)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerOptions};
    pub use crate::catalog::{Catalog, DescriptorRegistration};
    pub use crate::descriptor::{Args, DeclaredType, Parameter, TypeDescriptor, Visibility};
    pub use crate::error::{BoxError, ContainerError, Result, WireupError};
    pub use crate::provider::{DescriptorRegistry, Provider};
    pub use crate::value::{Instance, LazyValue, Value};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
