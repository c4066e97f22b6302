//! Type descriptors: the container's view of a constructible type.
//!
//! Rust has no runtime reflection, so each type the container may build
//! declares its constructor parameters, writable properties and callable
//! methods once, through a [`TypeDescriptor`]. Member access then goes
//! through typed closures looked up by name.
//!
//! # Examples
//! ```
//! use wireup_container::descriptor::{Parameter, TypeDescriptor};
//!
//! struct Counter {
//!     count: i64,
//! }
//!
//! let descriptor = TypeDescriptor::of::<Counter>()
//!     .named("Counter")
//!     .constructor(vec![Parameter::new("start").with_default(0)], |args| {
//!         Ok(Counter { count: args.int(0)? })
//!     })
//!     .property("count", Some("int"), |counter: &mut Counter, value| {
//!         counter.count = value.to_int()?;
//!         Ok(())
//!     })
//!     .build();
//!
//! assert!(descriptor.is_constructible());
//! assert_eq!(descriptor.name(), "Counter");
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use wireup_support::rendering::shorten_type_name;

use crate::error::BoxError;
use crate::value::Value;

/// Name used for the constructor in diagnostics.
pub const CONSTRUCTOR: &str = "new";

/// Type names the strict checker understands without a descriptor.
const BUILTIN_TYPES: &[&str] = &[
    "bool", "int", "float", "string", "array", "iterable", "callable", "object", "mixed", "null",
];

/// Whether a type can be instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Concrete,
    Abstract,
    Interface,
}

/// Member visibility; only `Public` members are reachable from recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Declared type of a parameter or property.
///
/// Parsed from the usual notation: `int`, `?Logger`, `A|B`, `A&B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Named { name: String, nullable: bool },
    Union(Vec<String>),
    Intersection(Vec<String>),
}

impl DeclaredType {
    pub fn named(name: impl Into<String>) -> Self {
        DeclaredType::Named {
            name: name.into(),
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>) -> Self {
        DeclaredType::Named {
            name: name.into(),
            nullable: true,
        }
    }

    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if text.contains('|') {
            let members: Vec<String> = text.split('|').map(|s| s.trim().to_string()).collect();
            // `T|null` is just a nullable `T`
            let non_null: Vec<&String> = members.iter().filter(|m| m.as_str() != "null").collect();
            if non_null.len() == 1 && members.len() == 2 {
                return DeclaredType::nullable(non_null[0].clone());
            }
            return DeclaredType::Union(members);
        }

        if text.contains('&') {
            return DeclaredType::Intersection(
                text.split('&').map(|s| s.trim().to_string()).collect(),
            );
        }

        match text.strip_prefix('?') {
            Some(name) => DeclaredType::nullable(name.trim()),
            None => DeclaredType::named(text),
        }
    }

    /// The single named type and its nullability, if there is one.
    pub fn single(&self) -> Option<(&str, bool)> {
        match self {
            DeclaredType::Named { name, nullable } => Some((name, *nullable)),
            _ => None,
        }
    }

    /// `true` for a single built-in (non-class) type.
    pub fn is_builtin(&self) -> bool {
        self.single()
            .is_some_and(|(name, _)| is_builtin_type(name))
    }
}

impl From<&str> for DeclaredType {
    fn from(text: &str) -> Self {
        DeclaredType::parse(text)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Named { name, nullable: true } => write!(f, "?{name}"),
            DeclaredType::Named { name, .. } => write!(f, "{name}"),
            DeclaredType::Union(members) => write!(f, "{}", members.join("|")),
            DeclaredType::Intersection(members) => write!(f, "{}", members.join("&")),
        }
    }
}

/// `true` if `name` is a built-in type rather than a class.
pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

/// One declared parameter of a constructor or method.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    declared: Option<DeclaredType>,
    default: Option<Value>,
}

impl Parameter {
    /// An untyped, required parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared: None,
            default: None,
        }
    }

    /// A required parameter with a declared type.
    pub fn typed(name: impl Into<String>, declared: impl Into<DeclaredType>) -> Self {
        Self::new(name).with_type(declared)
    }

    pub fn with_type(mut self, declared: impl Into<DeclaredType>) -> Self {
        self.declared = Some(declared.into());
        self
    }

    /// Makes the parameter optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn declared(&self) -> Option<&DeclaredType> {
        self.declared.as_ref()
    }

    #[inline]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Resolved arguments handed to a constructor or method, in parameter order.
#[derive(Debug, Default, Clone)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn new(entries: Vec<(String, Value)>) -> Self {
        Self { entries }
    }

    pub(crate) fn push(&mut self, name: &str, value: Value) {
        self.entries.push((name.to_string(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn value(&self, index: usize) -> Result<&Value, BoxError> {
        self.entries
            .get(index)
            .map(|(_, v)| v)
            .ok_or_else(|| format!("missing argument #{index}").into())
    }

    pub fn by_name(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Moves the argument out, leaving `Null` behind.
    pub fn take(&mut self, index: usize) -> Result<Value, BoxError> {
        self.entries
            .get_mut(index)
            .map(|(_, v)| std::mem::take(v))
            .ok_or_else(|| format!("missing argument #{index}").into())
    }

    pub fn int(&self, index: usize) -> Result<i64, BoxError> {
        self.with_name(index, self.value(index)?.to_int())
    }

    pub fn float(&self, index: usize) -> Result<f64, BoxError> {
        self.with_name(index, self.value(index)?.to_float())
    }

    pub fn bool(&self, index: usize) -> Result<bool, BoxError> {
        self.with_name(index, self.value(index)?.to_bool())
    }

    pub fn string(&self, index: usize) -> Result<String, BoxError> {
        self.with_name(index, self.value(index)?.to_string_value())
    }

    /// The argument as a shared `T`.
    pub fn instance<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        let value = self.value(index)?;
        value
            .as_instance()
            .and_then(|instance| instance.downcast::<T>())
            .ok_or_else(|| {
                format!(
                    "argument ${} expected {}, got {}",
                    self.entries[index].0,
                    shorten_type_name(type_name::<T>()),
                    value.type_label()
                )
                .into()
            })
    }

    /// Like [`Args::instance`], but `Null` becomes `None`.
    pub fn optional_instance<T: Any + Send + Sync>(
        &self,
        index: usize,
    ) -> Result<Option<Arc<T>>, BoxError> {
        if self.value(index)?.is_null() {
            return Ok(None);
        }
        self.instance(index).map(Some)
    }

    fn with_name<V>(&self, index: usize, result: Result<V, BoxError>) -> Result<V, BoxError> {
        result.map_err(|err| format!("argument ${}: {err}", self.entries[index].0).into())
    }
}

type ConstructFn = Arc<dyn Fn(Args) -> Result<Box<dyn Any + Send + Sync>, BoxError> + Send + Sync>;
type SetFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> Result<(), BoxError> + Send + Sync>;
type InvokeFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Args) -> Result<(), BoxError> + Send + Sync>;

/// A constructor: parameters plus the typed function that builds the object.
#[derive(Clone)]
pub struct Constructor {
    parameters: Vec<Parameter>,
    build: ConstructFn,
}

impl Constructor {
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, args: Args) -> Result<Box<dyn Any + Send + Sync>, BoxError> {
        (self.build)(args)
    }
}

/// A property as seen by recipes.
#[derive(Clone)]
pub struct Property {
    name: String,
    declared: Option<DeclaredType>,
    visibility: Visibility,
    setter: Option<SetFn>,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> Option<&DeclaredType> {
        self.declared.as_ref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Public and backed by a setter.
    pub fn is_writable(&self) -> bool {
        self.visibility == Visibility::Public && self.setter.is_some()
    }

    pub(crate) fn assign(&self, target: &mut (dyn Any + Send + Sync), value: Value) -> Result<(), BoxError> {
        match &self.setter {
            Some(set) => set(target, value),
            None => Err(format!("property {} is read-only", self.name).into()),
        }
    }
}

/// A method as seen by recipes.
#[derive(Clone)]
pub struct Method {
    name: String,
    parameters: Vec<Parameter>,
    visibility: Visibility,
    invoker: Option<InvokeFn>,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_callable(&self) -> bool {
        self.visibility == Visibility::Public && self.invoker.is_some()
    }

    pub(crate) fn invoke(&self, target: &mut (dyn Any + Send + Sync), args: Args) -> Result<(), BoxError> {
        match &self.invoker {
            Some(call) => call(target, args),
            None => Err(format!("method {} has no body", self.name).into()),
        }
    }
}

/// Everything the container knows about one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    supertypes: Vec<String>,
    constructor: Option<Constructor>,
    properties: HashMap<String, Property>,
    methods: HashMap<String, Method>,
}

impl TypeDescriptor {
    /// Starts describing the concrete Rust type `T`.
    ///
    /// The class name defaults to the short type name of `T`.
    pub fn of<T: Any + Send + Sync>() -> ClassBuilder<T> {
        ClassBuilder {
            descriptor: Self::bare(shorten_type_name(type_name::<T>()), TypeKind::Concrete),
            _marker: PhantomData,
        }
    }

    /// An interface: never instantiable, only used as a declared type.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::bare(name.into(), TypeKind::Interface)
    }

    /// An abstract class: never instantiable, only used as a declared type.
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::bare(name.into(), TypeKind::Abstract)
    }

    fn bare(name: String, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            supertypes: Vec::new(),
            constructor: None,
            properties: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    /// Declares a parent class or implemented interface.
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Direct parents and interfaces.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Concrete and with a constructor.
    pub fn is_constructible(&self) -> bool {
        self.kind == TypeKind::Concrete && self.constructor.is_some()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Parameters of the constructor (`None`) or of a named method.
    pub fn parameters(&self, method: Option<&str>) -> Option<&[Parameter]> {
        match method {
            None => self.constructor.as_ref().map(Constructor::parameters),
            Some(name) => self.methods.get(name).map(Method::parameters),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut properties: Vec<&String> = self.properties.keys().collect();
        properties.sort();
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supertypes", &self.supertypes)
            .field("constructor", &self.constructor.as_ref().map(|c| c.parameters.len()))
            .field("properties", &properties)
            .field("methods", &methods)
            .finish()
    }
}

/// Builds a [`TypeDescriptor`] for the Rust type `T`.
///
/// Setters and methods receive `&mut T`; the builder takes care of the
/// type-erased plumbing.
pub struct ClassBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    /// Overrides the class name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    /// Declares a parent class or implemented interface.
    pub fn implements(mut self, supertype: impl Into<String>) -> Self {
        self.descriptor.supertypes.push(supertype.into());
        self
    }

    pub fn constructor<F>(mut self, parameters: Vec<Parameter>, build: F) -> Self
    where
        F: Fn(Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.descriptor.constructor = Some(Constructor {
            parameters,
            build: Arc::new(move |args: Args| -> Result<Box<dyn Any + Send + Sync>, BoxError> {
                Ok(Box::new(build(args)?))
            }),
        });
        self
    }

    /// A public, writable property.
    pub fn property<F>(mut self, name: &str, declared: Option<&str>, set: F) -> Self
    where
        F: Fn(&mut T, Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let setter: SetFn = Arc::new(move |target: &mut (dyn Any + Send + Sync), value: Value| {
            set(downcast_target::<T>(target)?, value)
        });
        self.descriptor.properties.insert(
            name.to_string(),
            Property {
                name: name.to_string(),
                declared: declared.map(DeclaredType::parse),
                visibility: Visibility::Public,
                setter: Some(setter),
            },
        );
        self
    }

    /// A property recipes can see but not write.
    pub fn restricted_property(mut self, name: &str, declared: Option<&str>, visibility: Visibility) -> Self {
        self.descriptor.properties.insert(
            name.to_string(),
            Property {
                name: name.to_string(),
                declared: declared.map(DeclaredType::parse),
                visibility,
                setter: None,
            },
        );
        self
    }

    /// A public method callable from `name()` directives.
    pub fn method<F>(mut self, name: &str, parameters: Vec<Parameter>, call: F) -> Self
    where
        F: Fn(&mut T, Args) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let invoker: InvokeFn = Arc::new(move |target: &mut (dyn Any + Send + Sync), args: Args| {
            call(downcast_target::<T>(target)?, args)
        });
        self.descriptor.methods.insert(
            name.to_string(),
            Method {
                name: name.to_string(),
                parameters,
                visibility: Visibility::Public,
                invoker: Some(invoker),
            },
        );
        self
    }

    /// A method recipes can see but not call.
    pub fn restricted_method(mut self, name: &str, visibility: Visibility) -> Self {
        self.descriptor.methods.insert(
            name.to_string(),
            Method {
                name: name.to_string(),
                parameters: Vec::new(),
                visibility,
                invoker: None,
            },
        );
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

impl<T: Any + Send + Sync + Default> ClassBuilder<T> {
    /// A no-argument constructor using `T::default()`.
    pub fn default_constructor(self) -> Self {
        self.constructor(Vec::new(), |_| Ok(T::default()))
    }
}

fn downcast_target<T: Any>(target: &mut (dyn Any + Send + Sync)) -> Result<&mut T, BoxError> {
    target
        .downcast_mut::<T>()
        .ok_or_else(|| format!("target is not a {}", shorten_type_name(type_name::<T>())).into())
}
