//! The catalog of known types: the container's Type Inspector.
//!
//! Maps class names to their [`TypeDescriptor`]s and answers the questions
//! resolution needs: does a class exist, can it be built, what parameters
//! does a callable declare, and is one type a subtype of another.
//!
//! Descriptors are added explicitly, through a [`Provider`], or collected
//! from link-time registrations:
//!
//! ```rust,ignore
//! fn mailer() -> TypeDescriptor {
//!     TypeDescriptor::of::<Mailer>().default_constructor().build()
//! }
//!
//! wireup_container::inventory::submit! {
//!     DescriptorRegistration::new(mailer)
//! }
//!
//! let catalog = Catalog::collect();
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::descriptor::{Parameter, TypeDescriptor};
use crate::provider::{DescriptorRegistry, Provider};

/// A descriptor submitted with `inventory::submit!`.
pub struct DescriptorRegistration {
    build: fn() -> TypeDescriptor,
}

impl DescriptorRegistration {
    pub const fn new(build: fn() -> TypeDescriptor) -> Self {
        Self { build }
    }
}

inventory::collect!(DescriptorRegistration);

/// Known types by class name.
#[derive(Default, Clone)]
pub struct Catalog {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every descriptor submitted through `inventory`.
    pub fn collect() -> Self {
        let mut catalog = Self::new();
        for registration in inventory::iter::<DescriptorRegistration> {
            catalog.register((registration.build)());
        }
        debug!(types = catalog.len(), "Collected submitted descriptors");
        catalog
    }

    /// Adds a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        trace!(class = descriptor.name(), kind = ?descriptor.kind(), "Registered type");
        self.types
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
        self
    }

    /// Builder-style [`Catalog::register`].
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Lets a [`Provider`] register its descriptors.
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(&mut self);
        self
    }

    pub fn get(&self, class: &str) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(class)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.types.contains_key(class)
    }

    /// Known, concrete and with a constructor.
    pub fn is_constructible(&self, class: &str) -> bool {
        self.types
            .get(class)
            .is_some_and(|descriptor| descriptor.is_constructible())
    }

    /// Ordered parameters of `class`'s constructor (`method == None`) or of a method.
    ///
    /// Returns `None` if the class or method is unknown.
    pub fn parameters(&self, class: &str, method: Option<&str>) -> Option<&[Parameter]> {
        self.types.get(class)?.parameters(method)
    }

    /// `true` if `class` is `target` or extends/implements it, directly or not.
    pub fn is_subtype(&self, class: &str, target: &str) -> bool {
        if class == target {
            return true;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([class]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            let Some(descriptor) = self.types.get(current) else {
                continue;
            };
            for parent in descriptor.supertypes() {
                if parent == target {
                    return true;
                }
                queue.push_back(parent);
            }
        }

        false
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }
}

impl DescriptorRegistry for Catalog {
    fn add_descriptor(&mut self, descriptor: TypeDescriptor) {
        self.register(descriptor);
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("Catalog").field("types", &names).finish()
    }
}
