//! Provider trait: a module of related type descriptors.
//!
//! Providers group the descriptors of one area of an application so the
//! composition root can assemble a [`Catalog`](crate::catalog::Catalog)
//! from a few modules instead of one long list.
//!
//! # Examples
//! ```rust,ignore
//! struct MailProvider;
//!
//! impl Provider for MailProvider {
//!     fn register(&self, registry: &mut dyn DescriptorRegistry) {
//!         registry.add_descriptor(TypeDescriptor::interface("TransportInterface"));
//!         registry.add_descriptor(smtp_transport_descriptor());
//!         registry.add_descriptor(mailer_descriptor());
//!     }
//! }
//!
//! let catalog = Catalog::new().add_provider(&MailProvider);
//! ```

use crate::descriptor::TypeDescriptor;

/// A module that registers related type descriptors.
pub trait Provider: Send + Sync {
    /// Register descriptors. Called once while the catalog is assembled.
    fn register(&self, registry: &mut dyn DescriptorRegistry);

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// What providers register into.
///
/// Implemented by [`Catalog`](crate::catalog::Catalog); kept as a trait so
/// providers can be tested against a mock.
pub trait DescriptorRegistry {
    fn add_descriptor(&mut self, descriptor: TypeDescriptor);
}
