//! Core container implementation for wireup.
//!
//! A [`Container`](container::Container) builds singleton instances from a
//! declarative configuration, using the [`Catalog`](catalog::Catalog) of
//! [`TypeDescriptor`](descriptor::TypeDescriptor)s to discover constructor
//! parameters, properties and methods.

mod building;
mod cache;
pub mod catalog;
pub mod container;
pub mod descriptor;
pub mod error;
pub mod provider;
pub mod registry;
pub mod strict;
pub mod value;

pub use container::{Container, ContainerOptions, prelude};
pub use error::{ContainerError, Result, WireupError};
pub use inventory;
pub use value::{Instance, Value};
