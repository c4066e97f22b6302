//! # Wireup Support
//!
//! Shared text helpers for the wireup container crates.
//!
//! This crate provides:
//! - Rendering of construction chains for circular-reference errors
//! - Type name shortening for descriptors built from Rust types
//! - "Did you mean?" suggestions for unknown identifiers

pub mod rendering;
