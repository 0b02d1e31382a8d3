//! Implementation Scanner Core
//!
//! Discovers every concrete implementation of a base type and produces one
//! instance of each, populated with plausible synthetic data.
//!
//! # Features
//!
//! - **Type catalog**: Explicit registry of types, supertypes and field tables
//! - **Candidate filters**: Default "concrete subtypes" filter, replaceable per base
//! - **Graph population**: Recursive fill of nested objects and lists with cycle cuts
//! - **JSON output**: Each instance serialized with its most-derived type
//!
//! # Core Modules
//!
//! - [`catalog`]: TypeCatalog and TypeFilter
//! - [`descriptor`]: Type and field descriptors with erased setters
//! - [`populator`]: GraphPopulator and the cycle guard
//! - [`scanner`]: Scanner, the entry point tying it all together
//! - [`registry`]: Process-wide catalog for self-registering types
//! - [`value_gen`]: Seeded fake-value generation
//!
//! # Example
//!
//! ```
//! use impl_scanner_core::{FieldType, ScanConfig, Scanner, TypeCatalog, TypeDescriptor};
//! use serde::Serialize;
//!
//! #[derive(Default, Serialize)]
//! struct UserCreated {
//!     username: String,
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register(TypeDescriptor::abstract_type("BaseEvent"))?;
//! catalog.register(
//!     TypeDescriptor::concrete::<UserCreated>("UserCreated")
//!         .extends("BaseEvent")
//!         .field("username", FieldType::Text, |e: &mut UserCreated, v: String| e.username = v),
//! )?;
//!
//! let mut scanner = Scanner::new(catalog, ScanConfig::seeded(42));
//! let events = scanner.generate("BaseEvent");
//! assert_eq!(events.len(), 1);
//! assert!(!events[0].downcast_ref::<UserCreated>().unwrap().username.is_empty());
//! # Ok::<(), impl_scanner_core::ScanError>(())
//! ```

#![allow(clippy::type_complexity)]

pub mod builder;
pub mod catalog;
pub mod descriptor;
pub mod errors;
pub mod json;
pub mod populator;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod value;
pub mod value_gen;

pub use builder::{Instance, InstanceBuilder};
pub use catalog::{FilterRule, TypeCatalog, TypeFilter, TypeRef};
pub use descriptor::{FieldDescriptor, FieldType, TypeDescriptor, TypeKind};
pub use errors::ScanError;
pub use json::JsonOptions;
pub use populator::{GraphPopulator, PopulationStats, VisitedSet};
pub use registry::{global_len, is_registered, register_global};
pub use report::ScanReport;
pub use scanner::{instances_to_json, PopulatedInstance, ScanConfig, ScanOutcome, Scanner};
pub use value::Value;
pub use value_gen::{FakeValueGenerator, ValueSource, DEFAULT_LOCALE};
