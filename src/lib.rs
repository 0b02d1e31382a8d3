//! Implementation Scanner CLI
//!
//! Command-line front end over [`impl_scanner_core`]:
//!
//! - **Discovery**: List every concrete implementation of a base type
//! - **Fixtures**: Emit one populated instance per implementation as JSON
//! - **Filtering**: Narrow candidates by name suffix or exclusion
//!
//! The scanned types come from the sample library in [`demo`].

pub mod args;
pub mod demo;
