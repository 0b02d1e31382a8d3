//! Sample types scanned by the CLI.

pub mod events;

use std::sync::OnceLock;

use anyhow::{Context, Result};
use impl_scanner_core::{registry, ScanError, TypeCatalog};

pub use events::Event;

static INSTALLED: OnceLock<Result<(), ScanError>> = OnceLock::new();

/// A fresh catalog holding the sample library.
pub fn catalog() -> Result<TypeCatalog> {
    let mut catalog = TypeCatalog::new();
    events::register(&mut catalog).context("Failed to register sample events")?;
    Ok(catalog)
}

/// Register the sample library in the process-wide registry. Runs once;
/// later calls return the first outcome.
pub fn install() -> Result<()> {
    let outcome = INSTALLED.get_or_init(|| {
        let mut catalog = TypeCatalog::new();
        events::register(&mut catalog)?;
        for ty in catalog.iter() {
            registry::register_global(ty.descriptor().clone())?;
        }
        Ok(())
    });
    outcome
        .clone()
        .context("Failed to install sample events into the global registry")
}
