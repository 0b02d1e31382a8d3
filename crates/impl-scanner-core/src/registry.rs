//! Process-wide type registry.
//!
//! Fixture crates register their types once at startup; scanners take a
//! snapshot with [`TypeCatalog::from_global`]. The snapshot is owned by the
//! scanner, so later registrations do not affect a scan in progress.

use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::catalog::TypeCatalog;
use crate::descriptor::TypeDescriptor;
use crate::errors::ScanError;

static GLOBAL: LazyLock<RwLock<TypeCatalog>> = LazyLock::new(|| RwLock::new(TypeCatalog::new()));

/// Register a type in the process-wide registry.
pub fn register_global(descriptor: impl Into<TypeDescriptor>) -> Result<(), ScanError> {
    GLOBAL.write().register(descriptor)
}

/// Whether the process-wide registry knows `name`.
pub fn is_registered(name: &str) -> bool {
    GLOBAL.read().contains(name)
}

/// Number of globally registered types.
pub fn global_len() -> usize {
    GLOBAL.read().len()
}

impl TypeCatalog {
    /// Snapshot of the process-wide registry.
    pub fn from_global() -> Self {
        GLOBAL.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_snapshot() {
        register_global(TypeDescriptor::interface("RegistryTestMarker")).unwrap();
        assert!(is_registered("RegistryTestMarker"));

        let snapshot = TypeCatalog::from_global();
        assert!(snapshot.contains("RegistryTestMarker"));
        assert!(global_len() >= 1);

        let err = register_global(TypeDescriptor::interface("RegistryTestMarker")).unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgument { .. }));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut snapshot = TypeCatalog::from_global();
        snapshot
            .register(TypeDescriptor::interface("SnapshotOnlyMarker"))
            .unwrap();
        assert!(!is_registered("SnapshotOnlyMarker"));
    }
}
