//! Raw instance construction.
//!
//! Resolves a concrete type for a (possibly abstract) target and runs its raw
//! factory. Nothing here returns an error: an unresolvable or unconstructible
//! type is reported as `None` and the caller skips it.

use std::any::Any;

use tracing::debug;

use crate::catalog::TypeCatalog;
use crate::errors::ScanError;

/// A freshly constructed, not yet populated instance of a concrete type.
pub struct Instance {
    type_name: String,
    value: Box<dyn Any>,
}

impl Instance {
    pub fn new(type_name: impl Into<String>, value: Box<dyn Any>) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }

    /// Name of the concrete (most-derived) type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value_mut(&mut self) -> &mut dyn Any {
        self.value.as_mut()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn into_parts(self) -> (String, Box<dyn Any>) {
        (self.type_name, self.value)
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Builds raw instances from catalog factories.
#[derive(Clone, Copy)]
pub struct InstanceBuilder<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> InstanceBuilder<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    /// Build a raw instance for `target`, or `None` if nothing fits.
    pub fn build(&self, target: &str) -> Option<Instance> {
        self.try_build(target).ok()
    }

    /// Like [`build`](Self::build), but says why nothing was built.
    pub fn try_build(&self, target: &str) -> Result<Instance, ScanError> {
        let Some(descriptor) = self.catalog.first_concrete_assignable(target) else {
            debug!(target = %target, "no concrete type to build");
            return Err(ScanError::unbuildable(target));
        };
        match descriptor.instantiate() {
            Ok(value) => Ok(Instance::new(descriptor.name(), value)),
            Err(e) => {
                debug!(
                    target = %target,
                    concrete = %descriptor.name(),
                    error = %e,
                    "raw instantiation failed"
                );
                Err(ScanError::population_failure(descriptor.name(), e.to_string()))
            }
        }
    }

    /// Convert a populated instance into the representation `target` expects
    /// (identity when `target` is the instance's own type).
    pub fn upcast(&self, instance: Instance, target: &str) -> Option<Box<dyn Any>> {
        let (type_name, value) = instance.into_parts();
        let descriptor = self.catalog.get(&type_name)?;
        let upcast = descriptor.upcast_to(target, value);
        if upcast.is_none() {
            debug!(
                concrete = %type_name,
                target = %target,
                "no upcast registered"
            );
        }
        upcast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeDescriptor;
    use anyhow::anyhow;
    use serde::Serialize;

    trait Shape {
        fn sides(&self) -> u32;
    }

    #[derive(Default, Serialize)]
    struct Square {
        size: i32,
    }

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    #[derive(Serialize)]
    struct Fragile;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.register(TypeDescriptor::interface("Shape")).unwrap();
        catalog.register(TypeDescriptor::interface("Orphan")).unwrap();
        catalog
            .register(
                TypeDescriptor::concrete::<Square>("Square")
                    .implements::<dyn Shape>("Shape", |s| s as Box<dyn Shape>),
            )
            .unwrap();
        catalog
            .register(TypeDescriptor::concrete_with::<Fragile, _>("Fragile", || {
                Err(anyhow!("uninitialized construction refused"))
            }))
            .unwrap();
        catalog
    }

    #[test]
    fn test_build_concrete_directly() {
        let catalog = catalog();
        let instance = InstanceBuilder::new(&catalog).build("Square").unwrap();
        assert_eq!(instance.type_name(), "Square");
        assert_eq!(instance.downcast_ref::<Square>().unwrap().size, 0);
    }

    #[test]
    fn test_build_interface_resolves_first_concrete() {
        let catalog = catalog();
        let instance = InstanceBuilder::new(&catalog).build("Shape").unwrap();
        assert_eq!(instance.type_name(), "Square");
    }

    #[test]
    fn test_build_without_implementation_is_absent() {
        let catalog = catalog();
        let builder = InstanceBuilder::new(&catalog);
        assert!(builder.build("Orphan").is_none());
        assert!(builder.build("NotRegistered").is_none());
        assert!(matches!(
            builder.try_build("Orphan"),
            Err(ScanError::UnbuildableType { .. })
        ));
    }

    #[test]
    fn test_factory_failure_is_absent() {
        let catalog = catalog();
        let builder = InstanceBuilder::new(&catalog);
        assert!(builder.build("Fragile").is_none());
        match builder.try_build("Fragile") {
            Err(ScanError::PopulationFailure { type_name, message }) => {
                assert_eq!(type_name, "Fragile");
                assert!(message.contains("refused"));
            }
            other => panic!("expected PopulationFailure, got {:?}", other.map(|i| i.type_name().to_string())),
        }
    }

    #[test]
    fn test_upcast_into_trait_object() {
        let catalog = catalog();
        let builder = InstanceBuilder::new(&catalog);
        let instance = builder.build("Shape").unwrap();
        let boxed = builder.upcast(instance, "Shape").unwrap();
        let shape = boxed.downcast::<Box<dyn Shape>>().unwrap();
        assert_eq!(shape.sides(), 4);
    }

    #[test]
    fn test_upcast_identity_and_missing() {
        let catalog = catalog();
        let builder = InstanceBuilder::new(&catalog);
        let same = builder.upcast(builder.build("Square").unwrap(), "Square").unwrap();
        assert!(same.downcast::<Square>().is_ok());
        assert!(builder
            .upcast(builder.build("Square").unwrap(), "Orphan")
            .is_none());
    }
}
