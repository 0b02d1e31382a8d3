//! Recursive field population with a per-path cycle guard.

use std::any::Any;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::builder::{Instance, InstanceBuilder};
use crate::catalog::TypeCatalog;
use crate::descriptor::{FieldDescriptor, FieldType};
use crate::value::Value;
use crate::value_gen::ValueSource;

/// Inclusive range for integer fields.
pub const INT_RANGE: (i32, i32) = (1, 1000);

/// Inclusive range for decimal fields.
pub const DECIMAL_RANGE: (f64, f64) = (10.0, 1000.0);

/// Inclusive range for generated sequence lengths.
pub const SEQUENCE_LEN: (i32, i32) = (1, 3);

/// Types entered along the current population path.
///
/// Never mutated in place: [`VisitedSet::with`] returns an extended copy, so
/// sibling branches only ever share their common ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedSet {
    types: BTreeSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    /// Copy of this set with `type_name` added.
    pub fn with(&self, type_name: &str) -> Self {
        let mut types = self.types.clone();
        types.insert(type_name.to_string());
        Self { types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Field-level counters for one or more populate calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Fields that received a value.
    pub fields_written: u64,
    /// Fields left unset (unsupported type, no write path, rejected value,
    /// unbuildable nested type).
    pub fields_skipped: u64,
    /// Nested fields left unset because their type was already on the path.
    pub cycles_cut: u64,
}

impl PopulationStats {
    pub fn merge(&mut self, other: PopulationStats) {
        self.fields_written += other.fields_written;
        self.fields_skipped += other.fields_skipped;
        self.cycles_cut += other.cycles_cut;
    }
}

/// Fills instances with synthetic values.
pub struct GraphPopulator<'a> {
    catalog: &'a TypeCatalog,
    builder: InstanceBuilder<'a>,
    source: &'a mut dyn ValueSource,
    stats: PopulationStats,
}

impl<'a> GraphPopulator<'a> {
    pub fn new(catalog: &'a TypeCatalog, source: &'a mut dyn ValueSource) -> Self {
        Self {
            catalog,
            builder: InstanceBuilder::new(catalog),
            source,
            stats: PopulationStats::default(),
        }
    }

    pub fn stats(&self) -> PopulationStats {
        self.stats
    }

    /// Fill every writable field of `instance`.
    ///
    /// No-op when the instance's type is already in `seen`. Nested objects
    /// are populated with a copy of `seen` extended by this type.
    pub fn populate(&mut self, instance: &mut Instance, seen: VisitedSet) {
        let catalog = self.catalog;
        let type_name = instance.type_name().to_string();
        if seen.contains(&type_name) {
            trace!(type_name = %type_name, "already on path, not populating");
            return;
        }
        let Some(descriptor) = catalog.get(&type_name) else {
            debug!(type_name = %type_name, "instance type not in catalog");
            return;
        };
        let seen = seen.with(&type_name);

        for field in descriptor.fields() {
            if !field.can_write() {
                trace!(type_name = %type_name, field = %field.name(), "field has no write path");
                self.stats.fields_skipped += 1;
                continue;
            }
            match self.value_for(field.field_type(), &seen) {
                Some(value) => {
                    if self.assign(&type_name, field, instance.value_mut(), value) {
                        self.stats.fields_written += 1;
                    } else {
                        self.stats.fields_skipped += 1;
                    }
                }
                None => self.stats.fields_skipped += 1,
            }
        }
    }

    /// Synthetic value for one field type, or `None` to leave the field unset.
    fn value_for(&mut self, field_type: &FieldType, seen: &VisitedSet) -> Option<Value> {
        match field_type {
            FieldType::Text => Some(Value::Text(self.source.word())),
            FieldType::Integer => Some(Value::Integer(self.source.int(INT_RANGE.0, INT_RANGE.1))),
            FieldType::Decimal => Some(Value::Decimal(
                self.source.decimal(DECIMAL_RANGE.0, DECIMAL_RANGE.1),
            )),
            FieldType::Uuid => Some(Value::Uuid(self.source.uuid())),
            FieldType::Timestamp => Some(Value::Timestamp(self.source.recent_timestamp())),
            FieldType::Enum(name) => self.enum_member(name).map(Value::Variant),
            FieldType::Sequence(element) => self.sequence(element, seen),
            FieldType::Object(name) => self.nested(name, seen).map(Value::Object),
            FieldType::Unsupported(_) => None,
        }
    }

    fn enum_member(&mut self, name: &str) -> Option<Box<dyn Any>> {
        let descriptor = self.catalog.get(name).filter(|d| d.is_enum())?;
        let index = self.source.pick(descriptor.member_count())?;
        descriptor.member(index)
    }

    fn sequence(&mut self, element: &FieldType, seen: &VisitedSet) -> Option<Value> {
        if let FieldType::Object(name) = element {
            if seen.contains(name) {
                trace!(element = %name, "sequence element type already on path");
                self.stats.cycles_cut += 1;
                return None;
            }
        }
        let len = self.source.int(SEQUENCE_LEN.0, SEQUENCE_LEN.1).max(0) as usize;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            // Each element starts from the parent's path only
            let branch = seen.clone();
            if let Some(item) = self.value_for(element, &branch) {
                items.push(item);
            }
        }
        if items.is_empty() {
            None
        } else {
            Some(Value::Sequence(items))
        }
    }

    fn nested(&mut self, declared: &str, seen: &VisitedSet) -> Option<Box<dyn Any>> {
        if seen.contains(declared) {
            trace!(declared = %declared, "nested type already on path");
            self.stats.cycles_cut += 1;
            return None;
        }
        let mut instance = self.builder.build(declared)?;
        if seen.contains(instance.type_name()) {
            trace!(
                declared = %declared,
                concrete = %instance.type_name(),
                "resolved type already on path"
            );
            self.stats.cycles_cut += 1;
            return None;
        }
        self.populate(&mut instance, seen.clone());
        self.builder.upcast(instance, declared)
    }

    /// Write through the public setter, falling back to the private one.
    fn assign(
        &self,
        type_name: &str,
        field: &FieldDescriptor,
        target: &mut dyn Any,
        value: Value,
    ) -> bool {
        let (setter, path) = match (field.setter(), field.private_setter()) {
            (Some(setter), _) => (setter, "setter"),
            (None, Some(setter)) => (setter, "private setter"),
            (None, None) => return false,
        };
        let kind = value.kind();
        let written = setter(target, value);
        if !written {
            debug!(
                type_name = %type_name,
                field = %field.name(),
                path = path,
                value_kind = kind,
                "field rejected value"
            );
        }
        written
    }
}
