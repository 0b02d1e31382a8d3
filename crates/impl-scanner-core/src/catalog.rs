//! Type catalog and candidate filters.
//!
//! The catalog is the explicit stand-in for "all types loaded in the
//! program". Types are kept in registration order, which is the discovery
//! order every query reports.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::TypeDescriptor;
use crate::errors::ScanError;

/// Registered types, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, usize>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type. Names are unique, and a field whose setter cannot accept
    /// its class's value is rejected here rather than left unset on every scan.
    pub fn register(&mut self, descriptor: impl Into<TypeDescriptor>) -> Result<(), ScanError> {
        let descriptor = descriptor.into();
        if let Some(defect) = descriptor.defects().first() {
            return Err(ScanError::invalid_argument(format!(
                "type {} has a mistyped field: {}",
                descriptor.name(),
                defect
            )));
        }
        if self.by_name.contains_key(descriptor.name()) {
            return Err(ScanError::invalid_argument(format!(
                "type {} is already registered",
                descriptor.name()
            )));
        }
        debug!(
            type_name = %descriptor.name(),
            kind = ?descriptor.kind(),
            fields = descriptor.fields().len(),
            "registered type"
        );
        self.by_name
            .insert(descriptor.name().to_string(), self.types.len());
        self.types.push(descriptor);
        Ok(())
    }

    /// Register several types, stopping at the first rejected one.
    pub fn register_all<I, D>(&mut self, descriptors: I) -> Result<(), ScanError>
    where
        I: IntoIterator<Item = D>,
        D: Into<TypeDescriptor>,
    {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name).and_then(|idx| self.types.get(*idx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All types, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = TypeRef<'_>> {
        self.types.iter().map(move |descriptor| TypeRef {
            descriptor,
            catalog: self,
        })
    }

    /// Types matching `predicate`, in registration order.
    pub fn find_types<P>(&self, predicate: P) -> Vec<&TypeDescriptor>
    where
        P: Fn(TypeRef<'_>) -> bool,
    {
        self.iter()
            .filter(|ty| predicate(*ty))
            .map(|ty| ty.descriptor)
            .collect()
    }

    /// Types matching `filter`, in registration order.
    pub fn find_filtered(&self, filter: &TypeFilter) -> Vec<&TypeDescriptor> {
        self.find_types(|ty| filter.matches(ty))
    }

    /// Whether `name` reaches `ancestor` through declared supertypes.
    ///
    /// Strict: a type is not its own subtype. Unknown names and supertype
    /// cycles are tolerated.
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> bool {
        let mut stack: Vec<&str> = match self.get(name) {
            Some(descriptor) => descriptor.supertypes().iter().map(String::as_str).collect(),
            None => return false,
        };
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == ancestor {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(descriptor) = self.get(current) {
                stack.extend(descriptor.supertypes().iter().map(String::as_str));
            }
        }
        false
    }

    /// Reflexive subtype test: `name == target` or `name` is a subtype.
    pub fn is_assignable(&self, name: &str, target: &str) -> bool {
        name == target || self.is_subtype(name, target)
    }

    /// First constructible type assignable to `target`, in registration
    /// order. `target` itself wins when it is concrete.
    pub fn first_concrete_assignable(&self, target: &str) -> Option<&TypeDescriptor> {
        if let Some(descriptor) = self.get(target) {
            if descriptor.is_concrete() {
                return Some(descriptor);
            }
        }
        self.types
            .iter()
            .find(|descriptor| descriptor.is_concrete() && self.is_subtype(descriptor.name(), target))
    }
}

/// A descriptor viewed together with its catalog, so filters can ask
/// relationship questions.
#[derive(Clone, Copy)]
pub struct TypeRef<'a> {
    descriptor: &'a TypeDescriptor,
    catalog: &'a TypeCatalog,
}

impl<'a> TypeRef<'a> {
    pub fn descriptor(&self) -> &'a TypeDescriptor {
        self.descriptor
    }

    pub fn name(&self) -> &'a str {
        self.descriptor.name()
    }

    pub fn is_abstract(&self) -> bool {
        self.descriptor.is_abstract()
    }

    pub fn is_interface(&self) -> bool {
        self.descriptor.is_interface()
    }

    pub fn is_enum(&self) -> bool {
        self.descriptor.is_enum()
    }

    pub fn is_concrete(&self) -> bool {
        self.descriptor.is_concrete()
    }

    /// Strict subtype of `ancestor`.
    pub fn is_subtype_of(&self, ancestor: &str) -> bool {
        self.catalog.is_subtype(self.name(), ancestor)
    }

    /// Equal to or a subtype of `target`.
    pub fn is_assignable_to(&self, target: &str) -> bool {
        self.catalog.is_assignable(self.name(), target)
    }
}

impl Debug for TypeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name()).finish()
    }
}

/// Extra restriction layered over the default candidate predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value")]
pub enum FilterRule {
    NameSuffix(String),
    NamePrefix(String),
    NameContains(String),
    /// Drop one type by exact name.
    Exclude(String),
}

impl FilterRule {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            FilterRule::NameSuffix(suffix) => name.ends_with(suffix.as_str()),
            FilterRule::NamePrefix(prefix) => name.starts_with(prefix.as_str()),
            FilterRule::NameContains(part) => name.contains(part.as_str()),
            FilterRule::Exclude(excluded) => name != excluded,
        }
    }
}

type Predicate = Arc<dyn Fn(TypeRef<'_>) -> bool + Send + Sync>;

/// Predicate selecting candidate types for a scan.
#[derive(Clone)]
pub struct TypeFilter {
    predicate: Predicate,
    label: String,
}

impl TypeFilter {
    /// Non-abstract, non-interface, constructible types assignable to
    /// `base`. A concrete base matches itself.
    ///
    /// This is reflexive on purpose and differs from a strict subtype test:
    /// `Transaction` yields both `Transaction` and `RefundTransaction`. For
    /// abstract and interface bases the two rules agree.
    pub fn default_for(base: impl Into<String>) -> Self {
        let base = base.into();
        let label = format!("concrete subtypes of {}", base);
        Self {
            predicate: Arc::new(move |ty: TypeRef<'_>| is_default_candidate(ty, &base)),
            label,
        }
    }

    /// Arbitrary caller predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(TypeRef<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            label: "custom".to_string(),
        }
    }

    /// The default predicate for `base`, narrowed by every rule in `rules`.
    ///
    /// An empty rule list is rejected: it would silently mean "no filter".
    pub fn from_rules(base: impl Into<String>, rules: Vec<FilterRule>) -> Result<Self, ScanError> {
        if rules.is_empty() {
            return Err(ScanError::invalid_argument(
                "filter rules must not be empty",
            ));
        }
        let base = base.into();
        let label = format!("concrete subtypes of {} with {:?}", base, rules);
        Ok(Self {
            predicate: Arc::new(move |ty: TypeRef<'_>| {
                is_default_candidate(ty, &base) && rules.iter().all(|rule| rule.matches(ty.name()))
            }),
            label,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, ty: TypeRef<'_>) -> bool {
        (self.predicate)(ty)
    }
}

impl Debug for TypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeFilter")
            .field("label", &self.label)
            .finish()
    }
}

fn is_default_candidate(ty: TypeRef<'_>, base: &str) -> bool {
    ty.is_concrete() && !ty.is_abstract() && !ty.is_interface() && ty.is_assignable_to(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldType;
    use serde::Serialize;

    #[derive(Default, Serialize)]
    struct Plain {
        name: String,
    }

    fn sample_catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.register(TypeDescriptor::interface("Event")).unwrap();
        catalog
            .register(TypeDescriptor::abstract_type("DomainEvent").extends("Event"))
            .unwrap();
        catalog
            .register(
                TypeDescriptor::concrete::<Plain>("UserCreatedEvent")
                    .extends("DomainEvent")
                    .field("name", FieldType::Text, |p: &mut Plain, v: String| p.name = v),
            )
            .unwrap();
        catalog
            .register(TypeDescriptor::concrete::<Plain>("Transaction").extends("Event"))
            .unwrap();
        catalog
            .register(TypeDescriptor::concrete::<Plain>("Unrelated"))
            .unwrap();
        catalog
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut catalog = sample_catalog();
        let err = catalog
            .register(TypeDescriptor::interface("Event"))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgument { .. }));
        assert_eq!(catalog.len(), 5);
    }

    #[derive(Default, Serialize)]
    struct Ledger {
        amount: i64,
        count: u32,
        ratio: f32,
    }

    #[test]
    fn test_mistyped_setters_rejected() {
        let cases: Vec<(&str, TypeDescriptor)> = vec![
            (
                "amount",
                TypeDescriptor::concrete::<Ledger>("Ledger")
                    .field("amount", FieldType::Integer, |l: &mut Ledger, v: i64| l.amount = v)
                    .build(),
            ),
            (
                "count",
                TypeDescriptor::concrete::<Ledger>("Ledger")
                    .private_field("count", FieldType::Integer, |l: &mut Ledger, v: u32| {
                        l.count = v
                    })
                    .build(),
            ),
            (
                "ratio",
                TypeDescriptor::concrete::<Ledger>("Ledger")
                    .field("ratio", FieldType::Decimal, |l: &mut Ledger, v: f32| l.ratio = v)
                    .build(),
            ),
        ];

        for (field, descriptor) in cases {
            let mut catalog = TypeCatalog::new();
            let err = catalog.register(descriptor).unwrap_err();
            assert!(matches!(err, ScanError::InvalidArgument { .. }), "{field}: {err}");
            let message = err.to_string();
            assert!(message.contains(&format!("Ledger.{field}")), "{message}");
            assert!(message.contains("catalog::tests::Ledger"), "{message}");
            assert!(!catalog.contains("Ledger"));
        }
    }

    #[test]
    fn test_mistyped_sequence_element_rejected() {
        #[derive(Default, Serialize)]
        struct Scores {
            values: Vec<i64>,
        }
        let mut catalog = TypeCatalog::new();
        let err = catalog
            .register(
                TypeDescriptor::concrete::<Scores>("Scores")
                    .sequence("values", FieldType::Integer, |s: &mut Scores, v: Vec<i64>| {
                        s.values = v
                    }),
            )
            .unwrap_err();
        assert!(err.to_string().contains("element setter takes i64"));
    }

    #[test]
    fn test_register_all_stops_at_first_rejected() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register_all(vec![
                TypeDescriptor::interface("Event"),
                TypeDescriptor::concrete::<Plain>("Note")
                    .extends("Event")
                    .field("name", FieldType::Text, |p: &mut Plain, v: String| p.name = v)
                    .build(),
            ])
            .unwrap();
        assert_eq!(catalog.len(), 2);

        let err = catalog
            .register_all(vec![
                TypeDescriptor::abstract_type("Base"),
                TypeDescriptor::interface("Event"),
                TypeDescriptor::abstract_type("Never"),
            ])
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgument { .. }));
        assert!(catalog.contains("Base"));
        assert!(!catalog.contains("Never"));
    }

    #[test]
    fn test_transitive_subtype() {
        let catalog = sample_catalog();
        assert!(catalog.is_subtype("UserCreatedEvent", "DomainEvent"));
        assert!(catalog.is_subtype("UserCreatedEvent", "Event"));
        assert!(!catalog.is_subtype("Event", "Event"));
        assert!(catalog.is_assignable("Event", "Event"));
        assert!(!catalog.is_subtype("Unrelated", "Event"));
        assert!(!catalog.is_subtype("Missing", "Event"));
    }

    #[test]
    fn test_supertype_cycle_terminates() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(TypeDescriptor::interface("A").extends("B"))
            .unwrap();
        catalog
            .register(TypeDescriptor::interface("B").extends("A"))
            .unwrap();
        assert!(catalog.is_subtype("A", "B"));
        assert!(!catalog.is_subtype("A", "C"));
    }

    #[test]
    fn test_default_filter_in_registration_order() {
        let catalog = sample_catalog();
        let names: Vec<&str> = catalog
            .find_filtered(&TypeFilter::default_for("Event"))
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["UserCreatedEvent", "Transaction"]);
    }

    #[test]
    fn test_default_filter_includes_concrete_base() {
        let catalog = sample_catalog();
        let names: Vec<&str> = catalog
            .find_filtered(&TypeFilter::default_for("Transaction"))
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["Transaction"]);
        assert!(catalog
            .find_filtered(&TypeFilter::default_for("DomainEvent"))
            .iter()
            .all(|d| d.name() != "DomainEvent"));
    }

    #[test]
    fn test_suffix_rule_excludes_transaction() {
        let catalog = sample_catalog();
        let filter =
            TypeFilter::from_rules("Event", vec![FilterRule::NameSuffix("Event".into())]).unwrap();
        let names: Vec<&str> = catalog
            .find_filtered(&filter)
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["UserCreatedEvent"]);
    }

    #[test]
    fn test_empty_rules_rejected() {
        let err = TypeFilter::from_rules("Event", vec![]).unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgument { .. }));
    }

    #[test]
    fn test_custom_predicate() {
        let catalog = sample_catalog();
        let filter = TypeFilter::new(|ty| ty.is_concrete() && !ty.is_subtype_of("Event"));
        let names: Vec<&str> = catalog
            .find_filtered(&filter)
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["Unrelated"]);
        assert_eq!(filter.label(), "custom");
    }

    #[test]
    fn test_first_concrete_assignable() {
        let catalog = sample_catalog();
        assert_eq!(
            catalog.first_concrete_assignable("Event").map(|d| d.name()),
            Some("UserCreatedEvent")
        );
        assert_eq!(
            catalog.first_concrete_assignable("Transaction").map(|d| d.name()),
            Some("Transaction")
        );
        assert!(catalog.first_concrete_assignable("Missing").is_none());
    }

    #[test]
    fn test_exclude_rule() {
        assert!(FilterRule::Exclude("Transaction".into()).matches("UserCreatedEvent"));
        assert!(!FilterRule::Exclude("Transaction".into()).matches("Transaction"));
        assert!(FilterRule::NamePrefix("User".into()).matches("UserCreatedEvent"));
        assert!(FilterRule::NameContains("Created".into()).matches("UserCreatedEvent"));
    }
}
