//! Type and field descriptors.
//!
//! A [`TypeDescriptor`] is the registration-time replacement for runtime
//! reflection: it records a type's kind, its declared supertypes, a table of
//! field descriptors with setter closures, and (for concrete types) a raw
//! factory plus a serializer for the most-derived type.
//!
//! # Example
//!
//! ```
//! use impl_scanner_core::descriptor::{FieldType, TypeDescriptor};
//! use serde::Serialize;
//!
//! #[derive(Default, Serialize)]
//! struct UserCreated {
//!     username: String,
//! }
//!
//! let base = TypeDescriptor::interface("Event");
//! let user = TypeDescriptor::concrete::<UserCreated>("UserCreated")
//!     .extends("Event")
//!     .field("username", FieldType::Text, |e: &mut UserCreated, v: String| e.username = v)
//!     .build();
//!
//! assert!(base.is_interface());
//! assert!(user.is_concrete());
//! assert_eq!(user.fields().len(), 1);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::json::{self, JsonOptions};
use crate::value::Value;

/// Produces a zero-state instance without running normal construction.
pub type Factory = Arc<dyn Fn() -> Result<Box<dyn Any>> + Send + Sync>;

/// Writes a value into a field; returns `false` if the value was rejected.
pub type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> bool + Send + Sync>;

/// Serializes a concrete instance using its most-derived type.
pub type Serializer = Arc<dyn Fn(&dyn Any, &JsonOptions) -> serde_json::Result<String> + Send + Sync>;

/// Converts a concrete instance into the representation of a base type.
pub type Upcast = Arc<dyn Fn(Box<dyn Any>) -> Option<Box<dyn Any>> + Send + Sync>;

type MemberFactory = Arc<dyn Fn(usize) -> Option<Box<dyn Any>> + Send + Sync>;

/// Structural kind of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Concrete,
    Abstract,
    Interface,
    Enum,
}

/// Semantic class of a field, used to pick the synthetic value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Uuid,
    Timestamp,
    /// A registered enumeration, by name.
    Enum(String),
    /// A list or array of the element type.
    Sequence(Box<FieldType>),
    /// A registered object type (concrete, abstract or interface), by name.
    Object(String),
    /// Anything the populator does not know how to fill.
    Unsupported(String),
}

impl FieldType {
    pub fn object(type_name: impl Into<String>) -> Self {
        FieldType::Object(type_name.into())
    }

    pub fn enumeration(type_name: impl Into<String>) -> Self {
        FieldType::Enum(type_name.into())
    }

    pub fn sequence_of(element: FieldType) -> Self {
        FieldType::Sequence(Box::new(element))
    }

    pub fn unsupported(rust_type: impl Into<String>) -> Self {
        FieldType::Unsupported(rust_type.into())
    }

    /// Element type if this is a sequence.
    pub fn element_type(&self) -> Option<&FieldType> {
        match self {
            FieldType::Sequence(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_collection_of(&self, element: &FieldType) -> bool {
        self.element_type() == Some(element)
    }

    /// Rust type a setter must accept for a primitive class. `None` for
    /// classes whose representation is chosen at registration.
    pub fn primitive_rust_type(&self) -> Option<(TypeId, &'static str)> {
        fn of<V: Any>() -> Option<(TypeId, &'static str)> {
            Some((TypeId::of::<V>(), std::any::type_name::<V>()))
        }
        match self {
            FieldType::Text => of::<String>(),
            FieldType::Integer => of::<i32>(),
            FieldType::Decimal => of::<f64>(),
            FieldType::Uuid => of::<uuid::Uuid>(),
            FieldType::Timestamp => of::<DateTime<Utc>>(),
            _ => None,
        }
    }

    /// Name of the registered type this field refers to, if any.
    pub fn referenced_type(&self) -> Option<&str> {
        match self {
            FieldType::Object(name) | FieldType::Enum(name) => Some(name),
            FieldType::Sequence(element) => element.referenced_type(),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => f.write_str("text"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Decimal => f.write_str("decimal"),
            FieldType::Uuid => f.write_str("uuid"),
            FieldType::Timestamp => f.write_str("timestamp"),
            FieldType::Enum(name) => write!(f, "enum {}", name),
            FieldType::Sequence(element) => write!(f, "sequence<{}>", element),
            FieldType::Object(name) => f.write_str(name),
            FieldType::Unsupported(name) => write!(f, "unsupported {}", name),
        }
    }
}

/// One entry of a type's field table.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    /// Normal assignment path.
    setter: Option<Setter>,
    /// Alternate path for fields that are read-only to normal assignment.
    private_setter: Option<Setter>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Whether the field accepts normal assignment.
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Whether any write path exists.
    pub fn can_write(&self) -> bool {
        self.setter.is_some() || self.private_setter.is_some()
    }

    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    pub fn private_setter(&self) -> Option<&Setter> {
        self.private_setter.as_ref()
    }
}

impl Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("writable", &self.is_writable())
            .field("private_setter", &self.private_setter.is_some())
            .finish()
    }
}

#[derive(Clone)]
struct EnumMembers {
    names: Vec<String>,
    make: MemberFactory,
}

/// Registration record for one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    supertypes: Vec<String>,
    fields: Vec<FieldDescriptor>,
    factory: Option<Factory>,
    serializer: Option<Serializer>,
    upcasts: HashMap<String, Upcast>,
    members: Option<EnumMembers>,
    rust_type: Option<&'static str>,
    /// Declaration mistakes found while building; registration rejects them.
    defects: Vec<String>,
}

impl TypeDescriptor {
    fn bare(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: Vec::new(),
            fields: Vec::new(),
            factory: None,
            serializer: None,
            upcasts: HashMap::new(),
            members: None,
            rust_type: None,
            defects: Vec::new(),
        }
    }

    /// An interface (trait) type; never instantiated directly.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::bare(name, TypeKind::Interface)
    }

    /// An abstract base type; never instantiated directly.
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self::bare(name, TypeKind::Abstract)
    }

    /// A concrete type whose raw instance is `T::default()`.
    ///
    /// `Default` must produce the zero state, not whatever a "real"
    /// constructor would set up; every discoverable field is overwritten by
    /// the populator anyway.
    pub fn concrete<T>(name: impl Into<String>) -> ConcreteBuilder<T>
    where
        T: Any + Default + Serialize,
    {
        Self::concrete_with(name, || Ok(T::default()))
    }

    /// A concrete type with an explicit raw factory.
    pub fn concrete_with<T, F>(name: impl Into<String>, factory: F) -> ConcreteBuilder<T>
    where
        T: Any + Serialize,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        let mut descriptor = Self::bare(name, TypeKind::Concrete);
        descriptor.rust_type = Some(std::any::type_name::<T>());
        descriptor.factory = Some(Arc::new(move || {
            factory().map(|raw| Box::new(raw) as Box<dyn Any>)
        }));
        descriptor.serializer = Some(Arc::new(|value: &dyn Any, options: &JsonOptions| {
            match value.downcast_ref::<T>() {
                Some(instance) => json::to_string(instance, options),
                None => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                    "value is not a {}",
                    std::any::type_name::<T>()
                ))),
            }
        }));
        ConcreteBuilder {
            descriptor,
            _marker: PhantomData,
        }
    }

    /// An enumeration whose members are picked uniformly by the populator.
    pub fn enumeration<E>(name: impl Into<String>, members: impl IntoIterator<Item = E>) -> Self
    where
        E: Any + Clone + Debug + Send + Sync,
    {
        let members: Vec<E> = members.into_iter().collect();
        let names = members.iter().map(|m| format!("{:?}", m)).collect();
        let make: MemberFactory = Arc::new(move |index| {
            members
                .get(index)
                .cloned()
                .map(|member| Box::new(member) as Box<dyn Any>)
        });
        let mut descriptor = Self::bare(name, TypeKind::Enum);
        descriptor.rust_type = Some(std::any::type_name::<E>());
        descriptor.members = Some(EnumMembers { names, make });
        descriptor
    }

    /// Declare a direct supertype.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        if !self.supertypes.contains(&parent) {
            self.supertypes.push(parent);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == TypeKind::Abstract
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    /// Concrete and constructible.
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete && self.factory.is_some()
    }

    /// Direct supertypes, in declaration order.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The Rust type registered for this descriptor, if any.
    pub fn rust_type_name(&self) -> Option<&'static str> {
        self.rust_type
    }

    /// Debug names of enum members (empty for non-enums).
    pub fn member_names(&self) -> &[String] {
        self.members.as_ref().map(|m| m.names.as_slice()).unwrap_or(&[])
    }

    pub fn member_count(&self) -> usize {
        self.member_names().len()
    }

    /// Boxed enum member at `index`.
    pub fn member(&self, index: usize) -> Option<Box<dyn Any>> {
        self.members.as_ref().and_then(|m| (m.make)(index))
    }

    /// Field declarations whose setter can never accept the generated value.
    pub fn defects(&self) -> &[String] {
        &self.defects
    }

    /// Run the raw factory.
    pub fn instantiate(&self) -> Result<Box<dyn Any>> {
        match &self.factory {
            Some(factory) => factory(),
            None => Err(anyhow!("{} has no raw factory", self.name)),
        }
    }

    /// Serialize a concrete instance of this type.
    pub fn serializer(&self) -> Option<&Serializer> {
        self.serializer.as_ref()
    }

    /// Convert a concrete instance of this type into `target`'s representation.
    ///
    /// Identity when `target` is this type.
    pub fn upcast_to(&self, target: &str, value: Box<dyn Any>) -> Option<Box<dyn Any>> {
        if target == self.name {
            return Some(value);
        }
        self.upcasts.get(target).and_then(|upcast| upcast(value))
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supertypes", &self.supertypes)
            .field("fields", &self.fields)
            .field("constructible", &self.factory.is_some())
            .field("members", &self.member_names())
            .finish()
    }
}

/// Typed builder for a concrete [`TypeDescriptor`].
///
/// Setter closures are written against `T` and the field's Rust type; the
/// builder erases them into [`Setter`]s.
pub struct ConcreteBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Serialize> ConcreteBuilder<T> {
    /// Declare a direct supertype without a trait-object conversion.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.descriptor = self.descriptor.extends(parent);
        self
    }

    /// Declare a supertype whose representation is `Box<B>` (usually a trait
    /// object), so instances can fill fields declared as that base.
    pub fn implements<B>(mut self, parent: impl Into<String>, upcast: fn(Box<T>) -> Box<B>) -> Self
    where
        B: ?Sized + 'static,
    {
        let parent = parent.into();
        let erased: Upcast = Arc::new(move |value: Box<dyn Any>| {
            value
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(upcast(concrete)) as Box<dyn Any>)
        });
        self.descriptor.upcasts.insert(parent.clone(), erased);
        self.extends(parent)
    }

    /// A publicly writable field.
    pub fn field<V, F>(mut self, name: impl Into<String>, field_type: FieldType, set: F) -> Self
    where
        V: Any,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let name = name.into();
        self.check_setter_type::<V>(&name, &field_type, "");
        self.push(name, field_type, Some(erase_setter(set)), None);
        self
    }

    /// A field that is read-only to normal assignment but has a private
    /// setter the populator may fall back to.
    pub fn private_field<V, F>(mut self, name: impl Into<String>, field_type: FieldType, set: F) -> Self
    where
        V: Any,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let name = name.into();
        self.check_setter_type::<V>(&name, &field_type, "");
        self.push(name, field_type, None, Some(erase_setter(set)));
        self
    }

    /// A list field; the setter receives every generated element as `V`.
    pub fn sequence<V, F>(mut self, name: impl Into<String>, element: FieldType, set: F) -> Self
    where
        V: Any,
        F: Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    {
        let name = name.into();
        self.check_setter_type::<V>(&name, &element, "element ");
        let setter: Setter = Arc::new(move |target: &mut dyn Any, value: Value| {
            let Some(target) = target.downcast_mut::<T>() else {
                return false;
            };
            match value.take_sequence::<V>() {
                Some(items) => {
                    set(target, items);
                    true
                }
                None => false,
            }
        });
        self.push(name, FieldType::sequence_of(element), Some(setter), None);
        self
    }

    /// A field with no write path at all (e.g. a computed property).
    pub fn read_only(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.push(name, field_type, None, None);
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }

    fn check_setter_type<V: Any>(&mut self, field: &str, field_type: &FieldType, role: &str) {
        let Some((expected, expected_name)) = field_type.primitive_rust_type() else {
            return;
        };
        if TypeId::of::<V>() != expected {
            let defect = format!(
                "{}.{} ({}): {}setter takes {} but {} fields receive {}",
                self.descriptor.name,
                field,
                self.descriptor.rust_type_name().unwrap_or("?"),
                role,
                std::any::type_name::<V>(),
                field_type,
                expected_name
            );
            self.descriptor.defects.push(defect);
        }
    }

    fn push(
        &mut self,
        name: impl Into<String>,
        field_type: FieldType,
        setter: Option<Setter>,
        private_setter: Option<Setter>,
    ) {
        self.descriptor.fields.push(FieldDescriptor {
            name: name.into(),
            field_type,
            setter,
            private_setter,
        });
    }
}

impl<T: Any + Serialize> From<ConcreteBuilder<T>> for TypeDescriptor {
    fn from(builder: ConcreteBuilder<T>) -> Self {
        builder.build()
    }
}

fn erase_setter<T, V, F>(set: F) -> Setter
where
    T: Any,
    V: Any,
    F: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |target: &mut dyn Any, value: Value| {
        let Some(target) = target.downcast_mut::<T>() else {
            return false;
        };
        match value.take::<V>() {
            Some(v) => {
                set(target, v);
                true
            }
            None => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Serialize)]
    struct Account {
        owner: String,
        balance: i32,
        tags: Vec<String>,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Tier {
        Free,
        Pro,
    }

    trait Named {
        fn label(&self) -> String;
    }

    impl Named for Account {
        fn label(&self) -> String {
            self.owner.clone()
        }
    }

    fn account_descriptor() -> TypeDescriptor {
        TypeDescriptor::concrete::<Account>("Account")
            .implements::<dyn Named>("Named", |a| a)
            .field("owner", FieldType::Text, |a: &mut Account, v: String| a.owner = v)
            .private_field("balance", FieldType::Integer, |a: &mut Account, v: i32| {
                a.balance = v
            })
            .sequence("tags", FieldType::Text, |a: &mut Account, v: Vec<String>| a.tags = v)
            .build()
    }

    #[test]
    fn test_concrete_descriptor_shape() {
        let desc = account_descriptor();
        assert_eq!(desc.kind(), TypeKind::Concrete);
        assert!(desc.is_concrete());
        assert_eq!(desc.supertypes(), ["Named".to_string()]);
        assert_eq!(desc.fields().len(), 3);
        assert!(desc.field("owner").unwrap().is_writable());
        assert!(!desc.field("balance").unwrap().is_writable());
        assert!(desc.field("balance").unwrap().can_write());
        assert!(desc
            .field("tags")
            .unwrap()
            .field_type()
            .is_collection_of(&FieldType::Text));
    }

    #[test]
    fn test_setters_write_through_any() {
        let desc = account_descriptor();
        let mut raw = desc.instantiate().unwrap();

        let owner = desc.field("owner").unwrap().setter().unwrap();
        assert!(owner(raw.as_mut(), Value::Text("ada".into())));

        let balance = desc.field("balance").unwrap().private_setter().unwrap();
        assert!(balance(raw.as_mut(), Value::Integer(42)));
        // Wrong value type is rejected, field untouched
        assert!(!balance(raw.as_mut(), Value::Text("nope".into())));

        let account = raw.downcast::<Account>().unwrap();
        assert_eq!(account.owner, "ada");
        assert_eq!(account.balance, 42);
    }

    #[test]
    fn test_raw_factory_returns_zero_state() {
        let raw = account_descriptor().instantiate().unwrap();
        let account = raw.downcast_ref::<Account>().unwrap();
        assert!(account.owner.is_empty());
        assert_eq!(account.balance, 0);
    }

    #[test]
    fn test_failing_factory() {
        let desc = TypeDescriptor::concrete_with::<Account, _>("Broken", || {
            Err(anyhow!("refusing raw construction"))
        })
        .build();
        assert!(desc.instantiate().is_err());
    }

    #[test]
    fn test_abstract_has_no_factory() {
        let desc = TypeDescriptor::abstract_type("Base");
        assert!(!desc.is_concrete());
        assert!(desc.instantiate().is_err());
    }

    #[test]
    fn test_upcast_to_trait_object() {
        let desc = account_descriptor();
        let account = Account {
            owner: "grace".into(),
            ..Default::default()
        };
        let upcast = desc.upcast_to("Named", Box::new(account)).unwrap();
        let named = upcast.downcast::<Box<dyn Named>>().unwrap();
        assert_eq!(named.label(), "grace");
        assert!(desc.upcast_to("Unrelated", Box::new(Account::default())).is_none());
    }

    #[test]
    fn test_serializer_uses_concrete_type() {
        let desc = account_descriptor();
        let account = Account {
            owner: "lin".into(),
            balance: 5,
            tags: vec!["a".into()],
        };
        let serialize = desc.serializer().unwrap();
        let json = serialize(&account, &JsonOptions::compact()).unwrap();
        assert_eq!(json, r#"{"owner":"lin","balance":5,"tags":["a"]}"#);
        assert!(serialize(&7_i32, &JsonOptions::compact()).is_err());
    }

    #[test]
    fn test_enumeration_members() {
        let desc = TypeDescriptor::enumeration("Tier", [Tier::Free, Tier::Pro]);
        assert!(desc.is_enum());
        assert_eq!(desc.member_names(), ["Free".to_string(), "Pro".to_string()]);
        let member = desc.member(1).unwrap().downcast::<Tier>().unwrap();
        assert_eq!(*member, Tier::Pro);
        assert!(desc.member(2).is_none());
    }

    #[test]
    fn test_setter_type_matches_field_class() {
        assert!(account_descriptor().defects().is_empty());

        let desc = TypeDescriptor::concrete::<Account>("Account")
            .field("balance", FieldType::Integer, |a: &mut Account, v: i64| {
                a.balance = v as i32
            })
            .field("owner", FieldType::Uuid, |a: &mut Account, v: String| a.owner = v)
            .build();
        assert_eq!(desc.defects().len(), 2);
        assert!(desc.defects()[0].contains("setter takes i64 but integer fields receive i32"));
        assert!(desc.defects()[1].contains("uuid fields receive"));
        assert_eq!(desc.rust_type_name(), Some(std::any::type_name::<Account>()));
    }

    #[test]
    fn test_field_type_helpers() {
        let list = FieldType::sequence_of(FieldType::object("LineItem"));
        assert_eq!(list.referenced_type(), Some("LineItem"));
        assert_eq!(list.to_string(), "sequence<LineItem>");
        assert_eq!(FieldType::Integer.element_type(), None);
    }
}
