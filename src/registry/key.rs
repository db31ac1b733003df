//! Type keys
//!
//! A [`TypeKey`] names the channel a value type is routed through. It is
//! derived from `std::any::type_name`, which is deterministic for a given
//! build. Concrete types and abstract (trait object) payloads use separate
//! namespaces so that `Box<dyn Handler>` can never share a key with a
//! concrete type.
//!
//! `type_name` is not guaranteed unique (two versions of the same crate can
//! export identically named types), so the registry re-checks the real type
//! with a downcast on every lookup.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

/// Prefix for keys of types that carry a trait object
const ABSTRACT_PREFIX: &str = "dyn:";

/// Deterministic string identity of an event type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Derive the key for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        let name = type_name::<T>();
        if mentions_trait_object(name) {
            Self(format!("{ABSTRACT_PREFIX}{name}").into())
        } else {
            Self(Arc::from(name))
        }
    }

    /// Build a key from an arbitrary name
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key was derived from a trait object payload
    pub fn is_abstract(&self) -> bool {
        self.0.starts_with(ABSTRACT_PREFIX)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

/// True when `name` contains a `dyn` keyword rather than an identifier that
/// merely ends in "dyn"
fn mentions_trait_object(name: &str) -> bool {
    name.match_indices("dyn ").any(|(idx, _)| {
        name[..idx]
            .chars()
            .next_back()
            .map_or(true, |prev| !(prev.is_alphanumeric() || prev == '_'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Handler {}

    #[allow(dead_code)]
    struct Gadyn;

    #[test]
    fn test_same_type_same_key() {
        assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
    }

    #[test]
    fn test_distinct_types_distinct_keys() {
        assert_ne!(TypeKey::of::<u32>(), TypeKey::of::<i32>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<&'static str>());
        assert_ne!(TypeKey::of::<Vec<u8>>(), TypeKey::of::<Vec<u16>>());
        assert_ne!(TypeKey::of::<Option<u8>>(), TypeKey::of::<u8>());
    }

    #[test]
    fn test_concrete_key_is_type_name() {
        let key = TypeKey::of::<u64>();
        assert_eq!(key.as_str(), "u64");
        assert!(!key.is_abstract());
        assert_eq!(key.to_string(), "u64");
    }

    #[test]
    fn test_trait_object_payload_uses_abstract_namespace() {
        let boxed = TypeKey::of::<Box<dyn Handler>>();
        let shared = TypeKey::of::<Arc<dyn Handler + Send + Sync>>();

        assert!(boxed.is_abstract());
        assert!(shared.is_abstract());
        assert!(boxed.as_str().starts_with(ABSTRACT_PREFIX));
        assert_ne!(boxed, shared);
        assert_eq!(boxed, TypeKey::of::<Box<dyn Handler>>());
    }

    #[test]
    fn test_identifier_ending_in_dyn_is_concrete() {
        assert!(!TypeKey::of::<(Gadyn, u8)>().is_abstract());
        assert!(!mentions_trait_object("crate::Gadyn"));
        assert!(mentions_trait_object("dyn crate::Handler"));
        assert!(mentions_trait_object("alloc::boxed::Box<dyn crate::Handler>"));
    }

    #[test]
    fn test_named_key() {
        let key = TypeKey::named("orders");
        assert_eq!(key, TypeKey::from("orders"));
        assert!(!key.is_abstract());
    }
}
