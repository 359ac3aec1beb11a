use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value that can be absent, explicitly `null`, or present.
///
/// Plain `Option<T>` cannot tell "the client did not send this field" apart from "the client
/// sent `null`". Update-style inputs need that distinction, so generated records wrap fields
/// annotated as omittable in this type:
///
/// ```rust
/// use mcpgen_runtime::Omittable;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct UpdateUser {
///     #[serde(default)]
///     nickname: Omittable<String>,
/// }
///
/// let absent: UpdateUser = serde_json::from_str("{}").unwrap();
/// assert!(absent.nickname.is_unset());
///
/// let cleared: UpdateUser = serde_json::from_str(r#"{"nickname": null}"#).unwrap();
/// assert!(cleared.nickname.is_null());
///
/// let renamed: UpdateUser = serde_json::from_str(r#"{"nickname": "bob"}"#).unwrap();
/// assert_eq!(renamed.nickname.value(), Some(&"bob".to_string()));
/// ```
///
/// Fields must carry `#[serde(default)]` so a missing key deserializes to [`Omittable::Unset`],
/// and `#[serde(skip_serializing_if = "Omittable::is_unset")]` so an unset value is not written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Omittable<T> {
    /// The field was not present.
    Unset,
    /// The field was present and `null`.
    Null,
    /// The field was present with a value.
    Value(T),
}

impl<T> Default for Omittable<T> {
    fn default() -> Self {
        Omittable::Unset
    }
}

impl<T> Omittable<T> {
    /// Wrap a present value.
    pub fn new(value: T) -> Self {
        Omittable::Value(value)
    }

    /// An explicit `null`.
    pub fn null() -> Self {
        Omittable::Null
    }

    /// True when the field was provided, either as `null` or as a value.
    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Omittable::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Omittable::Null)
    }

    /// The present value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Omittable::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `None` when unset, `Some(None)` when null, `Some(Some(v))` when present.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Omittable::Unset => None,
            Omittable::Null => Some(None),
            Omittable::Value(v) => Some(Some(v)),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Omittable<U> {
        match self {
            Omittable::Unset => Omittable::Unset,
            Omittable::Null => Omittable::Null,
            Omittable::Value(v) => Omittable::Value(f(v)),
        }
    }
}

impl<T: Default> Omittable<T> {
    /// The present value, or `T::default()` when unset or null.
    pub fn value_or_default(self) -> T {
        match self {
            Omittable::Value(v) => v,
            _ => T::default(),
        }
    }
}

impl<T: Serialize> Serialize for Omittable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Omittable::Value(v) => v.serialize(serializer),
            Omittable::Unset | Omittable::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Omittable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Omittable::Value(v),
            None => Omittable::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Patch {
        #[serde(default, skip_serializing_if = "Omittable::is_unset")]
        name: Omittable<String>,
        #[serde(default, skip_serializing_if = "Omittable::is_unset")]
        age: Omittable<i64>,
    }

    #[test]
    fn test_missing_field_is_unset() {
        let p: Patch = serde_json::from_str("{}").unwrap();
        assert!(p.name.is_unset());
        assert!(!p.name.is_set());
        assert!(!p.name.is_null());
    }

    #[test]
    fn test_null_field_is_null() {
        let p: Patch = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert!(p.name.is_set());
        assert!(p.name.is_null());
        assert_eq!(p.name.value(), None);
    }

    #[test]
    fn test_present_field_has_value() {
        let p: Patch = serde_json::from_str(r#"{"name": "ada", "age": 36}"#).unwrap();
        assert_eq!(p.name.value().map(String::as_str), Some("ada"));
        assert_eq!(p.age.clone().value_or_default(), 36);
    }

    #[test]
    fn test_serialize_skips_unset_and_writes_null() {
        let p = Patch {
            name: Omittable::null(),
            age: Omittable::Unset,
        };
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"name":null}"#);

        let p = Patch {
            name: Omittable::new("ada".to_string()),
            age: Omittable::new(1),
        };
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"name":"ada","age":1}"#
        );
    }

    #[test]
    fn test_into_option_and_map() {
        assert_eq!(Omittable::<i64>::Unset.into_option(), None);
        assert_eq!(Omittable::<i64>::Null.into_option(), Some(None));
        assert_eq!(Omittable::new(2).map(|v| v * 2).into_option(), Some(Some(4)));
        assert_eq!(Omittable::<String>::null().value_or_default(), "");
    }
}
