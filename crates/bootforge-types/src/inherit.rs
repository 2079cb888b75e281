//! The inheritance sentinel used by the attribute resolver.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// The on-disk spelling of an inherited field.
///
/// Records keep the sentinel as a plain string so they stay hand-editable
/// and diffable; the typed representation in memory is [`Inheritable`].
pub const INHERIT_SENTINEL: &str = "<<inherit>>";

/// A field value that may defer to the owner's ancestor chain.
///
/// `Inherit` serializes as the literal string `"<<inherit>>"`; any other
/// value round-trips as `T`. The resolver skips `Inherit` values so they
/// fall through to the nearest ancestor that sets the field, and finally
/// to the settings default.
///
/// # Example
///
/// ```
/// use bootforge_types::Inheritable;
///
/// let explicit: Inheritable<bool> = Inheritable::Value(true);
/// let deferred: Inheritable<bool> = Inheritable::Inherit;
///
/// assert_eq!(serde_json::to_string(&explicit).unwrap(), "true");
/// assert_eq!(serde_json::to_string(&deferred).unwrap(), "\"<<inherit>>\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inheritable<T> {
    /// Defer to the ancestor chain / settings default
    Inherit,
    /// An explicitly set value
    Value(T),
}

impl<T> Inheritable<T> {
    /// True when the field defers to its ancestors.
    pub fn is_inherit(&self) -> bool {
        matches!(self, Inheritable::Inherit)
    }

    /// The explicit value, if one is set.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Inheritable::Inherit => None,
            Inheritable::Value(v) => Some(v),
        }
    }

    /// Consume, returning the explicit value or the given default.
    pub fn resolve(self, default: T) -> T {
        match self {
            Inheritable::Inherit => default,
            Inheritable::Value(v) => v,
        }
    }
}

impl<T> Default for Inheritable<T> {
    fn default() -> Self {
        Inheritable::Inherit
    }
}

impl<T> From<T> for Inheritable<T> {
    fn from(value: T) -> Self {
        Inheritable::Value(value)
    }
}

impl<T: Serialize> Serialize for Inheritable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Inheritable::Inherit => serializer.serialize_str(INHERIT_SENTINEL),
            Inheritable::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: serde::de::DeserializeOwned> Deserialize<'de> for Inheritable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Both record formats (YAML and JSON) are self-describing, so an
        // intermediate Value lets us peek for the sentinel first.
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.as_str() == Some(INHERIT_SENTINEL) {
            return Ok(Inheritable::Inherit);
        }
        T::deserialize(value)
            .map(Inheritable::Value)
            .map_err(de::Error::custom)
    }
}
