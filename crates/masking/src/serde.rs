//! Serde support for [`Secret`].

pub use serde::{de, Deserialize, Serialize, Serializer};

use crate::{Secret, Strategy};

/// Marker trait for inner types whose `Secret` wrapper may be serialized.
///
/// Serializing a secret produces the real value, since the usual destinations
/// are wire payloads and storage where the value is required. The opt-in
/// marker exists so that a type must state this intent explicitly rather than
/// inheriting serializability by accident.
pub trait SerializableSecret: Serialize {}

impl SerializableSecret for String {}

impl<'de, T, I> Deserialize<'de> for Secret<T, I>
where
    T: Clone + de::DeserializeOwned + Sized,
    I: Strategy<T>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self::new)
    }
}

impl<T, I> Serialize for Secret<T, I>
where
    T: SerializableSecret + Sized,
    I: Strategy<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.inner_secret.serialize(serializer)
    }
}
