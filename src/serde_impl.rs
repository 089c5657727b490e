use crate::InternedString;
use core::fmt;
use serde::{
    de::{Deserialize, Deserializer, Error, Unexpected, Visitor},
    ser::{Serialize, Serializer},
};

impl Serialize for InternedString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InternedString {
    fn deserialize<D>(deserializer: D) -> Result<InternedString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(InternedStringVisitor)
    }
}

/// Deserialized strings are re-interned through the process-wide interner,
/// so repeated values in a payload collapse to shared allocations on the
/// way in.
struct InternedStringVisitor;

impl Visitor<'_> for InternedStringVisitor {
    type Value = InternedString;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(crate::intern(value))
    }

    fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
    where
        E: Error,
    {
        match core::str::from_utf8(value) {
            Ok(value) => Ok(crate::intern(value)),
            Err(_) => Err(Error::invalid_value(Unexpected::Bytes(value), &self)),
        }
    }
}
