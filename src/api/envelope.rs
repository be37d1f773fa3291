//! The one-level "wrapper object" convention used by every platform payload:
//! a type's fields are nested under a single key naming the type, e.g.
//! `{"outputStage": {...}}`.

use std::{fmt, io::Read, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, DeserializeOwned, IgnoredAny, MapAccess, Visitor},
    ser::SerializeMap as _,
};

/// Implemented by payload types that travel wrapped under a root key.
pub trait Wrapped {
    /// The root key, e.g. `"diffRequest"`.
    const ROOT: &'static str;
}

impl<T: Wrapped + ?Sized> Wrapped for &T {
    const ROOT: &'static str = T::ROOT;
}

/// Declares the root key of one or more payload types.
macro_rules! wrapped {
    ($($ty:ty => $root:literal),* $(,)?) => {
        $(
            impl $crate::api::Wrapped for $ty {
                const ROOT: &'static str = $root;
            }
        )*
    };
}

pub(crate) use wrapped;

/// A value serialized as, and deserialized from, `{T::ROOT: value}`.
///
/// Keys other than the root are ignored when reading. A missing root key is
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<T>(pub T);

impl<T> Envelope<T> {
    /// Unwrap the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Wrapped + Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(T::ROOT, &self.0)?;
        map.end()
    }
}

impl<'de, T: Wrapped + Deserialize<'de>> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EnvelopeVisitor(PhantomData))
    }
}

struct EnvelopeVisitor<T>(PhantomData<T>);

impl<'de, T: Wrapped + Deserialize<'de>> Visitor<'de> for EnvelopeVisitor<T> {
    type Value = Envelope<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an object wrapped in a `{}` key", T::ROOT)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut value = None;
        while let Some(key) = map.next_key::<String>()? {
            if key != T::ROOT {
                map.next_value::<IgnoredAny>()?;
            } else if value.is_some() {
                return Err(de::Error::duplicate_field(T::ROOT));
            } else {
                value = Some(map.next_value()?);
            }
        }

        value
            .map(Envelope)
            .ok_or_else(|| de::Error::missing_field(T::ROOT))
    }
}

/// Serialize `value` wrapped under its root key.
pub fn encode<T: Wrapped + Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&Envelope(value))
}

/// Read a wrapped `T` from JSON, reporting the path of the first field that
/// failed to decode.
pub fn decode<T: Wrapped + DeserializeOwned>(
    body: impl Read,
) -> Result<T, serde_path_to_error::Error<serde_json::Error>> {
    let de = &mut serde_json::Deserializer::from_reader(body);
    serde_path_to_error::deserialize::<_, Envelope<T>>(de).map(Envelope::into_inner)
}

/// Helpers for fields the platform sends as strings holding booleans
/// (`"true"`, `"false"`, `"1"`, `"0"`).
pub mod bool_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Str(String),
    }

    /// Write a boolean as `"1"` or `"0"`.
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "1" } else { "0" })
    }

    /// Accept a JSON boolean or one of the string spellings.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(b),
            Raw::Str(s) => match s.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"a boolean string",
                )),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Thing {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    wrapped!(Thing => "thing");

    #[test]
    fn wraps_one_level() -> anyhow::Result<()> {
        let thing = Thing {
            name: "a".into(),
            note: None,
        };

        let value: serde_json::Value = serde_json::from_slice(&encode(&thing)?)?;
        assert_eq!(value, json!({"thing": {"name": "a"}}));

        Ok(())
    }

    #[test]
    fn ignores_sibling_keys() -> anyhow::Result<()> {
        let body = br#"{"other": [1, 2], "thing": {"name": "b", "note": "x"}}"#;
        let thing: Thing = decode(&body[..])?;
        assert_eq!(thing.name, "b");
        assert_eq!(thing.note.as_deref(), Some("x"));

        Ok(())
    }

    #[test]
    fn missing_root_is_an_error() {
        let body = br#"{"name": "b"}"#;
        let err = decode::<Thing>(&body[..]).unwrap_err();
        assert!(err.to_string().contains("thing"), "{err}");
    }

    #[test]
    fn error_carries_path() {
        let body = br#"{"thing": {"name": 5}}"#;
        let err = decode::<Thing>(&body[..]).unwrap_err();
        assert_eq!(err.path().to_string(), "thing.name");
    }

    #[test]
    fn bool_strings() -> anyhow::Result<()> {
        #[derive(Deserialize, Serialize)]
        struct Flag {
            #[serde(with = "bool_string")]
            on: bool,
        }

        for (raw, expected) in [
            (json!({"on": "true"}), true),
            (json!({"on": "0"}), false),
            (json!({"on": true}), true),
        ] {
            let flag: Flag = serde_json::from_value(raw)?;
            assert_eq!(flag.on, expected);
        }

        assert_eq!(
            serde_json::to_value(Flag { on: false })?,
            json!({"on": "0"})
        );
        assert!(serde_json::from_value::<Flag>(json!({"on": "maybe"})).is_err());

        Ok(())
    }
}
