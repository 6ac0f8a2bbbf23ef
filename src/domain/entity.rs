//! Entity records exchanged with clients.
//!
//! Clients send an [`EntityUpdate`] in the wire shape
//! `{"Username": string, "X": number, "Y": number, "Z": number}`. Only
//! updates with a non-empty username become an [`Entity`], which is what
//! the registry stores and what gets echoed to every connection.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::RelayError;

/// Non-empty entity name. The registry key for an [`Entity`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Wraps `name` if it is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingUsername`] for an empty string.
    pub fn new(name: impl Into<String>) -> Result<Self, RelayError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RelayError::MissingUsername);
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw inbound update as sent by a client.
///
/// Every field is optional on the wire; absent fields take their zero
/// value and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityUpdate {
    /// Claimed entity name. May be empty until validated.
    #[serde(rename = "Username", default)]
    pub username: String,
    /// X coordinate.
    #[serde(rename = "X", default)]
    pub x: f64,
    /// Y coordinate.
    #[serde(rename = "Y", default)]
    pub y: f64,
    /// Z coordinate.
    #[serde(rename = "Z", default)]
    pub z: f64,
}

impl EntityUpdate {
    /// Turns the update into an [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingUsername`] if `username` is empty.
    pub fn validate(self) -> Result<Entity, RelayError> {
        Ok(Entity {
            username: Username::new(self.username)?,
            x: self.x,
            y: self.y,
            z: self.z,
        })
    }
}

/// Validated entity state: a name and a position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    /// Entity name.
    #[serde(rename = "Username")]
    pub username: Username,
    /// X coordinate.
    #[serde(rename = "X", serialize_with = "serialize_coordinate")]
    pub x: f64,
    /// Y coordinate.
    #[serde(rename = "Y", serialize_with = "serialize_coordinate")]
    pub y: f64,
    /// Z coordinate.
    #[serde(rename = "Z", serialize_with = "serialize_coordinate")]
    pub z: f64,
}

impl Entity {
    /// Decodes and validates one inbound message body.
    ///
    /// Each call starts from a blank [`EntityUpdate`]; nothing carries over
    /// from earlier messages.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Decode`] if `payload` is not a JSON object of
    /// the update shape, or [`RelayError::MissingUsername`] if the username
    /// is absent or empty.
    pub fn decode(payload: &[u8]) -> Result<Self, RelayError> {
        // The derived struct visitor would also take a positional array.
        let fields: Map<String, Value> = serde_json::from_slice(payload)?;
        serde_json::from_value::<EntityUpdate>(Value::Object(fields))?.validate()
    }
}

/// Largest magnitude below which every whole `f64` is an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Writes whole finite coordinates as JSON integers, so `1` echoes as `1`
/// rather than `1.0`.
#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_possible_truncation)]
fn serialize_coordinate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
