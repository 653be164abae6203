//! Domain Entities - Core business objects
//!
//! Listings are loosely-typed JSON documents owned by the store. The core only
//! reads a couple of fields from them, through the narrow accessors below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the store-assigned listing id.
pub const ID_FIELD: &str = "_id";

/// Geographic information resolved from an IP address.
///
/// Produced once per lookup and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// The IP address that was looked up, echoed back
    pub ip: String,
    /// Long-form country name (e.g. "United States")
    pub country: String,
    /// City name, empty when the database has none for this range
    pub city: String,
}

impl GeoRecord {
    pub fn new(ip: impl Into<String>, country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            country: country.into(),
            city: city.into(),
        }
    }

    /// Location-less answer for an address the database cannot place.
    pub fn unresolved(ip: impl Into<String>) -> Self {
        Self::new(ip, "", "")
    }
}

/// A property listing.
///
/// The document shape is arbitrary nested JSON. Only `_id` and
/// `address.country` are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing(Map<String, Value>);

impl Listing {
    pub fn new(doc: Map<String, Value>) -> Self {
        Self(doc)
    }

    /// Build a listing from any JSON value; only objects are listings.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(doc) => Some(Self(doc)),
            _ => None,
        }
    }

    /// Store id, accepting both string and numeric `_id` values.
    pub fn id(&self) -> Option<String> {
        match self.0.get(ID_FIELD)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether this listing's `_id` is `id`, without building the id string
    /// for the common string case.
    pub fn has_id(&self, id: &str) -> bool {
        match self.0.get(ID_FIELD) {
            Some(Value::String(s)) => !s.is_empty() && s == id,
            Some(Value::Number(n)) => n.to_string() == id,
            _ => false,
        }
    }

    /// `address.country`, if present and a string.
    pub fn country(&self) -> Option<&str> {
        self.0.get("address")?.get("country")?.as_str()
    }

    /// Read any top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Overwrite the top-level fields named in the patch.
    pub fn apply(&mut self, patch: &ListingPatch) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Reasons a patch body is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("patch must be a JSON object")]
    NotAnObject,
    #[error("Data to update can not be empty!")]
    Empty,
    #[error("invalid field name `{0}`")]
    InvalidField(String),
    #[error("`_id` cannot be changed")]
    IdChange,
}

/// A validated set of top-level field overwrites for one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPatch(Map<String, Value>);

impl ListingPatch {
    /// Validate a raw request body into a patch for the listing `id`.
    ///
    /// Operator-style (`$set`) and dotted (`address.country`) keys are
    /// rejected; only whole top-level fields can be replaced.
    pub fn parse(id: &str, body: Value) -> Result<Self, PatchError> {
        let fields = match body {
            Value::Object(fields) => fields,
            _ => return Err(PatchError::NotAnObject),
        };

        if fields.is_empty() {
            return Err(PatchError::Empty);
        }

        for (key, value) in &fields {
            if key.is_empty() || key.starts_with('$') || key.contains('.') {
                return Err(PatchError::InvalidField(key.clone()));
            }
            if key == ID_FIELD {
                let same = match value {
                    Value::String(s) => s == id,
                    Value::Number(n) => n.to_string() == id,
                    _ => false,
                };
                if !same {
                    return Err(PatchError::IdChange);
                }
            }
        }

        Ok(Self(fields))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}
