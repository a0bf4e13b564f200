//! Parser configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AstFormat {
    #[default]
    Gml,
    Estree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryMode {
    #[default]
    None,
    Limited,
}

/// How much location data the finished tree carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMode {
    Full,
    Simplified,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserOptions {
    pub get_comments: bool,
    pub get_locations: bool,
    pub simplify_locations: bool,
    pub ast_format: AstFormat,
    #[serde(rename = "asJSON")]
    pub as_json: bool,
    pub recovery: RecoveryMode,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            get_comments: true,
            get_locations: true,
            simplify_locations: false,
            ast_format: AstFormat::Gml,
            as_json: false,
            recovery: RecoveryMode::None,
        }
    }
}

impl ParserOptions {
    pub const KEYS: [&'static str; 6] = [
        "getComments",
        "getLocations",
        "simplifyLocations",
        "astFormat",
        "asJSON",
        "recovery",
    ];

    /// Defaults merged with `overrides`. Unknown keys and `null` values are
    /// ignored; a known key with the wrong type is an `InvalidOption`.
    pub fn from_value(overrides: &Value) -> Result<Self> {
        Self::default().merge(overrides)
    }

    pub fn merge(&self, overrides: &Value) -> Result<Self> {
        let entries = match overrides {
            Value::Null => return Ok(self.clone()),
            Value::Object(map) => map,
            _ => {
                return Err(Error::InvalidOption {
                    name: "options".to_string(),
                    reason: "expected an object".to_string(),
                })
            }
        };

        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (key, value) in known_entries(entries, &Self::KEYS) {
            check_field::<Self>(key, value)?;
            merged.insert(key.clone(), value.clone());
        }

        serde_json::from_value(Value::Object(merged)).map_err(|err| Error::InvalidOption {
            name: "options".to_string(),
            reason: err.to_string(),
        })
    }

    pub fn location_mode(&self) -> LocationMode {
        if !self.get_locations {
            LocationMode::None
        } else if self.simplify_locations && self.ast_format != AstFormat::Estree {
            LocationMode::Simplified
        } else {
            LocationMode::Full
        }
    }
}

pub(crate) fn known_entries<'a>(
    entries: &'a Map<String, Value>,
    keys: &'a [&'static str],
) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
    entries
        .iter()
        .filter(move |(key, value)| keys.contains(&key.as_str()) && !value.is_null())
}

/// Deserialize a single-key object into `T` so a type error names its key.
pub(crate) fn check_field<T: serde::de::DeserializeOwned>(key: &str, value: &Value) -> Result<()> {
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());

    serde_json::from_value::<T>(Value::Object(single))
        .map(|_| ())
        .map_err(|err| Error::InvalidOption {
            name: key.to_string(),
            reason: err.to_string(),
        })
}
