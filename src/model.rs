use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// Canonical fighter identity.
///
/// The catalog and favorites endpoints disagree on whether ids are numbers or
/// numeric strings, so every id is parsed into this type once, at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FighterId(i64);

impl FighterId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Parse a JSON value holding an id in either representation.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Self),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FighterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for FighterId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for FighterId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("invalid fighter id '{}'", s))
    }
}

impl Serialize for FighterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for FighterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = FighterId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FighterId, E> {
                Ok(FighterId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FighterId, E> {
                i64::try_from(v)
                    .map(FighterId)
                    .map_err(|_| E::custom("fighter id out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<FighterId, E> {
                if v.fract() == 0.0 {
                    Ok(FighterId(v as i64))
                } else {
                    Err(E::custom("fighter id is not an integer"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FighterId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// A selectable character as served by `/characters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterRecord {
    pub id: FighterId,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub tagline: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub fighting_style: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The signed-in user. Only `name` is interpreted; everything else is carried
/// through storage untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Fighter")
    }
}

/// Body returned by `/login` and `/register`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Extract favorite ids from any of the shapes `/favorites` returns:
/// a bare array, or `{"data": [...]}`, whose entries carry `character_id`
/// (preferred) or `id`.
pub fn parse_favorites(body: &Value) -> Vec<FighterId> {
    let entries = match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let raw = match entry {
                Value::Object(fields) => fields
                    .get("character_id")
                    .filter(|v| is_present(v))
                    .or_else(|| fields.get("id")),
                other => Some(other),
            };
            let id = raw.and_then(FighterId::from_value);
            if id.is_none() {
                warn!(entry = %entry, "skipping favorite entry without a usable id");
            }
            id
        })
        .collect()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Display fields of the details modal, projected from a record as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FighterDetails {
    pub id: FighterId,
    pub name: String,
    pub tagline: String,
    pub country: String,
    pub fighting_style: String,
    pub description: String,
    pub image: String,
    pub image_alt: String,
}

impl From<&FighterRecord> for FighterDetails {
    fn from(fighter: &FighterRecord) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();
        Self {
            id: fighter.id,
            name: fighter.name.clone(),
            tagline: text(&fighter.tagline),
            country: text(&fighter.country),
            fighting_style: text(&fighter.fighting_style),
            description: text(&fighter.description),
            image: fighter
                .image
                .clone()
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| "default.jpg".to_string()),
            image_alt: fighter.name.clone(),
        }
    }
}
