use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Result document returned by the SQL endpoint.
#[derive(Debug, Deserialize)]
pub struct ResponseDocument {
    #[serde(default)]
    pub schema: Option<JsonValue>,
    #[serde(default)]
    pub data: Option<JsonValue>,
    #[serde(default)]
    pub warnings: Option<JsonValue>,
    #[serde(default, rename = "execution-time")]
    pub execution_time: Option<u64>,
    #[serde(default, rename = "rows-affected")]
    pub rows_affected: Option<u64>,
    /// `Some` whenever the key is present, including `"error": null`.
    #[serde(default, deserialize_with = "present")]
    pub error: Option<JsonValue>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

/// Field descriptor inside `schema.fields`.
#[derive(Debug, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldDescriptor>,
}
