use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named request parameters. A "text" attribute is a JSON string.
pub type Attributes = Map<String, Value>;

/// Returns the attribute as text, or `None` when absent or not a string.
pub fn text_attribute<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes.get(key).and_then(Value::as_str)
}

/// Canonical invocation shown alongside a command's description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandExample {
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Serializable view of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub example: CommandExample,
}

/// Request payload for dispatching a command over HTTP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchInput {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub body: Option<String>,
}
