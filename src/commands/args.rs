//! Command arguments: a JSON object with typed accessors

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::commands::error::{CommandError, CommandResult};

/// Key that overrides a command's default recording behaviour.
pub const SHOULD_RECORD_UNDO: &str = "should_record_undo";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs(Map<String, JsonValue>);

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a JSON object; `null` yields empty args.
    pub fn from_json(value: JsonValue) -> CommandResult<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            JsonValue::Null => Ok(Self::default()),
            other => Err(CommandError::invalid(
                "args",
                format!("expected an object, got {other}"),
            )),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Typed optional argument; present but malformed is an error.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> CommandResult<Option<T>> {
        self.get(key)
            .map(|v| serde_json::from_value(v.clone()).map_err(|e| CommandError::invalid(key, e.to_string())))
            .transpose()
    }

    pub fn require<T: DeserializeOwned>(&self, key: &str) -> CommandResult<T> {
        self.get_as(key)?
            .ok_or_else(|| CommandError::invalid(key, "missing"))
    }

    pub fn or<T: DeserializeOwned>(&self, key: &str, default: T) -> CommandResult<T> {
        Ok(self.get_as(key)?.unwrap_or(default))
    }

    pub fn should_record_undo(&self) -> Option<bool> {
        self.get(SHOULD_RECORD_UNDO).and_then(JsonValue::as_bool)
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }
}

impl From<Map<String, JsonValue>> for CommandArgs {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}
