//! The closed set of device-control operations offered to the completion engine.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use thiserror::Error;

use crate::ToolCallError;

const TEMPERATURE_DESCRIPTION: &str = "Changes the temperature of the light, the value of the temperature is between 1000 and 27000.
Temperature	Source
1,000 K	Most commercial electric heating elements
1,700 K	Match flame, low-pressure sodium lamps (LPS/SOX)
1,850 K	Candle flame, sunset/sunrise
2,400 K	Standard incandescent lamps
2,550 K	Soft white incandescent lamps
2,700 K	\"Soft white\" compact fluorescent and LED lamps
3,000 K	Warm white compact fluorescent and LED lamps
3,200 K	Studio lamps, photofloods, etc.
3,350 K	Studio \"CP\" light
5,000 K	Horizon daylight, tubular fluorescent lamps or cool white/daylight compact fluorescent lamps (CFL)
5,500–6,000 K	Vertical daylight, electronic flash
6,200 K	Xenon short-arc lamp
6,500 K	Daylight, overcast, daylight LED lamps
6,500–9,500 K	LCD or CRT screens
15,000–27,000 K	Clear blue poleward sky";

/// A decoded tool invocation.
///
/// Using an enum ensures compile-time safety for tool names and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum LightTool {
    CreateLight {
        #[serde(alias = "lightName", alias = "name")]
        light_name: String,
    },
    DeleteLight {
        #[serde(alias = "lightId", alias = "id", deserialize_with = "de_light_id")]
        light_id: u64,
    },
    GetLights {},
    GetLight {
        #[serde(alias = "lightId", alias = "id", deserialize_with = "de_light_id")]
        light_id: u64,
    },
    ChangeState {
        #[serde(alias = "lightId", deserialize_with = "de_light_id")]
        id: u64,
        #[serde(alias = "isOn")]
        is_on: bool,
    },
    ChangeTemperature {
        #[serde(alias = "lightId", deserialize_with = "de_light_id")]
        id: u64,
        temperature: i64,
    },
}

impl LightTool {
    pub const NAMES: [&'static str; 6] = [
        "create_light",
        "delete_light",
        "get_lights",
        "get_light",
        "change_state",
        "change_temperature",
    ];

    /// Decode a tool call as issued by the model.
    ///
    /// `arguments` may be an object, a JSON-encoded string of an object, or null.
    pub fn from_call(name: &str, arguments: &Value) -> Result<Self, ToolCallError> {
        if !Self::NAMES.contains(&name) {
            return Err(ToolCallError::UnknownTool(name.to_owned()));
        }
        let invalid =
            |source| ToolCallError::InvalidArguments { tool: name.to_owned(), source };
        let arguments = match arguments {
            Value::Null => json!({}),
            Value::String(raw) if raw.trim().is_empty() => json!({}),
            Value::String(raw) => serde_json::from_str(raw).map_err(invalid)?,
            other => other.clone(),
        };
        serde_json::from_value(json!({ "name": name, "arguments": arguments })).map_err(invalid)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateLight { .. } => "create_light",
            Self::DeleteLight { .. } => "delete_light",
            Self::GetLights {} => "get_lights",
            Self::GetLight { .. } => "get_light",
            Self::ChangeState { .. } => "change_state",
            Self::ChangeTemperature { .. } => "change_temperature",
        }
    }
}

/// Models emit ids both as numbers and as numeric strings.
fn de_light_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Function schemas for every [`LightTool`], in the chat-completion `tools` format.
#[must_use]
pub fn light_tool_definitions() -> Vec<Value> {
    let id_param = json!({ "type": "integer", "description": "Id of the light" });
    vec![
        function(
            "create_light",
            "Creates a new light with the given name",
            json!({
                "type": "object",
                "properties": { "light_name": { "type": "string", "description": "Name of the new light" } },
                "required": ["light_name"]
            }),
        ),
        function(
            "delete_light",
            "Delete a light, return true if success",
            json!({
                "type": "object",
                "properties": { "light_id": id_param },
                "required": ["light_id"]
            }),
        ),
        function(
            "get_lights",
            "Gets the list of all lights and their current state",
            json!({ "type": "object", "properties": {} }),
        ),
        function(
            "get_light",
            "Gets a light information from the specified id",
            json!({
                "type": "object",
                "properties": { "light_id": id_param },
                "required": ["light_id"]
            }),
        ),
        function(
            "change_state",
            "Changes the state of the light",
            json!({
                "type": "object",
                "properties": {
                    "id": id_param,
                    "is_on": { "type": "boolean", "description": "true to switch the light on" }
                },
                "required": ["id", "is_on"]
            }),
        ),
        function(
            "change_temperature",
            TEMPERATURE_DESCRIPTION,
            json!({
                "type": "object",
                "properties": {
                    "id": id_param,
                    "temperature": { "type": "integer", "minimum": 1000, "maximum": 27000 }
                },
                "required": ["id", "temperature"]
            }),
        ),
    ]
}

fn function(name: &str, description: &str, parameters: Value) -> Value {
    json!({
        "type": "function",
        "function": { "name": name, "description": description, "parameters": parameters }
    })
}

/// A tool that ran but failed; reported back to the model, not to the client.
#[derive(Error, Debug)]
#[error("{tool} failed: {source}")]
pub struct ToolError {
    pub tool: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Executes decoded tool calls on behalf of the completion engine.
#[async_trait]
pub trait Toolset: Send + Sync {
    /// Schemas advertised to the model.
    fn definitions(&self) -> Vec<Value> {
        light_tool_definitions()
    }

    /// Run one call; the repository result is returned serialized, untouched.
    async fn execute(&self, call: LightTool) -> Result<Value, ToolError>;
}
