use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolResult, Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::domain::{registry::ToolHandler, utils::upstream_envelope};
use crate::errors::ToolError;
use crate::upstream::maps::{MapsApi, MapsMethod};

pub const TOOL_NAME: &str = "GoogleMapsPlatformWeatherLookup";

const DESCRIPTION: &str = "\
**Tool Name:** Weather Information Tool (Google Maps Platform)
**Core Functionality:** Provides current conditions, hourly, and daily forecasts for any location. Use this tool for all weather-related inquiries.
**Specific Data Available:** Temperature (Current, Feels Like, Max/Min, Heat Index), Wind (Speed, Gusts, Direction), Celestial Events (Sunrise/Sunset, Moon Phase), Precipitation (Type, Probability, Quantity/QPF), Atmospheric Conditions (UV Index, Humidity, Cloud Cover, Thunderstorm Probability), and Geocoded Location Address.

**Input Requirements (CRITICAL):**
* **Current Conditions:** Requires only a location (e.g., city or address).
* **Hourly Forecasts:** Requires a location and an **hour** (0-23). Use if the user asks for weather at a specific time or using terms like \"next few hours,\" or \"later today.\"
* **Daily Forecasts:** Requires a location and a full date.

Date Handling (CRITICAL): User-provided dates and hours MUST be provided in the local timezone of the requested location. Dates MUST be broken down into separate integer parameters: year, month, and day. The required format for these parameters is: {\"year\": <int>, \"month\": <int>, \"day\": <int>}.";

pub fn descriptor() -> Tool {
    serde_json::from_value(json!({
        "name": TOOL_NAME,
        "description": DESCRIPTION,
        "inputSchema": {
            "type": "object",
            "description": "Schema for requesting weather conditions based on a specific location, date, and hour, with optional unit system preferences.",
            "properties": {
                "address": {
                    "type": "string",
                    "description": "The address of the location to get the weather conditions for. This can be a street address, city, zip code, etc."
                },
                "date": {
                    "type": "object",
                    "description": "The date of the required weather information",
                    "properties": {
                        "year": { "type": "integer", "description": "The year of the requested weather information." },
                        "month": { "type": "integer", "description": "The month of the requested weather information." },
                        "day": { "type": "integer", "description": "The day of the requested weather information." }
                    }
                },
                "hour": {
                    "type": "integer",
                    "description": "The hour of the requested weather information, in 24-hour format (0-23).",
                    "minimum": 0,
                    "maximum": 23
                },
                "unitsSystem": {
                    "type": "string",
                    "description": "The units system to use for the returned weather conditions.",
                    "enum": ["METRIC", "IMPERIAL"],
                    "default": "METRIC"
                }
            },
            "required": ["address"],
            "additionalProperties": false
        }
    }))
    .expect("weather tool descriptor")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitsSystem {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeatherDate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl WeatherDate {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherArgs {
    pub address: String,
    pub date: Option<WeatherDate>,
    pub hour: Option<u8>,
    #[serde(rename = "unitsSystem")]
    pub units_system: Option<UnitsSystem>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherLookupBody {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<WeatherDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_system: Option<UnitsSystem>,
}

impl From<WeatherArgs> for WeatherLookupBody {
    fn from(args: WeatherArgs) -> Self {
        Self {
            address: args.address,
            date: args.date.filter(|date| !date.is_empty()),
            hour: args.hour,
            units_system: args.units_system,
        }
    }
}

pub struct WeatherLookupTool {
    maps: Arc<dyn MapsApi>,
}

impl WeatherLookupTool {
    pub fn new(maps: Arc<dyn MapsApi>) -> Self {
        Self { maps }
    }
}

#[async_trait]
impl ToolHandler for WeatherLookupTool {
    async fn call(&self, arguments: Map<String, Value>) -> Result<CallToolResult, ToolError> {
        let args: WeatherArgs = serde_json::from_value(Value::Object(arguments))?;
        let body = WeatherLookupBody::from(args);

        info!(
            tool = TOOL_NAME,
            address = %body.address,
            date = ?body.date,
            hour = ?body.hour,
            units_system = ?body.units_system,
            "calling tool"
        );

        let payload = serde_json::to_value(&body)?;
        let result = self.maps.call(MapsMethod::WeatherLookup, &payload).await;
        Ok(upstream_envelope(TOOL_NAME, result))
    }
}
