use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolResult, Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use super::LatLng;
use crate::domain::{
    registry::ToolHandler,
    utils::{non_empty, upstream_envelope},
};
use crate::errors::ToolError;
use crate::upstream::maps::{MapsApi, MapsMethod};

pub const TOOL_NAME: &str = "GoogleMapsPlatformPlacesSearchText";

const DESCRIPTION: &str = "\
**Tool Name:** Places Search Tool
**Core Functionality:** Searches for places based on a text query.
**Input Requirements (CRITICAL):**
* **text_query:** (string) - The primary search term (e.g., 'restaurants in New York', 'coffee shops near Golden Gate Park', 'SF MoMA'). This is the only mandatory parameter.
**Location Bias:**
To bias results to a specific area, use the 'location_bias' parameter. This is defined as a circle with a center point (latitude, longitude) and a radius in meters.
Example: {\"location_bias\": {\"circle\": {\"center\": {\"latitude\": 34.052235, \"longitude\": -118.243683}, \"radius_meters\": 5000}}}
**Location Information:**
Some location information must be available to use this tool. The location information can either be specified in the query (e.g., \"pizza in New York\") or in the location_bias parameter.";

pub fn descriptor() -> Tool {
    serde_json::from_value(json!({
        "name": TOOL_NAME,
        "description": DESCRIPTION,
        "inputSchema": {
            "type": "object",
            "description": "Schema for searching places based on a text query.",
            "properties": {
                "text_query": {
                    "type": "string",
                    "description": "The text query to search for places (e.g., 'restaurants in New York')."
                },
                "language_code": {
                    "type": "string",
                    "description": "language code, indicating in which language the results should be returned, if possible. Full list can be found at https://developers.google.com/maps/faq#languagesupport."
                },
                "region_code": {
                    "type": "string",
                    "description": "region code, indicating the region where results should be biased, if possible. This is specified as a Unicode country/region code (CLDR) two-character value. For example, to bias results to the United States, use 'US'."
                },
                "location_bias": {
                    "type": "object",
                    "description": "location bias, to prefer results in a specified area. The location bias is an area, defined as a circle. If radius_meters is not specified, the center point is used as a point bias.",
                    "properties": {
                        "circle": {
                            "type": "object",
                            "description": "A circle defined by a center point and a radius.",
                            "properties": {
                                "center": {
                                    "type": "object",
                                    "description": "The center point of the circle.",
                                    "properties": {
                                        "latitude": { "type": "number", "description": "The latitude of the center point." },
                                        "longitude": { "type": "number", "description": "The longitude of the center point." }
                                    },
                                    "required": ["latitude", "longitude"]
                                },
                                "radius_meters": {
                                    "type": "number",
                                    "description": "The radius of the circle in meters."
                                }
                            },
                            "required": ["center"]
                        }
                    }
                }
            },
            "required": ["text_query"],
            "additionalProperties": false
        }
    }))
    .expect("places tool descriptor")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Circle {
    pub center: LatLng,
    #[serde(
        rename(serialize = "radiusMeters"),
        skip_serializing_if = "Option::is_none"
    )]
    pub radius_meters: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocationBias {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle: Option<Circle>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacesArgs {
    pub text_query: String,
    pub language_code: Option<String>,
    pub region_code: Option<String>,
    pub location_bias: Option<LocationBias>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextBody {
    pub text_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_bias: Option<LocationBias>,
}

impl From<PlacesArgs> for SearchTextBody {
    fn from(args: PlacesArgs) -> Self {
        Self {
            text_query: args.text_query,
            language_code: non_empty(args.language_code),
            region_code: non_empty(args.region_code),
            location_bias: args.location_bias,
        }
    }
}

pub struct PlacesSearchTextTool {
    maps: Arc<dyn MapsApi>,
}

impl PlacesSearchTextTool {
    pub fn new(maps: Arc<dyn MapsApi>) -> Self {
        Self { maps }
    }
}

#[async_trait]
impl ToolHandler for PlacesSearchTextTool {
    async fn call(&self, arguments: Map<String, Value>) -> Result<CallToolResult, ToolError> {
        let args: PlacesArgs = serde_json::from_value(Value::Object(arguments))?;
        let body = SearchTextBody::from(args);

        info!(
            tool = TOOL_NAME,
            text_query = %body.text_query,
            language_code = ?body.language_code,
            region_code = ?body.region_code,
            location_bias = ?body.location_bias,
            "calling tool"
        );

        let payload = serde_json::to_value(&body)?;
        let result = self.maps.call(MapsMethod::PlacesSearchText, &payload).await;
        Ok(upstream_envelope(TOOL_NAME, result))
    }
}
