use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolResult, Tool};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::info;

use super::LatLng;
use crate::domain::{
    registry::ToolHandler,
    utils::{non_empty, upstream_envelope},
};
use crate::errors::ToolError;
use crate::upstream::maps::{MapsApi, MapsMethod};

pub const TOOL_NAME: &str = "GoogleMapsPlatformComputeRoutes";

const DESCRIPTION: &str = "\
**Tool Name:** Route Computation Tool
**Core Functionality:** Computes a travel route between a specified origin and destination.
**Supported Travel Modes:** DRIVE (default), WALK.

**Input Requirements (CRITICAL):**
Requires both **origin** and **destination**. Each must be provided using one of the following methods, nested within its respective field:
* **address:** (string, e.g., \"Eiffel Tower, Paris\"). Note: The more granular or specific the input address is, the better the results will be.
* **lat_lng:** (object, {\"latitude\": number, \"longitude\": number})
* **place_id:** (string, e.g., \"ChIJOwE_Id1w5EAR4Q27FkL6T_0\") Note: This id can be obtained from Google Maps Places API or from GoogleMapsPlatformPlacesSearchText.

Any combination of input types is allowed (e.g., origin by address, destination by lat_lng). If either the origin or destination is missing, **you MUST ask the user for clarification** before attempting to call the tool.

**Example Tool Call:**
{\"origin\":{\"address\":\"Eiffel Tower\"},\"destination\":{\"place_id\":\"ChIJt_5xIthw5EARoJ71mGq7t74\"},\"travel_mode\":\"DRIVE\"}";

fn waypoint_schema(description: &str) -> Value {
    let lat_lng = json!({
        "type": "object",
        "description": "The latitude and longitude of the point.",
        "properties": {
            "latitude": { "type": "number", "description": "The latitude of the point." },
            "longitude": { "type": "number", "description": "The longitude of the point." }
        },
        "required": ["latitude", "longitude"]
    });

    json!({
        "type": "object",
        "description": description,
        "oneOf": [
            { "properties": { "lat_lng": lat_lng }, "required": ["lat_lng"] },
            {
                "properties": { "place_id": { "type": "string", "description": "The Place ID of the point." } },
                "required": ["place_id"]
            },
            {
                "properties": { "address": { "type": "string", "description": "The address of the point." } },
                "required": ["address"]
            }
        ]
    })
}

pub fn descriptor() -> Tool {
    serde_json::from_value(json!({
        "name": TOOL_NAME,
        "description": DESCRIPTION,
        "inputSchema": {
            "type": "object",
            "description": "Schema for computing routes between an origin and a destination.",
            "properties": {
                "origin": waypoint_schema("The starting point for the route (e.g., 'Eiffel Tower, Paris')."),
                "destination": waypoint_schema("The ending point for the route (e.g., 'Louvre Museum, Paris')."),
                "travel_mode": {
                    "type": "string",
                    "description": "The mode of travel (e.g., 'DRIVE', 'WALK').",
                    "enum": ["DRIVE", "WALK"],
                    "default": "DRIVE"
                }
            },
            "required": ["origin", "destination"],
            "additionalProperties": false
        }
    }))
    .expect("routes tool descriptor")
}

/// A route endpoint as supplied by the caller. Any subset of fields may be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaypointInput {
    pub lat_lng: Option<LatLng>,
    pub place_id: Option<String>,
    pub address: Option<String>,
}

/// A resolved route endpoint.
///
/// Resolution priority is lat/lng, then place id, then address. An input with
/// none of them resolves to `Unspecified`, which serializes as `{}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Waypoint {
    LatLng(LatLng),
    PlaceId(String),
    Address(String),
    Unspecified,
}

impl Waypoint {
    pub fn resolve(input: WaypointInput) -> Self {
        if let Some(lat_lng) = input.lat_lng {
            return Self::LatLng(lat_lng);
        }
        if let Some(place_id) = non_empty(input.place_id) {
            return Self::PlaceId(place_id);
        }
        if let Some(address) = non_empty(input.address) {
            return Self::Address(address);
        }
        Self::Unspecified
    }
}

impl Serialize for Waypoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::LatLng(lat_lng) => map.serialize_entry("latLng", lat_lng)?,
            Self::PlaceId(place_id) => map.serialize_entry("placeId", place_id)?,
            Self::Address(address) => map.serialize_entry("address", address)?,
            Self::Unspecified => {}
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TravelMode {
    #[default]
    Drive,
    Walk,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutesArgs {
    pub origin: WaypointInput,
    pub destination: WaypointInput,
    #[serde(default, alias = "travelMode")]
    pub travel_mode: TravelMode,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRoutesBody {
    pub origin: Waypoint,
    pub destination: Waypoint,
    pub travel_mode: TravelMode,
}

impl From<RoutesArgs> for ComputeRoutesBody {
    fn from(args: RoutesArgs) -> Self {
        Self {
            origin: Waypoint::resolve(args.origin),
            destination: Waypoint::resolve(args.destination),
            travel_mode: args.travel_mode,
        }
    }
}

pub struct ComputeRoutesTool {
    maps: Arc<dyn MapsApi>,
}

impl ComputeRoutesTool {
    pub fn new(maps: Arc<dyn MapsApi>) -> Self {
        Self { maps }
    }
}

#[async_trait]
impl ToolHandler for ComputeRoutesTool {
    async fn call(&self, arguments: Map<String, Value>) -> Result<CallToolResult, ToolError> {
        let args: RoutesArgs = serde_json::from_value(Value::Object(arguments))?;
        let body = ComputeRoutesBody::from(args);

        info!(
            tool = TOOL_NAME,
            origin = ?body.origin,
            destination = ?body.destination,
            travel_mode = ?body.travel_mode,
            "calling tool"
        );

        let payload = serde_json::to_value(&body)?;
        let result = self.maps.call(MapsMethod::ComputeRoutes, &payload).await;
        Ok(upstream_envelope(TOOL_NAME, result))
    }
}
