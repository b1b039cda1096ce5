use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{join_url, read_reply, UpstreamReply};
use crate::errors::UpstreamError;

/// Product areas the documentation search is scoped to.
pub const DEFAULT_CONTEXTS: &[&str] = &[
    "Google Maps Platform",
    "Maps JavaScript API",
    "Maps SDK for Android",
    "Maps SDK for iOS",
    "Google Maps for Flutter",
    "Maps Embed API",
    "Maps Static API",
    "Street View Static API",
    "Maps URLs",
    "Elevation API",
    "Map Tiles API",
    "Maps Datasets API",
    "Web Components",
    "3D Maps",
    "Aerial View API",
    "Routes API",
    "Directions API",
    "Distance Matrix API",
    "Navigation SDK for Android",
    "Navigation SDK for iOS",
    "Navigation for Flutter",
    "Navigation for React Native",
    "Roads API",
    "Route Optimization API",
    "Places UI Kit",
    "Places API (New)",
    "Places API (Legacy)",
    "Places SDK for Android",
    "Places SDK for iOS",
    "Places Library",
    "Geocoding API",
    "Geolocation API",
    "Address Validation API",
    "Time Zone API",
    "Air Quality API",
    "Pollen API",
    "Solar API",
    "Weather API",
    "Imagery Insights",
    "Places Insights",
    "Road Management Insights",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInstructions {
    pub system_instructions: String,
    pub preamble: String,
    pub european_economic_area_terms_disclaimer: String,
}

impl UsageInstructions {
    /// The three parts in presentation order, separated by blank lines.
    pub fn joined(&self) -> String {
        [
            self.system_instructions.as_str(),
            self.preamble.as_str(),
            self.european_economic_area_terms_disclaimer.as_str(),
        ]
        .join("\n\n")
    }
}

#[async_trait]
pub trait DocsApi: Send + Sync {
    async fn retrieve_docs(&self, prompt: &str) -> Result<UpstreamReply, UpstreamError>;
    async fn fetch_instructions(&self) -> Result<UsageInstructions, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct HttpRagClient {
    http: reqwest::Client,
    endpoint: String,
    source: String,
}

impl HttpRagClient {
    pub fn new(endpoint: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }
}

#[async_trait]
impl DocsApi for HttpRagClient {
    async fn retrieve_docs(&self, prompt: &str) -> Result<UpstreamReply, UpstreamError> {
        let response = self
            .http
            .post(join_url(&self.endpoint, "chat"))
            .json(&json!({
                "message": prompt,
                "contexts": DEFAULT_CONTEXTS,
                "source": self.source,
            }))
            .send()
            .await?;

        read_reply(response).await
    }

    async fn fetch_instructions(&self) -> Result<UsageInstructions, UpstreamError> {
        let response = self
            .http
            .get(join_url(&self.endpoint, "instructions"))
            .query(&[("source", self.source.as_str())])
            .send()
            .await?;

        let reply = read_reply(response).await?;
        serde_json::from_value(reply.body).map_err(|err| UpstreamError::Decode(err.to_string()))
    }
}
