use async_trait::async_trait;
use serde_json::Value;

use super::{join_url, read_reply, UpstreamReply};
use crate::errors::UpstreamError;

/// Google Maps Platform methods reachable through the maps tools endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapsMethod {
    WeatherLookup,
    PlacesSearchText,
    ComputeRoutes,
}

impl MapsMethod {
    pub fn path(self) -> &'static str {
        match self {
            Self::WeatherLookup => "weather:lookup",
            Self::PlacesSearchText => "places:searchText",
            Self::ComputeRoutes => "routes:compute",
        }
    }
}

#[async_trait]
pub trait MapsApi: Send + Sync {
    async fn call(&self, method: MapsMethod, body: &Value) -> Result<UpstreamReply, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct HttpMapsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMapsClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl MapsApi for HttpMapsClient {
    async fn call(&self, method: MapsMethod, body: &Value) -> Result<UpstreamReply, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingApiKey)?;

        let response = self
            .http
            .post(join_url(&self.base_url, method.path()))
            .query(&[("key", api_key)])
            .json(body)
            .send()
            .await?;

        read_reply(response).await
    }
}
