use std::{env, net::IpAddr};

use thiserror::Error;

pub const DEFAULT_MAPS_API_BASE_URL: &str = "https://mapstools.googleapis.com/v1alpha";
pub const DEFAULT_RAG_ENDPOINT: &str = "https://rag-230009110455.us-central1.run.app";
pub const DEFAULT_SOURCE: &str = "github";
pub const DEFAULT_BIND_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub source: String,
    pub transport: Transport,
    pub bind_addr: IpAddr,
    pub bind_port: u16,
    pub maps_base_url: String,
    pub rag_endpoint: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable GOOGLE_MAPS_API_KEY not found. Please set it to your Google Maps API key.")]
    MissingApiKey,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("BIND_ADDR must be a valid IP address")]
    InvalidBindAddr,
    #[error("MCP_TRANSPORT must be one of: stdio, http")]
    InvalidTransport,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let transport = match non_empty("MCP_TRANSPORT")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("stdio") => Transport::Stdio,
            Some("http") => Transport::Http,
            Some(_) => return Err(ConfigError::InvalidTransport),
        };

        let bind_addr = non_empty("BIND_ADDR")
            .map(|value| {
                value
                    .parse::<IpAddr>()
                    .map_err(|_| ConfigError::InvalidBindAddr)
            })
            .transpose()?
            .unwrap_or(IpAddr::from([127, 0, 0, 1]));
        let bind_port = non_empty("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_BIND_PORT);

        Ok(Self {
            api_key: non_empty("GOOGLE_MAPS_API_KEY"),
            source: non_empty("SOURCE").unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            transport,
            bind_addr,
            bind_port,
            maps_base_url: non_empty("GOOGLE_MAPS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MAPS_API_BASE_URL.to_string()),
            rag_endpoint: non_empty("RAG_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_RAG_ENDPOINT.to_string()),
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}
