//! Interactive tools exposed via Model Context Protocol
//!
//! Each handler extracts its arguments, performs exactly one upstream call and
//! maps the outcome into a single text envelope.

pub mod docs;
pub mod places;
pub mod routes;
pub mod weather;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{instructions::InstructionsCache, registry::ToolRegistry};
use crate::errors::ToolError;
use crate::upstream::{maps::MapsApi, rag::DocsApi};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

pub fn maps_tools_registry(maps: Arc<dyn MapsApi>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(
        weather::descriptor(),
        Arc::new(weather::WeatherLookupTool::new(Arc::clone(&maps))),
    )?;
    registry.register(
        places::descriptor(),
        Arc::new(places::PlacesSearchTextTool::new(Arc::clone(&maps))),
    )?;
    registry.register(
        routes::descriptor(),
        Arc::new(routes::ComputeRoutesTool::new(maps)),
    )?;
    Ok(registry)
}

pub fn code_assist_registry(
    docs_api: Arc<dyn DocsApi>,
    cache: Arc<InstructionsCache>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(
        docs::RetrieveDocsTool::tool(),
        Arc::new(docs::DocsRetrieval::new(Arc::clone(&docs_api))),
    )?;
    registry.register(
        docs::instructions_descriptor(),
        Arc::new(docs::InstructionsRetrieval::new(docs_api, cache)),
    )?;
    Ok(registry)
}
