//! Tool and resource integrations
//!
//! Provides the Google Maps Platform capabilities exposed over the MCP protocol.

pub mod instructions;
pub mod registry;
pub mod resources;
pub mod tools;
pub mod utils;
