//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the external API routing, including the session-aware `/mcp`
//! listener, health reporting and discovery.

pub mod handlers;
pub mod session_header;
