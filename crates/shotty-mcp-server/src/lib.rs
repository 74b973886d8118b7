//! shotty-mcp-server: MCP server for desktop screenshots
//!
//! Thin protocol layer that wraps shotty-core with MCP tool routing
//! and response formatting.

pub mod logging;
pub mod mcp;
pub mod mcp_content;
