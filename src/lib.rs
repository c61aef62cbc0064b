// Meta Marketing API client
pub mod meta;

// Encrypted per-user credential storage
pub mod credentials;

// Account connection (OAuth authorization code flow)
pub mod oauth;

// Picks the access token a tool call runs with
pub mod resolver;

// MCP tool definitions and dispatch
pub mod tools;

// Campaign planning capability behind the AI-assisted tools
pub mod planner;

// HTTP endpoints
pub mod api;

// Configuration
pub mod config;
