//! MCP tool registry for the Meta Ads API.
//!
//! Each tool has a JSON Schema for its arguments. A call is validated against
//! that schema, decoded into a typed argument struct, and only then resolves
//! the caller's credential and reaches the network. Results are returned as a
//! single MCP text content block holding pretty-printed JSON.

mod args;
mod catalog;
mod handlers;

pub use catalog::{tool_definitions, ToolDefinition};

use crate::meta::MetaApiError;
use crate::planner::{CampaignPlanner, StubPlanner};
use crate::resolver::{AuthorizationError, CredentialResolver};
use anyhow::anyhow;
use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Tool call failures, surfaced to the MCP caller.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    Validation(String),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Remote(#[from] MetaApiError),

    #[error("Campaign planner failed: {0:#}")]
    Planner(anyhow::Error),

    #[error("Failed to serialize tool output: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One MCP content block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// MCP `tools/call` result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// Pretty-printed JSON body.
    pub fn json(value: &Value) -> Result<Self, ToolError> {
        Ok(Self::text(serde_json::to_string_pretty(value)?))
    }

    pub fn error(err: &ToolError) -> Self {
        Self {
            is_error: true,
            ..Self::text(err.to_string())
        }
    }

    /// Text of the first content block.
    pub fn body(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or_default()
    }
}

/// App-level facts reported by `test_connection`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerStatus {
    pub has_meta_app_id: bool,
    pub has_meta_app_secret: bool,
}

/// Dispatches tool calls to the Meta API client.
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    validators: HashMap<&'static str, JSONSchema>,
    resolver: CredentialResolver,
    planner: Arc<dyn CampaignPlanner>,
    status: ServerStatus,
}

impl ToolRegistry {
    /// Registry using [`StubPlanner`] for the AI-assisted tools.
    pub fn new(resolver: CredentialResolver) -> anyhow::Result<Self> {
        let definitions = tool_definitions();
        let mut validators = HashMap::with_capacity(definitions.len());

        for def in &definitions {
            let validator = JSONSchema::compile(&def.input_schema)
                .map_err(|e| anyhow!("Invalid input schema for {}: {}", def.name, e))?;
            validators.insert(def.name, validator);
        }

        Ok(Self {
            definitions,
            validators,
            resolver,
            planner: Arc::new(StubPlanner),
            status: ServerStatus::default(),
        })
    }

    pub fn with_planner(mut self, planner: Arc<dyn CampaignPlanner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_status(mut self, status: ServerStatus) -> Self {
        self.status = status;
        self
    }

    /// Tools for `tools/list`.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Validate `args` against the tool's schema and run it.
    pub async fn call(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let validator = self
            .validators
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        // Clients may send no arguments at all
        let args = if args.is_null() { json!({}) } else { args };

        if let Err(errors) = validator.validate(&args) {
            let message = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            debug!(tool = %name, error = %message, "Rejected tool arguments");
            return Err(ToolError::Validation(message));
        }

        let result = self.dispatch(name, args).await?;
        ToolOutput::json(&result)
    }

    /// Like [`call`](Self::call), with failures folded into an `isError` result.
    pub async fn call_tool(&self, name: &str, args: Value) -> ToolOutput {
        match self.call(name, args).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                ToolOutput::error(&e)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TokenStore;
    use crate::resolver::ClientSettings;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    fn registry() -> ToolRegistry {
        let store = Arc::new(TokenStore::new(":memory:", &BASE64.encode([7u8; 32])).unwrap());
        ToolRegistry::new(CredentialResolver::new(store, ClientSettings::default())).unwrap()
    }

    #[test]
    fn test_all_schemas_compile() {
        let registry = registry();
        assert_eq!(registry.definitions().len(), registry.validators.len());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = registry().call("delete_everything", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "delete_everything"));
    }

    #[tokio::test]
    async fn test_missing_user_id_rejected() {
        let err = registry().call("get_ad_accounts", json!({})).await.unwrap_err();
        match err {
            ToolError::Validation(message) => assert!(message.contains("user_id")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_objective_enum_enforced() {
        let err = registry()
            .call(
                "create_campaign",
                json!({
                    "user_id": "u1",
                    "account_id": "act_1",
                    "name": "Spring",
                    "objective": "CONVERSIONS"
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_numeric_typing_enforced() {
        let err = registry()
            .call("get_ad_accounts", json!({"user_id": "u1", "limit": "many"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_null_arguments_use_defaults() {
        let output = registry().call("test_connection", Value::Null).await.unwrap();
        let body: Value = serde_json::from_str(output.body()).unwrap();
        assert_eq!(body["status"], "connected");
        assert_eq!(body["user_authenticated"], false);
    }

    #[tokio::test]
    async fn test_unauthenticated_user_is_authorization_error() {
        let err = registry()
            .call("get_ad_accounts", json!({"user_id": "nobody"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::Authorization(AuthorizationError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_call_tool_folds_errors() {
        let output = registry().call_tool("get_campaigns", json!({"user_id": "u1"})).await;
        assert!(output.is_error);
        assert!(output.body().starts_with("Invalid arguments:"));

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["type"], "text");
    }

    #[test]
    fn test_success_output_omits_is_error() {
        let output = ToolOutput::json(&json!({"id": "1"})).unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("isError").is_none());
        assert_eq!(output.body(), "{\n  \"id\": \"1\"\n}");
    }
}
