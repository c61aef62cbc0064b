//! Tool names, descriptions and input schemas.

use crate::meta::{AdStatus, CampaignObjective};
use serde::Serialize;
use serde_json::{json, Value};

/// A tool as published to MCP clients.
#[derive(Clone, Debug, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn tool(name: &'static str, description: &'static str, properties: Value, required: &[&str]) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

fn user_id() -> Value {
    json!({ "type": "string", "minLength": 1, "description": "User ID" })
}

fn account_id() -> Value {
    json!({ "type": "string", "minLength": 1, "description": "Ad account ID (act_XXXXXXXXX)" })
}

fn limit(default: u32) -> Value {
    json!({ "type": "integer", "minimum": 1, "default": default })
}

fn status() -> Value {
    json!({ "type": "string", "enum": AdStatus::ALL, "default": "PAUSED" })
}

fn time_range() -> Value {
    json!({
        "type": "string",
        "default": "last_7d",
        "description": "today, yesterday, last_7d, last_14d, last_30d, this_month, last_month or maximum"
    })
}

/// Every tool the registry serves, in publication order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "test_connection",
            "Test if the MCP server is working and check authentication status",
            json!({
                "user_id": { "type": "string", "default": "test-user" }
            }),
            &[],
        ),
        tool(
            "check_auth_status",
            "Check if user has connected their Meta Ads account",
            json!({
                "user_id": { "type": "string", "minLength": 1, "description": "User ID to check" }
            }),
            &["user_id"],
        ),
        tool(
            "get_ad_accounts",
            "Get all Meta ad accounts accessible by the user",
            json!({
                "user_id": user_id(),
                "limit": limit(200)
            }),
            &["user_id"],
        ),
        tool(
            "get_campaigns",
            "Get campaigns for an ad account",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "limit": limit(10),
                "status_filter": { "type": "string" }
            }),
            &["user_id", "account_id"],
        ),
        tool(
            "create_campaign",
            "Create a new Meta Ads campaign",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "name": { "type": "string", "minLength": 1, "description": "Campaign name" },
                "objective": { "type": "string", "enum": CampaignObjective::ALL },
                "status": status(),
                "daily_budget": { "type": "integer", "minimum": 0, "description": "In cents of the account currency" },
                "lifetime_budget": { "type": "integer", "minimum": 0 },
                "special_ad_categories": { "type": "array", "items": { "type": "string" } },
                "bid_strategy": { "type": "string" }
            }),
            &["user_id", "account_id", "name", "objective"],
        ),
        tool(
            "update_campaign",
            "Update an existing campaign",
            json!({
                "user_id": user_id(),
                "campaign_id": { "type": "string", "minLength": 1, "description": "Campaign ID" },
                "status": { "type": "string", "enum": AdStatus::ALL },
                "name": { "type": "string", "minLength": 1 },
                "daily_budget": { "type": "integer", "minimum": 0 }
            }),
            &["user_id", "campaign_id"],
        ),
        tool(
            "get_campaign_insights",
            "Get performance insights for a campaign",
            json!({
                "user_id": user_id(),
                "campaign_id": { "type": "string", "minLength": 1, "description": "Campaign ID" },
                "time_range": time_range(),
                "breakdown": { "type": "string", "description": "e.g. age, gender, country" }
            }),
            &["user_id", "campaign_id"],
        ),
        tool(
            "create_adset",
            "Create a new ad set in a campaign",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "campaign_id": { "type": "string", "minLength": 1, "description": "Campaign ID" },
                "name": { "type": "string", "minLength": 1, "description": "Ad set name" },
                "status": status(),
                "daily_budget": { "type": "string" },
                "lifetime_budget": { "type": "string" },
                "targeting": { "type": "object", "description": "Targeting spec" },
                "optimization_goal": { "type": "string", "default": "LINK_CLICKS" },
                "billing_event": { "type": "string", "default": "IMPRESSIONS" },
                "start_time": { "type": "string" },
                "end_time": { "type": "string" }
            }),
            &["user_id", "account_id", "campaign_id", "name", "targeting"],
        ),
        tool(
            "create_ad_creative",
            "Create a new ad creative",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "name": { "type": "string", "minLength": 1, "description": "Creative name" },
                "object_story_spec": { "type": "object", "description": "Creative spec" },
                "degrees_of_freedom_spec": { "type": "object" }
            }),
            &["user_id", "account_id", "name", "object_story_spec"],
        ),
        tool(
            "create_ad",
            "Create a new ad in an ad set",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "name": { "type": "string", "minLength": 1, "description": "Ad name" },
                "adset_id": { "type": "string", "minLength": 1, "description": "Ad set ID" },
                "creative_id": { "type": "string", "minLength": 1, "description": "Creative ID" },
                "status": status()
            }),
            &["user_id", "account_id", "name", "adset_id", "creative_id"],
        ),
        tool(
            "search_interests",
            "Search for targeting interests",
            json!({
                "user_id": user_id(),
                "query": { "type": "string", "minLength": 1, "description": "Search query" },
                "limit": limit(25)
            }),
            &["user_id", "query"],
        ),
        tool(
            "upload_ad_image",
            "Upload an image for use in ads",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "image_url": { "type": "string", "minLength": 1, "description": "URL of image to upload" },
                "name": { "type": "string" }
            }),
            &["user_id", "account_id", "image_url"],
        ),
        tool(
            "get_custom_audiences",
            "Get custom audiences for an ad account",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "limit": limit(100)
            }),
            &["user_id", "account_id"],
        ),
        tool(
            "create_custom_audience",
            "Create a custom audience in an ad account",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "name": { "type": "string", "minLength": 1 },
                "subtype": { "type": "string", "minLength": 1, "description": "e.g. CUSTOM, WEBSITE, ENGAGEMENT" },
                "description": { "type": "string" },
                "customer_file_source": { "type": "string" }
            }),
            &["user_id", "account_id", "name", "subtype"],
        ),
        tool(
            "create_lookalike_audience",
            "Create a lookalike audience from an existing audience",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "name": { "type": "string", "minLength": 1 },
                "origin_audience_id": { "type": "string", "minLength": 1, "description": "Source audience ID" },
                "country": { "type": "string", "minLength": 2, "maxLength": 2, "description": "ISO country code" },
                "ratio": { "type": "number", "minimum": 0.01, "maximum": 0.2, "description": "Share of the country population" },
                "type": { "type": "string", "default": "similarity" }
            }),
            &["user_id", "account_id", "name", "origin_audience_id", "country", "ratio"],
        ),
        tool(
            "get_ad_creatives",
            "Get ad creatives for an account",
            json!({
                "user_id": user_id(),
                "account_id": account_id(),
                "limit": limit(50)
            }),
            &["user_id", "account_id"],
        ),
        tool(
            "create_campaign_from_prompt",
            "Create a complete campaign from natural language description",
            json!({
                "user_id": user_id(),
                "prompt": { "type": "string", "minLength": 1, "description": "Natural language: what you want to achieve" },
                "account_id": { "type": "string", "minLength": 1, "description": "Ad account ID to create campaign in" },
                "budget": { "type": "number", "minimum": 0, "description": "Budget in account currency" }
            }),
            &["user_id", "prompt", "account_id"],
        ),
        tool(
            "analyze_campaign_performance",
            "Get AI-powered analysis of campaign performance",
            json!({
                "user_id": user_id(),
                "campaign_id": { "type": "string", "minLength": 1, "description": "Campaign ID" },
                "time_range": time_range()
            }),
            &["user_id", "campaign_id"],
        ),
    ]
}
