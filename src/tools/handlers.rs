use super::args::*;
use super::{decode, ToolError, ToolRegistry};
use crate::credentials::LinkedAccount;
use crate::meta::{CampaignQuery, InsightsQuery, NewAd, NewLookalikeAudience};
use crate::resolver::is_token_expired;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::debug;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const NEXT_STEPS: [&str; 5] = [
    "Review the campaign details",
    "Adjust budget or targeting if needed",
    "Use 'create_campaign' tool to create it",
    "Use 'create_adset' to add ad sets",
    "Use 'create_ad' to launch ads",
];

impl ToolRegistry {
    pub(super) async fn dispatch(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        debug!(tool = %name, "Dispatching tool call");

        match name {
            "test_connection" => self.test_connection(decode(args)?),
            "check_auth_status" => self.check_auth_status(decode(args)?).await,
            "get_ad_accounts" => {
                let args: GetAdAccountsArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client.get_ad_accounts("me", args.limit.unwrap_or(200)).await?)
            }
            "get_campaigns" => {
                let args: GetCampaignsArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                let query = CampaignQuery {
                    limit: args.limit,
                    status_filter: args.status_filter,
                    fields: None,
                };
                Ok(client.get_campaigns(&args.account_id, &query).await?)
            }
            "create_campaign" => {
                let args: CreateCampaignArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client.create_campaign(&args.account_id, &args.campaign).await?)
            }
            "update_campaign" => {
                let args: UpdateCampaignArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                let fields = args.update.to_fields()?;
                Ok(client.update_campaign(&args.campaign_id, &fields).await?)
            }
            "get_campaign_insights" => {
                let args: CampaignInsightsArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                let query = InsightsQuery {
                    time_range: Some(args.time_range),
                    breakdown: args.breakdown,
                    level: Some("campaign".to_string()),
                    ..Default::default()
                };
                Ok(client.get_insights(&args.campaign_id, &query).await?)
            }
            "create_adset" => {
                let args: CreateAdSetArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client.create_ad_set(&args.account_id, &args.adset).await?)
            }
            "create_ad_creative" => {
                let args: CreateAdCreativeArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client.create_ad_creative(&args.account_id, &args.creative).await?)
            }
            "create_ad" => {
                let args: CreateAdArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                let mut ad = NewAd::new(args.name, args.adset_id, args.creative_id);
                ad.status = args.status;
                Ok(client.create_ad(&args.account_id, &ad).await?)
            }
            "search_interests" => {
                let args: SearchInterestsArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client.search_interests(&args.query, args.limit.unwrap_or(25)).await?)
            }
            "upload_ad_image" => {
                let args: UploadImageArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client
                    .upload_image(&args.account_id, &args.image_url, args.name.as_deref())
                    .await?)
            }
            "get_custom_audiences" => {
                let args: AccountListArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client
                    .get_custom_audiences(&args.account_id, args.limit.unwrap_or(100))
                    .await?)
            }
            "create_custom_audience" => {
                let args: CreateCustomAudienceArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client.create_custom_audience(&args.account_id, &args.audience).await?)
            }
            "create_lookalike_audience" => {
                let args: CreateLookalikeArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                let audience = NewLookalikeAudience {
                    lookalike_spec: args.lookalike_spec(),
                    name: args.name,
                    origin_audience_id: args.origin_audience_id,
                };
                Ok(client.create_lookalike_audience(&args.account_id, &audience).await?)
            }
            "get_ad_creatives" => {
                let args: AccountListArgs = decode(args)?;
                let client = self.resolver.client_for(&args.user_id)?;
                Ok(client
                    .get_ad_creatives(&args.account_id, args.limit.unwrap_or(50))
                    .await?)
            }
            "create_campaign_from_prompt" => self.campaign_from_prompt(decode(args)?).await,
            "analyze_campaign_performance" => self.analyze_performance(decode(args)?).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    fn test_connection(&self, args: TestConnectionArgs) -> Result<Value, ToolError> {
        let credential = self.resolver.stored(&args.user_id)?;

        Ok(json!({
            "status": "connected",
            "server_version": SERVER_VERSION,
            "server_type": "self-hosted",
            "has_meta_app_id": self.status.has_meta_app_id,
            "has_meta_app_secret": self.status.has_meta_app_secret,
            "user_authenticated": credential.is_some(),
            "token_expired": credential.as_ref().map(|c| is_token_expired(c.expires_at)),
            "ad_accounts_count": credential.as_ref().map_or(0, |c| c.linked_resources.len()),
        }))
    }

    async fn check_auth_status(&self, args: UserArgs) -> Result<Value, ToolError> {
        if let Some(token) = self.resolver.override_token() {
            let client = self.resolver.settings().client(token);

            return Ok(match client.get_ad_accounts("me", 10).await {
                Ok(accounts) => {
                    let accounts = linked_accounts(&accounts);
                    json!({
                        "authenticated": true,
                        "mode": "development",
                        "using_direct_token": true,
                        "ad_accounts_count": accounts.len(),
                        "ad_accounts": summaries(&accounts),
                        "message": "Using META_ACCESS_TOKEN (development mode)",
                    })
                }
                Err(e) => json!({
                    "authenticated": false,
                    "mode": "development",
                    "using_direct_token": true,
                    "error": e.to_string(),
                    "message": "META_ACCESS_TOKEN is set but invalid or expired",
                }),
            });
        }

        let Some(credential) = self.resolver.stored(&args.user_id)? else {
            return Ok(json!({
                "authenticated": false,
                "mode": "production",
                "message": "User needs to connect Meta Ads account",
                "oauth_url": "/auth/meta",
            }));
        };

        let expires_at = DateTime::<Utc>::from_timestamp(credential.expires_at, 0)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true));

        Ok(json!({
            "authenticated": true,
            "mode": "production",
            "token_expired": is_token_expired(credential.expires_at),
            "expires_at": expires_at,
            "ad_accounts_count": credential.linked_resources.len(),
            "ad_accounts": summaries(&credential.linked_resources),
        }))
    }

    async fn campaign_from_prompt(&self, args: CampaignFromPromptArgs) -> Result<Value, ToolError> {
        let client = self.resolver.client_for(&args.user_id)?;

        let plan = self
            .planner
            .plan_campaign(&args.prompt, args.budget)
            .await
            .map_err(ToolError::Planner)?;

        let accounts = client.get_ad_accounts("me", 10).await?;

        let variations = self
            .planner
            .generate_ad_copy(&args.prompt, "en", 5)
            .await
            .map_err(ToolError::Planner)?;

        Ok(json!({
            "account_id": args.account_id,
            "campaign_plan": plan,
            "available_accounts": accounts.get("data").cloned().unwrap_or_else(|| json!([])),
            "ad_variations": variations,
            "next_steps": NEXT_STEPS,
        }))
    }

    async fn analyze_performance(&self, args: AnalyzePerformanceArgs) -> Result<Value, ToolError> {
        let client = self.resolver.client_for(&args.user_id)?;

        let query = InsightsQuery {
            time_range: Some(args.time_range),
            level: Some("campaign".to_string()),
            ..Default::default()
        };
        let insights = client.get_insights(&args.campaign_id, &query).await?;

        let analysis = self
            .planner
            .analyze_performance(&insights)
            .await
            .map_err(ToolError::Planner)?;

        Ok(json!({
            "raw_insights": insights,
            "ai_analysis": analysis,
        }))
    }
}

/// Accounts in a Graph API list response; malformed entries are skipped.
fn linked_accounts(response: &Value) -> Vec<LinkedAccount> {
    response
        .get("data")
        .and_then(Value::as_array)
        .map(|data| {
            data.iter()
                .filter_map(|acc| serde_json::from_value(acc.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn summaries(accounts: &[LinkedAccount]) -> Vec<Value> {
    accounts.iter().map(LinkedAccount::summary).collect()
}
