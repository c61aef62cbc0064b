//! Typed tool arguments, decoded after schema validation.

use crate::meta::{AdStatus, CampaignUpdate, LookalikeSpec, NewAdCreative, NewAdSet, NewCampaign, NewCustomAudience};
use serde::Deserialize;

fn test_user() -> String {
    "test-user".to_string()
}

fn last_7d() -> String {
    "last_7d".to_string()
}

fn similarity() -> String {
    "similarity".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TestConnectionArgs {
    #[serde(default = "test_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserArgs {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GetAdAccountsArgs {
    pub user_id: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GetCampaignsArgs {
    pub user_id: String,
    pub account_id: String,
    pub limit: Option<u32>,
    pub status_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignArgs {
    pub user_id: String,
    pub account_id: String,
    #[serde(flatten)]
    pub campaign: NewCampaign,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignArgs {
    pub user_id: String,
    pub campaign_id: String,
    #[serde(flatten)]
    pub update: CampaignUpdate,
}

#[derive(Debug, Deserialize)]
pub struct CampaignInsightsArgs {
    pub user_id: String,
    pub campaign_id: String,
    #[serde(default = "last_7d")]
    pub time_range: String,
    pub breakdown: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdSetArgs {
    pub user_id: String,
    pub account_id: String,
    #[serde(flatten)]
    pub adset: NewAdSet,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdCreativeArgs {
    pub user_id: String,
    pub account_id: String,
    #[serde(flatten)]
    pub creative: NewAdCreative,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdArgs {
    pub user_id: String,
    pub account_id: String,
    pub name: String,
    pub adset_id: String,
    pub creative_id: String,
    #[serde(default)]
    pub status: AdStatus,
}

#[derive(Debug, Deserialize)]
pub struct SearchInterestsArgs {
    pub user_id: String,
    pub query: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UploadImageArgs {
    pub user_id: String,
    pub account_id: String,
    pub image_url: String,
    pub name: Option<String>,
}

/// Listing tools scoped to one ad account.
#[derive(Debug, Deserialize)]
pub struct AccountListArgs {
    pub user_id: String,
    pub account_id: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomAudienceArgs {
    pub user_id: String,
    pub account_id: String,
    #[serde(flatten)]
    pub audience: NewCustomAudience,
}

#[derive(Debug, Deserialize)]
pub struct CreateLookalikeArgs {
    pub user_id: String,
    pub account_id: String,
    pub name: String,
    pub origin_audience_id: String,
    pub country: String,
    pub ratio: f64,
    #[serde(rename = "type", default = "similarity")]
    pub kind: String,
}

impl CreateLookalikeArgs {
    pub fn lookalike_spec(&self) -> LookalikeSpec {
        LookalikeSpec {
            kind: self.kind.clone(),
            ratio: self.ratio,
            country: self.country.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CampaignFromPromptArgs {
    pub user_id: String,
    pub prompt: String,
    pub account_id: String,
    pub budget: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzePerformanceArgs {
    pub user_id: String,
    pub campaign_id: String,
    #[serde(default = "last_7d")]
    pub time_range: String,
}
