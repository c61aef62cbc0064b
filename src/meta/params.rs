//! Parameter shapes for Graph API write and query operations.
//!
//! Serializing one of the `New*` structs yields exactly the fields POSTed to
//! the API: defaults applied, absent optionals omitted. Spec-like payloads
//! (targeting, object story) stay open maps; their shape belongs to Meta.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open, loosely-typed payload validated only by the remote API.
pub type OpenSpec = Map<String, Value>;

/// Campaign objectives accepted by `create_campaign`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignObjective {
    OutcomeAwareness,
    OutcomeEngagement,
    OutcomeLeads,
    OutcomeSales,
    OutcomeTraffic,
    OutcomeAppPromotion,
}

impl CampaignObjective {
    pub const ALL: [&'static str; 6] = [
        "OUTCOME_AWARENESS",
        "OUTCOME_ENGAGEMENT",
        "OUTCOME_LEADS",
        "OUTCOME_SALES",
        "OUTCOME_TRAFFIC",
        "OUTCOME_APP_PROMOTION",
    ];
}

/// Delivery status for campaigns, ad sets and ads. New objects start paused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdStatus {
    Active,
    #[default]
    Paused,
}

impl AdStatus {
    pub const ALL: [&'static str; 2] = ["ACTIVE", "PAUSED"];
}

fn default_billing_event() -> String {
    "IMPRESSIONS".to_string()
}

fn default_optimization_goal() -> String {
    "LINK_CLICKS".to_string()
}

/// Listing options for `get_campaigns`.
#[derive(Clone, Debug, Default)]
pub struct CampaignQuery {
    pub limit: Option<u32>,
    pub status_filter: Option<String>,
    pub fields: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub objective: CampaignObjective,
    #[serde(default)]
    pub status: AdStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_budget: Option<u64>,
    #[serde(default)]
    pub special_ad_categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<String>,
}

/// Partial campaign update; only present fields are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AdStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<u64>,
}

impl CampaignUpdate {
    /// The present fields, ready for [`super::MetaClient::update_campaign`].
    pub fn to_fields(&self) -> serde_json::Result<OpenSpec> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(OpenSpec::new()),
        }
    }
}

/// Options for the insights edge.
#[derive(Clone, Debug, Default)]
pub struct InsightsQuery {
    /// Passed through verbatim; takes precedence over `time_range`
    pub date_preset: Option<String>,
    /// Shortcut resolved by [`super::resolve_time_range`]
    pub time_range: Option<String>,
    pub level: Option<String>,
    pub fields: Option<String>,
    pub breakdown: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAdSet {
    pub campaign_id: String,
    pub name: String,
    #[serde(default)]
    pub status: AdStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_budget: Option<String>,
    #[serde(default = "default_billing_event")]
    pub billing_event: String,
    #[serde(default = "default_optimization_goal")]
    pub optimization_goal: String,
    pub targeting: OpenSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAdCreative {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_story_spec: Option<OpenSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrees_of_freedom_spec: Option<OpenSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreativeRef {
    pub creative_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAd {
    pub name: String,
    pub adset_id: String,
    pub creative: CreativeRef,
    #[serde(default)]
    pub status: AdStatus,
}

impl NewAd {
    /// Ad pointing at an existing creative, paused.
    pub fn new(name: impl Into<String>, adset_id: impl Into<String>, creative_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adset_id: adset_id.into(),
            creative: CreativeRef {
                creative_id: creative_id.into(),
            },
            status: Default::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCustomAudience {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub subtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_file_source: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookalikeSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub ratio: f64,
    pub country: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewLookalikeAudience {
    pub name: String,
    pub origin_audience_id: String,
    pub lookalike_spec: LookalikeSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_campaign_defaults_applied() {
        let campaign: NewCampaign = serde_json::from_value(json!({
            "name": "Spring",
            "objective": "OUTCOME_LEADS"
        }))
        .unwrap();

        assert_eq!(campaign.status, AdStatus::Paused);
        assert_eq!(
            serde_json::to_value(&campaign).unwrap(),
            json!({
                "name": "Spring",
                "objective": "OUTCOME_LEADS",
                "status": "PAUSED",
                "special_ad_categories": []
            })
        );
    }

    #[test]
    fn test_objective_rejects_unknown() {
        let result: Result<NewCampaign, _> = serde_json::from_value(json!({
            "name": "x",
            "objective": "OUTCOME_WHATEVER"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_adset_defaults() {
        let adset: NewAdSet = serde_json::from_value(json!({
            "campaign_id": "c1",
            "name": "Budapest 25-55",
            "targeting": {"geo_locations": {"countries": ["HU"]}}
        }))
        .unwrap();

        assert_eq!(adset.billing_event, "IMPRESSIONS");
        assert_eq!(adset.optimization_goal, "LINK_CLICKS");
        assert_eq!(adset.status, AdStatus::Paused);
        assert_eq!(adset.targeting["geo_locations"]["countries"][0], "HU");
    }

    #[test]
    fn test_lookalike_spec_type_field() {
        let spec = LookalikeSpec {
            kind: "similarity".to_string(),
            ratio: 0.01,
            country: "US".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({"type": "similarity", "ratio": 0.01, "country": "US"})
        );
    }

    #[test]
    fn test_campaign_update_sends_only_present_fields() {
        let update = CampaignUpdate {
            status: Some(AdStatus::Active),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"status": "ACTIVE"}));

        let fields = update.to_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["status"], "ACTIVE");
    }
}
