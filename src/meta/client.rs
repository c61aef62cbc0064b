use super::params::{
    CampaignQuery, InsightsQuery, NewAd, NewAdCreative, NewAdSet, NewCampaign,
    NewCustomAudience, NewLookalikeAudience, OpenSpec,
};
use super::{resolve_time_range, MetaApiError, DEFAULT_API_VERSION, GRAPH_URL};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

const AD_ACCOUNT_FIELDS: &str = "id,name,account_id,currency,timezone_name,account_status,business";
const CAMPAIGN_FIELDS: &str = "id,name,objective,status,daily_budget,lifetime_budget,budget_remaining,created_time,updated_time";
const INSIGHT_FIELDS: &str = "impressions,clicks,spend,reach,frequency,ctr,cpc,cpm,actions,action_values,cost_per_action_type";
const AUDIENCE_FIELDS: &str = "id,name,description,approximate_count,delivery_status,operation_status,subtype";
const CREATIVE_FIELDS: &str = "id,name,object_story_spec,thumbnail_url,effective_object_story_id";

/// HTTP client for the Meta Marketing API, bound to one access token.
#[derive(Clone)]
pub struct MetaClient {
    access_token: String,
    api_version: String,
    graph_url: String,
    http_client: Client,
}

impl std::fmt::Debug for MetaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaClient")
            .field("api_version", &self.api_version)
            .field("graph_url", &self.graph_url)
            .finish_non_exhaustive()
    }
}

impl MetaClient {
    /// Create a client against the public Graph API host.
    ///
    /// `api_version` falls back to [`DEFAULT_API_VERSION`].
    pub fn new(access_token: impl Into<String>, api_version: Option<&str>) -> Self {
        Self {
            access_token: access_token.into(),
            api_version: api_version.unwrap_or(DEFAULT_API_VERSION).to_string(),
            graph_url: GRAPH_URL.to_string(),
            http_client: Client::new(),
        }
    }

    /// Point the client at another host (a mock server in tests).
    pub fn with_graph_url(mut self, graph_url: impl Into<String>) -> Self {
        self.graph_url = graph_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reuse an existing connection pool.
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}{}", self.graph_url, self.api_version, endpoint)
    }

    /// GET `endpoint` with `params` (and the access token) as query parameters.
    pub async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, MetaApiError> {
        debug!(endpoint = %endpoint, "Graph API GET");

        let response = self
            .http_client
            .get(self.url(endpoint))
            .query(&[("access_token", self.access_token.as_str())])
            .query(params)
            .send()
            .await?;

        read_response(response).await
    }

    /// POST `data` to `endpoint` as a form-urlencoded body.
    ///
    /// Object and array values are JSON-encoded per field; nulls are dropped.
    pub async fn post(&self, endpoint: &str, data: &Map<String, Value>) -> Result<Value, MetaApiError> {
        debug!(endpoint = %endpoint, fields = data.len(), "Graph API POST");

        let response = self
            .http_client
            .post(self.url(endpoint))
            .query(&[("access_token", self.access_token.as_str())])
            .form(&encode_form_fields(data))
            .send()
            .await?;

        read_response(response).await
    }

    async fn post_serialized<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Value, MetaApiError> {
        let data = match serde_json::to_value(body)? {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.post(endpoint, &data).await
    }

    /// Ad accounts reachable by `user` (usually `"me"`).
    pub async fn get_ad_accounts(&self, user: &str, limit: u32) -> Result<Value, MetaApiError> {
        self.get(
            &format!("/{}/adaccounts", user),
            &[("fields", AD_ACCOUNT_FIELDS.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn get_campaigns(&self, account_id: &str, query: &CampaignQuery) -> Result<Value, MetaApiError> {
        let mut params = vec![
            (
                "fields",
                query.fields.clone().unwrap_or_else(|| CAMPAIGN_FIELDS.to_string()),
            ),
            ("limit", query.limit.unwrap_or(10).to_string()),
        ];
        if let Some(status) = &query.status_filter {
            params.push(("status", status.clone()));
        }

        self.get(&format!("/{}/campaigns", account_id), &params).await
    }

    pub async fn create_campaign(&self, account_id: &str, campaign: &NewCampaign) -> Result<Value, MetaApiError> {
        self.post_serialized(&format!("/{}/campaigns", account_id), campaign)
            .await
    }

    /// Any campaign fields the API accepts; an empty map is still posted.
    pub async fn update_campaign(&self, campaign_id: &str, fields: &OpenSpec) -> Result<Value, MetaApiError> {
        self.post(&format!("/{}", campaign_id), fields).await
    }

    /// Insights for a campaign, ad set or ad.
    pub async fn get_insights(&self, object_id: &str, query: &InsightsQuery) -> Result<Value, MetaApiError> {
        let params = insights_params(query)?;
        self.get(&format!("/{}/insights", object_id), &params).await
    }

    pub async fn create_ad_set(&self, account_id: &str, adset: &NewAdSet) -> Result<Value, MetaApiError> {
        self.post_serialized(&format!("/{}/adsets", account_id), adset).await
    }

    pub async fn create_ad_creative(&self, account_id: &str, creative: &NewAdCreative) -> Result<Value, MetaApiError> {
        self.post_serialized(&format!("/{}/adcreatives", account_id), creative)
            .await
    }

    pub async fn create_ad(&self, account_id: &str, ad: &NewAd) -> Result<Value, MetaApiError> {
        self.post_serialized(&format!("/{}/ads", account_id), ad).await
    }

    /// Targeting interests matching `query`.
    pub async fn search_interests(&self, query: &str, limit: u32) -> Result<Value, MetaApiError> {
        self.get(
            "/search",
            &[
                ("type", "adinterest".to_string()),
                ("q", query.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn get_custom_audiences(&self, account_id: &str, limit: u32) -> Result<Value, MetaApiError> {
        self.get(
            &format!("/{}/customaudiences", account_id),
            &[("fields", AUDIENCE_FIELDS.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn create_custom_audience(
        &self,
        account_id: &str,
        audience: &NewCustomAudience,
    ) -> Result<Value, MetaApiError> {
        self.post_serialized(&format!("/{}/customaudiences", account_id), audience)
            .await
    }

    pub async fn create_lookalike_audience(
        &self,
        account_id: &str,
        audience: &NewLookalikeAudience,
    ) -> Result<Value, MetaApiError> {
        let mut data = Map::new();
        data.insert("name".to_string(), json!(audience.name));
        data.insert("subtype".to_string(), json!("LOOKALIKE"));
        data.insert("lookalike_spec".to_string(), serde_json::to_value(&audience.lookalike_spec)?);
        data.insert("origin_audience_id".to_string(), json!(audience.origin_audience_id));

        self.post(&format!("/{}/customaudiences", account_id), &data).await
    }

    /// Have Meta fetch an image from `image_url` into the account's library.
    pub async fn upload_image(
        &self,
        account_id: &str,
        image_url: &str,
        name: Option<&str>,
    ) -> Result<Value, MetaApiError> {
        let mut data = Map::new();
        data.insert("url".to_string(), json!(image_url));
        if let Some(name) = name {
            data.insert("name".to_string(), json!(name));
        }

        self.post(&format!("/{}/adimages", account_id), &data).await
    }

    pub async fn get_ad_creatives(&self, account_id: &str, limit: u32) -> Result<Value, MetaApiError> {
        self.get(
            &format!("/{}/adcreatives", account_id),
            &[("fields", CREATIVE_FIELDS.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

/// Query parameters for the insights edge.
///
/// `date_preset` is forwarded as-is; otherwise `time_range` is resolved to
/// concrete dates, and an unresolvable shortcut sends no range at all.
fn insights_params(query: &InsightsQuery) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    let mut params = vec![
        (
            "fields",
            query.fields.clone().unwrap_or_else(|| INSIGHT_FIELDS.to_string()),
        ),
        (
            "level",
            query.level.clone().unwrap_or_else(|| "campaign".to_string()),
        ),
    ];

    if let Some(preset) = &query.date_preset {
        params.push(("date_preset", preset.clone()));
    } else if let Some(span) = query.time_range.as_deref().and_then(resolve_time_range) {
        params.push(("time_range", serde_json::to_string(&span)?));
    }

    if let Some(breakdown) = &query.breakdown {
        params.push(("breakdowns", breakdown.clone()));
    }

    Ok(params)
}

/// Flatten a payload into form fields the way the Graph API expects them.
pub fn encode_form_fields(data: &Map<String, Value>) -> Vec<(String, String)> {
    data.iter()
        .filter_map(|(key, value)| {
            let encoded = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Object(_) | Value::Array(_) => value.to_string(),
                other => other.to_string(),
            };
            Some((key.clone(), encoded))
        })
        .collect()
}

async fn read_response(response: reqwest::Response) -> Result<Value, MetaApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let payload = serde_json::from_str(&body).unwrap_or(Value::String(body));
        return Err(MetaApiError::Api {
            status: status.as_u16(),
            payload,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
