// Integration tests for tool dispatch: validation, credential resolution, Graph API calls

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use meta_ads_mcp::api::{create_tools_router, ToolsAppState};
use meta_ads_mcp::credentials::{CredentialUpdate, LinkedAccount, TokenStore};
use meta_ads_mcp::meta::resolve_time_range;
use meta_ads_mcp::planner::CampaignPlanner;
use meta_ads_mcp::resolver::{AuthorizationError, ClientSettings, CredentialResolver};
use meta_ads_mcp::tools::{ServerStatus, ToolError, ToolRegistry};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn path(p: &str) -> Matcher {
    Matcher::Regex(format!(r"^{}(\?|$)", p.replace('.', r"\.")))
}

fn token_store() -> Arc<TokenStore> {
    Arc::new(TokenStore::new(":memory:", &BASE64.encode([9u8; 32])).unwrap())
}

fn save(store: &TokenStore, user_id: &str, token: &str, expires_in: i64) {
    store
        .upsert(&CredentialUpdate {
            user_id: user_id.to_string(),
            access_token: token.to_string(),
            expires_at: Utc::now().timestamp() + expires_in,
            linked_resources: vec![LinkedAccount {
                id: "act_1".to_string(),
                name: Some("Main".to_string()),
                account_id: Some("1".to_string()),
                currency: Some("EUR".to_string()),
                ..Default::default()
            }],
        })
        .unwrap();
}

fn registry(server: &Server, store: Arc<TokenStore>, override_token: Option<&str>) -> ToolRegistry {
    let resolver = CredentialResolver::new(
        store,
        ClientSettings {
            api_version: None,
            graph_url: Some(server.url()),
        },
    )
    .with_override_token(override_token.map(str::to_string));

    ToolRegistry::new(resolver).unwrap()
}

fn output_json(output: &meta_ads_mcp::tools::ToolOutput) -> Value {
    assert!(!output.is_error);
    serde_json::from_str(output.body()).unwrap()
}

/// No stored credential and no override: AuthorizationError, nothing sent.
#[tokio::test]
async fn test_unauthenticated_call_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let tools = registry(&server, token_store(), None);
    let err = tools
        .call("get_ad_accounts", json!({"user_id": "u1"}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ToolError::Authorization(AuthorizationError::NotAuthenticated)
    ));
    assert_eq!(
        err.to_string(),
        "User not authenticated. Please connect your Meta Ads account first."
    );
    mock.assert_async().await;
}

/// A token inside the one-day buffer is treated as expired before any request.
#[tokio::test]
async fn test_expiring_token_rejected() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let store = token_store();
    save(&store, "u1", "stored-token", 3_600);

    let err = registry(&server, store, None)
        .call("get_ad_accounts", json!({"user_id": "u1"}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ToolError::Authorization(AuthorizationError::TokenExpired)
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stored_credential_used() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/v23.0/me/adaccounts"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("access_token".into(), "stored-token".into()),
            Matcher::UrlEncoded("limit".into(), "200".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"data":[{"id":"act_1","name":"Main"}]}"#)
        .create_async()
        .await;

    let store = token_store();
    save(&store, "u1", "stored-token", 30 * 86_400);

    let output = registry(&server, store, None)
        .call("get_ad_accounts", json!({"user_id": "u1"}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(output.content[0].kind, "text");
    assert!(output.body().contains('\n'));
    assert_eq!(output_json(&output)["data"][0]["id"], "act_1");
}

/// The override token applies to any user, stored or not.
#[tokio::test]
async fn test_override_token_wins() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/v23.0/act_1/campaigns"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("access_token".into(), "operator-token".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"data":[]}"#)
        .create_async()
        .await;

    let store = token_store();
    save(&store, "u1", "stored-token", 30 * 86_400);

    registry(&server, store, Some("operator-token"))
        .call("get_campaigns", json!({"user_id": "someone-else", "account_id": "act_1"}))
        .await
        .unwrap();

    mock.assert_async().await;
}

/// Schema violations never reach the network, even with a usable token.
#[tokio::test]
async fn test_validation_precedes_network() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let tools = registry(&server, token_store(), Some("operator-token"));

    let cases = [
        json!({"user_id": "u1", "account_id": "act_1", "name": "x", "objective": "REACH"}),
        json!({"user_id": "u1", "account_id": "act_1", "name": "x", "objective": "OUTCOME_LEADS", "status": "DELETED"}),
        json!({"user_id": "u1", "account_id": "act_1", "name": "x", "objective": "OUTCOME_LEADS", "daily_budget": "lots"}),
        json!({"user_id": "u1", "account_id": "act_1", "objective": "OUTCOME_LEADS"}),
    ];

    for args in cases {
        let err = tools.call("create_campaign", args.clone()).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "{args}");
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_campaign_applies_defaults() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path("/v23.0/act_1/campaigns"))
        .match_query(Matcher::UrlEncoded("access_token".into(), "operator-token".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".into(), "Spring Leads".into()),
            Matcher::UrlEncoded("objective".into(), "OUTCOME_LEADS".into()),
            Matcher::UrlEncoded("status".into(), "PAUSED".into()),
            Matcher::UrlEncoded("special_ad_categories".into(), "[]".into()),
            Matcher::UrlEncoded("daily_budget".into(), "3000".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"id":"120210000000"}"#)
        .create_async()
        .await;

    let output = registry(&server, token_store(), Some("operator-token"))
        .call(
            "create_campaign",
            json!({
                "user_id": "u1",
                "account_id": "act_1",
                "name": "Spring Leads",
                "objective": "OUTCOME_LEADS",
                "daily_budget": 3000
            }),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(output_json(&output)["id"], "120210000000");
}

/// Only the fields the caller supplied reach the campaign node.
#[tokio::test]
async fn test_update_campaign_sends_present_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path("/v23.0/120210000000"))
        .match_body(Matcher::Exact("name=Autumn&status=ACTIVE".to_string()))
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;

    let output = registry(&server, token_store(), Some("operator-token"))
        .call(
            "update_campaign",
            json!({
                "user_id": "u1",
                "campaign_id": "120210000000",
                "status": "ACTIVE",
                "name": "Autumn"
            }),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(output_json(&output)["success"], true);
}

#[tokio::test]
async fn test_insights_default_range_resolved() {
    let mut server = Server::new_async().await;
    let span = resolve_time_range("last_7d").unwrap();
    let mock = server
        .mock("GET", path("/v23.0/c1/insights"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("level".into(), "campaign".into()),
            Matcher::UrlEncoded("time_range".into(), serde_json::to_string(&span).unwrap()),
        ]))
        .with_status(200)
        .with_body(r#"{"data":[{"impressions":"1000","clicks":"25"}]}"#)
        .create_async()
        .await;

    registry(&server, token_store(), Some("operator-token"))
        .call("get_campaign_insights", json!({"user_id": "u1", "campaign_id": "c1"}))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_ad_sends_creative_reference() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path("/v23.0/act_1/ads"))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("creative".into(), r#"{"creative_id":"cr_1"}"#.into()),
            Matcher::UrlEncoded("status".into(), "ACTIVE".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"id":"ad_1"}"#)
        .create_async()
        .await;

    registry(&server, token_store(), Some("operator-token"))
        .call(
            "create_ad",
            json!({
                "user_id": "u1",
                "account_id": "act_1",
                "name": "Ad",
                "adset_id": "as_1",
                "creative_id": "cr_1",
                "status": "ACTIVE"
            }),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_lookalike_defaults_to_similarity() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", path("/v23.0/act_1/customaudiences"))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("subtype".into(), "LOOKALIKE".into()),
            Matcher::UrlEncoded("origin_audience_id".into(), "aud_1".into()),
            Matcher::Regex("similarity".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"id":"aud_2"}"#)
        .create_async()
        .await;

    registry(&server, token_store(), Some("operator-token"))
        .call(
            "create_lookalike_audience",
            json!({
                "user_id": "u1",
                "account_id": "act_1",
                "name": "LAL 1%",
                "origin_audience_id": "aud_1",
                "country": "HU",
                "ratio": 0.01
            }),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

/// Remote errors propagate with the payload embedded.
#[tokio::test]
async fn test_remote_error_propagates() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v23.0/search"))
        .with_status(400)
        .with_body(r#"{"error":{"message":"(#100) Invalid parameter","code":100}}"#)
        .create_async()
        .await;

    let err = registry(&server, token_store(), Some("operator-token"))
        .call("search_interests", json!({"user_id": "u1", "query": "yoga"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Remote(_)));
    assert!(err.to_string().contains("(#100) Invalid parameter"));
}

#[tokio::test]
async fn test_check_auth_status_production() {
    let server = Server::new_async().await;
    let store = token_store();
    save(&store, "u1", "stored-token", 30 * 86_400);
    let tools = registry(&server, store, None);

    let connected = output_json(
        &tools
            .call("check_auth_status", json!({"user_id": "u1"}))
            .await
            .unwrap(),
    );
    assert_eq!(connected["authenticated"], true);
    assert_eq!(connected["mode"], "production");
    assert_eq!(connected["token_expired"], false);
    assert_eq!(connected["ad_accounts_count"], 1);
    assert_eq!(connected["ad_accounts"][0]["currency"], "EUR");
    assert!(connected["expires_at"].as_str().unwrap().ends_with('Z'));

    let missing = output_json(
        &tools
            .call("check_auth_status", json!({"user_id": "u2"}))
            .await
            .unwrap(),
    );
    assert_eq!(missing["authenticated"], false);
    assert_eq!(missing["oauth_url"], "/auth/meta");
}

#[tokio::test]
async fn test_check_auth_status_development_probe() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", path("/v23.0/me/adaccounts"))
        .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
        .with_status(401)
        .with_body(r#"{"error":{"message":"Error validating access token","code":190}}"#)
        .create_async()
        .await;

    let status = output_json(
        &registry(&server, token_store(), Some("stale-token"))
            .call("check_auth_status", json!({"user_id": "u1"}))
            .await
            .unwrap(),
    );

    assert_eq!(status["authenticated"], false);
    assert_eq!(status["mode"], "development");
    assert_eq!(status["using_direct_token"], true);
    assert!(status["error"].as_str().unwrap().contains("Error validating access token"));
}

#[tokio::test]
async fn test_test_connection_reports_user() {
    let server = Server::new_async().await;
    let store = token_store();
    save(&store, "u1", "stored-token", 30 * 86_400);

    let tools = registry(&server, store, None).with_status(ServerStatus {
        has_meta_app_id: true,
        has_meta_app_secret: false,
    });

    let status = output_json(&tools.call("test_connection", json!({"user_id": "u1"})).await.unwrap());
    assert_eq!(status["status"], "connected");
    assert_eq!(status["has_meta_app_id"], true);
    assert_eq!(status["has_meta_app_secret"], false);
    assert_eq!(status["user_authenticated"], true);
    assert_eq!(status["token_expired"], false);
    assert_eq!(status["ad_accounts_count"], 1);

    let anonymous = output_json(&tools.call("test_connection", json!({})).await.unwrap());
    assert_eq!(anonymous["user_authenticated"], false);
    assert!(anonymous["token_expired"].is_null());
}

#[tokio::test]
async fn test_campaign_from_prompt_with_stub_planner() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/v23.0/me/adaccounts"))
        .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
        .with_status(200)
        .with_body(r#"{"data":[{"id":"act_1"}]}"#)
        .create_async()
        .await;

    let result = output_json(
        &registry(&server, token_store(), Some("operator-token"))
            .call(
                "create_campaign_from_prompt",
                json!({
                    "user_id": "u1",
                    "prompt": "Get leads for my yoga studio",
                    "account_id": "act_1",
                    "budget": 20000
                }),
            )
            .await
            .unwrap(),
    );

    mock.assert_async().await;
    assert_eq!(result["campaign_plan"]["stub"], true);
    assert_eq!(result["campaign_plan"]["budget"], 20000.0);
    assert_eq!(result["available_accounts"][0]["id"], "act_1");
    assert_eq!(result["ad_variations"].as_array().unwrap().len(), 5);
    assert_eq!(result["next_steps"].as_array().unwrap().len(), 5);
}

struct FailingPlanner;

#[async_trait]
impl CampaignPlanner for FailingPlanner {
    async fn plan_campaign(&self, _prompt: &str, _budget: Option<f64>) -> anyhow::Result<Value> {
        Err(anyhow!("model unavailable"))
    }

    async fn generate_ad_copy(&self, _goal: &str, _language: &str, _count: usize) -> anyhow::Result<Vec<Value>> {
        Ok(vec![])
    }

    async fn analyze_performance(&self, insights: &Value) -> anyhow::Result<Value> {
        Ok(json!({ "echo": insights }))
    }
}

#[tokio::test]
async fn test_custom_planner_plugged_in() {
    let mut server = Server::new_async().await;
    let _insights = server
        .mock("GET", path("/v23.0/c1/insights"))
        .with_status(200)
        .with_body(r#"{"data":[{"spend":"12.50"}]}"#)
        .create_async()
        .await;

    let tools = registry(&server, token_store(), Some("operator-token"))
        .with_planner(Arc::new(FailingPlanner));

    let analysis = output_json(
        &tools
            .call("analyze_campaign_performance", json!({"user_id": "u1", "campaign_id": "c1"}))
            .await
            .unwrap(),
    );
    assert_eq!(analysis["raw_insights"]["data"][0]["spend"], "12.50");
    assert_eq!(analysis["ai_analysis"]["echo"]["data"][0]["spend"], "12.50");

    let err = tools
        .call(
            "create_campaign_from_prompt",
            json!({"user_id": "u1", "prompt": "x", "account_id": "act_1"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Planner(_)));
    assert!(err.to_string().contains("model unavailable"));
}

/// The HTTP bridge reports tool failures in-band and unknown tools as 404.
#[tokio::test]
async fn test_http_bridge() {
    let server = Server::new_async().await;
    let router = create_tools_router(ToolsAppState {
        registry: Arc::new(registry(&server, token_store(), None)),
    });

    let call = |name: &str, body: Value| {
        Request::builder()
            .method("POST")
            .uri(format!("/tools/{}", name))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = router
        .clone()
        .oneshot(call("get_ad_accounts", json!({"user_id": "u1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(
        &axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap(),
    )
    .unwrap();
    assert_eq!(body["isError"], true);
    assert!(body["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("not authenticated"));

    let response = router
        .clone()
        .oneshot(call("drop_tables", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(
        &axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap(),
    )
    .unwrap();
    assert_eq!(body["tools"].as_array().unwrap().len(), 18);
    assert!(body["tools"][0]["inputSchema"].is_object());
}
