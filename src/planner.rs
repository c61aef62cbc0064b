use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Natural-language campaign assistance.
///
/// Backs the `create_campaign_from_prompt` and `analyze_campaign_performance`
/// tools. Implementations are free to call a language model; the tools only
/// forward whatever JSON they return.
///
/// # Example
/// ```no_run
/// use meta_ads_mcp::planner::{CampaignPlanner, StubPlanner};
///
/// # async fn run() -> anyhow::Result<()> {
/// let planner = StubPlanner;
/// let plan = planner.plan_campaign("Yoga studio leads in Budapest", Some(30000.0)).await?;
/// println!("{}", plan["name"]);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait CampaignPlanner: Send + Sync {
    /// Turn a free-form goal into a campaign outline.
    ///
    /// The outline should carry at least `name`, `objective`, `budget` and a
    /// `targeting` object shaped like the Graph API targeting spec.
    async fn plan_campaign(&self, prompt: &str, budget: Option<f64>) -> Result<Value>;

    /// Produce `count` ad copy variations for `goal` in `language`.
    async fn generate_ad_copy(&self, goal: &str, language: &str, count: usize) -> Result<Vec<Value>>;

    /// Summarize an insights payload and recommend next actions.
    async fn analyze_performance(&self, insights: &Value) -> Result<Value>;
}

/// Budget assumed when the caller gives none, in account currency.
const DEFAULT_PLAN_BUDGET: f64 = 30000.0;

/// Placeholder planner with fixed output.
///
/// Not connected to any model. Every payload it returns carries
/// `"stub": true` so callers can tell it apart from real advice.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubPlanner;

#[async_trait]
impl CampaignPlanner for StubPlanner {
    async fn plan_campaign(&self, prompt: &str, budget: Option<f64>) -> Result<Value> {
        let title: String = prompt.chars().take(50).collect();

        Ok(json!({
            "stub": true,
            "name": format!("Campaign: {}", title),
            "objective": "OUTCOME_LEADS",
            "budget": budget.unwrap_or(DEFAULT_PLAN_BUDGET),
            "targeting": {
                "geo_locations": { "countries": ["HU"] },
                "age_min": 25,
                "age_max": 55
            },
            "timeline": "7 days"
        }))
    }

    async fn generate_ad_copy(&self, goal: &str, _language: &str, count: usize) -> Result<Vec<Value>> {
        Ok((0..count)
            .map(|i| {
                json!({
                    "stub": true,
                    "headline": format!("Headline {} for: {}", i + 1, goal),
                    "description": format!("Compelling description {}", i + 1),
                    "call_to_action": if i % 2 == 0 { "BOOK_NOW" } else { "LEARN_MORE" }
                })
            })
            .collect())
    }

    async fn analyze_performance(&self, _insights: &Value) -> Result<Value> {
        Ok(json!({
            "stub": true,
            "summary": "Campaign performing well",
            "insights": [
                "Cost per lead is below target",
                "Evening ads perform 2x better"
            ],
            "recommendations": [
                { "action": "Increase budget", "reason": "Strong ROI", "confidence": "high" }
            ]
        }))
    }
}
