//! Meta Marketing (Graph) API client.
//!
//! Every call is a single attempt: non-2xx responses become
//! [`MetaApiError::Api`] carrying the remote error payload, with no retry.
//! The access token travels as the `access_token` query parameter for both
//! GET and POST.

mod client;
mod params;
mod time_range;

pub use client::{encode_form_fields, MetaClient};
pub use params::{
    AdStatus, CampaignObjective, CampaignQuery, CampaignUpdate, CreativeRef, InsightsQuery,
    LookalikeSpec, NewAd, NewAdCreative, NewAdSet, NewCampaign, NewCustomAudience,
    NewLookalikeAudience, OpenSpec,
};
pub use time_range::{resolve_time_range, resolve_time_range_on, DateSpan, SHORTCUTS};

use serde_json::Value;
use thiserror::Error;

/// Graph API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v23.0";

/// Graph API host.
pub const GRAPH_URL: &str = "https://graph.facebook.com";

/// Failure talking to the Graph API.
#[derive(Debug, Error)]
pub enum MetaApiError {
    /// Non-2xx response; `payload` is the parsed error body (or the raw text)
    #[error("Meta API Error: {payload}")]
    Api { status: u16, payload: Value },

    #[error("Meta API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Meta API returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MetaApiError {
    /// HTTP status of an API error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            MetaApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
