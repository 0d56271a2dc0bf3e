// Data-provider seams and the HTTP plumbing shared by the concrete clients.
//
// The deep-dive core only sees the three traits below; the FanGraphs,
// Savant and Chadwick implementations live in the submodules.

pub mod cache;
pub mod fangraphs;
pub mod register;
pub mod savant;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::events::PitchEvent;
use crate::stats::row::RawSeasonRow;

// ---------------------------------------------------------------------------
// Shared types
// ---------------------------------------------------------------------------

/// Which season table to request from the stats provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsSpan {
    Regular,
    Postseason,
}

impl StatsSpan {
    /// The provider's `seasontype` query value.
    pub fn season_type(self) -> u8 {
        match self {
            StatsSpan::Regular => 1,
            StatsSpan::Postseason => 2,
        }
    }
}

/// Biographical block returned alongside the season table. Values are kept
/// as the provider sent them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PlayerInfo {
    #[serde(rename = "FirstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "LastName", default)]
    pub last_name: Option<String>,
    #[serde(rename = "Throws", default)]
    pub throws: Option<Value>,
    #[serde(rename = "Bats", default)]
    pub bats: Option<Value>,
    #[serde(rename = "HeightDisplay", default)]
    pub height: Option<Value>,
    #[serde(rename = "Weight", default)]
    pub weight: Option<Value>,
    #[serde(rename = "BirthDate", default)]
    pub birthdate: Option<Value>,
    #[serde(rename = "Age", default)]
    pub age: Option<Value>,
}

impl PlayerInfo {
    /// `First Last`, trimmed; empty when neither part is known.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    pub fn is_empty(&self) -> bool {
        *self == PlayerInfo::default()
    }
}

/// One season table: normalized rows plus the player block.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    pub rows: Vec<RawSeasonRow>,
    pub player: PlayerInfo,
}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Season-level pitching tables keyed by the stats provider's player id.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_season_table(
        &self,
        fg_id: u32,
        year: i32,
        span: StatsSpan,
    ) -> anyhow::Result<StatsTable>;

    /// Endpoint reported in the report metadata.
    fn source(&self) -> &str;
}

/// Pitch-level events for one pitcher over an inclusive date range.
#[async_trait]
pub trait EventProvider: Send + Sync {
    async fn fetch_pitches(
        &self,
        mlbam: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<PitchEvent>>;

    /// Endpoint reported in the report metadata.
    fn source(&self) -> &str;
}

/// MLBAM id to stats-provider id.
#[async_trait]
pub trait IdResolver: Send + Sync {
    async fn fangraphs_id(&self, mlbam: u32) -> anyhow::Result<Option<u32>>;
}

// ---------------------------------------------------------------------------
// HTTP plumbing
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} still failing after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("failed to read register {path}: {source}")]
    Register { path: String, source: csv::Error },
}

/// Status codes worth another attempt.
const RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Retry policy for one client.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(http: &HttpConfig) -> Self {
        Self {
            max_attempts: http.max_attempts.max(1),
            backoff: http.backoff(),
        }
    }

    /// Linear backoff: `backoff * (attempt + 1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff * (attempt + 1)
    }
}

/// Build the shared `reqwest::Client` from the `[http]` config.
pub fn http_client(http: &HttpConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(http.timeout())
        .user_agent(http.user_agent.clone())
        .build()
}

/// GET `url` with `params` and return the body text, retrying throttling,
/// server errors, timeouts and connection failures.
pub async fn get_text_with_retry(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
    policy: RetryPolicy,
) -> Result<String, ProviderError> {
    for attempt in 0..policy.max_attempts {
        let last = attempt + 1 == policy.max_attempts;
        match client.get(url).query(params).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if RETRY_STATUSES.contains(&status) {
                    warn!(url, status, attempt, "retryable status");
                    if !last {
                        tokio::time::sleep(policy.delay(attempt)).await;
                    }
                    continue;
                }
                if !response.status().is_success() {
                    return Err(ProviderError::Status {
                        url: url.to_string(),
                        status,
                    });
                }
                let body = response.text().await.map_err(|e| ProviderError::Http {
                    url: url.to_string(),
                    source: e,
                })?;
                debug!(url, bytes = body.len(), "fetched");
                return Ok(body);
            }
            Err(e) if (e.is_timeout() || e.is_connect()) && !last => {
                warn!(url, attempt, "transient request failure: {}", e);
                tokio::time::sleep(policy.delay(attempt)).await;
            }
            Err(e) => {
                return Err(ProviderError::Http {
                    url: url.to_string(),
                    source: e,
                });
            }
        }
    }
    Err(ProviderError::Exhausted {
        url: url.to_string(),
        attempts: policy.max_attempts,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
