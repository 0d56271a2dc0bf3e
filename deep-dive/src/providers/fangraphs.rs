// FanGraphs season-table client.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::providers::cache::{CacheKey, TtlCache};
use crate::providers::{
    get_text_with_retry, http_client, PlayerInfo, ProviderError, RetryPolicy, StatsProvider,
    StatsSpan, StatsTable,
};
use crate::stats::row::normalize_rows;

/// Response envelope; both members may be absent or `null`.
#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(rename = "playerInfo", default)]
    player_info: Option<PlayerInfo>,
}

/// Decode a stats response body into a `StatsTable`.
pub fn parse_stats_body(url: &str, body: &str) -> Result<StatsTable, ProviderError> {
    let response: StatsResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    Ok(StatsTable {
        rows: normalize_rows(response.data.as_deref().unwrap_or_default()),
        player: response.player_info.unwrap_or_default(),
    })
}

pub struct FangraphsClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
    cache: TtlCache<String>,
}

impl FangraphsClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = http_client(&config.http).context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.fangraphs.base_url.clone(),
            policy: RetryPolicy::from_config(&config.http),
            cache: TtlCache::new(config.cache.ttl()),
        })
    }

    fn params(fg_id: u32, year: i32, span: StatsSpan) -> Vec<(&'static str, String)> {
        vec![
            ("playerid", fg_id.to_string()),
            ("position", "P".to_string()),
            ("stats", "pit".to_string()),
            ("season", year.to_string()),
            ("grid", "season".to_string()),
            ("seasontype", span.season_type().to_string()),
        ]
    }
}

#[async_trait]
impl StatsProvider for FangraphsClient {
    async fn fetch_season_table(
        &self,
        fg_id: u32,
        year: i32,
        span: StatsSpan,
    ) -> anyhow::Result<StatsTable> {
        let params = Self::params(fg_id, year, span);
        let key = CacheKey::new(&self.base_url, &params);

        let body = match self.cache.get(&key).await {
            Some(body) => body,
            None => {
                let body = get_text_with_retry(&self.http, &self.base_url, &params, self.policy)
                    .await
                    .with_context(|| format!("fetching {span:?} stats for player {fg_id}"))?;
                self.cache.insert(key, body.clone()).await;
                body
            }
        };

        let table = parse_stats_body(&self.base_url, &body)?;
        debug!(fg_id, year, ?span, rows = table.rows.len(), "season table");
        Ok(table)
    }

    fn source(&self) -> &str {
        &self.base_url
    }
}
