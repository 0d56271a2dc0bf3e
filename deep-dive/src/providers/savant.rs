// Baseball Savant pitch-search client (CSV export).

use std::io::Read;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::Config;
use crate::events::PitchEvent;
use crate::providers::cache::{CacheKey, TtlCache};
use crate::providers::{get_text_with_retry, http_client, EventProvider, RetryPolicy};

/// Game types requested: regular season, postseason, spring training.
/// Span filtering happens after the fetch.
const GAME_TYPES: &str = "R|PO|S|";

/// Parse a pitch-search CSV export. Malformed rows are skipped with a
/// warning; a body with no rows yields an empty list.
pub fn parse_pitch_csv<R: Read>(rdr: R) -> Vec<PitchEvent> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut events = Vec::new();
    for result in reader.deserialize::<PitchEvent>() {
        match result {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!("skipping malformed pitch row: {}", e);
            }
        }
    }
    events
}

pub struct SavantClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
    cache: TtlCache<String>,
}

impl SavantClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = http_client(&config.http).context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.savant.base_url.clone(),
            policy: RetryPolicy::from_config(&config.http),
            cache: TtlCache::new(config.cache.ttl()),
        })
    }

    fn params(mlbam: u32, start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("all", "true".to_string()),
            ("type", "details".to_string()),
            ("player_type", "pitcher".to_string()),
            ("hfGT", GAME_TYPES.to_string()),
            ("game_date_gt", start.format("%Y-%m-%d").to_string()),
            ("game_date_lt", end.format("%Y-%m-%d").to_string()),
            ("pitchers_lookup[]", mlbam.to_string()),
        ]
    }
}

#[async_trait]
impl EventProvider for SavantClient {
    async fn fetch_pitches(
        &self,
        mlbam: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<PitchEvent>> {
        let params = Self::params(mlbam, start, end);
        let key = CacheKey::new(&self.base_url, &params);

        let body = match self.cache.get(&key).await {
            Some(body) => body,
            None => {
                let body = get_text_with_retry(&self.http, &self.base_url, &params, self.policy)
                    .await
                    .with_context(|| {
                        format!("fetching pitches for {mlbam} from {start} to {end}")
                    })?;
                self.cache.insert(key, body.clone()).await;
                body
            }
        };

        let text = body.trim_start_matches('\u{feff}');
        let events = parse_pitch_csv(text.as_bytes());
        debug!(mlbam, %start, %end, pitches = events.len(), "pitch events");
        Ok(events)
    }

    fn source(&self) -> &str {
        &self.base_url
    }
}
