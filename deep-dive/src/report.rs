// Deep-dive orchestration: validate the request, resolve ids, fetch season
// tables and pitch events, and assemble the sectioned report.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::events::aggregate::aggregator;
use crate::events::{event_years, filter_for_span, season_window};
use crate::providers::{EventProvider, IdResolver, PlayerInfo, StatsProvider, StatsSpan, StatsTable};
use crate::sections::season::projector;
use crate::sections::{run_section, Section, SectionResult};
use crate::stats::row::{major_league_rows, RawSeasonRow};
use crate::stats::slice::{select, Rollup, Span};

/// Earliest season the stats provider covers.
const FIRST_SEASON: i32 = 1871;

// ---------------------------------------------------------------------------
// Request and errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DeepDiveError {
    #[error("invalid {field}: `{value}`")]
    InvalidInput { field: &'static str, value: String },

    #[error("no FanGraphs id for MLBAM id {mlbam}")]
    PlayerNotFound { mlbam: u32 },

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepDiveRequest {
    pub mlbam: u32,
    pub year: i32,
    pub span: Span,
    pub rollup: Rollup,
}

impl DeepDiveRequest {
    /// Validate raw request values. Nothing is fetched until this succeeds.
    pub fn parse(mlbam: u32, year: i32, span: &str, rollup: &str) -> Result<Self, DeepDiveError> {
        let span = span
            .trim()
            .to_ascii_lowercase()
            .parse::<Span>()
            .map_err(|e| DeepDiveError::InvalidInput {
                field: e.kind,
                value: e.value,
            })?;
        let rollup = rollup
            .trim()
            .to_ascii_lowercase()
            .parse::<Rollup>()
            .map_err(|e| DeepDiveError::InvalidInput {
                field: e.kind,
                value: e.value,
            })?;
        if mlbam == 0 {
            return Err(DeepDiveError::InvalidInput {
                field: "player",
                value: mlbam.to_string(),
            });
        }
        if year < FIRST_SEASON {
            return Err(DeepDiveError::InvalidInput {
                field: "year",
                value: year.to_string(),
            });
        }
        Ok(Self {
            mlbam,
            year,
            span,
            rollup,
        })
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMeta {
    pub fg_id: u32,
    pub mlbam: u32,
    pub name: String,
    pub throws: Option<Value>,
    pub bats: Option<Value>,
    pub height: Option<Value>,
    pub weight: Option<Value>,
    pub birthdate: Option<Value>,
    pub age: Option<Value>,
}

impl PlayerMeta {
    fn new(fg_id: u32, mlbam: u32, info: PlayerInfo) -> Self {
        Self {
            fg_id,
            mlbam,
            name: info.display_name(),
            throws: info.throws,
            bats: info.bats,
            height: info.height,
            weight: info.weight,
            birthdate: info.birthdate,
            age: info.age,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceMeta {
    pub fangraphs: String,
    pub statcast: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub player: PlayerMeta,
    pub missing: BTreeMap<&'static str, bool>,
    /// Only sections whose builder faulted.
    pub failures: BTreeMap<&'static str, String>,
    pub source: SourceMeta,
}

/// The full report: metadata plus one row list per section, in section
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepDiveReport {
    pub meta: ReportMeta,
    pub sections: Vec<(Section, SectionResult)>,
}

impl DeepDiveReport {
    fn new(
        player: PlayerMeta,
        source: SourceMeta,
        sections: Vec<(Section, SectionResult)>,
    ) -> Self {
        let missing = sections
            .iter()
            .map(|(section, result)| (section.as_str(), result.is_missing()))
            .collect();
        let failures = sections
            .iter()
            .filter_map(|(section, result)| {
                result
                    .failure_reason()
                    .map(|reason| (section.as_str(), reason.to_string()))
            })
            .collect();
        Self {
            meta: ReportMeta {
                player,
                missing,
                failures,
                source,
            },
            sections,
        }
    }

    pub fn section(&self, section: Section) -> Option<&SectionResult> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, result)| result)
    }

    pub fn is_missing(&self, section: Section) -> bool {
        self.meta
            .missing
            .get(section.as_str())
            .copied()
            .unwrap_or(true)
    }
}

impl Serialize for DeepDiveReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 1))?;
        map.serialize_entry("meta", &self.meta)?;
        for (section, result) in &self.sections {
            map.serialize_entry(section.as_str(), &result.rows)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Builds deep-dive reports from the three data providers.
pub struct DeepDive {
    stats: Arc<dyn StatsProvider>,
    events: Arc<dyn EventProvider>,
    ids: Arc<dyn IdResolver>,
    first_tracked: i32,
}

impl DeepDive {
    /// `first_tracked` is the first season with pitch-level data.
    pub fn new(
        stats: Arc<dyn StatsProvider>,
        events: Arc<dyn EventProvider>,
        ids: Arc<dyn IdResolver>,
        first_tracked: i32,
    ) -> Self {
        Self {
            stats,
            events,
            ids,
            first_tracked,
        }
    }

    pub async fn run(&self, request: &DeepDiveRequest) -> Result<DeepDiveReport, DeepDiveError> {
        let DeepDiveRequest {
            mlbam,
            year,
            span,
            rollup,
        } = *request;
        info!(mlbam, year, %span, %rollup, "building deep dive");

        let fg_id = self
            .ids
            .fangraphs_id(mlbam)
            .await?
            .ok_or(DeepDiveError::PlayerNotFound { mlbam })?;

        let (regular, postseason) = tokio::try_join!(
            self.season_table(fg_id, year, StatsSpan::Regular, span.includes_regular()),
            self.season_table(fg_id, year, StatsSpan::Postseason, span.includes_postseason()),
        )?;

        let player = match (regular.as_ref(), postseason.as_ref()) {
            (Some(table), _) if !table.player.is_empty() => table.player.clone(),
            (_, Some(table)) => table.player.clone(),
            _ => PlayerInfo::default(),
        };
        let regular_rows = major_rows(regular);
        let postseason_rows = major_rows(postseason);

        let slices = select(&regular_rows, &postseason_rows, span, rollup, year);
        debug!(slices = slices.len(), "season slices");

        let years = event_years(rollup, year, &slices, self.first_tracked);
        let fetches = years
            .iter()
            .filter_map(|y| season_window(*y))
            .map(|(start, end)| self.events.fetch_pitches(mlbam, start, end));
        let per_year = try_join_all(fetches).await?;
        let events = filter_for_span(per_year.into_iter().flatten().collect(), span);
        debug!(years = ?years, pitches = events.len(), "pitch events");

        let sections: Vec<(Section, SectionResult)> = Section::all()
            .map(|section| {
                let result = if let Some(project) = projector(section) {
                    run_section(section, || project(&slices))
                } else if let Some(aggregate) = aggregator(section) {
                    run_section(section, || aggregate(&events))
                } else {
                    SectionResult::failed("no builder for section")
                };
                (section, result)
            })
            .collect();

        let report = DeepDiveReport::new(
            PlayerMeta::new(fg_id, mlbam, player),
            SourceMeta {
                fangraphs: self.stats.source().to_string(),
                statcast: self.events.source().to_string(),
            },
            sections,
        );
        info!(
            fg_id,
            missing = report.meta.missing.values().filter(|m| **m).count(),
            failed = report.meta.failures.len(),
            "deep dive complete"
        );
        Ok(report)
    }

    async fn season_table(
        &self,
        fg_id: u32,
        year: i32,
        span: StatsSpan,
        wanted: bool,
    ) -> anyhow::Result<Option<StatsTable>> {
        if !wanted {
            return Ok(None);
        }
        self.stats.fetch_season_table(fg_id, year, span).await.map(Some)
    }
}

fn major_rows(table: Option<StatsTable>) -> Vec<RawSeasonRow> {
    table.map(|t| major_league_rows(t.rows)).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
