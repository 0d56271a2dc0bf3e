// Pitch-level events: the record type, span filtering, and the year window
// fetched for a request.

pub mod aggregate;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::stats::slice::{Rollup, SeasonSlice, Span};

/// Earliest year considered for the trailing window.
const MIN_SEASON: i32 = 1901;

/// One pitch, as published by the pitch-tracking search export.
///
/// Only the columns the aggregator reads are mapped; the export carries many
/// more and they are ignored. Numeric columns tolerate blanks and `null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PitchEvent {
    #[serde(default)]
    pub pitch_type: Option<String>,
    pub game_date: NaiveDate,
    pub game_pk: i64,
    #[serde(default)]
    pub game_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Batter handedness (`L` / `R`).
    #[serde(default)]
    pub stand: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub release_speed: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub release_spin_rate: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub pfx_x: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub pfx_z: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub launch_speed: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub launch_angle: Option<f64>,
}

impl PitchEvent {
    fn description_contains(&self, marker: &str) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.to_ascii_lowercase().contains(marker))
    }

    /// Swinging strike (including blocked swinging strikes).
    pub fn is_whiff(&self) -> bool {
        self.description_contains("swinging_strike")
    }

    /// Called or swinging strike.
    pub fn is_csw(&self) -> bool {
        self.is_whiff() || self.description_contains("called_strike")
    }

    /// Ball put in play.
    pub fn is_contact(&self) -> bool {
        self.description_contains("in_play")
    }
}

// ---------------------------------------------------------------------------
// Span filtering
// ---------------------------------------------------------------------------

const REGULAR_GAME_TYPES: &[&str] = &["R", "S"];
const POSTSEASON_GAME_TYPES: &[&str] = &["P", "W", "D", "L"];

/// Whether a game-type code belongs to `span`. Events without a code are
/// kept.
pub fn in_span(game_type: Option<&str>, span: Span) -> bool {
    let Some(code) = game_type else {
        return true;
    };
    (span.includes_regular() && REGULAR_GAME_TYPES.contains(&code))
        || (span.includes_postseason() && POSTSEASON_GAME_TYPES.contains(&code))
}

/// Keep the events for `span`, ordered by game date.
pub fn filter_for_span(events: Vec<PitchEvent>, span: Span) -> Vec<PitchEvent> {
    let mut kept: Vec<PitchEvent> = events
        .into_iter()
        .filter(|e| in_span(e.game_type.as_deref(), span))
        .collect();
    kept.sort_by_key(|e| e.game_date);
    kept
}

// ---------------------------------------------------------------------------
// Year window
// ---------------------------------------------------------------------------

/// Seasons whose events feed the aggregator.
///
/// * season: the target year.
/// * last3: the target year and the two before it.
/// * career: from the earliest slice year through the target year. Career
///   slices carry no year, so this is normally empty.
///
/// Years before `first_tracked` are dropped: there is no pitch tracking for
/// them.
pub fn event_years(
    rollup: Rollup,
    year: i32,
    slices: &[SeasonSlice],
    first_tracked: i32,
) -> Vec<i32> {
    let years: Vec<i32> = match rollup {
        Rollup::Season => vec![year],
        Rollup::Last3 => (year - 2..=year).filter(|y| *y >= MIN_SEASON).collect(),
        Rollup::Career => match slices.iter().filter_map(|s| s.season).min() {
            Some(start) => (start..=year).collect(),
            None => Vec::new(),
        },
    };
    years.into_iter().filter(|y| *y >= first_tracked).collect()
}

/// Date range fetched for one season: March 1 through November 30.
pub fn season_window(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 3, 1)?,
        NaiveDate::from_ymd_opt(year, 11, 30)?,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::row::StatLine;

    fn event(date: &str, game_type: &str) -> PitchEvent {
        PitchEvent {
            pitch_type: Some("FF".into()),
            game_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            game_pk: 1,
            game_type: Some(game_type.into()),
            description: None,
            stand: None,
            release_speed: None,
            release_spin_rate: None,
            pfx_x: None,
            pfx_z: None,
            launch_speed: None,
            launch_angle: None,
        }
    }

    #[test]
    fn outcome_markers_are_case_insensitive() {
        let mut e = event("2024-04-01", "R");
        e.description = Some("SWINGING_STRIKE_BLOCKED".into());
        assert!(e.is_whiff());
        assert!(e.is_csw());
        assert!(!e.is_contact());

        e.description = Some("called_strike".into());
        assert!(!e.is_whiff());
        assert!(e.is_csw());

        e.description = Some("hit_into_play".into());
        assert!(e.is_contact());

        e.description = None;
        assert!(!e.is_whiff() && !e.is_contact() && !e.is_csw());
    }

    #[test]
    fn span_filter_by_game_type() {
        assert!(in_span(Some("R"), Span::Regular));
        assert!(in_span(Some("S"), Span::Regular));
        assert!(!in_span(Some("W"), Span::Regular));
        assert!(in_span(Some("W"), Span::Postseason));
        assert!(!in_span(Some("R"), Span::Postseason));
        assert!(in_span(Some("D"), Span::Total));
        assert!(in_span(Some("R"), Span::Total));
        assert!(!in_span(Some("E"), Span::Total));
        assert!(in_span(None, Span::Postseason));
    }

    #[test]
    fn filter_sorts_by_date() {
        let events = vec![
            event("2024-10-20", "W"),
            event("2024-05-01", "R"),
            event("2024-04-01", "R"),
        ];
        let kept = filter_for_span(events, Span::Regular);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].game_date < kept[1].game_date);
    }

    #[test]
    fn years_for_season_and_last3() {
        assert_eq!(event_years(Rollup::Season, 2024, &[], 2015), vec![2024]);
        assert_eq!(event_years(Rollup::Last3, 2024, &[], 2015), vec![2022, 2023, 2024]);
        assert_eq!(event_years(Rollup::Last3, 2016, &[], 2015), vec![2015, 2016]);
        assert!(event_years(Rollup::Season, 2010, &[], 2015).is_empty());
    }

    #[test]
    fn career_years_come_from_slice_years_only() {
        let career = SeasonSlice::new(
            "Career",
            None,
            Span::Regular,
            StatLine::new(),
            StatLine::new(),
        );
        assert!(event_years(Rollup::Career, 2024, &[career], 2015).is_empty());
        assert!(event_years(Rollup::Career, 2024, &[], 2015).is_empty());

        let dated = SeasonSlice::new(
            "2013",
            Some(2013),
            Span::Regular,
            StatLine::new(),
            StatLine::new(),
        );
        assert_eq!(
            event_years(Rollup::Career, 2017, &[dated], 2015),
            vec![2015, 2016, 2017]
        );
    }

    #[test]
    fn window_covers_the_season() {
        let (start, end) = season_window(2024).unwrap();
        assert_eq!(start.to_string(), "2024-03-01");
        assert_eq!(end.to_string(), "2024-11-30");
    }
}
