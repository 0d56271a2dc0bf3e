// Season slices: the composite records every season-keyed section reads.
//
// A slice pairs the regular-season and postseason rows for one rollup point
// (one year, or the career) and carries additive totals computed once at
// construction.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::stats::classify::additive_columns;
use crate::stats::innings::{add_outs, to_display, to_innings, to_outs};
use crate::stats::row::{RawSeasonRow, RowKind, StatLine};

/// Number of seasons in the trailing rollup.
pub const TRAILING_SEASONS: usize = 3;

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Which games a statistic covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Span {
    Regular,
    Postseason,
    Total,
}

impl Span {
    pub fn as_str(self) -> &'static str {
        match self {
            Span::Regular => "regular",
            Span::Postseason => "postseason",
            Span::Total => "total",
        }
    }

    pub fn includes_regular(self) -> bool {
        matches!(self, Span::Regular | Span::Total)
    }

    pub fn includes_postseason(self) -> bool {
        matches!(self, Span::Postseason | Span::Total)
    }
}

/// Year-selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rollup {
    Season,
    Last3,
    Career,
}

impl Rollup {
    pub fn as_str(self) -> &'static str {
        match self {
            Rollup::Season => "season",
            Rollup::Last3 => "last3",
            Rollup::Career => "career",
        }
    }
}

/// Returned when a span or rollup string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseSelectorError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Span {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Span::Regular),
            "postseason" => Ok(Span::Postseason),
            "total" => Ok(Span::Total),
            other => Err(ParseSelectorError {
                kind: "span",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Rollup {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "season" => Ok(Rollup::Season),
            "last3" => Ok(Rollup::Last3),
            "career" => Ok(Rollup::Career),
            other => Err(ParseSelectorError {
                kind: "rollup",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Rollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Additive totals across both sides of a slice.
///
/// Every additive column is present (missing inputs count as zero). Innings
/// are held as outs; display notation is derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub outs: u32,
    pub start_outs: u32,
    sums: HashMap<&'static str, f64>,
}

impl Totals {
    pub fn compute(regular: &StatLine, postseason: &StatLine) -> Self {
        let outs = add_outs(to_outs(regular.num("IP")), to_outs(postseason.num("IP")));
        let start_outs = add_outs(
            to_outs(regular.num("Start-IP")),
            to_outs(postseason.num("Start-IP")),
        );
        let sums = additive_columns()
            .map(|col| (col, regular.num_or_zero(col) + postseason.num_or_zero(col)))
            .collect();
        Self {
            outs,
            start_outs,
            sums,
        }
    }

    /// Summed value of an additive column; zero for anything else.
    pub fn get(&self, col: &str) -> f64 {
        self.sums.get(col).copied().unwrap_or(0.0)
    }

    /// Innings as a decimal rate denominator (outs / 3).
    pub fn innings(&self) -> f64 {
        to_innings(self.outs)
    }

    /// Innings in display notation.
    pub fn ip_display(&self) -> f64 {
        to_display(self.outs)
    }

    pub fn start_ip_display(&self) -> f64 {
        to_display(self.start_outs)
    }
}

// ---------------------------------------------------------------------------
// SeasonSlice
// ---------------------------------------------------------------------------

/// One composite record for one rollup point.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSlice {
    pub label: String,
    /// Season year; `None` for career rollups.
    pub season: Option<i32>,
    pub span: Span,
    pub regular: StatLine,
    pub postseason: StatLine,
    pub totals: Totals,
}

impl SeasonSlice {
    pub fn new(
        label: impl Into<String>,
        season: Option<i32>,
        span: Span,
        regular: StatLine,
        postseason: StatLine,
    ) -> Self {
        let totals = Totals::compute(&regular, &postseason);
        Self {
            label: label.into(),
            season,
            span,
            regular,
            postseason,
            totals,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Season-year lookup over the ordinary rows of one input. Later rows for
/// the same year replace earlier ones.
fn season_lookup(rows: &[RawSeasonRow]) -> BTreeMap<i32, &RawSeasonRow> {
    rows.iter()
        .filter(|row| row.kind == RowKind::Season)
        .filter_map(|row| row.season.map(|year| (year, row)))
        .collect()
}

fn total_row(rows: &[RawSeasonRow], kind: RowKind) -> Option<&RawSeasonRow> {
    rows.iter()
        .find(|row| row.kind == kind)
        .filter(|row| !row.stats.is_empty())
}

/// The `n` most recent years `<= year`, ascending.
fn trailing_years(candidates: impl Iterator<Item = i32>, year: i32, n: usize) -> Vec<i32> {
    let mut years: Vec<i32> = candidates.filter(|y| *y <= year).collect();
    years.sort_unstable();
    years.dedup();
    let skip = years.len().saturating_sub(n);
    years.split_off(skip)
}

fn with_stats<'a>(row: Option<&&'a RawSeasonRow>) -> Option<&'a RawSeasonRow> {
    row.copied().filter(|r| !r.stats.is_empty())
}

fn stats_of(row: Option<&RawSeasonRow>) -> StatLine {
    row.map(|r| r.stats.clone()).unwrap_or_default()
}

fn postseason_label(year: i32) -> String {
    format!("{year} PS")
}

/// One slice for `year` from whichever inputs carry it. The label comes
/// from the regular row when there is one.
fn year_slice(
    year: i32,
    span: Span,
    reg: Option<&RawSeasonRow>,
    post: Option<&RawSeasonRow>,
) -> Option<SeasonSlice> {
    let (reg, post) = match span {
        Span::Regular => (Some(reg?), None),
        Span::Postseason => (None, Some(post?)),
        Span::Total if reg.is_none() && post.is_none() => return None,
        Span::Total => (reg, post),
    };
    let label = match span {
        Span::Postseason => postseason_label(year),
        _ => reg
            .or(post)
            .map(|row| row.label.clone())
            .unwrap_or_else(|| year.to_string()),
    };
    Some(SeasonSlice::new(label, Some(year), span, stats_of(reg), stats_of(post)))
}

/// Build the ordered slice list for a span and rollup.
///
/// `regular_rows` and `postseason_rows` are the normalized rows from the
/// regular and postseason stats tables; either may be empty.
pub fn select(
    regular_rows: &[RawSeasonRow],
    postseason_rows: &[RawSeasonRow],
    span: Span,
    rollup: Rollup,
    year: i32,
) -> Vec<SeasonSlice> {
    let reg = season_lookup(regular_rows);
    let post = season_lookup(postseason_rows);

    match rollup {
        Rollup::Season => {
            let r = with_stats(reg.get(&year));
            let p = with_stats(post.get(&year));
            year_slice(year, span, r, p).into_iter().collect()
        }
        Rollup::Last3 => {
            let candidates: Vec<i32> = match span {
                Span::Regular => reg.keys().copied().collect(),
                Span::Postseason => post.keys().copied().collect(),
                Span::Total => reg.keys().chain(post.keys()).copied().collect(),
            };
            trailing_years(candidates.into_iter(), year, TRAILING_SEASONS)
                .into_iter()
                .filter_map(|y| year_slice(y, span, reg.get(&y).copied(), post.get(&y).copied()))
                .collect()
        }
        Rollup::Career => {
            let r = total_row(regular_rows, RowKind::Career);
            let p = total_row(postseason_rows, RowKind::PostseasonTotal);
            let (r, p, label) = match span {
                Span::Regular => (r, None, "Career"),
                Span::Postseason => (None, p, "Career (PS)"),
                Span::Total => (r, p, "Career"),
            };
            if r.is_none() && p.is_none() {
                return Vec::new();
            }
            vec![SeasonSlice::new(label, None, span, stats_of(r), stats_of(p))]
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::row::{normalize_rows, StatValue};
    use serde_json::json;

    fn line(pairs: &[(&str, f64)]) -> StatLine {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), StatValue::Number(*v)))
            .collect()
    }

    fn season_row(year: i32, pairs: &[(&str, f64)]) -> RawSeasonRow {
        RawSeasonRow {
            kind: RowKind::Season,
            season: Some(year),
            label: year.to_string(),
            level: Some("MLB".into()),
            stats: line(pairs),
        }
    }

    fn total(kind: RowKind, pairs: &[(&str, f64)]) -> RawSeasonRow {
        RawSeasonRow {
            kind,
            season: None,
            label: String::new(),
            level: None,
            stats: line(pairs),
        }
    }

    fn years(slices: &[SeasonSlice]) -> Vec<Option<i32>> {
        slices.iter().map(|s| s.season).collect()
    }

    #[test]
    fn span_and_rollup_parse() {
        assert_eq!("total".parse::<Span>(), Ok(Span::Total));
        assert_eq!("last3".parse::<Rollup>(), Ok(Rollup::Last3));
        let err = "weekly".parse::<Rollup>().unwrap_err();
        assert_eq!(err.kind, "rollup");
        assert_eq!(err.to_string(), "unknown rollup `weekly`");
        assert!("Regular".parse::<Span>().is_err());
    }

    #[test]
    fn totals_sum_outs_not_display_innings() {
        let slice = SeasonSlice::new(
            "2023",
            Some(2023),
            Span::Total,
            line(&[("IP", 0.2), ("ER", 1.0)]),
            line(&[("IP", 0.2), ("ER", 2.0)]),
        );
        assert_eq!(slice.totals.outs, 4);
        assert!((slice.totals.ip_display() - 1.1).abs() < 1e-9);
        assert!((slice.totals.get("ER") - 3.0).abs() < 1e-9);
    }

    #[test]
    fn totals_treat_missing_as_zero() {
        let totals = Totals::compute(&line(&[("SO", 10.0)]), &StatLine::new());
        assert!((totals.get("SO") - 10.0).abs() < 1e-9);
        assert_eq!(totals.get("HR"), 0.0);
        assert_eq!(totals.get("ERA"), 0.0);
        assert_eq!(totals.outs, 0);
    }

    #[test]
    fn start_innings_go_through_the_codec() {
        let totals = Totals::compute(&line(&[("Start-IP", 100.2)]), &line(&[("Start-IP", 5.1)]));
        assert_eq!(totals.start_outs, 302 + 16);
        assert!((totals.start_ip_display() - 106.0).abs() < 1e-9);
    }

    #[test]
    fn season_regular_picks_target_year() {
        let reg = vec![season_row(2022, &[("G", 30.0)]), season_row(2023, &[("G", 31.0)])];
        let slices = select(&reg, &[], Span::Regular, Rollup::Season, 2023);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "2023");
        assert_eq!(slices[0].season, Some(2023));
        assert!(slices[0].postseason.is_empty());
    }

    #[test]
    fn season_postseason_gets_suffix() {
        let post = vec![season_row(2023, &[("G", 3.0)])];
        let slices = select(&[], &post, Span::Postseason, Rollup::Season, 2023);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "2023 PS");
        assert!(slices[0].regular.is_empty());
    }

    #[test]
    fn season_total_merges_when_either_side_present() {
        let post = vec![season_row(2023, &[("G", 3.0)])];
        let slices = select(&[], &post, Span::Total, Rollup::Season, 2023);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "2023");
        assert!((slices[0].totals.get("G") - 3.0).abs() < 1e-9);
    }

    #[test]
    fn season_missing_year_is_empty() {
        let reg = vec![season_row(2022, &[("G", 30.0)])];
        assert!(select(&reg, &[], Span::Regular, Rollup::Season, 2023).is_empty());
        assert!(select(&reg, &[], Span::Total, Rollup::Season, 2023).is_empty());
        assert!(select(&[], &[], Span::Total, Rollup::Season, 2023).is_empty());
    }

    #[test]
    fn last3_takes_three_most_recent_ascending() {
        let reg: Vec<_> = [2018, 2019, 2020, 2021, 2022, 2024]
            .iter()
            .map(|y| season_row(*y, &[("G", 1.0)]))
            .collect();
        let slices = select(&reg, &[], Span::Regular, Rollup::Last3, 2022);
        assert_eq!(years(&slices), vec![Some(2020), Some(2021), Some(2022)]);
    }

    #[test]
    fn last3_returns_fewer_when_history_is_short() {
        let reg = vec![season_row(2023, &[("G", 1.0)])];
        let slices = select(&reg, &[], Span::Regular, Rollup::Last3, 2024);
        assert_eq!(years(&slices), vec![Some(2023)]);
    }

    #[test]
    fn last3_total_uses_union_of_years() {
        let reg = vec![season_row(2019, &[("G", 30.0)]), season_row(2021, &[("G", 30.0)])];
        let post = vec![season_row(2020, &[("G", 2.0)]), season_row(2022, &[("G", 4.0)])];
        let slices = select(&reg, &post, Span::Total, Rollup::Last3, 2022);
        assert_eq!(years(&slices), vec![Some(2020), Some(2021), Some(2022)]);
        assert!(slices[0].regular.is_empty());
        assert!(slices[2].regular.is_empty());
        assert!(slices[1].postseason.is_empty());
    }

    #[test]
    fn last3_postseason_labels() {
        let post = vec![season_row(2021, &[("G", 2.0)]), season_row(2022, &[("G", 4.0)])];
        let slices = select(&[], &post, Span::Postseason, Rollup::Last3, 2024);
        let labels: Vec<_> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["2021 PS", "2022 PS"]);
    }

    #[test]
    fn career_is_single_slice_without_year() {
        let reg = vec![
            season_row(2022, &[("G", 30.0)]),
            total(RowKind::Career, &[("G", 300.0)]),
        ];
        let post = vec![total(RowKind::PostseasonTotal, &[("G", 20.0)])];

        let slices = select(&reg, &post, Span::Total, Rollup::Career, 2024);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].season, None);
        assert_eq!(slices[0].label, "Career");
        assert!((slices[0].totals.get("G") - 320.0).abs() < 1e-9);

        let slices = select(&reg, &post, Span::Postseason, Rollup::Career, 2024);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "Career (PS)");
        assert!(slices[0].regular.is_empty());
    }

    #[test]
    fn career_without_total_rows_is_empty() {
        let reg = vec![season_row(2022, &[("G", 30.0)])];
        assert!(select(&reg, &[], Span::Regular, Rollup::Career, 2024).is_empty());
        assert!(select(&reg, &[], Span::Total, Rollup::Career, 2024).is_empty());
    }

    #[test]
    fn ordinary_rows_without_year_are_ignored() {
        let mut row = season_row(2023, &[("G", 1.0)]);
        row.season = None;
        assert!(select(&[row], &[], Span::Regular, Rollup::Last3, 2024).is_empty());
    }

    #[test]
    fn season_label_comes_from_the_row() {
        let mut row = season_row(2023, &[("G", 31.0)]);
        row.label = "2023 (2 teams)".into();
        let slices = select(&[row], &[], Span::Total, Rollup::Season, 2023);
        assert_eq!(slices[0].label, "2023 (2 teams)");
    }

    #[test]
    fn huge_innings_do_not_abort_selection() {
        let rows = normalize_rows(&[json!({
            "type": 0, "aseason": 2024, "AbbLevel": "MLB", "IP": "5e9", "SO": 10
        })]);
        let slices = select(&rows, &[], Span::Regular, Rollup::Season, 2024);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].totals.outs, 0);
        assert!((slices[0].totals.get("SO") - 10.0).abs() < 1e-9);

        let both = Totals::compute(&line(&[("IP", 1.0e9)]), &line(&[("IP", 1.0e9)]));
        assert_eq!(both.outs, 0);
    }
}
