// Season-row normalization.
//
// The stats provider returns loosely-typed JSON objects: numbers sometimes
// arrive as strings, labels carry HTML links, and a `type` discriminator
// separates ordinary season rows from career and postseason totals. This
// module turns those objects into `RawSeasonRow`s with numeric stats.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Columns that stay text even when their content looks numeric.
pub const STRING_COLUMNS: &[&str] = &[
    "Season",
    "Team",
    "ateam",
    "AbbName",
    "AbbLevel",
    "leagueUrl",
];

/// Level label for major-league rows.
const MLB_LEVEL: &str = "MLB";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single statistic value after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

/// Named statistics for one row (or one side of a merged slice).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatLine {
    values: HashMap<String, StatValue>,
}

impl StatLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: StatValue) {
        self.values.insert(key.into(), value);
    }

    /// Numeric value for `key`, if present and numeric.
    pub fn num(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(StatValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value for `key`, treating absent or text values as zero.
    pub fn num_or_zero(&self, key: &str) -> f64 {
        self.num(key).unwrap_or(0.0)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(StatValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, StatValue)> for StatLine {
    fn from_iter<T: IntoIterator<Item = (String, StatValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Row-kind discriminator carried in the provider's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// `type = 0`: one season at one level.
    Season,
    /// `type = -1`: regular-season career totals.
    Career,
    /// `type = -2`: postseason career totals.
    PostseasonTotal,
    /// Any other discriminator, or none at all.
    Other,
}

impl RowKind {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => RowKind::Season,
            Some(-1) => RowKind::Career,
            Some(-2) => RowKind::PostseasonTotal,
            _ => RowKind::Other,
        }
    }

    pub fn is_total(self) -> bool {
        matches!(self, RowKind::Career | RowKind::PostseasonTotal)
    }
}

/// One normalized row from the stats provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeasonRow {
    pub kind: RowKind,
    /// Season year, when the row carries a resolvable one.
    pub season: Option<i32>,
    /// Display label: the year, `Career`, `Postseason`, or the cleaned
    /// `Season` text.
    pub label: String,
    pub level: Option<String>,
    pub stats: StatLine,
}

impl RawSeasonRow {
    /// Major-league season rows plus every total row. Some postseason
    /// aggregates carry no level at all, so totals are kept regardless.
    pub fn is_major_league(&self) -> bool {
        self.kind.is_total() || self.level.as_deref() == Some(MLB_LEVEL)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a list of raw JSON rows. Non-object entries are skipped.
pub fn normalize_rows(raw: &[Value]) -> Vec<RawSeasonRow> {
    raw.iter()
        .filter_map(|value| match value {
            Value::Object(obj) => Some(normalize_row(obj)),
            other => {
                warn!("skipping non-object season row: {}", other);
                None
            }
        })
        .collect()
}

/// Normalize one JSON object into a `RawSeasonRow`.
pub fn normalize_row(obj: &Map<String, Value>) -> RawSeasonRow {
    let stats: StatLine = obj
        .iter()
        .filter_map(|(key, value)| coerce(key, value).map(|v| (key.clone(), v)))
        .collect();

    let kind = RowKind::from_code(obj.get("type").and_then(as_integer));
    let season = obj
        .get("aseason")
        .and_then(as_integer)
        .and_then(|n| i32::try_from(n).ok());
    let label = season_label(kind, season, obj.get("Season"));
    let level = stats.text("AbbLevel").map(str::to_string);

    RawSeasonRow {
        kind,
        season,
        label,
        level,
        stats,
    }
}

/// Keep only the rows that feed the engine: MLB seasons and totals.
pub fn major_league_rows(rows: Vec<RawSeasonRow>) -> Vec<RawSeasonRow> {
    rows.into_iter().filter(RawSeasonRow::is_major_league).collect()
}

fn season_label(kind: RowKind, season: Option<i32>, raw_season: Option<&Value>) -> String {
    match kind {
        RowKind::Career => "Career".to_string(),
        RowKind::PostseasonTotal => "Postseason".to_string(),
        _ => match season {
            Some(year) => year.to_string(),
            None => raw_season.map(value_to_text).map(|s| strip_html(&s)).unwrap_or_default(),
        },
    }
}

/// Coerce one JSON value. Nulls, arrays and objects are dropped.
fn coerce(key: &str, value: &Value) -> Option<StatValue> {
    if STRING_COLUMNS.contains(&key) {
        return match value {
            Value::Null | Value::Array(_) | Value::Object(_) => None,
            other => Some(StatValue::Text(value_to_text(other))),
        };
    }
    match value {
        Value::Number(n) => n.as_f64().map(StatValue::Number),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => Some(StatValue::Number(n)),
            Err(_) => Some(StatValue::Text(s.clone())),
        },
        Value::Bool(b) => Some(StatValue::Number(if *b { 1.0 } else { 0.0 })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Remove `<...>` markup, keeping the text between tags.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let row = normalize_row(&obj(json!({
            "type": 0, "aseason": 2023, "AbbLevel": "MLB",
            "IP": "180.1", "ER": 60, "K%": " 0.25 "
        })));
        assert_eq!(row.stats.num("IP"), Some(180.1));
        assert_eq!(row.stats.num("ER"), Some(60.0));
        assert_eq!(row.stats.num("K%"), Some(0.25));
    }

    #[test]
    fn string_columns_stay_text() {
        let row = normalize_row(&obj(json!({
            "type": 0, "aseason": 2023, "Season": "2023", "Team": "NYY", "AbbLevel": "MLB"
        })));
        assert_eq!(row.stats.text("Season"), Some("2023"));
        assert_eq!(row.stats.num("Season"), None);
        assert_eq!(row.stats.text("Team"), Some("NYY"));
    }

    #[test]
    fn non_numeric_text_is_kept_as_text() {
        let row = normalize_row(&obj(json!({ "type": 0, "Notes": "n/a" })));
        assert_eq!(row.stats.text("Notes"), Some("n/a"));
        assert_eq!(row.stats.num("Notes"), None);
    }

    #[test]
    fn nulls_are_dropped() {
        let row = normalize_row(&obj(json!({ "type": 0, "xERA": null })));
        assert_eq!(row.stats.num("xERA"), None);
        assert_eq!(row.stats.text("xERA"), None);
    }

    #[test]
    fn season_rows_use_the_year_as_label() {
        let row = normalize_row(&obj(json!({ "type": 0, "aseason": "2021" })));
        assert_eq!(row.kind, RowKind::Season);
        assert_eq!(row.season, Some(2021));
        assert_eq!(row.label, "2021");
    }

    #[test]
    fn total_rows_get_fixed_labels() {
        let career = normalize_row(&obj(json!({ "type": -1, "aseason": 2024 })));
        assert_eq!(career.kind, RowKind::Career);
        assert_eq!(career.label, "Career");

        let post = normalize_row(&obj(json!({ "type": -2 })));
        assert_eq!(post.kind, RowKind::PostseasonTotal);
        assert_eq!(post.label, "Postseason");
        assert_eq!(post.season, None);
    }

    #[test]
    fn missing_year_falls_back_to_cleaned_season_text() {
        let row = normalize_row(&obj(json!({
            "type": 0, "Season": "<a href=\"/x\">2019</a>"
        })));
        assert_eq!(row.season, None);
        assert_eq!(row.label, "2019");
    }

    #[test]
    fn unknown_discriminator_is_other() {
        let row = normalize_row(&obj(json!({ "type": 7 })));
        assert_eq!(row.kind, RowKind::Other);
        let row = normalize_row(&obj(json!({ "IP": 3.0 })));
        assert_eq!(row.kind, RowKind::Other);
    }

    #[test]
    fn minor_league_rows_are_filtered() {
        let rows = normalize_rows(&[
            json!({ "type": 0, "aseason": 2015, "AbbLevel": "AAA" }),
            json!({ "type": 0, "aseason": 2016, "AbbLevel": "MLB" }),
            json!({ "type": -2 }),
            json!("not a row"),
        ]);
        assert_eq!(rows.len(), 3);
        let kept = major_league_rows(rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].season, Some(2016));
        assert_eq!(kept[1].kind, RowKind::PostseasonTotal);
    }

    #[test]
    fn strip_html_keeps_inner_text() {
        assert_eq!(strip_html("<b>2020</b> (<i>NYY</i>)"), "2020 (NYY)");
        assert_eq!(strip_html("plain"), "plain");
    }
}
