// Output sections: row type, section keys, and the per-section failure
// boundary.

pub mod sanitize;
pub mod season;

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

// ---------------------------------------------------------------------------
// Cells and rows
// ---------------------------------------------------------------------------

/// One output value. `Absent` serializes as `null`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Integer(i64),
    Text(String),
    Absent,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Absent, Cell::Number)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// One output row: ordered key/value pairs, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(&'static str, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &'static str, value: impl Into<Cell>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<Cell>) {
        self.fields.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Numeric value for `key`; `None` when missing, absent, or text.
    pub fn num(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Cell::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Cell::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.fields.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Section keys
// ---------------------------------------------------------------------------

/// Every section in the report, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Standard,
    Advanced,
    Statcast,
    BattedBall,
    WinProb,
    PitchValues,
    PitchTypeVelo,
    PlateDiscipline,
    Pitchingbot,
    FieldingPitcher,
    Value,
    PlayerGraphs,
    PitchTypeSplits,
    Splits,
    PitchVelocity,
    PitchTypeMix,
    MovementScatter,
    GameLog,
}

impl Section {
    /// Sections projected from season slices.
    pub const SEASON: [Section; 12] = [
        Section::Standard,
        Section::Advanced,
        Section::Statcast,
        Section::BattedBall,
        Section::WinProb,
        Section::PitchValues,
        Section::PitchTypeVelo,
        Section::PlateDiscipline,
        Section::Pitchingbot,
        Section::FieldingPitcher,
        Section::Value,
        Section::PlayerGraphs,
    ];

    /// Sections aggregated from pitch events.
    pub const EVENT: [Section; 6] = [
        Section::PitchTypeSplits,
        Section::Splits,
        Section::PitchVelocity,
        Section::PitchTypeMix,
        Section::MovementScatter,
        Section::GameLog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Standard => "standard",
            Section::Advanced => "advanced",
            Section::Statcast => "statcast",
            Section::BattedBall => "batted_ball",
            Section::WinProb => "win_prob",
            Section::PitchValues => "pitch_values",
            Section::PitchTypeVelo => "pitch_type_velo",
            Section::PlateDiscipline => "plate_discipline",
            Section::Pitchingbot => "pitchingbot",
            Section::FieldingPitcher => "fielding_pitcher",
            Section::Value => "value",
            Section::PlayerGraphs => "player_graphs",
            Section::PitchTypeSplits => "pitch_type_splits",
            Section::Splits => "splits",
            Section::PitchVelocity => "pitch_velocity",
            Section::PitchTypeMix => "pitch_type_mix",
            Section::MovementScatter => "movement_scatter",
            Section::GameLog => "game_log",
        }
    }

    pub fn all() -> impl Iterator<Item = Section> {
        Self::SEASON.into_iter().chain(Self::EVENT)
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Section results
// ---------------------------------------------------------------------------

/// Outcome of computing one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionStatus {
    /// At least one row.
    Present,
    /// Computed cleanly but produced no rows (no data for the request).
    Empty,
    /// The projector faulted; rows are empty.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionResult {
    pub rows: Vec<Row>,
    pub status: SectionStatus,
}

impl SectionResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let status = if rows.is_empty() {
            SectionStatus::Empty
        } else {
            SectionStatus::Present
        };
        Self { rows, status }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            status: SectionStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_missing(&self) -> bool {
        self.status != SectionStatus::Present
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            SectionStatus::Failed { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Run one section builder inside a failure boundary and sanitize its rows.
///
/// A panic inside `build` becomes `SectionStatus::Failed` for this section
/// only; the caller carries on with the rest of the report.
pub fn run_section<F>(section: Section, build: F) -> SectionResult
where
    F: FnOnce() -> Vec<Row>,
{
    match catch_unwind(AssertUnwindSafe(build)) {
        Ok(mut rows) => {
            sanitize::sanitize_rows(&mut rows);
            SectionResult::from_rows(rows)
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            warn!(section = section.as_str(), "section failed: {}", reason);
            SectionResult::failed(reason)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "section builder panicked".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_serializes_in_insertion_order() {
        let row = Row::new()
            .with("season", "2023")
            .with("ERA", 2.5)
            .with("count", 3_i64)
            .with("xERA", None::<f64>);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"season":"2023","ERA":2.5,"count":3,"xERA":null}"#);
    }

    #[test]
    fn row_lookup_helpers() {
        let row = Row::new().with("season", "2023").with("ERA", 2.5);
        assert_eq!(row.num("ERA"), Some(2.5));
        assert_eq!(row.num("season"), None);
        assert_eq!(row.text("season"), Some("2023"));
        assert!(row.get("missing").is_none());
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["season", "ERA"]);
    }

    #[test]
    fn section_keys_are_unique_and_ordered() {
        let keys: Vec<_> = Section::all().map(Section::as_str).collect();
        assert_eq!(keys.len(), 18);
        let mut dedup = keys.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), 18);
        assert_eq!(keys[0], "standard");
        assert_eq!(keys[17], "game_log");
    }

    #[test]
    fn run_section_marks_empty_as_missing() {
        let result = run_section(Section::Standard, Vec::new);
        assert_eq!(result.status, SectionStatus::Empty);
        assert!(result.is_missing());
    }

    #[test]
    fn run_section_sanitizes_rows() {
        let result = run_section(Section::Standard, || vec![Row::new().with("ERA", f64::INFINITY)]);
        assert_eq!(result.status, SectionStatus::Present);
        assert!(!result.is_missing());
        assert_eq!(result.rows[0].get("ERA"), Some(&Cell::Absent));
    }

    #[test]
    fn run_section_isolates_panics() {
        let result = run_section(Section::Advanced, || -> Vec<Row> { panic!("bad slice") });
        assert!(result.is_missing());
        assert!(result.rows.is_empty());
        assert_eq!(result.failure_reason(), Some("bad slice"));
    }
}
