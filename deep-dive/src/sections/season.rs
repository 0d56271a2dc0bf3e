// Season-keyed section projectors.
//
// Each projector maps the slice list to one row per slice, in order. Rates
// that can be derived from totals are derived; everything else goes through
// the weighted-merge resolver.

use crate::sections::{Row, Section};
use crate::stats::merge::{batted_ball_ratio, resolve, safe_div};
use crate::stats::slice::SeasonSlice;

/// A pure view over the slice list.
pub type Projector = fn(&[SeasonSlice]) -> Vec<Row>;

/// Projector for a season-keyed section, or `None` for event sections.
pub fn projector(section: Section) -> Option<Projector> {
    let f: Projector = match section {
        Section::Standard => standard,
        Section::Advanced => advanced,
        Section::Statcast => statcast,
        Section::BattedBall => batted_ball,
        Section::WinProb => win_prob,
        Section::PitchValues => pitch_values,
        Section::PitchTypeVelo => pitch_type_velo,
        Section::PlateDiscipline => plate_discipline,
        Section::Pitchingbot => pitchingbot,
        Section::FieldingPitcher => fielding_pitcher,
        Section::Value => value,
        Section::PlayerGraphs => player_graphs,
        _ => return None,
    };
    Some(f)
}

// ---------------------------------------------------------------------------
// Key lists
// ---------------------------------------------------------------------------

const WIN_PROB_KEYS: &[&str] = &["WPA", "+WPA", "-WPA", "WPA/LI", "Clutch", "RE24", "REW"];

const PITCH_VALUE_KEYS: &[&str] = &[
    "wFB", "wFB/C", "wSL", "wSL/C", "wCB", "wCB/C", "wCH", "wCH/C", "wCT", "wCT/C",
];

/// `(output key, provider column)`. Fastball usage is `FB%1` upstream
/// because `FB%` is the fly-ball rate.
const PITCH_TYPE_VELO_KEYS: &[(&str, &str)] = &[
    ("FB%", "FB%1"),
    ("FBv", "FBv"),
    ("SL%", "SL%"),
    ("SLv", "SLv"),
    ("CT%", "CT%"),
    ("CTv", "CTv"),
    ("CB%", "CB%"),
    ("CBv", "CBv"),
    ("CH%", "CH%"),
    ("CHv", "CHv"),
    ("XX%", "XX%"),
    ("pivFA", "pivFA"),
    ("pivSI", "pivSI"),
    ("pivSL", "pivSL"),
    ("pivCH", "pivCH"),
    ("pivCU", "pivCU"),
    ("pivFC", "pivFC"),
    ("pivFS", "pivFS"),
    ("pivXX", "pivXX"),
];

const PLATE_DISCIPLINE_KEYS: &[&str] = &[
    "O-Swing%",
    "Z-Swing%",
    "Swing%",
    "O-Contact%",
    "Z-Contact%",
    "Contact%",
    "Zone%",
    "F-Strike%",
    "SwStr%",
    "CStr%",
    "C+SwStr%",
];

const PITCHINGBOT_KEYS: &[&str] = &[
    "pb_overall",
    "pb_stuff",
    "pb_command",
    "pb_ERA",
    "pb_xRV100",
    "pb_o_FF",
    "pb_s_FF",
    "pb_c_FF",
    "pb_o_SI",
    "pb_s_SI",
    "pb_c_SI",
    "pb_o_SL",
    "pb_s_SL",
    "pb_c_SL",
    "pb_o_CH",
    "pb_s_CH",
    "pb_c_CH",
    "pb_o_KC",
    "pb_s_KC",
    "pb_c_KC",
];

const FIELDING_KEYS: &[&str] = &[
    "RA9-Wins", "BIP-Wins", "LOB-Wins", "BS-Wins", "CFraming", "Pull%", "Cent%", "Oppo%",
];

const BATTED_BALL_RATIO_KEYS: &[&str] = &["GB%", "FB%", "LD%", "IFFB%", "HR/FB", "GB/FB"];

const CONTACT_QUALITY_KEYS: &[&str] = &["Soft%", "Med%", "Hard%"];

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn season_row(slice: &SeasonSlice) -> Row {
    Row::new().with("season", slice.label.as_str())
}

/// `count * 9 / innings`, absent when no outs were recorded.
fn per_nine(slice: &SeasonSlice, count: f64) -> Option<f64> {
    if slice.totals.outs == 0 {
        return None;
    }
    safe_div(count * 9.0, slice.totals.innings())
}

fn era(slice: &SeasonSlice) -> Option<f64> {
    per_nine(slice, slice.totals.get("ER"))
}

fn keyed(slices: &[SeasonSlice], keys: &[&'static str]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            keys.iter()
                .fold(season_row(s), |row, key| row.with(*key, resolve(s, key)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Projectors
// ---------------------------------------------------------------------------

/// Counting stats with ERA, WHIP and opponent average.
pub fn standard(slices: &[SeasonSlice]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            let t = &s.totals;
            let whip = if t.outs == 0 {
                None
            } else {
                safe_div(t.get("H") + t.get("BB"), t.innings())
            };
            let at_bats = t.get("TBF") - t.get("BB") - t.get("IBB") - t.get("HBP");
            season_row(s)
                .with("W", t.get("W"))
                .with("L", t.get("L"))
                .with("G", t.get("G"))
                .with("GS", t.get("GS"))
                .with("SV", t.get("SV"))
                .with("IP", t.ip_display())
                .with("TBF", t.get("TBF"))
                .with("H", t.get("H"))
                .with("R", t.get("R"))
                .with("ER", t.get("ER"))
                .with("HR", t.get("HR"))
                .with("BB", t.get("BB"))
                .with("SO", t.get("SO"))
                .with("ERA", era(s))
                .with("WHIP", whip)
                .with("AVG", safe_div(t.get("H"), at_bats))
        })
        .collect()
}

/// Per-nine and per-batter rates plus the fielding-independent family.
pub fn advanced(slices: &[SeasonSlice]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            let t = &s.totals;
            let k_pct = safe_div(t.get("SO"), t.get("TBF"));
            let bb_pct = safe_div(t.get("BB"), t.get("TBF"));
            let k_minus_bb = k_pct.zip(bb_pct).map(|(k, bb)| k - bb);
            season_row(s)
                .with("K/9", per_nine(s, t.get("SO")))
                .with("BB/9", per_nine(s, t.get("BB")))
                .with("K%", k_pct)
                .with("BB%", bb_pct)
                .with("K-BB%", k_minus_bb)
                .with("HR/9", per_nine(s, t.get("HR")))
                .with("FIP", resolve(s, "FIP"))
                .with("xFIP", resolve(s, "xFIP"))
                .with("SIERA", resolve(s, "SIERA"))
                .with("WAR", t.get("WAR"))
        })
        .collect()
}

/// Ball-tracking quality of contact.
pub fn statcast(slices: &[SeasonSlice]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            let t = &s.totals;
            let events = t.get("Events");
            season_row(s)
                .with("Events", events)
                .with("EV", resolve(s, "EV"))
                .with("maxEV", resolve(s, "maxEV"))
                .with("LA", resolve(s, "LA"))
                .with("HardHit", t.get("HardHit"))
                .with("HardHit%", safe_div(t.get("HardHit"), events))
                .with("Barrels", t.get("Barrels"))
                .with("Barrel%", safe_div(t.get("Barrels"), events))
                .with("xERA", resolve(s, "xERA"))
        })
        .collect()
}

/// Batted-ball mix. Mix rates come from summed component counts whenever
/// the slice has them, for every span.
pub fn batted_ball(slices: &[SeasonSlice]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            let row = BATTED_BALL_RATIO_KEYS.iter().fold(season_row(s), |row, key| {
                let value = batted_ball_ratio(&s.totals, key).or_else(|| resolve(s, key));
                row.with(*key, value)
            });
            CONTACT_QUALITY_KEYS
                .iter()
                .fold(row, |row, key| row.with(*key, resolve(s, key)))
        })
        .collect()
}

pub fn win_prob(slices: &[SeasonSlice]) -> Vec<Row> {
    keyed(slices, WIN_PROB_KEYS)
}

/// Run values per pitch type, total and per 100 pitches.
pub fn pitch_values(slices: &[SeasonSlice]) -> Vec<Row> {
    keyed(slices, PITCH_VALUE_KEYS)
}

/// Pitch-type usage and velocity.
pub fn pitch_type_velo(slices: &[SeasonSlice]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            PITCH_TYPE_VELO_KEYS
                .iter()
                .fold(season_row(s), |row, (key, column)| row.with(*key, resolve(s, column)))
        })
        .collect()
}

pub fn plate_discipline(slices: &[SeasonSlice]) -> Vec<Row> {
    keyed(slices, PLATE_DISCIPLINE_KEYS)
}

/// PitchingBot model grades (overall, stuff, command, per pitch).
pub fn pitchingbot(slices: &[SeasonSlice]) -> Vec<Row> {
    keyed(slices, PITCHINGBOT_KEYS)
}

pub fn fielding_pitcher(slices: &[SeasonSlice]) -> Vec<Row> {
    keyed(slices, FIELDING_KEYS)
}

/// Value above replacement and run-estimator context.
pub fn value(slices: &[SeasonSlice]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            let t = &s.totals;
            let has_starts =
                s.regular.num("Start-IP").is_some() || s.postseason.num("Start-IP").is_some();
            let start_ip = has_starts.then(|| t.start_ip_display());
            season_row(s)
                .with("WAR", t.get("WAR"))
                .with("RAR", t.get("RAR"))
                .with("Dollars", t.get("Dollars"))
                .with("Start-IP", start_ip)
                .with("QS", t.get("QS"))
                .with("RS", t.get("RS"))
                .with("tERA", resolve(s, "tERA"))
                .with("xERA", resolve(s, "xERA"))
                .with("SIERA", resolve(s, "SIERA"))
        })
        .collect()
}

/// Compact trend view for charts.
pub fn player_graphs(slices: &[SeasonSlice]) -> Vec<Row> {
    slices
        .iter()
        .map(|s| {
            season_row(s)
                .with("ERA", era(s))
                .with("FIP", resolve(s, "FIP"))
                .with("xFIP", resolve(s, "xFIP"))
                .with("WAR", s.totals.get("WAR"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
