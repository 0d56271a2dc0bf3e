// Column classification: how each statistic combines across spans.

/// Combination rule for one statistic when regular-season and postseason
/// records are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnClass {
    /// Counting stat: the combined value is the sum.
    Additive,
    /// Per-inning rate, weighted by innings (outs / 3) on each side.
    WeightByInnings,
    /// Per-plate-appearance rate, weighted by batters faced (`TBF`).
    WeightByBattersFaced,
    /// Batted-ball tracking rate, weighted by tracked events (`Events`).
    WeightByEvents,
    /// Per-pitch-type usage, velocity, or run value, weighted by `Pitches`.
    WeightByPitches,
    /// Everything else, weighted by games (`G`).
    WeightByGames,
    /// Batted-ball rate recomputed from summed component counts.
    SpecialRatio,
}

/// Innings columns. They are additive, but only through the outs codec.
pub const INNINGS_COLUMNS: &[&str] = &["IP", "Start-IP"];

/// Every statistic with an explicit rule. Lookup is by exact name.
const CLASSIFICATION: &[(&str, ColumnClass)] = {
    use ColumnClass::*;
    &[
        // Counting stats
        ("W", Additive),
        ("L", Additive),
        ("G", Additive),
        ("GS", Additive),
        ("CG", Additive),
        ("ShO", Additive),
        ("SV", Additive),
        ("BS", Additive),
        ("IP", Additive),
        ("Start-IP", Additive),
        ("TBF", Additive),
        ("H", Additive),
        ("R", Additive),
        ("ER", Additive),
        ("HR", Additive),
        ("BB", Additive),
        ("IBB", Additive),
        ("HBP", Additive),
        ("SO", Additive),
        ("GB", Additive),
        ("FB", Additive),
        ("LD", Additive),
        ("IFFB", Additive),
        ("IFH", Additive),
        ("BU", Additive),
        ("BUH", Additive),
        ("Balls", Additive),
        ("Strikes", Additive),
        ("Pitches", Additive),
        ("Events", Additive),
        ("HardHit", Additive),
        ("Barrels", Additive),
        ("QS", Additive),
        ("RS", Additive),
        ("Pulls", Additive),
        // Value and win probability accumulate
        ("RAR", Additive),
        ("WAR", Additive),
        ("Dollars", Additive),
        ("WPA", Additive),
        ("-WPA", Additive),
        ("+WPA", Additive),
        ("RE24", Additive),
        ("REW", Additive),
        // Per-inning rates
        ("ERA", WeightByInnings),
        ("FIP", WeightByInnings),
        ("xFIP", WeightByInnings),
        ("SIERA", WeightByInnings),
        ("tERA", WeightByInnings),
        ("xERA", WeightByInnings),
        ("WHIP", WeightByInnings),
        ("K/9", WeightByInnings),
        ("BB/9", WeightByInnings),
        ("HR/9", WeightByInnings),
        ("K/BB", WeightByInnings),
        // Per-batter rates and plate discipline
        ("K%", WeightByBattersFaced),
        ("BB%", WeightByBattersFaced),
        ("K-BB%", WeightByBattersFaced),
        ("O-Swing%", WeightByBattersFaced),
        ("Z-Swing%", WeightByBattersFaced),
        ("Swing%", WeightByBattersFaced),
        ("O-Contact%", WeightByBattersFaced),
        ("Z-Contact%", WeightByBattersFaced),
        ("Contact%", WeightByBattersFaced),
        ("Zone%", WeightByBattersFaced),
        ("F-Strike%", WeightByBattersFaced),
        ("SwStr%", WeightByBattersFaced),
        ("CStr%", WeightByBattersFaced),
        ("C+SwStr%", WeightByBattersFaced),
        ("Pull%", WeightByBattersFaced),
        ("Cent%", WeightByBattersFaced),
        ("Oppo%", WeightByBattersFaced),
        // Tracked batted balls
        ("EV", WeightByEvents),
        ("maxEV", WeightByEvents),
        ("LA", WeightByEvents),
        ("HardHit%", WeightByEvents),
        ("Barrel%", WeightByEvents),
        ("Soft%", WeightByEvents),
        ("Med%", WeightByEvents),
        ("Hard%", WeightByEvents),
        // Batted-ball mix, rebuilt from counts
        ("GB%", SpecialRatio),
        ("FB%", SpecialRatio),
        ("LD%", SpecialRatio),
        ("IFFB%", SpecialRatio),
        ("GB/FB", SpecialRatio),
        ("HR/FB", SpecialRatio),
        // Pitch-type usage (FB%1 is fastball usage; FB% is fly balls)
        ("FB%1", WeightByPitches),
        ("SL%", WeightByPitches),
        ("CT%", WeightByPitches),
        ("CB%", WeightByPitches),
        ("CH%", WeightByPitches),
        ("XX%", WeightByPitches),
        ("pfxFA%", WeightByPitches),
        ("pfxSI%", WeightByPitches),
        ("pfxSL%", WeightByPitches),
        ("pfxKC%", WeightByPitches),
        ("pfxCH%", WeightByPitches),
        ("pfxFC%", WeightByPitches),
        ("piFA%", WeightByPitches),
        ("piSI%", WeightByPitches),
        ("piSL%", WeightByPitches),
        ("piCH%", WeightByPitches),
        ("piCU%", WeightByPitches),
        ("piFC%", WeightByPitches),
        ("piFS%", WeightByPitches),
        ("piXX%", WeightByPitches),
        // Pitch-type velocity
        ("FBv", WeightByPitches),
        ("SLv", WeightByPitches),
        ("CTv", WeightByPitches),
        ("CBv", WeightByPitches),
        ("CHv", WeightByPitches),
        ("pivFA", WeightByPitches),
        ("pivSI", WeightByPitches),
        ("pivSL", WeightByPitches),
        ("pivCH", WeightByPitches),
        ("pivCU", WeightByPitches),
        ("pivFC", WeightByPitches),
        ("pivFS", WeightByPitches),
        ("pivXX", WeightByPitches),
        ("pfxvFA", WeightByPitches),
        ("pfxvSI", WeightByPitches),
        ("pfxvSL", WeightByPitches),
        ("pfxvKC", WeightByPitches),
        ("pfxvCH", WeightByPitches),
        ("pfxvFC", WeightByPitches),
        // Pitch-type run values
        ("wFB", WeightByPitches),
        ("wSL", WeightByPitches),
        ("wCB", WeightByPitches),
        ("wCH", WeightByPitches),
        ("wCT", WeightByPitches),
        ("wFB/C", WeightByPitches),
        ("wSL/C", WeightByPitches),
        ("wCB/C", WeightByPitches),
        ("wCH/C", WeightByPitches),
        ("wCT/C", WeightByPitches),
        ("pfxwFA", WeightByPitches),
        ("pfxwSI", WeightByPitches),
        ("pfxwSL", WeightByPitches),
        ("pfxwKC", WeightByPitches),
        ("pfxwCH", WeightByPitches),
        ("pfxwFC", WeightByPitches),
        ("pfxwFA/C", WeightByPitches),
        ("pfxwSI/C", WeightByPitches),
        ("pfxwSL/C", WeightByPitches),
        ("pfxwKC/C", WeightByPitches),
        ("pfxwCH/C", WeightByPitches),
        ("pfxwFC/C", WeightByPitches),
        ("piwFA", WeightByPitches),
        ("piwSI", WeightByPitches),
        ("piwSL", WeightByPitches),
        ("piwCH", WeightByPitches),
        ("piwCU", WeightByPitches),
        ("piwFC", WeightByPitches),
        ("piwFS", WeightByPitches),
        ("piwXX", WeightByPitches),
        ("piwFA/C", WeightByPitches),
        ("piwSI/C", WeightByPitches),
        ("piwSL/C", WeightByPitches),
        ("piwCH/C", WeightByPitches),
        ("piwCU/C", WeightByPitches),
        ("piwFC/C", WeightByPitches),
        ("piwFS/C", WeightByPitches),
        ("piwXX/C", WeightByPitches),
        // Leverage indices are per-game averages
        ("pLI", WeightByGames),
        ("inLI", WeightByGames),
        ("gmLI", WeightByGames),
    ]
};

/// Classify a statistic by name. Unlisted names weight by games.
pub fn classify(stat: &str) -> ColumnClass {
    CLASSIFICATION
        .iter()
        .find(|(name, _)| *name == stat)
        .map(|(_, class)| *class)
        .unwrap_or(ColumnClass::WeightByGames)
}

pub fn is_innings_column(stat: &str) -> bool {
    INNINGS_COLUMNS.contains(&stat)
}

/// Counting columns summed into every slice's totals. Innings columns are
/// excluded; they go through the outs codec instead.
pub fn additive_columns() -> impl Iterator<Item = &'static str> {
    CLASSIFICATION
        .iter()
        .filter(|(name, class)| *class == ColumnClass::Additive && !is_innings_column(name))
        .map(|(name, _)| *name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_columns_are_classified() {
        assert_eq!(classify("SO"), ColumnClass::Additive);
        assert_eq!(classify("ERA"), ColumnClass::WeightByInnings);
        assert_eq!(classify("K%"), ColumnClass::WeightByBattersFaced);
        assert_eq!(classify("Barrel%"), ColumnClass::WeightByEvents);
        assert_eq!(classify("GB%"), ColumnClass::SpecialRatio);
        assert_eq!(classify("pivFA"), ColumnClass::WeightByPitches);
    }

    #[test]
    fn unknown_columns_fall_back_to_games() {
        assert_eq!(classify("Clutch"), ColumnClass::WeightByGames);
        assert_eq!(classify(""), ColumnClass::WeightByGames);
        assert_eq!(classify("pb_stuff"), ColumnClass::WeightByGames);
    }

    #[test]
    fn fly_ball_and_fastball_usage_are_distinct() {
        assert_eq!(classify("FB%"), ColumnClass::SpecialRatio);
        assert_eq!(classify("FB%1"), ColumnClass::WeightByPitches);
    }

    #[test]
    fn leverage_indices_weight_by_games() {
        for stat in ["pLI", "inLI", "gmLI"] {
            assert_eq!(classify(stat), ColumnClass::WeightByGames);
        }
    }

    #[test]
    fn table_has_no_duplicate_names() {
        let mut seen = HashSet::new();
        for (name, _) in CLASSIFICATION {
            assert!(seen.insert(*name), "duplicate classification for {name}");
        }
    }

    #[test]
    fn additive_columns_skip_innings() {
        let cols: Vec<_> = additive_columns().collect();
        assert!(cols.contains(&"ER"));
        assert!(cols.contains(&"WAR"));
        assert!(!cols.contains(&"IP"));
        assert!(!cols.contains(&"Start-IP"));
        assert!(!cols.contains(&"ERA"));
    }
}
