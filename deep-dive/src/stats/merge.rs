// Weighted-merge resolution of one statistic for one slice.

use crate::stats::classify::{classify, is_innings_column, ColumnClass};
use crate::stats::innings::{add_outs, to_display, to_innings, to_outs};
use crate::stats::row::StatLine;
use crate::stats::slice::{SeasonSlice, Span, Totals};

/// `num / denom`, or `None` when the denominator is zero or the result is
/// not finite.
pub fn safe_div(num: f64, denom: f64) -> Option<f64> {
    if denom == 0.0 {
        return None;
    }
    let value = num / denom;
    value.is_finite().then_some(value)
}

/// Weighted mean over `(value, weight)` pairs.
///
/// Pairs with no value, or with a weight that is absent or not positive, do
/// not contribute at all. Returns `None` if nothing contributes.
pub fn weighted_average<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let contributing: Vec<(f64, f64)> = pairs
        .into_iter()
        .filter_map(|(value, weight)| match (value, weight) {
            (Some(v), Some(w)) if w > 0.0 && v.is_finite() && w.is_finite() => Some((v, w)),
            _ => None,
        })
        .collect();
    // A lone contributor is returned as-is so no rounding creeps in.
    if let [(v, _)] = contributing.as_slice() {
        return Some(*v);
    }
    let (total, total_weight) = contributing
        .iter()
        .fold((0.0, 0.0), |(sum, weights), (v, w)| (sum + v * w, weights + w));
    if total_weight <= 0.0 {
        return None;
    }
    Some(total / total_weight)
}

/// The value of `stat` for a slice.
///
/// Single-span slices read straight from the matching sub-record. Combined
/// slices merge both sub-records according to the column's class.
pub fn resolve(slice: &SeasonSlice, stat: &str) -> Option<f64> {
    match slice.span {
        Span::Regular => slice.regular.num(stat),
        Span::Postseason => slice.postseason.num(stat),
        Span::Total => resolve_combined(slice, stat),
    }
}

fn resolve_combined(slice: &SeasonSlice, stat: &str) -> Option<f64> {
    let reg = &slice.regular;
    let post = &slice.postseason;
    match classify(stat) {
        ColumnClass::Additive if is_innings_column(stat) => {
            Some(to_display(add_outs(to_outs(reg.num(stat)), to_outs(post.num(stat)))))
        }
        ColumnClass::Additive => Some(reg.num_or_zero(stat) + post.num_or_zero(stat)),
        ColumnClass::WeightByInnings => weighted_average([
            (reg.num(stat), Some(innings_weight(reg))),
            (post.num(stat), Some(innings_weight(post))),
        ]),
        ColumnClass::WeightByBattersFaced => weighted_by(reg, post, stat, "TBF"),
        ColumnClass::WeightByEvents => weighted_by(reg, post, stat, "Events"),
        ColumnClass::WeightByPitches => weighted_by(reg, post, stat, "Pitches"),
        ColumnClass::WeightByGames => weighted_by(reg, post, stat, "G"),
        ColumnClass::SpecialRatio => batted_ball_ratio(&slice.totals, stat),
    }
}

fn innings_weight(line: &StatLine) -> f64 {
    to_innings(to_outs(line.num("IP")))
}

fn weighted_by(reg: &StatLine, post: &StatLine, stat: &str, weight: &str) -> Option<f64> {
    weighted_average([
        (reg.num(stat), reg.num(weight)),
        (post.num(stat), post.num(weight)),
    ])
}

/// Batted-ball mix rates rebuilt from summed counts.
///
/// Per-span percentages cannot be averaged into a combined rate, so the rate
/// is recomputed from ground balls, fly balls, line drives and infield flies.
pub fn batted_ball_ratio(totals: &Totals, stat: &str) -> Option<f64> {
    let gb = totals.get("GB");
    let fb = totals.get("FB");
    let ld = totals.get("LD");
    let iffb = totals.get("IFFB");
    let balls = gb + fb + ld + iffb;
    match stat {
        "GB%" => safe_div(gb, balls),
        "FB%" => safe_div(fb, balls),
        "LD%" => safe_div(ld, balls),
        "IFFB%" => safe_div(iffb, balls),
        "GB/FB" => safe_div(gb, fb),
        "HR/FB" => safe_div(totals.get("HR"), fb),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
