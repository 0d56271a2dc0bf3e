// Innings notation codec.
//
// Providers report innings pitched as `whole.thirds` (180.1 means 180 and
// one third). All innings arithmetic happens in outs; the display form only
// exists at the edges.

/// Largest whole-innings value whose outs still fit in a `u32`.
const MAX_WHOLE_INNINGS: u32 = u32::MAX / 3;

/// Convert display-notation innings (e.g. `180.2`) to an exact count of outs.
///
/// Absent, NaN, negative and out-of-range values count as zero outs. The
/// tenths digit is clamped to `0..=2` since anything else is not a valid
/// thirds remainder.
pub fn to_outs(display: Option<f64>) -> u32 {
    let Some(ip) = display else {
        return 0;
    };
    if !ip.is_finite() || ip <= 0.0 {
        return 0;
    }
    let whole = ip.floor();
    if whole >= f64::from(MAX_WHOLE_INNINGS) {
        return 0;
    }
    let thirds = ((ip - whole) * 10.0).round().clamp(0.0, 2.0);
    whole as u32 * 3 + thirds as u32
}

/// Sum of two out counts; an overflowing sum counts as zero.
pub fn add_outs(a: u32, b: u32) -> u32 {
    a.checked_add(b).unwrap_or(0)
}

/// Convert a count of outs back to display-notation innings.
pub fn to_display(outs: u32) -> f64 {
    let whole = f64::from(outs / 3);
    let rem = f64::from(outs % 3);
    ((whole + rem / 10.0) * 10.0).round() / 10.0
}

/// Innings as a true decimal quantity (outs / 3), used as a rate denominator.
pub fn to_innings(outs: u32) -> f64 {
    f64::from(outs) / 3.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
