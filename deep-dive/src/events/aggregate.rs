// Event-driven sections: group the span-filtered pitch events and reduce
// each group to one row.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::events::PitchEvent;
use crate::sections::{Row, Section};
use crate::stats::merge::safe_div;

/// A pure view over the pitch-event list.
pub type Aggregator = fn(&[PitchEvent]) -> Vec<Row>;

/// Aggregator for an event section, or `None` for season sections.
pub fn aggregator(section: Section) -> Option<Aggregator> {
    let f: Aggregator = match section {
        Section::PitchTypeSplits => pitch_type_splits,
        Section::Splits => handedness_splits,
        Section::PitchVelocity => velocity_trend,
        Section::PitchTypeMix => pitch_type_mix,
        Section::MovementScatter => movement_scatter,
        Section::GameLog => game_log,
        _ => return None,
    };
    Some(f)
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Running mean that skips missing and non-finite values.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    n: u32,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.n += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / f64::from(self.n))
    }
}

/// Per-group tallies shared by every event section.
#[derive(Debug, Default, Clone)]
struct Group {
    pitches: usize,
    whiffs: usize,
    csw: usize,
    contacts: usize,
    velo: Mean,
    spin: Mean,
    horz: Mean,
    vert: Mean,
    launch_speed: Mean,
    launch_angle: Mean,
}

impl Group {
    fn add(&mut self, e: &PitchEvent) {
        self.pitches += 1;
        self.whiffs += usize::from(e.is_whiff());
        self.csw += usize::from(e.is_csw());
        self.contacts += usize::from(e.is_contact());
        self.velo.push(e.release_speed);
        self.spin.push(e.release_spin_rate);
        self.horz.push(e.pfx_x);
        self.vert.push(e.pfx_z);
        self.launch_speed.push(e.launch_speed);
        self.launch_angle.push(e.launch_angle);
    }

    fn rate(&self, hits: usize) -> Option<f64> {
        safe_div(hits as f64, self.pitches as f64)
    }
}

/// Group events by a key, in ascending key order. Events for which `key`
/// returns `None` are skipped.
fn group_by<K, F>(events: &[PitchEvent], key: F) -> BTreeMap<K, Group>
where
    K: Ord,
    F: Fn(&PitchEvent) -> Option<K>,
{
    let mut groups: BTreeMap<K, Group> = BTreeMap::new();
    for e in events {
        if let Some(k) = key(e) {
            groups.entry(k).or_default().add(e);
        }
    }
    groups
}

fn pitch_type_key(e: &PitchEvent) -> Option<String> {
    e.pitch_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Usage share, average velocity and whiff rate per pitch type, most-used
/// first.
pub fn pitch_type_mix(events: &[PitchEvent]) -> Vec<Row> {
    let groups = group_by(events, pitch_type_key);
    let total: usize = groups.values().map(|g| g.pitches).sum();

    let mut ranked: Vec<(String, Group)> = groups.into_iter().collect();
    // Stable: ties keep pitch-type order.
    ranked.sort_by(|a, b| b.1.pitches.cmp(&a.1.pitches));

    ranked
        .into_iter()
        .map(|(pitch_type, g)| {
            Row::new()
                .with("pitch_type", pitch_type)
                .with("usage_pct", safe_div(g.pitches as f64, total as f64))
                .with("avg_velo", g.velo.value())
                .with("whiff_rate", g.rate(g.whiffs))
                .with("count", g.pitches)
        })
        .collect()
}

/// Per-pitch-type outcome profile.
pub fn pitch_type_splits(events: &[PitchEvent]) -> Vec<Row> {
    let groups = group_by(events, pitch_type_key);
    let total: usize = groups.values().map(|g| g.pitches).sum();

    groups
        .into_iter()
        .map(|(pitch_type, g)| {
            Row::new()
                .with("pitch_type", pitch_type)
                .with("count", g.pitches)
                .with("usage", safe_div(g.pitches as f64, total as f64))
                .with("avg_velo", g.velo.value())
                .with("avg_spin", g.spin.value())
                .with("whiff_rate", g.rate(g.whiffs))
                .with("csw", g.rate(g.csw))
                .with("avg_ev", g.launch_speed.value())
        })
        .collect()
}

/// Average horizontal and vertical break per pitch type.
pub fn movement_scatter(events: &[PitchEvent]) -> Vec<Row> {
    group_by(events, pitch_type_key)
        .into_iter()
        .map(|(pitch_type, g)| {
            Row::new()
                .with("pitch_type", pitch_type)
                .with("horz", g.horz.value())
                .with("vert", g.vert.value())
                .with("velo", g.velo.value())
                .with("count", g.pitches)
        })
        .collect()
}

/// Mean velocity per game date and pitch type, in date order.
pub fn velocity_trend(events: &[PitchEvent]) -> Vec<Row> {
    group_by(events, |e| pitch_type_key(e).map(|t| (e.game_date, t)))
        .into_iter()
        .map(|((date, pitch_type), g)| {
            Row::new()
                .with("date", date_text(date))
                .with("pitch_type", pitch_type)
                .with("velo", g.velo.value())
        })
        .collect()
}

/// Outcomes against left- and right-handed batters.
pub fn handedness_splits(events: &[PitchEvent]) -> Vec<Row> {
    let hand = |e: &PitchEvent| {
        e.stand
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    group_by(events, hand)
        .into_iter()
        .map(|(handedness, g)| {
            Row::new()
                .with("handedness", handedness)
                .with("pitches", g.pitches)
                .with("whiff_rate", g.rate(g.whiffs))
                .with("contact_rate", g.rate(g.contacts))
                .with("avg_velo", g.velo.value())
                .with("avg_ev", g.launch_speed.value())
        })
        .collect()
}

/// One row per game, in date order.
pub fn game_log(events: &[PitchEvent]) -> Vec<Row> {
    group_by(events, |e| Some((e.game_date, e.game_pk)))
        .into_iter()
        .map(|((date, game_pk), g)| {
            Row::new()
                .with("game_pk", game_pk)
                .with("date", date_text(date))
                .with("pitches", g.pitches)
                .with("whiffs", g.whiffs)
                .with("contacts", g.contacts)
                .with("avg_velo", g.velo.value())
                .with("avg_launch_speed", g.launch_speed.value())
                .with("avg_launch_angle", g.launch_angle.value())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
