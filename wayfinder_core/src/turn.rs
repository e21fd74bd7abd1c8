// Turn instructions derived from a route.
//
// This sits downstream of route search and consumes only `RouteResult`
// positions plus a heading; it holds no graph state. Bearings are measured
// on the floor plane in degrees clockwise from +Z (see
// `Vec3::horizontal_bearing_to`). A delta is `target - heading` folded into
// `(-180, 180]`; positive means turn right.
//
// Bands on |delta| come from `TurnConfig`: straight below `straight_deg`,
// slight below `slight_deg`, sharp below `sharp_deg`, U-turn beyond.
//
// `TurnClassifier` is the live version: fed the agent's heading over and
// over while it walks a leg, it holds its last answer until the delta leaves
// that answer's band by more than `hysteresis_deg`. Without this, a heading
// jittering around a band edge would flicker between two instructions.
//
// `instructions_for_route` is the one-shot version for a whole route: each
// leg is classified against the previous leg's bearing (the first against
// the live heading), with no hysteresis.

use crate::config::TurnConfig;
use crate::route::RouteResult;
use crate::types::Vec3;
use serde::{Deserialize, Serialize};

/// Horizontal leg length below which a leg has no meaningful bearing.
const MIN_LEG_LENGTH: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Straight,
    SlightLeft,
    SlightRight,
    SharpLeft,
    SharpRight,
    UTurn,
}

/// Fold `target - heading` into `(-180, 180]`.
pub fn bearing_delta(heading_deg: f32, target_deg: f32) -> f32 {
    let d = (target_deg - heading_deg).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Classify a bearing delta with no memory.
pub fn classify(delta: f32, config: &TurnConfig) -> TurnKind {
    let mag = delta.abs();
    let right = delta > 0.0;
    if mag < config.straight_deg {
        TurnKind::Straight
    } else if mag < config.slight_deg {
        if right { TurnKind::SlightRight } else { TurnKind::SlightLeft }
    } else if mag < config.sharp_deg {
        if right { TurnKind::SharpRight } else { TurnKind::SharpLeft }
    } else {
        TurnKind::UTurn
    }
}

/// Whether `delta` still lies inside `kind`'s band widened by `margin`.
fn within_band(kind: TurnKind, delta: f32, config: &TurnConfig, margin: f32) -> bool {
    let (s, l, h) = (config.straight_deg, config.slight_deg, config.sharp_deg);
    let in_range = |lo: f32, hi: f32| lo - margin <= delta && delta < hi + margin;
    match kind {
        TurnKind::Straight => delta.abs() < s + margin,
        TurnKind::SlightRight => in_range(s, l),
        TurnKind::SlightLeft => in_range(-l, -s),
        TurnKind::SharpRight => in_range(l, h),
        TurnKind::SharpLeft => in_range(-h, -l),
        TurnKind::UTurn => delta.abs() >= h - margin,
    }
}

/// Same magnitude band, opposite sides.
fn is_side_flip(a: TurnKind, b: TurnKind) -> bool {
    use TurnKind::*;
    matches!(
        (a, b),
        (SlightLeft, SlightRight)
            | (SlightRight, SlightLeft)
            | (SharpLeft, SharpRight)
            | (SharpRight, SharpLeft)
    )
}

/// Hysteresis turn classifier for a live heading.
#[derive(Clone, Debug)]
pub struct TurnClassifier {
    config: TurnConfig,
    held: Option<TurnKind>,
}

impl TurnClassifier {
    pub fn new(config: TurnConfig) -> Self {
        Self { config, held: None }
    }

    /// The instruction currently held, if any update has happened.
    pub fn held(&self) -> Option<TurnKind> {
        self.held
    }

    /// Forget the held instruction (e.g. when the agent starts a new leg).
    pub fn reset(&mut self) {
        self.held = None;
    }

    /// Classify a bearing delta, keeping the held instruction unless the
    /// delta has cleared its band by the hysteresis margin. A left/right
    /// flip within one band also needs |delta| past the straight threshold
    /// plus the margin.
    pub fn classify_delta(&mut self, delta: f32) -> TurnKind {
        let raw = classify(delta, &self.config);
        let margin = self.config.hysteresis_deg;
        let next = match self.held {
            Some(held) if held != raw => {
                let holds = if is_side_flip(held, raw) {
                    delta.abs() < self.config.straight_deg + margin
                } else {
                    within_band(held, delta, &self.config, margin)
                };
                if holds { held } else { raw }
            }
            _ => raw,
        };
        self.held = Some(next);
        next
    }

    /// Classify the leg `from -> to` for an agent facing `heading_deg`.
    pub fn update(&mut self, heading_deg: f32, from: Vec3, to: Vec3) -> TurnKind {
        let target = from.horizontal_bearing_to(to);
        self.classify_delta(bearing_delta(heading_deg, target))
    }
}

/// One instruction per route leg.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInstruction {
    /// 1-based index of the step this leg leads to.
    pub step_index: usize,
    pub target_name: String,
    pub kind: TurnKind,
    /// Signed bearing change in degrees (positive = right).
    pub bearing_delta: f32,
    /// Leg length in meters.
    pub distance: f32,
}

/// Turn instructions for every leg of `route`, starting from an agent
/// facing `heading_deg`.
pub fn instructions_for_route(
    route: &RouteResult,
    heading_deg: f32,
    config: &TurnConfig,
) -> Vec<TurnInstruction> {
    let mut heading = heading_deg;
    route
        .steps
        .windows(2)
        .map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);
            let flat = Vec3::new(to.position.x, from.position.y, to.position.z);
            let (kind, delta) = if from.position.distance(flat) < MIN_LEG_LENGTH {
                (TurnKind::Straight, 0.0)
            } else {
                let bearing = from.position.horizontal_bearing_to(to.position);
                let delta = bearing_delta(heading, bearing);
                heading = bearing;
                (classify(delta, config), delta)
            };
            TurnInstruction {
                step_index: to.index,
                target_name: to.name.clone(),
                kind,
                bearing_delta: delta,
                distance: from.position.distance(to.position),
            }
        })
        .collect()
}
