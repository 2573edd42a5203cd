//! Bounded config autofix: turn validation problems into small, recorded
//! config patches and rebuild until clean or out of iterations.
//!
//! Patches only ever touch the raw config document. The engine never edits
//! a plan directly, so every fix stays reproducible from config alone.

mod engine;

pub use engine::{AutofixEngine, AutofixOptions, AutofixReport, IterationReport};

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::config::{coerce_or, get_path, RawConfig};
use crate::geometry::{clamp, Axis};
use crate::metrics::{
    OverlapPair, SceneMetrics, PAIR_BACK_SLATS_VS_FRAME, PAIR_SLATS_VS_ARMS, PAIR_SLATS_VS_FRAME,
};
use crate::validate::{
    Problem, BACK_SLATS_NOT_BENT, OVERLAP_BACK_SLATS_FRAME, OVERLAP_SLATS_ARMS,
    OVERLAP_SLATS_FRAME, SLATS_NOT_BENT,
};

/// One recorded config change.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Patch {
    pub path: String,
    pub old_value: Value,
    pub new_value: Value,
    pub reason: String,
}

/// Set a dotted path on a config copy, creating intermediate objects.
/// Returns `None` when the value is already equal.
pub fn set_patch(config: &mut Value, path: &str, new_value: Value, reason: &str) -> Option<Patch> {
    let old_value = get_path(config, path).cloned().unwrap_or(Value::Null);
    if old_value == new_value {
        return None;
    }

    let keys: Vec<&str> = path.split('.').collect();
    let mut node = config;
    for key in &keys[..keys.len() - 1] {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let map = node.as_object_mut()?;
        node = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()?
        .insert(keys[keys.len() - 1].to_string(), new_value.clone());

    Some(Patch {
        path: path.to_string(),
        old_value,
        new_value,
        reason: reason.to_string(),
    })
}

/// Per-code cursor into the ordered strategy lists. The engine advances a
/// cursor when the targeted metric stopped improving.
pub type StrategyCursor = BTreeMap<String, usize>;

const SAFETY_MARGIN_MM: f64 = 2.0;
const DELTA_MIN_MM: f64 = 1.0;
const DELTA_MAX_MM: f64 = 200.0;
const ARC_STEP_MM: f64 = 5.0;
const IMPROVEMENT_EPS_MM3: f64 = 1.0;

fn overlap_pair_key(code: &str) -> Option<&'static str> {
    match code {
        OVERLAP_SLATS_FRAME => Some(PAIR_SLATS_VS_FRAME),
        OVERLAP_SLATS_ARMS => Some(PAIR_SLATS_VS_ARMS),
        OVERLAP_BACK_SLATS_FRAME => Some(PAIR_BACK_SLATS_VS_FRAME),
        _ => None,
    }
}

/// Config fields targeted for an overlap code on a given push axis, in
/// preference order.
fn overlap_strategies(code: &str, axis: Axis) -> &'static [&'static str] {
    match (code, axis) {
        (OVERLAP_SLATS_FRAME, Axis::X) => &["slats.margin_x_mm", "slats.rail_inset_mm"],
        (OVERLAP_SLATS_FRAME, Axis::Y) => &["slats.margin_y_mm"],
        (OVERLAP_SLATS_FRAME, Axis::Z) => &["slats.clearance_mm", "slats.mount_offset_mm"],
        (OVERLAP_SLATS_ARMS, Axis::X) => &["slats.margin_x_mm"],
        (OVERLAP_SLATS_ARMS, Axis::Y) => &["slats.margin_y_mm"],
        (OVERLAP_SLATS_ARMS, Axis::Z) => &["slats.clearance_mm"],
        (OVERLAP_BACK_SLATS_FRAME, Axis::X) => &["back_support.margin_x_mm"],
        (OVERLAP_BACK_SLATS_FRAME, Axis::Y) => &["back_support.rail_inset_mm"],
        (OVERLAP_BACK_SLATS_FRAME, Axis::Z) => &["back_support.margin_z_mm"],
        _ => &[],
    }
}

fn field_default(path: &str) -> f64 {
    match path {
        "slats.margin_x_mm" | "back_support.margin_x_mm" => 40.0,
        "slats.margin_y_mm" | "back_support.margin_z_mm" => 30.0,
        _ => 0.0,
    }
}

/// Pick the pair a fix should target: largest intersection volume.
fn worst_pair<'m>(metrics: &'m SceneMetrics, pair_key: &str) -> Option<&'m OverlapPair> {
    let overlap = metrics.overlap(pair_key)?;
    overlap
        .pairs
        .iter()
        .max_by(|a, b| a.volume_mm3.total_cmp(&b.volume_mm3))
        .or_else(|| overlap.pairs.first())
}

/// Push direction for a pair without a usable MTV: members named for the
/// left side push negative, everything else positive.
fn naming_sign(pair: &OverlapPair) -> f64 {
    if pair.right.contains("rail_left")
        || pair.right.ends_with("_left")
        || pair.left.ends_with("_left")
    {
        -1.0
    } else {
        1.0
    }
}

/// Compute one round of patches for the given problems. Each problem code
/// is handled at most once per call. `prev_metrics` carries measurements
/// from before the previous round; a strategy whose targeted overlap failed
/// to shrink by at least one cubic millimetre is abandoned and the next
/// strategy on its list is tried.
pub fn fix(
    config: &RawConfig,
    problems: &[Problem],
    metrics: &SceneMetrics,
    prev_metrics: Option<&SceneMetrics>,
    cursor: &mut StrategyCursor,
) -> (RawConfig, Vec<Patch>) {
    let mut patched = config.clone();
    let mut patches = Vec::new();
    let mut handled: Vec<&str> = Vec::new();

    for problem in problems {
        let code = problem.code.as_str();
        if handled.contains(&code) {
            continue;
        }
        handled.push(code);

        match code {
            SLATS_NOT_BENT => {
                let depth = coerce_or(get_path(&patched, "seat_depth_mm"), 600.0);
                let margin_y = coerce_or(get_path(&patched, "slats.margin_y_mm"), 30.0);
                let slat_length = (depth - 2.0 * margin_y).max(1.0);
                let old = coerce_or(get_path(&patched, "slats.arc_height_mm"), 0.0);
                let new = (old + ARC_STEP_MM).min(slat_length / 2.0);
                if new > old {
                    patches.extend(set_patch(
                        &mut patched,
                        "slats.arc_height_mm",
                        json!(new),
                        "raise seat slat arc toward a measurable bend",
                    ));
                }
            }
            BACK_SLATS_NOT_BENT => {
                let back_height =
                    coerce_or(get_path(&patched, "back_support.height_above_seat_mm"), 420.0);
                let old = coerce_or(get_path(&patched, "back_support.slats.arc_height_mm"), 0.0);
                let new = (old + ARC_STEP_MM).min(back_height / 2.0);
                if new > old {
                    patches.extend(set_patch(
                        &mut patched,
                        "back_support.slats.arc_height_mm",
                        json!(new),
                        "raise back slat arc toward a measurable bend",
                    ));
                }
            }
            _ => {
                let Some(pair_key) = overlap_pair_key(code) else {
                    continue;
                };
                if let Some(prev) = prev_metrics {
                    let before = prev.overlap_total(pair_key);
                    let now = metrics.overlap_total(pair_key);
                    if before > 0.0 && before - now < IMPROVEMENT_EPS_MM3 {
                        *cursor.entry(code.to_string()).or_insert(0) += 1;
                    }
                }
                let Some(pair) = worst_pair(metrics, pair_key) else {
                    continue;
                };
                let (axis, depth, sign) = match &pair.mtv {
                    Some(mtv) => (mtv.axis, mtv.depth_mm, mtv.sign),
                    None => {
                        let min_span = pair
                            .bbox
                            .spans()
                            .into_iter()
                            .fold(f64::INFINITY, f64::min);
                        (Axis::Z, min_span, naming_sign(pair))
                    }
                };
                let strategies = overlap_strategies(code, axis);
                let index = cursor.get(code).copied().unwrap_or(0);
                let Some(field) = strategies.get(index) else {
                    continue;
                };
                let delta = clamp(depth + SAFETY_MARGIN_MM, DELTA_MIN_MM, DELTA_MAX_MM);
                let old = coerce_or(get_path(&patched, field), field_default(field));
                let direction = if sign < 0.0 { "negative" } else { "positive" };
                let reason = format!(
                    "separate {} and {} along {} ({} side, {:.1}mm)",
                    pair.left, pair.right, axis, direction, delta
                );
                patches.extend(set_patch(&mut patched, field, json!(old + delta), &reason));
            }
        }
    }

    (patched, patches)
}
