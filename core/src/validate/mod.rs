//! Plan validation: turns scene metrics into scored problems.
//!
//! The validator only reads; it never mutates the plan or the config. Each
//! check is gated on what the raw document asked for, so a sofa without
//! slats is never penalized for slat geometry it does not have.

use serde_json::{json, Value};

use crate::config::{coerce_or, get_path, RawConfig};
use crate::diagnostics::Severity;
use crate::metrics::{
    OverlapPair, SceneMetrics, GROUP_BACK_SLATS, GROUP_FRAME, GROUP_SLATS,
    PAIR_BACK_SLATS_VS_FRAME, PAIR_SLATS_VS_ARMS, PAIR_SLATS_VS_FRAME,
};

pub const SLATS_NOT_BENT: &str = "SLATS_NOT_BENT";
pub const BACK_SLATS_NOT_BENT: &str = "BACK_SLATS_NOT_BENT";
pub const OVERLAP_SLATS_FRAME: &str = "OVERLAP_SLATS_FRAME";
pub const OVERLAP_BACK_SLATS_FRAME: &str = "OVERLAP_BACK_SLATS_FRAME";
pub const OVERLAP_SLATS_ARMS: &str = "OVERLAP_SLATS_ARMS";
pub const LOW_CLEARANCE_SLATS_FRAME: &str = "LOW_CLEARANCE_SLATS_FRAME";

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateOptions {
    /// Minimum bbox span change that counts as a real bend.
    pub bend_eps_mm: f64,
    /// Minimum vertical gap between the slat bed and frame members.
    pub clearance_eps_mm: f64,
    /// Intersection volume below this is treated as numeric noise.
    pub hard_overlap_eps_mm3: f64,
    /// Extra penetration allowed at designed joint contacts.
    pub joint_allowance_mm: f64,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            bend_eps_mm: 2.0,
            clearance_eps_mm: 3.0,
            hard_overlap_eps_mm3: 10.0,
            joint_allowance_mm: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Problem {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Validation {
    pub score: f64,
    pub problems: Vec<Problem>,
    pub problem_count: usize,
    pub severity_max: i64,
    pub penalty: f64,
}

impl Validation {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn problem(&self, code: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.code == code)
    }
}

pub fn validate(raw: &RawConfig, metrics: &SceneMetrics, opts: &ValidateOptions) -> Validation {
    let mut problems = Vec::new();

    let slats_enabled = gate(raw, "slats.enabled", metrics, GROUP_SLATS);
    let back_slats_enabled = match get_path(raw, "back_support.mode") {
        Some(Value::String(mode)) => mode.trim().eq_ignore_ascii_case("slats"),
        _ => metrics
            .group(GROUP_BACK_SLATS)
            .map(|g| g.count > 0)
            .unwrap_or(false),
    };

    if slats_enabled {
        let arc = coerce_or(get_path(raw, "slats.arc_height_mm"), 0.0);
        check_bent(metrics, GROUP_SLATS, arc, SLATS_NOT_BENT, opts, &mut problems);

        let mount_offset = coerce_or(get_path(raw, "slats.mount_offset_mm"), 0.0);
        let joint_limit = opts.clearance_eps_mm + mount_offset + opts.joint_allowance_mm;
        check_overlap(
            metrics,
            PAIR_SLATS_VS_FRAME,
            OVERLAP_SLATS_FRAME,
            opts,
            joint_limit,
            |pair| pair.right.starts_with("rail_") || pair.right.starts_with("beam_cross_"),
            &mut problems,
        );

        let arms_total = metrics.overlap_total(PAIR_SLATS_VS_ARMS);
        if arms_total > opts.hard_overlap_eps_mm3 {
            let pairs = metrics
                .overlap(PAIR_SLATS_VS_ARMS)
                .map(|m| m.pairs.as_slice())
                .unwrap_or(&[]);
            problems.push(Problem {
                code: OVERLAP_SLATS_ARMS.into(),
                severity: Severity::Error,
                message: "seat slats intersect arm geometry".into(),
                details: json!({
                    "total_volume": arms_total,
                    "eps": opts.hard_overlap_eps_mm3,
                    "pairs_top": pairs_top(pairs, 10),
                    "offenders": offenders(pairs),
                }),
            });
        }

        if metrics.overlap_total(PAIR_SLATS_VS_FRAME) == 0.0 {
            if let (Some(slats), Some(frame)) =
                (metrics.group(GROUP_SLATS), metrics.group(GROUP_FRAME))
            {
                let gap = slats.bbox.z_clearance(&frame.bbox);
                if gap < opts.clearance_eps_mm {
                    problems.push(Problem {
                        code: LOW_CLEARANCE_SLATS_FRAME.into(),
                        severity: Severity::Warn,
                        message: "seat slats sit close to frame members".into(),
                        details: json!({
                            "z_clearance_mm": gap,
                            "eps": opts.clearance_eps_mm,
                        }),
                    });
                }
            }
        }
    }

    if back_slats_enabled {
        let arc = coerce_or(get_path(raw, "back_support.slats.arc_height_mm"), 0.0);
        check_bent(
            metrics,
            GROUP_BACK_SLATS,
            arc,
            BACK_SLATS_NOT_BENT,
            opts,
            &mut problems,
        );

        let back_thickness = coerce_or(get_path(raw, "back_support.thickness_mm"), 90.0);
        let frame_thickness = coerce_or(get_path(raw, "frame.thickness_mm"), 35.0);
        let joint_limit =
            (back_thickness - frame_thickness).max(0.0) + opts.joint_allowance_mm;
        check_overlap(
            metrics,
            PAIR_BACK_SLATS_VS_FRAME,
            OVERLAP_BACK_SLATS_FRAME,
            opts,
            joint_limit,
            |pair| pair.right == "back_rail_left" || pair.right == "back_rail_right",
            &mut problems,
        );
    }

    let penalty: f64 = problems
        .iter()
        .map(|p| match p.severity {
            Severity::Fatal => 0.30,
            Severity::Error => 0.10,
            Severity::Warn => 0.02,
            Severity::Info => 0.0,
        })
        .sum();
    let score = round6((1.0 - penalty.min(1.0)).max(0.0));
    let severity_max = problems
        .iter()
        .map(|p| p.severity.as_i64())
        .max()
        .unwrap_or(0);

    Validation {
        score,
        problem_count: problems.len(),
        severity_max,
        penalty: round6(penalty),
        problems,
    }
}

fn round6(value: f64) -> f64 {
    crate::plan::round6(value)
}

/// Gate a check on a raw boolean flag, falling back to whether the group
/// produced any members when the flag is absent.
fn gate(raw: &RawConfig, flag_path: &str, metrics: &SceneMetrics, group: &str) -> bool {
    match get_path(raw, flag_path) {
        Some(value) => coerce_or(Some(value), false),
        None => metrics.group(group).map(|g| g.count > 0).unwrap_or(false),
    }
}

fn check_bent(
    metrics: &SceneMetrics,
    group: &str,
    arc_height_mm: f64,
    code: &str,
    opts: &ValidateOptions,
    problems: &mut Vec<Problem>,
) {
    if arc_height_mm <= 0.0 {
        return;
    }
    let Some(group_metrics) = metrics.group(group) else {
        return;
    };
    if group_metrics.count == 0 {
        return;
    }

    let mut count_bent = 0usize;
    let mut deltas: Vec<(String, f64)> = Vec::new();
    for name in &group_metrics.members {
        let Some(object) = metrics.objects.get(name) else {
            continue;
        };
        let max_delta = object
            .bbox_delta_mm
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        if max_delta >= opts.bend_eps_mm {
            count_bent += 1;
        }
        deltas.push((name.clone(), max_delta));
    }
    if count_bent > 0 {
        return;
    }
    deltas.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    deltas.truncate(5);
    problems.push(Problem {
        code: code.into(),
        severity: Severity::Error,
        message: "arc height requested but no slat shows measurable bend".into(),
        details: json!({
            "count_total": group_metrics.count,
            "count_bent": count_bent,
            "eps": opts.bend_eps_mm,
            "top5": deltas
                .iter()
                .map(|(name, delta)| json!({ "name": name, "max_delta_mm": delta }))
                .collect::<Vec<_>>(),
        }),
    });
}

/// Overlap check with joint-contact filtering: pairs touching a designed
/// joint within the allowance reduce to a low-severity contact note instead
/// of a hard failure.
fn check_overlap(
    metrics: &SceneMetrics,
    pair_key: &str,
    code: &str,
    opts: &ValidateOptions,
    joint_limit_mm: f64,
    is_joint_partner: impl Fn(&OverlapPair) -> bool,
    problems: &mut Vec<Problem>,
) {
    let Some(overlap) = metrics.overlap(pair_key) else {
        return;
    };
    if overlap.pairs.is_empty() {
        return;
    }

    let mut joint_pairs: Vec<&OverlapPair> = Vec::new();
    let mut hard_pairs: Vec<&OverlapPair> = Vec::new();
    for pair in &overlap.pairs {
        let min_span = pair
            .bbox
            .spans()
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        if is_joint_partner(pair) && min_span <= joint_limit_mm {
            joint_pairs.push(pair);
        } else {
            hard_pairs.push(pair);
        }
    }

    let total_volume = overlap.total_volume_mm3;
    let joint_only_volume: f64 = joint_pairs.iter().map(|p| p.volume_mm3).sum();
    let hard_volume = total_volume - joint_only_volume;

    let details = json!({
        "total_volume": total_volume,
        "effective_total_volume": hard_volume,
        "joint_only_volume": joint_only_volume,
        "eps": opts.hard_overlap_eps_mm3,
        "joint_allowance": opts.joint_allowance_mm,
        "pairs_top": pairs_top_ref(&hard_pairs, 10),
        "joint_pairs_top": pairs_top_ref(&joint_pairs, 10),
        "offenders": offenders_ref(&hard_pairs),
        "unique_left_count": unique_count(&hard_pairs, true),
        "unique_right_count": unique_count(&hard_pairs, false),
        "joint_pairs_count": joint_pairs.len(),
    });

    if hard_volume > opts.hard_overlap_eps_mm3 {
        problems.push(Problem {
            code: code.into(),
            severity: Severity::Error,
            message: "overlap with frame geometry beyond joint allowance".into(),
            details,
        });
    } else if !joint_pairs.is_empty() && total_volume > opts.hard_overlap_eps_mm3 {
        problems.push(Problem {
            code: code.into(),
            severity: Severity::Warn,
            message: "joint contact only; no hard overlap".into(),
            details,
        });
    }
}

fn pair_record(pair: &OverlapPair) -> Value {
    let mtv = pair.mtv.as_ref().map(|m| {
        json!({
            "axis": m.axis.to_string(),
            "depth": m.depth_mm,
            "sign": m.sign as i64,
        })
    });
    json!({
        "pair_index": pair.pair_index,
        "left": pair.left,
        "right": pair.right,
        "volume": pair.volume_mm3,
        "mtv": mtv,
    })
}

fn pairs_top(pairs: &[OverlapPair], limit: usize) -> Vec<Value> {
    let mut sorted: Vec<&OverlapPair> = pairs.iter().collect();
    sorted.sort_by(|a, b| b.volume_mm3.total_cmp(&a.volume_mm3));
    sorted.truncate(limit);
    sorted.into_iter().map(pair_record).collect()
}

fn pairs_top_ref(pairs: &[&OverlapPair], limit: usize) -> Vec<Value> {
    let mut sorted: Vec<&OverlapPair> = pairs.to_vec();
    sorted.sort_by(|a, b| b.volume_mm3.total_cmp(&a.volume_mm3));
    sorted.truncate(limit);
    sorted.into_iter().map(pair_record).collect()
}

fn offenders(pairs: &[OverlapPair]) -> Vec<String> {
    let mut names: Vec<String> = pairs
        .iter()
        .flat_map(|p| [p.left.clone(), p.right.clone()])
        .collect();
    names.sort();
    names.dedup();
    names
}

fn offenders_ref(pairs: &[&OverlapPair]) -> Vec<String> {
    let mut names: Vec<String> = pairs
        .iter()
        .flat_map(|p| [p.left.clone(), p.right.clone()])
        .collect();
    names.sort();
    names.dedup();
    names
}

fn unique_count(pairs: &[&OverlapPair], left_side: bool) -> usize {
    let mut names: Vec<&str> = pairs
        .iter()
        .map(|p| if left_side { p.left.as_str() } else { p.right.as_str() })
        .collect();
    names.sort_unstable();
    names.dedup();
    names.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{BuildPlan, Primitive};
    use serde_json::json;

    fn metrics_for(plan: &BuildPlan) -> SceneMetrics {
        SceneMetrics::from_plan(plan)
    }

    #[test]
    fn test_clean_plan_scores_one() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(Primitive::beam("beam_front", [1800.0, 35.0, 35.0], [0.0, 282.5, 387.5]));
        let metrics = metrics_for(&plan);
        let report = validate(&json!({}), &metrics, &ValidateOptions::default());
        assert!(report.is_clean());
        assert_eq!(report.score, 1.0);
        assert_eq!(report.severity_max, 0);
    }

    #[test]
    fn test_unbent_slats_flagged_when_arc_requested() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(Primitive::slat("slat_1", [60.0, 540.0, 12.0], [0.0, 0.0, 420.0]));
        let metrics = metrics_for(&plan);
        let raw = json!({ "slats": { "enabled": true, "arc_height_mm": 12.0 } });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        let problem = report.problem(SLATS_NOT_BENT).unwrap();
        assert_eq!(problem.severity, Severity::Error);
        assert_eq!(problem.details["count_bent"], 0);
        assert_eq!(report.score, 0.9);
    }

    #[test]
    fn test_no_bend_check_without_arc() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(Primitive::slat("slat_1", [60.0, 540.0, 12.0], [0.0, 0.0, 420.0]));
        let metrics = metrics_for(&plan);
        let raw = json!({ "slats": { "enabled": true } });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        assert!(report.problem(SLATS_NOT_BENT).is_none());
    }

    #[test]
    fn test_hard_overlap_is_error() {
        let mut plan = BuildPlan::new();
        // Slat buried 12mm deep into a cross beam along z.
        plan.push_primitive(Primitive::slat("slat_1", [60.0, 540.0, 12.0], [0.0, 0.0, 400.0]));
        plan.push_primitive(Primitive::beam("beam_cross_1", [35.0, 530.0, 35.0], [0.0, 0.0, 400.0]));
        let metrics = metrics_for(&plan);
        let raw = json!({ "slats": { "enabled": true } });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        let problem = report.problem(OVERLAP_SLATS_FRAME).unwrap();
        assert_eq!(problem.severity, Severity::Error);
        assert!(problem.details["effective_total_volume"].as_f64().unwrap() > 10.0);
    }

    #[test]
    fn test_thin_rail_contact_downgrades_to_joint_note() {
        let mut plan = BuildPlan::new();
        // 2mm deep rest of a slat on its rail: a designed joint.
        plan.push_primitive(Primitive::slat("slat_1", [60.0, 540.0, 12.0], [0.0, 0.0, 411.0]));
        plan.push_primitive(Primitive::beam("rail_left", [30.0, 590.0, 30.0], [0.0, 0.0, 392.0]));
        let metrics = metrics_for(&plan);
        let raw = json!({ "slats": { "enabled": true } });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        let problem = report.problem(OVERLAP_SLATS_FRAME).unwrap();
        assert_eq!(problem.severity, Severity::Warn);
        assert_eq!(problem.details["joint_pairs_count"], 1);
        assert_eq!(problem.details["effective_total_volume"], 0.0);
    }

    #[test]
    fn test_slats_vs_arms_overlap_is_error() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(Primitive::slat("slat_1", [60.0, 540.0, 12.0], [880.0, 0.0, 450.0]));
        plan.push_primitive(Primitive::board(
            "left_arm_frame",
            [120.0, 600.0, 300.0],
            [900.0, 0.0, 450.0],
        ));
        let metrics = metrics_for(&plan);
        let raw = json!({ "slats": { "enabled": true } });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        assert!(report.problem(OVERLAP_SLATS_ARMS).is_some());
    }

    #[test]
    fn test_low_clearance_warns() {
        let mut plan = BuildPlan::new();
        // 1mm gap between slat bed and the beam underneath.
        plan.push_primitive(Primitive::slat("slat_1", [60.0, 540.0, 12.0], [0.0, 0.0, 412.0]));
        plan.push_primitive(Primitive::beam("beam_front", [1800.0, 35.0, 35.0], [0.0, 282.5, 387.5]));
        let metrics = metrics_for(&plan);
        let raw = json!({ "slats": { "enabled": true } });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        let problem = report.problem(LOW_CLEARANCE_SLATS_FRAME).unwrap();
        assert_eq!(problem.severity, Severity::Warn);
        assert_eq!(problem.details["z_clearance_mm"], 1.0);
    }

    #[test]
    fn test_score_penalty_saturates() {
        let problems_weight = 0.10 + 0.10 + 0.02;
        assert!((1.0 - problems_weight) > 0.0);
        // Direct check of the clamp: twelve errors exceed a full penalty.
        let penalty: f64 = 12.0 * 0.10;
        assert_eq!((1.0 - penalty.min(1.0)).max(0.0), 0.0);
    }

    #[test]
    fn test_back_slats_gate_reads_mode() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(Primitive::slat("back_slat_1", [35.0, 10.0, 300.0], [0.0, -290.0, 600.0]));
        let metrics = metrics_for(&plan);
        let raw = json!({
            "back_support": { "mode": "slats", "slats": { "arc_height_mm": 8.0 } },
        });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        assert!(report.problem(BACK_SLATS_NOT_BENT).is_some());

        let raw = json!({ "back_support": { "mode": "panel" } });
        let report = validate(&raw, &metrics, &ValidateOptions::default());
        assert!(report.problem(BACK_SLATS_NOT_BENT).is_none());
    }
}
