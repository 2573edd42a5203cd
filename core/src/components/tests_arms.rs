use std::sync::Arc;

use serde_json::{json, Value};

use crate::components::{build_from_raw, BuildOutput};
use crate::config::PresetCatalog;
use crate::diagnostics::{BuildContext, MemorySink};

fn build(raw: Value) -> BuildOutput {
    build_from_raw(&raw, None, None, &PresetCatalog::default(), &BuildContext::noop()).unwrap()
}

#[test]
fn test_no_arms_no_geometry() {
    let output = build(json!({}));
    assert!(output.plan.primitive("left_arm_frame").is_none());
    assert!(output.plan.anchor("arm_left_zone").is_none());
}

#[test]
fn test_box_arms_both_sides() {
    let output = build(json!({ "arms": { "type": "both", "width_mm": 120.0 } }));
    let left = output.plan.primitive("left_arm_frame").unwrap();
    let right = output.plan.primitive("right_arm_frame").unwrap();
    assert_eq!(left.location_mm[0], -960.0);
    assert_eq!(right.location_mm[0], 960.0);
    // height = max(2*35, 0.65*440) = 286, centered above the frame top.
    assert_eq!(left.dimensions_mm, [120.0, 600.0, 286.0]);
    assert_eq!(left.location_mm[2], 405.0 + 143.0);

    let zone = output.plan.anchor("arm_left_zone").unwrap();
    assert_eq!(zone.location_mm, [-960.0, 0.0, 440.0]);
}

#[test]
fn test_single_arm_only_builds_one_side() {
    let output = build(json!({ "arms": { "type": "right", "width_mm": 100.0 } }));
    assert!(output.plan.primitive("right_arm_frame").is_some());
    assert!(output.plan.primitive("left_arm_frame").is_none());
    assert!(output.plan.anchor("arm_right_zone").is_some());
    assert!(output.plan.anchor("arm_left_zone").is_none());
}

#[test]
fn test_open_frame_arm_has_five_members_per_side() {
    let output = build(json!({
        "arms": { "type": "both", "width_mm": 140.0, "profile": "frame_box_open" },
    }));
    let members = ["inner_post", "back_post", "top_rail", "cap", "outer_rail"];
    for side in ["left", "right"] {
        for member in members {
            assert!(
                output.plan.primitive(&format!("arm_{side}_{member}")).is_some(),
                "missing arm_{side}_{member}"
            );
        }
    }
    let arm_count = output
        .plan
        .primitives
        .iter()
        .filter(|p| p.name.starts_with("arm_"))
        .count();
    assert_eq!(arm_count, 10);
    assert!(output.plan.primitive("left_arm_frame").is_none());
}

#[test]
fn test_open_frame_sides_mirror_exactly() {
    let output = build(json!({
        "arms": { "type": "both", "width_mm": 140.0, "profile": "scandi_frame" },
    }));
    for member in ["inner_post", "back_post", "top_rail", "cap", "outer_rail"] {
        let left = output.plan.primitive(&format!("arm_left_{member}")).unwrap();
        let right = output.plan.primitive(&format!("arm_right_{member}")).unwrap();
        assert_eq!(left.location_mm[0], -right.location_mm[0], "{member} x");
        assert_eq!(left.location_mm[1], right.location_mm[1], "{member} y");
        assert_eq!(left.location_mm[2], right.location_mm[2], "{member} z");
        assert_eq!(left.dimensions_mm, right.dimensions_mm, "{member} dims");
    }
}

#[test]
fn test_strategy_selection_reported() {
    let sink = Arc::new(MemorySink::new());
    let ctx = BuildContext::new(sink.clone());
    let raw = json!({ "arms": { "type": "both" } });
    build_from_raw(&raw, None, None, &PresetCatalog::default(), &ctx).unwrap();
    let events = sink.drain();
    assert!(events
        .iter()
        .any(|e| e.code == "STRATEGY_SELECTED" && e.path == "arms.profile"));
}
