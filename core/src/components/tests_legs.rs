use serde_json::{json, Value};

use crate::components::{build_from_raw, BuildOutput};
use crate::config::PresetCatalog;
use crate::diagnostics::BuildContext;
use crate::plan::Shape;

fn build(raw: Value) -> BuildOutput {
    build_from_raw(&raw, None, None, &PresetCatalog::default(), &BuildContext::noop()).unwrap()
}

#[test]
fn test_four_legs_at_frame_corners() {
    let output = build(json!({}));
    // Corner insets: half a frame thickness from each outer face.
    let expected = [
        (-882.5, -282.5),
        (882.5, -282.5),
        (-882.5, 282.5),
        (882.5, 282.5),
    ];
    for (i, (x, y)) in expected.iter().enumerate() {
        let leg = output.plan.primitive(&format!("leg_{}", i + 1)).unwrap();
        assert_eq!(leg.location_mm[0], *x);
        assert_eq!(leg.location_mm[1], *y);
        // Hung from the frame bottom at 370, half the 160 height down.
        assert_eq!(leg.location_mm[2], 290.0);
        assert_eq!(leg.dimensions_mm, [35.0, 35.0, 160.0]);
        assert_eq!(leg.shape, Shape::Cube);
        // Point anchors share the leg centers.
        let point = output.plan.anchor(&format!("leg_point_{}", i + 1)).unwrap();
        assert_eq!(point.location_mm[2], 290.0);
    }
    assert!(output.plan.primitive("leg_5").is_none());
}

#[test]
fn test_arms_push_legs_outward() {
    let output = build(json!({ "arms": { "type": "both", "width_mm": 120.0 } }));
    let leg = output.plan.primitive("leg_2").unwrap();
    // total width 2040 -> outer face at 1020.
    assert_eq!(leg.location_mm[0], 1020.0 - 17.5);
}

#[test]
fn test_cylindrical_legs_carry_params() {
    let output = build(json!({
        "legs": { "family": "cylindrical", "height_mm": 120.0, "params": { "radius_mm": 25.0 } },
    }));
    let leg = output.plan.primitive("leg_1").unwrap();
    assert_eq!(leg.shape, Shape::Cylindrical);
    assert_eq!(leg.params.get("radius_mm"), Some(&25.0));
    assert_eq!(leg.dimensions_mm[2], 120.0);
}

#[test]
fn test_block_legs_ignore_params() {
    let output = build(json!({
        "legs": { "family": "block", "params": { "radius_mm": 25.0 } },
    }));
    let leg = output.plan.primitive("leg_1").unwrap();
    assert!(leg.params.is_empty());
}

#[test]
fn test_unknown_family_passes_through() {
    let output = build(json!({ "legs": { "family": "hairpin_v2" } }));
    let leg = output.plan.primitive("leg_1").unwrap();
    assert_eq!(leg.shape, Shape::Passthrough("hairpin_v2".into()));
}

#[test]
fn test_leg_height_clamped() {
    let output = build(json!({ "legs": { "height_mm": 800.0 } }));
    let leg = output.plan.primitive("leg_1").unwrap();
    assert_eq!(leg.dimensions_mm[2], 260.0);
}
