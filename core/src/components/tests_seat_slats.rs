use serde_json::{json, Value};

use crate::components::{build_from_raw, BuildOutput};
use crate::config::PresetCatalog;
use crate::diagnostics::BuildContext;

fn build(raw: Value) -> BuildOutput {
    build_from_raw(&raw, None, None, &PresetCatalog::default(), &BuildContext::noop()).unwrap()
}

#[test]
fn test_disabled_slats_produce_nothing() {
    let output = build(json!({}));
    assert!(output.plan.primitive("slat_1").is_none());
    assert!(output.plan.anchor("slat_plane_z").is_none());
}

#[test]
fn test_slats_spread_edge_to_edge() {
    let output = build(json!({ "slats": { "enabled": true, "count": 3 } }));
    // usable = 1800 - 2*40 = 1720; span = 1720 - 60 = 1660; step = 830.
    let xs: Vec<f64> = (1..=3)
        .map(|i| output.plan.primitive(&format!("slat_{i}")).unwrap().location_mm[0])
        .collect();
    assert_eq!(xs, vec![-830.0, 0.0, 830.0]);
    assert!(output.plan.primitive("slat_4").is_none());

    let slat = output.plan.primitive("slat_1").unwrap();
    // length = 600 - 2*30.
    assert_eq!(slat.dimensions_mm, [60.0, 540.0, 12.0]);
}

#[test]
fn test_single_slat_centers() {
    let output = build(json!({ "slats": { "enabled": true, "count": 1 } }));
    assert_eq!(output.plan.primitive("slat_1").unwrap().location_mm[0], 0.0);
}

#[test]
fn test_rests_on_plane_height() {
    let output = build(json!({
        "slats": { "enabled": true, "mount_offset_mm": 4.0, "clearance_mm": 2.0 },
    }));
    // base frame top 405 + offset 4 + clearance 2 + half thickness 6.
    let slat = output.plan.primitive("slat_1").unwrap();
    assert_eq!(slat.location_mm[2], 417.0);
    assert_eq!(output.plan.anchor("slat_plane_z").unwrap().location_mm[2], 405.0);
}

#[test]
fn test_centered_mount_height() {
    let output = build(json!({
        "slats": { "enabled": true, "mount_mode": "centered", "clearance_mm": 1.0 },
    }));
    // seat top 440 - half thickness 6 + clearance 1.
    let slat = output.plan.primitive("slat_1").unwrap();
    assert_eq!(slat.location_mm[2], 435.0);
}

#[test]
fn test_rails_under_outer_slats() {
    let output = build(json!({ "slats": { "enabled": true } }));
    let left = output.plan.primitive("rail_left").unwrap();
    let right = output.plan.primitive("rail_right").unwrap();
    // Outermost slat edge at +-860; rail centered half a width inside.
    assert_eq!(left.location_mm[0], -845.0);
    assert_eq!(right.location_mm[0], 845.0);
    // rail length = 600 - 2*5.
    assert_eq!(left.dimensions_mm, [30.0, 590.0, 30.0]);
    // rail top flush with the slat plane.
    assert_eq!(left.location_mm[2], 390.0);
    assert!(output.plan.anchor("rail_left").is_some());
}

#[test]
fn test_rails_skipped_when_spread_too_narrow() {
    let output = build(json!({
        "seat_width_mm": 350.0,
        "seat_count": 1,
        "slats": { "enabled": true, "count": 1, "width_mm": 160.0, "rail_width_mm": 200.0 },
    }));
    assert!(output.plan.primitive("slat_1").is_some());
    assert!(output.plan.primitive("rail_left").is_none());
    assert!(output.plan.primitive("rail_right").is_none());
}

#[test]
fn test_slat_params_carry_arc_settings() {
    let output = build(json!({
        "slats": { "enabled": true, "arc_height_mm": 9.0, "arc_sign": -1.0 },
    }));
    let slat = output.plan.primitive("slat_1").unwrap();
    assert_eq!(slat.params.get("arc_height_mm"), Some(&9.0));
    assert_eq!(slat.params.get("arc_sign"), Some(&-1.0));
}
