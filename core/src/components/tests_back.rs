use serde_json::{json, Value};

use crate::components::back::centers_for_range_test;
use crate::components::{build_from_raw, BuildOutput};
use crate::config::PresetCatalog;
use crate::diagnostics::BuildContext;
use crate::geometry::Aabb;

fn build(raw: Value) -> BuildOutput {
    build_from_raw(&raw, None, None, &PresetCatalog::default(), &BuildContext::noop()).unwrap()
}

fn bbox(output: &BuildOutput, name: &str) -> Aabb {
    let p = output.plan.primitive(name).unwrap();
    Aabb::from_center_dims(p.location_mm, p.dimensions_mm, p.rotation_deg)
}

#[test]
fn test_legacy_back_without_back_support() {
    let output = build(json!({}));
    let board = output.plan.primitive("back_frame").unwrap();
    assert_eq!(board.dimensions_mm, [1800.0, 90.0, 420.0]);
    // Outer seat face -300, minus half the board thickness.
    assert_eq!(board.location_mm, [0.0, -345.0, 650.0]);
    assert!(output.plan.primitive("back_rail_left").is_none());
    assert_eq!(
        output.plan.anchor("back_top_edge_center").unwrap().location_mm[2],
        860.0
    );
    // The rear seat face anchor sits at the base frame band center.
    let rear = output.plan.anchor("y_back_seat").unwrap();
    assert_eq!(rear.location_mm[1], -300.0);
    assert_eq!(rear.location_mm[2], 387.5);
}

#[test]
fn test_panel_back_rails_and_panel() {
    let output = build(json!({ "back_support": { "mode": "panel" } }));
    let left = output.plan.primitive("back_rail_left").unwrap();
    let right = output.plan.primitive("back_rail_right").unwrap();
    assert_eq!(left.location_mm[0], -882.5);
    assert_eq!(right.location_mm[0], 882.5);
    // Height spans base frame top 405 to 440+420.
    assert_eq!(left.dimensions_mm[2], 455.0);
    assert_eq!(left.location_mm[2], 405.0 + 227.5);
    // Rails hang behind the attachment plane at -300.
    assert_eq!(left.location_mm[1], -317.5);

    let panel = output.plan.primitive("back_panel").unwrap();
    assert_eq!(panel.dimensions_mm, [1800.0, 90.0, 455.0]);
    assert_eq!(panel.location_mm[1], -317.5);
    assert!(output.plan.primitive("back_frame").is_none());
}

#[test]
fn test_micro_offset_clamped() {
    let output = build(json!({ "back_support": { "mode": "panel", "offset_y_mm": 200.0 } }));
    // Resolver allows 200 but attachment clamps the nudge to 80.
    let left = output.plan.primitive("back_rail_left").unwrap();
    assert_eq!(left.location_mm[1], -300.0 + 80.0 - 17.5);
}

#[test]
fn test_vertical_slat_grid() {
    let output = build(json!({ "back_support": { "mode": "slats" } }));
    assert!(output.plan.primitive("back_rail_bottom").is_some());
    assert!(output.plan.primitive("back_rail_top").is_some());
    assert!(output.plan.primitive("back_rail_center").is_none());
    for i in 1..=10 {
        assert!(output.plan.primitive(&format!("back_slat_{i}")).is_some());
    }
    assert!(output.plan.primitive("back_slat_11").is_none());
    assert!(output.plan.anchor("back_slat_plane_y").is_some());
    assert!(output.plan.anchor("back_frame_inner_rect_min").is_some());
}

#[test]
fn test_bottom_rail_uses_reduced_height() {
    let output = build(json!({
        "back_support": { "mode": "slats", "rail_height_mm": 40.0 },
    }));
    let bottom = output.plan.primitive("back_rail_bottom").unwrap();
    let top = output.plan.primitive("back_rail_top").unwrap();
    assert_eq!(bottom.dimensions_mm[2], 20.0);
    assert_eq!(top.dimensions_mm[2], 40.0);
    // Bottom rail sits on the base frame top.
    assert_eq!(bottom.location_mm[2], 405.0 + 10.0);
}

#[test]
fn test_center_post_splits_grid_without_crossing_members() {
    let output = build(json!({
        "back_support": {
            "mode": "slats",
            "center_post": { "enabled": true },
        },
    }));
    let post = output.plan.primitive("back_rail_center").unwrap();
    assert_eq!(post.location_mm[0], 0.0);

    let post_box = bbox(&output, "back_rail_center");
    let slat_names: Vec<String> = output
        .plan
        .primitives
        .iter()
        .filter(|p| p.name.starts_with("back_slat_"))
        .map(|p| p.name.clone())
        .collect();
    assert!(!slat_names.is_empty());
    // Split layout: half the slats on each side, none touching the post.
    let mut left = 0;
    let mut right = 0;
    for name in &slat_names {
        let b = bbox(&output, name);
        assert_eq!(post_box.overlap_volume(&b), 0.0, "{name} crosses the post");
        if b.center().x < 0.0 {
            left += 1;
        } else {
            right += 1;
        }
    }
    assert_eq!(left, 5);
    assert_eq!(right, 5);
}

#[test]
fn test_horizontal_rows_use_side_names_when_split() {
    let output = build(json!({
        "style": "scandi",
        "back_support": { "slats": { "count": 4 } },
    }));
    assert!(output.plan.primitive("back_slat_left_1").is_some());
    assert!(output.plan.primitive("back_slat_right_1").is_some());
    assert!(output.plan.primitive("back_slat_1").is_none());
}

#[test]
fn test_split_rows_fall_back_to_running_names_when_post_swallows_window() {
    // A post wide enough to close both side windows leaves one full-width
    // segment, so the rows drop the sided naming.
    let output = build(json!({
        "style": "scandi",
        "back_support": {
            "center_post_width_mm": 2000.0,
            "slats": { "count": 3 },
        },
    }));
    assert!(output.plan.primitive("back_slat_left_1").is_none());
    assert!(output.plan.primitive("back_slat_right_1").is_none());
    for i in 1..=3 {
        assert!(output.plan.primitive(&format!("back_slat_{i}")).is_some());
    }
}

#[test]
fn test_horizontal_rows_full_layout_running_names() {
    let output = build(json!({
        "back_support": {
            "mode": "slats",
            "slats": { "orientation": "horizontal", "layout": "full", "count": 3 },
        },
    }));
    for i in 1..=3 {
        let slat = output.plan.primitive(&format!("back_slat_{i}")).unwrap();
        // Rows run the full inner width.
        assert!(slat.dimensions_mm[0] > 1000.0);
        assert_eq!(slat.params.get("row_index"), Some(&(i as f64)));
    }
}

#[test]
fn test_horizontal_row_count_reduced_to_fit() {
    let output = build(json!({
        "back_support": {
            "mode": "slats",
            "height_above_seat_mm": 260.0,
            "slats": { "orientation": "horizontal", "layout": "full", "count": 40, "width_mm": 60.0 },
        },
    }));
    let rows = output
        .plan
        .primitives
        .iter()
        .filter(|p| p.name.starts_with("back_slat_"))
        .count();
    assert!(rows >= 2);
    assert!(rows < 40);
}

#[test]
fn test_straps_spread_between_margins() {
    let output = build(json!({ "back_support": { "mode": "straps" } }));
    for i in 1..=6 {
        let strap = output.plan.primitive(&format!("back_strap_{i}")).unwrap();
        assert_eq!(strap.dimensions_mm, [1800.0, 6.0, 30.0]);
    }
    assert!(output.plan.primitive("back_strap_7").is_none());
    let first = output.plan.primitive("back_strap_1").unwrap();
    // First strap one margin above the frame base.
    assert_eq!(first.location_mm[2], 435.0);
}

#[test]
fn test_zone_anchors_always_present() {
    for raw in [json!({}), json!({ "back_support": { "mode": "slats" } })] {
        let output = build(raw);
        for name in [
            "back_zone",
            "seat_rear_rail",
            "seat_back_rail_center_y",
            "seat_back_plane",
            "back_bottom_edge_center",
            "back_top_edge_center",
            "left_back_corner",
            "right_back_corner",
        ] {
            assert!(output.plan.anchor(name).is_some(), "missing {name}");
        }
    }
}

#[test]
fn test_centers_for_range_packing() {
    // Gap fits: centered packing with the exact pitch.
    let centers = centers_for_range_test(0.0, 100.0, 3, 10.0, 10.0);
    assert_eq!(centers, vec![30.0, 50.0, 70.0]);
    // Gap does not fit: spread edge to edge.
    let centers = centers_for_range_test(0.0, 40.0, 3, 10.0, 10.0);
    assert_eq!(centers, vec![5.0, 20.0, 35.0]);
    // Single member sits mid-span.
    assert_eq!(centers_for_range_test(10.0, 30.0, 1, 5.0, 0.0), vec![20.0]);
}
