//! Seat slat bed: evenly spread slats across the seat band plus the pair of
//! longitudinal rails they rest on.

use crate::config::{MountMode, ResolvedSpec};
use crate::diagnostics::{BuildContext, Component, Event, EventSpec, Source, Stage};
use crate::layout::LayoutContext;
use crate::plan::{BuildPlan, Primitive};

pub fn build(
    spec: &ResolvedSpec,
    layout: &LayoutContext,
    plan: &mut BuildPlan,
    ctx: &BuildContext,
    events: &mut Vec<Event>,
) {
    let slats = &spec.slats;
    if !slats.enabled {
        return;
    }

    events.push(ctx.emit(EventSpec {
        stage: Some(Stage::Build),
        component: Some(Component::SeatSlats),
        code: "STRATEGY_SELECTED".into(),
        severity: 0,
        path: "slats.mount_mode".into(),
        source: Some(Source::Computed),
        resolved_value: serde_json::json!(slats.mount_mode),
        reason: "slat mount strategy selected".into(),
        ..Default::default()
    }));

    let depth = layout.seat_depth_mm;
    let slat_length = (depth - 2.0 * slats.margin_y_mm).max(1.0);
    let rail_length = (depth - 2.0 * slats.rail_inset_y_mm).max(1.0);
    let usable_width = (layout.seat_total_width_mm - 2.0 * slats.margin_x_mm).max(1.0);

    let count = slats.count.max(1) as usize;
    let centers: Vec<f64> = if count == 1 {
        vec![0.0]
    } else {
        let span = (usable_width - slats.width_mm).max(0.0);
        let step = span / (count as f64 - 1.0);
        let start = -usable_width / 2.0 + slats.width_mm / 2.0;
        (0..count).map(|i| start + step * i as f64).collect()
    };

    // Slats sit on the base frame plane unless centered into the seat board
    // band instead.
    let slat_plane_z = layout.base_frame_top_z;
    let slat_center_z = match slats.mount_mode {
        MountMode::Centered => {
            layout.seat_support_top_z - slats.thickness_mm / 2.0 + slats.clearance_mm
        }
        MountMode::RestsOnPlane => {
            slat_plane_z + slats.mount_offset_mm + slats.clearance_mm + slats.thickness_mm / 2.0
        }
    };

    for (i, x) in centers.iter().enumerate() {
        plan.push_primitive(
            Primitive::slat(
                format!("slat_{}", i + 1),
                [slats.width_mm, slat_length, slats.thickness_mm],
                [*x, 0.0, slat_center_z],
            )
            .with_param("arc_height_mm", slats.arc_height_mm)
            .with_param("arc_sign", slats.arc_sign)
            .with_param("mount_offset_mm", slats.mount_offset_mm)
            .with_param("clearance_mm", slats.clearance_mm),
        );
    }

    plan.push_anchor("slat_plane_z", [0.0, 0.0, slat_plane_z]);
    plan.push_anchor("slat_area_center", [0.0, 0.0, slat_center_z]);

    // Support rails under the outermost slats. Skipped when the spread is
    // too narrow for two distinct rails.
    let min_x = centers.iter().copied().fold(f64::INFINITY, f64::min) - slats.width_mm / 2.0;
    let max_x = centers.iter().copied().fold(f64::NEG_INFINITY, f64::max) + slats.width_mm / 2.0;
    let rail_top_z = slat_plane_z;
    let rail_center_z = rail_top_z - slats.rail_height_mm / 2.0;
    let rail_left_x = min_x + slats.rail_width_mm / 2.0 + slats.rail_inset_mm;
    let rail_right_x = max_x - slats.rail_width_mm / 2.0 - slats.rail_inset_mm;
    if rail_left_x < rail_right_x {
        for (name, x) in [("rail_left", rail_left_x), ("rail_right", rail_right_x)] {
            plan.push_primitive(Primitive::beam(
                name,
                [slats.rail_width_mm, rail_length, slats.rail_height_mm],
                [x, 0.0, rail_center_z],
            ));
            plan.push_anchor(name, [x, 0.0, rail_center_z]);
        }
    }
}
