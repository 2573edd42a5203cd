//! Seat base frame: perimeter beams, cross beams, and the solid seat
//! support board when slats are disabled.

use crate::config::ResolvedSpec;
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
    events.push(ctx.emit(EventSpec {
        stage: Some(Stage::Build),
        component: Some(Component::SeatFrame),
        code: "STRATEGY_SELECTED".into(),
        severity: 0,
        path: "slats.enabled".into(),
        source: Some(Source::Computed),
        resolved_value: serde_json::json!(if spec.slats.enabled {
            "open_frame"
        } else {
            "solid_support"
        }),
        reason: "seat support strategy selected".into(),
        ..Default::default()
    }));

    let t = layout.frame_thickness_mm;
    let depth = layout.seat_depth_mm;
    let total = layout.total_width_mm;

    let front_y = depth / 2.0 - t / 2.0;
    let back_y = -depth / 2.0 + t / 2.0;
    let left_x = -total / 2.0 + t / 2.0;
    let right_x = total / 2.0 - t / 2.0;
    let z = layout.base_frame_center_z;

    plan.push_primitive(Primitive::beam("beam_front", [total, t, t], [0.0, front_y, z]));
    plan.push_primitive(Primitive::beam("beam_back", [total, t, t], [0.0, back_y, z]));
    plan.push_primitive(Primitive::beam("beam_left", [t, depth, t], [left_x, 0.0, z]));
    plan.push_primitive(Primitive::beam("beam_right", [t, depth, t], [right_x, 0.0, z]));

    // One cross beam per seat boundary, kept within a sane band.
    let cross_count = (layout.seat_count as i64 + 1).clamp(2, 4);
    let inner_width = (total - 2.0 * t).max(1.0);
    let spacing = inner_width / (cross_count as f64 + 1.0);
    for i in 0..cross_count {
        let x = -inner_width / 2.0 + spacing * (i as f64 + 1.0);
        plan.push_primitive(Primitive::beam(
            format!("beam_cross_{}", i + 1),
            [t, depth - 2.0 * t, t],
            [x, 0.0, z],
        ));
    }

    if !spec.slats.enabled {
        plan.push_primitive(Primitive::board(
            "seat_support",
            [layout.seat_total_width_mm, depth, t],
            [0.0, 0.0, layout.seat_support_center_z],
        ));
    }
}
