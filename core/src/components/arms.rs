//! Arm builders: the solid box profile and the open frame profile
//! (posts, top rail, cap and outer rail per side).

use crate::config::{ArmProfile, ResolvedSpec};
use crate::diagnostics::{BuildContext, Component, Event, EventSpec, Source, Stage};
use crate::geometry::clamp;
use crate::layout::LayoutContext;
use crate::plan::{BuildPlan, Primitive};

pub fn build(
    spec: &ResolvedSpec,
    layout: &LayoutContext,
    plan: &mut BuildPlan,
    ctx: &BuildContext,
    events: &mut Vec<Event>,
) {
    if spec.arms.kind.count() == 0 {
        return;
    }

    events.push(ctx.emit(EventSpec {
        stage: Some(Stage::Build),
        component: Some(Component::Arms),
        code: "STRATEGY_SELECTED".into(),
        severity: 0,
        path: "arms.profile".into(),
        source: Some(Source::Computed),
        resolved_value: serde_json::json!(spec.arms.profile),
        reason: "arm profile strategy selected".into(),
        ..Default::default()
    }));

    let sides: &[(&str, f64)] = match (spec.arms.kind.builds_left(), spec.arms.kind.builds_right()) {
        (true, true) => &[("left", -1.0), ("right", 1.0)],
        (true, false) => &[("left", -1.0)],
        (false, true) => &[("right", 1.0)],
        (false, false) => &[],
    };

    for (side, sign) in sides {
        match spec.arms.profile {
            ArmProfile::Box => build_box_arm(spec, layout, plan, side, *sign),
            ArmProfile::FrameBoxOpen => build_open_frame_arm(spec, layout, plan, side, *sign),
        }
        let center_x = sign * (layout.seat_total_width_mm / 2.0 + spec.arms.width_mm / 2.0);
        plan.push_anchor(
            format!("arm_{side}_zone"),
            [center_x, 0.0, layout.seat_height_mm],
        );
    }
}

fn arm_height(layout: &LayoutContext) -> f64 {
    (2.0 * layout.frame_thickness_mm).max(0.65 * layout.seat_height_mm)
}

fn build_box_arm(spec: &ResolvedSpec, layout: &LayoutContext, plan: &mut BuildPlan, side: &str, sign: f64) {
    let width = spec.arms.width_mm;
    let height = arm_height(layout);
    let center_x = sign * (layout.seat_total_width_mm / 2.0 + width / 2.0);
    let center_z = layout.base_frame_top_z + height / 2.0;
    plan.push_primitive(Primitive::board(
        format!("{side}_arm_frame"),
        [width, layout.seat_depth_mm, height],
        [center_x, 0.0, center_z],
    ));
}

/// Open frame arm: five members a side, mirrored exactly across X.
fn build_open_frame_arm(
    spec: &ResolvedSpec,
    layout: &LayoutContext,
    plan: &mut BuildPlan,
    side: &str,
    sign: f64,
) {
    let t = layout.frame_thickness_mm;
    let width = spec.arms.width_mm;
    let depth = layout.seat_depth_mm;
    let height = arm_height(layout);

    let post = clamp(t, 20.0, 80.0);
    let top_rail_height = clamp(t * 0.8, 15.0, 60.0);
    let cap_thickness = clamp(t * 0.6, 10.0, 40.0);
    let cap_overhang = clamp(10.0, 0.0, 60.0);
    let outer_rail_height = clamp(t, 15.0, 80.0);
    let front_inset = clamp(40.0, 0.0, 200.0);
    let top_clearance = clamp(20.0, 0.0, 120.0);

    let band_center_x = sign * (layout.seat_total_width_mm / 2.0 + width / 2.0);
    let outer_x = sign * (layout.seat_total_width_mm / 2.0 + width - post / 2.0);
    let base_z = layout.base_frame_top_z;
    let top_z = base_z + height;

    let front_y = depth / 2.0 - post / 2.0 - front_inset;
    let back_y = -depth / 2.0 + post / 2.0;
    let post_height = (height - cap_thickness - top_rail_height).max(1.0);
    let post_center_z = base_z + post_height / 2.0;

    plan.push_primitive(Primitive::beam(
        format!("arm_{side}_inner_post"),
        [post, post, post_height],
        [band_center_x, front_y, post_center_z],
    ));
    plan.push_primitive(Primitive::beam(
        format!("arm_{side}_back_post"),
        [post, post, post_height],
        [band_center_x, back_y, post_center_z],
    ));

    let rail_length = (front_y - back_y + post).max(1.0);
    let rail_center_y = (front_y + back_y) / 2.0;
    plan.push_primitive(Primitive::beam(
        format!("arm_{side}_top_rail"),
        [post, rail_length, top_rail_height],
        [band_center_x, rail_center_y, top_z - cap_thickness - top_rail_height / 2.0],
    ));

    plan.push_primitive(Primitive::board(
        format!("arm_{side}_cap"),
        [width + cap_overhang, depth, cap_thickness],
        [band_center_x, 0.0, top_z - cap_thickness / 2.0],
    ));

    plan.push_primitive(Primitive::beam(
        format!("arm_{side}_outer_rail"),
        [post, (depth - 2.0 * post).max(1.0), outer_rail_height],
        [outer_x, 0.0, base_z + top_clearance + outer_rail_height / 2.0],
    ));
}
