//! Legs: one per corner, hung from the bottom of the base frame band.
//! Unknown families pass through as-is for downstream shape libraries.

use crate::config::{LegFamily, ResolvedSpec};
use crate::diagnostics::{BuildContext, Component, Event, EventSpec, Source, Stage};
use crate::layout::LayoutContext;
use crate::plan::{BuildPlan, Primitive, Shape};

pub fn build(
    spec: &ResolvedSpec,
    layout: &LayoutContext,
    plan: &mut BuildPlan,
    ctx: &BuildContext,
    events: &mut Vec<Event>,
) {
    let legs = &spec.legs;
    let t = layout.frame_thickness_mm;
    let height = legs.height_mm;

    events.push(ctx.emit(EventSpec {
        stage: Some(Stage::Build),
        component: Some(Component::Legs),
        code: "STRATEGY_SELECTED".into(),
        severity: 0,
        path: "legs.family".into(),
        source: Some(Source::Computed),
        resolved_value: serde_json::json!(legs.family.label()),
        reason: "leg family strategy selected".into(),
        ..Default::default()
    }));

    let shape = match &legs.family {
        LegFamily::Block => Shape::Cube,
        LegFamily::TaperedCone => Shape::TaperedCone,
        LegFamily::Cylindrical => Shape::Cylindrical,
        LegFamily::Other(name) => Shape::Passthrough(name.clone()),
    };
    let carries_params = !matches!(legs.family, LegFamily::Block);

    let offset_x = layout.total_width_mm / 2.0 - t / 2.0;
    let offset_y = layout.seat_depth_mm / 2.0 - t / 2.0;
    let base_frame_bottom_z = layout.base_frame_top_z - t;
    let center_z = base_frame_bottom_z - height / 2.0;

    let points = [
        (-offset_x, -offset_y),
        (offset_x, -offset_y),
        (-offset_x, offset_y),
        (offset_x, offset_y),
    ];
    for (i, (x, y)) in points.iter().enumerate() {
        let mut primitive = Primitive::new(
            format!("leg_{}", i + 1),
            shape.clone(),
            [t, t, height],
            [*x, *y, center_z],
        );
        if carries_params {
            primitive.params = legs.params.clone();
        }
        plan.push_primitive(primitive);
        plan.push_anchor(format!("leg_point_{}", i + 1), [*x, *y, center_z]);
    }
}
