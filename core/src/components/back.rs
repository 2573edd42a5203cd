//! Back assembly: side rails and one of three infills (panel, slat grid,
//! straps), or the legacy single-board back when no `back_support` block was
//! supplied.
//!
//! The back grows from the base frame band up to `seat_height +
//! height_above_seat`. Its Y plane attaches to the rear seat beam by
//! default, with a micro offset clamped to a few centimetres so a nudge
//! cannot detach the back from the frame.

use crate::config::{
    AttachMode, BackMode, FrameLayout, ResolvedSpec, SlatLayout, SlatOrientation,
};
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
    events.push(ctx.emit(EventSpec {
        stage: Some(Stage::Build),
        component: Some(Component::Back),
        code: "STRATEGY_SELECTED".into(),
        severity: 0,
        path: "back_support.mode".into(),
        source: Some(Source::Computed),
        resolved_value: if spec.back.provided {
            serde_json::json!(spec.back.mode)
        } else {
            serde_json::json!("legacy_board")
        },
        reason: "back infill strategy selected".into(),
        ..Default::default()
    }));

    let bf = &spec.back.frame;
    let seat_total = layout.seat_total_width_mm;
    let frame_t = layout.frame_thickness_mm;

    // Rear seat beam geometry the back attaches to.
    let back_y = layout.back_plane_y;
    let y_back_seat = back_y - frame_t / 2.0;
    let micro_offset_y = clamp(bf.offset_y_mm, -80.0, 80.0);

    let rail_width = bf.rail_width_mm.max(1.0);
    let rail_depth = bf.rail_depth_mm.max(1.0);
    let rail_height = bf.rail_height_mm.max(1.0);
    let back_member = bf.thickness_mm.max(1.0);
    let bottom_rail_height = bf.bottom_rail_height_mm.max(10.0);
    let center_post_width = bf.center_post.width_mm.max(1.0);

    let plane_y = match bf.bottom_rail_attach_mode {
        AttachMode::SeatRearBeam => y_back_seat + micro_offset_y,
        AttachMode::None => -layout.seat_depth_mm / 2.0 + bf.offset_y_mm,
    };
    let base_z = layout.base_frame_top_z;
    let top_z = (layout.seat_support_top_z + bf.height_above_seat_mm).max(base_z + 1.0);
    let height = top_z - base_z;
    let center_y = plane_y - rail_depth / 2.0;
    let back_center_z = base_z + height / 2.0;
    let rail_left_x = -seat_total / 2.0 + rail_width / 2.0;
    let rail_right_x = seat_total / 2.0 - rail_width / 2.0;

    // Zone anchor inputs; overwritten by the legacy path below.
    let mut anchor_y = center_y;
    let mut bottom_z = base_z;
    let mut zone_top_z = top_z;
    let mut inner_center = [0.0, center_y, back_center_z];

    if spec.back.provided {
        for (name, x) in [("back_rail_left", rail_left_x), ("back_rail_right", rail_right_x)] {
            plan.push_primitive(Primitive::beam(
                name,
                [rail_width, rail_depth, height],
                [x, center_y, base_z + height / 2.0],
            ));
            plan.push_anchor(name, [x, center_y, base_z + height / 2.0]);
        }

        match spec.back.mode {
            BackMode::Panel => {
                plan.push_primitive(Primitive::board(
                    "back_panel",
                    [seat_total, back_member, height],
                    [0.0, center_y, back_center_z],
                ));
            }
            BackMode::Slats => build_slat_grid(
                spec,
                plan,
                SlatGridFrame {
                    rail_left_x,
                    rail_right_x,
                    rail_width,
                    rail_depth,
                    rail_height,
                    bottom_rail_height,
                    center_post_width,
                    center_y,
                    base_z,
                    top_z,
                },
            ),
            BackMode::Straps => {
                let straps = &spec.back.straps;
                let margin_z = bf.margin_z_mm.max(0.0);
                let span = ((height - back_member) - 2.0 * margin_z).max(1.0);
                let count = straps.count.max(1) as usize;
                let centers: Vec<f64> = if count == 1 {
                    vec![base_z + (height - back_member) / 2.0]
                } else {
                    let step = span / (count as f64 - 1.0);
                    (0..count)
                        .map(|i| base_z + margin_z + step * i as f64)
                        .collect()
                };
                for (i, z) in centers.iter().enumerate() {
                    plan.push_primitive(Primitive::board(
                        format!("back_strap_{}", i + 1),
                        [seat_total, straps.thickness_mm, straps.width_mm],
                        [0.0, center_y, *z],
                    ));
                }
            }
        }
    } else {
        // Legacy back: one solid board rising from the seat plane.
        let legacy_height = bf.height_above_seat_mm;
        anchor_y = y_back_seat - back_member / 2.0 + bf.offset_y_mm;
        bottom_z = layout.seat_support_top_z;
        zone_top_z = layout.seat_support_top_z + legacy_height;
        inner_center = [0.0, anchor_y, layout.seat_support_top_z + legacy_height / 2.0];
        plan.push_primitive(Primitive::board(
            "back_frame",
            [layout.total_width_mm, back_member, legacy_height],
            inner_center,
        ));
    }

    plan.push_anchor("back_zone", inner_center);
    plan.push_anchor("seat_rear_rail", [0.0, back_y, layout.base_frame_center_z]);
    plan.push_anchor(
        "seat_back_rail_center_y",
        [0.0, back_y, layout.base_frame_center_z],
    );
    plan.push_anchor(
        "seat_back_rail_outer_face_y",
        [0.0, y_back_seat, layout.base_frame_center_z],
    );
    plan.push_anchor("y_back_seat", [0.0, y_back_seat, layout.base_frame_center_z]);
    plan.push_anchor("seat_back_plane", [0.0, y_back_seat, bottom_z]);
    plan.push_anchor("back_frame_origin", [0.0, anchor_y, bottom_z]);
    plan.push_anchor("back_bottom_edge_center", [0.0, anchor_y, bottom_z]);
    plan.push_anchor("back_top_edge_center", [0.0, anchor_y, zone_top_z]);
    plan.push_anchor("back_inner_plane_center", inner_center);
    plan.push_anchor("left_back_corner", [-seat_total / 2.0, anchor_y, bottom_z]);
    plan.push_anchor("right_back_corner", [seat_total / 2.0, anchor_y, bottom_z]);
}

struct SlatGridFrame {
    rail_left_x: f64,
    rail_right_x: f64,
    rail_width: f64,
    rail_depth: f64,
    rail_height: f64,
    bottom_rail_height: f64,
    center_post_width: f64,
    center_y: f64,
    base_z: f64,
    top_z: f64,
}

fn build_slat_grid(spec: &ResolvedSpec, plan: &mut BuildPlan, frame: SlatGridFrame) {
    let bf = &spec.back.frame;
    let slats = &spec.back.slats;

    let inset_x = bf.rail_inset_mm.max(3.0);
    let inset_z = inset_x;
    let margin_x = bf.margin_x_mm.max(0.0);
    let margin_z = bf.margin_z_mm.max(0.0);

    let frame_inner_min_x = frame.rail_left_x + frame.rail_width / 2.0;
    let frame_inner_max_x = frame.rail_right_x - frame.rail_width / 2.0;
    let inner_width = (frame_inner_max_x - frame_inner_min_x).max(1.0);

    let bottom_rail_center_z = frame.base_z + frame.bottom_rail_height / 2.0;
    let top_rail_center_z = frame.top_z - frame.rail_height / 2.0;
    plan.push_primitive(Primitive::beam(
        "back_rail_bottom",
        [inner_width, frame.rail_depth, frame.bottom_rail_height],
        [0.0, frame.center_y, bottom_rail_center_z],
    ));
    plan.push_anchor("back_rail_bottom", [0.0, frame.center_y, bottom_rail_center_z]);
    plan.push_primitive(Primitive::beam(
        "back_rail_top",
        [inner_width, frame.rail_depth, frame.rail_height],
        [0.0, frame.center_y, top_rail_center_z],
    ));
    plan.push_anchor("back_rail_top", [0.0, frame.center_y, top_rail_center_z]);

    let inner_bottom_frame_z = bottom_rail_center_z + frame.bottom_rail_height / 2.0;
    let inner_top_frame_z = top_rail_center_z - frame.rail_height / 2.0;

    let mut gap_half = 0.0;
    if bf.frame_layout == FrameLayout::Split2 {
        let post_height = (inner_top_frame_z - inner_bottom_frame_z).max(1.0);
        let post_center_z = inner_bottom_frame_z + post_height / 2.0;
        plan.push_primitive(Primitive::beam(
            "back_rail_center",
            [frame.center_post_width, frame.rail_depth, post_height],
            [0.0, frame.center_y, post_center_z],
        ));
        plan.push_anchor("back_rail_center", [0.0, frame.center_y, post_center_z]);
        gap_half = frame.center_post_width / 2.0 + inset_x;
    }

    // Slat window inside the frame. Drop the margins when they would close
    // the window entirely.
    let mut inner_min_x = frame_inner_min_x + inset_x + margin_x;
    let mut inner_max_x = frame_inner_max_x - inset_x - margin_x;
    if inner_min_x >= inner_max_x {
        inner_min_x = frame_inner_min_x + inset_x;
        inner_max_x = frame_inner_max_x - inset_x;
    }
    let mut inner_bottom_z = inner_bottom_frame_z + inset_z + margin_z;
    let mut inner_top_z = inner_top_frame_z - inset_z - margin_z;
    if inner_bottom_z >= inner_top_z {
        inner_bottom_z = inner_bottom_frame_z + inset_z;
        inner_top_z = (inner_top_frame_z - inset_z).max(inner_bottom_z + 1.0);
    }

    let span_z = inner_top_z - inner_bottom_z;
    let back_slat_center_z = inner_bottom_z + span_z / 2.0;
    let y_slat_inset = ((frame.rail_depth - slats.thickness_mm) / 2.0 - 0.5).clamp(0.0, 2.0);
    let slat_center_y = frame.center_y - y_slat_inset;
    let slat_plane_y = slat_center_y + slats.thickness_mm / 2.0;

    let split_center_layout =
        bf.frame_layout == FrameLayout::Split2 || slats.layout == SlatLayout::SplitCenter;
    let center_split_gap_half = gap_half.max(
        frame.center_post_width / 2.0 + slats.center_gap_mm.max(2.0),
    );

    plan.push_anchor("back_slat_plane_y", [0.0, slat_plane_y, 0.0]);
    plan.push_anchor("back_slat_center_z", [0.0, 0.0, back_slat_center_z]);
    plan.push_anchor(
        "back_frame_inner_rect_min",
        [inner_min_x, slat_center_y, inner_bottom_z],
    );
    plan.push_anchor(
        "back_frame_inner_rect_max",
        [inner_max_x, slat_center_y, inner_top_z],
    );

    match slats.orientation {
        SlatOrientation::Horizontal => build_horizontal_rows(
            plan,
            slats,
            HorizontalWindow {
                inner_min_x,
                inner_max_x,
                inner_bottom_z,
                inner_top_z,
                slat_center_y,
                split_center_layout,
                gap_half: center_split_gap_half,
            },
        ),
        SlatOrientation::Vertical => build_vertical_slats(
            plan,
            slats,
            VerticalWindow {
                inner_min_x,
                inner_max_x,
                slat_height: span_z.max(1.0),
                slat_center_y,
                back_slat_center_z,
                split_center_layout,
                gap_half: center_split_gap_half,
            },
        ),
    }
}

struct HorizontalWindow {
    inner_min_x: f64,
    inner_max_x: f64,
    inner_bottom_z: f64,
    inner_top_z: f64,
    slat_center_y: f64,
    split_center_layout: bool,
    gap_half: f64,
}

fn build_horizontal_rows(
    plan: &mut BuildPlan,
    slats: &crate::config::BackSlatsSpec,
    w: HorizontalWindow,
) {
    let row_height = slats.width_mm.max(1.0);
    let row_gap = if slats.has_gap_mm && slats.gap_mm > 0.0 {
        slats.gap_mm
    } else {
        35.0
    };

    // Reduce the row count when the requested stack cannot fit the window.
    let mut rows = slats.count.max(1) as usize;
    let inner_height = (w.inner_top_z - w.inner_bottom_z).max(1.0);
    let packed = rows as f64 * row_height + (rows as f64 - 1.0) * row_gap;
    if packed > inner_height + 1e-6 {
        let fit = ((inner_height + row_gap) / (row_height + row_gap)).floor() as usize;
        rows = rows.min(fit.max(2)).max(2);
    }
    let row_centers = centers_for_range(w.inner_bottom_z, w.inner_top_z, rows, row_height, row_gap);

    let mut segments: Vec<(&str, f64, f64)> = Vec::new();
    if w.split_center_layout {
        let left = (w.inner_min_x, w.inner_max_x.min(-w.gap_half));
        let right = (w.inner_min_x.max(w.gap_half), w.inner_max_x);
        if left.1 - left.0 >= 1.0 {
            segments.push(("left", left.0, left.1));
        }
        if right.1 - right.0 >= 1.0 {
            segments.push(("right", right.0, right.1));
        }
    }
    if segments.is_empty() {
        segments.push(("full", w.inner_min_x, w.inner_max_x));
    }

    let mut running = 0usize;
    for (row, z) in row_centers.iter().enumerate() {
        for (side, seg_min, seg_max) in &segments {
            let length = (seg_max - seg_min).max(1.0);
            let center_x = (seg_min + seg_max) / 2.0;
            running += 1;
            let name = if *side == "full" {
                format!("back_slat_{running}")
            } else {
                format!("back_slat_{}_{}", side, row + 1)
            };
            plan.push_primitive(
                Primitive::slat(
                    name.clone(),
                    [length, slats.thickness_mm, row_height],
                    [center_x, w.slat_center_y, *z],
                )
                .with_param("arc_height_mm", slats.arc_height_mm)
                .with_param("arc_sign", slats.arc_sign)
                .with_param("row_index", (row + 1) as f64),
            );
            plan.push_anchor(name, [center_x, w.slat_center_y, *z]);
        }
    }
}

struct VerticalWindow {
    inner_min_x: f64,
    inner_max_x: f64,
    slat_height: f64,
    slat_center_y: f64,
    back_slat_center_z: f64,
    split_center_layout: bool,
    gap_half: f64,
}

fn build_vertical_slats(
    plan: &mut BuildPlan,
    slats: &crate::config::BackSlatsSpec,
    w: VerticalWindow,
) {
    let count = slats.count.max(1) as usize;

    let centers: Vec<f64> = if w.split_center_layout {
        let left_window = (w.inner_min_x, -w.gap_half);
        let right_window = (w.gap_half, w.inner_max_x);
        let left_valid = left_window.1 - left_window.0 >= 1.0;
        let right_valid = right_window.1 - right_window.0 >= 1.0;
        let left_count = count.div_ceil(2);
        let right_count = count / 2;
        match (left_valid, right_valid) {
            (true, true) => {
                let mut centers =
                    centers_for_range(left_window.0, left_window.1, left_count, slats.width_mm, 0.0);
                centers.extend(centers_for_range(
                    right_window.0,
                    right_window.1,
                    right_count,
                    slats.width_mm,
                    0.0,
                ));
                centers
            }
            (true, false) => {
                centers_for_range(left_window.0, left_window.1, count, slats.width_mm, 0.0)
            }
            (false, true) => {
                centers_for_range(right_window.0, right_window.1, count, slats.width_mm, 0.0)
            }
            (false, false) => {
                centers_for_range(w.inner_min_x, w.inner_max_x, count, slats.width_mm, 0.0)
            }
        }
    } else {
        centers_for_range(w.inner_min_x, w.inner_max_x, count, slats.width_mm, 0.0)
    };

    for (i, x) in centers.iter().enumerate() {
        let name = format!("back_slat_{}", i + 1);
        plan.push_primitive(
            Primitive::slat(
                name.clone(),
                [slats.width_mm, slats.thickness_mm, w.slat_height],
                [*x, w.slat_center_y, w.back_slat_center_z],
            )
            .with_param("arc_height_mm", slats.arc_height_mm)
            .with_param("arc_sign", slats.arc_sign),
        );
        plan.push_anchor(name, [*x, w.slat_center_y, w.back_slat_center_z]);
    }
}

/// Evenly place `count` members of `size` across `[min, max]`. A positive
/// gap packs members center-out when the packed run fits; otherwise members
/// spread edge to edge.
fn centers_for_range(min: f64, max: f64, count: usize, size: f64, gap: f64) -> Vec<f64> {
    let span = max - min;
    if count <= 1 {
        return vec![min + span / 2.0];
    }
    if gap > 0.0 {
        let required = size * count as f64 + gap * (count as f64 - 1.0);
        if required <= span {
            let start = min + (span - required) / 2.0 + size / 2.0;
            return (0..count).map(|i| start + (size + gap) * i as f64).collect();
        }
    }
    let free_span = (span - size).max(0.0);
    let step = free_span / (count as f64 - 1.0);
    let start = min + size / 2.0;
    (0..count).map(|i| start + step * i as f64).collect()
}

#[cfg(test)]
pub(crate) fn centers_for_range_test(min: f64, max: f64, count: usize, size: f64, gap: f64) -> Vec<f64> {
    centers_for_range(min, max, count, size, gap)
}
