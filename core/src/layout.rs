//! Shared placement context derived once from the resolved spec.
//!
//! Every component builder reads positions from here instead of re-deriving
//! them, so the seat plane, frame band and footprint agree across the plan.
//!
//! Frame convention: X spans seat width, Y spans seat depth (+Y toward the
//! front edge), Z is up with the floor at 0. The sofa is centered on the
//! Z axis in X and Y.

use crate::config::{ArmsType, ResolvedSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutContext {
    pub seat_width_mm: f64,
    pub seat_depth_mm: f64,
    pub seat_height_mm: f64,
    pub seat_count: u32,
    pub frame_thickness_mm: f64,
    pub arm_width_mm: f64,
    pub arm_count: u32,

    /// Seat band width: `seat_width * seat_count`.
    pub seat_total_width_mm: f64,
    /// Overall width including arms.
    pub total_width_mm: f64,

    /// Top of the seat support surface (the nominal seat height).
    pub seat_support_top_z: f64,
    pub seat_support_center_z: f64,
    /// Top of the base frame band, one frame thickness under the seat top.
    pub base_frame_top_z: f64,
    pub base_frame_center_z: f64,

    pub seat_min_x: f64,
    pub seat_max_x: f64,
    pub seat_min_y: f64,
    pub seat_max_y: f64,

    /// Rear edge of the seat band; the back assembly grows from here.
    pub back_base_y: f64,
    /// Center plane of the rear seat beam.
    pub back_plane_y: f64,

    pub floor_z: f64,
}

impl LayoutContext {
    pub fn from_spec(spec: &ResolvedSpec) -> Self {
        let seat_width_mm = spec.seat.width_mm;
        let seat_depth_mm = spec.seat.depth_mm;
        let seat_height_mm = spec.seat.height_mm;
        let seat_count = spec.seat.count.max(1);
        let frame_thickness_mm = spec.frame.thickness_mm;

        let arm_count = if spec.arms.kind == ArmsType::None {
            0
        } else {
            spec.arms.kind.count()
        };
        let arm_width_mm = spec.arms.width_mm;

        let seat_total_width_mm = seat_width_mm * f64::from(seat_count);
        let total_width_mm = seat_total_width_mm + arm_width_mm * f64::from(arm_count);

        let seat_support_top_z = seat_height_mm;
        let seat_support_center_z = seat_support_top_z - frame_thickness_mm / 2.0;
        let base_frame_top_z = seat_support_top_z - frame_thickness_mm;
        let base_frame_center_z = base_frame_top_z - frame_thickness_mm / 2.0;

        let seat_min_x = -seat_total_width_mm / 2.0;
        let seat_max_x = seat_total_width_mm / 2.0;
        let seat_min_y = -seat_depth_mm / 2.0;
        let seat_max_y = seat_depth_mm / 2.0;

        let back_base_y = seat_min_y;
        let back_plane_y = seat_min_y + frame_thickness_mm / 2.0;

        Self {
            seat_width_mm,
            seat_depth_mm,
            seat_height_mm,
            seat_count,
            frame_thickness_mm,
            arm_width_mm,
            arm_count,
            seat_total_width_mm,
            total_width_mm,
            seat_support_top_z,
            seat_support_center_z,
            base_frame_top_z,
            base_frame_center_z,
            seat_min_x,
            seat_max_x,
            seat_min_y,
            seat_max_y,
            back_base_y,
            back_plane_y,
            floor_z: 0.0,
        }
    }
}
