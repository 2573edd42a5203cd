//! The fully-typed resolved configuration tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Arm placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmsType {
    None,
    Left,
    Right,
    Both,
}

impl ArmsType {
    pub fn count(self) -> u32 {
        match self {
            Self::Both => 2,
            Self::Left | Self::Right => 1,
            Self::None => 0,
        }
    }

    pub fn builds_left(self) -> bool {
        matches!(self, Self::Left | Self::Both)
    }

    pub fn builds_right(self) -> bool {
        matches!(self, Self::Right | Self::Both)
    }
}

/// Arm construction profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmProfile {
    Box,
    FrameBoxOpen,
}

/// Back support construction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackMode {
    Panel,
    Slats,
    Straps,
}

/// Back frame layout: one full window or two windows around a center post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLayout {
    Single,
    Split2,
}

/// Where the bottom rail of the back frame attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachMode {
    SeatRearBeam,
    None,
}

/// Back slat run direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlatOrientation {
    Vertical,
    Horizontal,
}

/// Back slat window layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlatLayout {
    Full,
    SplitCenter,
}

/// Seat slat vertical placement rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountMode {
    RestsOnPlane,
    Centered,
}

/// Leg family. Kept open: an unknown family string is preserved so a
/// downstream builder with more shapes can still act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegFamily {
    Block,
    TaperedCone,
    Cylindrical,
    #[serde(untagged)]
    Other(String),
}

impl LegFamily {
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "block" => Self::Block,
            "tapered_cone" => Self::TaperedCone,
            "cylindrical" => Self::Cylindrical,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Block => "block",
            Self::TaperedCone => "tapered_cone",
            Self::Cylindrical => "cylindrical",
            Self::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSpec {
    pub width_mm: f64,
    pub depth_mm: f64,
    pub height_mm: f64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub thickness_mm: f64,
    pub back_thickness_mm: f64,
    pub back_height_above_seat_mm: f64,
}

/// Seat slat field block. All lengths in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSlatsSpec {
    pub enabled: bool,
    pub count: u32,
    pub width_mm: f64,
    pub thickness_mm: f64,
    pub margin_x_mm: f64,
    pub margin_y_mm: f64,
    pub rail_inset_mm: f64,
    pub rail_inset_y_mm: f64,
    pub rail_width_mm: f64,
    pub rail_height_mm: f64,
    pub mount_mode: MountMode,
    pub mount_offset_mm: f64,
    pub clearance_mm: f64,
    pub arc_height_mm: f64,
    pub arc_sign: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmsSpec {
    pub kind: ArmsType,
    pub width_mm: f64,
    pub profile: ArmProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterPostSpec {
    pub enabled: bool,
    pub thickness_mm: f64,
    pub inset_y_mm: f64,
    pub width_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackFrameSpec {
    pub height_above_seat_mm: f64,
    pub thickness_mm: f64,
    pub offset_y_mm: f64,
    pub margin_x_mm: f64,
    pub margin_z_mm: f64,
    pub rail_inset_mm: f64,
    pub rail_width_mm: f64,
    pub rail_depth_mm: f64,
    pub rail_height_mm: f64,
    pub bottom_rail_split: bool,
    pub bottom_rail_gap_mm: f64,
    pub split_center: bool,
    pub frame_layout: FrameLayout,
    pub bottom_rail_attach_mode: AttachMode,
    pub bottom_rail_height_mm: f64,
    pub center_post: CenterPostSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackSlatsSpec {
    pub orientation: SlatOrientation,
    pub layout: SlatLayout,
    pub count: u32,
    pub width_mm: f64,
    pub thickness_mm: f64,
    pub arc_height_mm: f64,
    pub arc_sign: f64,
    pub gap_mm: f64,
    /// True when `gap_mm` was given explicitly (raw or preset), as opposed
    /// to the global default. Horizontal rows use a stock gap otherwise.
    pub has_gap_mm: bool,
    pub center_gap_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackStrapsSpec {
    pub count: u32,
    pub width_mm: f64,
    pub thickness_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackSpec {
    /// Whether `back_support` appeared in the raw document at all. When
    /// false the builder falls back to the legacy single-panel path.
    pub provided: bool,
    pub mode: BackMode,
    pub frame: BackFrameSpec,
    pub slats: BackSlatsSpec,
    pub straps: BackStrapsSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegsSpec {
    pub family: LegFamily,
    pub height_mm: f64,
    pub params: BTreeMap<String, f64>,
}

/// Canonical, fully-typed configuration. Immutable once produced; every
/// autofix iteration resolves a fresh one from the patched raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSpec {
    pub style: String,
    pub preset_id: String,
    pub seat: SeatSpec,
    pub frame: FrameSpec,
    pub slats: SeatSlatsSpec,
    pub arms: ArmsSpec,
    pub back: BackSpec,
    pub legs: LegsSpec,
}
