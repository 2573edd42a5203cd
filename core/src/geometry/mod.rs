//! Shared geometry scalars and axis-aligned boxes for plan evaluation.

use nalgebra as na;
use serde::{Deserialize, Serialize};

pub type Point3 = na::Point3<f64>;
pub type Vector3 = na::Vector3<f64>;

pub const EPSILON: f64 = 1e-6;

/// Clamp `value` into `[lo, hi]`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Axis index used when reporting minimum-penetration directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

/// World-space axis-aligned bounding box in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

/// Minimum translation vector resolving an AABB/AABB penetration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mtv {
    pub axis: Axis,
    pub depth_mm: f64,
    pub sign: f64,
}

impl Aabb {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Box for a cuboid of `dimensions` centered at `center`, rotated by
    /// XYZ euler angles in degrees. Rotation widens the half-extents via the
    /// absolute rotation matrix, so the result always contains the cuboid.
    pub fn from_center_dims(
        center: [f64; 3],
        dimensions: [f64; 3],
        rotation_deg: [f64; 3],
    ) -> Self {
        let half = [
            dimensions[0] / 2.0,
            dimensions[1] / 2.0,
            dimensions[2] / 2.0,
        ];
        let world_half = if rotation_deg == [0.0, 0.0, 0.0] {
            half
        } else {
            let (rx, ry, rz) = (
                rotation_deg[0].to_radians(),
                rotation_deg[1].to_radians(),
                rotation_deg[2].to_radians(),
            );
            let (cx, sx) = (rx.cos(), rx.sin());
            let (cy, sy) = (ry.cos(), ry.sin());
            let (cz, sz) = (rz.cos(), rz.sin());
            // XYZ euler order.
            let r = [
                [cy * cz, -cy * sz, sy],
                [sx * sy * cz + cx * sz, -sx * sy * sz + cx * cz, -sx * cy],
                [-cx * sy * cz + sx * sz, cx * sy * sz + sx * cz, cx * cy],
            ];
            [
                r[0][0].abs() * half[0] + r[0][1].abs() * half[1] + r[0][2].abs() * half[2],
                r[1][0].abs() * half[0] + r[1][1].abs() * half[1] + r[1][2].abs() * half[2],
                r[2][0].abs() * half[0] + r[2][1].abs() * half[1] + r[2][2].abs() * half[2],
            ]
        };
        Self {
            min: Point3::new(
                center[0] - world_half[0],
                center[1] - world_half[1],
                center[2] - world_half[2],
            ),
            max: Point3::new(
                center[0] + world_half[0],
                center[1] + world_half[1],
                center[2] + world_half[2],
            ),
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Per-axis extents, never negative.
    pub fn spans(&self) -> [f64; 3] {
        [
            (self.max.x - self.min.x).max(0.0),
            (self.max.y - self.min.y).max(0.0),
            (self.max.z - self.min.z).max(0.0),
        ]
    }

    /// Intersection box, or `None` when the boxes do not overlap.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = Point3::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        );
        let max = Point3::new(
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        );
        if max.x - min.x <= 0.0 || max.y - min.y <= 0.0 || max.z - min.z <= 0.0 {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn overlap_volume(&self, other: &Self) -> f64 {
        match self.intersection(other) {
            Some(ix) => {
                let s = ix.spans();
                s[0] * s[1] * s[2]
            }
            None => 0.0,
        }
    }

    /// Minimum-penetration axis, depth and push sign for two overlapping
    /// boxes. Sign pushes `self` away from `other` along the chosen axis.
    pub fn mtv(&self, other: &Self) -> Option<Mtv> {
        let ix = self.intersection(other)?;
        let spans = ix.spans();
        let (axis, depth_mm) = [Axis::X, Axis::Y, Axis::Z]
            .into_iter()
            .zip(spans)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        let idx = axis.index();
        let sign = if self.center().coords[idx] < other.center().coords[idx] {
            -1.0
        } else {
            1.0
        };
        Some(Mtv {
            axis,
            depth_mm,
            sign,
        })
    }

    /// Vertical gap between two boxes, 0.0 when they touch or overlap in z.
    pub fn z_clearance(&self, other: &Self) -> f64 {
        if self.max.z < other.min.z {
            other.min.z - self.max.z
        } else if other.max.z < self.min.z {
            self.min.z - other.max.z
        } else {
            0.0
        }
    }
}
