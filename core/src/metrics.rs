//! Scene metrics computed from a plan: world-space boxes, name-based
//! groups, and pairwise overlap tables for the monitored group pairs.
//!
//! Metrics are pure measurement. Judgement (severity, scoring) lives in the
//! validator; movement (patching) lives in the autofix engine.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::{Aabb, Mtv};
use crate::plan::BuildPlan;

pub const GROUP_SLATS: &str = "slat_";
pub const GROUP_BACK_SLATS: &str = "back_slat_";
pub const GROUP_ARMS: &str = "arm_";
pub const GROUP_FRAME: &str = "frame_";
pub const GROUP_LEGS: &str = "leg_";

pub const PAIR_SLATS_VS_ARMS: &str = "slats_vs_arms";
pub const PAIR_SLATS_VS_FRAME: &str = "slats_vs_frame";
pub const PAIR_BACK_SLATS_VS_FRAME: &str = "back_slats_vs_frame";

/// Monitored group pairs, in reporting order.
const MONITORED_PAIRS: &[(&str, &str, &str)] = &[
    (PAIR_SLATS_VS_ARMS, GROUP_SLATS, GROUP_ARMS),
    (PAIR_SLATS_VS_FRAME, GROUP_SLATS, GROUP_FRAME),
    (PAIR_BACK_SLATS_VS_FRAME, GROUP_BACK_SLATS, GROUP_FRAME),
];

/// Assign a primitive to a metrics group by name.
pub fn group_key(name: &str) -> Option<&'static str> {
    if name.starts_with(GROUP_BACK_SLATS) {
        return Some(GROUP_BACK_SLATS);
    }
    if name.starts_with(GROUP_SLATS) {
        return Some(GROUP_SLATS);
    }
    if name.starts_with("arm_")
        || name.starts_with("left_arm")
        || name.starts_with("right_arm")
        || name.contains("_arm_")
    {
        return Some(GROUP_ARMS);
    }
    if name.starts_with("frame_")
        || name.starts_with("beam_")
        || name.starts_with("rail_")
        || name.starts_with("back_rail_")
        || matches!(name, "seat_support" | "back_frame" | "back_panel")
    {
        return Some(GROUP_FRAME);
    }
    if name.starts_with(GROUP_LEGS) {
        return Some(GROUP_LEGS);
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectMetrics {
    pub name: String,
    pub bbox: Aabb,
    /// Span change versus the undeformed primitive, per axis. Zero here;
    /// a deformation stage downstream feeds real deltas back in.
    pub bbox_delta_mm: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMetrics {
    pub count: usize,
    pub members: Vec<String>,
    pub bbox: Aabb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapPair {
    pub pair_index: usize,
    pub left: String,
    pub right: String,
    pub volume_mm3: f64,
    pub bbox: Aabb,
    pub mtv: Option<Mtv>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlapMetrics {
    pub pairs: Vec<OverlapPair>,
    pub total_volume_mm3: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneMetrics {
    pub objects: BTreeMap<String, ObjectMetrics>,
    pub groups: BTreeMap<String, GroupMetrics>,
    pub overlaps: BTreeMap<String, OverlapMetrics>,
}

impl SceneMetrics {
    pub fn from_plan(plan: &BuildPlan) -> Self {
        let mut objects = BTreeMap::new();
        let mut group_members: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();

        for primitive in &plan.primitives {
            let bbox = Aabb::from_center_dims(
                primitive.location_mm,
                primitive.dimensions_mm,
                primitive.rotation_deg,
            );
            objects.insert(
                primitive.name.clone(),
                ObjectMetrics {
                    name: primitive.name.clone(),
                    bbox,
                    bbox_delta_mm: [0.0; 3],
                },
            );
            if let Some(key) = group_key(&primitive.name) {
                group_members.entry(key).or_default().push(primitive.name.clone());
            }
        }

        let mut groups = BTreeMap::new();
        for (key, members) in group_members {
            let bbox = members
                .iter()
                .filter_map(|name| objects.get(name))
                .fold(Aabb::empty(), |acc, obj| acc.union(&obj.bbox));
            groups.insert(
                key.to_string(),
                GroupMetrics {
                    count: members.len(),
                    members,
                    bbox,
                },
            );
        }

        let mut overlaps = BTreeMap::new();
        for (pair_key, left_group, right_group) in MONITORED_PAIRS {
            let mut metrics = OverlapMetrics::default();
            let left_members = groups.get(*left_group).map(|g| g.members.as_slice());
            let right_members = groups.get(*right_group).map(|g| g.members.as_slice());
            if let (Some(lefts), Some(rights)) = (left_members, right_members) {
                for left in lefts {
                    for right in rights {
                        let (Some(l), Some(r)) = (objects.get(left), objects.get(right)) else {
                            continue;
                        };
                        let volume = l.bbox.overlap_volume(&r.bbox);
                        if volume <= 0.0 {
                            continue;
                        }
                        metrics.pairs.push(OverlapPair {
                            pair_index: metrics.pairs.len(),
                            left: left.clone(),
                            right: right.clone(),
                            volume_mm3: volume,
                            bbox: l.bbox.intersection(&r.bbox).unwrap_or_else(Aabb::empty),
                            mtv: l.bbox.mtv(&r.bbox),
                        });
                        metrics.total_volume_mm3 += volume;
                    }
                }
            }
            overlaps.insert(pair_key.to_string(), metrics);
        }

        Self {
            objects,
            groups,
            overlaps,
        }
    }

    pub fn group(&self, key: &str) -> Option<&GroupMetrics> {
        self.groups.get(key)
    }

    pub fn overlap(&self, key: &str) -> Option<&OverlapMetrics> {
        self.overlaps.get(key)
    }

    pub fn overlap_total(&self, key: &str) -> f64 {
        self.overlaps
            .get(key)
            .map(|m| m.total_volume_mm3)
            .unwrap_or(0.0)
    }
}
