//! The build plan: an ordered list of primitives plus named anchors.
//!
//! A plan is pure data. Downstream consumers (mesh generation, export,
//! debug tooling) read it; nothing in this crate mutates a plan after the
//! builders finish.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::Point3;

/// Primitive shape tag. The open variant carries an unrecognized leg family
/// through to downstream consumers untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Beam,
    Board,
    Slat,
    Cube,
    TaperedCone,
    Cylindrical,
    #[serde(untagged)]
    Passthrough(String),
}

impl Shape {
    pub fn label(&self) -> &str {
        match self {
            Self::Beam => "beam",
            Self::Board => "board",
            Self::Slat => "slat",
            Self::Cube => "cube",
            Self::TaperedCone => "tapered_cone",
            Self::Cylindrical => "cylindrical",
            Self::Passthrough(name) => name,
        }
    }
}

/// One solid in the plan. Dimensions are full extents along X/Y/Z before
/// rotation; location is the center of the solid in frame coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub name: String,
    pub shape: Shape,
    pub dimensions_mm: [f64; 3],
    pub location_mm: [f64; 3],
    pub rotation_deg: [f64; 3],
    /// Numeric shape parameters (arc heights, radii, row indices).
    pub params: BTreeMap<String, f64>,
}

impl Primitive {
    pub fn new(name: impl Into<String>, shape: Shape, dimensions_mm: [f64; 3], location_mm: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            shape,
            dimensions_mm,
            location_mm,
            rotation_deg: [0.0; 3],
            params: BTreeMap::new(),
        }
    }

    pub fn beam(name: impl Into<String>, dimensions_mm: [f64; 3], location_mm: [f64; 3]) -> Self {
        Self::new(name, Shape::Beam, dimensions_mm, location_mm)
    }

    pub fn board(name: impl Into<String>, dimensions_mm: [f64; 3], location_mm: [f64; 3]) -> Self {
        Self::new(name, Shape::Board, dimensions_mm, location_mm)
    }

    pub fn slat(name: impl Into<String>, dimensions_mm: [f64; 3], location_mm: [f64; 3]) -> Self {
        Self::new(name, Shape::Slat, dimensions_mm, location_mm)
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn with_rotation(mut self, rotation_deg: [f64; 3]) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    pub fn center(&self) -> Point3 {
        Point3::new(self.location_mm[0], self.location_mm[1], self.location_mm[2])
    }
}

/// A named reference point for downstream placement (cushions, hardware,
/// deformation targets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub name: String,
    pub location_mm: [f64; 3],
}

impl Anchor {
    pub fn new(name: impl Into<String>, location_mm: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            location_mm,
        }
    }
}

/// Ordered build plan plus plan-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub primitives: Vec<Primitive>,
    pub anchors: Vec<Anchor>,
    pub metadata: BTreeMap<String, String>,
}

impl BuildPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn push_anchor(&mut self, name: impl Into<String>, location_mm: [f64; 3]) {
        self.anchors.push(Anchor::new(name, location_mm));
    }

    pub fn primitive(&self, name: &str) -> Option<&Primitive> {
        self.primitives.iter().find(|p| p.name == name)
    }

    pub fn anchor(&self, name: &str) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.name == name)
    }

    /// Stable serializable snapshot: keys sorted, every number rounded to
    /// six decimals. Two identical builds produce byte-identical snapshots.
    pub fn snapshot(&self) -> Value {
        let primitives: Vec<Value> = self
            .primitives
            .iter()
            .map(|p| {
                let mut record = Map::new();
                record.insert("dimensions_mm".into(), round_triple(p.dimensions_mm));
                record.insert("location_mm".into(), round_triple(p.location_mm));
                record.insert("name".into(), Value::String(p.name.clone()));
                record.insert(
                    "params".into(),
                    Value::Object(
                        p.params
                            .iter()
                            .map(|(k, v)| (k.clone(), round6_value(*v)))
                            .collect(),
                    ),
                );
                record.insert("rotation_deg".into(), round_triple(p.rotation_deg));
                record.insert("shape".into(), Value::String(p.shape.label().to_string()));
                Value::Object(record)
            })
            .collect();
        let anchors: Vec<Value> = self
            .anchors
            .iter()
            .map(|a| {
                let mut record = Map::new();
                record.insert("location_mm".into(), round_triple(a.location_mm));
                record.insert("name".into(), Value::String(a.name.clone()));
                Value::Object(record)
            })
            .collect();

        let mut root = Map::new();
        root.insert("anchors".into(), Value::Array(anchors));
        root.insert(
            "metadata".into(),
            Value::Object(
                self.metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
        root.insert("primitives".into(), Value::Array(primitives));
        Value::Object(root)
    }

    pub fn snapshot_string(&self) -> String {
        // Map preserves insertion order and every map above is inserted in
        // sorted key order, so the string form is stable too.
        self.snapshot().to_string()
    }
}

pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn round6_value(value: f64) -> Value {
    serde_json::Number::from_f64(round6(value))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn round_triple(values: [f64; 3]) -> Value {
    Value::Array(values.iter().map(|v| round6_value(*v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round6() {
        assert_eq!(round6(1.0000004), 1.0);
        assert_eq!(round6(1.2345678), 1.234568);
        assert_eq!(round6(-0.0000004), -0.0);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(
            Primitive::beam("beam_front", [1800.0, 35.0, 35.0], [0.0, 282.5, 387.5])
                .with_param("arc_height_mm", 0.1 + 0.2),
        );
        plan.push_anchor("seat_zone", [0.0, 0.0, 422.5]);
        plan.metadata.insert("style".into(), "default".into());

        let a = plan.snapshot_string();
        let b = plan.snapshot_string();
        assert_eq!(a, b);
        // 0.1 + 0.2 rounds clean at six decimals.
        assert!(a.contains("0.3"));
        assert!(!a.contains("0.30000000000000004"));
    }

    #[test]
    fn test_snapshot_keys_sorted() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(Primitive::board("seat_support", [1800.0, 600.0, 35.0], [0.0, 0.0, 422.5]));
        let text = plan.snapshot_string();
        let anchors_at = text.find("\"anchors\"").unwrap();
        let metadata_at = text.find("\"metadata\"").unwrap();
        let primitives_at = text.find("\"primitives\"").unwrap();
        assert!(anchors_at < metadata_at && metadata_at < primitives_at);
    }

    #[test]
    fn test_passthrough_shape_label() {
        let shape = Shape::Passthrough("hairpin_v2".into());
        assert_eq!(shape.label(), "hairpin_v2");
        assert_eq!(Shape::TaperedCone.label(), "tapered_cone");
    }

    #[test]
    fn test_lookup_by_name() {
        let mut plan = BuildPlan::new();
        plan.push_primitive(Primitive::beam("beam_left", [35.0, 600.0, 35.0], [-882.5, 0.0, 387.5]));
        plan.push_anchor("back_zone", [0.0, -282.5, 650.0]);
        assert!(plan.primitive("beam_left").is_some());
        assert!(plan.primitive("beam_right").is_none());
        assert_eq!(plan.anchor("back_zone").unwrap().location_mm[2], 650.0);
    }
}
