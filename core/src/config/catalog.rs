//! Preset catalog: layered defaults merged global -> style -> preset -> variant.
//!
//! Raw input values remain the highest-precedence layer and are applied by
//! the resolver, not here. The catalog is an immutable value injected into
//! each resolution rather than a process-wide table.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

/// One preset under a style: base overrides plus optional named variants.
#[derive(Debug, Clone, Default)]
pub struct PresetDefinition {
    pub base: Value,
    pub variants: BTreeMap<String, Value>,
}

/// One style: its default preset id, base overrides, and presets.
#[derive(Debug, Clone)]
pub struct StyleDefinition {
    pub default_preset_id: String,
    pub base: Value,
    pub presets: BTreeMap<String, PresetDefinition>,
}

/// Read-only layered preset catalog.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    global_defaults: Value,
    styles: BTreeMap<String, StyleDefinition>,
}

fn normalize_style(style: &str) -> String {
    let normalized = style.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        "default".to_string()
    } else {
        normalized
    }
}

/// Recursive object merge; `patch` wins on conflicts, objects merge key-wise.
pub fn deep_merge(base: &Value, patch: &Value) -> Value {
    match (base.as_object(), patch.as_object()) {
        (Some(base_map), Some(patch_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in patch_map {
                let entry = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

impl PresetCatalog {
    pub fn new(global_defaults: Value, styles: BTreeMap<String, StyleDefinition>) -> Self {
        Self {
            global_defaults,
            styles,
        }
    }

    /// The default preset id for a style; "default" when the style is unknown.
    pub fn default_preset_id(&self, style: &str) -> String {
        match self.styles.get(&normalize_style(style)) {
            Some(def) if !def.default_preset_id.trim().is_empty() => {
                def.default_preset_id.trim().to_string()
            }
            _ => "default".to_string(),
        }
    }

    /// Merged defaults for style/preset/variant. An unknown preset id falls
    /// back to the style's default preset; an unknown variant id is ignored.
    pub fn merged(&self, style: &str, preset_id: Option<&str>, variant_id: Option<&str>) -> Value {
        let style_key = normalize_style(style);
        let mut merged = self.global_defaults.clone();

        let Some(style_def) = self.styles.get(&style_key) else {
            return merged;
        };
        if style_def.base.is_object() {
            merged = deep_merge(&merged, &style_def.base);
        }

        let requested = preset_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_preset_id(style));
        let preset = style_def.presets.get(&requested).or_else(|| {
            style_def
                .presets
                .get(&self.default_preset_id(style))
        });
        let Some(preset) = preset else {
            return merged;
        };
        if preset.base.is_object() {
            merged = deep_merge(&merged, &preset.base);
        }

        if let Some(variant_key) = variant_id.map(str::trim).filter(|id| !id.is_empty()) {
            if let Some(patch) = preset.variants.get(variant_key) {
                merged = deep_merge(&merged, patch);
            }
        }
        merged
    }

    /// The effective preset id a resolution will use.
    pub fn effective_preset_id(&self, style: &str, preset_id: Option<&str>) -> String {
        let requested = preset_id.map(str::trim).filter(|id| !id.is_empty());
        match requested {
            Some(id) => {
                let style_key = normalize_style(style);
                let known = self
                    .styles
                    .get(&style_key)
                    .map(|def| def.presets.contains_key(id))
                    .unwrap_or(false);
                if known {
                    id.to_string()
                } else {
                    self.default_preset_id(style)
                }
            }
            None => self.default_preset_id(style),
        }
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        builtin_catalog()
    }
}

/// The stock catalog: global defaults plus the scandi style.
pub fn builtin_catalog() -> PresetCatalog {
    let global_defaults = json!({
        "seat": {
            "width_mm": 600.0,
            "depth_mm": 600.0,
            "height_mm": 440.0,
            "count": 3,
        },
        "frame": {
            "thickness_mm": 35.0,
            "back_thickness_mm": 90.0,
            "back_height_above_seat_mm": 420.0,
        },
        "slats": {
            "enabled": false,
            "count": 14,
            "width_mm": 60.0,
            "thickness_mm": 12.0,
            "margin_x_mm": 40.0,
            "margin_y_mm": 30.0,
            "rail_inset_mm": 0.0,
            "rail_inset_y_mm": 5.0,
            "rail_width_mm": 30.0,
            "rail_height_mm": 30.0,
            "mount_mode": "rests_on_plane",
            "mount_offset_mm": 0.0,
            "clearance_mm": 0.0,
            "arc_height_mm": 0.0,
            "arc_sign": 1.0,
        },
        "arms": {
            "type": "none",
            "width_mm": 120.0,
            "profile": "box",
        },
        "legs": {
            "family": "block",
            "height_mm": 160.0,
            "params": {},
        },
        "back": {
            "mode": "panel",
            "offset_y_mm": 0.0,
            "margin_x_mm": 40.0,
            "margin_z_mm": 30.0,
            "rail_inset_mm": 0.0,
            // Rail and center post dimensions are absent on purpose: their
            // defaults derive from the frame thickness at resolve time.
            "frame": {
                "bottom_rail_split": false,
                "bottom_rail_gap_mm": 60.0,
                "split_center": false,
                "frame_layout": "single",
                "bottom_rail_attach_mode": "seat_rear_beam",
                "center_post_width_mm": null,
                "center_post": {
                    "enabled": false,
                    "inset_y_mm": 0.0,
                },
            },
            "slats": {
                "orientation": "vertical",
                "layout": "full",
                "count": 10,
                "width_mm": 35.0,
                "thickness_mm": 10.0,
                "arc_height_mm": 0.0,
                "arc_sign": -1.0,
                "gap_mm": 0.0,
                "center_gap_mm": 0.0,
            },
            "straps": {
                "count": 6,
                "width_mm": 30.0,
                "thickness_mm": 6.0,
            },
        },
    });

    let scandi_preset = PresetDefinition {
        base: json!({
            "back": {
                "mode": "slats",
                "frame": {
                    "frame_layout": "split_2",
                    "split_center": true,
                },
                "slats": {
                    "orientation": "horizontal",
                    "layout": "split_center",
                },
            },
        }),
        variants: BTreeMap::new(),
    };

    let mut scandi_presets = BTreeMap::new();
    scandi_presets.insert("scandi_straight_v1".to_string(), scandi_preset);

    let mut styles = BTreeMap::new();
    styles.insert(
        "scandi".to_string(),
        StyleDefinition {
            default_preset_id: "scandi_straight_v1".to_string(),
            base: Value::Null,
            presets: scandi_presets,
        },
    );

    PresetCatalog::new(global_defaults, styles)
}
