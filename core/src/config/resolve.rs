//! The resolver: raw document + preset catalog -> [`ResolvedSpec`].
//!
//! Field priority is raw value > variant > preset > style > global default.
//! Resolution never fails on field content; every clamp, enum fallback and
//! defaulted block is reported through the diagnostics channel instead.

use serde_json::{json, Map, Value};

use crate::config::catalog::PresetCatalog;
use crate::config::types::*;
use crate::config::{coerce_or, Coerce, RawConfig};
use crate::diagnostics::{BuildContext, Component, Event, EventSpec, Source, Stage};
use crate::BuildError;

const BACK_SUPPORT_MODES: &[&str] = &["panel", "slats", "straps"];
const BACK_ATTACH_MODES: &[&str] = &["seat_rear_beam", "none"];
const BACK_SLAT_ORIENTATIONS: &[&str] = &["vertical", "horizontal"];
const BACK_SLAT_LAYOUTS: &[&str] = &["full", "split_center"];
const MOUNT_MODES: &[&str] = &["rests_on_plane", "centered"];
const ARMS_TYPES: &[&str] = &["none", "left", "right", "both"];

/// Arm profile aliases accepted in raw input; all map onto the open frame.
const OPEN_FRAME_ALIASES: &[&str] = &[
    "scandi_frame",
    "frame_open",
    "scandi_open_frame",
    "frame_box_open",
];

struct Resolver<'a> {
    ctx: &'a BuildContext,
    events: Vec<Event>,
}

impl Resolver<'_> {
    fn emit(&mut self, code: &str, severity: i64, path: &str, source: Source, input: Value, resolved: Value, reason: String) {
        let event = self.ctx.emit(EventSpec {
            stage: Some(Stage::Resolve),
            component: Some(Component::Resolver),
            code: code.to_string(),
            severity,
            path: path.to_string(),
            source: Some(source),
            input_value: input,
            resolved_value: resolved,
            reason,
            ..Default::default()
        });
        self.events.push(event);
    }

    /// Coerce + clamp a numeric field, reporting when the value was altered.
    fn clamp_f64(
        &mut self,
        value: Option<&Value>,
        source: Source,
        default: f64,
        path: &str,
        lo: f64,
        hi: f64,
    ) -> f64 {
        let input = coerce_or(value, default);
        let clamped = input.max(lo).min(hi);
        if clamped != input {
            let reason = if hi == f64::MAX {
                format!("{path} clamped to >= {lo}")
            } else {
                format!("{path} clamped to [{lo}, {hi}]")
            };
            self.emit("CLAMP", 1, path, source, json!(input), json!(clamped), reason);
        }
        clamped
    }

    fn non_negative(&mut self, value: Option<&Value>, source: Source, default: f64, path: &str) -> f64 {
        self.clamp_f64(value, source, default, path, 0.0, f64::MAX)
    }

    fn clamp_count(
        &mut self,
        value: Option<&Value>,
        source: Source,
        default: i64,
        path: &str,
        lo: i64,
        hi: i64,
    ) -> u32 {
        let input = coerce_or(value, default);
        let hi = hi.min(i64::from(u32::MAX));
        let clamped = input.clamp(lo, hi);
        if clamped != input {
            self.emit(
                "CLAMP",
                1,
                path,
                source,
                json!(input),
                json!(clamped),
                format!("{path} clamped to [{lo}, {hi}]"),
            );
        }
        u32::try_from(clamped).unwrap_or(u32::MAX)
    }

    /// Canonicalize an enum-valued field: lowercase + trim, fall back and
    /// report when a non-empty value is not in the allowed set.
    fn choice(
        &mut self,
        value: Option<&Value>,
        source: Source,
        path: &str,
        allowed: &[&str],
        fallback: &str,
    ) -> String {
        if let Some(Value::String(raw)) = value {
            let normalized = raw.trim().to_ascii_lowercase();
            if allowed.contains(&normalized.as_str()) {
                return normalized;
            }
            if !normalized.is_empty() {
                self.emit(
                    "FALLBACK",
                    1,
                    path,
                    source,
                    json!(raw),
                    json!(fallback),
                    format!("unsupported {path} fallback to {fallback}"),
                );
            }
        }
        fallback.to_string()
    }

    /// Borrow a nested object, reporting a fallback when the key is present
    /// but not an object.
    fn object_block<'v>(&mut self, root: &'v Map<String, Value>, key: &str) -> Option<&'v Map<String, Value>> {
        match root.get(key) {
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                self.emit(
                    "FALLBACK",
                    1,
                    key,
                    Source::Raw,
                    json!(json_type_name(other)),
                    json!({}),
                    format!("{key} must be an object; fallback to defaults"),
                );
                None
            }
            None => None,
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Pick a field value: raw object first, then the merged catalog defaults.
fn pick<'v>(
    explicit: Option<&'v Map<String, Value>>,
    defaults: Option<&'v Value>,
    key: &str,
) -> (Option<&'v Value>, Source) {
    if let Some(map) = explicit {
        if let Some(value) = map.get(key) {
            return (Some(value), Source::Raw);
        }
    }
    if let Some(value) = defaults.and_then(|d| d.get(key)).filter(|v| !v.is_null()) {
        return (Some(value), Source::Preset);
    }
    (None, Source::Global)
}

/// Resolve the raw document against the catalog. The only fatal condition is
/// a top-level value that is not a JSON object; everything else degrades to
/// defaults with a diagnostic trail.
pub fn resolve(
    raw: &RawConfig,
    preset_id: Option<&str>,
    variant_id: Option<&str>,
    catalog: &PresetCatalog,
    ctx: &BuildContext,
) -> Result<(ResolvedSpec, Vec<Event>), BuildError> {
    let root = raw
        .as_object()
        .ok_or_else(|| BuildError::MalformedInput(json_type_name(raw).to_string()))?;

    let mut r = Resolver {
        ctx,
        events: Vec::new(),
    };

    let style = match root.get("style") {
        Some(Value::String(s)) => {
            let normalized = s.trim().to_ascii_lowercase();
            if normalized.is_empty() {
                "default".to_string()
            } else {
                normalized
            }
        }
        _ => "default".to_string(),
    };
    let effective_preset_id = catalog.effective_preset_id(&style, preset_id);
    let merged = catalog.merged(&style, preset_id, variant_id);

    let seat = resolve_seat(&mut r, root, &merged);
    let frame = resolve_frame(&mut r, root, &merged);
    let slats = resolve_seat_slats(&mut r, root, &merged);
    let arms = resolve_arms(&mut r, root, &merged);
    let legs = resolve_legs(&mut r, root, &merged);
    let back = resolve_back(&mut r, root, &merged, &frame);

    let spec = ResolvedSpec {
        style,
        preset_id: effective_preset_id,
        seat,
        frame,
        slats,
        arms,
        back,
        legs,
    };
    Ok((spec, r.events))
}

fn resolve_seat(r: &mut Resolver<'_>, root: &Map<String, Value>, merged: &Value) -> SeatSpec {
    let defaults = merged.get("seat");
    let (width, ws) = pick_top_or(root, defaults, "seat_width_mm", "width_mm");
    let (depth, ds) = pick_top_or(root, defaults, "seat_depth_mm", "depth_mm");
    let (height, hs) = pick_top_or(root, defaults, "seat_height_mm", "height_mm");
    let (count, cs) = pick_top_or(root, defaults, "seat_count", "count");

    SeatSpec {
        width_mm: r.clamp_f64(width, ws, 600.0, "seat_width_mm", 350.0, 1200.0),
        depth_mm: r.clamp_f64(depth, ds, 600.0, "seat_depth_mm", 350.0, 900.0),
        height_mm: r.clamp_f64(height, hs, 440.0, "seat_height_mm", 250.0, 650.0),
        count: r.clamp_count(count, cs, 3, "seat_count", 1, 8),
    }
}

/// Seat fields live at the top level of the raw document but under `seat`
/// in the catalog, with different key names.
fn pick_top_or<'v>(
    root: &'v Map<String, Value>,
    defaults: Option<&'v Value>,
    top_key: &str,
    default_key: &str,
) -> (Option<&'v Value>, Source) {
    if let Some(value) = root.get(top_key) {
        return (Some(value), Source::Raw);
    }
    if let Some(value) = defaults.and_then(|d| d.get(default_key)).filter(|v| !v.is_null()) {
        return (Some(value), Source::Preset);
    }
    (None, Source::Global)
}

fn resolve_frame(r: &mut Resolver<'_>, root: &Map<String, Value>, merged: &Value) -> FrameSpec {
    let explicit = r.object_block(root, "frame");
    let defaults = merged.get("frame");
    let (thickness, ts) = pick(explicit, defaults, "thickness_mm");
    let (back_thickness, bs) = pick(explicit, defaults, "back_thickness_mm");
    let (back_height, hs) = pick(explicit, defaults, "back_height_above_seat_mm");

    FrameSpec {
        thickness_mm: r.clamp_f64(thickness, ts, 35.0, "frame.thickness_mm", 20.0, 80.0),
        back_thickness_mm: r.clamp_f64(
            back_thickness,
            bs,
            90.0,
            "frame.back_thickness_mm",
            50.0,
            180.0,
        ),
        back_height_above_seat_mm: r.clamp_f64(
            back_height,
            hs,
            420.0,
            "frame.back_height_above_seat_mm",
            250.0,
            700.0,
        ),
    }
}

fn resolve_seat_slats(r: &mut Resolver<'_>, root: &Map<String, Value>, merged: &Value) -> SeatSlatsSpec {
    let explicit = r.object_block(root, "slats");
    let defaults = merged.get("slats");

    let (enabled, _) = pick(explicit, defaults, "enabled");
    let (count, cs) = pick(explicit, defaults, "count");
    let (width, ws) = pick(explicit, defaults, "width_mm");
    let (thickness, ts) = pick(explicit, defaults, "thickness_mm");
    let (margin_x, mxs) = pick(explicit, defaults, "margin_x_mm");
    let (margin_y, mys) = pick(explicit, defaults, "margin_y_mm");
    let (rail_inset, ris) = pick(explicit, defaults, "rail_inset_mm");
    let (rail_inset_y, riys) = pick(explicit, defaults, "rail_inset_y_mm");
    let (rail_width, rws) = pick(explicit, defaults, "rail_width_mm");
    let (rail_height, rhs) = pick(explicit, defaults, "rail_height_mm");
    let (mount_mode, ms) = pick(explicit, defaults, "mount_mode");
    let (mount_offset, mos) = pick(explicit, defaults, "mount_offset_mm");
    let (clearance, cls) = pick(explicit, defaults, "clearance_mm");
    let (arc_height, ahs) = pick(explicit, defaults, "arc_height_mm");
    let (arc_sign, _) = pick(explicit, defaults, "arc_sign");

    let mount_mode = match r
        .choice(mount_mode, ms, "slats.mount_mode", MOUNT_MODES, "rests_on_plane")
        .as_str()
    {
        "centered" => MountMode::Centered,
        _ => MountMode::RestsOnPlane,
    };

    SeatSlatsSpec {
        enabled: coerce_or(enabled, false),
        count: r.clamp_count(count, cs, 14, "slats.count", 1, i64::MAX),
        width_mm: r.non_negative(width, ws, 60.0, "slats.width_mm"),
        thickness_mm: r.non_negative(thickness, ts, 12.0, "slats.thickness_mm"),
        margin_x_mm: r.non_negative(margin_x, mxs, 40.0, "slats.margin_x_mm"),
        margin_y_mm: r.non_negative(margin_y, mys, 30.0, "slats.margin_y_mm"),
        rail_inset_mm: r.non_negative(rail_inset, ris, 0.0, "slats.rail_inset_mm"),
        rail_inset_y_mm: r.non_negative(rail_inset_y, riys, 5.0, "slats.rail_inset_y_mm"),
        rail_width_mm: r.non_negative(rail_width, rws, 30.0, "slats.rail_width_mm"),
        rail_height_mm: r.non_negative(rail_height, rhs, 30.0, "slats.rail_height_mm"),
        mount_mode,
        mount_offset_mm: r.non_negative(mount_offset, mos, 0.0, "slats.mount_offset_mm"),
        clearance_mm: r.non_negative(clearance, cls, 0.0, "slats.clearance_mm"),
        arc_height_mm: r.non_negative(arc_height, ahs, 0.0, "slats.arc_height_mm"),
        arc_sign: coerce_or(arc_sign, 1.0),
    }
}

fn resolve_arms(r: &mut Resolver<'_>, root: &Map<String, Value>, merged: &Value) -> ArmsSpec {
    let explicit = r.object_block(root, "arms");
    let defaults = merged.get("arms");

    let (kind_raw, ks) = pick(explicit, defaults, "type");
    let kind = match r.choice(kind_raw, ks, "arms.type", ARMS_TYPES, "none").as_str() {
        "left" => ArmsType::Left,
        "right" => ArmsType::Right,
        "both" => ArmsType::Both,
        _ => ArmsType::None,
    };

    let (width, ws) = pick(explicit, defaults, "width_mm");
    let width_mm = r.clamp_f64(width, ws, 120.0, "arms.width_mm", 0.0, 400.0);

    let (profile_raw, ps) = pick(explicit, defaults, "profile");
    let (style_raw, _) = pick(explicit, defaults, "style");
    let profile = canonical_profile(r, profile_raw, style_raw, ps);

    ArmsSpec {
        kind,
        width_mm,
        profile,
    }
}

/// Open-frame aliases win over the plain box profile; an `arms.style` alias
/// promotes `box` to the open frame as well. Unknown non-empty profiles fall
/// back to `box` with a diagnostic.
fn canonical_profile(
    r: &mut Resolver<'_>,
    profile_raw: Option<&Value>,
    style_raw: Option<&Value>,
    source: Source,
) -> ArmProfile {
    let profile_text = profile_raw
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let style_text = style_raw
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let style_is_open = OPEN_FRAME_ALIASES.contains(&style_text.as_str());

    if OPEN_FRAME_ALIASES.contains(&profile_text.as_str()) {
        return ArmProfile::FrameBoxOpen;
    }
    if profile_text == "box" {
        return if style_is_open {
            ArmProfile::FrameBoxOpen
        } else {
            ArmProfile::Box
        };
    }
    if style_is_open {
        return ArmProfile::FrameBoxOpen;
    }
    if !profile_text.is_empty() {
        r.emit(
            "FALLBACK",
            1,
            "arms.profile",
            source,
            json!(profile_text),
            json!("box"),
            "unsupported arms.profile fallback to box".to_string(),
        );
    }
    ArmProfile::Box
}

fn resolve_legs(r: &mut Resolver<'_>, root: &Map<String, Value>, merged: &Value) -> LegsSpec {
    let explicit = r.object_block(root, "legs");
    let defaults = merged.get("legs");

    let (family_raw, _) = pick(explicit, defaults, "family");
    let family = family_raw
        .and_then(Value::as_str)
        .map(LegFamily::from_raw)
        .unwrap_or(LegFamily::Block);

    let (height, hs) = pick(explicit, defaults, "height_mm");
    let height_mm = r.clamp_f64(height, hs, 160.0, "legs.height_mm", 30.0, 260.0);

    let mut params = std::collections::BTreeMap::new();
    let (params_raw, _) = pick(explicit, defaults, "params");
    if let Some(Value::Object(map)) = params_raw {
        for (key, value) in map {
            if let Some(number) = f64::coerce(value) {
                params.insert(key.clone(), number);
            }
        }
    }

    LegsSpec {
        family,
        height_mm,
        params,
    }
}

fn resolve_back(
    r: &mut Resolver<'_>,
    root: &Map<String, Value>,
    merged: &Value,
    frame: &FrameSpec,
) -> BackSpec {
    let provided = root.contains_key("back_support");
    let back_support = r.object_block(root, "back_support");
    let defaults = merged.get("back");
    let frame_defaults = defaults.and_then(|d| d.get("frame"));
    let slats_defaults = defaults.and_then(|d| d.get("slats"));
    let straps_defaults = defaults.and_then(|d| d.get("straps"));
    let center_post_defaults = frame_defaults.and_then(|d| d.get("center_post"));

    let (mode_raw, ms) = pick(back_support, defaults, "mode");
    let mode = match r
        .choice(mode_raw, ms, "back_support.mode", BACK_SUPPORT_MODES, "panel")
        .as_str()
    {
        "slats" => BackMode::Slats,
        "straps" => BackMode::Straps,
        _ => BackMode::Panel,
    };

    if !provided {
        r.emit(
            "DEFAULT_USED",
            0,
            "back_support",
            Source::Global,
            Value::Null,
            json!(mode),
            "back_support not provided; defaults resolved for future component use".to_string(),
        );
    }

    let (height, hs) = pick(back_support, defaults, "height_above_seat_mm");
    let height_above_seat_mm = r.non_negative(
        height,
        hs,
        frame.back_height_above_seat_mm,
        "back_support.height_above_seat_mm",
    );
    let (thickness, ts) = pick(back_support, defaults, "thickness_mm");
    let thickness_mm = r.non_negative(
        thickness,
        ts,
        frame.back_thickness_mm,
        "back_support.thickness_mm",
    );
    let (offset_y, oys) = pick(back_support, defaults, "offset_y_mm");
    let offset_y_mm = r.clamp_f64(offset_y, oys, 0.0, "back_support.offset_y_mm", -100.0, 200.0);
    let (margin_x, mxs) = pick(back_support, defaults, "margin_x_mm");
    let margin_x_mm = r.non_negative(margin_x, mxs, 40.0, "back_support.margin_x_mm");
    let (margin_z, mzs) = pick(back_support, defaults, "margin_z_mm");
    let margin_z_mm = r.non_negative(margin_z, mzs, 30.0, "back_support.margin_z_mm");
    let (rail_inset, ris) = pick(back_support, defaults, "rail_inset_mm");
    let rail_inset_mm = r.non_negative(rail_inset, ris, 0.0, "back_support.rail_inset_mm");
    let (rail_width, rws) = pick(back_support, defaults, "rail_width_mm");
    let rail_width_mm = r.non_negative(
        rail_width,
        rws,
        frame.thickness_mm,
        "back_support.rail_width_mm",
    );
    let (rail_depth, rds) = pick(back_support, defaults, "rail_depth_mm");
    let rail_depth_mm = r.non_negative(
        rail_depth,
        rds,
        frame.thickness_mm,
        "back_support.rail_depth_mm",
    );
    let (rail_height, rhs) = pick(back_support, defaults, "rail_height_mm");
    let rail_height_mm = r.non_negative(
        rail_height,
        rhs,
        rail_width_mm,
        "back_support.rail_height_mm",
    );

    let (bottom_rail_split, _) = pick(back_support, frame_defaults, "bottom_rail_split");
    let bottom_rail_split = coerce_or(bottom_rail_split, false);
    let (bottom_rail_gap, bgs) = pick(back_support, frame_defaults, "bottom_rail_gap_mm");
    let bottom_rail_gap_mm =
        r.non_negative(bottom_rail_gap, bgs, 60.0, "back_support.bottom_rail_gap_mm");
    let (split_center_raw, _) = pick(back_support, frame_defaults, "split_center");
    let split_center = coerce_or(split_center_raw, false);
    let (attach_raw, ats) = pick(back_support, frame_defaults, "bottom_rail_attach_mode");
    let bottom_rail_attach_mode = match r
        .choice(
            attach_raw,
            ats,
            "back_support.bottom_rail_attach_mode",
            BACK_ATTACH_MODES,
            "seat_rear_beam",
        )
        .as_str()
    {
        "none" => AttachMode::None,
        _ => AttachMode::SeatRearBeam,
    };

    // Bottom rail height defaults to half the rail height, with a legacy
    // thickness field honored when it still reads as a lowered rail.
    let default_bottom_rail_height_mm = (rail_height_mm * 0.5).round().max(10.0);
    let bottom_rail_height_mm = if let Some(value) =
        back_support.and_then(|bs| bs.get("bottom_rail_height_mm"))
    {
        coerce_or(Some(value), default_bottom_rail_height_mm)
    } else if let Some(value) = back_support.and_then(|bs| bs.get("bottom_rail_thickness_mm")) {
        let legacy = coerce_or(Some(value), default_bottom_rail_height_mm);
        if legacy < rail_height_mm {
            legacy
        } else {
            default_bottom_rail_height_mm
        }
    } else {
        let (value, _) = pick(back_support, frame_defaults, "bottom_rail_height_mm");
        coerce_or(value, default_bottom_rail_height_mm)
    };
    let bottom_rail_height_mm = r.non_negative(
        Some(&json!(bottom_rail_height_mm)),
        Source::Computed,
        default_bottom_rail_height_mm,
        "back_support.bottom_rail_height_mm",
    );

    let center_post_explicit = back_support
        .and_then(|bs| bs.get("center_post"))
        .and_then(Value::as_object);
    let (cp_enabled, _) = pick(center_post_explicit, center_post_defaults, "enabled");
    let center_post_enabled = coerce_or(cp_enabled, false);
    let (cp_thickness, cts) = pick(center_post_explicit, center_post_defaults, "thickness_mm");
    let center_post_thickness_mm = r.non_negative(
        cp_thickness,
        cts,
        rail_width_mm,
        "back_support.center_post.thickness_mm",
    );
    let (cp_inset, _) = pick(center_post_explicit, center_post_defaults, "inset_y_mm");
    let center_post_inset_y_mm = coerce_or(cp_inset, 0.0);

    let explicit_cp_thickness = center_post_explicit
        .map(|cp| cp.contains_key("thickness_mm"))
        .unwrap_or(false);
    let center_post_width_mm = if let Some(value) =
        back_support.and_then(|bs| bs.get("center_post_width_mm"))
    {
        coerce_or(Some(value), rail_width_mm)
    } else if center_post_enabled || explicit_cp_thickness {
        center_post_thickness_mm
    } else if let Some(value) = frame_defaults
        .and_then(|d| d.get("center_post_width_mm"))
        .filter(|v| !v.is_null())
    {
        coerce_or(Some(value), rail_width_mm)
    } else {
        rail_width_mm
    };
    let center_post_width_mm = r.non_negative(
        Some(&json!(center_post_width_mm)),
        Source::Computed,
        rail_width_mm,
        "back_support.center_post_width_mm",
    );

    let (layout_raw, ls) = pick(back_support, frame_defaults, "frame_layout");
    let frame_layout = match layout_raw.and_then(Value::as_str) {
        Some(text) => match text.trim().to_ascii_lowercase().as_str() {
            "split_2" => FrameLayout::Split2,
            "single" | "full" => FrameLayout::Single,
            other => {
                if !other.is_empty() {
                    r.emit(
                        "FALLBACK",
                        1,
                        "back_support.frame_layout",
                        ls,
                        json!(text),
                        json!("single"),
                        "unsupported back_support.frame_layout fallback to single".to_string(),
                    );
                }
                FrameLayout::Single
            }
        },
        None => {
            if bottom_rail_split {
                FrameLayout::Split2
            } else {
                FrameLayout::Single
            }
        }
    };

    let slats_explicit = back_support
        .and_then(|bs| bs.get("slats"))
        .and_then(Value::as_object);
    let (orientation_raw, ors) = pick(slats_explicit, slats_defaults, "orientation");
    let orientation = match r
        .choice(
            orientation_raw,
            ors,
            "back_support.slats.orientation",
            BACK_SLAT_ORIENTATIONS,
            "vertical",
        )
        .as_str()
    {
        "horizontal" => SlatOrientation::Horizontal,
        _ => SlatOrientation::Vertical,
    };
    let (layout_raw, lys) = pick(slats_explicit, slats_defaults, "layout");
    let slat_layout = match r
        .choice(
            layout_raw,
            lys,
            "back_support.slats.layout",
            BACK_SLAT_LAYOUTS,
            "full",
        )
        .as_str()
    {
        "split_center" => SlatLayout::SplitCenter,
        _ => SlatLayout::Full,
    };
    let (count_raw, cos) = pick(slats_explicit, slats_defaults, "count");
    let slat_count = r.clamp_count(count_raw, cos, 10, "back_support.slats.count", 0, i64::MAX);
    let (width_raw, sws) = pick(slats_explicit, slats_defaults, "width_mm");
    let slat_width_mm = r.non_negative(width_raw, sws, 35.0, "back_support.slats.width_mm");
    let (thickness_raw, sts) = pick(slats_explicit, slats_defaults, "thickness_mm");
    let slat_thickness_mm =
        r.non_negative(thickness_raw, sts, 10.0, "back_support.slats.thickness_mm");
    let (arc_raw, ars) = pick(slats_explicit, slats_defaults, "arc_height_mm");
    let slat_arc_height_mm =
        r.non_negative(arc_raw, ars, 0.0, "back_support.slats.arc_height_mm");
    let (arc_sign_raw, _) = pick(slats_explicit, slats_defaults, "arc_sign");
    let slat_arc_sign = coerce_or(arc_sign_raw, -1.0);
    let (gap_raw, gps) = pick(slats_explicit, slats_defaults, "gap_mm");
    let has_gap_mm = gps == Source::Raw || coerce_or(gap_raw, 0.0) > 0.0;
    let slat_gap_mm = r.non_negative(gap_raw, gps, 0.0, "back_support.slats.gap_mm");
    let (center_gap_raw, cgs) = pick(slats_explicit, slats_defaults, "center_gap_mm");
    let slat_center_gap_mm =
        r.non_negative(center_gap_raw, cgs, 0.0, "back_support.slats.center_gap_mm");

    let straps_explicit = back_support
        .and_then(|bs| bs.get("straps"))
        .and_then(Value::as_object);
    let (strap_count_raw, scs) = pick(straps_explicit, straps_defaults, "count");
    let strap_count = r.clamp_count(strap_count_raw, scs, 6, "back_support.straps.count", 0, i64::MAX);
    let (strap_width_raw, swss) = pick(straps_explicit, straps_defaults, "width_mm");
    let strap_width_mm = r.non_negative(strap_width_raw, swss, 30.0, "back_support.straps.width_mm");
    let (strap_thickness_raw, stss) = pick(straps_explicit, straps_defaults, "thickness_mm");
    let strap_thickness_mm = r.non_negative(
        strap_thickness_raw,
        stss,
        6.0,
        "back_support.straps.thickness_mm",
    );

    // A split-center request from any of the three inputs forces the split
    // frame layout, overriding explicit input.
    let split_center_requested =
        split_center || slat_layout == SlatLayout::SplitCenter || center_post_enabled;
    let frame_layout = if split_center_requested {
        FrameLayout::Split2
    } else {
        frame_layout
    };

    BackSpec {
        provided,
        mode,
        frame: BackFrameSpec {
            height_above_seat_mm,
            thickness_mm,
            offset_y_mm,
            margin_x_mm,
            margin_z_mm,
            rail_inset_mm,
            rail_width_mm,
            rail_depth_mm,
            rail_height_mm,
            bottom_rail_split,
            bottom_rail_gap_mm,
            split_center: split_center_requested,
            frame_layout,
            bottom_rail_attach_mode,
            bottom_rail_height_mm,
            center_post: CenterPostSpec {
                enabled: center_post_enabled,
                thickness_mm: center_post_thickness_mm,
                inset_y_mm: center_post_inset_y_mm,
                width_mm: center_post_width_mm,
            },
        },
        slats: BackSlatsSpec {
            orientation,
            layout: slat_layout,
            count: slat_count,
            width_mm: slat_width_mm,
            thickness_mm: slat_thickness_mm,
            arc_height_mm: slat_arc_height_mm,
            arc_sign: slat_arc_sign,
            gap_mm: slat_gap_mm,
            has_gap_mm,
            center_gap_mm: slat_center_gap_mm,
        },
        straps: BackStrapsSpec {
            count: strap_count,
            width_mm: strap_width_mm,
            thickness_mm: strap_thickness_mm,
        },
    }
}
