use std::sync::Arc;

use serde_json::json;

use sofa_core::diagnostics::Severity;
use sofa_core::metrics::{SceneMetrics, GROUP_FRAME, GROUP_LEGS};
use sofa_core::{
    build_from_raw, validate, BuildContext, JsonlSink, MemorySink, PresetCatalog, ValidateOptions,
};

fn build(raw: serde_json::Value) -> sofa_core::BuildOutput {
    build_from_raw(&raw, None, None, &PresetCatalog::default(), &BuildContext::noop()).unwrap()
}

#[test]
fn test_identical_input_builds_identical_snapshots() {
    let raw = json!({
        "style": "scandi",
        "seat_width_mm": 640.0,
        "seat_count": 2,
        "arms": { "type": "both", "profile": "frame_box_open" },
        "slats": { "enabled": true, "count": 9 },
        "back_support": { "mode": "slats" },
        "legs": { "family": "tapered_cone", "height_mm": 140.0 },
    });
    let a = build(raw.clone()).plan.snapshot_string();
    let b = build(raw).plan.snapshot_string();
    assert_eq!(a, b);
    assert!(!a.is_empty());
}

#[test]
fn test_out_of_range_input_clamps_and_reports() {
    let raw = json!({ "seat_width_mm": 9999, "seat_height_mm": 100 });
    let output = build(raw);
    assert_eq!(output.spec.seat.width_mm, 1200.0);
    assert_eq!(output.spec.seat.height_mm, 250.0);
    let clamps: Vec<_> = output
        .events
        .iter()
        .filter(|e| e.code == "CLAMP")
        .collect();
    assert_eq!(clamps.len(), 2);
    assert!(clamps.iter().all(|e| e.severity == Severity::Warn));
}

#[test]
fn test_non_object_input_is_the_only_fatal() {
    let catalog = PresetCatalog::default();
    let ctx = BuildContext::noop();
    assert!(build_from_raw(&json!("sofa"), None, None, &catalog, &ctx).is_err());
    // A document full of garbage values still builds.
    let raw = json!({
        "seat_width_mm": "not a number",
        "frame": 7,
        "arms": { "type": [], "profile": 3 },
        "back_support": { "mode": "hoverboard" },
    });
    assert!(build_from_raw(&raw, None, None, &catalog, &ctx).is_ok());
}

#[test]
fn test_default_build_validates_clean() {
    let output = build(json!({}));
    let metrics = SceneMetrics::from_plan(&output.plan);
    let report = validate(&json!({}), &metrics, &ValidateOptions::default());
    assert!(report.is_clean());
    assert_eq!(report.score, 1.0);
}

#[test]
fn test_scandi_build_validates_clean() {
    let raw = json!({ "style": "scandi", "back_support": {} });
    let output = build(raw.clone());
    assert!(output.plan.primitive("back_slat_left_1").is_some());
    let metrics = SceneMetrics::from_plan(&output.plan);
    let report = validate(&raw, &metrics, &ValidateOptions::default());
    assert!(report.is_clean(), "problems: {:?}", report.problems);
}

#[test]
fn test_groups_cover_built_geometry() {
    let output = build(json!({ "slats": { "enabled": true } }));
    let metrics = SceneMetrics::from_plan(&output.plan);
    assert_eq!(metrics.group(GROUP_LEGS).unwrap().count, 4);
    let frame = metrics.group(GROUP_FRAME).unwrap();
    // Perimeter + 4 cross beams + 2 slat rails + the legacy back board.
    assert_eq!(frame.count, 11);
    assert!(frame.members.contains(&"back_frame".to_string()));
    assert!(frame.bbox.max.z <= 900.0);
}

#[test]
fn test_every_builder_reports_its_strategy() {
    let output = build(json!({
        "slats": { "enabled": true },
        "back_support": { "mode": "slats" },
        "arms": { "type": "both" },
    }));
    let strategies: Vec<&sofa_core::Event> = output
        .events
        .iter()
        .filter(|e| e.code == "STRATEGY_SELECTED")
        .collect();
    let paths: Vec<&str> = strategies.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "slats.enabled",
            "slats.mount_mode",
            "back_support.mode",
            "arms.profile",
            "legs.family",
        ]
    );
    let back = strategies
        .iter()
        .find(|e| e.path == "back_support.mode")
        .unwrap();
    assert_eq!(back.resolved_value, json!("slats"));

    // Without a back_support block the back reports its legacy handler.
    let legacy = build(json!({}));
    let back = legacy
        .events
        .iter()
        .find(|e| e.code == "STRATEGY_SELECTED" && e.path == "back_support.mode")
        .unwrap();
    assert_eq!(back.resolved_value, json!("legacy_board"));
}

#[test]
fn test_metadata_and_final_anchor() {
    let output = build(json!({ "style": "scandi" }));
    assert_eq!(output.plan.metadata.get("style").map(String::as_str), Some("scandi"));
    assert_eq!(
        output.plan.metadata.get("preset_id").map(String::as_str),
        Some("scandi_straight_v1")
    );
    assert!(output.plan.anchor("seat_zone").is_some());
    assert!(output.events.iter().any(|e| e.code == "BUILD_DONE"));
}

#[test]
fn test_jsonl_sink_appends_parseable_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs").join("events.jsonl");
    let sink = Arc::new(JsonlSink::new(path.clone()));
    let ctx = BuildContext::new(sink);
    build_from_raw(
        &json!({ "seat_width_mm": 5000 }),
        None,
        None,
        &PresetCatalog::default(),
        &ctx,
    )
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(!lines.is_empty());
    for line in &lines {
        let event: sofa_core::Event = serde_json::from_str(line).unwrap();
        assert_eq!(event.run_id, ctx.run_id);
    }
    assert!(lines.iter().any(|l| l.contains("\"CLAMP\"")));
    assert!(lines.iter().any(|l| l.contains("\"BUILD_DONE\"")));
}

#[test]
fn test_memory_sink_matches_returned_events() {
    let sink = Arc::new(MemorySink::new());
    let ctx = BuildContext::new(sink.clone());
    let output = build_from_raw(
        &json!({ "seat_width_mm": 5000 }),
        None,
        None,
        &PresetCatalog::default(),
        &ctx,
    )
    .unwrap();
    assert_eq!(sink.snapshot().len(), output.events.len());
}
