use serde_json::{json, Value};

use crate::components::{build_from_raw, BuildOutput};
use crate::config::PresetCatalog;
use crate::diagnostics::BuildContext;

fn build(raw: Value) -> BuildOutput {
    build_from_raw(&raw, None, None, &PresetCatalog::default(), &BuildContext::noop()).unwrap()
}

#[test]
fn test_perimeter_beams_default_three_seater() {
    let output = build(json!({}));
    let front = output.plan.primitive("beam_front").unwrap();
    assert_eq!(front.dimensions_mm, [1800.0, 35.0, 35.0]);
    assert_eq!(front.location_mm, [0.0, 282.5, 387.5]);
    let back = output.plan.primitive("beam_back").unwrap();
    assert_eq!(back.location_mm, [0.0, -282.5, 387.5]);
    let left = output.plan.primitive("beam_left").unwrap();
    assert_eq!(left.dimensions_mm, [35.0, 600.0, 35.0]);
    assert_eq!(left.location_mm, [-882.5, 0.0, 387.5]);
    assert!(output.plan.primitive("beam_right").is_some());
}

#[test]
fn test_perimeter_spans_total_width_with_arms() {
    let output = build(json!({ "arms": { "type": "both", "width_mm": 100.0 } }));
    let front = output.plan.primitive("beam_front").unwrap();
    assert_eq!(front.dimensions_mm[0], 2000.0);
    let left = output.plan.primitive("beam_left").unwrap();
    assert_eq!(left.location_mm[0], -1000.0 + 17.5);
}

#[test]
fn test_cross_beam_count_tracks_seats_within_band() {
    let output = build(json!({ "seat_count": 1 }));
    assert!(output.plan.primitive("beam_cross_1").is_some());
    assert!(output.plan.primitive("beam_cross_2").is_some());
    assert!(output.plan.primitive("beam_cross_3").is_none());

    let output = build(json!({ "seat_count": 6 }));
    assert!(output.plan.primitive("beam_cross_4").is_some());
    assert!(output.plan.primitive("beam_cross_5").is_none());
}

#[test]
fn test_cross_beams_evenly_spread() {
    let output = build(json!({ "seat_count": 3 }));
    // 3 seats -> 4 cross beams over the 1730mm inner band.
    let inner = 1800.0 - 70.0;
    let spacing = inner / 5.0;
    for i in 0..4 {
        let beam = output.plan.primitive(&format!("beam_cross_{}", i + 1)).unwrap();
        let expected = -inner / 2.0 + spacing * (i as f64 + 1.0);
        assert!((beam.location_mm[0] - expected).abs() < 1e-9);
        assert_eq!(beam.dimensions_mm, [35.0, 530.0, 35.0]);
    }
}

#[test]
fn test_seat_support_present_only_without_slats() {
    let output = build(json!({}));
    let support = output.plan.primitive("seat_support").unwrap();
    assert_eq!(support.dimensions_mm, [1800.0, 600.0, 35.0]);
    assert_eq!(support.location_mm[2], 422.5);

    let output = build(json!({ "slats": { "enabled": true } }));
    assert!(output.plan.primitive("seat_support").is_none());
}
