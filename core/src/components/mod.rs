//! Component builders and the build pipeline that runs them in order.

pub mod arms;
pub mod back;
pub mod legs;
pub mod seat_frame;
pub mod seat_slats;

#[cfg(test)]
mod tests_arms;
#[cfg(test)]
mod tests_back;
#[cfg(test)]
mod tests_legs;
#[cfg(test)]
mod tests_seat_frame;
#[cfg(test)]
mod tests_seat_slats;

use serde_json::json;

use crate::config::{resolve, PresetCatalog, RawConfig, ResolvedSpec};
use crate::diagnostics::{BuildContext, Component, Event, EventSpec, Source, Stage};
use crate::layout::LayoutContext;
use crate::plan::BuildPlan;
use crate::BuildError;

/// Result of one full build: the resolved spec, the placement context, the
/// plan and the diagnostic trail.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub spec: ResolvedSpec,
    pub layout: LayoutContext,
    pub plan: BuildPlan,
    pub events: Vec<Event>,
}

/// Run the whole pipeline: resolve the raw document, derive the layout, run
/// every component builder in a fixed order, then finalize the plan.
pub fn build_from_raw(
    raw: &RawConfig,
    preset_id: Option<&str>,
    variant_id: Option<&str>,
    catalog: &PresetCatalog,
    ctx: &BuildContext,
) -> Result<BuildOutput, BuildError> {
    let (spec, mut events) = resolve(raw, preset_id, variant_id, catalog, ctx)?;
    let layout = LayoutContext::from_spec(&spec);

    let mut plan = BuildPlan::new();
    seat_frame::build(&spec, &layout, &mut plan, ctx, &mut events);
    seat_slats::build(&spec, &layout, &mut plan, ctx, &mut events);
    back::build(&spec, &layout, &mut plan, ctx, &mut events);
    arms::build(&spec, &layout, &mut plan, ctx, &mut events);
    legs::build(&spec, &layout, &mut plan, ctx, &mut events);

    plan.push_anchor("seat_zone", [0.0, 0.0, layout.seat_support_center_z]);
    plan.metadata.insert("style".into(), spec.style.clone());
    plan.metadata.insert("preset_id".into(), spec.preset_id.clone());
    plan.metadata
        .insert("primitive_count".into(), plan.primitives.len().to_string());
    plan.metadata
        .insert("anchor_count".into(), plan.anchors.len().to_string());

    events.push(ctx.emit(EventSpec {
        stage: Some(Stage::Build),
        component: Some(Component::Builder),
        code: "BUILD_DONE".into(),
        severity: 0,
        path: String::new(),
        source: Some(Source::Computed),
        resolved_value: json!({
            "primitives": plan.primitives.len(),
            "anchors": plan.anchors.len(),
        }),
        reason: "build pipeline finished".into(),
        ..Default::default()
    }));

    Ok(BuildOutput {
        spec,
        layout,
        plan,
        events,
    })
}

/// Convenience wrapper with the builtin catalog and no preset selection.
pub fn build_default(raw: &RawConfig, ctx: &BuildContext) -> Result<BuildOutput, BuildError> {
    build_from_raw(raw, None, None, &PresetCatalog::default(), ctx)
}
