//! The iterate loop: build, measure, validate, patch, repeat.

use serde_json::Value;

use crate::autofix::{fix, Patch, StrategyCursor};
use crate::components::build_from_raw;
use crate::config::{PresetCatalog, RawConfig};
use crate::diagnostics::BuildContext;
use crate::metrics::SceneMetrics;
use crate::plan::BuildPlan;
use crate::validate::{validate, ValidateOptions, Validation};
use crate::BuildError;

#[derive(Debug, Clone, PartialEq)]
pub struct AutofixOptions {
    pub max_iterations: usize,
    pub validate: ValidateOptions,
}

impl Default for AutofixOptions {
    fn default() -> Self {
        Self {
            max_iterations: 4,
            validate: ValidateOptions::default(),
        }
    }
}

/// One build/validate round, with the patches applied after it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IterationReport {
    pub index: usize,
    pub primitive_count: usize,
    pub anchor_count: usize,
    pub validation: Validation,
    pub patches: Vec<Patch>,
}

/// Full autofix trail. Running out of iterations is a reported outcome,
/// not an error.
#[derive(Debug, Clone)]
pub struct AutofixReport {
    pub iterations: Vec<IterationReport>,
    pub final_config: RawConfig,
    pub final_plan: BuildPlan,
    pub final_validation: Validation,
    pub converged: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AutofixEngine {
    pub options: AutofixOptions,
}

impl AutofixEngine {
    pub fn new(options: AutofixOptions) -> Self {
        Self { options }
    }

    /// Iterate builds of `raw` until validation is clean, patches dry up, or
    /// the iteration budget runs out. The input document is never mutated;
    /// every round patches a fresh copy.
    pub fn run(
        &self,
        raw: &RawConfig,
        preset_id: Option<&str>,
        variant_id: Option<&str>,
        catalog: &PresetCatalog,
        ctx: &BuildContext,
    ) -> Result<AutofixReport, BuildError> {
        let max_iterations = self.options.max_iterations.max(1);
        let mut config: Value = raw.clone();
        let mut cursor = StrategyCursor::new();
        let mut prev_metrics: Option<SceneMetrics> = None;
        let mut iterations = Vec::new();

        for index in 0..max_iterations {
            let output = build_from_raw(&config, preset_id, variant_id, catalog, ctx)?;
            let metrics = SceneMetrics::from_plan(&output.plan);
            let validation = validate(&config, &metrics, &self.options.validate);

            let clean = validation.is_clean();
            let exhausted = index + 1 == max_iterations;
            if clean || exhausted {
                iterations.push(IterationReport {
                    index,
                    primitive_count: output.plan.primitives.len(),
                    anchor_count: output.plan.anchors.len(),
                    validation: validation.clone(),
                    patches: Vec::new(),
                });
                return Ok(AutofixReport {
                    iterations,
                    final_config: config,
                    final_plan: output.plan,
                    final_validation: validation,
                    converged: clean,
                });
            }

            let (patched, patches) =
                fix(&config, &validation.problems, &metrics, prev_metrics.as_ref(), &mut cursor);
            let stalled = patches.is_empty();
            iterations.push(IterationReport {
                index,
                primitive_count: output.plan.primitives.len(),
                anchor_count: output.plan.anchors.len(),
                validation: validation.clone(),
                patches,
            });
            if stalled {
                return Ok(AutofixReport {
                    iterations,
                    final_config: config,
                    final_plan: output.plan,
                    final_validation: validation,
                    converged: false,
                });
            }

            prev_metrics = Some(metrics);
            config = patched;
        }
        unreachable!("loop always returns on the last iteration");
    }
}
