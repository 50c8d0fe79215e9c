use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Settings for the dependency classifier heuristic.
///
/// The blend weights and threshold are empirically tuned. They make the
/// choice of sweep direction deterministic, not provably optimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Minimum output change that counts as "the function involves this variable".
    pub involvement_tolerance: f64,
    /// Central-difference step for gradient estimates.
    pub gradient_step: f64,
    /// One gradient "dominates" a sample when it exceeds the other by this factor.
    pub dominance_factor: f64,
    pub ratio_weight: f64,
    pub tally_weight: f64,
    pub spread_weight: f64,
    /// Blended score above which `x` is solved for (sweeping `y`).
    pub prefer_x_threshold: f64,
    /// Samples per axis for the spread consistency check.
    pub spread_samples: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            involvement_tolerance: 1e-4,
            gradient_step: 1e-3,
            dominance_factor: 1.5,
            ratio_weight: 0.4,
            tally_weight: 0.3,
            spread_weight: 0.3,
            prefer_x_threshold: 0.25,
            spread_samples: 21,
        }
    }
}

/// Settings for sign-change root isolation along a 1D slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootSettings {
    pub segments: usize,
    pub max_bisections: usize,
    /// Stop bisecting once the bracket is narrower than this.
    pub width_tolerance: f64,
    /// Stop bisecting once |f(mid)| falls below this.
    pub value_tolerance: f64,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            segments: 50,
            max_bisections: 40,
            width_tolerance: 1e-3,
            value_tolerance: 1e-3,
        }
    }
}

/// Settings for the scalar Newton iteration used along a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub tolerance: f64,
    pub step_tolerance: f64,
    /// Forward-difference step when no analytic derivative is available.
    pub derivative_step: f64,
    /// Iteration aborts when |f'| falls below this.
    pub min_derivative: f64,
    /// How far outside the domain an iterate may wander before aborting.
    pub escape_margin: f64,
    /// A converged point is kept only when a fresh |f| is below this.
    pub acceptance_tolerance: f64,
    /// Use `ScalarFunction::gradient` when the function supplies one.
    pub analytic_derivatives: bool,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 20,
            tolerance: 1e-6,
            step_tolerance: 1e-6,
            derivative_step: 1e-8,
            min_derivative: 1e-12,
            escape_margin: 1.0,
            acceptance_tolerance: 0.01,
            analytic_derivatives: true,
        }
    }
}

/// Every tolerance, cap and margin used by one trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub classifier: ClassifierSettings,
    pub roots: RootSettings,
    pub newton: NewtonSettings,
    /// Continuation samples per pixel along the swept axis.
    pub samples_per_pixel: usize,
    /// Hard cap on continuation samples.
    pub max_samples: usize,
    /// Scan samples per pixel for single-variable equations.
    pub single_variable_samples_per_pixel: usize,
    /// |f| below which a single-variable scan sample counts as a solution.
    pub single_variable_tolerance: f64,
    /// Decimal places used to merge nearby single-variable solutions.
    pub single_variable_decimals: i32,
    /// Decimal places used to group sweep-x samples by abscissa.
    pub grouping_decimals: i32,
    /// Sweep-y samples closer than this in `y` are treated as duplicates.
    pub duplicate_tolerance: f64,
    /// Split branches where consecutive sweep samples are missing.
    pub split_on_gaps: bool,
    /// Clip margin in pixels for explicit `y = g(x)` plots.
    pub explicit_clip_margin: f64,
    /// Clip margin in pixels for traced implicit curves.
    pub implicit_clip_margin: f64,
    /// Explicit plots sample this many points per horizontal pixel.
    pub explicit_samples_per_pixel: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierSettings::default(),
            roots: RootSettings::default(),
            newton: NewtonSettings::default(),
            samples_per_pixel: 3,
            max_samples: 1000,
            single_variable_samples_per_pixel: 4,
            single_variable_tolerance: 0.02,
            single_variable_decimals: 2,
            grouping_decimals: 3,
            duplicate_tolerance: 1e-3,
            split_on_gaps: true,
            explicit_clip_margin: 10.0,
            implicit_clip_margin: 100.0,
            explicit_samples_per_pixel: 2,
        }
    }
}

impl TraceConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("classifier.involvement_tolerance", self.classifier.involvement_tolerance),
            ("classifier.gradient_step", self.classifier.gradient_step),
            ("classifier.dominance_factor", self.classifier.dominance_factor),
            ("roots.width_tolerance", self.roots.width_tolerance),
            ("roots.value_tolerance", self.roots.value_tolerance),
            ("newton.tolerance", self.newton.tolerance),
            ("newton.step_tolerance", self.newton.step_tolerance),
            ("newton.derivative_step", self.newton.derivative_step),
            ("newton.acceptance_tolerance", self.newton.acceptance_tolerance),
            ("single_variable_tolerance", self.single_variable_tolerance),
            ("duplicate_tolerance", self.duplicate_tolerance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                bail!("{name} must be positive and finite (got {value}).");
            }
        }
        if self.roots.segments == 0 {
            bail!("roots.segments must be at least 1.");
        }
        if self.newton.max_steps == 0 {
            bail!("newton.max_steps must be greater than zero.");
        }
        if self.samples_per_pixel == 0
            || self.max_samples < 2
            || self.single_variable_samples_per_pixel == 0
            || self.explicit_samples_per_pixel == 0
        {
            bail!("sample densities must be positive and max_samples at least 2.");
        }
        if self.classifier.spread_samples < 2 {
            bail!("classifier.spread_samples must be at least 2.");
        }
        if self.explicit_clip_margin < 0.0 || self.implicit_clip_margin < 0.0 {
            bail!("clip margins must be non-negative.");
        }
        Ok(())
    }

    /// Continuation sample count for an axis spanning `pixels`.
    pub fn sample_count(&self, pixels: u32) -> usize {
        (pixels as usize * self.samples_per_pixel)
            .min(self.max_samples)
            .max(2)
    }
}
