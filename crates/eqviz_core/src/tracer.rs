//! End-to-end tracing: classify, solve, segment, clip.

use crate::classify::classify;
use crate::clip::{clip, margin_for, Polyline};
use crate::config::TraceConfig;
use crate::continuation::trace_points;
use crate::domain::{CanvasPoint, Domain, Resolution, Viewport};
use crate::equation::Equation;
use crate::error::EvaluationError;
use crate::explicit::plot_explicit;
use crate::segment::{order_single_branch, segment_branches};
use crate::single_variable::trace_single_variable;
use crate::traits::ScalarFunction;
use crate::types::{Curve, CurveKind, DependencyClass, SolutionPoint, SweepDirection};
use anyhow::{Context, Result};
use log::debug;
use nalgebra::Vector2;
use serde::Serialize;
use std::cell::Cell;

/// Curves traced from the zero set of one function, in domain coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceOutput {
    pub class: DependencyClass,
    /// Sweep choice for bivariate functions, `None` otherwise.
    pub prefer_solving_for_x: Option<bool>,
    pub curves: Vec<Curve>,
    /// Midline markers for single-variable solutions.
    pub markers: Vec<SolutionPoint>,
    pub kind: CurveKind,
}

/// Traces `f = 0` over `domain` at the sampling density implied by `resolution`.
///
/// Never fails: undefined samples are skipped, and an equation with no
/// visible solutions yields no curves.
pub fn trace<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    resolution: Resolution,
    config: &TraceConfig,
) -> TraceOutput {
    let classification = classify(f, domain, &config.classifier);
    let class = classification.class;

    match class {
        DependencyClass::Constant => {
            debug!("constant equation, nothing to draw");
            TraceOutput {
                class,
                prefer_solving_for_x: None,
                curves: Vec::new(),
                markers: Vec::new(),
                kind: CurveKind::Implicit,
            }
        }
        DependencyClass::FunctionOfXOnly | DependencyClass::FunctionOfYOnly => {
            let lines = trace_single_variable(f, domain, class, resolution, config);
            TraceOutput {
                class,
                prefer_solving_for_x: None,
                curves: lines.curves,
                markers: lines.markers,
                kind: CurveKind::AxisLine,
            }
        }
        DependencyClass::Bivariate => {
            let prefer = classification.prefer_solving_for_x;
            let direction = SweepDirection::from_prefer_solving_for_x(prefer);
            let (range, pixels) = match direction {
                SweepDirection::SweepY => (domain.height(), resolution.height),
                SweepDirection::SweepX => (domain.width(), resolution.width),
            };
            let count = config.sample_count(pixels);
            let points = trace_points(f, domain, prefer, count, config);

            let spacing = range / (count - 1) as f64;
            let max_gap = config.split_on_gaps.then_some(1.5 * spacing);
            let curves = match direction {
                SweepDirection::SweepY => {
                    order_single_branch(&points, config.duplicate_tolerance, max_gap)
                }
                SweepDirection::SweepX => {
                    segment_branches(&points, config.grouping_decimals, max_gap)
                }
            };
            debug!(
                "{direction:?}: {} points in {} curves",
                points.len(),
                curves.len()
            );
            TraceOutput {
                class,
                prefer_solving_for_x: Some(prefer),
                curves,
                markers: Vec::new(),
                kind: CurveKind::Implicit,
            }
        }
    }
}

/// Everything needed to draw one equation on a canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plot {
    /// `None` for explicit `y = g(x)` plots, which skip classification.
    pub class: Option<DependencyClass>,
    pub prefer_solving_for_x: Option<bool>,
    pub polylines: Vec<Polyline>,
    pub markers: Vec<CanvasPoint>,
}

/// Plots `equation` on `viewport`, returning canvas-space polylines.
pub fn plot_equation(
    equation: &Equation,
    viewport: &Viewport,
    config: &TraceConfig,
) -> Result<Plot> {
    config.validate().context("invalid trace configuration")?;

    if let Equation::Explicit(g) = equation {
        return Ok(Plot {
            class: None,
            prefer_solving_for_x: None,
            polylines: plot_explicit(g, viewport, config),
            markers: Vec::new(),
        });
    }

    let output = trace(
        equation.function(),
        &viewport.domain,
        viewport.resolution,
        config,
    );
    let margin = margin_for(output.kind, config);
    let polylines = output
        .curves
        .iter()
        .flat_map(|curve| clip(curve, viewport, margin))
        .collect();
    let markers = output
        .markers
        .iter()
        .map(|m| viewport.to_canvas(m.x, m.y))
        .collect();
    Ok(Plot {
        class: Some(output.class),
        prefer_solving_for_x: output.prefer_solving_for_x,
        polylines,
        markers,
    })
}

/// Wraps a function and counts how often it is evaluated.
///
/// Gradient and partial-derivative requests count as one evaluation each.
pub struct CountingFunction<'a, F: ?Sized> {
    inner: &'a F,
    calls: Cell<usize>,
}

impl<'a, F: ScalarFunction + ?Sized> CountingFunction<'a, F> {
    pub fn new(inner: &'a F) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    pub fn evaluations(&self) -> usize {
        self.calls.get()
    }

    pub fn reset(&self) {
        self.calls.set(0);
    }
}

impl<F: ScalarFunction + ?Sized> ScalarFunction for CountingFunction<'_, F> {
    fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvaluationError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.evaluate(x, y)
    }

    fn gradient(&self, x: f64, y: f64) -> Option<Vector2<f64>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.gradient(x, y)
    }

    fn x_partial(&self, x: f64, y: f64) -> Option<f64> {
        self.calls.set(self.calls.get() + 1);
        self.inner.x_partial(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation_engine::CompiledExpression;

    fn trace_default(f: &impl ScalarFunction) -> TraceOutput {
        trace(f, &Domain::default(), Resolution::default(), &TraceConfig::default())
    }

    #[test]
    fn constant_traces_to_nothing() {
        let output = trace_default(&|_: f64, _: f64| 4.0);
        assert_eq!(output.class, DependencyClass::Constant);
        assert!(output.curves.is_empty());
        assert!(output.markers.is_empty());
    }

    #[test]
    fn sideways_sine_takes_the_newton_path() {
        let f = CompiledExpression::compile("x - sin(y)").expect("compiles");
        let output = trace_default(&f);
        assert_eq!(output.prefer_solving_for_x, Some(true));
        assert_eq!(output.curves.len(), 1);
        assert_eq!(output.curves[0].len(), 1000);
    }

    #[test]
    fn circle_becomes_two_arcs() {
        let f = |x: f64, y: f64| x * x + y * y - 25.0;
        let output = trace_default(&f);
        assert_eq!(output.prefer_solving_for_x, Some(false));
        assert_eq!(output.curves.len(), 2);
        assert_eq!(output.kind, CurveKind::Implicit);
    }

    #[test]
    fn gap_splitting_separates_hyperbola_branches() {
        let f = |x: f64, y: f64| x * y - 1.0;
        let split = trace_default(&f);
        assert!(split.curves.len() >= 2, "{} curves", split.curves.len());

        let config = TraceConfig {
            split_on_gaps: false,
            ..TraceConfig::default()
        };
        let merged = trace(&f, &Domain::default(), Resolution::default(), &config);
        assert!(merged.curves.len() < split.curves.len());
    }

    #[test]
    fn evaluation_count_is_bounded() {
        let circle = |x: f64, y: f64| x * x + y * y - 25.0;
        let counter = CountingFunction::new(&circle);
        trace_default(&counter);
        let first = counter.evaluations();
        assert!(first > 1000);
        // 1000 columns of 51 boundary samples plus at most 40 bisections per root.
        assert!(first < 1000 * (51 + 2 * 40) + 1000, "{first} evaluations");

        counter.reset();
        trace_default(&counter);
        assert_eq!(counter.evaluations(), first);
    }

    #[test]
    fn plot_maps_axis_lines_to_canvas() {
        let equation = Equation::parse("x = 5").expect("valid");
        let viewport = Viewport::new(Domain::default(), Resolution::new(200, 100).expect("valid"));
        let plot = plot_equation(&equation, &viewport, &TraceConfig::default()).expect("plots");
        assert_eq!(plot.class, Some(DependencyClass::FunctionOfXOnly));
        assert_eq!(plot.polylines.len(), 1);
        let line = &plot.polylines[0];
        assert_eq!(line.kind, CurveKind::AxisLine);
        assert!((line.points[0].x - 150.0).abs() < 0.5);
        assert!((line.points[0].y - 100.0).abs() < 1e-9);
        assert!(line.points[1].y.abs() < 1e-9);
        assert_eq!(plot.markers.len(), 1);
        assert!((plot.markers[0].y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn plot_dispatches_explicit_expressions() {
        let equation = Equation::parse("x^2").expect("valid");
        let viewport = Viewport::new(Domain::default(), Resolution::default());
        let plot = plot_equation(&equation, &viewport, &TraceConfig::default()).expect("plots");
        assert_eq!(plot.class, None);
        assert_eq!(plot.polylines.len(), 1);
        assert!(plot.polylines.iter().all(|p| p.kind == CurveKind::Explicit));
    }

    #[test]
    fn plot_rejects_invalid_config() {
        let equation = Equation::parse("x = y").expect("valid");
        let config = TraceConfig {
            max_samples: 0,
            ..TraceConfig::default()
        };
        let viewport = Viewport::new(Domain::default(), Resolution::default());
        let err = plot_equation(&equation, &viewport, &config)
            .expect_err("config should be rejected");
        assert!(format!("{err:#}").contains("max_samples"));
    }
}
