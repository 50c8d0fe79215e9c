//! Equations that depend on only one variable, e.g. `y^2 = 9` or `x = 5`.
//!
//! Each solution is drawn as a full-height (or full-width) line with a marker
//! where it crosses the middle of the view.

use crate::config::TraceConfig;
use crate::continuation::sample_positions;
use crate::domain::{Domain, Resolution};
use crate::error::EvaluationError;
use crate::roots::bisect;
use crate::traits::ScalarFunction;
use crate::types::{Curve, CurveKind, DependencyClass, SolutionPoint};
use log::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisLines {
    pub curves: Vec<Curve>,
    pub markers: Vec<SolutionPoint>,
}

/// Scans the axis `f` depends on and returns one line per solution.
///
/// `Constant` and `Bivariate` classes produce nothing.
pub fn trace_single_variable<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    class: DependencyClass,
    resolution: Resolution,
    config: &TraceConfig,
) -> AxisLines {
    let (cx, cy) = domain.center();
    let (lo, hi, pixels) = match class {
        DependencyClass::FunctionOfXOnly => (domain.x_min(), domain.x_max(), resolution.width),
        DependencyClass::FunctionOfYOnly => (domain.y_min(), domain.y_max(), resolution.height),
        DependencyClass::Constant | DependencyClass::Bivariate => return AxisLines::default(),
    };
    let slice = |t: f64| match class {
        DependencyClass::FunctionOfXOnly => f.evaluate(t, cy),
        _ => f.evaluate(cx, t),
    };

    let count = (pixels as usize * config.single_variable_samples_per_pixel).max(2);
    let solutions = scan_axis(&slice, lo, hi, count, config);
    debug!("{class:?}: {} solutions from {count} samples", solutions.len());

    let mut lines = AxisLines::default();
    for c in solutions {
        let (line, marker) = match class {
            DependencyClass::FunctionOfXOnly => (
                vec![
                    SolutionPoint::new(c, domain.y_min()),
                    SolutionPoint::new(c, domain.y_max()),
                ],
                SolutionPoint::new(c, cy),
            ),
            _ => (
                vec![
                    SolutionPoint::new(domain.x_min(), c),
                    SolutionPoint::new(domain.x_max(), c),
                ],
                SolutionPoint::new(cx, c),
            ),
        };
        lines.curves.push(Curve::new(CurveKind::AxisLine, line));
        lines.markers.push(marker);
    }
    lines
}

/// Near-zero samples plus bisected sign changes, merged into one coordinate
/// per solution.
fn scan_axis<S>(slice: &S, lo: f64, hi: f64, count: usize, config: &TraceConfig) -> Vec<f64>
where
    S: Fn(f64) -> Result<f64, EvaluationError>,
{
    let samples: Vec<(f64, Option<f64>)> = sample_positions(lo, hi, count)
        .map(|t| (t, slice(t).ok()))
        .collect();

    // (coordinate, |f|)
    let mut candidates: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|&(t, value)| {
            let value = value?.abs();
            (value < config.single_variable_tolerance).then_some((t, value))
        })
        .collect();
    for pair in samples.windows(2) {
        let ((a, Some(fa)), (b, Some(fb))) = (pair[0], pair[1]) else {
            continue;
        };
        if fa * fb < 0.0 {
            // A pole also flips sign; only a small residual marks a real root.
            let root = bisect(slice, a, b, fa, &config.roots)
                .and_then(|root| Some((root, slice(root).ok()?.abs())))
                .filter(|&(_, value)| value < config.single_variable_tolerance);
            if let Some((root, value)) = root {
                candidates.push((root, value));
            } else {
                trace!("sign change in [{a}, {b}] is not a root");
            }
        }
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Samples straddling one solution land within a couple of steps of each other.
    let step = (hi - lo) / (count - 1) as f64;
    let scale = 10f64.powi(config.single_variable_decimals);
    let merge_radius = (2.0 * step).max(1.0 / scale);
    // (last coordinate, best coordinate, best |f|)
    let mut clusters: Vec<(f64, f64, f64)> = Vec::new();
    for (t, value) in candidates {
        match clusters.last_mut() {
            Some(cluster) if t - cluster.0 <= merge_radius => {
                cluster.0 = t;
                if value < cluster.2 {
                    cluster.1 = t;
                    cluster.2 = value;
                }
            }
            _ => clusters.push((t, t, value)),
        }
    }

    let mut solutions: Vec<f64> = Vec::new();
    for (_, best, _) in clusters {
        let rounded = (best * scale).round();
        if solutions
            .last()
            .is_some_and(|last| (last * scale).round() == rounded)
        {
            continue;
        }
        solutions.push(best);
    }
    solutions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(source: impl Fn(f64, f64) -> f64, class: DependencyClass) -> AxisLines {
        trace_single_variable(
            &source,
            &Domain::default(),
            class,
            Resolution::default(),
            &TraceConfig::default(),
        )
    }

    #[test]
    fn horizontal_lines_for_function_of_y() {
        let lines = trace(|_, y| y * y - 9.0, DependencyClass::FunctionOfYOnly);
        assert_eq!(lines.curves.len(), 2);
        let ys: Vec<f64> = lines.markers.iter().map(|m| m.y).collect();
        assert!((ys[0] + 3.0).abs() < 0.02);
        assert!((ys[1] - 3.0).abs() < 0.02);
        for curve in &lines.curves {
            assert_eq!(curve.kind, CurveKind::AxisLine);
            assert_eq!(curve.points[0].x, -10.0);
            assert_eq!(curve.points[1].x, 10.0);
        }
        assert!(lines.markers.iter().all(|m| m.x == 0.0));
    }

    #[test]
    fn vertical_line_for_function_of_x() {
        let lines = trace(|x, _| x - 5.0, DependencyClass::FunctionOfXOnly);
        assert_eq!(lines.curves.len(), 1);
        let line = &lines.curves[0].points;
        assert!((line[0].x - 5.0).abs() < 0.02);
        assert_eq!(line[0].y, -10.0);
        assert_eq!(line[1].y, 10.0);
    }

    #[test]
    fn tangent_root_is_found_without_sign_change() {
        let lines = trace(|x, _| x * x, DependencyClass::FunctionOfXOnly);
        assert_eq!(lines.curves.len(), 1);
        assert!(lines.markers[0].x.abs() < 0.02);
    }

    fn assert_small_residuals(f: impl Fn(f64, f64) -> f64, lines: &AxisLines) {
        let tolerance = TraceConfig::default().single_variable_tolerance;
        for m in &lines.markers {
            let residual = f(m.x, m.y).abs();
            assert!(residual < tolerance, "|f| = {residual} at {m:?}");
        }
    }

    #[test]
    fn tangent_poles_are_not_lines() {
        let f = |x: f64, _y: f64| x.tan();
        let lines = trace(f, DependencyClass::FunctionOfXOnly);
        // k * pi for k in -3..=3.
        assert_eq!(lines.curves.len(), 7, "{:?}", lines.markers);
        for (k, m) in (-3..=3).zip(&lines.markers) {
            assert!((m.x - f64::from(k) * std::f64::consts::PI).abs() < 0.02, "{m:?}");
        }
        assert_small_residuals(f, &lines);
    }

    #[test]
    fn reciprocal_pole_is_not_a_line() {
        let f = |_x: f64, y: f64| 1.0 / (y - 2.0) - 1.0;
        let lines = trace(f, DependencyClass::FunctionOfYOnly);
        assert_eq!(lines.curves.len(), 1, "{:?}", lines.markers);
        assert!((lines.markers[0].y - 3.0).abs() < 0.02);
        assert_small_residuals(f, &lines);
    }

    #[test]
    fn rational_roots_have_small_residuals() {
        let f = |x: f64, _y: f64| (x * x - 1.0) / (x - 3.0);
        let lines = trace(f, DependencyClass::FunctionOfXOnly);
        assert_eq!(lines.curves.len(), 2, "{:?}", lines.markers);
        assert!((lines.markers[0].x + 1.0).abs() < 0.02);
        assert!((lines.markers[1].x - 1.0).abs() < 0.02);
        assert_small_residuals(f, &lines);
    }

    #[test]
    fn constant_equations_emit_nothing() {
        assert_eq!(trace(|_, _| 0.0, DependencyClass::Constant), AxisLines::default());
        assert_eq!(trace(|_, _| 1.0, DependencyClass::Constant), AxisLines::default());
    }

    #[test]
    fn failing_everywhere_emits_nothing() {
        let lines = trace(|_, _| f64::NAN, DependencyClass::FunctionOfYOnly);
        assert!(lines.curves.is_empty());
    }
}
