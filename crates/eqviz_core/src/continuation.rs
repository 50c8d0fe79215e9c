//! Sweep-based curve continuation.
//!
//! The preferred direction assumes a roughly single-valued relation and
//! tracks it with a scalar Newton iteration per sample. The other direction
//! expects several branches per sample and isolates every root instead.

use crate::config::{NewtonSettings, TraceConfig};
use crate::domain::Domain;
use crate::roots::find_roots;
use crate::traits::ScalarFunction;
use crate::types::{SolutionPoint, SweepDirection};
use log::{debug, trace};

/// Produces scattered solution points of `f = 0` inside `domain`.
///
/// With `prefer_solving_for_x` the sweep runs over `y` and solves for one `x`
/// per sample; otherwise it runs over `x` and collects every `y` root.
pub fn trace_points<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    prefer_solving_for_x: bool,
    sample_count: usize,
    config: &TraceConfig,
) -> Vec<SolutionPoint> {
    let sample_count = sample_count.max(2);
    let points = match SweepDirection::from_prefer_solving_for_x(prefer_solving_for_x) {
        SweepDirection::SweepY => sweep_y(f, domain, sample_count, &config.newton),
        SweepDirection::SweepX => sweep_x(f, domain, sample_count, config),
    };
    debug!(
        "continuation produced {} points from {} samples (prefer_solving_for_x={})",
        points.len(),
        sample_count,
        prefer_solving_for_x
    );
    points
}

/// Evenly spaced samples covering `[min, max]` inclusive.
pub(crate) fn sample_positions(min: f64, max: f64, count: usize) -> impl Iterator<Item = f64> {
    let denom = (count.max(2) - 1) as f64;
    (0..count).map(move |i| {
        if i + 1 == count {
            max
        } else {
            min + (max - min) * i as f64 / denom
        }
    })
}

fn sweep_y<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    sample_count: usize,
    settings: &NewtonSettings,
) -> Vec<SolutionPoint> {
    sample_positions(domain.y_min(), domain.y_max(), sample_count)
        .filter_map(|y| {
            let x = newton_solve_x(f, y, domain, settings);
            if x.is_none() {
                trace!("no x solution at y = {y}");
            }
            x.map(|x| SolutionPoint::new(x, y))
        })
        .collect()
}

fn sweep_x<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    sample_count: usize,
    config: &TraceConfig,
) -> Vec<SolutionPoint> {
    let mut points = Vec::new();
    for x in sample_positions(domain.x_min(), domain.x_max(), sample_count) {
        let roots = find_roots(
            |y| f.evaluate(x, y),
            domain.y_min(),
            domain.y_max(),
            &config.roots,
        );
        points.extend(roots.into_iter().map(|y| SolutionPoint::new(x, y)));
    }
    points
}

/// Newton iteration on `x -> f(x, y)` from `x = 0` (clamped into the domain).
///
/// Returns `None` when the derivative vanishes, an evaluation fails, the
/// iterate escapes the domain, or the final point does not satisfy `f`.
pub fn newton_solve_x<F: ScalarFunction + ?Sized>(
    f: &F,
    y: f64,
    domain: &Domain,
    settings: &NewtonSettings,
) -> Option<f64> {
    let lo = domain.x_min() - settings.escape_margin;
    let hi = domain.x_max() + settings.escape_margin;
    let mut x = 0.0f64.clamp(domain.x_min(), domain.x_max());

    for _ in 0..settings.max_steps {
        let fx = f.evaluate(x, y).ok()?;
        if fx.abs() < settings.tolerance {
            break;
        }
        let slope = x_derivative(f, x, y, fx, settings)?;
        if slope.abs() < settings.min_derivative {
            return None;
        }
        let step = fx / slope;
        x -= step;
        if !(lo..=hi).contains(&x) {
            return None;
        }
        if step.abs() < settings.step_tolerance {
            break;
        }
    }

    let residual = f.evaluate(x, y).ok()?;
    (residual.abs() < settings.acceptance_tolerance && domain.contains_x(x)).then_some(x)
}

/// Analytic `df/dx` when available, forward difference otherwise.
fn x_derivative<F: ScalarFunction + ?Sized>(
    f: &F,
    x: f64,
    y: f64,
    fx: f64,
    settings: &NewtonSettings,
) -> Option<f64> {
    if settings.analytic_derivatives {
        if let Some(slope) = f.x_partial(x, y) {
            return Some(slope);
        }
    }
    let h = settings.derivative_step;
    let ahead = f.evaluate(x + h, y).ok()?;
    let slope = (ahead - fx) / h;
    slope.is_finite().then_some(slope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation_engine::CompiledExpression;
    use crate::error::EvaluationError;
    use nalgebra::Vector2;

    #[test]
    fn newton_converges_on_linear_slice() {
        let f = |x: f64, y: f64| x - y.sin();
        let settings = NewtonSettings::default();
        let x = newton_solve_x(&f, 1.2, &Domain::default(), &settings).expect("should converge");
        assert!((x - 1.2f64.sin()).abs() < 1e-6);
    }

    struct SlopeOnly;

    impl ScalarFunction for SlopeOnly {
        fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvaluationError> {
            Ok(2.0 * x - y)
        }

        fn gradient(&self, _x: f64, _y: f64) -> Option<Vector2<f64>> {
            panic!("newton should only ask for df/dx");
        }

        fn x_partial(&self, _x: f64, _y: f64) -> Option<f64> {
            Some(2.0)
        }
    }

    #[test]
    fn newton_uses_the_x_partial_only() {
        let x = newton_solve_x(&SlopeOnly, 3.0, &Domain::default(), &NewtonSettings::default())
            .expect("should converge");
        assert!((x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn newton_aborts_on_flat_derivative() {
        // d/dx (x^2 - y) vanishes at the x = 0 starting point.
        let f = |x: f64, y: f64| x * x - y;
        assert_eq!(
            newton_solve_x(&f, 4.0, &Domain::default(), &NewtonSettings::default()),
            None
        );
    }

    #[test]
    fn newton_rejects_roots_outside_domain() {
        let f = |x: f64, _y: f64| x - 50.0;
        assert_eq!(
            newton_solve_x(&f, 0.0, &Domain::default(), &NewtonSettings::default()),
            None
        );
    }

    #[test]
    fn numeric_and_analytic_derivatives_agree() {
        let f = CompiledExpression::compile("x^3 + x - y").expect("compiles");
        let analytic = NewtonSettings::default();
        let numeric = NewtonSettings {
            analytic_derivatives: false,
            ..analytic
        };
        let a = newton_solve_x(&f, 2.0, &Domain::default(), &analytic).expect("analytic");
        let b = newton_solve_x(&f, 2.0, &Domain::default(), &numeric).expect("numeric");
        assert!((a - 1.0).abs() < 1e-6);
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn sweep_x_collects_every_branch() {
        let f = |x: f64, y: f64| x * x + y * y - 25.0;
        let points = trace_points(&f, &Domain::default(), false, 101, &TraceConfig::default());
        let at_zero: Vec<_> = points.iter().filter(|p| p.x == 0.0).collect();
        assert_eq!(at_zero.len(), 2);
        assert!(points.iter().all(|p| (p.x * p.x + p.y * p.y - 25.0).abs() < 0.1));
    }

    #[test]
    fn sweep_y_reports_one_point_per_sample() {
        let f = |x: f64, y: f64| x - y.sin();
        let points = trace_points(&f, &Domain::default(), true, 200, &TraceConfig::default());
        assert_eq!(points.len(), 200);
        assert!(points.iter().all(|p| (p.x - p.y.sin()).abs() < 1e-4));
    }

    #[test]
    fn sample_positions_hit_both_ends() {
        let samples: Vec<f64> = sample_positions(-1.0, 1.0, 5).collect();
        assert_eq!(samples, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }
}
