//! Dependency classification.
//!
//! Decides from sampling alone whether `f` depends on `x`, `y`, both or
//! neither, and for bivariate relations which variable is better solved for.
//! The sweep-direction choice is a tunable heuristic (see
//! `ClassifierSettings`): deterministic for a given function and domain, but
//! not guaranteed to pick the most natural parametrization.

use crate::config::ClassifierSettings;
use crate::domain::Domain;
use crate::error::ClassificationFailure;
use crate::traits::ScalarFunction;
use crate::types::DependencyClass;
use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Offsets from the domain center at which gradients are sampled.
const GRADIENT_OFFSETS: [(f64, f64); 9] = [
    (0.0, 0.0),
    (1.0, 1.0),
    (1.0, -1.0),
    (-1.0, 1.0),
    (-1.0, -1.0),
    (0.5, 0.5),
    (0.5, -0.5),
    (-0.5, 0.5),
    (-0.5, -0.5),
];

/// Steps used by the involvement probes. The irrational-ish second step
/// catches functions periodic in whole units, e.g. `sin(2*pi*x)`.
const PROBE_STEPS: [f64; 2] = [1.0, 0.371];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class: DependencyClass,
    /// Meaningful for `Bivariate` only: solve for `x` while sweeping `y`.
    pub prefer_solving_for_x: bool,
    /// Blended heuristic score; `None` unless bivariate with usable gradients.
    pub score: Option<f64>,
}

pub fn classify<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    settings: &ClassifierSettings,
) -> Classification {
    let involves_x = involves(f, domain, settings, Axis::X);
    let involves_y = involves(f, domain, settings, Axis::Y);

    let class = match (involves_x, involves_y) {
        (false, false) => DependencyClass::Constant,
        (true, false) => DependencyClass::FunctionOfXOnly,
        (false, true) => DependencyClass::FunctionOfYOnly,
        (true, true) => DependencyClass::Bivariate,
    };

    if class != DependencyClass::Bivariate {
        debug!("classified as {class:?}");
        return Classification {
            class,
            prefer_solving_for_x: false,
            score: None,
        };
    }

    match sweep_score(f, domain, settings) {
        Ok(score) => {
            let prefer_solving_for_x = score > settings.prefer_x_threshold;
            debug!(
                "classified as Bivariate, score {score:.4}, \
                 prefer_solving_for_x={prefer_solving_for_x}"
            );
            Classification {
                class,
                prefer_solving_for_x,
                score: Some(score),
            }
        }
        Err(err) => {
            debug!("{err}; sweeping x");
            Classification {
                class,
                prefer_solving_for_x: false,
                score: None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn involves<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    settings: &ClassifierSettings,
    axis: Axis,
) -> bool {
    let (cx, cy) = domain.center();
    let bases = [
        (1.0, 1.0),
        (cx + 0.123 * domain.width(), cy + 0.217 * domain.height()),
        (-0.61, 0.43),
    ];
    for (bx, by) in bases {
        for step in PROBE_STEPS {
            let (px, py) = match axis {
                Axis::X => (bx + step, by),
                Axis::Y => (bx, by + step),
            };
            if let (Ok(a), Ok(b)) = (f.evaluate(bx, by), f.evaluate(px, py)) {
                if (a - b).abs() > settings.involvement_tolerance {
                    return true;
                }
            }
        }
    }
    false
}

fn partial<F: ScalarFunction + ?Sized>(f: &F, x: f64, y: f64, h: f64, axis: Axis) -> Option<f64> {
    let (ahead, behind) = match axis {
        Axis::X => (f.evaluate(x + h, y).ok()?, f.evaluate(x - h, y).ok()?),
        Axis::Y => (f.evaluate(x, y + h).ok()?, f.evaluate(x, y - h).ok()?),
    };
    let d = (ahead - behind) / (2.0 * h);
    d.is_finite().then_some(d)
}

fn central_gradient<F: ScalarFunction + ?Sized>(
    f: &F,
    x: f64,
    y: f64,
    h: f64,
) -> Option<Vector2<f64>> {
    Some(Vector2::new(partial(f, x, y, h, Axis::X)?, partial(f, x, y, h, Axis::Y)?))
}

/// Blends three signals into one score; positive favours solving for `x`.
///
/// 1. mean-magnitude ratio of the partial derivatives,
/// 2. net tally of samples where one partial dominates the other,
/// 3. how much each partial varies along its own axis through the center.
fn sweep_score<F: ScalarFunction + ?Sized>(
    f: &F,
    domain: &Domain,
    settings: &ClassifierSettings,
) -> Result<f64, ClassificationFailure> {
    let (cx, cy) = domain.center();
    let gradients: Vec<Vector2<f64>> = GRADIENT_OFFSETS
        .iter()
        .filter_map(|(ox, oy)| central_gradient(f, cx + ox, cy + oy, settings.gradient_step))
        .map(|g| g.abs())
        .collect();
    if gradients.is_empty() {
        return Err(ClassificationFailure);
    }

    let count = gradients.len() as f64;
    let mean = gradients.iter().sum::<Vector2<f64>>() / count;
    let ratio = mean.x / (mean.y + 1e-12);
    let ratio_signal = if mean.x + mean.y > 0.0 {
        (ratio - 1.0) / (ratio + 1.0)
    } else {
        0.0
    };

    let factor = settings.dominance_factor;
    let x_dominant = gradients
        .iter()
        .filter(|g| g.x > 0.0 && g.x >= factor * g.y)
        .count() as f64;
    let y_dominant = gradients
        .iter()
        .filter(|g| g.y > 0.0 && g.y >= factor * g.x)
        .count() as f64;
    let tally_signal = (x_dominant - y_dominant) / count;

    // Newton along an axis behaves when that partial is consistent along it.
    let n = settings.spread_samples.max(2);
    let h = settings.gradient_step;
    let spread_dx = spread((0..n).map(|i| {
        let x = domain.x_min() + domain.width() * i as f64 / (n - 1) as f64;
        partial(f, x, cy, h, Axis::X)
    }));
    let spread_dy = spread((0..n).map(|i| {
        let y = domain.y_min() + domain.height() * i as f64 / (n - 1) as f64;
        partial(f, cx, y, h, Axis::Y)
    }));
    let spread_signal = if spread_dx + spread_dy > 0.0 {
        (spread_dy - spread_dx) / (spread_dx + spread_dy)
    } else {
        0.0
    };

    debug!(
        "classifier signals: ratio {ratio_signal:.3}, tally {tally_signal:.3}, \
         spread {spread_signal:.3} ({} gradient samples)",
        gradients.len()
    );

    Ok(settings.ratio_weight * ratio_signal
        + settings.tally_weight * tally_signal
        + settings.spread_weight * spread_signal)
}

/// Below this a spread is rounding noise (e.g. the partials of a linear function).
const SPREAD_FLOOR: f64 = 1e-6;

/// Population standard deviation of the available samples, floored to zero.
fn spread(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let finite: Vec<f64> = values.flatten().collect();
    if finite.len() < 2 {
        return 0.0;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let deviation = variance.sqrt();
    if deviation < SPREAD_FLOOR {
        0.0
    } else {
        deviation
    }
}
