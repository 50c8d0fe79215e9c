//! Direct plotting of `y = g(x)` for bare expressions.

use crate::clip::Polyline;
use crate::config::TraceConfig;
use crate::continuation::sample_positions;
use crate::domain::Viewport;
use crate::traits::ScalarFunction;
use crate::types::CurveKind;
use log::debug;

/// Samples `g` across the view, evaluated at `(x, 0)`, and strokes the finite
/// samples that stay within `explicit_clip_margin` pixels vertically.
///
/// A failed or out-of-band sample ends the current polyline.
pub fn plot_explicit<G: ScalarFunction + ?Sized>(
    g: &G,
    viewport: &Viewport,
    config: &TraceConfig,
) -> Vec<Polyline> {
    let domain = &viewport.domain;
    let height = f64::from(viewport.resolution.height);
    let margin = config.explicit_clip_margin;
    let count = viewport.resolution.width as usize * config.explicit_samples_per_pixel + 1;

    let mut polylines = Vec::new();
    let mut current = Polyline::new(CurveKind::Explicit);
    let mut failures = 0usize;
    for x in sample_positions(domain.x_min(), domain.x_max(), count) {
        let mapped = g
            .evaluate(x, 0.0)
            .ok()
            .map(|y| viewport.to_canvas(x, y))
            .filter(|p| p.y >= -margin && p.y <= height + margin);
        match mapped {
            Some(point) => current.points.push(point),
            None => {
                failures += 1;
                if current.len() >= 2 {
                    polylines.push(current);
                }
                current = Polyline::new(CurveKind::Explicit);
            }
        }
    }
    if current.len() >= 2 {
        polylines.push(current);
    }
    debug!(
        "explicit plot: {} polylines, {failures} of {count} samples dropped",
        polylines.len()
    );
    polylines
}
