//! Mapping traced curves onto the canvas and pruning what falls off it.

use crate::config::TraceConfig;
use crate::domain::{CanvasPoint, Viewport};
use crate::types::{Curve, CurveKind};
use serde::{Deserialize, Serialize};

/// A connected run of canvas points, ready to be stroked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub kind: CurveKind,
    pub points: Vec<CanvasPoint>,
}

impl Polyline {
    pub fn new(kind: CurveKind) -> Self {
        Self {
            kind,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Pixel margin around the canvas inside which points of `kind` stay drawn.
pub fn margin_for(kind: CurveKind, config: &TraceConfig) -> f64 {
    match kind {
        CurveKind::Explicit => config.explicit_clip_margin,
        CurveKind::Implicit | CurveKind::AxisLine => config.implicit_clip_margin,
    }
}

/// Maps `curve` to canvas pixels, starting a new polyline whenever a point
/// lands outside the canvas inflated by `margin`.
///
/// Runs shorter than two points cannot be stroked and are dropped.
pub fn clip(curve: &Curve, viewport: &Viewport, margin: f64) -> Vec<Polyline> {
    let mut out = Vec::new();
    let mut current = Polyline::new(curve.kind);
    for point in &curve.points {
        let mapped = viewport.to_canvas(point.x, point.y);
        let visible =
            mapped.x.is_finite() && mapped.y.is_finite() && viewport.within_margin(mapped, margin);
        if visible {
            current.points.push(mapped);
        } else {
            flush(&mut out, &mut current, curve.kind);
        }
    }
    flush(&mut out, &mut current, curve.kind);
    out
}

fn flush(out: &mut Vec<Polyline>, current: &mut Polyline, kind: CurveKind) {
    let finished = std::mem::replace(current, Polyline::new(kind));
    if finished.len() >= 2 {
        out.push(finished);
    }
}
