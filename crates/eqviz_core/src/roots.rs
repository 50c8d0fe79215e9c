//! Sign-change root isolation on a 1D slice.

use crate::config::RootSettings;
use crate::error::EvaluationError;
use log::trace;

/// Finds every root of `slice` on `[lo, hi]` that shows up as a sign change
/// between neighbouring sub-interval boundaries, bisecting each bracket.
///
/// Sub-intervals touching an evaluation failure are skipped; the result may
/// then be empty but the call never fails. Roots come back in ascending order.
pub fn find_roots<S>(slice: S, lo: f64, hi: f64, settings: &RootSettings) -> Vec<f64>
where
    S: Fn(f64) -> Result<f64, EvaluationError>,
{
    let segments = settings.segments.max(1);
    let step = (hi - lo) / segments as f64;
    let values: Vec<Option<f64>> = (0..=segments)
        .map(|i| slice(boundary(lo, hi, step, i, segments)).ok())
        .collect();

    let mut roots: Vec<f64> = Vec::new();
    for i in 0..segments {
        let (Some(fa), Some(fb)) = (values[i], values[i + 1]) else {
            continue;
        };
        if fa * fb > 0.0 {
            continue;
        }
        let a = boundary(lo, hi, step, i, segments);
        let b = boundary(lo, hi, step, i + 1, segments);
        let root = if fa == 0.0 {
            Some(a)
        } else if fb == 0.0 {
            Some(b)
        } else {
            bisect(&slice, a, b, fa, settings)
        };
        let Some(root) = root else {
            trace!("bracket [{a}, {b}] abandoned after an evaluation failure");
            continue;
        };
        // An exact zero on a shared boundary brackets both neighbours.
        let duplicate = roots
            .last()
            .is_some_and(|last| (root - last).abs() < settings.width_tolerance);
        if !duplicate {
            roots.push(root);
        }
    }
    roots
}

fn boundary(lo: f64, hi: f64, step: f64, i: usize, segments: usize) -> f64 {
    if i == segments {
        hi
    } else {
        lo + step * i as f64
    }
}

/// Bisects a sign-change bracket to its midpoint. `None` on evaluation failure.
pub(crate) fn bisect<S>(
    slice: &S,
    mut a: f64,
    mut b: f64,
    mut fa: f64,
    settings: &RootSettings,
) -> Option<f64>
where
    S: Fn(f64) -> Result<f64, EvaluationError>,
{
    let mut mid = 0.5 * (a + b);
    for _ in 0..settings.max_bisections {
        mid = 0.5 * (a + b);
        let fm = slice(mid).ok()?;
        if fm.abs() < settings.value_tolerance || (b - a) < settings.width_tolerance {
            return Some(mid);
        }
        if fa * fm <= 0.0 {
            b = mid;
        } else {
            a = mid;
            fa = fm;
        }
    }
    Some(mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finite(value: f64) -> Result<f64, EvaluationError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvaluationError::NonFinite { x: 0.0, y: 0.0 })
        }
    }

    #[test]
    fn finds_both_roots_of_quadratic() {
        let roots = find_roots(|y| finite(y * y - 9.0), -10.0, 10.0, &RootSettings::default());
        assert_eq!(roots.len(), 2);
        assert!((roots[0] + 3.0).abs() < 1e-3);
        assert!((roots[1] - 3.0).abs() < 1e-3);
    }

    #[test]
    fn exact_zero_on_boundary_is_reported_once() {
        // With 50 segments on [-10, 10] the boundaries fall on multiples of 0.4.
        let roots = find_roots(|y| finite(y - 2.0), -10.0, 10.0, &RootSettings::default());
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn failing_slice_yields_no_roots() {
        let roots = find_roots(|_| finite(f64::NAN), -1.0, 1.0, &RootSettings::default());
        assert!(roots.is_empty());
    }

    #[test]
    fn skips_brackets_touching_failures() {
        // ln is undefined left of zero; the root at 1 is still found.
        let roots = find_roots(|y| finite(y.ln()), -5.0, 5.0, &RootSettings::default());
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn respects_segment_count() {
        // A single segment sees no sign change across both roots.
        let coarse = RootSettings {
            segments: 1,
            ..RootSettings::default()
        };
        let roots = find_roots(|y| finite(y * y - 0.25), -1.0, 1.0, &coarse);
        assert!(roots.is_empty());
        let fine = find_roots(|y| finite(y * y - 0.25), -1.0, 1.0, &RootSettings::default());
        assert_eq!(fine.len(), 2);
    }
}
