//! Ordering scattered solution points into drawable curves.

use crate::types::{Curve, CurveKind, SolutionPoint};
use std::cmp::Ordering;

/// Groups sweep-x points (several `y` per `x`) into upper and lower branches.
///
/// Points are grouped by `x` rounded to `grouping_decimals`. Within a run of
/// groups the largest `y` feeds the upper curve (emitted by ascending `x`) and
/// the smallest feeds the lower curve (emitted by descending `x`), so a circle
/// comes out as two arcs meeting at its ends. A lower curve is only emitted
/// when some group in the run actually holds two or more values.
///
/// With `max_gap`, runs are split wherever consecutive groups lie further
/// apart than that in `x`.
pub fn segment_branches(
    points: &[SolutionPoint],
    grouping_decimals: i32,
    max_gap: Option<f64>,
) -> Vec<Curve> {
    let groups = group_by_x(points, grouping_decimals);
    let mut curves = Vec::new();
    for run in split_runs(&groups, max_gap, |group| group.x) {
        let upper: Vec<SolutionPoint> = run
            .iter()
            .map(|group| SolutionPoint::new(group.x, group.max()))
            .collect();
        let multi_valued = run.iter().any(|group| group.ys.len() >= 2);
        curves.push(Curve::new(CurveKind::Implicit, upper));
        if multi_valued {
            let lower: Vec<SolutionPoint> = run
                .iter()
                .rev()
                .map(|group| SolutionPoint::new(group.x, group.min()))
                .collect();
            curves.push(Curve::new(CurveKind::Implicit, lower));
        }
    }
    curves
}

/// Orders sweep-y points (one `x` per `y`) into a curve by ascending `y`.
///
/// Samples closer than `duplicate_tolerance` in `y` to the last kept sample
/// are dropped. Distinct branches sharing a `y` range are not separated.
pub fn order_single_branch(
    points: &[SolutionPoint],
    duplicate_tolerance: f64,
    max_gap: Option<f64>,
) -> Vec<Curve> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut kept: Vec<SolutionPoint> = Vec::with_capacity(sorted.len());
    for point in sorted {
        let duplicate = kept
            .last()
            .is_some_and(|last| (point.y - last.y).abs() < duplicate_tolerance);
        if !duplicate {
            kept.push(point);
        }
    }

    split_runs(&kept, max_gap, |point| point.y)
        .into_iter()
        .map(|run| Curve::new(CurveKind::Implicit, run.to_vec()))
        .collect()
}

#[derive(Debug, Clone)]
struct Group {
    x: f64,
    ys: Vec<f64>,
}

impl Group {
    fn max(&self) -> f64 {
        self.ys.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn min(&self) -> f64 {
        self.ys.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

fn group_by_x(points: &[SolutionPoint], decimals: i32) -> Vec<Group> {
    let scale = 10f64.powi(decimals);
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| match a.x.partial_cmp(&b.x) {
        Some(Ordering::Equal) | None => a.y.total_cmp(&b.y),
        Some(order) => order,
    });

    let mut groups: Vec<(i64, Group)> = Vec::new();
    for point in sorted {
        let key = (point.x * scale).round() as i64;
        match groups.last_mut() {
            Some((last_key, group)) if *last_key == key => group.ys.push(point.y),
            _ => groups.push((
                key,
                Group {
                    x: point.x,
                    ys: vec![point.y],
                },
            )),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

/// Splits an ordered slice wherever the key jumps by more than `max_gap`.
fn split_runs<T>(items: &[T], max_gap: Option<f64>, key: impl Fn(&T) -> f64) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    let Some(max_gap) = max_gap else {
        return vec![items];
    };
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..items.len() {
        if key(&items[i]) - key(&items[i - 1]) > max_gap {
            runs.push(&items[start..i]);
            start = i;
        }
    }
    runs.push(&items[start..]);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<SolutionPoint> {
        raw.iter().map(|&(x, y)| SolutionPoint::new(x, y)).collect()
    }

    #[test]
    fn splits_circle_into_upper_and_lower_arcs() {
        let points = pts(&[
            (0.0, 1.0),
            (-1.0, 0.0),
            (0.0, -1.0),
            (0.5, -0.8),
            (1.0, 0.0),
            (0.5, 0.8),
            (-0.5, 0.8),
            (-0.5, -0.8),
        ]);
        let curves = segment_branches(&points, 3, None);
        assert_eq!(curves.len(), 2);

        let upper: Vec<(f64, f64)> = curves[0].points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            upper,
            vec![(-1.0, 0.0), (-0.5, 0.8), (0.0, 1.0), (0.5, 0.8), (1.0, 0.0)]
        );
        let lower: Vec<(f64, f64)> = curves[1].points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            lower,
            vec![(1.0, 0.0), (0.5, -0.8), (0.0, -1.0), (-0.5, -0.8), (-1.0, 0.0)]
        );
    }

    #[test]
    fn single_valued_points_form_one_curve() {
        let points = pts(&[(2.0, 3.0), (0.0, 5.0), (1.0, 4.0)]);
        let curves = segment_branches(&points, 3, None);
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].points.first().map(|p| p.x), Some(0.0));
    }

    #[test]
    fn jitter_below_grouping_precision_collapses() {
        let points = pts(&[(1.0, 2.0), (1.0000001, -2.0)]);
        let curves = segment_branches(&points, 3, None);
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].len(), 1);
    }

    #[test]
    fn gaps_split_runs() {
        let points = pts(&[(-2.0, -0.5), (-1.9, -0.52), (1.9, 0.52), (2.0, 0.5)]);
        assert_eq!(segment_branches(&points, 3, None).len(), 1);
        assert_eq!(segment_branches(&points, 3, Some(0.15)).len(), 2);
    }

    #[test]
    fn single_branch_orders_and_drops_duplicates() {
        let points = pts(&[(0.3, 1.0), (0.1, -1.0), (0.2, 0.0), (0.25, 0.0005)]);
        let curves = order_single_branch(&points, 1e-3, None);
        assert_eq!(curves.len(), 1);
        let ys: Vec<f64> = curves[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn empty_input_yields_no_curves() {
        assert!(segment_branches(&[], 3, Some(1.0)).is_empty());
        assert!(order_single_branch(&[], 1e-3, Some(1.0)).is_empty());
    }
}
