//! Core value types produced by a trace.
//!
//! Everything here is created fresh per trace and owned by the caller.

use serde::{Deserialize, Serialize};

/// Which variables a function actually depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyClass {
    Constant,
    FunctionOfXOnly,
    FunctionOfYOnly,
    Bivariate,
}

/// A point believed to satisfy `f(x, y) ~ 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolutionPoint {
    pub x: f64,
    pub y: f64,
}

impl SolutionPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How a curve was produced; decides how loosely it is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// `y = g(x)` sampled directly.
    Explicit,
    /// Traced from the zero set of `f(x, y)`.
    Implicit,
    /// A full-height or full-width line for a single-variable equation.
    AxisLine,
}

/// One continuous drawable branch, in domain coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub kind: CurveKind,
    pub points: Vec<SolutionPoint>,
}

impl Curve {
    pub fn new(kind: CurveKind, points: Vec<SolutionPoint>) -> Self {
        Self { kind, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Sweep strategy chosen for a bivariate relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepDirection {
    /// Sweep `x`, isolate every `y` root per sample.
    SweepX,
    /// Sweep `y`, Newton-solve for a single `x` per sample.
    SweepY,
}

impl SweepDirection {
    pub fn from_prefer_solving_for_x(prefer_solving_for_x: bool) -> Self {
        if prefer_solving_for_x {
            Self::SweepY
        } else {
            Self::SweepX
        }
    }
}
