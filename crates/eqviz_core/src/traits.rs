use crate::error::EvaluationError;
use nalgebra::Vector2;
use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A trait for types the expression VM can evaluate over.
/// Implemented for `f64` (plain evaluation) and `Dual` (forward-mode derivatives).
pub trait Scalar:
    Copy
    + Debug
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    fn from_f64(value: f64) -> Self;
    fn powf(self, exponent: Self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan(self) -> Self;
    fn sinh(self) -> Self;
    fn cosh(self) -> Self;
    fn tanh(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn log10(self) -> Self;
    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    fn signum(self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
}

impl Scalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }
    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }
    fn sin(self) -> Self {
        f64::sin(self)
    }
    fn cos(self) -> Self {
        f64::cos(self)
    }
    fn tan(self) -> Self {
        f64::tan(self)
    }
    fn asin(self) -> Self {
        f64::asin(self)
    }
    fn acos(self) -> Self {
        f64::acos(self)
    }
    fn atan(self) -> Self {
        f64::atan(self)
    }
    fn sinh(self) -> Self {
        f64::sinh(self)
    }
    fn cosh(self) -> Self {
        f64::cosh(self)
    }
    fn tanh(self) -> Self {
        f64::tanh(self)
    }
    fn exp(self) -> Self {
        f64::exp(self)
    }
    fn ln(self) -> Self {
        f64::ln(self)
    }
    fn log10(self) -> Self {
        f64::log10(self)
    }
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    fn abs(self) -> Self {
        f64::abs(self)
    }
    fn signum(self) -> Self {
        // f64::signum maps 0.0 to 1.0; mathematical sign(0) is 0.
        if self == 0.0 {
            0.0
        } else {
            f64::signum(self)
        }
    }
    fn floor(self) -> Self {
        f64::floor(self)
    }
    fn ceil(self) -> Self {
        f64::ceil(self)
    }
}

/// A black-box two-variable function `f(x, y)` whose zero set is traced.
///
/// Implementations must be pure: the same inputs always give the same output.
/// The tracer never inspects how the value is computed.
pub trait ScalarFunction {
    /// Evaluates `f(x, y)`. Domain violations (non-finite results, `log` of a
    /// negative number, ...) are reported as `EvaluationError`.
    fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvaluationError>;

    /// Analytic gradient `(df/dx, df/dy)` when the implementation can supply one.
    /// Callers fall back to finite differences when this returns `None`.
    fn gradient(&self, _x: f64, _y: f64) -> Option<Vector2<f64>> {
        None
    }

    /// Analytic `df/dx` alone. Newton along `x` needs nothing else, so
    /// implementations that can skip the `y` partial should override this.
    fn x_partial(&self, x: f64, y: f64) -> Option<f64> {
        self.gradient(x, y).map(|grad| grad.x)
    }
}

impl<F> ScalarFunction for F
where
    F: Fn(f64, f64) -> f64,
{
    fn evaluate(&self, x: f64, y: f64) -> Result<f64, EvaluationError> {
        let value = self(x, y);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvaluationError::NonFinite { x, y })
        }
    }
}
