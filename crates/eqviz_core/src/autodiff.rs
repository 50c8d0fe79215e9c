use crate::traits::Scalar;
use num_traits::{One, Zero};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Simple Dual Number for Forward Mode AD
/// val: real part
/// eps: infinitesimal part
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Dual {
    pub val: f64,
    pub eps: f64,
}

impl Dual {
    pub fn new(val: f64, eps: f64) -> Self {
        Self { val, eps }
    }

    /// A dual seeded as the differentiation variable.
    pub fn variable(val: f64) -> Self {
        Self::new(val, 1.0)
    }

    pub fn constant(val: f64) -> Self {
        Self::new(val, 0.0)
    }

    fn chain(self, val: f64, derivative: f64) -> Self {
        Self::new(val, derivative * self.eps)
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::constant(0.0)
    }
    fn is_zero(&self) -> bool {
        self.val == 0.0 && self.eps == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::constant(1.0)
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.val * rhs.val, self.val * rhs.eps + self.eps * rhs.val)
    }
}

impl Div for Dual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        let val = self.val / rhs.val;
        let eps = (self.eps * rhs.val - self.val * rhs.eps) / (rhs.val * rhs.val);
        Self::new(val, eps)
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.eps)
    }
}

impl Scalar for Dual {
    fn from_f64(value: f64) -> Self {
        Self::constant(value)
    }

    fn powf(self, exponent: Self) -> Self {
        let val = self.val.powf(exponent.val);
        if exponent.eps == 0.0 {
            // Constant exponent: keeps x^2 differentiable for negative x.
            let eps = exponent.val * self.val.powf(exponent.val - 1.0) * self.eps;
            Self::new(val, eps)
        } else {
            let eps = val * (exponent.eps * self.val.ln() + exponent.val * self.eps / self.val);
            Self::new(val, eps)
        }
    }

    fn sin(self) -> Self {
        self.chain(self.val.sin(), self.val.cos())
    }

    fn cos(self) -> Self {
        self.chain(self.val.cos(), -self.val.sin())
    }

    fn tan(self) -> Self {
        let c = self.val.cos();
        self.chain(self.val.tan(), 1.0 / (c * c))
    }

    fn asin(self) -> Self {
        self.chain(self.val.asin(), 1.0 / (1.0 - self.val * self.val).sqrt())
    }

    fn acos(self) -> Self {
        self.chain(self.val.acos(), -1.0 / (1.0 - self.val * self.val).sqrt())
    }

    fn atan(self) -> Self {
        self.chain(self.val.atan(), 1.0 / (1.0 + self.val * self.val))
    }

    fn sinh(self) -> Self {
        self.chain(self.val.sinh(), self.val.cosh())
    }

    fn cosh(self) -> Self {
        self.chain(self.val.cosh(), self.val.sinh())
    }

    fn tanh(self) -> Self {
        let t = self.val.tanh();
        self.chain(t, 1.0 - t * t)
    }

    fn exp(self) -> Self {
        let e = self.val.exp();
        self.chain(e, e)
    }

    fn ln(self) -> Self {
        self.chain(self.val.ln(), 1.0 / self.val)
    }

    fn log10(self) -> Self {
        self.chain(self.val.log10(), 1.0 / (self.val * std::f64::consts::LN_10))
    }

    fn sqrt(self) -> Self {
        let s = self.val.sqrt();
        self.chain(s, 0.5 / s)
    }

    fn abs(self) -> Self {
        self.chain(self.val.abs(), Scalar::signum(self.val))
    }

    fn signum(self) -> Self {
        Self::constant(Scalar::signum(self.val))
    }

    fn floor(self) -> Self {
        Self::constant(self.val.floor())
    }

    fn ceil(self) -> Self {
        Self::constant(self.val.ceil())
    }
}

#[cfg(test)]
mod tests {
    use super::Dual;
    use crate::traits::Scalar;

    #[test]
    fn product_rule() {
        let x = Dual::variable(3.0);
        let out = x * x;
        assert_eq!(out.val, 9.0);
        assert_eq!(out.eps, 6.0);
    }

    #[test]
    fn quotient_rule() {
        let x = Dual::variable(2.0);
        let out = Dual::constant(1.0) / x;
        assert!((out.eps + 0.25).abs() < 1e-12);
    }

    #[test]
    fn constant_power_of_negative_base() {
        let x = Dual::variable(-2.0);
        let out = x.powf(Dual::constant(2.0));
        assert!((out.val - 4.0).abs() < 1e-12);
        assert!((out.eps + 4.0).abs() < 1e-12);
    }

    #[test]
    fn chain_rule_through_sin() {
        let x = Dual::variable(0.5);
        let out = (x * Dual::constant(2.0)).sin();
        assert!((out.eps - 2.0 * 1.0f64.cos()).abs() < 1e-12);
    }

    #[test]
    fn sign_is_piecewise_constant() {
        let x = Dual::variable(-4.0);
        let out = Scalar::signum(x);
        assert_eq!(out.val, -1.0);
        assert_eq!(out.eps, 0.0);
    }
}
