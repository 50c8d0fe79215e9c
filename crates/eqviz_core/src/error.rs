//! Error types shared across the crate.
//!
//! Only parsing and domain construction fail hard. Evaluation failures are
//! absorbed by the tracer one sample at a time.

use thiserror::Error;

/// A function could not be evaluated at a point.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EvaluationError {
    #[error("function is undefined at ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
}

/// No sample yielded a finite gradient, so the sweep direction cannot be
/// estimated. Callers fall back to sweeping `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no finite gradient found at any classifier sample")]
pub struct ClassificationFailure;

/// Malformed expression text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { found: char, position: usize },
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("unexpected token {found} at position {position}")]
    UnexpectedToken { found: String, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expected ')' at position {0}")]
    MissingClosingParen(usize),
    #[error("unknown variable: {0}")]
    UnknownVariable(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
}

/// Raw equation text rejected before compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EquationError {
    #[error("equation is empty")]
    Empty,
    #[error("relational operator '{0}' is not supported; use a single '='")]
    Relational(String),
    #[error("equation must contain exactly one '=' (found {0})")]
    MultipleEquals(usize),
    #[error("both sides of '=' must be non-empty")]
    EmptySide,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// An invalid plotting window.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("domain bounds and ranges must be finite")]
    NonFinite,
    #[error("x range is empty: x_min ({x_min}) must be less than x_max ({x_max})")]
    EmptyXRange { x_min: f64, x_max: f64 },
    #[error("y range is empty: y_min ({y_min}) must be less than y_max ({y_max})")]
    EmptyYRange { y_min: f64, y_max: f64 },
    #[error("window is too narrow to resolve: width {width}, height {height}")]
    TooNarrow { width: f64, height: f64 },
    #[error("canvas size must be positive, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
}
