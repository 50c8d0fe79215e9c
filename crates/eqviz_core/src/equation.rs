//! Turning user-entered equation text into a function to plot.

use crate::equation_engine::CompiledExpression;
use crate::error::EquationError;
use crate::traits::ScalarFunction;
use log::debug;

const RELATIONAL_OPERATORS: [&str; 6] = ["<=", ">=", "!=", "==", "<", ">"];

/// A parsed equation, ready for plotting.
#[derive(Debug, Clone)]
pub enum Equation {
    /// `lhs = rhs`, stored as the zero-seeking `(lhs) - (rhs)`.
    Implicit(CompiledExpression),
    /// A bare expression, plotted as `y = expr` with `y` bound to zero.
    Explicit(CompiledExpression),
}

impl Equation {
    pub fn parse(text: &str) -> Result<Self, EquationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EquationError::Empty);
        }
        if let Some(op) = RELATIONAL_OPERATORS.iter().find(|op| text.contains(**op)) {
            return Err(EquationError::Relational(op.to_string()));
        }

        let sides: Vec<&str> = text.split('=').map(str::trim).collect();
        let equation = match sides.as_slice() {
            [expr] => Equation::Explicit(CompiledExpression::compile(expr)?),
            [lhs, rhs] => {
                if lhs.is_empty() || rhs.is_empty() {
                    return Err(EquationError::EmptySide);
                }
                Equation::Implicit(CompiledExpression::compile(&format!("({lhs}) - ({rhs})"))?)
            }
            _ => return Err(EquationError::MultipleEquals(sides.len() - 1)),
        };

        // Undefined at the origin is fine, e.g. `y = log(x)`.
        if let Err(err) = equation.function().evaluate(0.0, 0.0) {
            debug!("'{text}': {err}");
        }
        Ok(equation)
    }

    pub fn function(&self) -> &CompiledExpression {
        match self {
            Equation::Implicit(f) | Equation::Explicit(f) => f,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Equation::Explicit(_))
    }
}
