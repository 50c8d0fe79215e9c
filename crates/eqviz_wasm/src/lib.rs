//! Browser bindings for `eqviz_core`.

use eqviz_core::Equation;
use wasm_bindgen::prelude::*;

mod plotter;

pub use plotter::WasmPlotter;

/// Checks equation text as the user types.
///
/// Returns the error message, or `None` when the text is acceptable. Blank
/// input is not reported as an error.
#[wasm_bindgen]
pub fn validate_equation(text: &str) -> Option<String> {
    equation_error(text)
}

fn equation_error(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    Equation::parse(text).err().map(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::equation_error;

    #[test]
    fn blank_input_is_not_an_error() {
        assert_eq!(equation_error(""), None);
        assert_eq!(equation_error("   "), None);
    }

    #[test]
    fn reports_parse_messages() {
        assert_eq!(equation_error("x^2 + y^2 = 25"), None);
        assert_eq!(equation_error("sin(x)"), None);
        let message = equation_error("x = (y").expect("unbalanced parens");
        assert!(message.contains("expected ')'"), "{message}");
        assert!(equation_error("x >= 1").is_some());
    }
}
