//! The `eqviz_core` crate is the numerics engine behind the EqViz equation plotter.
//!
//! It traces the zero set of an arbitrary two-variable function over a
//! rectangular window without any symbolic knowledge of the equation.
//!
//! Key components:
//! - **Traits**: `ScalarFunction` (the black-box `f(x, y)` being traced),
//!   `Scalar` (numeric abstraction for the VM).
//! - **Equation Engine**: a bytecode VM compiling user expressions, with dual-number gradients.
//! - **Tracer**: dependency classification, root isolation, Newton continuation,
//!   branch segmentation.
//! - **Viewport**: domain validation, zoom, grid lines and the canvas mapping used for clipping.
pub mod autodiff;
pub mod classify;
pub mod clip;
pub mod config;
pub mod continuation;
pub mod domain;
pub mod equation;
pub mod equation_engine;
pub mod error;
pub mod explicit;
pub mod roots;
pub mod segment;
pub mod single_variable;
pub mod tracer;
pub mod traits;
pub mod types;

pub use config::TraceConfig;
pub use domain::{Domain, Resolution, Viewport};
pub use equation::Equation;
pub use tracer::{plot_equation, trace, Plot, TraceOutput};
pub use traits::ScalarFunction;
