//! Stateful plotter handle for the browser canvas.

use eqviz_core::domain::{grid_step, CanvasSize, Domain, Resolution, Viewport};
use eqviz_core::tracer::{plot_equation, Plot};
use eqviz_core::{Equation, TraceConfig};
use js_sys::Float64Array;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// One equation and the window it is viewed through.
#[wasm_bindgen]
pub struct WasmPlotter {
    equation: Equation,
    viewport: Viewport,
    config: TraceConfig,
}

impl WasmPlotter {
    pub(crate) fn build(
        equation: &str,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        width: u32,
        height: u32,
    ) -> Result<WasmPlotter, String> {
        let equation = Equation::parse(equation).map_err(|e| e.to_string())?;
        let domain = Domain::new(x_min, x_max, y_min, y_max).map_err(|e| e.to_string())?;
        let resolution = Resolution::new(width, height).map_err(|e| e.to_string())?;
        Ok(WasmPlotter {
            equation,
            viewport: Viewport::new(domain, resolution),
            config: TraceConfig::default(),
        })
    }

    pub(crate) fn plot_native(&self) -> anyhow::Result<Plot> {
        plot_equation(&self.equation, &self.viewport, &self.config)
    }
}

#[wasm_bindgen]
impl WasmPlotter {
    #[wasm_bindgen(constructor)]
    pub fn new(
        equation: &str,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        width: u32,
        height: u32,
    ) -> Result<WasmPlotter, JsValue> {
        console_error_panic_hook::set_once();
        Self::build(equation, x_min, x_max, y_min, y_max, width, height)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Traces the equation and returns the serialized `Plot`.
    pub fn plot(&self) -> Result<JsValue, JsValue> {
        let plot = self
            .plot_native()
            .map_err(|e| JsValue::from_str(&format!("Plot failed: {:#}", e)))?;
        to_value(&plot).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn set_equation(&mut self, equation: &str) -> Result<(), JsValue> {
        self.equation = Equation::parse(equation).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// Leaves the window unchanged when it cannot shrink any further.
    pub fn zoom_in(&mut self) -> Result<(), JsValue> {
        self.viewport.domain = self
            .viewport
            .domain
            .zoom_in()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    pub fn zoom_out(&mut self) -> Result<(), JsValue> {
        self.viewport.domain = self
            .viewport
            .domain
            .zoom_out()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    pub fn reset_view(&mut self) {
        self.viewport.domain = Domain::default();
    }

    pub fn set_view(
        &mut self,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Result<(), JsValue> {
        self.viewport.domain = Domain::new(x_min, x_max, y_min, y_max)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.viewport.resolution =
            CanvasSize::new(width, height).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// Current window as `[x_min, x_max, y_min, y_max]`.
    pub fn view(&self) -> Float64Array {
        let d = self.viewport.domain;
        Float64Array::from(&[d.x_min(), d.x_max(), d.y_min(), d.y_max()][..])
    }

    pub fn grid_x(&self) -> Float64Array {
        Float64Array::from(self.viewport.domain.grid_lines().x.as_slice())
    }

    pub fn grid_y(&self) -> Float64Array {
        Float64Array::from(self.viewport.domain.grid_lines().y.as_slice())
    }

    /// Grid spacing along `x`, for label formatting.
    pub fn grid_step_x(&self) -> f64 {
        grid_step(self.viewport.domain.width())
    }

    pub fn grid_step_y(&self) -> f64 {
        grid_step(self.viewport.domain.height())
    }
}
