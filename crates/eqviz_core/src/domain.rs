//! Plotting window and its mapping onto a pixel canvas.

use crate::error::DomainError;
use nalgebra::{Matrix3, Point2};
use serde::{Deserialize, Serialize};

/// Smallest range, relative to the bounds' magnitude, that still leaves room
/// for a few thousand distinct samples.
const MIN_RELATIVE_SPAN: f64 = 1e-12;

/// The rectangle `[x_min, x_max] x [y_min, y_max]` being plotted.
///
/// Always satisfies `x_min < x_max` and `y_min < y_max` with finite bounds
/// and finite, resolvable ranges; construction, deserialization and zooming
/// all validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDomain")]
pub struct Domain {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

#[derive(Deserialize)]
struct RawDomain {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl TryFrom<RawDomain> for Domain {
    type Error = DomainError;

    fn try_from(raw: RawDomain) -> Result<Self, Self::Error> {
        Domain::new(raw.x_min, raw.x_max, raw.y_min, raw.y_max)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            x_min: -10.0,
            x_max: 10.0,
            y_min: -10.0,
            y_max: 10.0,
        }
    }
}

impl Domain {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, DomainError> {
        if ![x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite()) {
            return Err(DomainError::NonFinite);
        }
        if x_min >= x_max {
            return Err(DomainError::EmptyXRange { x_min, x_max });
        }
        if y_min >= y_max {
            return Err(DomainError::EmptyYRange { y_min, y_max });
        }
        let (width, height) = (x_max - x_min, y_max - y_min);
        if !width.is_finite() || !height.is_finite() {
            return Err(DomainError::NonFinite);
        }
        let too_narrow = |span: f64, lo: f64, hi: f64| {
            span <= MIN_RELATIVE_SPAN * lo.abs().max(hi.abs())
        };
        if too_narrow(width, x_min, x_max) || too_narrow(height, y_min, y_max) {
            return Err(DomainError::TooNarrow { width, height });
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
        )
    }

    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x_min && x <= self.x_max
    }

    /// Shrinks the window by a quarter of each range on every side.
    ///
    /// Fails once the result would be too narrow to resolve.
    pub fn zoom_in(&self) -> Result<Self, DomainError> {
        self.inflate(-0.25)
    }

    /// Grows the window by a quarter of each range on every side.
    ///
    /// Fails once a bound or range would overflow.
    pub fn zoom_out(&self) -> Result<Self, DomainError> {
        self.inflate(0.25)
    }

    fn inflate(&self, fraction: f64) -> Result<Self, DomainError> {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self::new(
            self.x_min - dx,
            self.x_max + dx,
            self.y_min - dy,
            self.y_max + dy,
        )
    }

    /// Tick positions for both axes, on a power-of-ten grid.
    pub fn grid_lines(&self) -> GridLines {
        GridLines {
            x: ticks(self.x_min, self.x_max),
            y: ticks(self.y_min, self.y_max),
        }
    }
}

/// Power-of-ten spacing giving roughly ten grid lines across `range`.
pub fn grid_step(range: f64) -> f64 {
    10f64.powf((range / 10.0).log10().floor())
}

fn ticks(min: f64, max: f64) -> Vec<f64> {
    let step = grid_step(max - min);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    // Integer multiples avoid the drift of repeated `+= step`.
    (first..=last).map(|i| i as f64 * step).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLines {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Pixel dimensions of the target canvas. Governs sampling density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::EmptyCanvas { width, height });
        }
        Ok(Self { width, height })
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 900,
            height: 650,
        }
    }
}

/// Canvas dimensions as hosts usually name them.
pub type CanvasSize = Resolution;

/// A point in canvas pixels; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

/// A domain shown on a canvas of a given resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub domain: Domain,
    pub resolution: Resolution,
}

impl Viewport {
    pub fn new(domain: Domain, resolution: Resolution) -> Self {
        Self { domain, resolution }
    }

    /// Homogeneous affine map from domain coordinates to canvas pixels.
    pub fn to_canvas_matrix(&self) -> Matrix3<f64> {
        let sx = f64::from(self.resolution.width) / self.domain.width();
        let sy = f64::from(self.resolution.height) / self.domain.height();
        Matrix3::new(
            sx,
            0.0,
            -self.domain.x_min * sx,
            0.0,
            -sy,
            f64::from(self.resolution.height) + self.domain.y_min * sy,
            0.0,
            0.0,
            1.0,
        )
    }

    pub fn to_canvas(&self, x: f64, y: f64) -> CanvasPoint {
        let mapped = self
            .to_canvas_matrix()
            .transform_point(&Point2::new(x, y));
        CanvasPoint {
            x: mapped.x,
            y: mapped.y,
        }
    }

    /// Whether a canvas point lies inside the canvas inflated by `margin` pixels.
    pub fn within_margin(&self, point: CanvasPoint, margin: f64) -> bool {
        let width = f64::from(self.resolution.width);
        let height = f64::from(self.resolution.height);
        point.x >= -margin
            && point.x <= width + margin
            && point.y >= -margin
            && point.y <= height + margin
    }
}
