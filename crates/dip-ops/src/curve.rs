//! Piecewise-linear tone curves.
//!
//! A [`ToneCurve`] maps `[0, 1]` to `[0, 1]` through an ordered list of
//! vertices. The first vertex sits at `x = 0`, the last at `x = 1`, and `x`
//! strictly increases in between.
//!
//! ```rust
//! use dip_ops::curve::ToneCurve;
//!
//! // Stretch the lower half, compress the upper half.
//! let curve = ToneCurve::new(vec![(0.0, 0.0), (0.5, 0.75), (1.0, 1.0)]).unwrap();
//! assert_eq!(curve.eval(0.25), 0.375);
//! ```

use crate::{OpsError, OpsResult};

/// Ordered `(x, y)` vertices of a piecewise-linear mapping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<(f32, f32)>", into = "Vec<(f32, f32)>"))]
pub struct ToneCurve {
    points: Vec<(f32, f32)>,
}

impl ToneCurve {
    /// Validates and builds a curve.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::InvalidParameter`] when there are fewer than two
    /// vertices, a coordinate is outside `[0, 1]`, the endpoints are not at
    /// `x = 0` and `x = 1`, or `x` does not strictly increase.
    pub fn new(points: Vec<(f32, f32)>) -> OpsResult<Self> {
        if points.len() < 2 {
            return Err(OpsError::InvalidParameter(
                "tone curve needs at least two vertices".into(),
            ));
        }
        for &(x, y) in &points {
            if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
                return Err(OpsError::InvalidParameter(format!(
                    "tone curve vertex ({}, {}) outside [0, 1]",
                    x, y
                )));
            }
        }
        let first = points[0].0;
        let last = points[points.len() - 1].0;
        if first != 0.0 || last != 1.0 {
            return Err(OpsError::InvalidParameter(format!(
                "tone curve must span x = 0..1, got {}..{}",
                first, last
            )));
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(OpsError::InvalidParameter(
                "tone curve x must strictly increase".into(),
            ));
        }
        Ok(Self { points })
    }

    /// The identity mapping.
    pub fn identity() -> Self {
        Self {
            points: vec![(0.0, 0.0), (1.0, 1.0)],
        }
    }

    /// Vertices of the curve.
    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    /// Evaluates the curve at `x`.
    ///
    /// Inputs outside `[0, 1]` are clamped first; NaN maps to 0.
    pub fn eval(&self, x: f32) -> f32 {
        if x.is_nan() {
            return 0.0;
        }
        let x = x.clamp(0.0, 1.0);
        // First vertex whose x is >= the input; x = 0 lands on index 0.
        let i = self.points.partition_point(|&(px, _)| px < x);
        if i == 0 {
            return self.points[0].1;
        }
        let (x0, y0) = self.points[i - 1];
        let (x1, y1) = self.points[i.min(self.points.len() - 1)];
        if x1 <= x0 {
            return y1;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self::identity()
    }
}

impl TryFrom<Vec<(f32, f32)>> for ToneCurve {
    type Error = OpsError;

    fn try_from(points: Vec<(f32, f32)>) -> OpsResult<Self> {
        Self::new(points)
    }
}

impl From<ToneCurve> for Vec<(f32, f32)> {
    fn from(curve: ToneCurve) -> Self {
        curve.points
    }
}
