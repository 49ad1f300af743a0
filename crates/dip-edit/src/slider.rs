//! Slider positions and the physical parameters they stand for.
//!
//! Editors expose integer sliders; the tonal operations want physical
//! values. A [`SliderMapping`] converts between the two, a
//! [`ParameterInfo`] describes one slider, and an [`Adjustment`] lists the
//! sliders of one tonal operation and builds the [`ToneOp`] from their
//! positions.
//!
//! ```rust
//! use dip_edit::slider::Adjustment;
//! use dip_ops::ToneOp;
//!
//! let op = Adjustment::Gamma.build(&[1000, 0]).unwrap();
//! assert_eq!(op, ToneOp::Gamma { gamma: 10.0, c: 1.0 });
//! ```

use crate::{EditError, EditResult};
use dip_ops::ToneOp;
use serde::{Deserialize, Serialize};

/// Conversion from slider position to physical value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum SliderMapping {
    /// `raw / scale`
    Linear {
        /// Divisor.
        scale: f32,
    },
    /// `exp(-raw / scale)`
    Exp {
        /// Divisor.
        scale: f32,
    },
    /// `10^(raw / scale)`
    Pow10 {
        /// Divisor.
        scale: f32,
    },
}

impl SliderMapping {
    /// Physical value for slider position `raw`.
    pub fn to_value(self, raw: i32) -> f32 {
        let raw = raw as f32;
        match self {
            Self::Linear { scale } => raw / scale,
            Self::Exp { scale } => (-raw / scale).exp(),
            Self::Pow10 { scale } => 10f32.powf(raw / scale),
        }
    }

    /// Slider position closest to the physical `value`.
    ///
    /// Values outside the mapping's domain (non-positive for the
    /// logarithmic laws) give position 0.
    pub fn to_raw(self, value: f32) -> i32 {
        let raw = match self {
            Self::Linear { scale } => value * scale,
            Self::Exp { scale } => -scale * value.ln(),
            Self::Pow10 { scale } => scale * value.log10(),
        };
        if raw.is_finite() { raw.round() as i32 } else { 0 }
    }
}

/// One slider: label, mapping, default and range of positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterInfo {
    /// Display label.
    pub label: &'static str,
    /// Position-to-value law.
    pub mapping: SliderMapping,
    /// Initial position.
    pub default: i32,
    /// Lowest position.
    pub min: i32,
    /// Highest position.
    pub max: i32,
}

impl ParameterInfo {
    /// Physical value at `raw`, clamped into `[min, max]` first.
    pub fn value(&self, raw: i32) -> f32 {
        self.mapping.to_value(raw.clamp(self.min, self.max))
    }

    /// Physical value at the default position.
    pub fn default_value(&self) -> f32 {
        self.value(self.default)
    }
}

const fn param(label: &'static str, mapping: SliderMapping, default: i32, min: i32, max: i32) -> ParameterInfo {
    ParameterInfo {
        label,
        mapping,
        default,
        min,
        max,
    }
}

const LINEAR_100: SliderMapping = SliderMapping::Linear { scale: 100.0 };
const POW10_100: SliderMapping = SliderMapping::Pow10 { scale: 100.0 };

const LIGHTNESS: [ParameterInfo; 1] = [param("lightness", SliderMapping::Exp { scale: 100.0 }, 0, -150, 150)];
const SATURATION: [ParameterInfo; 1] = [param("saturation", LINEAR_100, 0, -100, 100)];
const HUE: [ParameterInfo; 1] = [param("hue", SliderMapping::Linear { scale: 1.0 }, 0, -180, 180)];
const GAMMA: [ParameterInfo; 2] = [
    param("gamma", SliderMapping::Pow10 { scale: 1000.0 }, 0, -1400, 1400),
    param("c", POW10_100, 0, -100, 100),
];
const LOG: [ParameterInfo; 3] = [
    param("a", LINEAR_100, 0, -100, 100),
    param("b", POW10_100, 0, -100, 100),
    param("c", LINEAR_100, 200, 105, 1000),
];
const POWER: [ParameterInfo; 3] = [
    param("a", LINEAR_100, 0, -100, 100),
    param("b", LINEAR_100, 230, 101, 1000),
    param("c", POW10_100, 0, -100, 100),
];

/// Slider-driven tonal adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// One slider, `exp(-raw / 100)`.
    Lightness,
    /// One slider, `raw / 100`.
    Saturation,
    /// One slider in degrees.
    Hue,
    /// `gamma = 10^(raw / 1000)`, `c = 10^(raw / 100)`.
    Gamma,
    /// `a = raw / 100`, `b = 10^(raw / 100)`, `c = raw / 100`.
    Log,
    /// `a = raw / 100`, `b = raw / 100`, `c = 10^(raw / 100)`.
    Power,
}

impl Adjustment {
    /// All adjustments.
    pub const ALL: [Adjustment; 6] = [
        Self::Lightness,
        Self::Saturation,
        Self::Hue,
        Self::Gamma,
        Self::Log,
        Self::Power,
    ];

    /// Sliders of this adjustment, in parameter order.
    pub fn parameters(self) -> &'static [ParameterInfo] {
        match self {
            Self::Lightness => &LIGHTNESS,
            Self::Saturation => &SATURATION,
            Self::Hue => &HUE,
            Self::Gamma => &GAMMA,
            Self::Log => &LOG,
            Self::Power => &POWER,
        }
    }

    /// Default slider positions.
    pub fn defaults(self) -> Vec<i32> {
        self.parameters().iter().map(|p| p.default).collect()
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lightness => "lightness",
            Self::Saturation => "saturation",
            Self::Hue => "hue",
            Self::Gamma => "gamma",
            Self::Log => "log",
            Self::Power => "power",
        }
    }

    /// Builds the tonal operation for the slider positions `raw`.
    ///
    /// Positions are clamped into each slider's range.
    ///
    /// # Errors
    ///
    /// [`EditError::ParameterCount`] if `raw` has the wrong length.
    pub fn build(self, raw: &[i32]) -> EditResult<ToneOp> {
        let params = self.parameters();
        if raw.len() != params.len() {
            return Err(EditError::ParameterCount {
                adjustment: self.name(),
                expected: params.len(),
                got: raw.len(),
            });
        }
        let v: Vec<f32> = params.iter().zip(raw).map(|(p, &r)| p.value(r)).collect();
        Ok(match self {
            Self::Lightness => ToneOp::Lightness { delta: v[0] },
            Self::Saturation => ToneOp::Saturation { delta: v[0] },
            Self::Hue => ToneOp::Hue { degrees: v[0] },
            Self::Gamma => ToneOp::Gamma { gamma: v[0], c: v[1] },
            Self::Log => ToneOp::Log { a: v[0], b: v[1], c: v[2] },
            Self::Power => ToneOp::Power { a: v[0], b: v[1], c: v[2] },
        })
    }
}

/// A saved adjustment together with its slider positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Adjustment kind.
    pub adjustment: Adjustment,
    /// Slider positions.
    pub raw: Vec<i32>,
}

impl Preset {
    /// Preset holding the adjustment's default positions.
    pub fn defaults(adjustment: Adjustment) -> Self {
        Self {
            adjustment,
            raw: adjustment.defaults(),
        }
    }

    /// Builds the tonal operation.
    pub fn build(&self) -> EditResult<ToneOp> {
        self.adjustment.build(&self.raw)
    }
}
