//! Overlay tuning.
//!
//! Every knob has a compile-time default; [`FlowConfig`] lets a host override
//! them (for example to feed a live wind reading) without touching the core.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

pub const AGENT_COUNT: usize = 600;
/// Degrees per tick at speed 1.0: a steady south-easterly drift.
pub const WIND: WindVector = WindVector::new(-0.00004, 0.00006);
pub const TRAIL_CAPACITY: usize = 10;
pub const MIN_AGE_TICKS: u32 = 100;
pub const MAX_AGE_TICKS: u32 = 250;
pub const MIN_SPEED: f64 = 0.2;
pub const MAX_SPEED: f64 = 0.7;
pub const PAD_RATIO: f64 = 0.4;
pub const FADE_IN: f64 = 0.2;
pub const FADE_OUT: f64 = 0.8;
pub const BASE_ALPHA: f64 = 0.8;
pub const LINE_WIDTH_PX: f64 = 2.5;
pub const TAIL_COLOR: Rgba = Rgba::rgb(59, 130, 246);
pub const HEAD_COLOR: Rgba = Rgba::rgb(96, 165, 250);
/// Used when neither the config nor the host provides a seed.
pub const DEFAULT_SEED: u64 = 0x5EED_F10E_0BAD_CAFE;

/// Per-tick geographic displacement at speed 1.0, in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindVector {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

impl WindVector {
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Direction of travel in degrees clockwise from north, measured in
    /// degree space. `None` for a calm (zero) vector.
    pub fn heading_deg(&self) -> Option<f64> {
        if self.lat_deg == 0.0 && self.lon_deg == 0.0 {
            return None;
        }
        Some(self.lon_deg.atan2(self.lat_deg).to_degrees().rem_euclid(360.0))
    }

    /// 16-point compass label for [`WindVector::heading_deg`].
    pub fn compass_point(&self) -> Option<&'static str> {
        let heading = self.heading_deg()?;
        let idx = (heading / 22.5).round() as usize % COMPASS_POINTS.len();
        Some(COMPASS_POINTS[idx])
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite()
    }
}

/// Straight (non-premultiplied) sRGB colour with float alpha.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// CSS `rgba(...)` string for canvas styles.
    pub fn css(&self) -> String {
        let a = self.a.clamp(0.0, 1.0);
        format!("rgba({},{},{},{a})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailStyle {
    /// Colour at the oldest trail point; always drawn fully transparent.
    pub tail_color: Rgba,
    /// Colour at the newest trail point; alpha comes from the life envelope.
    pub head_color: Rgba,
    pub line_width: f64,
}

impl Default for TrailStyle {
    fn default() -> Self {
        Self {
            tail_color: TAIL_COLOR,
            head_color: HEAD_COLOR,
            line_width: LINE_WIDTH_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub agent_count: usize,
    pub wind: WindVector,
    pub trail_capacity: usize,
    pub min_age: u32,
    pub max_age: u32,
    pub min_speed: f64,
    pub max_speed: f64,
    pub pad_ratio: f64,
    /// Life fraction below which trails fade in.
    pub fade_in: f64,
    /// Life fraction above which trails fade out.
    pub fade_out: f64,
    pub base_alpha: f64,
    pub style: TrailStyle,
    pub seed: Option<u64>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            agent_count: AGENT_COUNT,
            wind: WIND,
            trail_capacity: TRAIL_CAPACITY,
            min_age: MIN_AGE_TICKS,
            max_age: MAX_AGE_TICKS,
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            pad_ratio: PAD_RATIO,
            fade_in: FADE_IN,
            fade_out: FADE_OUT,
            base_alpha: BASE_ALPHA,
            style: TrailStyle::default(),
            seed: None,
        }
    }
}

impl FlowConfig {
    pub fn from_json_str(text: &str) -> Result<Self, FlowError> {
        let cfg: FlowConfig =
            serde_json::from_str(text).map_err(|e| FlowError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> Result<String, FlowError> {
        serde_json::to_string_pretty(self).map_err(|e| FlowError::Config(e.to_string()))
    }

    pub fn seed_or_default(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        fn invalid(msg: impl Into<String>) -> Result<(), FlowError> {
            Err(FlowError::InvalidConfig(msg.into()))
        }

        if self.agent_count == 0 {
            return invalid("agent_count must be at least 1");
        }
        if self.trail_capacity == 0 {
            return invalid("trail_capacity must be at least 1");
        }
        if self.min_age == 0 || self.min_age > self.max_age {
            return invalid(format!(
                "age range must satisfy 1 <= min_age <= max_age (got {}..={})",
                self.min_age, self.max_age
            ));
        }
        if !(self.min_speed.is_finite() && self.max_speed.is_finite())
            || self.min_speed < 0.0
            || self.min_speed > self.max_speed
        {
            return invalid(format!(
                "speed range must satisfy 0 <= min_speed <= max_speed (got {}..{})",
                self.min_speed, self.max_speed
            ));
        }
        if !self.wind.is_finite() {
            return invalid("wind must be finite");
        }
        if !self.pad_ratio.is_finite() || self.pad_ratio < 0.0 {
            return invalid("pad_ratio must be a non-negative number");
        }
        if !(0.0 < self.fade_in && self.fade_in < self.fade_out && self.fade_out < 1.0) {
            return invalid("fade thresholds must satisfy 0 < fade_in < fade_out < 1");
        }
        if !(0.0..=1.0).contains(&self.base_alpha) {
            return invalid("base_alpha must be within [0, 1]");
        }
        if !self.style.line_width.is_finite() || self.style.line_width <= 0.0 {
            return invalid("style.line_width must be positive");
        }
        Ok(())
    }
}
