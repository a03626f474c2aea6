//! Seeded construction of randomised curves.
//!
//! Respects the determinism contract: every random draw comes from a
//! ChaCha8 RNG seeded explicitly, so identical seeds and configs produce
//! identical swarms.

use std::error::Error;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::{Color, Vec2};
use crate::params::CurveParams;

/// Parameters for randomised curve construction.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveConfig {
    /// Half-extent of the square points start in and bounce within.
    /// Default: 1.0 (all of clip space). Must be finite and > 0.
    pub coordinate_range: f32,
    /// Stroke thickness given to every curve. Default: 0.10.
    pub line_width: f32,
    /// Scale applied to the `U(-1, 1)` velocity draws. Default: 0.01.
    pub animation_speed: f32,
}

impl CurveConfig {
    /// Default coordinate range.
    pub const DEFAULT_COORDINATE_RANGE: f32 = 1.0;

    /// Default animation speed.
    pub const DEFAULT_ANIMATION_SPEED: f32 = 0.01;

    /// Validate all parameters.
    pub fn validate(&self) -> Result<(), CurveError> {
        if !self.coordinate_range.is_finite() || self.coordinate_range <= 0.0 {
            return Err(CurveError::InvalidConfig {
                reason: format!(
                    "coordinate_range must be finite and > 0, got {}",
                    self.coordinate_range
                ),
            });
        }
        if !self.line_width.is_finite() || self.line_width < 0.0 {
            return Err(CurveError::InvalidConfig {
                reason: format!(
                    "line_width must be finite and >= 0, got {}",
                    self.line_width
                ),
            });
        }
        if !self.animation_speed.is_finite() || self.animation_speed < 0.0 {
            return Err(CurveError::InvalidConfig {
                reason: format!(
                    "animation_speed must be finite and >= 0, got {}",
                    self.animation_speed
                ),
            });
        }
        Ok(())
    }
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            coordinate_range: Self::DEFAULT_COORDINATE_RANGE,
            line_width: CurveParams::DEFAULT_LINE_WIDTH,
            animation_speed: Self::DEFAULT_ANIMATION_SPEED,
        }
    }
}

/// Errors from curve configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum CurveError {
    /// A [`CurveConfig`] field is out of range.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid curve config: {reason}"),
        }
    }
}

impl Error for CurveError {}

/// Produces randomised [`CurveParams`] from a seeded RNG.
///
/// Coordinates are uniform in `[-range, range)`, RGB channels uniform in
/// `[0, 1)` at 1/1000 resolution with opaque alpha, and each velocity
/// component is `U(-1, 1) * animation_speed`.
#[derive(Clone, Debug)]
pub struct CurveFactory {
    config: CurveConfig,
    rng: ChaCha8Rng,
}

impl CurveFactory {
    /// Create a factory with a validated config and an explicit seed.
    pub fn new(config: CurveConfig, seed: u64) -> Result<Self, CurveError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Draw the next curve.
    pub fn next_curve(&mut self) -> CurveParams {
        let color = Color::new(
            self.rng.random_range(0..1000u32) as f32 / 1000.0,
            self.rng.random_range(0..1000u32) as f32 / 1000.0,
            self.rng.random_range(0..1000u32) as f32 / 1000.0,
            1.0,
        );
        let a = self.random_point();
        let b = self.random_point();
        let p1 = self.random_point();
        let p2 = self.random_point();
        let motion = [
            self.random_velocity(),
            self.random_velocity(),
            self.random_velocity(),
            self.random_velocity(),
        ];

        CurveParams::new(a, b, p1, p2)
            .with_color(color)
            .with_line_width(self.config.line_width)
            .with_boundary(self.config.coordinate_range)
            .with_motion(motion)
            .with_animation_speed(self.config.animation_speed)
    }

    fn random_point(&mut self) -> Vec2 {
        let unit = Vec2::new(
            self.rng.random_range(-1.0f32..1.0),
            self.rng.random_range(-1.0f32..1.0),
        );
        unit * self.config.coordinate_range
    }

    fn random_velocity(&mut self) -> Vec2 {
        let unit = Vec2::new(
            self.rng.random_range(-1.0f32..1.0),
            self.rng.random_range(-1.0f32..1.0),
        );
        unit * self.config.animation_speed
    }
}

impl Iterator for CurveFactory {
    type Item = CurveParams;

    fn next(&mut self) -> Option<CurveParams> {
        Some(self.next_curve())
    }
}
