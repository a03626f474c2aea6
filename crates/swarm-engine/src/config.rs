//! Swarm configuration, validation, and error types.
//!
//! [`SwarmConfig`] is the input to [`CurveSwarm::new`](crate::CurveSwarm::new).
//! [`validate()`](SwarmConfig::validate) checks every nested config before
//! any memory is allocated.

use std::error::Error;
use std::fmt;

use swarm_curves::{CurveConfig, CurveError};
use swarm_storage::{StorageConfig, StorageError};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`SwarmConfig`] or building a swarm.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// `initial_curves` is zero.
    NoCurves,
    /// Curve construction parameters are invalid.
    Curve(CurveError),
    /// Storage configuration is invalid, or the initial block could not be
    /// allocated.
    Storage(StorageError),
    /// `elements_per_instance` is zero.
    ZeroElementsPerInstance,
    /// `elements_per_instance` needs indices beyond the `u16` range.
    TooManyElements {
        /// The configured value.
        configured: u32,
        /// Largest accepted value.
        max: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCurves => write!(f, "initial_curves must be at least 1"),
            Self::Curve(e) => write!(f, "curves: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::ZeroElementsPerInstance => {
                write!(f, "elements_per_instance must be at least 1")
            }
            Self::TooManyElements { configured, max } => {
                write!(
                    f,
                    "elements_per_instance {configured} exceeds maximum of {max}"
                )
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Curve(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CurveError> for ConfigError {
    fn from(e: CurveError) -> Self {
        Self::Curve(e)
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ── SwarmConfig ────────────────────────────────────────────────────

/// Complete configuration for a [`CurveSwarm`](crate::CurveSwarm).
#[derive(Clone, Debug, PartialEq)]
pub struct SwarmConfig {
    /// Number of curves created up front. Default: 2000.
    pub initial_curves: usize,
    /// Randomised curve parameters.
    pub curve: CurveConfig,
    /// RNG seed for curve construction. Default: 0.
    pub seed: u64,
    /// Layout of the backing page-aligned block.
    pub storage: StorageConfig,
    /// Triangles tessellated per curve instance. Default: 200.
    pub elements_per_instance: u32,
}

impl SwarmConfig {
    /// Default number of initial curves.
    pub const DEFAULT_INITIAL_CURVES: usize = 2000;

    /// Default triangles per curve instance.
    pub const DEFAULT_ELEMENTS_PER_INSTANCE: u32 = 200;

    /// Largest `elements_per_instance` whose triangle indices fit in `u16`.
    pub const MAX_ELEMENTS_PER_INSTANCE: u32 = u16::MAX as u32 - 1;

    /// Check all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_curves == 0 {
            return Err(ConfigError::NoCurves);
        }
        self.validate_layout()
    }

    /// Everything except the initial curve count.
    pub(crate) fn validate_layout(&self) -> Result<(), ConfigError> {
        self.curve.validate()?;
        self.storage.validate()?;
        if self.elements_per_instance == 0 {
            return Err(ConfigError::ZeroElementsPerInstance);
        }
        if self.elements_per_instance > Self::MAX_ELEMENTS_PER_INSTANCE {
            return Err(ConfigError::TooManyElements {
                configured: self.elements_per_instance,
                max: Self::MAX_ELEMENTS_PER_INSTANCE,
            });
        }
        Ok(())
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            initial_curves: Self::DEFAULT_INITIAL_CURVES,
            curve: CurveConfig::default(),
            seed: 0,
            storage: StorageConfig::default(),
            elements_per_instance: Self::DEFAULT_ELEMENTS_PER_INSTANCE,
        }
    }
}
