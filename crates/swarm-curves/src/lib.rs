//! Animated Bezier curve instance records.
//!
//! Each [`CurveParams`] is a fixed-layout, `Pod` record describing one
//! cubic Bezier curve (endpoints, control points, width, color) plus the
//! per-point velocities that drive its animation. Records are stored in a
//! page-aligned vector and read by the renderer in place.
//!
//! # Per-frame update
//!
//! [`CurveParams::animate`] is a reflecting-wall integrator: per axis, a
//! velocity flips sign when its point is at or beyond the boundary, then
//! the point moves by the velocity. No randomness is involved after
//! construction; [`CurveFactory`] draws all initial state from a seeded
//! ChaCha8 RNG.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod factory;
pub mod geometry;
pub mod params;

pub use factory::{CurveConfig, CurveError, CurveFactory};
pub use geometry::{Color, Vec2};
pub use params::CurveParams;
