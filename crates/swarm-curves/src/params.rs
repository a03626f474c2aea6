//! Per-curve instance record and its reflecting integrator.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::geometry::{Color, Vec2};

/// One moving cubic Bezier curve, laid out for direct GPU consumption.
///
/// Instance layout (112 bytes):
///
/// ```text
///  offset   0  a, b, p1, p2     4 × Vec2   endpoints and control points
///  offset  32  line_width       f32
///  offset  36  _pad0            [f32; 3]   color starts on a 16-byte boundary
///  offset  48  color            Color
///  offset  64  motion           4 × Vec2   per-point velocity
///  offset  96  animation_speed  f32
///  offset 100  boundary         f32        reflection wall, |v| >= boundary flips
///  offset 104  _pad1            [f32; 2]
/// ```
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CurveParams {
    /// First endpoint.
    pub a: Vec2,
    /// Second endpoint.
    pub b: Vec2,
    /// First control point.
    pub p1: Vec2,
    /// Second control point.
    pub p2: Vec2,
    /// Stroke thickness, fixed per instance.
    pub line_width: f32,
    _pad0: [f32; 3],
    /// Stroke color, fixed per instance.
    pub color: Color,
    motion: [Vec2; 4],
    animation_speed: f32,
    boundary: f32,
    _pad1: [f32; 2],
}

const _: () = {
    assert!(size_of::<CurveParams>() == 112);
    assert!(size_of::<CurveParams>() % 16 == 0);
    assert!(offset_of!(CurveParams, line_width) == 32);
    assert!(offset_of!(CurveParams, color) == 48);
    assert!(offset_of!(CurveParams, motion) == 64);
    assert!(offset_of!(CurveParams, boundary) == 100);
};

impl CurveParams {
    /// Default stroke thickness.
    pub const DEFAULT_LINE_WIDTH: f32 = 0.10;

    /// Default reflection boundary (the full [-1, 1] clip space).
    pub const DEFAULT_BOUNDARY: f32 = 1.0;

    /// A stationary white curve with the given geometry.
    pub fn new(a: Vec2, b: Vec2, p1: Vec2, p2: Vec2) -> Self {
        Self {
            a,
            b,
            p1,
            p2,
            line_width: Self::DEFAULT_LINE_WIDTH,
            _pad0: [0.0; 3],
            color: Color::white(),
            motion: [Vec2::zero(); 4],
            animation_speed: 0.0,
            boundary: Self::DEFAULT_BOUNDARY,
            _pad1: [0.0; 2],
        }
    }

    /// Set the per-point velocities, in `a, b, p1, p2` order.
    pub fn with_motion(mut self, motion: [Vec2; 4]) -> Self {
        self.motion = motion;
        self
    }

    /// Set the stroke color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the stroke thickness.
    pub fn with_line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width;
        self
    }

    /// Set the reflection boundary magnitude.
    pub fn with_boundary(mut self, boundary: f32) -> Self {
        self.boundary = boundary;
        self
    }

    pub(crate) fn with_animation_speed(mut self, animation_speed: f32) -> Self {
        self.animation_speed = animation_speed;
        self
    }

    /// The four tracked points in `a, b, p1, p2` order.
    pub fn points(&self) -> [Vec2; 4] {
        [self.a, self.b, self.p1, self.p2]
    }

    /// The four velocities in `a, b, p1, p2` order.
    pub fn motion(&self) -> [Vec2; 4] {
        self.motion
    }

    /// Speed factor the velocities were drawn with.
    pub fn animation_speed(&self) -> f32 {
        self.animation_speed
    }

    /// Reflection boundary magnitude.
    pub fn boundary(&self) -> f32 {
        self.boundary
    }

    /// Advance one frame.
    ///
    /// Per point and per axis: if the coordinate is at or beyond the
    /// boundary (either side) the velocity component flips sign, then the
    /// velocity is added. Points may overshoot the boundary by up to one
    /// step before turning back; positions are never clamped.
    pub fn animate(&mut self) {
        let boundary = self.boundary;
        let [ma, mb, m1, m2] = &mut self.motion;
        self.a = step_point(self.a, ma, boundary);
        self.b = step_point(self.b, mb, boundary);
        self.p1 = step_point(self.p1, m1, boundary);
        self.p2 = step_point(self.p2, m2, boundary);
    }
}

fn step_point(v: Vec2, m: &mut Vec2, boundary: f32) -> Vec2 {
    if v.x >= boundary || v.x <= -boundary {
        m.x = -m.x;
    }
    if v.y >= boundary || v.y <= -boundary {
        m.y = -m.y;
    }
    v + *m
}
