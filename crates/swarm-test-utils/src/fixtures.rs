//! Deterministic curves and reference integrators.
//!
//! - [`dyadic_curves`]: three curves whose coordinates and velocities are
//!   multiples of 1/32, so every position is exact in `f32` and every wall
//!   is hit exactly.
//! - [`simulate_axis`]: scalar step-by-step reference for one coordinate.
//! - [`triangle_wave`]: closed-form position for exact-landing inputs.

use swarm_curves::{Color, CurveParams, Vec2};

/// Three curves with exact-landing motion against the default wall at 1.0.
///
/// Each start coordinate is a multiple of its velocity magnitude, and the
/// wall is too, so [`triangle_wave`] gives the exact position after any
/// number of frames.
pub fn dyadic_curves() -> [CurveParams; 3] {
    [
        CurveParams::new(
            Vec2::new(0.5, -0.5),
            Vec2::new(0.0, 0.25),
            Vec2::new(-0.75, 1.0),
            Vec2::new(1.0, -1.0),
        )
        .with_motion([
            Vec2::new(0.125, -0.125),
            Vec2::new(-0.25, 0.0625),
            Vec2::new(0.03125, 0.25),
            Vec2::new(0.0625, -0.03125),
        ])
        .with_color(Color::new(0.25, 0.5, 0.75, 1.0)),
        CurveParams::new(
            Vec2::new(-1.0, 0.75),
            Vec2::new(0.5, 0.5),
            Vec2::new(0.25, -0.25),
            Vec2::new(-0.5, 0.0),
        )
        .with_motion([
            Vec2::new(-0.0625, 0.25),
            Vec2::new(0.5, -0.5),
            Vec2::new(-0.125, 0.125),
            Vec2::new(0.25, -0.0625),
        ]),
        CurveParams::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.75, -0.75),
            Vec2::new(-0.25, 0.5),
            Vec2::new(0.125, -0.125),
        )
        .with_motion([
            Vec2::new(0.25, 0.125),
            Vec2::new(-0.03125, 0.0625),
            Vec2::new(0.0625, -0.25),
            Vec2::new(0.125, 0.03125),
        ])
        .with_line_width(0.25),
    ]
}

/// Position and velocity of one coordinate after `steps` frames.
///
/// Per step: flip the velocity if the coordinate is at or beyond either
/// wall, then add it.
pub fn simulate_axis(start: f32, velocity: f32, boundary: f32, steps: usize) -> (f32, f32) {
    let (mut v, mut m) = (start, velocity);
    for _ in 0..steps {
        if v >= boundary || v <= -boundary {
            m = -m;
        }
        v += m;
    }
    (v, m)
}

/// Closed-form position after `steps` frames for exact-landing inputs.
///
/// Valid when `start` lies within `[-boundary, boundary]` and both
/// `boundary - start` and `boundary + start` are whole multiples of
/// `|velocity|`: the path is then a triangle wave of period
/// `4 * boundary / |velocity|` frames. A start on a wall must move
/// outward, since an inward velocity there is flipped on the first frame.
pub fn triangle_wave(start: f32, velocity: f32, boundary: f32, steps: usize) -> f32 {
    let unfolded = start + velocity * steps as f32;
    let period = 4.0 * boundary;
    let phase = (unfolded + boundary).rem_euclid(period);
    if phase <= 2.0 * boundary {
        phase - boundary
    } else {
        3.0 * boundary - phase
    }
}

/// Reference state of a whole curve after `steps` frames.
pub fn simulate_curve(curve: &CurveParams, steps: usize) -> ([Vec2; 4], [Vec2; 4]) {
    let boundary = curve.boundary();
    let mut points = curve.points();
    let mut motion = curve.motion();
    for (p, m) in points.iter_mut().zip(motion.iter_mut()) {
        let (x, mx) = simulate_axis(p.x, m.x, boundary, steps);
        let (y, my) = simulate_axis(p.y, m.y, boundary, steps);
        *p = Vec2::new(x, y);
        *m = Vec2::new(mx, my);
    }
    (points, motion)
}
