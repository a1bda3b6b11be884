//! 2D vector and analytic-geometry primitives shared by the track builder,
//! physics, and observation code.
//!
//! Everything here is a pure, total function: degenerate inputs (parallel
//! segments, zero-length edges) resolve to "no intersection" or an endpoint
//! rather than an error.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A 2D vector / point in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians (math convention, 0 = +x, CCW positive).
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross).
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Counter-clockwise perpendicular, `(-y, x)`.
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }

    /// Unit vector, or zero when the length is (near) zero.
    pub fn normalize_or_zero(self) -> Vec2 {
        let len = self.length();
        if len > 1e-12 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            ZERO
        }
    }

    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn rotate(self, theta: f64) -> Vec2 {
        let (sin, cos) = theta.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// A line segment between two world points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub const fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn delta(self) -> Vec2 {
        self.b - self.a
    }
}

/// Intersection point of two segments, if they cross.
///
/// Solves the parametric system for `t ∈ [0,1]` on `a1→a2` and `u ∈ [0,1]`
/// on `b1→b2`. Parallel and colinear pairs return `None`.
pub fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.cross(s);
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = b1 - a1;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + r * t)
    } else {
        None
    }
}

/// Result of projecting a point onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    /// Closest point on the polyline.
    pub closest: Vec2,
    /// Euclidean distance from the query point to `closest`.
    pub distance: f64,
    /// Index of the nearest segment (segment `i` joins vertex `i` to `i+1`,
    /// wrapping for closed polylines).
    pub segment: usize,
    /// Parameter along the nearest segment, in `[0, 1]`.
    pub t: f64,
}

/// Projects `p` onto the closed polyline through `points` (vertex `i`
/// connects to `(i + 1) % n`), keeping the minimum-distance segment.
///
/// Zero-length segments project to their start endpoint.
pub fn project_point_to_closed_polyline(p: Vec2, points: &[Vec2]) -> PolylineProjection {
    debug_assert!(points.len() >= 2, "polyline needs at least two vertices");
    let n = points.len();
    let mut best = PolylineProjection {
        closest: points[0],
        distance: f64::INFINITY,
        segment: 0,
        t: 0.0,
    };

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let d = b - a;
        let len2 = d.length_squared();
        let t = if len2 <= 1e-12 {
            0.0
        } else {
            ((p - a).dot(d) / len2).clamp(0.0, 1.0)
        };
        let candidate = a + d * t;
        let distance = p.distance(candidate);
        if distance < best.distance {
            best = PolylineProjection {
                closest: candidate,
                distance,
                segment: i,
                t,
            };
        }
    }

    best
}

/// Signed curvature indicator at a polyline vertex: the cross product of the
/// incoming and outgoing unit tangents. Positive = left turn, negative =
/// right turn, zero = straight. Range `[-1, 1]`.
pub fn signed_curvature(prev: Vec2, curr: Vec2, next: Vec2) -> f64 {
    let incoming = (curr - prev).normalize_or_zero();
    let outgoing = (next - curr).normalize_or_zero();
    incoming.cross(outgoing)
}

/// Maps a signed curvature to `[0, 1]` with `0.5` = straight, for the
/// observation vector.
pub fn curvature_to_unit(curvature: f64) -> f64 {
    0.5 + 0.5 * curvature.clamp(-1.0, 1.0)
}

/// Corners of an oriented rectangle centred at `position`, ordered
/// front-left, front-right, rear-right, rear-left.
pub fn rectangle_corners(position: Vec2, heading: f64, length: f64, width: f64) -> [Vec2; 4] {
    let forward = Vec2::from_angle(heading) * (length * 0.5);
    let side = Vec2::from_angle(heading).perp() * (width * 0.5);
    [
        position + forward + side,
        position + forward - side,
        position - forward - side,
        position - forward + side,
    ]
}

/// Wraps an angle to `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Wrap-aware angle interpolation: always takes the shorter arc, so a lerp
/// across the ±π seam never spins the long way round.
pub fn lerp_angle(from: f64, to: f64, t: f64) -> f64 {
    wrap_angle(from + wrap_angle(to - from) * t)
}
