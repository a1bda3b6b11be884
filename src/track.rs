//! Track geometry: centerline, walls, checkpoint gates, breadcrumb chain.
//!
//! Wall offset convention: the per-vertex normal is `perp(tangent) =
//! (-t.y, t.x)`, i.e. the left-hand side of the direction of travel.
//! `inner_wall[i] = center[i] + n_i * half_width` therefore lies to the left
//! of travel and `outer_wall[i]` to the right. For a counter-clockwise
//! circuit the inner wall is the hole of the ring. Tests pin this down.
//!
//! A `Track` is immutable after `build` and may be shared by any number of
//! concurrently running worlds.

use crate::config::SimConfig;
use crate::geometry::{
    self, project_point_to_closed_polyline, signed_curvature, Segment, Vec2,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

pub type TrackId = Uuid;

/// Most gates a track may carry; the per-lap crossing set is a 64-bit mask.
pub const MAX_GATES: usize = 64;

#[derive(Debug, Error)]
pub enum TrackBuildError {
    #[error("track needs at least 3 control points, got {0}")]
    TooFewControlPoints(usize),
    #[error("checkpoint index {index} out of range (track has {count} control points)")]
    CheckpointOutOfRange { index: usize, count: usize },
    #[error("too many checkpoints: {0} (limit {MAX_GATES})")]
    TooManyCheckpoints(usize),
    #[error("finish designation {finish} out of range ({count} checkpoints)")]
    FinishOutOfRange { finish: usize, count: usize },
    #[error("track half width must be positive, got {0}")]
    InvalidHalfWidth(f64),
}

/// A checkpoint line spanning the track from inner to outer wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Endpoint on the inner wall.
    pub left: Vec2,
    /// Endpoint on the outer wall.
    pub right: Vec2,
    pub center: Vec2,
    /// Unit tangent of the centerline in the direction of travel.
    pub direction: Vec2,
    pub is_finish: bool,
}

/// A dense waypoint along the centerline, with its arc-length position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub position: Vec2,
    pub s: f64,
}

/// Immutable track geometry produced by [`build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub center_line: Vec<Vec2>,
    /// Arc length from the start to each centerline vertex.
    pub cumulative_s: Vec<f64>,
    pub inner_wall: Vec<Vec2>,
    pub outer_wall: Vec<Vec2>,
    /// Closed wall polyline edges, inner ring then outer ring (2N total).
    pub wall_segments: Vec<Segment>,
    pub checkpoints: Vec<Gate>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub spawn_position: Vec2,
    pub spawn_heading: f64,
    pub perimeter: f64,
    pub half_width: f64,
}

/// A point projected onto the centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterlineProjection {
    pub closest: Vec2,
    pub distance: f64,
    /// Arc-length position along the track in `[0, perimeter)`.
    pub s: f64,
    /// Nearest centerline segment index.
    pub segment: usize,
    /// Unit tangent of that segment.
    pub tangent: Vec2,
}

impl Track {
    /// Projects a world point onto the centerline polyline.
    pub fn project(&self, p: Vec2) -> CenterlineProjection {
        let proj = project_point_to_closed_polyline(p, &self.center_line);
        let n = self.center_line.len();
        let a = self.center_line[proj.segment];
        let b = self.center_line[(proj.segment + 1) % n];
        let delta = b - a;
        let seg_len = delta.length();
        let s = self.cumulative_s[proj.segment] + seg_len * proj.t;
        CenterlineProjection {
            closest: proj.closest,
            distance: proj.distance,
            s: if s >= self.perimeter { s - self.perimeter } else { s },
            segment: proj.segment,
            tangent: delta.normalize_or_zero(),
        }
    }

    /// Signed wrap-safe arc-length delta from `from_s` to `to_s`, in
    /// `(-perimeter/2, perimeter/2]`. A small forward step across the
    /// start/finish seam comes back small and positive, not `-perimeter`.
    pub fn arc_delta(&self, from_s: f64, to_s: f64) -> f64 {
        let mut d = to_s - from_s;
        let half = self.perimeter * 0.5;
        if d > half {
            d -= self.perimeter;
        } else if d <= -half {
            d += self.perimeter;
        }
        d
    }

    /// Signed curvature at a centerline vertex mapped to `[0, 1]`,
    /// `0.5` = straight.
    pub fn curvature_unit_at(&self, vertex: usize) -> f64 {
        let n = self.center_line.len();
        let i = vertex % n;
        let prev = self.center_line[(i + n - 1) % n];
        let curr = self.center_line[i];
        let next = self.center_line[(i + 1) % n];
        geometry::curvature_to_unit(signed_curvature(prev, curr, next))
    }

    /// Interpolated centerline point at arc-length position `s`, wrapping
    /// modulo the perimeter.
    pub fn point_at(&self, s: f64) -> Vec2 {
        let n = self.center_line.len();
        let s = s.rem_euclid(self.perimeter);
        let i = match self
            .cumulative_s
            .binary_search_by(|c| c.partial_cmp(&s).expect("arc lengths are finite"))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let a = self.center_line[i];
        let b = self.center_line[(i + 1) % n];
        let seg_len = a.distance(b);
        if seg_len < 1e-12 {
            return a;
        }
        let t = ((s - self.cumulative_s[i]) / seg_len).clamp(0.0, 1.0);
        a + (b - a) * t
    }

    /// The finish gate. Construction guarantees exactly one exists.
    pub fn finish_gate_index(&self) -> usize {
        self.checkpoints
            .iter()
            .position(|g| g.is_finish)
            .unwrap_or(0)
    }
}

/// Builds a track from ordered control points forming a closed loop.
///
/// `checkpoint_indices` are centerline vertex indices; `finish` selects
/// which of them carries the finish line. Geometry options come from the
/// configuration record.
pub fn build(
    name: &str,
    id: Option<TrackId>,
    control_points: &[Vec2],
    checkpoint_indices: &[usize],
    finish: usize,
    config: &SimConfig,
) -> Result<Track, TrackBuildError> {
    let n = control_points.len();
    if n < 3 {
        return Err(TrackBuildError::TooFewControlPoints(n));
    }
    if checkpoint_indices.len() > MAX_GATES {
        return Err(TrackBuildError::TooManyCheckpoints(checkpoint_indices.len()));
    }
    if !checkpoint_indices.is_empty() && finish >= checkpoint_indices.len() {
        return Err(TrackBuildError::FinishOutOfRange {
            finish,
            count: checkpoint_indices.len(),
        });
    }
    for &index in checkpoint_indices {
        if index >= n {
            return Err(TrackBuildError::CheckpointOutOfRange { index, count: n });
        }
    }
    let half_width = config.track_half_width;
    if half_width <= 0.0 {
        return Err(TrackBuildError::InvalidHalfWidth(half_width));
    }

    for i in 0..n {
        let next = control_points[(i + 1) % n];
        if control_points[i].distance(next) < 1e-9 {
            warn!(vertex = i, "coincident control points; geometry near this vertex is best-effort");
        }
    }

    // Smoothed tangents: average of the incoming and outgoing unit segment
    // directions, renormalised. Normals keep one handedness throughout.
    let mut tangents = Vec::with_capacity(n);
    for i in 0..n {
        let prev = control_points[(i + n - 1) % n];
        let curr = control_points[i];
        let next = control_points[(i + 1) % n];
        let incoming = (curr - prev).normalize_or_zero();
        let outgoing = (next - curr).normalize_or_zero();
        let mut tangent = (incoming + outgoing).normalize_or_zero();
        if tangent == Vec2::default() {
            // 180-degree fold; fall back to the outgoing direction.
            tangent = outgoing;
        }
        tangents.push(tangent);
    }

    let mut inner_wall = Vec::with_capacity(n);
    let mut outer_wall = Vec::with_capacity(n);
    for i in 0..n {
        let normal = tangents[i].perp();
        inner_wall.push(control_points[i] + normal * half_width);
        outer_wall.push(control_points[i] - normal * half_width);
    }

    // Offsetting by more than the local curvature radius folds a wall back
    // on itself: the offset edge runs against the centerline direction.
    for i in 0..n {
        let j = (i + 1) % n;
        let center_dir = control_points[j] - control_points[i];
        if (inner_wall[j] - inner_wall[i]).dot(center_dir) <= 0.0
            || (outer_wall[j] - outer_wall[i]).dot(center_dir) <= 0.0
        {
            warn!(
                vertex = i,
                half_width,
                "half width exceeds the local curvature radius; wall may self-intersect here"
            );
        }
    }

    let mut wall_segments = Vec::with_capacity(2 * n);
    for i in 0..n {
        wall_segments.push(Segment::new(inner_wall[i], inner_wall[(i + 1) % n]));
    }
    for i in 0..n {
        wall_segments.push(Segment::new(outer_wall[i], outer_wall[(i + 1) % n]));
    }

    let mut cumulative_s = Vec::with_capacity(n);
    let mut perimeter = 0.0;
    for i in 0..n {
        cumulative_s.push(perimeter);
        perimeter += control_points[i].distance(control_points[(i + 1) % n]);
    }

    let checkpoints: Vec<Gate> = checkpoint_indices
        .iter()
        .enumerate()
        .map(|(pos, &index)| Gate {
            left: inner_wall[index],
            right: outer_wall[index],
            center: (inner_wall[index] + outer_wall[index]) * 0.5,
            direction: tangents[index],
            is_finish: pos == finish,
        })
        .collect();

    let breadcrumbs = lay_breadcrumbs(control_points, &cumulative_s, perimeter, config);

    let spawn_position = control_points[0] + tangents[0] * config.spawn_forward_offset;
    let spawn_heading = tangents[0].angle();

    Ok(Track {
        id: id.unwrap_or_else(Uuid::new_v4),
        name: name.to_string(),
        center_line: control_points.to_vec(),
        cumulative_s,
        inner_wall,
        outer_wall,
        wall_segments,
        checkpoints,
        breadcrumbs,
        spawn_position,
        spawn_heading,
        perimeter,
        half_width,
    })
}

/// Walks the closed centerline by arc length, depositing a breadcrumb every
/// `breadcrumb_spacing` units, contracted by `zigzag_multiplier` through
/// tight sections. The chain always starts at `center_line[0]`.
fn lay_breadcrumbs(
    points: &[Vec2],
    cumulative_s: &[f64],
    perimeter: f64,
    config: &SimConfig,
) -> Vec<Breadcrumb> {
    let n = points.len();

    // A segment is tight when the turn angle at either endpoint meets the
    // threshold.
    let mut vertex_tight = vec![false; n];
    for (i, tight) in vertex_tight.iter_mut().enumerate() {
        let prev = points[(i + n - 1) % n];
        let curr = points[i];
        let next = points[(i + 1) % n];
        let incoming = (curr - prev).normalize_or_zero();
        let outgoing = (next - curr).normalize_or_zero();
        let angle = incoming.dot(outgoing).clamp(-1.0, 1.0).acos();
        *tight = angle >= config.tight_angle_threshold;
    }

    let mut crumbs = vec![Breadcrumb {
        position: points[0],
        s: 0.0,
    }];
    let mut next_s = config.breadcrumb_spacing;

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let seg_len = a.distance(b);
        if seg_len < 1e-9 {
            continue;
        }
        let spacing = if vertex_tight[i] || vertex_tight[(i + 1) % n] {
            config.breadcrumb_spacing * config.zigzag_multiplier
        } else {
            config.breadcrumb_spacing
        };
        let seg_start = cumulative_s[i];
        let seg_end = seg_start + seg_len;
        while next_s < seg_end {
            if next_s > perimeter - spacing * 0.5 {
                // Too close to the seam; the chain wraps back to crumb 0.
                return crumbs;
            }
            let t = (next_s - seg_start) / seg_len;
            crumbs.push(Breadcrumb {
                position: a + (b - a) * t,
                s: next_s,
            });
            next_s += spacing;
        }
    }

    crumbs
}

/// A built-in counter-clockwise oval: two long straights joined by
/// half-circle caps. Used by the binary when no track file is given, and by
/// tests that need a real circuit.
pub fn demo_circuit(config: &SimConfig) -> Result<Track, TrackBuildError> {
    const STRAIGHT: f64 = 1600.0;
    const RADIUS: f64 = 500.0;
    const CAP_STEPS: usize = 12;

    let mut points = Vec::new();

    // Bottom straight, left to right.
    let mut x = 0.0;
    while x < STRAIGHT {
        points.push(Vec2::new(x, 0.0));
        x += 200.0;
    }
    // Right cap, sweeping counter-clockwise.
    for i in 0..CAP_STEPS {
        let a = -FRAC_PI_2 + PI * i as f64 / CAP_STEPS as f64;
        points.push(Vec2::new(STRAIGHT + RADIUS * a.cos(), RADIUS + RADIUS * a.sin()));
    }
    // Top straight, right to left.
    let mut x = STRAIGHT;
    while x > 0.0 {
        points.push(Vec2::new(x, 2.0 * RADIUS));
        x -= 200.0;
    }
    // Left cap.
    for i in 0..CAP_STEPS {
        let a = FRAC_PI_2 + PI * i as f64 / CAP_STEPS as f64;
        points.push(Vec2::new(RADIUS * a.cos(), RADIUS + RADIUS * a.sin()));
    }

    // Finish on the bottom straight, then one gate per cap and one on top.
    let checkpoints = [0usize, 14, 24, 34];
    build("Demo Oval", None, &points, &checkpoints, 0, config)
}
