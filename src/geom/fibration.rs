//! Hopf fibers over sampled base points.
//!
//! Every base point `(a, b, c)` on S2 lifts to a great circle on S3. That circle is
//! mapped into the unit ball with a modified stereographic projection whose radius is
//! `acos(w) / π`, so the whole of S3 lands inside the closed unit ball and every fiber
//! stays bounded.

use std::f64::consts::{PI, TAU};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::diagnostics::GeomDiagnostics;
use super::vertex::{Uv2, Vertex};
use super::{Point3, Tolerance};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FibrationError {
    #[error("fibers require at least 3 samples, got {0}")]
    TooFewSamples(usize),
    #[error("fibration requires at least one base point")]
    NoBasePoints,
    #[error("base point {0} is not finite")]
    NonFiniteBasePoint(usize),
    #[error("{vertex_count} vertices cannot be indexed below restart index {restart}")]
    IndexOverflow { vertex_count: usize, restart: u32 },
}

/// A point on the unit 3-sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct S3Point {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl S3Point {
    #[must_use]
    pub fn norm_squared(self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }
}

/// Lifts base point `base` at fiber angle `phi` onto S3.
///
/// `base` is expected to be unit length; it is not re-normalized. The half-angle
/// radicands are clamped at zero so a base point slightly outside the sphere still
/// yields finite coordinates.
#[must_use]
pub fn hopf_s3_point(base: Point3, phi: f64) -> S3Point {
    let theta = (-base.x).atan2(base.y) - phi;
    let alpha = ((1.0 + base.z) * 0.5).max(0.0).sqrt();
    let beta = ((1.0 - base.z) * 0.5).max(0.0).sqrt();
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    S3Point {
        w: alpha * cos_theta,
        x: alpha * sin_theta,
        y: beta * cos_phi,
        z: beta * sin_phi,
    }
}

/// Projects an S3 point into the closed unit ball.
///
/// The radius is `acos(w) / π`, evaluated as `atan2(|(x, y, z)|, w) / π`.
/// Returns the position and whether the removable singularity at `w = ±1` was hit.
/// At `w → 1` the scale tends to `1/π` and the point approaches the origin; at
/// `w = -1` the point lies on the unit sphere in an undefined direction and `+X` is used.
#[must_use]
pub fn project_to_ball(p: S3Point) -> (Point3, bool) {
    let w = p.w.clamp(-1.0, 1.0);
    let spatial = Point3::new(p.x, p.y, p.z);
    let spatial_len = spatial.norm();

    if spatial_len <= Tolerance::ZERO_LENGTH.eps {
        if w > 0.0 {
            let s = 1.0 / PI;
            return (Point3::new(p.x * s, p.y * s, p.z * s), true);
        }
        return (Point3::new(1.0, 0.0, 0.0), true);
    }

    let r = spatial_len.atan2(w) / PI;
    let proj = r / spatial_len;
    (Point3::new(p.x * proj, p.y * proj, p.z * proj), false)
}

/// Fiber angle of sample `j` out of `iterations_per_fiber`, spanning `[0, 2π)`.
#[must_use]
pub fn fiber_angle(j: usize, iterations_per_fiber: usize) -> f64 {
    TAU * j as f64 / iterations_per_fiber as f64
}

/// All fibers of one generation pass, stored in a single vertex buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fibration {
    /// `fiber_count × iterations_per_fiber` vertices, fiber by fiber.
    pub vertices: Vec<Vertex>,
    /// One index run per fiber. Run `i` covers
    /// `[i·iterations_per_fiber, (i+1)·iterations_per_fiber)` in order.
    pub runs: Vec<Vec<u32>>,
    pub iterations_per_fiber: usize,
}

impl Fibration {
    #[must_use]
    pub fn fiber_count(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertices of fiber `index`, or `None` if out of range.
    #[must_use]
    pub fn fiber(&self, index: usize) -> Option<&[Vertex]> {
        if index >= self.fiber_count() {
            return None;
        }
        let start = index * self.iterations_per_fiber;
        self.vertices.get(start..start + self.iterations_per_fiber)
    }

    /// Positions of fiber `index`, suitable as a tube path.
    #[must_use]
    pub fn fiber_positions(&self, index: usize) -> Option<Vec<Point3>> {
        self.fiber(index)
            .map(|fiber| fiber.iter().map(|v| v.position).collect())
    }

    /// Concatenates the runs into one index buffer, each run followed by `restart`.
    ///
    /// Fails if any vertex index would collide with the sentinel.
    pub fn flattened_indices(&self, restart: u32) -> Result<Vec<u32>, FibrationError> {
        if self.vertices.len() > restart as usize {
            return Err(FibrationError::IndexOverflow {
                vertex_count: self.vertices.len(),
                restart,
            });
        }

        let total: usize = self.runs.iter().map(|run| run.len() + 1).sum();
        let mut indices = Vec::with_capacity(total);
        for run in &self.runs {
            indices.extend_from_slice(run);
            indices.push(restart);
        }
        Ok(indices)
    }
}

/// Generates one closed fiber of `iterations_per_fiber` vertices per base point.
///
/// Fiber vertices inherit the base point's color. The returned diagnostics count
/// vertices, runs and any pole fallbacks taken by [`project_to_ball`].
pub fn generate_fibration(
    base_points: &[Vertex],
    iterations_per_fiber: usize,
) -> Result<(Fibration, GeomDiagnostics), FibrationError> {
    if iterations_per_fiber < 3 {
        return Err(FibrationError::TooFewSamples(iterations_per_fiber));
    }
    if base_points.is_empty() {
        return Err(FibrationError::NoBasePoints);
    }
    if let Some(index) = base_points.iter().position(|v| !v.position.is_finite()) {
        return Err(FibrationError::NonFiniteBasePoint(index));
    }

    let vertex_count = base_points
        .len()
        .checked_mul(iterations_per_fiber)
        .filter(|&n| n < u32::MAX as usize)
        .ok_or(FibrationError::IndexOverflow {
            vertex_count: base_points.len().saturating_mul(iterations_per_fiber),
            restart: u32::MAX,
        })?;

    let fibers = build_fibers(base_points, iterations_per_fiber);

    let mut vertices = Vec::with_capacity(vertex_count);
    let mut pole_fallback_count = 0;
    for (fiber, poles) in fibers {
        vertices.extend(fiber);
        pole_fallback_count += poles;
    }

    let runs: Vec<Vec<u32>> = (0..base_points.len())
        .map(|i| {
            let start = (i * iterations_per_fiber) as u32;
            (start..start + iterations_per_fiber as u32).collect()
        })
        .collect();

    let mut diagnostics = GeomDiagnostics {
        vertex_count: vertices.len(),
        run_count: runs.len(),
        pole_fallback_count,
        ..Default::default()
    };
    if pole_fallback_count > 0 {
        diagnostics.add_warning(format!(
            "{pole_fallback_count} samples projected through the pole limit"
        ));
    }

    Ok((
        Fibration {
            vertices,
            runs,
            iterations_per_fiber,
        },
        diagnostics,
    ))
}

#[cfg(feature = "parallel")]
fn build_fibers(base_points: &[Vertex], iterations_per_fiber: usize) -> Vec<(Vec<Vertex>, usize)> {
    base_points
        .par_iter()
        .map(|base| build_fiber(base, iterations_per_fiber))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn build_fibers(base_points: &[Vertex], iterations_per_fiber: usize) -> Vec<(Vec<Vertex>, usize)> {
    base_points
        .iter()
        .map(|base| build_fiber(base, iterations_per_fiber))
        .collect()
}

fn build_fiber(base: &Vertex, iterations_per_fiber: usize) -> (Vec<Vertex>, usize) {
    let mut poles = 0;
    let fiber = (0..iterations_per_fiber)
        .map(|j| {
            let phi = fiber_angle(j, iterations_per_fiber);
            let (position, pole) = project_to_ball(hopf_s3_point(base.position, phi));
            if pole {
                poles += 1;
            }
            Vertex::new(position, base.color, Uv2::ZERO)
        })
        .collect();
    (fiber, poles)
}
