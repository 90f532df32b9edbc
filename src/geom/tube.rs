//! Tube extrusion along a closed path.
//!
//! One ring of `segments` vertices is placed at every path point. Ring frames are
//! carried from one ring to the next by parallel transport, which keeps the tube from
//! twisting along gently curving paths such as Hopf fibers.

use std::f64::consts::TAU;

use super::diagnostics::GeomDiagnostics;
use super::mesh::{DrawMode, Mesh};
use super::vertex::{Color3, Uv2, Vertex};
use super::{Point3, Tolerance, Vec3};

/// Options for tube generation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TubeOptions {
    /// Distance from the path to every ring vertex.
    pub radius: f64,
    /// Number of vertices around each ring.
    pub segments: usize,
    /// Reference direction for the first ring's frame.
    pub up_axis: Vec3,
    /// Stitch the last ring back to the first.
    pub close_seam: bool,
}

impl Default for TubeOptions {
    fn default() -> Self {
        Self {
            radius: 0.2,
            segments: 20,
            up_axis: Vec3::Z,
            close_seam: true,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TubeError {
    #[error("tube path requires at least 3 points, got {0}")]
    PathTooShort(usize),
    #[error("tube path point {0} is not finite")]
    NonFinitePath(usize),
    #[error("tube radius must be finite and > 0")]
    InvalidRadius,
    #[error("tube requires at least 3 segments, got {0}")]
    NotEnoughSegments(usize),
    #[error("tube path has a zero-length segment at point {0}")]
    DegeneratePathSegment(usize),
    #[error("tube with {0} vertices exceeds the u32 index range")]
    IndexOverflow(usize),
}

/// Orthonormal frame of one ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingFrame {
    pub center: Point3,
    pub tangent: Vec3,
    pub u: Vec3,
    pub v: Vec3,
}

/// Triangulated tube surface with its per-ring frames.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub frames: Vec<RingFrame>,
    pub segments: usize,
    pub radius: f64,
}

impl TubeMesh {
    #[must_use]
    pub fn ring_count(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertices of ring `index`.
    #[must_use]
    pub fn ring(&self, index: usize) -> Option<&[Vertex]> {
        let start = index.checked_mul(self.segments)?;
        self.vertices.get(start..start + self.segments)
    }

    /// Indexed triangle mesh sharing ring vertices between neighbouring triangles.
    #[must_use]
    pub fn to_mesh(&self) -> Mesh {
        Mesh::new(self.vertices.clone(), self.indices.clone(), DrawMode::Triangles)
    }

    /// Unindexed triangle list with three vertices per triangle.
    #[must_use]
    pub fn to_triangle_soup(&self) -> Mesh {
        let vertices = self
            .indices
            .iter()
            .map(|&i| self.vertices[i as usize])
            .collect();
        Mesh::new(vertices, Vec::new(), DrawMode::Triangles)
    }
}

/// Extrudes a tube around the closed loop `path`.
///
/// Neighbour indices wrap, so the last point's successor is the first point.
pub fn build_tube(path: &[Point3], options: TubeOptions) -> Result<(TubeMesh, GeomDiagnostics), TubeError> {
    let ring_count = path.len();
    if ring_count < 3 {
        return Err(TubeError::PathTooShort(ring_count));
    }
    if let Some(index) = path.iter().position(|p| !p.is_finite()) {
        return Err(TubeError::NonFinitePath(index));
    }
    if !options.radius.is_finite() || options.radius <= 0.0 {
        return Err(TubeError::InvalidRadius);
    }
    if options.segments < 3 {
        return Err(TubeError::NotEnoughSegments(options.segments));
    }

    let segments = options.segments;
    let vertex_count = ring_count
        .checked_mul(segments)
        .filter(|&n| n <= u32::MAX as usize)
        .ok_or(TubeError::IndexOverflow(ring_count.saturating_mul(segments)))?;

    let mut diagnostics = GeomDiagnostics::new();
    let frames = compute_ring_frames(path, options.up_axis, &mut diagnostics)?;

    // Build vertices.
    let mut vertices = Vec::with_capacity(vertex_count);
    for (ring_idx, frame) in frames.iter().enumerate() {
        let u_param = ring_idx as f64 / ring_count as f64;
        for seg in 0..segments {
            let v_param = seg as f64 / segments as f64;
            let (sin, cos) = (TAU * v_param).sin_cos();
            let position = frame
                .center
                .add_vec(frame.u.mul_scalar(options.radius * cos))
                .add_vec(frame.v.mul_scalar(options.radius * sin));
            vertices.push(Vertex::new(
                position,
                Color3::from_position(position),
                Uv2::new(u_param, v_param),
            ));
        }
    }

    // Build side indices.
    let ring_pairs = if options.close_seam { ring_count } else { ring_count - 1 };
    let mut indices: Vec<u32> = Vec::with_capacity(ring_pairs * segments * 6);
    for ring in 0..ring_pairs {
        let ring_next = (ring + 1) % ring_count;
        for seg in 0..segments {
            let seg_next = (seg + 1) % segments;

            let i0 = (ring * segments + seg) as u32;
            let i1 = (ring_next * segments + seg) as u32;
            let i2 = (ring_next * segments + seg_next) as u32;
            let i3 = (ring * segments + seg_next) as u32;

            indices.extend_from_slice(&[i0, i1, i2]);
            indices.extend_from_slice(&[i0, i2, i3]);
        }
    }

    diagnostics.vertex_count = vertices.len();
    diagnostics.triangle_count = indices.len() / 3;
    if diagnostics.tangent_fallback_count > 0 {
        diagnostics.add_warning(format!(
            "path doubles back at {} points",
            diagnostics.tangent_fallback_count
        ));
    }

    Ok((
        TubeMesh {
            vertices,
            indices,
            frames,
            segments,
            radius: options.radius,
        },
        diagnostics,
    ))
}

fn compute_ring_frames(
    path: &[Point3],
    up_axis: Vec3,
    diagnostics: &mut GeomDiagnostics,
) -> Result<Vec<RingFrame>, TubeError> {
    let n = path.len();
    let mut frames: Vec<RingFrame> = Vec::with_capacity(n);

    for i in 0..n {
        let center = path[i];
        let prev = path[(i + n - 1) % n];
        let next = path[(i + 1) % n];

        let towards_l = prev
            .sub_point(center)
            .normalized()
            .ok_or(TubeError::DegeneratePathSegment(i))?;
        let towards_r = next
            .sub_point(center)
            .normalized()
            .ok_or(TubeError::DegeneratePathSegment(i))?;

        let difference = towards_r - towards_l;
        let tangent = match difference.normalized() {
            Some(t) if !Tolerance::ZERO_LENGTH.is_zero_vec3(difference) => t,
            _ => {
                diagnostics.tangent_fallback_count += 1;
                -towards_l
            }
        };

        let u = match frames.last() {
            None => {
                let (u, fell_back) = initial_u(up_axis, tangent);
                if fell_back {
                    diagnostics.frame_fallback_count += 1;
                }
                u
            }
            Some(prev_frame) => match transported_u(tangent, prev_frame.v) {
                Some(u) => u,
                None => {
                    diagnostics.frame_fallback_count += 1;
                    reproject_u(prev_frame.u, tangent)
                        .unwrap_or_else(|| initial_u(up_axis, tangent).0)
                }
            },
        };

        let v = u.cross(tangent).normalized().unwrap_or_else(|| tangent.cross(u));
        frames.push(RingFrame { center, tangent, u, v });
    }

    Ok(frames)
}

fn non_degenerate(v: Vec3) -> Option<Vec3> {
    if Tolerance::ZERO_LENGTH.is_zero_vec3(v) {
        None
    } else {
        v.normalized()
    }
}

fn transported_u(tangent: Vec3, v_prev: Vec3) -> Option<Vec3> {
    non_degenerate(tangent.cross(v_prev))
}

fn reproject_u(u_prev: Vec3, tangent: Vec3) -> Option<Vec3> {
    non_degenerate(u_prev - tangent.mul_scalar(u_prev.dot(tangent)))
}

/// First-ring `u` axis from `up × t`, trying `+X` then `+Y` when `up` is parallel to `t`.
fn initial_u(up_axis: Vec3, tangent: Vec3) -> (Vec3, bool) {
    if let Some(u) = non_degenerate(up_axis.cross(tangent)) {
        return (u, false);
    }
    let u = non_degenerate(Vec3::X.cross(tangent))
        .or_else(|| non_degenerate(Vec3::Y.cross(tangent)))
        .unwrap_or(Vec3::X);
    (u, true)
}
