use std::f64::consts::{PI, TAU};

use super::fibration::{Fibration, FibrationError};
use super::vertex::{Color3, Uv2, Vertex};
use super::{Point3, Vec3};

/// Primitive restart value used when none is configured.
pub const DEFAULT_RESTART_INDEX: u32 = 65_535;

/// Number of `f32` values per vertex in [`Mesh::interleaved`].
pub const INTERLEAVED_STRIDE: usize = 8;

/// How a renderer should assemble the index (or vertex) stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    #[default]
    Triangles,
}

impl DrawMode {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Lines => "lines",
            Self::LineLoop => "line_loop",
            Self::Triangles => "triangles",
        }
    }
}

/// Outcome of replacing a mesh's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUpdate {
    /// The new data fits the existing allocation and can be written over it.
    InPlace,
    /// The data grew past the existing allocation; the renderer must recreate its buffers.
    Reallocated,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
    #[error("mesh divisions must be at least {min}, got {u}x{v}")]
    InvalidDivisions { u: usize, v: usize, min: usize },
    #[error("mesh dimensions must be finite and > 0")]
    InvalidDimensions,
    #[error("mesh has invalid vertex coordinates (NaN/Inf) at vertex {0}")]
    NonFiniteVertex(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("triangle mesh index count {0} is not a multiple of 3")]
    NotTriangleList(usize),
    #[error("{0} vertices exceed the u32 index range")]
    IndexOverflow(usize),
}

/// Renderer-agnostic vertex and index data.
///
/// An empty index buffer means the vertices are drawn in order. The mesh never holds
/// GPU handles; `set_vertices`/`replace` only report whether a renderer that mirrors
/// these buffers can update them in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub draw_mode: DrawMode,
    /// Sentinel separating index runs, if the index buffer uses primitive restart.
    pub restart_index: Option<u32>,
    vertex_capacity: usize,
    index_capacity: usize,
}

impl Mesh {
    #[must_use]
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, draw_mode: DrawMode) -> Self {
        let vertex_capacity = vertices.len();
        let index_capacity = indices.len();
        Self {
            vertices,
            indices,
            draw_mode,
            restart_index: None,
            vertex_capacity,
            index_capacity,
        }
    }

    /// Unindexed point cloud.
    #[must_use]
    pub fn points(vertices: Vec<Vertex>) -> Self {
        Self::new(vertices, Vec::new(), DrawMode::Points)
    }

    #[must_use]
    pub fn with_restart_index(mut self, restart: u32) -> Self {
        self.restart_index = Some(restart);
        self
    }

    /// One closed line loop per fiber, runs separated by `restart`.
    pub fn from_fibration(fibration: &Fibration, restart: u32) -> Result<Self, FibrationError> {
        let indices = fibration.flattened_indices(restart)?;
        Ok(Self::new(fibration.vertices.clone(), indices, DrawMode::LineLoop).with_restart_index(restart))
    }

    /// UV sphere of `(u_divisions + 1) × (v_divisions + 1)` white vertices.
    ///
    /// `v` runs from the `+Y` pole to the `-Y` pole; `u` wraps around the Y axis with a
    /// duplicated seam column.
    pub fn from_sphere(
        radius: f64,
        center: Point3,
        u_divisions: usize,
        v_divisions: usize,
    ) -> Result<Self, MeshError> {
        if !radius.is_finite() || radius <= 0.0 || !center.is_finite() {
            return Err(MeshError::InvalidDimensions);
        }
        if u_divisions < 3 || v_divisions < 2 {
            return Err(MeshError::InvalidDivisions { u: u_divisions, v: v_divisions, min: 3 });
        }

        let stride = u_divisions + 1;
        let vertex_count = stride * (v_divisions + 1);
        if vertex_count > u32::MAX as usize {
            return Err(MeshError::IndexOverflow(vertex_count));
        }

        let mut vertices = Vec::with_capacity(vertex_count);
        for i in 0..=v_divisions {
            let v = i as f64 / v_divisions as f64;
            let phi = v * PI;
            for j in 0..=u_divisions {
                let u = j as f64 / u_divisions as f64;
                let theta = u * TAU;
                let direction = Vec3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin());
                vertices.push(Vertex::new(
                    center.add_vec(direction.mul_scalar(radius)),
                    Color3::WHITE,
                    Uv2::new(u, v),
                ));
            }
        }

        let mut indices = Vec::with_capacity(u_divisions * v_divisions * 6);
        for i in 0..v_divisions {
            for j in 0..u_divisions {
                let a = (i * stride + j) as u32;
                let b = a + stride as u32;
                indices.extend_from_slice(&[a, b + 1, b]);
                indices.extend_from_slice(&[b + 1, a, a + 1]);
            }
        }

        Ok(Self::new(vertices, indices, DrawMode::Triangles))
    }

    /// Flat grid in the XZ plane spanning `[-width, width] × [-height, height]` around
    /// `center`, with `u_subdivisions × v_subdivisions` vertices.
    pub fn from_grid(
        width: f64,
        height: f64,
        center: Point3,
        u_subdivisions: usize,
        v_subdivisions: usize,
    ) -> Result<Self, MeshError> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 || !center.is_finite() {
            return Err(MeshError::InvalidDimensions);
        }
        if u_subdivisions < 2 || v_subdivisions < 2 {
            return Err(MeshError::InvalidDivisions { u: u_subdivisions, v: v_subdivisions, min: 2 });
        }
        let vertex_count = u_subdivisions * v_subdivisions;
        if vertex_count > u32::MAX as usize {
            return Err(MeshError::IndexOverflow(vertex_count));
        }

        let cols = u_subdivisions;
        let mut vertices = Vec::with_capacity(vertex_count);
        let mut indices = Vec::with_capacity((u_subdivisions - 1) * (v_subdivisions - 1) * 6);

        for row in 0..v_subdivisions {
            for col in 0..cols {
                let u = col as f64 / (u_subdivisions - 1) as f64;
                let v = row as f64 / (v_subdivisions - 1) as f64;
                let position = Point3::new(
                    (u * 2.0 - 1.0) * width + center.x,
                    center.y,
                    (v * 2.0 - 1.0) * height + center.z,
                );
                vertices.push(Vertex::new(position, Color3::WHITE, Uv2::new(u, v)));

                // The last row closes the cells above it.
                if row + 1 == v_subdivisions {
                    continue;
                }
                let cell = (col + cols * row) as u32;
                let below = cols as u32;
                if col + 1 != cols {
                    indices.extend_from_slice(&[cell, cell + below, cell + below + 1]);
                }
                if col != 0 {
                    indices.extend_from_slice(&[cell, cell - 1, cell + below]);
                }
            }
        }

        Ok(Self::new(vertices, indices, DrawMode::Triangles))
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn has_indices(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Number of triangles for `Triangles` meshes, counting unindexed vertices in threes.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        if self.draw_mode != DrawMode::Triangles {
            return 0;
        }
        if self.has_indices() {
            self.indices.len() / 3
        } else {
            self.vertices.len() / 3
        }
    }

    /// Replaces the vertex data, keeping the index buffer.
    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) -> BufferUpdate {
        let update = grow(&mut self.vertex_capacity, vertices.len());
        self.vertices = vertices;
        update
    }

    /// Replaces both buffers. Reallocation is reported if either buffer grew.
    pub fn replace(&mut self, vertices: Vec<Vertex>, indices: Vec<u32>) -> BufferUpdate {
        let vertex_update = grow(&mut self.vertex_capacity, vertices.len());
        let index_update = grow(&mut self.index_capacity, indices.len());
        self.vertices = vertices;
        self.indices = indices;
        if vertex_update == BufferUpdate::Reallocated || index_update == BufferUpdate::Reallocated {
            BufferUpdate::Reallocated
        } else {
            BufferUpdate::InPlace
        }
    }

    /// Interleaved `f32` vertex stream, [`INTERLEAVED_STRIDE`] values per vertex.
    #[must_use]
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertices.len() * INTERLEAVED_STRIDE);
        for vertex in &self.vertices {
            out.extend_from_slice(&vertex.to_interleaved());
        }
        out
    }

    /// Positions as a flat `[x0, y0, z0, x1, ...]` buffer.
    #[must_use]
    pub fn positions_flat(&self) -> Vec<f64> {
        self.vertices
            .iter()
            .flat_map(|v| v.position.to_array())
            .collect()
    }

    /// Splits the index buffer on `restart`, dropping empty runs.
    ///
    /// An unindexed mesh yields a single run over all vertices.
    #[must_use]
    pub fn index_runs(&self, restart: u32) -> Vec<Vec<u32>> {
        if self.indices.is_empty() {
            if self.vertices.is_empty() {
                return Vec::new();
            }
            let count = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
            return vec![(0..count).collect()];
        }
        self.indices
            .split(|&i| i == restart)
            .filter(|run| !run.is_empty())
            .map(<[u32]>::to_vec)
            .collect()
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if let Some(index) = self.vertices.iter().position(|v| !v.position.is_finite()) {
            return Err(MeshError::NonFiniteVertex(index));
        }
        let vertex_count = self.vertices.len();
        for &index in &self.indices {
            if Some(index) == self.restart_index {
                continue;
            }
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange { index, vertex_count });
            }
        }
        let counted = if self.has_indices() { self.indices.len() } else { vertex_count };
        if self.draw_mode == DrawMode::Triangles && self.restart_index.is_none() && counted % 3 != 0 {
            return Err(MeshError::NotTriangleList(counted));
        }
        Ok(())
    }
}

fn grow(capacity: &mut usize, len: usize) -> BufferUpdate {
    if len > *capacity {
        *capacity = len;
        BufferUpdate::Reallocated
    } else {
        BufferUpdate::InPlace
    }
}
