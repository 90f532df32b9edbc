//! Vertex attributes shared by every mesh the engine produces.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color3 {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color3 {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Maps a position in `[-1, 1]^3` into RGB space (`p * 0.5 + 0.5`).
    #[must_use]
    pub fn from_position(p: Point3) -> Self {
        Self::new(p.x * 0.5 + 0.5, p.y * 0.5 + 0.5, p.z * 0.5 + 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Uv2 {
    pub u: f64,
    pub v: f64,
}

impl Uv2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// Position, color and texture coordinate of one mesh vertex.
///
/// Equality and hashing are by value over all three attributes, so vertices can be
/// used as keys when deduplicating.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3,
    pub color: Color3,
    pub uv: Uv2,
}

impl Vertex {
    #[must_use]
    pub const fn new(position: Point3, color: Color3, uv: Uv2) -> Self {
        Self { position, color, uv }
    }

    /// Vertex colored by its own position, with zero texture coordinates.
    #[must_use]
    pub fn colored_by_position(position: Point3) -> Self {
        Self::new(position, Color3::from_position(position), Uv2::ZERO)
    }

    /// Interleaved single-precision layout consumed by renderers:
    /// `[px, py, pz, r, g, b, u, v]`.
    #[must_use]
    pub fn to_interleaved(&self) -> [f32; 8] {
        [
            self.position.x as f32,
            self.position.y as f32,
            self.position.z as f32,
            self.color.r as f32,
            self.color.g as f32,
            self.color.b as f32,
            self.uv.u as f32,
            self.uv.v as f32,
        ]
    }

    fn bit_key(&self) -> [u64; 8] {
        [
            canonical_bits(self.position.x),
            canonical_bits(self.position.y),
            canonical_bits(self.position.z),
            canonical_bits(self.color.r),
            canonical_bits(self.color.g),
            canonical_bits(self.color.b),
            canonical_bits(self.uv.u),
            canonical_bits(self.uv.v),
        ]
    }
}

// NaN attributes break reflexivity; the generators never emit them.
impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bit_key().hash(state);
    }
}

/// `-0.0` and `0.0` compare equal, so they must hash equally too.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}
