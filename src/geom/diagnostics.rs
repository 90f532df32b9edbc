//! Generation diagnostics for the Hopf geometry engine.
//!
//! Every generator returns a [`GeomDiagnostics`] next to its output. Numerical
//! degeneracies that the generators resolve locally (near-pole projections,
//! antiparallel tangent neighbours, collapsed transport frames) are never errors;
//! they are counted here so callers can surface them.
//!
//! # Example
//!
//! ```ignore
//! use hopf_engine::geom::{generate_fibration, GeomDiagnostics};
//!
//! let (fibration, diagnostics) = generate_fibration(&base_points, 130)?;
//! if diagnostics.has_fallbacks() {
//!     log::debug!("fibration: {}", diagnostics.summary());
//! }
//! ```

use std::fmt;

/// Counts and warnings collected while generating a mesh.
///
/// # Topology
///
/// - `vertex_count`: vertices in the produced buffer
/// - `run_count`: polyline runs (fibers) for line output
/// - `triangle_count`: triangles for surface output
///
/// # Numerical fallbacks
///
/// - `pole_fallback_count`: samples projected through the removable-singularity branch
/// - `tangent_fallback_count`: tube rings whose neighbours pointed the same way
/// - `frame_fallback_count`: tube rings whose transported frame collapsed
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomDiagnostics {
    /// Total number of vertices produced.
    pub vertex_count: usize,

    /// Number of index runs (one per fiber). Zero for triangle output.
    pub run_count: usize,

    /// Number of triangles produced. Zero for line output.
    pub triangle_count: usize,

    /// Samples whose `(x, y, z)` part on S3 vanished, so the projection used
    /// its analytic limit instead of the closed-form ratio.
    pub pole_fallback_count: usize,

    /// Tube rings whose tangent fell back to `-towards_left`.
    pub tangent_fallback_count: usize,

    /// Tube rings whose `u` axis could not be transported and was re-projected.
    pub frame_fallback_count: usize,

    /// Optional timing breakdown, only populated with the `metrics` feature on
    /// native targets.
    pub timing: Option<super::metrics::GeomTimingReport>,

    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl GeomDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if any numerical fallback branch was taken.
    #[must_use]
    pub fn has_fallbacks(&self) -> bool {
        self.pole_fallback_count > 0
            || self.tangent_fallback_count > 0
            || self.frame_fallback_count > 0
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns `true` if no fallbacks were needed and nothing was warned about.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.has_fallbacks() && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Sums counts and appends warnings. `timing` is not merged; use a parent
    /// `GeomMetrics` to time several operations together.
    pub fn merge(&mut self, other: &GeomDiagnostics) {
        self.vertex_count += other.vertex_count;
        self.run_count += other.run_count;
        self.triangle_count += other.triangle_count;
        self.pole_fallback_count += other.pole_fallback_count;
        self.tangent_fallback_count += other.tangent_fallback_count;
        self.frame_fallback_count += other.frame_fallback_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Short one-line summary suitable for logging.
    ///
    /// Format: `"V:{vertices} R:{runs} T:{triangles} [fallbacks...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "V:{} R:{} T:{}",
            self.vertex_count, self.run_count, self.triangle_count
        )];

        if self.pole_fallback_count > 0 {
            parts.push(format!("pole:{}", self.pole_fallback_count));
        }
        if self.tangent_fallback_count > 0 {
            parts.push(format!("tangent:{}", self.tangent_fallback_count));
        }
        if self.frame_fallback_count > 0 {
            parts.push(format!("frame:{}", self.frame_fallback_count));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("warnings:{}", self.warnings.len()));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Geometry Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        if self.run_count > 0 {
            writeln!(f, "  Runs: {}", self.run_count)?;
        }
        if self.triangle_count > 0 {
            writeln!(f, "  Triangles: {}", self.triangle_count)?;
        }

        if self.has_fallbacks() {
            writeln!(f, "  Fallbacks:")?;
            if self.pole_fallback_count > 0 {
                writeln!(f, "    - Pole projections: {}", self.pole_fallback_count)?;
            }
            if self.tangent_fallback_count > 0 {
                writeln!(f, "    - Tangent fallbacks: {}", self.tangent_fallback_count)?;
            }
            if self.frame_fallback_count > 0 {
                writeln!(f, "    - Frame fallbacks: {}", self.frame_fallback_count)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_clean() { "CLEAN" } else { "FALLBACKS USED" };
        writeln!(f, "  Status: {status}")?;

        Ok(())
    }
}
