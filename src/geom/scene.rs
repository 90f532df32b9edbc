//! The regeneration loop tying sampling, fibration and tube generation together.

use std::path::{Path, PathBuf};

use super::config::{ConfigChange, HopfConfig};
use super::diagnostics::GeomDiagnostics;
use super::export::{ExportError, polyline_obj_string, save_polyline_obj};
use super::fibration::{Fibration, FibrationError, generate_fibration};
use super::mesh::{BufferUpdate, DrawMode, Mesh};
use super::metrics::{GeomMetrics, TimingBucket};
use super::sampling::{SamplingError, sample_base_points};
use super::tube::{TubeError, TubeMesh, build_tube};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("sampling failed: {0}")]
    Sampling(#[from] SamplingError),
    #[error("fibration failed: {0}")]
    Fibration(#[from] FibrationError),
    #[error("tube failed: {0}")]
    Tube(#[from] TubeError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("fiber {index} does not exist ({count} fibers)")]
    MissingFiber { index: usize, count: usize },
    #[error("scene has no tube to export")]
    NoTube,
    #[error("{vertex_count} vertices cannot be indexed below restart index {restart}")]
    IndexOverflow { vertex_count: usize, restart: u32 },
}

/// Buffer updates reported by one [`HopfScene::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneUpdate {
    pub change: ConfigChange,
    pub base_points: Option<BufferUpdate>,
    pub fibration: Option<BufferUpdate>,
}

/// Generated geometry for one configuration.
///
/// Regeneration happens synchronously inside [`update`](Self::update). All new
/// geometry is built before any of it is committed, so a failed update leaves the
/// previous meshes untouched.
#[derive(Debug, Clone)]
pub struct HopfScene {
    config: HopfConfig,
    base_points: Mesh,
    fibration: Fibration,
    fibration_mesh: Mesh,
    tube: Option<TubeMesh>,
    /// Diagnostics of the fibration alone, kept across tube-only updates.
    fibration_diagnostics: GeomDiagnostics,
    diagnostics: GeomDiagnostics,
}

impl HopfScene {
    /// Builds every mesh for the sanitized `config`.
    pub fn new(config: HopfConfig) -> Result<Self, SceneError> {
        let config = config.sanitized();
        check_index_range(&config)?;
        let mut metrics = GeomMetrics::default();
        metrics.begin();

        let base = metrics.time(TimingBucket::Sampling, || {
            sample_base_points(&config.sampling, config.number_of_fibers, config.transform())
        })?;
        let (fibration, mut diagnostics) =
            metrics.time(TimingBucket::Fibration, || generate_fibration(&base, config.iterations_per_fiber))?;
        let fibration_mesh = Mesh::from_fibration(&fibration, config.restart_index)?;
        let fibration_diagnostics = diagnostics.clone();
        let tube = build_selected_tube(&config, &fibration, &mut diagnostics, &mut metrics)?;
        diagnostics.timing = metrics.end();

        log::debug!("scene built: {}", diagnostics.summary());

        Ok(Self {
            config,
            base_points: Mesh::points(base),
            fibration,
            fibration_mesh,
            tube,
            fibration_diagnostics,
            diagnostics,
        })
    }

    /// Applies a new configuration, regenerating only what it affects.
    pub fn update(&mut self, config: HopfConfig) -> Result<SceneUpdate, SceneError> {
        let config = config.sanitized();
        let change = ConfigChange::between(&self.config, &config);
        if change.is_empty() {
            return Ok(SceneUpdate::default());
        }
        check_index_range(&config)?;

        let mut metrics = GeomMetrics::default();
        metrics.begin();

        let base = if change.base_points {
            Some(metrics.time(TimingBucket::Sampling, || {
                sample_base_points(&config.sampling, config.number_of_fibers, config.transform())
            })?)
        } else {
            None
        };

        let regenerated = if change.fibration {
            let base_vertices = base.as_deref().unwrap_or(self.base_points.vertices.as_slice());
            let (fibration, diagnostics) = metrics.time(TimingBucket::Fibration, || {
                generate_fibration(base_vertices, config.iterations_per_fiber)
            })?;
            let indices = fibration.flattened_indices(config.restart_index)?;
            Some((fibration, indices, diagnostics))
        } else {
            None
        };

        let fibration_diagnostics = match &regenerated {
            Some((_, _, diagnostics)) => diagnostics.clone(),
            None => self.fibration_diagnostics.clone(),
        };
        let mut diagnostics = fibration_diagnostics.clone();

        let fibration_ref = regenerated.as_ref().map_or(&self.fibration, |(f, _, _)| f);
        // Any non-empty change reaches the tube.
        let tube = build_selected_tube(&config, fibration_ref, &mut diagnostics, &mut metrics)?;
        diagnostics.timing = metrics.end();

        // Commit.
        let mut update = SceneUpdate { change, ..Default::default() };
        if let Some(base) = base {
            update.base_points = Some(self.base_points.set_vertices(base));
        }
        if let Some((fibration, indices, _)) = regenerated {
            update.fibration = Some(
                self.fibration_mesh
                    .replace(fibration.vertices.clone(), indices),
            );
            self.fibration_mesh.restart_index = Some(config.restart_index);
            self.fibration = fibration;
        }
        self.tube = tube;
        self.fibration_diagnostics = fibration_diagnostics;
        self.config = config;
        self.diagnostics = diagnostics;

        log::debug!("scene updated ({change:?}): {}", self.diagnostics.summary());
        Ok(update)
    }

    #[must_use]
    pub fn config(&self) -> &HopfConfig {
        &self.config
    }

    /// Base points as a point cloud.
    #[must_use]
    pub fn base_points(&self) -> &Mesh {
        &self.base_points
    }

    #[must_use]
    pub fn fibration(&self) -> &Fibration {
        &self.fibration
    }

    /// Fibers as line loops separated by the configured restart index.
    #[must_use]
    pub fn fibration_mesh(&self) -> &Mesh {
        &self.fibration_mesh
    }

    #[must_use]
    pub fn tube(&self) -> Option<&TubeMesh> {
        self.tube.as_ref()
    }

    /// Diagnostics of the most recent build or update.
    #[must_use]
    pub fn diagnostics(&self) -> &GeomDiagnostics {
        &self.diagnostics
    }

    /// Fibers as OBJ polyline text.
    pub fn fibration_obj(&self) -> Result<String, SceneError> {
        Ok(polyline_obj_string(&self.fibration_mesh, self.config.restart_index)?)
    }

    /// Writes the fibers to `path` (`.obj` appended if missing).
    pub fn export_fibration(&self, path: impl AsRef<Path>) -> Result<PathBuf, SceneError> {
        timed_export("fibration", || {
            Ok(save_polyline_obj(&self.fibration_mesh, self.config.restart_index, path)?)
        })
    }

    /// Writes the tube's triangle edges as polylines, one per triangle.
    pub fn export_tube(&self, path: impl AsRef<Path>) -> Result<PathBuf, SceneError> {
        let tube = self.tube.as_ref().ok_or(SceneError::NoTube)?;
        timed_export("tube", || {
            let mesh = tube_outline_mesh(tube, self.config.restart_index)?;
            Ok(save_polyline_obj(&mesh, self.config.restart_index, path)?)
        })
    }
}

/// Rejects configurations whose fibration could not be indexed below the restart
/// sentinel, before anything is sampled or allocated.
fn check_index_range(config: &HopfConfig) -> Result<(), SceneError> {
    let vertex_count = config
        .fiber_count()
        .saturating_mul(config.iterations_per_fiber);
    if vertex_count > config.restart_index as usize {
        return Err(SceneError::IndexOverflow {
            vertex_count,
            restart: config.restart_index,
        });
    }
    Ok(())
}

fn timed_export(
    label: &str,
    export: impl FnOnce() -> Result<PathBuf, SceneError>,
) -> Result<PathBuf, SceneError> {
    let mut metrics = GeomMetrics::default();
    metrics.begin();
    let path = metrics.time(TimingBucket::Export, export)?;
    if let Some(report) = metrics.end() {
        log::debug!("{label} export to {} took {} ns", path.display(), report.export_ns);
    }
    Ok(path)
}

/// Tube vertices with every triangle as its own restart-separated run.
fn tube_outline_mesh(tube: &TubeMesh, restart: u32) -> Result<Mesh, SceneError> {
    if tube.vertices.len() > restart as usize {
        return Err(SceneError::IndexOverflow {
            vertex_count: tube.vertices.len(),
            restart,
        });
    }
    let mut indices = Vec::with_capacity(tube.indices.len() / 3 * 4);
    for triangle in tube.indices.chunks_exact(3) {
        indices.extend_from_slice(triangle);
        indices.push(restart);
    }
    Ok(Mesh::new(tube.vertices.clone(), indices, DrawMode::LineLoop).with_restart_index(restart))
}

fn build_selected_tube(
    config: &HopfConfig,
    fibration: &Fibration,
    diagnostics: &mut GeomDiagnostics,
    metrics: &mut GeomMetrics,
) -> Result<Option<TubeMesh>, SceneError> {
    let Some(index) = config.tube_fiber else {
        return Ok(None);
    };
    let path = fibration.fiber_positions(index).ok_or(SceneError::MissingFiber {
        index,
        count: fibration.fiber_count(),
    })?;
    let (tube, tube_diagnostics) = metrics.time(TimingBucket::Tube, || build_tube(&path, config.tube))?;
    diagnostics.merge(&tube_diagnostics);
    Ok(Some(tube))
}
