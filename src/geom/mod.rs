mod config;
mod core;
mod diagnostics;
mod export;
mod fibration;
mod mesh;
mod metrics;
mod sampling;
mod scene;
mod tube;
mod vertex;

pub use config::{
    ConfigChange, DEFAULT_ITERATIONS_PER_FIBER, DEFAULT_NUMBER_OF_FIBERS, HopfConfig,
};
pub use self::core::{Point3, Tolerance, Transform, Vec3};
pub use diagnostics::GeomDiagnostics;
pub use export::{
    DEFAULT_EXPORT_FILE_NAME, ExportError, polyline_obj_string, save_polyline_obj,
    with_obj_extension, write_polyline_obj,
};
pub use fibration::{
    Fibration, FibrationError, S3Point, fiber_angle, generate_fibration, hopf_s3_point,
    project_to_ball,
};
pub use mesh::{
    BufferUpdate, DEFAULT_RESTART_INDEX, DrawMode, INTERLEAVED_STRIDE, Mesh, MeshError,
};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use sampling::{CircleParams, SamplingError, SamplingMode, linear_spacing, sample_base_points};
pub use scene::{HopfScene, SceneError, SceneUpdate};
pub use tube::{RingFrame, TubeError, TubeMesh, TubeOptions, build_tube};
pub use vertex::{Color3, Uv2, Vertex};

#[cfg(test)]
mod tests;
