//! Scene configuration.
//!
//! `HopfConfig` is an immutable snapshot of every tunable parameter. It crosses the
//! JS boundary as a plain object (camelCase keys) and is clamped into range by
//! [`HopfConfig::sanitized`] before any geometry is generated.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::mesh::DEFAULT_RESTART_INDEX;
use super::sampling::{CircleParams, SamplingMode};
use super::tube::TubeOptions;
use super::Transform;

pub const DEFAULT_NUMBER_OF_FIBERS: usize = 80;
pub const DEFAULT_ITERATIONS_PER_FIBER: usize = 130;

/// Smallest distance kept between a circle offset and the poles.
const OFFSET_MARGIN: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HopfConfig {
    pub sampling: SamplingMode,
    pub number_of_fibers: usize,
    /// Rotation about X, Y and Z in degrees, applied to the base points.
    pub rotation: [f64; 3],
    pub iterations_per_fiber: usize,
    pub tube: TubeOptions,
    pub restart_index: u32,
    /// Fiber to extrude into a tube, if any.
    pub tube_fiber: Option<usize>,
}

impl Default for HopfConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingMode::default(),
            number_of_fibers: DEFAULT_NUMBER_OF_FIBERS,
            rotation: [0.0; 3],
            iterations_per_fiber: DEFAULT_ITERATIONS_PER_FIBER,
            tube: TubeOptions::default(),
            restart_index: DEFAULT_RESTART_INDEX,
            tube_fiber: None,
        }
    }
}

impl HopfConfig {
    /// Rigid transform applied to sampled base points.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::from_euler_degrees(self.rotation)
    }

    /// Number of base points (and therefore fibers) this configuration produces.
    #[must_use]
    pub fn fiber_count(&self) -> usize {
        self.sampling.point_count(self.number_of_fibers)
    }

    /// Copy with every parameter clamped to its nearest valid value.
    ///
    /// Each adjustment is logged with `log::warn!`.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        if config.number_of_fibers < 2 {
            log::warn!("number_of_fibers {} raised to 2", config.number_of_fibers);
            config.number_of_fibers = 2;
        }
        if config.iterations_per_fiber < 3 {
            log::warn!("iterations_per_fiber {} raised to 3", config.iterations_per_fiber);
            config.iterations_per_fiber = 3;
        }
        for (axis, angle) in ["x", "y", "z"].iter().zip(config.rotation.iter_mut()) {
            if !angle.is_finite() {
                log::warn!("rotation {axis} {angle} reset to 0");
                *angle = 0.0;
            }
        }

        config.sampling = sanitize_sampling(config.sampling);
        config.tube = sanitize_tube(config.tube);

        if let Some(index) = config.tube_fiber {
            let count = config.fiber_count();
            if index >= count {
                log::warn!("tube_fiber {index} out of range for {count} fibers, tube disabled");
                config.tube_fiber = None;
            }
        }

        config
    }
}

fn sanitize_sampling(mode: SamplingMode) -> SamplingMode {
    match mode {
        SamplingMode::GreatCircle { circles } => {
            if circles.is_empty() {
                log::warn!("great circle sampling without circles, using one full circle");
                return SamplingMode::default();
            }
            let circles = circles
                .into_iter()
                .map(|circle| {
                    let mut circle = circle;
                    let limit = 1.0 - OFFSET_MARGIN;
                    if !circle.offset.is_finite() {
                        log::warn!("circle offset {} reset to 0", circle.offset);
                        circle.offset = 0.0;
                    } else if circle.offset.abs() > limit {
                        let clamped = circle.offset.clamp(-limit, limit);
                        log::warn!("circle offset {} clamped to {clamped}", circle.offset);
                        circle.offset = clamped;
                    }
                    if !circle.arc_angle.is_finite() || circle.arc_angle > TAU {
                        log::warn!("circle arc angle {} clamped to 2π", circle.arc_angle);
                        circle.arc_angle = TAU;
                    } else if circle.arc_angle <= 0.0 {
                        log::warn!("circle arc angle {} reset to a full turn", circle.arc_angle);
                        circle.arc_angle = CircleParams::default().arc_angle;
                    }
                    circle
                })
                .collect();
            SamplingMode::GreatCircle { circles }
        }
        SamplingMode::Random { seed, mean, std_dev } => {
            let mean = if mean.is_finite() {
                mean
            } else {
                log::warn!("random mean {mean} reset to 0");
                0.0
            };
            let std_dev = if std_dev.is_finite() && std_dev > 0.0 {
                std_dev
            } else {
                log::warn!("random std_dev {std_dev} reset to 1");
                1.0
            };
            SamplingMode::Random { seed, mean, std_dev }
        }
        SamplingMode::Loxodrome { offset } => {
            if offset.is_finite() {
                SamplingMode::Loxodrome { offset }
            } else {
                log::warn!("loxodrome offset {offset} reset to 0");
                SamplingMode::Loxodrome { offset: 0.0 }
            }
        }
    }
}

fn sanitize_tube(options: TubeOptions) -> TubeOptions {
    let defaults = TubeOptions::default();
    let mut options = options;
    if !options.radius.is_finite() || options.radius <= 0.0 {
        log::warn!("tube radius {} reset to {}", options.radius, defaults.radius);
        options.radius = defaults.radius;
    }
    if options.segments < 3 {
        log::warn!("tube segments {} raised to 3", options.segments);
        options.segments = 3;
    }
    if !options.up_axis.is_finite() || options.up_axis.normalized().is_none() {
        log::warn!("tube up axis {:?} reset to +Z", options.up_axis);
        options.up_axis = defaults.up_axis;
    }
    options
}

/// What has to be regenerated when moving from one configuration to another.
///
/// Flags cascade: new base points imply a new fibration, which implies a new tube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigChange {
    pub base_points: bool,
    pub fibration: bool,
    pub tube: bool,
}

impl ConfigChange {
    /// Everything changed; used for the first build.
    pub const ALL: Self = Self { base_points: true, fibration: true, tube: true };

    #[must_use]
    pub fn between(old: &HopfConfig, new: &HopfConfig) -> Self {
        let base_points = old.sampling != new.sampling
            || old.number_of_fibers != new.number_of_fibers
            || old.rotation != new.rotation;
        let fibration = base_points
            || old.iterations_per_fiber != new.iterations_per_fiber
            || old.restart_index != new.restart_index;
        let tube = fibration || old.tube != new.tube || old.tube_fiber != new.tube_fiber;
        Self { base_points, fibration, tube }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.base_points && !self.fibration && !self.tube
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer() {
        let config = HopfConfig::default();
        assert_eq!(config.number_of_fibers, 80);
        assert_eq!(config.iterations_per_fiber, 130);
        assert_eq!(config.restart_index, 65_535);
        assert_eq!(config.tube.segments, 20);
        assert_eq!(config.fiber_count(), 80);
        assert_eq!(config.transform(), Transform::identity());
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let config = HopfConfig {
            number_of_fibers: 0,
            iterations_per_fiber: 1,
            rotation: [f64::NAN, 10.0, 0.0],
            sampling: SamplingMode::GreatCircle {
                circles: vec![CircleParams { offset: 1.5, arc_angle: 10.0 }],
            },
            tube: TubeOptions { radius: -1.0, segments: 0, ..Default::default() },
            tube_fiber: Some(99),
            ..Default::default()
        }
        .sanitized();

        assert_eq!(config.number_of_fibers, 2);
        assert_eq!(config.iterations_per_fiber, 3);
        assert_eq!(config.rotation, [0.0, 10.0, 0.0]);
        let SamplingMode::GreatCircle { circles } = &config.sampling else {
            panic!("sampling mode changed");
        };
        assert!(circles[0].offset < 1.0);
        assert_eq!(circles[0].arc_angle, TAU);
        assert_eq!(config.tube.radius, 0.2);
        assert_eq!(config.tube.segments, 3);
        assert_eq!(config.tube_fiber, None);
    }

    #[test]
    fn sanitized_keeps_valid_config() {
        let config = HopfConfig {
            sampling: SamplingMode::Random { seed: 3, mean: 0.0, std_dev: 2.0 },
            tube_fiber: Some(5),
            ..Default::default()
        };
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn change_flags_cascade() {
        let old = HopfConfig::default();

        let rotated = HopfConfig { rotation: [0.0, 45.0, 0.0], ..old.clone() };
        assert_eq!(ConfigChange::between(&old, &rotated), ConfigChange::ALL);

        let finer = HopfConfig { iterations_per_fiber: 200, ..old.clone() };
        let change = ConfigChange::between(&old, &finer);
        assert!(!change.base_points && change.fibration && change.tube);

        let tube_only = HopfConfig { tube_fiber: Some(1), ..old.clone() };
        let change = ConfigChange::between(&old, &tube_only);
        assert!(!change.base_points && !change.fibration && change.tube);

        assert!(ConfigChange::between(&old, &old).is_empty());
    }
}
