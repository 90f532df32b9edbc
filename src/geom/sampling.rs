//! Base point sampling on the 2-sphere.
//!
//! Each [`SamplingMode`] produces a deterministic set of [`Vertex`] base points. The
//! fibration generator consumes their positions; their colors propagate to every
//! vertex of the corresponding fiber.

use std::f64::consts::{PI, TAU};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::vertex::Vertex;
use super::{Point3, Tolerance, Transform, Vec3};

/// Latitude limit of the loxodrome, as a fraction of π.
const LOXODROME_LATITUDE_FRACTION: f64 = 0.45;

/// Upper bound on Gaussian redraws for a single random base point.
const MAX_RANDOM_REDRAWS: usize = 64;

/// One latitude circle for [`SamplingMode::GreatCircle`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleParams {
    /// Height of the circle plane, in `(-1, 1)`. The circle radius is `1 - |offset|`.
    pub offset: f64,
    /// Swept angle in radians, in `(0, 2π]`.
    pub arc_angle: f64,
}

impl Default for CircleParams {
    fn default() -> Self {
        Self { offset: 0.0, arc_angle: TAU }
    }
}

/// How base points are distributed over S2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SamplingMode {
    /// Evenly spaced points along one or more circles.
    GreatCircle { circles: Vec<CircleParams> },
    /// Normalized Gaussian draws; the same seed always yields the same points.
    #[serde(rename_all = "camelCase")]
    Random { seed: u64, mean: f64, std_dev: f64 },
    /// A spherical spiral winding `offset` times per radian of latitude.
    Loxodrome { offset: f64 },
}

impl SamplingMode {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GreatCircle { .. } => "great_circle",
            Self::Random { .. } => "random",
            Self::Loxodrome { .. } => "loxodrome",
        }
    }

    /// Number of points [`sample_base_points`] will produce for `number_of_fibers`.
    #[must_use]
    pub fn point_count(&self, number_of_fibers: usize) -> usize {
        match self {
            Self::GreatCircle { circles } => circles.len().saturating_mul(number_of_fibers),
            Self::Random { .. } | Self::Loxodrome { .. } => number_of_fibers,
        }
    }
}

impl Default for SamplingMode {
    fn default() -> Self {
        Self::GreatCircle { circles: vec![CircleParams::default()] }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SamplingError {
    #[error("sampling requires at least 2 fibers, got {0}")]
    TooFewFibers(usize),
    #[error("great circle sampling requires at least one circle")]
    NoCircles,
    #[error("{0} base points exceed the u32 index range")]
    TooManyPoints(usize),
    #[error("invalid sampling parameter: {0}")]
    InvalidParameter(String),
}

/// `steps` evenly spaced values from `lower` to `upper`, both endpoints included.
///
/// A single step yields `[lower]`; zero steps yield an empty vector.
#[must_use]
pub fn linear_spacing(lower: f64, upper: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![lower],
        _ => {
            let step = (upper - lower) / (steps - 1) as f64;
            (0..steps).map(|i| lower + step * i as f64).collect()
        }
    }
}

/// Samples base points under `mode` and applies the rigid `transform` to each.
///
/// Colors are derived from the transformed position; texture coordinates are zero.
pub fn sample_base_points(
    mode: &SamplingMode,
    number_of_fibers: usize,
    transform: Transform,
) -> Result<Vec<Vertex>, SamplingError> {
    if number_of_fibers < 2 {
        return Err(SamplingError::TooFewFibers(number_of_fibers));
    }
    let count = mode.point_count(number_of_fibers);
    if count > u32::MAX as usize {
        return Err(SamplingError::TooManyPoints(count));
    }

    let positions = match mode {
        SamplingMode::GreatCircle { circles } => great_circle_positions(circles, number_of_fibers)?,
        SamplingMode::Random { seed, mean, std_dev } => {
            random_positions(*seed, *mean, *std_dev, number_of_fibers)?
        }
        SamplingMode::Loxodrome { offset } => loxodrome_positions(*offset, number_of_fibers)?,
    };

    Ok(positions
        .into_iter()
        .map(|p| Vertex::colored_by_position(transform.apply_point(p)))
        .collect())
}

fn great_circle_positions(
    circles: &[CircleParams],
    number_of_fibers: usize,
) -> Result<Vec<Point3>, SamplingError> {
    if circles.is_empty() {
        return Err(SamplingError::NoCircles);
    }

    let total = circles
        .len()
        .checked_mul(number_of_fibers)
        .ok_or(SamplingError::TooManyPoints(usize::MAX))?;
    let mut positions = Vec::with_capacity(total);
    for (index, circle) in circles.iter().enumerate() {
        if !circle.offset.is_finite() || circle.offset.abs() >= 1.0 {
            return Err(SamplingError::InvalidParameter(format!(
                "circle {index}: offset {} must lie in (-1, 1)",
                circle.offset
            )));
        }
        if !circle.arc_angle.is_finite() || circle.arc_angle <= 0.0 || circle.arc_angle > TAU + Tolerance::LOOSE.eps {
            return Err(SamplingError::InvalidParameter(format!(
                "circle {index}: arc angle {} must lie in (0, 2π]",
                circle.arc_angle
            )));
        }

        let thetas = if circle.arc_angle >= TAU - Tolerance::LOOSE.eps {
            // Full turn: the closing angle would coincide with the first.
            (0..number_of_fibers)
                .map(|i| TAU * i as f64 / number_of_fibers as f64)
                .collect()
        } else {
            linear_spacing(0.0, circle.arc_angle, number_of_fibers)
        };

        let ring = 1.0 - circle.offset.abs();
        positions.extend(
            thetas
                .into_iter()
                .map(|theta| Point3::new(theta.cos() * ring, theta.sin() * ring, circle.offset)),
        );
    }

    Ok(positions)
}

fn random_positions(
    seed: u64,
    mean: f64,
    std_dev: f64,
    number_of_fibers: usize,
) -> Result<Vec<Point3>, SamplingError> {
    if !mean.is_finite() {
        return Err(SamplingError::InvalidParameter(format!("mean {mean} must be finite")));
    }
    if !std_dev.is_finite() || std_dev <= 0.0 {
        return Err(SamplingError::InvalidParameter(format!(
            "standard deviation {std_dev} must be finite and > 0"
        )));
    }

    let normal = Normal::new(mean, std_dev)
        .map_err(|e| SamplingError::InvalidParameter(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut positions = Vec::with_capacity(number_of_fibers);
    for _ in 0..number_of_fibers {
        let mut drawn = None;
        for _ in 0..MAX_RANDOM_REDRAWS {
            let candidate = Vec3::new(
                normal.sample(&mut rng),
                normal.sample(&mut rng),
                normal.sample(&mut rng),
            );
            if Tolerance::ZERO_LENGTH.is_zero_vec3(candidate) {
                continue;
            }
            if let Some(unit) = candidate.normalized() {
                drawn = Some(unit);
                break;
            }
        }
        let unit = drawn.ok_or_else(|| {
            SamplingError::InvalidParameter(format!(
                "N({mean}, {std_dev}) kept producing zero-length draws"
            ))
        })?;
        positions.push(Point3::from(unit));
    }

    Ok(positions)
}

fn loxodrome_positions(offset: f64, number_of_fibers: usize) -> Result<Vec<Point3>, SamplingError> {
    if !offset.is_finite() {
        return Err(SamplingError::InvalidParameter(format!(
            "loxodrome offset {offset} must be finite"
        )));
    }

    let limit = LOXODROME_LATITUDE_FRACTION * PI;
    Ok(linear_spacing(-limit, limit, number_of_fibers)
        .into_iter()
        .map(|theta| {
            let (s, c) = theta.sin_cos();
            let turn = theta * offset;
            Point3::new(c * turn.cos(), c * turn.sin(), s)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_spacing_includes_both_endpoints() {
        let values = linear_spacing(0.0, 1.0, 5);
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linear_spacing(2.0, 3.0, 1), vec![2.0]);
        assert!(linear_spacing(2.0, 3.0, 0).is_empty());
    }

    #[test]
    fn point_count_matches_mode() {
        let mode = SamplingMode::GreatCircle {
            circles: vec![CircleParams::default(), CircleParams { offset: 0.5, arc_angle: PI }],
        };
        assert_eq!(mode.point_count(10), 20);
        assert_eq!(SamplingMode::Loxodrome { offset: 3.0 }.point_count(10), 10);
    }

    #[test]
    fn oversized_point_count_is_rejected_before_allocation() {
        let circles = SamplingMode::GreatCircle { circles: vec![CircleParams::default(); 3] };
        assert_eq!(
            sample_base_points(&circles, usize::MAX / 2, Transform::identity()),
            Err(SamplingError::TooManyPoints(usize::MAX))
        );

        let random = SamplingMode::Random { seed: 1, mean: 0.0, std_dev: 1.0 };
        assert_eq!(
            sample_base_points(&random, usize::MAX / 4, Transform::identity()),
            Err(SamplingError::TooManyPoints(usize::MAX / 4))
        );
    }

    #[test]
    fn default_mode_is_single_full_circle() {
        let mode = SamplingMode::default();
        assert_eq!(mode.name(), "great_circle");
        assert_eq!(mode.point_count(80), 80);
    }
}
