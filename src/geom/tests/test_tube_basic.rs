use std::f64::consts::TAU;

use crate::geom::{
    Point3, RingFrame, SamplingMode, Transform, TubeError, TubeOptions, Vec3, build_tube, generate_fibration,
    sample_base_points,
};

/// Transport never rotates `u` further than the tangent turned between two rings.
fn assert_frames_turn_with_tangent(frames: &[RingFrame]) {
    for (i, pair) in frames.windows(2).enumerate() {
        let tangent_turn = pair[0].tangent.dot(pair[1].tangent);
        let u_turn = pair[0].u.dot(pair[1].u);
        assert!(tangent_turn > 0.0, "ring {i}: tangent reversed");
        assert!(
            u_turn >= tangent_turn - 1e-9,
            "ring {i}: u turned by {u_turn}, tangent by {tangent_turn}"
        );
    }
}

fn planar_circle(radius: f64, count: usize) -> Vec<Point3> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect()
}

#[test]
fn circle_tube_has_exact_radius_and_orthonormal_frames() {
    let path = planar_circle(2.0, 32);
    let options = TubeOptions { radius: 0.3, segments: 12, ..Default::default() };
    let (tube, diagnostics) = build_tube(&path, options).expect("tube");

    assert_eq!(tube.vertices.len(), 32 * 12);
    assert_eq!(tube.ring_count(), 32);
    assert_eq!(diagnostics.vertex_count, 32 * 12);
    assert!(diagnostics.is_clean(), "{diagnostics}");

    for (ring_idx, frame) in tube.frames.iter().enumerate() {
        assert!((frame.tangent.length() - 1.0).abs() < 1e-9);
        assert!((frame.u.length() - 1.0).abs() < 1e-9);
        assert!((frame.v.length() - 1.0).abs() < 1e-9);
        assert!(frame.u.dot(frame.v).abs() < 1e-9);
        assert!(frame.u.dot(frame.tangent).abs() < 1e-9);
        assert!(frame.v.dot(frame.tangent).abs() < 1e-9);

        for vertex in tube.ring(ring_idx).expect("ring") {
            let distance = vertex.position.distance_to(frame.center);
            assert!((distance - 0.3).abs() < 1e-9, "ring {ring_idx}: {distance}");
        }
    }
    assert_frames_turn_with_tangent(&tube.frames);
}

#[test]
fn closed_and_open_seams_triangle_counts() {
    let path = planar_circle(1.0, 10);

    let (closed, diagnostics) = build_tube(&path, TubeOptions { segments: 8, ..Default::default() }).expect("tube");
    assert_eq!(closed.triangle_count(), 10 * 8 * 2);
    assert_eq!(diagnostics.triangle_count, 10 * 8 * 2);

    let open_options = TubeOptions { segments: 8, close_seam: false, ..Default::default() };
    let (open, _) = build_tube(&path, open_options).expect("tube");
    assert_eq!(open.triangle_count(), 9 * 8 * 2);

    let mesh = closed.to_mesh();
    mesh.validate().expect("valid tube mesh");
    assert!(closed.indices.iter().all(|&i| (i as usize) < closed.vertices.len()));
}

#[test]
fn first_triangles_follow_ring_winding() {
    let (tube, _) = build_tube(&planar_circle(1.0, 4), TubeOptions { segments: 5, ..Default::default() }).expect("tube");
    // (i, j) -> (i+1, j) -> (i+1, j+1), then (i, j) -> (i+1, j+1) -> (i, j+1).
    assert_eq!(&tube.indices[..6], &[0, 5, 6, 0, 6, 1]);
    // Seam wraps the last local index back to zero.
    assert_eq!(&tube.indices[24..30], &[4, 9, 5, 4, 5, 0]);
}

#[test]
fn straight_path_transport_does_not_flip() {
    let path: Vec<Point3> = (0..6).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
    let (tube, diagnostics) = build_tube(&path, TubeOptions::default()).expect("tube");

    // Both ends see their neighbours on the same side.
    assert_eq!(diagnostics.tangent_fallback_count, 2);
    assert!(!diagnostics.warnings.is_empty());

    for pair in tube.frames[1..].windows(2) {
        assert!(pair[0].u.dot(pair[1].u) > 0.999);
    }
    for pair in tube.frames.windows(2) {
        assert!(pair[0].v.dot(pair[1].v) > 0.999);
    }
}

#[test]
fn tangent_parallel_to_up_axis_uses_fallback_axis() {
    let path = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let options = TubeOptions { up_axis: Vec3::Z, ..Default::default() };
    let (tube, diagnostics) = build_tube(&path, options).expect("tube");

    let first = tube.frames[0];
    assert!((first.tangent.dot(Vec3::Z) - 1.0).abs() < 1e-12);
    assert!(first.u.dot(Vec3::Z).abs() < 1e-12);
    assert!(diagnostics.frame_fallback_count >= 1);
    assert!(tube.vertices.iter().all(|v| v.position.is_finite()));
}

#[test]
fn tube_along_hopf_fiber() {
    let bases = sample_base_points(&SamplingMode::default(), 6, Transform::identity()).expect("sampling");
    let (fibration, _) = generate_fibration(&bases, 40).expect("fibration");
    let path = fibration.fiber_positions(2).expect("fiber");

    let (tube, diagnostics) = build_tube(&path, TubeOptions { radius: 0.02, ..Default::default() }).expect("tube");
    assert_eq!(tube.vertices.len(), 40 * 20);
    assert_eq!(tube.triangle_count(), 40 * 20 * 2);
    assert_eq!(diagnostics.tangent_fallback_count, 0);
    assert!(tube.vertices.iter().all(|v| v.position.is_finite()));
    assert_frames_turn_with_tangent(&tube.frames);
}

#[test]
fn tube_rejects_invalid_input() {
    let path = planar_circle(1.0, 8);
    assert_eq!(
        build_tube(&path[..2], TubeOptions::default()).unwrap_err(),
        TubeError::PathTooShort(2)
    );
    assert_eq!(
        build_tube(&path, TubeOptions { radius: 0.0, ..Default::default() }).unwrap_err(),
        TubeError::InvalidRadius
    );
    assert_eq!(
        build_tube(&path, TubeOptions { radius: f64::NAN, ..Default::default() }).unwrap_err(),
        TubeError::InvalidRadius
    );
    assert_eq!(
        build_tube(&path, TubeOptions { segments: 2, ..Default::default() }).unwrap_err(),
        TubeError::NotEnoughSegments(2)
    );

    let mut bad = path.clone();
    bad[3] = Point3::new(f64::INFINITY, 0.0, 0.0);
    assert_eq!(build_tube(&bad, TubeOptions::default()).unwrap_err(), TubeError::NonFinitePath(3));
}
