use std::f64::consts::TAU;

use hopf_engine::HopfEngine;
use hopf_engine::geom::{
    CircleParams, DEFAULT_RESTART_INDEX, HopfConfig, INTERLEAVED_STRIDE, SamplingMode,
    TubeOptions,
};

fn config(fibers: usize, samples: usize) -> HopfConfig {
    HopfConfig {
        number_of_fibers: fibers,
        iterations_per_fiber: samples,
        ..Default::default()
    }
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("hopf_engine_it_{}_{name}", std::process::id()))
}

#[test]
fn engine_builds_default_scene() {
    let engine = HopfEngine::with_config(HopfConfig::default()).expect("engine");

    let vertices = engine.fibration_vertices();
    let indices = engine.fibration_indices();
    assert_eq!(vertices.len(), 80 * 130 * INTERLEAVED_STRIDE);
    assert_eq!(indices.len(), 80 * 131);
    assert_eq!(engine.restart_index(), DEFAULT_RESTART_INDEX);
    assert_eq!(
        indices.iter().filter(|&&i| i == DEFAULT_RESTART_INDEX).count(),
        80
    );
    assert!(indices.iter().all(|&i| i == DEFAULT_RESTART_INDEX || (i as usize) < 80 * 130));
    assert!(engine.tube_vertices().is_none());
    assert_eq!(engine.base_point_vertices().len(), 80 * INTERLEAVED_STRIDE);
}

#[test]
fn fiber_points_stay_inside_unit_ball() {
    let engine = HopfEngine::with_config(HopfConfig {
        sampling: SamplingMode::GreatCircle {
            circles: vec![
                CircleParams { offset: -0.6, arc_angle: TAU },
                CircleParams { offset: 0.3, arc_angle: TAU / 2.0 },
            ],
        },
        ..config(16, 48)
    })
    .expect("engine");

    let scene = engine.scene();
    assert_eq!(scene.fibration().fiber_count(), 32);
    for vertex in &scene.fibration().vertices {
        assert!(vertex.position.is_finite());
        assert!(vertex.position.norm() <= 1.0 + 1e-9);
    }
}

#[test]
fn update_config_reports_reallocation() {
    let mut engine = HopfEngine::with_config(config(8, 32)).expect("engine");

    assert!(!engine.update_config(config(8, 32)).expect("same config"));
    assert!(!engine.update_config(config(8, 16)).expect("fewer samples"));
    assert_eq!(engine.scene().fibration().iterations_per_fiber, 16);

    assert!(engine.update_config(config(40, 64)).expect("more fibers"));
    assert_eq!(engine.scene().fibration().fiber_count(), 40);
    assert_eq!(engine.fibration_indices().len(), 40 * 65);
}

#[test]
fn failed_update_keeps_previous_scene() {
    let mut engine = HopfEngine::with_config(config(4, 10)).expect("engine");
    let before = engine.fibration_vertices();

    // 4 fibers * 20 samples cannot be indexed below a restart index of 40.
    let err = engine
        .update_config(HopfConfig { restart_index: 40, ..config(4, 20) })
        .expect_err("restart index collision");
    assert!(err.contains("restart"), "unexpected error: {err}");
    assert_eq!(engine.fibration_vertices(), before);
    assert_eq!(engine.scene().config().restart_index, DEFAULT_RESTART_INDEX);
}

#[test]
fn tube_follows_selected_fiber() {
    let engine = HopfEngine::with_config(HopfConfig {
        tube_fiber: Some(2),
        tube: TubeOptions { radius: 0.05, segments: 8, ..Default::default() },
        ..config(6, 40)
    })
    .expect("engine");

    let tube_vertices = engine.tube_vertices().expect("tube vertices");
    let tube_indices = engine.tube_indices().expect("tube indices");
    assert_eq!(tube_vertices.len(), 40 * 8 * INTERLEAVED_STRIDE);
    assert_eq!(tube_indices.len() % 3, 0);
    assert!(tube_indices.iter().all(|&i| (i as usize) < 40 * 8));

    let tube = engine.scene().tube().expect("tube");
    let fiber = engine.scene().fibration().fiber_positions(2).expect("fiber");
    for (frame, center) in tube.frames.iter().zip(&fiber) {
        assert!(frame.center.distance_to(*center) < 1e-12);
    }
    for (ring_index, frame) in tube.frames.iter().enumerate() {
        let ring = tube.ring(ring_index).expect("ring");
        for vertex in ring {
            let distance = vertex.position.distance_to(frame.center);
            assert!((distance - 0.05).abs() < 1e-9);
        }
    }
}

#[test]
fn exports_fibers_and_tube_as_obj() {
    let engine = HopfEngine::with_config(HopfConfig {
        tube_fiber: Some(0),
        tube: TubeOptions { segments: 4, ..Default::default() },
        ..config(3, 5)
    })
    .expect("engine");

    let text = engine.export_obj().expect("obj text");
    assert_eq!(text.lines().filter(|line| line.starts_with("v ")).count(), 15);
    let polylines: Vec<&str> = text.lines().filter(|line| line.starts_with("l ")).collect();
    assert_eq!(polylines.len(), 3);
    assert_eq!(polylines[0], "l 1 2 3 4 5");

    let fibers_path = temp_path("fibers");
    let written = engine.scene().export_fibration(&fibers_path).expect("export fibers");
    assert_eq!(written.extension().and_then(|e| e.to_str()), Some("obj"));
    assert_eq!(std::fs::read_to_string(&written).expect("read back"), text);
    let _ = std::fs::remove_file(&written);

    let tube_path = temp_path("tube.obj");
    let written = engine.scene().export_tube(&tube_path).expect("export tube");
    assert_eq!(written, tube_path);
    let tube_text = std::fs::read_to_string(&written).expect("read back");
    let triangles = engine.scene().tube().expect("tube").triangle_count();
    assert_eq!(tube_text.lines().filter(|line| line.starts_with("l ")).count(), triangles);
    let _ = std::fs::remove_file(&written);
}

#[test]
fn random_sampling_is_reproducible() {
    let random = |seed| HopfConfig {
        sampling: SamplingMode::Random { seed, mean: 0.0, std_dev: 1.0 },
        ..config(12, 20)
    };

    let a = HopfEngine::with_config(random(7)).expect("engine");
    let b = HopfEngine::with_config(random(7)).expect("engine");
    let c = HopfEngine::with_config(random(8)).expect("engine");

    assert_eq!(a.base_point_vertices(), b.base_point_vertices());
    assert_eq!(a.fibration_vertices(), b.fibration_vertices());
    assert_ne!(a.base_point_vertices(), c.base_point_vertices());
}
