use crate::geom::{
    BufferUpdate, DEFAULT_RESTART_INDEX, DrawMode, INTERLEAVED_STRIDE, Mesh, MeshError, Point3,
    SamplingMode, Transform, Vertex, generate_fibration, sample_base_points,
};

#[test]
fn sphere_has_expected_topology() {
    let center = Point3::new(1.0, -2.0, 0.5);
    let mesh = Mesh::from_sphere(0.75, center, 16, 8).expect("sphere");

    assert_eq!(mesh.vertex_count(), 17 * 9);
    assert_eq!(mesh.triangle_count(), 16 * 8 * 2);
    assert_eq!(mesh.draw_mode, DrawMode::Triangles);
    mesh.validate().expect("valid sphere");

    for vertex in &mesh.vertices {
        assert!((vertex.position.distance_to(center) - 0.75).abs() < 1e-12);
    }
}

#[test]
fn grid_has_expected_topology() {
    let center = Point3::new(0.0, -1.0, 0.0);
    let mesh = Mesh::from_grid(2.0, 3.0, center, 4, 5).expect("grid");

    assert_eq!(mesh.vertex_count(), 20);
    assert_eq!(mesh.triangle_count(), 3 * 4 * 2);
    mesh.validate().expect("valid grid");

    assert!(mesh.vertices.iter().all(|v| v.position.y == -1.0));
    assert_eq!(mesh.vertices[0].position, Point3::new(-2.0, -1.0, -3.0));
    assert_eq!(mesh.vertices[19].position, Point3::new(2.0, -1.0, 3.0));
    // First cell: 0 -> 4 -> 5.
    assert_eq!(&mesh.indices[..3], &[0, 4, 5]);
}

#[test]
fn primitives_reject_bad_parameters() {
    assert_eq!(
        Mesh::from_sphere(1.0, Point3::ORIGIN, 2, 8).unwrap_err(),
        MeshError::InvalidDivisions { u: 2, v: 8, min: 3 }
    );
    assert_eq!(
        Mesh::from_sphere(-1.0, Point3::ORIGIN, 8, 8).unwrap_err(),
        MeshError::InvalidDimensions
    );
    assert_eq!(
        Mesh::from_grid(1.0, 1.0, Point3::ORIGIN, 1, 4).unwrap_err(),
        MeshError::InvalidDivisions { u: 1, v: 4, min: 2 }
    );
}

#[test]
fn set_vertices_reports_reallocation_on_growth() {
    let mut mesh = Mesh::points(vec![Vertex::default(); 4]);

    assert_eq!(mesh.set_vertices(vec![Vertex::default(); 3]), BufferUpdate::InPlace);
    assert_eq!(mesh.set_vertices(vec![Vertex::default(); 4]), BufferUpdate::InPlace);
    assert_eq!(mesh.set_vertices(vec![Vertex::default(); 5]), BufferUpdate::Reallocated);
    assert_eq!(mesh.vertex_count(), 5);
    assert_eq!(mesh.set_vertices(vec![Vertex::default(); 5]), BufferUpdate::InPlace);
}

#[test]
fn replace_reallocates_when_indices_grow() {
    let mut mesh = Mesh::new(vec![Vertex::default(); 3], vec![0, 1, 2], DrawMode::Triangles);
    assert_eq!(
        mesh.replace(vec![Vertex::default(); 3], vec![0, 1, 2, 2, 1, 0]),
        BufferUpdate::Reallocated
    );
    assert_eq!(mesh.replace(vec![Vertex::default(); 2], vec![0, 1, 1]), BufferUpdate::InPlace);
}

#[test]
fn fibration_mesh_exposes_runs_and_interleaved_data() {
    let bases = sample_base_points(&SamplingMode::default(), 3, Transform::identity()).expect("sampling");
    let (fibration, _) = generate_fibration(&bases, 5).expect("fibration");
    let mesh = Mesh::from_fibration(&fibration, DEFAULT_RESTART_INDEX).expect("mesh");

    assert_eq!(mesh.draw_mode, DrawMode::LineLoop);
    assert_eq!(mesh.restart_index, Some(DEFAULT_RESTART_INDEX));
    assert_eq!(mesh.index_count(), 3 * 6);
    mesh.validate().expect("valid fibration mesh");

    let runs = mesh.index_runs(DEFAULT_RESTART_INDEX);
    assert_eq!(runs, fibration.runs);

    let interleaved = mesh.interleaved();
    assert_eq!(interleaved.len(), 15 * INTERLEAVED_STRIDE);
    let first = &mesh.vertices[0];
    assert_eq!(interleaved[0], first.position.x as f32);
    assert_eq!(interleaved[3], first.color.r as f32);
    assert_eq!(mesh.positions_flat().len(), 15 * 3);
}

#[test]
fn validate_reports_non_triangle_list() {
    let mesh = Mesh::new(vec![Vertex::default(); 3], vec![0, 1], DrawMode::Triangles);
    assert_eq!(mesh.validate(), Err(MeshError::NotTriangleList(2)));

    let soup = Mesh::new(vec![Vertex::default(); 6], Vec::new(), DrawMode::Triangles);
    assert!(soup.validate().is_ok());
    assert_eq!(soup.triangle_count(), 2);
}
