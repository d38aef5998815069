//! End-to-end hit-testing through the public API.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_relative_eq;
use vcad_kernel_hittest::{
    hit_test_mesh, sort_by_distance, Bvh, BvhParams, HitPrimitive, HitTestContext, HitTestMesh,
    HitTestResult, HitTestable, ModelHandle, Ray, SpatialIndex,
};
use vcad_kernel_math::{Point3, Transform, Vec3};
use vcad_kernel_mesh::{LineGeometry3D, MeshGeometry3D, PointGeometry3D};

fn triangle_at(z: f64) -> MeshGeometry3D {
    MeshGeometry3D::from_buffers(
        vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(0.0, 1.0, z),
        ],
        vec![0, 1, 2],
    )
    .unwrap()
}

/// Latitude/longitude sphere of radius 1 around the origin.
fn uv_sphere(stacks: u32, slices: u32) -> MeshGeometry3D {
    let mut positions = Vec::new();
    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            positions.push(Point3::new(
                phi.sin() * theta.cos(),
                phi.sin() * theta.sin(),
                phi.cos(),
            ));
        }
    }

    let row = slices + 1;
    let mut indices = Vec::new();
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    MeshGeometry3D::from_buffers(positions, indices).unwrap()
}

fn down(x: f64, y: f64) -> Ray {
    Ray::new(Point3::new(x, y, 10.0), Vec3::new(0.0, 0.0, -1.0))
}

fn run(mesh: &dyn HitTestable, model_matrix: &Transform, ray: &Ray) -> (bool, Vec<HitTestResult>) {
    let mut hits = Vec::new();
    let hit = mesh.hit_test(
        &HitTestContext::default(),
        model_matrix,
        ray,
        ModelHandle(42),
        &mut hits,
    );
    (hit, hits)
}

#[test]
fn ray_missing_bound_appends_nothing() {
    let (hit, hits) = run(&triangle_at(0.0), &Transform::identity(), &down(3.0, 3.0));
    assert!(!hit);
    assert!(hits.is_empty());
}

#[test]
fn non_invertible_matrix_misses() {
    let collapse = Transform::uniform_scale(0.0);
    let (hit, hits) = run(&triangle_at(0.0), &collapse, &down(0.25, 0.25));
    assert!(!hit);
    assert!(hits.is_empty());

    let flatten = Transform::scale(1.0, 1.0, 0.0);
    let (hit, _) = run(&triangle_at(0.0), &flatten, &down(0.25, 0.25));
    assert!(!hit);
}

#[test]
fn single_triangle_reports_world_distance() {
    let m = Transform::translation(0.0, 0.0, 2.0);
    let (hit, hits) = run(&triangle_at(0.0), &m, &down(0.25, 0.25));
    assert!(hit);
    assert_eq!(hits.len(), 1);

    let r = &hits[0];
    assert!(r.is_valid());
    assert_relative_eq!(r.distance(), 8.0, epsilon = 1e-12);
    assert_relative_eq!(r.point_hit(), Point3::new(0.25, 0.25, 2.0), epsilon = 1e-12);
    assert_relative_eq!(r.normal_at_hit(), Vec3::z(), epsilon = 1e-12);
    assert_eq!(r.primitive(), HitPrimitive::Triangle([0, 1, 2]));
    assert_eq!(r.model_hit(), ModelHandle(42));
}

#[test]
fn nearer_of_two_triangles_wins() {
    // Farther triangle first in the index buffer
    let mesh = MeshGeometry3D::from_buffers(
        vec![
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.0, 1.0, -1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ],
        vec![0, 1, 2, 3, 4, 5],
    )
    .unwrap();

    let (hit, hits) = run(&mesh, &Transform::identity(), &down(0.25, 0.25));
    assert!(hit);
    assert_eq!(hits.len(), 1);
    assert_relative_eq!(hits[0].distance(), 9.0);
    assert_eq!(hits[0].triangle_indices(), Some([3, 4, 5]));
    assert_eq!(hits[0].tag(), 1);
}

#[test]
fn intersection_behind_origin_misses() {
    let ray = Ray::new(Point3::new(0.25, 0.25, 10.0), Vec3::new(0.0, 0.0, 1.0));
    let (hit, hits) = run(&triangle_at(0.0), &Transform::identity(), &ray);
    assert!(!hit);
    assert!(hits.is_empty());
}

#[test]
fn ray_origin_inside_mesh_hits_far_wall() {
    let sphere = uv_sphere(16, 24);
    let ray = Ray::new(Point3::new(0.01, 0.02, 0.0), Vec3::new(0.0, 0.0, 1.0));
    let (hit, hits) = run(&sphere, &Transform::identity(), &ray);
    assert!(hit);
    assert!(hits[0].distance() > 0.9 && hits[0].distance() <= 1.0);
}

#[test]
fn hit_test_is_idempotent() {
    let sphere = uv_sphere(12, 18);
    let m = Transform::translation(0.5, -0.25, 0.0).compose(&Transform::rotation_x(0.3));
    let ray = down(0.6, -0.1);
    let (_, first) = run(&sphere, &m, &ray);
    let (_, second) = run(&sphere, &m, &ray);
    assert_eq!(first, second);
}

#[test]
fn non_uniform_scale_measures_world_distance() {
    // Sphere squashed to an ellipsoid with semi-axis 3 along z
    let sphere = uv_sphere(24, 32);
    let m = Transform::scale(1.0, 1.0, 3.0);
    let (hit, hits) = run(&sphere, &m, &down(0.001, 0.0013));
    assert!(hit);
    assert_relative_eq!(hits[0].distance(), 7.0, epsilon = 1e-3);
    assert_relative_eq!(hits[0].point_hit().z, 3.0, epsilon = 1e-3);
    assert_relative_eq!(
        hits[0].distance(),
        10.0 - hits[0].point_hit().z,
        epsilon = 1e-12
    );
    assert_relative_eq!(hits[0].normal_at_hit().norm(), 1.0, epsilon = 1e-12);
}

#[test]
fn world_normal_uses_transformed_edges() {
    // Stretching x by 4 tilts the slanted face's normal toward z
    let mesh = MeshGeometry3D::from_buffers(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![0, 1, 2],
    )
    .unwrap();
    let m = Transform::scale(4.0, 1.0, 1.0);
    let (hit, hits) = run(&mesh, &m, &down(1.0, 0.2));
    assert!(hit);

    let expected = Vec3::new(-1.0, 0.0, 4.0).normalize();
    assert_relative_eq!(hits[0].normal_at_hit(), expected, epsilon = 1e-12);
}

fn right_triangle(size: f64) -> MeshGeometry3D {
    MeshGeometry3D::from_buffers(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(0.0, size, 0.0),
        ],
        vec![0, 1, 2],
    )
    .unwrap()
}

#[test]
fn extreme_scale_matches_world_geometry() {
    // (model size, uniform scale, ray x/y): the world triangle is the same
    // whether the scale lives in the matrix or in the positions
    for (size, scale, at) in [(1.0, 1e-5, 2e-6), (1e-3, 1e7, 2000.0)] {
        let ray = down(at, at);
        let (hit, scaled) = run(&right_triangle(size), &Transform::uniform_scale(scale), &ray);
        assert!(hit, "scale {scale}");

        let (hit, world) = run(&right_triangle(size * scale), &Transform::identity(), &ray);
        assert!(hit, "scale {scale}");

        assert_relative_eq!(scaled[0].distance(), 10.0, max_relative = 1e-9);
        assert_relative_eq!(scaled[0].distance(), world[0].distance(), max_relative = 1e-9);
        assert_relative_eq!(scaled[0].point_hit(), world[0].point_hit(), max_relative = 1e-9);
        assert_relative_eq!(scaled[0].normal_at_hit(), Vec3::z(), epsilon = 1e-12);
    }
}

fn compare_paths(mesh: &MeshGeometry3D, model_matrix: &Transform, rays: &[Ray]) -> usize {
    let bvh = Bvh::build(mesh.positions(), mesh.indices(), &BvhParams::default());
    let ctx = HitTestContext::default();
    let mut hit_count = 0;

    for ray in rays {
        let mut brute = Vec::new();
        let mut indexed = Vec::new();
        let a = hit_test_mesh(mesh, None, &ctx, model_matrix, ray, ModelHandle(1), &mut brute);
        let b = hit_test_mesh(
            mesh,
            Some(&bvh),
            &ctx,
            model_matrix,
            ray,
            ModelHandle(1),
            &mut indexed,
        );
        assert_eq!(a, b, "ray {ray:?}");
        assert_eq!(brute, indexed, "ray {ray:?}");
        hit_count += usize::from(a);
    }
    hit_count
}

fn ray_fan() -> Vec<Ray> {
    let mut rays = Vec::new();
    for i in 0..15 {
        for j in 0..15 {
            let x = -2.1 + i as f64 * 0.291;
            let y = -2.3 + j as f64 * 0.307;
            rays.push(down(x, y));
            rays.push(Ray::new(
                Point3::new(x, 6.0, y),
                Vec3::new(0.013 * i as f64, -1.0, 0.021 * j as f64 - 0.1),
            ));
        }
    }
    rays
}

#[test]
fn bvh_agrees_with_brute_force() {
    let sphere = uv_sphere(20, 28);
    let hits = compare_paths(&sphere, &Transform::identity(), &ray_fan());
    assert!(hits > 20);
}

#[test]
fn bvh_agrees_with_brute_force_under_non_uniform_scale() {
    let sphere = uv_sphere(20, 28);
    let m = Transform::translation(0.3, -0.2, 0.5)
        .compose(&Transform::rotation_z(0.7))
        .compose(&Transform::scale(2.0, 0.5, 1.5));
    let hits = compare_paths(&sphere, &m, &ray_fan());
    assert!(hits > 20);
}

#[test]
fn bvh_agrees_on_coplanar_ties() {
    // Two identical triangles: both paths must report the first one
    let mut mesh = triangle_at(0.0);
    mesh.append(&triangle_at(0.0)).unwrap();
    let bvh = Bvh::build(
        mesh.positions(),
        mesh.indices(),
        &BvhParams {
            max_leaf_triangles: 1,
            ..Default::default()
        },
    );
    let ctx = HitTestContext::default();
    let mut hits = Vec::new();
    assert!(hit_test_mesh(
        &mesh,
        Some(&bvh),
        &ctx,
        &Transform::identity(),
        &down(0.25, 0.25),
        ModelHandle(0),
        &mut hits,
    ));
    assert_eq!(hits[0].tag(), 0);
}

#[derive(Debug, Default)]
struct CountingIndex {
    calls: AtomicUsize,
}

impl SpatialIndex for CountingIndex {
    fn query(
        &self,
        _ctx: &HitTestContext,
        _ray_world: &Ray,
        _model_matrix: &Transform,
        _source: ModelHandle,
        _hits: &mut Vec<HitTestResult>,
    ) -> bool {
        self.calls.fetch_add(1, Ordering::Relaxed);
        false
    }

    fn triangle_count(&self) -> usize {
        0
    }
}

#[test]
fn spatial_index_answers_alone() {
    let index = CountingIndex::default();
    let mut hits = Vec::new();
    let hit = hit_test_mesh(
        &triangle_at(0.0),
        Some(&index),
        &HitTestContext::default(),
        &Transform::identity(),
        &down(0.25, 0.25),
        ModelHandle(0),
        &mut hits,
    );
    assert!(!hit);
    assert!(hits.is_empty());
    assert_eq!(index.calls.load(Ordering::Relaxed), 1);
}

#[test]
fn empty_mesh_skips_spatial_index() {
    let index = CountingIndex::default();
    let hit = hit_test_mesh(
        &MeshGeometry3D::new(),
        Some(&index),
        &HitTestContext::default(),
        &Transform::identity(),
        &down(0.0, 0.0),
        ModelHandle(0),
        &mut Vec::new(),
    );
    assert!(!hit);
    assert_eq!(index.calls.load(Ordering::Relaxed), 0);
}

#[test]
fn dirty_index_falls_back_to_brute_force() {
    let mut mesh =
        HitTestMesh::new(triangle_at(0.0)).with_spatial_index(Arc::new(BvhParams::default()));

    mesh.update(|g| {
        for p in g.positions_mut() {
            p.z = -2.0;
        }
    });
    assert!(mesh.is_spatial_index_dirty());

    let (hit, hits) = run(&mesh, &Transform::identity(), &down(0.25, 0.25));
    assert!(hit);
    assert_relative_eq!(hits[0].distance(), 12.0);

    mesh.refresh_spatial_index();
    let (_, refreshed) = run(&mesh, &Transform::identity(), &down(0.25, 0.25));
    assert_eq!(hits, refreshed);
}

#[test]
fn mixed_geometry_sorted_nearest_first() {
    let ctx = HitTestContext::default();
    let m = Transform::identity();
    let ray = down(0.25, 0.0);

    let mesh = HitTestMesh::new(triangle_at(0.0));
    let line = LineGeometry3D::polyline(vec![
        Point3::new(-1.0, 0.0, 3.0),
        Point3::new(1.0, 0.0, 3.0),
    ])
    .unwrap();
    let points = PointGeometry3D::new(vec![Point3::new(0.25, 0.0, 6.0)]);

    let scene: [(&dyn HitTestable, ModelHandle); 3] = [
        (&mesh, ModelHandle(1)),
        (&line, ModelHandle(2)),
        (&points, ModelHandle(3)),
    ];

    let mut hits = Vec::new();
    for (geometry, handle) in scene {
        assert!(geometry.hit_test(&ctx, &m, &ray, handle, &mut hits));
    }
    sort_by_distance(&mut hits);

    let order: Vec<ModelHandle> = hits.iter().map(HitTestResult::model_hit).collect();
    assert_eq!(order, vec![ModelHandle(3), ModelHandle(2), ModelHandle(1)]);
    assert_eq!(hits[0].primitive(), HitPrimitive::Point(0));
    assert_eq!(hits[1].primitive(), HitPrimitive::Segment([0, 1]));
}
