//! Shape generators emitting interleaved `{3, 3, 2}` vertex data.

use cgmath::{Deg, InnerSpace, Matrix4, Vector2, Vector3, Vector4};
use std::f32::consts::PI;

/// Unit cube centered at the origin: 36 vertices, interleaved
/// position/normal/texcoord. Draw as an unindexed triangle list.
#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; 36 * 8] = [
    // positions          // normals           // texture coords
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0,  0.0,
     0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0,  0.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0,  1.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0,  1.0,
    -0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0,  1.0,
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0,  0.0,

    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0,  0.0,
     0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0,  0.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0,  1.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0,  1.0,
    -0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0,  1.0,
    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0,  0.0,

    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0,  0.0,
    -0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0,  1.0,
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0,  1.0,
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0,  1.0,
    -0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0,  0.0,
    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0,  0.0,

     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0,  0.0,
     0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0,  1.0,
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0,  1.0,
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0,  1.0,
     0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0,  0.0,
     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0,  0.0,

    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0,  1.0,
     0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0,  1.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0,  0.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0,  0.0,
    -0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0,  0.0,
    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0,  1.0,

    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0,  1.0,
     0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0,  1.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0,  0.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0,  0.0,
    -0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0,  0.0,
    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0,  1.0,
];

/// Sweeps a 2D outline around `axis` into a revolution surface.
///
/// The outline lives in the XY plane with coordinates in [-0.5, 0.5] (the
/// texture v coordinate is `y + 0.5`, so points outside that range wrap).
/// Each outline segment becomes `segments` quads of two triangles; the
/// result is interleaved `{3, 3, 2}` data for an unindexed triangle list.
pub fn revolve(outline: &[Vector2<f32>], segments: u32, axis: Vector3<f32>) -> Vec<f32> {
    assert!(outline.len() >= 2, "revolution outline needs at least two points");
    assert!(segments >= 3, "revolution surface needs at least three segments");

    let mut vertices = Vec::with_capacity((outline.len() - 1) * segments as usize * 6 * 8);
    let delta_degree = 360.0 / segments as f32;
    for pair in outline.windows(2) {
        for slice in 0..segments {
            let degree = slice as f32 * delta_degree;
            push_surface(&mut vertices, pair[0], pair[1], degree, delta_degree, axis);
        }
    }
    vertices
}

/// Ball of diameter 1: a semicircle outline revolved about the X axis.
pub fn sphere_vertices(segments: u32) -> Vec<f32> {
    let outline: Vec<Vector2<f32>> = (0..segments)
        .map(|i| {
            let theta = PI * i as f32 / segments as f32;
            Vector2::new(theta.cos() / 2.0, theta.sin() / 2.0)
        })
        .collect();
    revolve(&outline, segments, Vector3::unit_x())
}

/// Cone of height 1 with the apex up, revolved about the Y axis.
///
/// `base_radius` is the radius of the base circle.
pub fn cone_vertices(segments: u32, base_radius: f32) -> Vec<f32> {
    let outline = [
        Vector2::new(0.0, 0.5),
        Vector2::new(-base_radius, -0.5),
    ];
    revolve(&outline, segments, Vector3::unit_y())
}

fn rotated(point: Vector2<f32>, degree: f32, axis: Vector3<f32>) -> Vector3<f32> {
    let v = Matrix4::from_axis_angle(axis.normalize(), Deg(degree))
        * Vector4::new(point.x, point.y, 0.0, 1.0);
    Vector3::new(v.x, v.y, v.z)
}

fn triangle_normal(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Vector3<f32> {
    // degenerate triangles (points on the rotation axis) normalize to NaN;
    // flush those to zero so the data stays finite
    let n = (b - a).cross(c - a).normalize();
    Vector3::new(
        if n.x.is_nan() { 0.0 } else { n.x },
        if n.y.is_nan() { 0.0 } else { n.y },
        if n.z.is_nan() { 0.0 } else { n.z },
    )
}

fn push_point(target: &mut Vec<f32>, point: Vector3<f32>, normal: Vector3<f32>, u: f32, v: f32) {
    target.extend_from_slice(&[
        point.x, point.y, point.z, normal.x, normal.y, normal.z, u, v,
    ]);
}

fn push_surface(
    target: &mut Vec<f32>,
    p1: Vector2<f32>,
    p3: Vector2<f32>,
    degree: f32,
    degree_delta: f32,
    axis: Vector3<f32>,
) {
    // one quad P1P2P4P3 of the sweep:
    // P1--P2
    // |  /|
    // | / |
    // |/  |
    // P3--P4
    let p1_3d = rotated(p1, degree, axis);
    let p2_3d = rotated(p1, degree + degree_delta, axis);
    let p3_3d = rotated(p3, degree, axis);
    let p4_3d = rotated(p3, degree + degree_delta, axis);

    let u1 = degree / 360.0;
    let u2 = (degree + degree_delta) / 360.0;
    let v1 = p1.y + 0.5;
    let v2 = p3.y + 0.5;

    let normal1 = triangle_normal(p1_3d, p2_3d, p3_3d);
    let normal2 = triangle_normal(p2_3d, p4_3d, p3_3d);

    push_point(target, p1_3d, normal1, u1, v1);
    push_point(target, p2_3d, normal1, u2, v1);
    push_point(target, p3_3d, normal1, u1, v2);

    push_point(target, p2_3d, normal2, u2, v1);
    push_point(target, p3_3d, normal2, u1, v2);
    push_point(target, p4_3d, normal2, u2, v2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_matches_layout() {
        assert_eq!(CUBE_VERTICES.len(), 36 * 8);
    }

    #[test]
    fn revolve_emits_six_vertices_per_quad() {
        let outline = [Vector2::new(0.5, -0.5), Vector2::new(0.5, 0.5)];
        let data = revolve(&outline, 8, Vector3::unit_y());
        // 1 segment pair * 8 slices * 2 triangles * 3 vertices * 8 floats
        assert_eq!(data.len(), 8 * 6 * 8);
    }

    #[test]
    fn sphere_vertex_count_scales_with_segments() {
        let data = sphere_vertices(12);
        assert_eq!(data.len(), (12 - 1) * 12 * 6 * 8);
    }

    #[test]
    fn degenerate_normals_are_flushed_to_zero() {
        // both outline points sit on the rotation axis, every triangle is
        // degenerate
        let outline = [Vector2::new(0.0, -0.5), Vector2::new(0.0, 0.5)];
        let data = revolve(&outline, 4, Vector3::unit_y());
        assert!(data.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn texture_v_spans_outline_height() {
        let outline = [Vector2::new(0.5, -0.5), Vector2::new(0.5, 0.5)];
        let data = revolve(&outline, 4, Vector3::unit_y());
        // first vertex belongs to the lower outline point: v = -0.5 + 0.5
        assert_eq!(data[7], 0.0);
        // last vertex belongs to the upper outline point: v = 0.5 + 0.5
        assert_eq!(data[data.len() - 1], 1.0);
    }
}
