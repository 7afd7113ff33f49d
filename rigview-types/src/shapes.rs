//! Procedural meshes for parts that don't come from a model file.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::{Handedness, Mesh, MeshBuilder, MeshValidationError};

/// Generate a closed cylinder centred on the origin along the Y axis.
///
/// The side wall is a single band of `radial_segments` quads starting at +Z
/// and winding towards +X, with `u` running around the wall and `v` from top
/// to bottom. Both caps are triangle fans around a dedicated centre vertex
/// per segment. Faces are counter-clockwise when seen from outside.
pub fn cylinder(radius: f32, height: f32, radial_segments: u32) -> Result<Mesh, MeshValidationError> {
    let segments = radial_segments.max(3);
    let half_height = height * 0.5;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    // Side wall: one row of vertices at the top, one at the bottom.
    for row in 0..=1u32 {
        let v = row as f32;
        for column in 0..=segments {
            let u = column as f32 / segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();

            positions.push(Vec3::new(radius * sin, half_height - v * height, radius * cos));
            normals.push(Vec3::new(sin, 0.0, cos));
            uvs.push(Vec2::new(u, 1.0 - v));
        }
    }
    for column in 0..segments {
        let a = column;
        let b = column + segments + 1;
        let c = b + 1;
        let d = a + 1;
        indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    for top in [true, false] {
        let sign = if top { 1.0 } else { -1.0 };
        let normal = Vec3::Y * sign;

        let center_start = positions.len() as u32;
        for _ in 0..segments {
            positions.push(Vec3::new(0.0, half_height * sign, 0.0));
            normals.push(normal);
            uvs.push(Vec2::splat(0.5));
        }

        let rim_start = positions.len() as u32;
        for column in 0..=segments {
            let u = column as f32 / segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();

            positions.push(Vec3::new(radius * sin, half_height * sign, radius * cos));
            normals.push(normal);
            uvs.push(Vec2::new(cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5));
        }

        for column in 0..segments {
            let center = center_start + column;
            let rim = rim_start + column;
            if top {
                indices.extend_from_slice(&[rim, rim + 1, center]);
            } else {
                indices.extend_from_slice(&[rim + 1, rim, center]);
            }
        }
    }

    MeshBuilder::new(positions, Handedness::Right)
        .with_vertex_normals(normals)
        .with_vertex_texture_coordinates_0(uvs)
        .with_indices(indices)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cylinder_counts() {
        let mesh = cylinder(1.0, 2.0, 16).unwrap();

        // side: 2 * 17, caps: 2 * (16 + 17)
        assert_eq!(mesh.vertex_count(), 34 + 66);
        assert_eq!(mesh.triangle_count(), 32 + 32);
    }

    #[test]
    fn cylinder_extent() {
        let mesh = cylinder(0.5, 3.0, 8).unwrap();
        let (min, max) = mesh
            .positions
            .iter()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(min, max), p| {
                (min.min(*p), max.max(*p))
            });

        assert!((max.y - 1.5).abs() < 1e-6);
        assert!((min.y + 1.5).abs() < 1e-6);
        assert!((max.x - 0.5).abs() < 1e-5);
        assert!((max.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cylinder_faces_point_outwards() {
        let mesh = cylinder(1.0, 2.0, 12).unwrap();
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [
                mesh.positions[tri[0] as usize],
                mesh.positions[tri[1] as usize],
                mesh.positions[tri[2] as usize],
            ];
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            let outward = if centroid.y.abs() > 0.999 {
                Vec3::Y * centroid.y.signum()
            } else {
                Vec3::new(centroid.x, 0.0, centroid.z)
            };
            assert!(face_normal.dot(outward) > 0.0, "triangle {tri:?} faces inwards");
        }
    }

    #[test]
    fn cylinder_has_usable_tangents_on_the_wall() {
        let mesh = cylinder(1.0, 2.0, 16).unwrap();
        for i in 0..34 {
            let t = mesh.tangents[i];
            assert!((t.length() - 1.0).abs() < 1e-4);
            assert!(t.dot(mesh.normals[i]).abs() < 1e-4);
        }
    }
}
