//! Byte layouts shared with the WGSL shaders.
//!
//! Matrices are column major, 64 bytes each. Structs follow WGSL uniform
//! alignment so they can be uploaded with [`bytemuck::bytes_of`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rigview::{scene::FrameParts, types::PartId};

/// `SceneUniforms` in `scene.wgsl`.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SceneUniforms {
    pub view_projection: Mat4,
    pub light_direction: Vec3,
    pub _padding: f32,
}

/// `PartUniforms` in `part.wgsl`.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PartUniforms {
    pub model: Mat4,
    pub normal: Mat4,
}

impl PartUniforms {
    pub const IDENTITY: Self = Self {
        model: Mat4::IDENTITY,
        normal: Mat4::IDENTITY,
    };
}

/// One draw of a lit part.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PartDraw {
    pub part: PartId,
    pub mesh: usize,
    pub uniforms: PartUniforms,
}

impl PartDraw {
    /// The part identifier as uploaded, a single `u32`.
    pub fn part_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.part)
    }
}

/// Everything uploaded for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    pub scene: SceneUniforms,
    pub parts: Vec<PartDraw>,
}

impl FrameUniforms {
    pub fn from_frame(frame: &FrameParts) -> Self {
        profiling::scope!("FrameUniforms::from_frame");

        Self {
            scene: SceneUniforms {
                view_projection: frame.view_projection,
                light_direction: frame.light_direction,
                _padding: 0.0,
            },
            parts: frame
                .parts
                .iter()
                .map(|p| PartDraw {
                    part: p.part,
                    mesh: p.mesh,
                    uniforms: PartUniforms {
                        model: p.model,
                        normal: p.normal,
                    },
                })
                .collect(),
        }
    }

    pub fn scene_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.scene)
    }

    /// Part uniforms of every draw, packed back to back.
    pub fn part_bytes(&self) -> Vec<u8> {
        self.parts
            .iter()
            .flat_map(|p| bytemuck::bytes_of(&p.uniforms).iter().copied())
            .collect()
    }
}

/// Vertex of the line pipeline, 24 bytes.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct LineVertex {
    pub position: Vec3,
    pub color: Vec3,
}

impl LineVertex {
    pub const fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }
}

pub const GRID_COLOR: Vec3 = Vec3::ONE;
/// Grid lines run from `-GRID_EXTENT` to `GRID_EXTENT` on both ground axes.
pub const GRID_EXTENT: i32 = 5;

/// Unit world axes colored x red, y green and z blue, followed by the ground
/// grid. Line list topology.
pub fn grid_and_axes() -> Vec<LineVertex> {
    let mut lines = axes(1.0);
    let extent = GRID_EXTENT as f32;
    for i in -GRID_EXTENT..=GRID_EXTENT {
        let i = i as f32;
        lines.extend([
            LineVertex::new(Vec3::new(-extent, 0.0, i), GRID_COLOR),
            LineVertex::new(Vec3::new(extent, 0.0, i), GRID_COLOR),
            LineVertex::new(Vec3::new(i, 0.0, -extent), GRID_COLOR),
            LineVertex::new(Vec3::new(i, 0.0, extent), GRID_COLOR),
        ]);
    }
    lines
}

/// Axes of `length` drawn at a part's origin with its model matrix.
pub fn axes(length: f32) -> Vec<LineVertex> {
    [Vec3::X, Vec3::Y, Vec3::Z]
        .into_iter()
        .flat_map(|axis| [LineVertex::new(Vec3::ZERO, axis), LineVertex::new(axis * length, axis)])
        .collect()
}

#[cfg(test)]
mod tests {
    use rigview::scene::TankScene;

    use super::*;

    #[test]
    fn layouts_match_the_shaders() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 80);
        assert_eq!(std::mem::size_of::<PartUniforms>(), 128);
        assert_eq!(std::mem::size_of::<LineVertex>(), 24);
        assert_eq!(std::mem::size_of::<PartId>(), 4);
    }

    #[test]
    fn grid_lines() {
        let lines = grid_and_axes();
        assert_eq!(lines.len(), 6 + 11 * 4);
        assert_eq!(lines[1], LineVertex::new(Vec3::X, Vec3::X));
        assert_eq!(lines[5].position, Vec3::Z);
        assert!(lines[6..].iter().all(|v| v.position.y == 0.0 && v.color == GRID_COLOR));
        assert!(lines[6..].iter().all(|v| v.position.abs().max_element() <= 5.0));
    }

    #[test]
    fn local_axes_are_half_length() {
        let lines = axes(0.5);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3].position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(lines[3].color, Vec3::Y);
    }

    #[test]
    fn frame_uniforms_follow_the_frame() {
        let frame = TankScene::default().frame(1.5).unwrap();
        let uniforms = FrameUniforms::from_frame(&frame);
        assert_eq!(uniforms.parts.len(), frame.parts.len());
        assert_eq!(uniforms.scene_bytes().len(), 80);
        assert_eq!(uniforms.part_bytes().len(), 128 * frame.parts.len());
        assert_eq!(uniforms.parts[2].part_bytes(), &2u32.to_ne_bytes());
        assert_eq!(&uniforms.scene_bytes()[64..76], bytemuck::bytes_of(&frame.light_direction));
    }
}
