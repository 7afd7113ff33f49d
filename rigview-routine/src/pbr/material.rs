//! The textures a lit part is shaded with.

use glam::{Vec2, Vec3, Vec4Swizzles};
use rigview::types::{PartId, Texture};

use crate::{pbr::MaterialSample, sampler::Sampler};

/// Normal map value that leaves the vertex normal untouched. Maps are stored
/// sign flipped, so this is `(0, 0, -1)` packed into `[0, 1]`.
pub const FLAT_NORMAL: Vec3 = Vec3::new(0.5, 0.5, 0.0);

/// Solid gray the hand is shaded with.
pub const HAND_GRAY: [u8; 4] = [0x88, 0x88, 0x88, 0xFF];

#[derive(Debug, Clone, PartialEq)]
pub struct PbrMaterial {
    /// sRGB encoded.
    pub base_color: Texture,
    /// Ambient occlusion, roughness and metallic in r, g and b.
    pub etc: Texture,
    pub normal: Texture,
    pub part: PartId,
}

impl PbrMaterial {
    /// Untextured material of one color. Fully unoccluded, half rough,
    /// non-metal.
    pub fn solid(part: PartId, base_color: [u8; 4]) -> Self {
        Self {
            base_color: Texture::solid("solid base color", base_color),
            etc: Texture::solid("solid etc", [0xFF, 0x80, 0x00, 0xFF]),
            normal: Texture::solid("flat normal", [0x80, 0x80, 0x00, 0xFF]),
            part,
        }
    }

    pub fn sample(&self, uv: Vec2, sampler: &Sampler) -> MaterialSample {
        MaterialSample {
            base_color: sampler.sample(&self.base_color, uv).xyz(),
            etc: sampler.sample(&self.etc, uv).xyz(),
            normal: sampler.sample(&self.normal, uv).xyz(),
        }
    }
}
