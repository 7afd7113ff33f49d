//! CPU texture sampling with the same filtering rules the GPU sampler uses.

use glam::{IVec2, Vec2, Vec4};
use rigview::types::Texture;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
}

/// Defaults to bilinear filtering clamped to the edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Sampler {
    pub filter: FilterMode,
    pub address: AddressMode,
}

impl Sampler {
    pub const NEAREST: Self = Self {
        filter: FilterMode::Nearest,
        address: AddressMode::ClampToEdge,
    };

    /// Samples `texture` at `uv`, returning unorm channels in `[0, 1]`.
    pub fn sample(&self, texture: &Texture, uv: Vec2) -> Vec4 {
        let size = texture.size.as_vec2();
        let coords = uv * size;
        match self.filter {
            FilterMode::Nearest => self.fetch(texture, coords.floor().as_ivec2()),
            FilterMode::Linear => {
                // Texel centers sit at half integers.
                let coords = coords - Vec2::splat(0.5);
                let base = coords.floor();
                let t = coords - base;
                let base = base.as_ivec2();

                let top = self
                    .fetch(texture, base)
                    .lerp(self.fetch(texture, base + IVec2::X), t.x);
                let bottom = self
                    .fetch(texture, base + IVec2::Y)
                    .lerp(self.fetch(texture, base + IVec2::ONE), t.x);
                top.lerp(bottom, t.y)
            }
        }
    }

    fn fetch(&self, texture: &Texture, texel: IVec2) -> Vec4 {
        let size = texture.size.as_ivec2();
        let texel = match self.address {
            AddressMode::ClampToEdge => texel.clamp(IVec2::ZERO, size - IVec2::ONE),
            AddressMode::Repeat => IVec2::new(texel.x.rem_euclid(size.x), texel.y.rem_euclid(size.y)),
        };
        let [r, g, b, a] = texture.texel(texel.x as u32, texel.y as u32);
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}
