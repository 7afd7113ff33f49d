//! CPU evaluation of the lit part shader.
//!
//! Cook-Torrance with a GGX distribution, Smith geometry term and
//! Fresnel-Schlick, matching `shaders/pbr.frag.wgsl` function for function.
//! Colors are linear inside the model; textures are decoded from and the
//! result re-encoded to gamma 2.2.

use glam::{Mat3, Vec2, Vec3};
use rigview::types::PartId;

mod material;

pub use material::*;

pub const GAMMA: f32 = 2.2;
/// Reflectance at normal incidence of every non-metal.
pub const DIELECTRIC_F0: Vec3 = Vec3::splat(0.04);
pub const AMBIENT_INTENSITY: f32 = 1e-4;
/// Added to the specular denominator.
pub const SPECULAR_EPSILON: f32 = 0.001;

pub const INNER_WHEEL_METALLIC: f32 = 0.1;
pub const INNER_WHEEL_ROUGHNESS: f32 = 0.05;
pub const INNER_WHEEL_BASE_COLOR: Vec3 = Vec3::new(0.38, 0.37, 0.36);
pub const RUST_COLOR: Vec3 = Vec3::new(0.02, 0.01, 0.005);
pub const RUST_ROUGHNESS: f32 = 0.85;
/// AO range over which rust fades in.
pub const RUST_AO_EDGES: (f32, f32) = (0.1, 0.5);
pub const RUST_NOISE_FREQUENCY: f32 = 50.0;

/// Interpolated vertex outputs at a fragment, world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FragmentInput {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

/// Raw texel values of a material at one uv, every channel in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialSample {
    /// sRGB encoded.
    pub base_color: Vec3,
    /// Ambient occlusion, roughness and metallic in `x`, `y` and `z`.
    pub etc: Vec3,
    /// Tangent space normal, sign flipped and packed into `[0, 1]`.
    pub normal: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingParams {
    /// Direction the light travels in.
    pub light_direction: Vec3,
    pub part: PartId,
}

/// Decoded surface properties the BRDF is evaluated with.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Surface {
    /// Linear.
    pub base_color: Vec3,
    pub ao: f32,
    pub roughness: f32,
    pub metallic: f32,
}

impl Surface {
    pub fn decode(sample: &MaterialSample) -> Self {
        Self {
            base_color: srgb_to_linear(sample.base_color),
            ao: sample.etc.x,
            roughness: sample.etc.y,
            metallic: sample.etc.z,
        }
    }

    pub fn f0(&self) -> Vec3 {
        DIELECTRIC_F0.lerp(self.base_color, self.metallic)
    }
}

/// Intermediate terms of one BRDF evaluation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BrdfTerms {
    pub n_dot_v: f32,
    pub n_dot_l: f32,
    pub distribution: f32,
    pub geometry: f32,
    pub fresnel: Vec3,
    pub specular: Vec3,
    /// Share of the light left for the diffuse lobe.
    pub diffuse_weight: Vec3,
}

pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    color.powf(GAMMA)
}

pub fn linear_to_srgb(color: Vec3) -> Vec3 {
    color.powf(1.0 / GAMMA)
}

/// Hermite interpolation between `edge0` and `edge1`, as the WGSL builtin.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - cos_theta).powi(5)
}

/// GGX normal distribution with `a = roughness²`.
pub fn distribution_ggx(n: Vec3, h: Vec3, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h = n.dot(h).max(0.0);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (std::f32::consts::PI * denom * denom)
}

fn geometry_schlick_ggx(n_dot_x: f32, k: f32) -> f32 {
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Smith shadowing-masking with the Schlick-GGX approximation for direct
/// light, `k = (roughness + 1)² / 8`.
pub fn geometry_smith(n: Vec3, v: Vec3, l: Vec3, roughness: f32) -> f32 {
    let k = (roughness + 1.0) * (roughness + 1.0) / 8.0;
    geometry_schlick_ggx(n.dot(v).max(0.0), k) * geometry_schlick_ggx(n.dot(l).max(0.0), k)
}

/// Perturbs the interpolated normal by a normal map sample through the TBN
/// basis. Zero tangent frames leave the tangent space normal's `z` along the
/// vertex normal.
pub fn world_normal(input: &FragmentInput, normal_sample: Vec3) -> Vec3 {
    let tangent_normal = (-(normal_sample * 2.0 - Vec3::ONE)).normalize_or_zero();
    let tbn = Mat3::from_cols(
        input.tangent.normalize_or_zero(),
        input.bitangent.normalize_or_zero(),
        input.normal.normalize_or_zero(),
    );
    (tbn * tangent_normal).normalize_or_zero()
}

/// Rust blend weight of the inner wheel at `uv`. `rust_mask` is the etc
/// texture's green channel.
pub fn rust_factor(rust_mask: f32, ao: f32, uv: Vec2) -> f32 {
    let noise = 0.5 + 0.5 * (uv.x * RUST_NOISE_FREQUENCY + uv.y * RUST_NOISE_FREQUENCY).sin();
    rust_mask * smoothstep(RUST_AO_EDGES.0, RUST_AO_EDGES.1, ao) * noise
}

/// Applies the per-part material override. Only the inner wheel has one: a
/// polished gray metal that rusts where the ao is high enough.
pub fn apply_part_variant(surface: Surface, part: PartId, sample: &MaterialSample, uv: Vec2) -> Surface {
    if !part.is_inner_wheel() {
        return surface;
    }

    let rust = rust_factor(sample.etc.y, surface.ao, uv);
    Surface {
        base_color: INNER_WHEEL_BASE_COLOR.lerp(RUST_COLOR, rust),
        ao: surface.ao,
        roughness: lerp(INNER_WHEEL_ROUGHNESS, RUST_ROUGHNESS, rust),
        metallic: lerp(INNER_WHEEL_METALLIC, 0.0, rust),
    }
}

/// Evaluates the specular and diffuse weights for unit vectors `n`, `v`, `l`.
pub fn brdf(n: Vec3, v: Vec3, l: Vec3, surface: &Surface) -> BrdfTerms {
    let h = (l + v).normalize_or_zero();
    let n_dot_v = n.dot(v).max(0.0);
    let n_dot_l = n.dot(l).max(0.0);

    let distribution = distribution_ggx(n, h, surface.roughness);
    let geometry = geometry_smith(n, v, l, surface.roughness);
    let fresnel = fresnel_schlick(h.dot(v).max(0.0), surface.f0());

    let specular = fresnel * (distribution * geometry) / (4.0 * n_dot_v * n_dot_l + SPECULAR_EPSILON);
    let diffuse_weight = (Vec3::ONE - fresnel) * (1.0 - surface.metallic);

    BrdfTerms {
        n_dot_v,
        n_dot_l,
        distribution,
        geometry,
        fresnel,
        specular,
        diffuse_weight,
    }
}

/// Final sRGB encoded color of a fragment. The viewer sits at the world
/// origin.
pub fn shade(input: &FragmentInput, sample: &MaterialSample, params: &ShadingParams) -> Vec3 {
    let surface = apply_part_variant(Surface::decode(sample), params.part, sample, input.uv);
    let n = world_normal(input, sample.normal);
    let l = (-params.light_direction).normalize_or_zero();
    let v = (-input.position).normalize_or_zero();

    let terms = brdf(n, v, l, &surface);
    let ambient = Vec3::splat(surface.ao * surface.ao * AMBIENT_INTENSITY);
    let color = ambient + terms.diffuse_weight * terms.n_dot_l * surface.base_color + terms.specular;
    linear_to_srgb(color)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
