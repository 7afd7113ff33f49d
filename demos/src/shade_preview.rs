//! Shades a sphere on the CPU with the same model the fragment shader uses
//! and writes it out as an image. Handy for checking material changes, the
//! inner wheel rust in particular, without a GPU.

use std::{
    f32::consts::{PI, TAU},
    path::PathBuf,
};

use anyhow::Context;
use glam::{UVec2, Vec2, Vec3};
use image::{Rgb, RgbImage};
use pico_args::Arguments;
use rigview::types::{PartId, Texture};
use rigview_routine::{
    pbr::{shade, FragmentInput, PbrMaterial, ShadingParams},
    sampler::Sampler,
};

use crate::cli::{demo_args, exit_on_error, extract_vec3, finish, option_arg};

pub const SPHERE_CENTER: Vec3 = Vec3::new(0.0, 0.0, -3.0);
pub const SPHERE_RADIUS: f32 = 1.0;
pub const FOVY_DEGREES: f32 = 45.0;
pub const BACKGROUND: [u8; 3] = [0x10, 0x10, 0x10];

const TEXTURE_SIZE: u32 = 64;
const CHECKER: u32 = 8;

pub fn part_from_name(name: &str) -> Option<PartId> {
    Some(match name {
        "body" => PartId::BODY,
        "turret" => PartId::TURRET,
        "inner-wheel" => PartId::INNER_WHEEL,
        "outer-wheel" => PartId::OUTER_WHEEL,
        "barrel" => PartId::BARREL,
        "shell" => PartId::SHELL,
        "hand" => PartId::HAND,
        other => PartId(other.parse().ok()?),
    })
}

/// Olive checker base color, ao fading towards the poles and a rust mask
/// growing along `u`.
pub fn procedural_material(part: PartId) -> anyhow::Result<PbrMaterial> {
    let size = UVec2::splat(TEXTURE_SIZE);
    let mut base_color = Vec::with_capacity((TEXTURE_SIZE * TEXTURE_SIZE * 4) as usize);
    let mut etc = Vec::with_capacity(base_color.capacity());
    for y in 0..TEXTURE_SIZE {
        for x in 0..TEXTURE_SIZE {
            let u = (x as f32 + 0.5) / TEXTURE_SIZE as f32;
            let v = (y as f32 + 0.5) / TEXTURE_SIZE as f32;

            if (x / CHECKER + y / CHECKER) % 2 == 0 {
                base_color.extend([0x6B, 0x70, 0x5C, 0xFF]);
            } else {
                base_color.extend([0x85, 0x8A, 0x74, 0xFF]);
            }

            let ao = 0.2 + 0.8 * (PI * v).sin();
            let rough = 0.3 + 0.6 * u;
            etc.extend([unorm(ao), unorm(rough), 0x20, 0xFF]);
        }
    }

    Ok(PbrMaterial {
        base_color: Texture::new(Some("preview base color".into()), base_color, size)?,
        etc: Texture::new(Some("preview etc".into()), etc, size)?,
        normal: Texture::solid("preview normal", [0x80, 0x80, 0x00, 0xFF]),
        part,
    })
}

fn unorm(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Fragment attributes where a ray from the origin first meets the sphere.
pub fn hit_sphere(ray: Vec3) -> Option<FragmentInput> {
    let b = ray.dot(SPHERE_CENTER);
    let discriminant = b * b - SPHERE_CENTER.length_squared() + SPHERE_RADIUS * SPHERE_RADIUS;
    if discriminant < 0.0 {
        return None;
    }
    let t = b - discriminant.sqrt();
    if t <= 0.0 {
        return None;
    }

    let position = ray * t;
    let normal = (position - SPHERE_CENTER) / SPHERE_RADIUS;
    let uv = Vec2::new(0.5 + normal.x.atan2(normal.z) / TAU, 0.5 - normal.y.asin() / PI);
    // Directions of increasing u and v.
    let tangent = Vec3::new(normal.z, 0.0, -normal.x).normalize_or_zero();
    let bitangent = tangent.cross(normal);

    Some(FragmentInput {
        position,
        normal,
        uv,
        tangent,
        bitangent,
    })
}

pub fn render_sphere(size: u32, material: &PbrMaterial, light_direction: Vec3) -> RgbImage {
    profiling::scope!("render_sphere");

    let sampler = Sampler::default();
    let params = ShadingParams {
        light_direction,
        part: material.part,
    };
    let half_height = (FOVY_DEGREES.to_radians() * 0.5).tan();
    let extent = size as f32;

    RgbImage::from_fn(size, size, |x, y| {
        let ndc = Vec2::new(
            (x as f32 + 0.5) / extent * 2.0 - 1.0,
            1.0 - (y as f32 + 0.5) / extent * 2.0,
        );
        let ray = Vec3::new(ndc.x * half_height, ndc.y * half_height, -1.0).normalize();
        match hit_sphere(ray) {
            Some(input) => {
                let sample = material.sample(input.uv, &sampler);
                let color = shade(&input, &sample, &params);
                Rgb([unorm(color.x), unorm(color.y), unorm(color.z)])
            }
            None => Rgb(BACKGROUND),
        }
    })
}

const HELP: &str = "\
shade-preview

Renders a shaded sphere with procedural textures to an image file.

usage: rigview-demos shade-preview --options

Meta:
  --help            This menu.

Output:
  --out <path>      Image to write. Default 'shade-preview.png'.
  --size <pixels>   Width and height of the image. Default 256.

Shading:
  --part <name|id>  Part the material belongs to ('body', 'turret', 'inner-wheel',
                    'outer-wheel', 'barrel', 'shell', 'hand' or a number).
                    Default 'inner-wheel'.
  --light <x,y,z>   Direction the light travels in. Default -1,-1,-1.
";

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    pub out: PathBuf,
    pub size: u32,
    pub part: PartId,
    pub light: Vec3,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            out: PathBuf::from("shade-preview.png"),
            size: 256,
            part: PartId::INNER_WHEEL,
            light: Vec3::splat(-1.0),
        }
    }
}

fn extract_part(value: &str) -> Result<PartId, &'static str> {
    part_from_name(value).ok_or("Unknown part")
}

impl PreviewOptions {
    pub fn from_args(mut args: Arguments) -> Self {
        let help = args.contains(["-h", "--help"]);

        let mut options = Self::default();
        if let Some(out) = option_arg(args.opt_value_from_str("--out"), HELP) {
            options.out = out;
        }
        if let Some(size) = option_arg(args.opt_value_from_str("--size"), HELP) {
            options.size = size;
        }
        if let Some(part) = option_arg(args.opt_value_from_fn("--part", extract_part), HELP) {
            options.part = part;
        }
        if let Some(light) = option_arg(args.opt_value_from_fn("--light", extract_vec3), HELP) {
            options.light = light;
        }

        finish(args, help, HELP);

        options
    }
}

pub fn run(options: PreviewOptions) -> anyhow::Result<()> {
    if options.size == 0 {
        anyhow::bail!("--size must be at least one pixel");
    }

    let material = procedural_material(options.part)?;
    let image = render_sphere(options.size, &material, options.light);
    image
        .save(&options.out)
        .with_context(|| format!("Failed to write {}", options.out.display()))?;

    log::info!(
        "Wrote {}x{} preview of part {} to {}",
        options.size,
        options.size,
        options.part.0,
        options.out.display()
    );
    Ok(())
}

pub fn main() {
    env_logger::init();
    let options = PreviewOptions::from_args(demo_args());
    exit_on_error(run(options));
}
