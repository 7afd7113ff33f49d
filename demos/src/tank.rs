use std::{future::Future, path::PathBuf, pin::Pin};

use anyhow::{bail, Context};
use glam::Vec3;
use pico_args::Arguments;
use rigview::{
    scene::{TankScene, SHELL_MESH},
    tank::{TankCommand, TANK_PARTS},
    types::{DirectionalLight, Mesh, PartId, Texture},
};
use rigview_framework::{start, App, AssetLoader, InputScript, LogSink, RedrawContext, StartOptions};
use rigview_routine::{pbr::PbrMaterial, shaders::ShaderConfig, uniforms::FrameUniforms};

use crate::{
    cli::{demo_args, exit_on_error, extract_vec3, finish, option_arg},
    pipelines::Pipelines,
};

pub const TANK_MODEL: &str = "models/tank.glb";
pub const SHELL_MODEL: &str = "models/shell.glb";

struct TextureSet {
    color: &'static str,
    etc: &'static str,
    normal: &'static str,
}

const TANK_TEXTURES: TextureSet = TextureSet {
    color: "textures/tank-color.jpeg",
    etc: "textures/tank-etc.png",
    normal: "textures/tank-normal.png",
};

const SHELL_TEXTURES: TextureSet = TextureSet {
    color: "textures/shell-color.png",
    etc: "textures/shell-etc.png",
    normal: "textures/shell-normal.png",
};

/// Meshes and materials indexed by mesh slot: the tank parts in
/// [`TANK_PARTS`] order, then the shell.
pub struct TankAssets {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<PbrMaterial>,
}

impl TankAssets {
    pub async fn load(loader: &AssetLoader) -> anyhow::Result<Self> {
        let tank = load_meshes(loader, TANK_MODEL).await?;
        if tank.len() < TANK_PARTS.len() {
            bail!(
                "{TANK_MODEL} has {} meshes, the tank is made of {}",
                tank.len(),
                TANK_PARTS.len()
            );
        }
        if tank.len() > TANK_PARTS.len() {
            log::warn!(
                "Ignoring {} extra meshes in {TANK_MODEL}",
                tank.len() - TANK_PARTS.len()
            );
        }

        let shell = load_meshes(loader, SHELL_MODEL).await?;
        if shell.len() > 1 {
            log::warn!("Only the first of {} meshes in {SHELL_MODEL} is used", shell.len());
        }

        let tank_material = load_material(loader, &TANK_TEXTURES, PartId::BODY).await?;
        let shell_material = load_material(loader, &SHELL_TEXTURES, PartId::SHELL).await?;

        let mut meshes: Vec<Mesh> = tank.into_iter().take(TANK_PARTS.len()).collect();
        meshes.extend(shell.into_iter().next());

        // Every tank part shares one texture set, the part id picks the variant.
        let mut materials: Vec<PbrMaterial> = TANK_PARTS
            .iter()
            .map(|&part| PbrMaterial {
                part,
                ..tank_material.clone()
            })
            .collect();
        materials.push(shell_material);

        Ok(Self { meshes, materials })
    }

    fn check_draw(&self, mesh: usize, part: PartId) -> anyhow::Result<()> {
        if mesh >= self.meshes.len() {
            bail!("Part {} uses mesh slot {mesh}, only {} are loaded", part.0, self.meshes.len());
        }
        let material = self
            .materials
            .get(mesh)
            .with_context(|| format!("Mesh slot {mesh} has no material"))?;
        if material.part != part {
            bail!(
                "Mesh slot {mesh} is shaded as part {} but drawn as part {}",
                material.part.0,
                part.0
            );
        }
        Ok(())
    }
}

async fn load_meshes(loader: &AssetLoader, path: &str) -> anyhow::Result<Vec<Mesh>> {
    let data = loader.get_asset(path).await?;
    rigview_gltf::load_meshes(&data).with_context(|| format!("Failed to load meshes from {path}"))
}

async fn load_texture(loader: &AssetLoader, path: &str) -> anyhow::Result<Texture> {
    let data = loader.get_asset(path).await?;
    rigview_gltf::load_texture(&data, path).with_context(|| format!("Failed to load texture {path}"))
}

async fn load_material(loader: &AssetLoader, set: &TextureSet, part: PartId) -> anyhow::Result<PbrMaterial> {
    Ok(PbrMaterial {
        base_color: load_texture(loader, set.color).await?,
        etc: load_texture(loader, set.etc).await?,
        normal: load_texture(loader, set.normal).await?,
        part,
    })
}

pub struct TankDemo {
    scene: TankScene,
    assets: Option<TankAssets>,
    pipelines: Option<Pipelines>,
}

impl TankDemo {
    pub fn new(light: Vec3) -> Self {
        let mut scene = TankScene::default();
        scene.light = DirectionalLight { direction: light };
        Self {
            scene,
            assets: None,
            pipelines: None,
        }
    }

    /// Uses already loaded assets instead of reading them in setup.
    pub fn with_assets(light: Vec3, assets: TankAssets) -> Self {
        Self {
            assets: Some(assets),
            ..Self::new(light)
        }
    }

    pub fn scene(&self) -> &TankScene {
        &self.scene
    }
}

impl App for TankDemo {
    type Command = TankCommand;

    fn setup<'a>(&'a mut self, loader: &'a AssetLoader) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>> {
        Box::pin(async move {
            if self.assets.is_none() {
                self.assets = Some(TankAssets::load(loader).await?);
            }
            if let Some(assets) = &self.assets {
                log::info!(
                    "Tank assets ready: {} meshes, {} materials",
                    assets.meshes.len(),
                    assets.materials.len()
                );
            }
            self.pipelines = Some(Pipelines::new(&ShaderConfig::default())?);
            Ok(())
        })
    }

    fn handle_command(&mut self, command: TankCommand) -> anyhow::Result<()> {
        self.scene.apply(command)?;
        Ok(())
    }

    fn tick(&mut self) {
        self.scene.tick();
    }

    fn handle_redraw(&mut self, context: RedrawContext) -> anyhow::Result<FrameUniforms> {
        let assets = self.assets.as_ref().context("Redraw before the tank assets were loaded")?;
        let pipelines = self.pipelines.as_ref().context("Redraw before the pipelines were built")?;

        let frame = self.scene.frame(context.aspect)?;
        for part in &frame.parts {
            assets.check_draw(part.mesh, part.part)?;
        }
        log::trace!(
            "frame {}: {} parts, {} shells, {} line vertices",
            context.frame,
            frame.parts.len(),
            frame.parts.iter().filter(|p| p.mesh == SHELL_MESH).count(),
            pipelines.grid.len() + pipelines.local_axes.len() * frame.parts.len()
        );

        Ok(FrameUniforms::from_frame(&frame))
    }
}

const HELP: &str = "\
tank

Drives the tank rig and fires shells from a scripted key sequence.

usage: rigview-demos tank --options

Meta:
  --help            This menu.

Assets:
  --assets <dir>    Directory holding models/ and textures/. Default 'assets'.

Simulation:
  --frames <n>      Number of frames to run. Default 600.
  --script <keys>   Comma separated key names, each optionally prefixed by a frame
                    number ('up, up, 30:space, p'). Keys: up, down, left, right
                    (drive), a, d (turret), w, s (barrel), space (fire), p (pause).
  --light <x,y,z>   Direction the light travels in. Default -1,5,5.
  --aspect <ratio>  Output width over height. Default 1.333.
";

#[derive(Debug, Clone, PartialEq)]
pub struct TankOptions {
    pub assets: PathBuf,
    pub frames: u64,
    pub script: String,
    pub light: Vec3,
    pub aspect: f32,
}

impl Default for TankOptions {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("assets"),
            frames: 600,
            script: String::new(),
            light: DirectionalLight::default().direction,
            aspect: 4.0 / 3.0,
        }
    }
}

impl TankOptions {
    pub fn from_args(mut args: Arguments) -> Self {
        // Meta
        let help = args.contains(["-h", "--help"]);

        let mut options = Self::default();

        // Assets
        if let Some(assets) = option_arg(args.opt_value_from_str("--assets"), HELP) {
            options.assets = assets;
        }

        // Simulation
        if let Some(frames) = option_arg(args.opt_value_from_str("--frames"), HELP) {
            options.frames = frames;
        }
        if let Some(script) = option_arg(args.opt_value_from_str("--script"), HELP) {
            options.script = script;
        }
        if let Some(light) = option_arg(args.opt_value_from_fn("--light", extract_vec3), HELP) {
            options.light = light;
        }
        if let Some(aspect) = option_arg(args.opt_value_from_str("--aspect"), HELP) {
            options.aspect = aspect;
        }

        finish(args, help, HELP);

        options
    }
}

pub fn run(options: TankOptions) -> anyhow::Result<()> {
    let script = InputScript::parse(&options.script, TankCommand::from_key).context("Invalid --script")?;

    let mut demo = TankDemo::new(options.light);
    let loader = AssetLoader::new_local(&options.assets);
    start(
        &mut demo,
        &loader,
        StartOptions {
            frames: options.frames,
            aspect: options.aspect,
            script,
        },
        &mut LogSink,
    )?;

    log::info!(
        "Finished with the tank at {} and {} shells in flight",
        demo.scene().state.position,
        demo.scene().projectiles.alive().count()
    );
    Ok(())
}

pub fn main() {
    let options = TankOptions::from_args(demo_args());
    exit_on_error(run(options));
}
