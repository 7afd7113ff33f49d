use std::{future::Future, pin::Pin};

use anyhow::Context;
use glam::Vec3;
use pico_args::Arguments;
use rigview::{
    hand::JointControl,
    scene::HandScene,
    types::{shapes, DirectionalLight, Mesh, PartId},
};
use rigview_framework::{start, App, AssetLoader, InputScript, LogSink, RedrawContext, StartOptions};
use rigview_routine::{
    pbr::{PbrMaterial, HAND_GRAY},
    shaders::ShaderConfig,
    uniforms::FrameUniforms,
};

use crate::{
    cli::{demo_args, exit_on_error, extract_vec3, finish, option_arg},
    pipelines::Pipelines,
};

pub const CYLINDER_RADIUS: f32 = 1.0;
pub const CYLINDER_HEIGHT: f32 = 2.0;
pub const CYLINDER_SEGMENTS: u32 = 16;

/// A slider moved to a value, in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct JointAssignment {
    pub control: JointControl,
    pub degrees: f32,
}

impl JointAssignment {
    /// Parses `name=degrees`, e.g. `index-joint1=30`.
    pub fn parse(token: &str) -> Option<Self> {
        let (name, degrees) = token.split_once('=')?;
        Some(Self {
            control: JointControl::from_name(name.trim())?,
            degrees: degrees.trim().parse().ok()?,
        })
    }
}

pub struct HandDemo {
    scene: HandScene,
    material: PbrMaterial,
    mesh: Option<Mesh>,
    pipelines: Option<Pipelines>,
}

impl HandDemo {
    pub fn new(light: Option<Vec3>) -> anyhow::Result<Self> {
        let mut scene = HandScene::new()?;
        if let Some(direction) = light {
            scene.light = DirectionalLight { direction };
        }
        Ok(Self {
            scene,
            material: PbrMaterial::solid(PartId::HAND, HAND_GRAY),
            mesh: None,
            pipelines: None,
        })
    }

    pub fn scene(&self) -> &HandScene {
        &self.scene
    }
}

impl App for HandDemo {
    type Command = JointAssignment;

    fn setup<'a>(&'a mut self, _loader: &'a AssetLoader) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>> {
        Box::pin(async move {
            let mesh = shapes::cylinder(CYLINDER_RADIUS, CYLINDER_HEIGHT, CYLINDER_SEGMENTS)
                .context("Failed to build the hand segment cylinder")?;
            log::info!(
                "Hand ready: {} segments sharing a {} triangle cylinder",
                self.scene.rig.segments().len(),
                mesh.triangle_count()
            );
            self.mesh = Some(mesh);
            self.pipelines = Some(Pipelines::new(&ShaderConfig::default())?);
            Ok(())
        })
    }

    fn handle_command(&mut self, command: JointAssignment) -> anyhow::Result<()> {
        let applied = self.scene.apply(command.control, command.degrees)?;
        log::info!("{} = {applied}", command.control.name());
        Ok(())
    }

    fn handle_redraw(&mut self, context: RedrawContext) -> anyhow::Result<FrameUniforms> {
        let mesh = self.mesh.as_ref().context("Redraw before the hand mesh was built")?;
        let pipelines = self.pipelines.as_ref().context("Redraw before the pipelines were built")?;

        let frame = self.scene.frame(context.aspect)?;
        if let Some(part) = frame.parts.iter().find(|p| p.part != self.material.part || p.mesh != 0) {
            anyhow::bail!("Hand segment drawn as part {} with mesh slot {}", part.part.0, part.mesh);
        }
        log::trace!(
            "frame {}: {} segments, {} vertices each, {} line vertices",
            context.frame,
            frame.parts.len(),
            mesh.vertex_count(),
            pipelines.grid.len()
        );

        Ok(FrameUniforms::from_frame(&frame))
    }
}

const HELP: &str = "\
hand

Poses the articulated hand from scripted slider values.

usage: rigview-demos hand --options

Meta:
  --help            This menu.

Simulation:
  --frames <n>      Number of frames to run. Default 120.
  --script <sets>   Comma separated control=degrees assignments, each optionally
                    prefixed by a frame number ('index-joint1=30, 10:fingers=5').
                    Values are clamped to the control's range.
  --light <x,y,z>   Direction the light travels in. Default -5,-10,0.
  --aspect <ratio>  Output width over height. Default 1.333.

Controls:
  wrist-twist (0..360), wrist-bend (-45..45), thumb-joint1, thumb-joint2,
  thumb-middle, {index,middle,ring,small}-joint{1,2,3} (0..45), fingers (0..10).
";

#[derive(Debug, Clone, PartialEq)]
pub struct HandOptions {
    pub frames: u64,
    pub script: String,
    pub light: Option<Vec3>,
    pub aspect: f32,
}

impl Default for HandOptions {
    fn default() -> Self {
        Self {
            frames: 120,
            script: String::new(),
            light: None,
            aspect: 4.0 / 3.0,
        }
    }
}

impl HandOptions {
    pub fn from_args(mut args: Arguments) -> Self {
        let help = args.contains(["-h", "--help"]);

        let mut options = Self::default();
        if let Some(frames) = option_arg(args.opt_value_from_str("--frames"), HELP) {
            options.frames = frames;
        }
        if let Some(script) = option_arg(args.opt_value_from_str("--script"), HELP) {
            options.script = script;
        }
        options.light = option_arg(args.opt_value_from_fn("--light", extract_vec3), HELP);
        if let Some(aspect) = option_arg(args.opt_value_from_str("--aspect"), HELP) {
            options.aspect = aspect;
        }

        finish(args, help, HELP);

        options
    }
}

pub fn run(options: HandOptions) -> anyhow::Result<()> {
    let script = InputScript::parse(&options.script, JointAssignment::parse).context("Invalid --script")?;

    let mut demo = HandDemo::new(options.light)?;
    // Everything is procedural.
    let loader = AssetLoader::new_local(".");
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

    log::info!("Finished with thumb rotation {}", demo.scene().rig.thumb_rotation());
    Ok(())
}

pub fn main() {
    let options = HandOptions::from_args(demo_args());
    exit_on_error(run(options));
}
