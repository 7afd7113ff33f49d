//! Application harness for rigview demos.
//!
//! [`start`] installs the logger, waits for [`App::setup`] to resolve every
//! asset, then runs a fixed number of frames at a fixed timestep. Input comes
//! from an [`InputScript`] and finished frames go to a [`FrameSink`].

use std::{fmt::Debug, future::Future, pin::Pin};

use anyhow::Context;
use rigview_routine::uniforms::FrameUniforms;

mod assets;
mod script;
mod sink;

pub use assets::*;
pub use rigview_routine::rigview::projectile::TIMESTEP;
pub use script::*;
pub use sink::*;

/// Counts frames of [`TIMESTEP`] seconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct FrameClock {
    frame: u64,
}

impl FrameClock {
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds at the start of the current frame.
    pub fn elapsed(&self) -> f32 {
        self.frame as f32 * TIMESTEP
    }

    /// Moves to the next frame, returning the one that just started.
    pub fn advance(&mut self) -> u64 {
        let frame = self.frame;
        self.frame += 1;
        frame
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RedrawContext {
    pub frame: u64,
    /// Seconds since the first frame.
    pub elapsed: f32,
    /// Width over height of the output.
    pub aspect: f32,
}

pub trait App {
    type Command: Debug;

    fn register_logger(&mut self) {
        // Already installed when several apps run in one process.
        let _ = env_logger::try_init();
    }

    /// Loads everything the app needs. The frame loop doesn't start until
    /// this resolves, and an error here ends the program.
    fn setup<'a>(&'a mut self, loader: &'a AssetLoader) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>> {
        let _ = loader;
        Box::pin(async { Ok(()) })
    }

    fn handle_command(&mut self, command: Self::Command) -> anyhow::Result<()>;

    /// Advances the simulation by one [`TIMESTEP`]. Called every frame after
    /// that frame's commands.
    fn tick(&mut self) {}

    fn handle_redraw(&mut self, context: RedrawContext) -> anyhow::Result<FrameUniforms>;
}

pub struct StartOptions<C> {
    pub frames: u64,
    pub aspect: f32,
    pub script: InputScript<C>,
}

impl<C> Default for StartOptions<C> {
    fn default() -> Self {
        Self {
            frames: 1,
            aspect: 4.0 / 3.0,
            script: InputScript::default(),
        }
    }
}

pub fn start<A: App>(
    app: &mut A,
    loader: &AssetLoader,
    options: StartOptions<A::Command>,
    sink: &mut dyn FrameSink,
) -> anyhow::Result<()> {
    app.register_logger();

    {
        profiling::scope!("setup");
        pollster::block_on(app.setup(loader)).context("Application setup failed")?;
    }

    let StartOptions {
        frames,
        aspect,
        mut script,
    } = options;
    log::info!("Setup complete, running {frames} frames");

    let mut clock = FrameClock::default();
    while clock.frame() < frames {
        profiling::scope!("frame");

        let elapsed = clock.elapsed();
        let frame = clock.advance();
        for command in script.take_due(frame) {
            log::debug!("frame {frame}: {command:?}");
            app.handle_command(command)
                .with_context(|| format!("Command on frame {frame} failed"))?;
        }

        app.tick();

        let uniforms = app
            .handle_redraw(RedrawContext { frame, elapsed, aspect })
            .with_context(|| format!("Redraw of frame {frame} failed"))?;
        sink.submit(frame, &uniforms)?;

        profiling::finish_frame!();
    }

    if !script.is_empty() {
        log::warn!("{} scripted commands were scheduled after the last frame", script.len());
    }
    Ok(())
}
