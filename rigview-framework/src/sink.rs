use rigview_routine::uniforms::FrameUniforms;

/// Consumer of finished frames: the stand in for surface presentation.
pub trait FrameSink {
    fn submit(&mut self, frame: u64, uniforms: &FrameUniforms) -> anyhow::Result<()>;
}

/// Logs a summary of every frame at debug level.
#[derive(Debug, Default)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn submit(&mut self, frame: u64, uniforms: &FrameUniforms) -> anyhow::Result<()> {
        log::debug!(
            "frame {frame}: {} parts, {} bytes of part uniforms, light {}",
            uniforms.parts.len(),
            uniforms.part_bytes().len(),
            uniforms.scene.light_direction
        );
        for draw in &uniforms.parts {
            log::trace!("  part {} mesh {} at {}", draw.part.0, draw.mesh, draw.uniforms.model.w_axis);
        }
        Ok(())
    }
}

/// Keeps every submitted frame.
#[derive(Debug, Default)]
pub struct CaptureSink {
    pub frames: Vec<(u64, FrameUniforms)>,
}

impl FrameSink for CaptureSink {
    fn submit(&mut self, frame: u64, uniforms: &FrameUniforms) -> anyhow::Result<()> {
        self.frames.push((frame, uniforms.clone()));
        Ok(())
    }
}
