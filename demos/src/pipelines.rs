use anyhow::Context;
use rigview_routine::{
    shaders::{ShaderConfig, ShaderPreProcessor, LINES, PBR_FRAGMENT, PBR_VERTEX},
    uniforms::{axes, grid_and_axes, LineVertex},
};

/// Length of the axes drawn at a part's origin.
pub const LOCAL_AXES_LENGTH: f32 = 0.5;

/// Shader sources and static line geometry shared by the demos. Built once
/// during setup.
pub struct Pipelines {
    pub pbr_vertex: String,
    pub pbr_fragment: String,
    pub lines: String,
    /// World grid and axes, drawn without a model matrix.
    pub grid: Vec<LineVertex>,
    /// Drawn with a part's model matrix.
    pub local_axes: Vec<LineVertex>,
}

impl Pipelines {
    pub fn new(config: &ShaderConfig) -> anyhow::Result<Self> {
        profiling::scope!("Pipelines::new");

        let spp = ShaderPreProcessor::new();
        let render = |name: &str| {
            spp.render_shader(name, config)
                .with_context(|| format!("Failed to render shader {name}"))
        };

        let pipelines = Self {
            pbr_vertex: render(PBR_VERTEX)?,
            pbr_fragment: render(PBR_FRAGMENT)?,
            lines: render(LINES)?,
            grid: grid_and_axes(),
            local_axes: axes(LOCAL_AXES_LENGTH),
        };
        log::debug!(
            "Rendered shaders: {} + {} + {} bytes, {} grid vertices",
            pipelines.pbr_vertex.len(),
            pipelines.pbr_fragment.len(),
            pipelines.lines.len(),
            pipelines.grid.len()
        );
        Ok(pipelines)
    }
}
