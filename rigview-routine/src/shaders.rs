//! Holds the shader processing infrastructure for all shaders.
//!
//! Shaders are WGSL templates embedded from `shaders/` and registered as
//! `rigview/<file>`. They are rendered with handlebars before use: the
//! `include` helper pastes another registered file once per render, and the
//! [`ShaderConfig`] fields are available as template values.

use std::collections::{HashMap, HashSet};

use handlebars::{Context, Handlebars, Helper, HelperDef, Output, RenderContext, RenderError};
use parking_lot::Mutex;
use rigview::types::PartId;
use rust_embed::RustEmbed;
use serde::Serialize;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/shaders"]
struct RigviewShaderSources;

/// Vertex stage of the lit part pipeline.
pub const PBR_VERTEX: &str = "rigview/pbr.vert.wgsl";
/// Fragment stage of the lit part pipeline.
pub const PBR_FRAGMENT: &str = "rigview/pbr.frag.wgsl";
/// Both stages of the grid and axes line pipeline.
pub const LINES: &str = "rigview/lines.wgsl";

/// Values substituted into the shader templates.
#[derive(Debug, Serialize)]
pub struct ShaderConfig {
    /// Part identifier that gets the rusted inner wheel material.
    pub inner_wheel_part: u32,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            inner_wheel_part: PartId::INNER_WHEEL.0,
        }
    }
}

pub struct ShaderPreProcessor {
    files: HashMap<String, String>,
}

impl ShaderPreProcessor {
    pub fn new() -> Self {
        let mut v = Self { files: HashMap::new() };
        v.add_shaders_embed::<RigviewShaderSources>("rigview");
        v
    }

    pub fn add_shaders_embed<T: RustEmbed>(&mut self, prefix: &str) {
        for file in T::iter() {
            let Some(embedded) = T::get(&file) else {
                continue;
            };
            let contents = String::from_utf8_lossy(&embedded.data).into_owned();
            self.files.insert(format!("{prefix}/{file}"), contents);
        }
    }

    pub fn add_shader(&mut self, name: &str, contents: &str) {
        self.files.insert(name.to_owned(), contents.to_owned());
    }

    pub fn files(&self) -> std::collections::hash_map::Keys<'_, String, String> {
        self.files.keys()
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.files.get(name)
    }

    pub fn render_shader<T>(&self, base: &str, config: &T) -> Result<String, RenderError>
    where
        T: Serialize,
    {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.set_dev_mode(cfg!(debug_assertions));
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper("include", Box::new(ShaderIncluder::new(base, &self.files)));
        let contents = self.files.get(base).ok_or_else(|| {
            RenderError::new(format!(
                "Base shader {base} is not registered. All registered shaders: {}",
                registered_shader_string(&self.files)
            ))
        })?;

        log::debug!("Rendering shader {base}");
        registry.render_template(contents, config)
    }
}

impl Default for ShaderPreProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn registered_shader_string(files: &HashMap<String, String>) -> String {
    let mut v: Vec<_> = files.keys().cloned().collect();
    v.sort_unstable();
    v.join(", ")
}

struct ShaderIncluder<'a> {
    files: &'a HashMap<String, String>,
    include_state: Mutex<HashSet<String>>,
}
impl<'a> ShaderIncluder<'a> {
    fn new(base: &str, files: &'a HashMap<String, String>) -> Self {
        Self {
            files,
            include_state: Mutex::new({
                let mut set = HashSet::new();
                set.insert(base.to_owned());
                set
            }),
        }
    }
}
impl<'a> HelperDef for ShaderIncluder<'a> {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> handlebars::HelperResult {
        let file_name_value = h
            .param(0)
            .ok_or_else(|| RenderError::new("include helper must have a single argument for the include path"))?
            .value();
        let file_name = match file_name_value {
            handlebars::JsonValue::String(s) => s,
            _ => return Err(RenderError::new("include helper's first argument must be a string")),
        };

        // Released before rendering, the included file may include again.
        {
            let mut include_status = self.include_state.lock();
            if !include_status.insert(file_name.clone()) {
                return Ok(());
            }
        }

        let contents = self.files.get(file_name).ok_or_else(|| {
            RenderError::new(format!(
                "Included file \"{file_name}\" is not registered. All registered files: {}",
                registered_shader_string(self.files)
            ))
        })?;

        out.write(&r.render_template(contents, ctx.data())?)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_include() {
        let mut pp = ShaderPreProcessor::new();
        pp.add_shader("simple", "{{include \"other\"}} simple");
        pp.add_shader("other", "other");
        let output = pp.render_shader("simple", &ShaderConfig::default()).unwrap();

        assert_eq!(output, "other simple");
    }

    #[test]
    fn recursive_include() {
        let mut pp = ShaderPreProcessor::new();
        pp.add_shader("simple", "{{include \"other\"}} simple");
        pp.add_shader("other", "{{include \"simple\"}} other");
        let output = pp.render_shader("simple", &ShaderConfig::default()).unwrap();

        assert_eq!(output, " other simple");
    }

    #[test]
    fn repeated_include_is_pasted_once() {
        let mut pp = ShaderPreProcessor::new();
        pp.add_shader("simple", "{{include \"other\"}}{{include \"other\"}} simple");
        pp.add_shader("other", "other");
        let output = pp.render_shader("simple", &ShaderConfig::default()).unwrap();

        assert_eq!(output, "other simple");
    }

    #[test]
    fn error_include() {
        let mut pp = ShaderPreProcessor::new();
        pp.add_shader("simple", "{{include \"other\"}} simple");
        let output = pp.render_shader("simple", &ShaderConfig::default());

        assert!(output.is_err(), "Expected error, got {output:?}");
    }

    #[test]
    fn no_arg_include() {
        let mut pp = ShaderPreProcessor::new();
        pp.add_shader("simple", "{{include}} simple");
        let output = pp.render_shader("simple", &ShaderConfig::default());

        assert!(output.is_err(), "Expected error, got {output:?}");
    }

    #[test]
    fn missing_base() {
        let pp = ShaderPreProcessor::new();
        assert!(pp.render_shader("rigview/missing.wgsl", &ShaderConfig::default()).is_err());
    }

    #[test]
    fn config_is_substituted() {
        let config = serde_json::json!({ "inner_wheel_part": 7 });
        let output = ShaderPreProcessor::new().render_shader(PBR_FRAGMENT, &config).unwrap();
        assert!(output.contains("INNER_WHEEL_PART: u32 = 7u;"), "{output}");
        assert!(!output.contains("{{"));
    }

    #[test]
    fn embedded_shaders_validate() {
        let pp = ShaderPreProcessor::new();
        assert!(pp.files().any(|f| f == "rigview/brdf.wgsl"));

        for base in [PBR_VERTEX, PBR_FRAGMENT, LINES] {
            let source = pp.render_shader(base, &ShaderConfig::default()).unwrap();
            let module = match naga::front::wgsl::parse_str(&source) {
                Ok(module) => module,
                Err(e) => panic!("{base} failed to parse:\n{}", e.emit_to_string(&source)),
            };
            let mut validator =
                naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all());
            if let Err(e) = validator.validate(&module) {
                panic!("{base} failed to validate: {e:?}");
            }
        }
    }
}
