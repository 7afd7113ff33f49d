//! Shading for rigview.
//!
//! Contains the CPU shading model in [`pbr`], which the software previewer
//! uses and which mirrors the WGSL fragment shader, along with the uniform
//! layouts and shader templates a GPU renderer needs.
//!
//! Shaders are templates and must go through [`shaders::ShaderPreProcessor`]
//! before being handed to a WGSL compiler.

pub mod pbr;
pub mod sampler;
pub mod shaders;
pub mod uniforms;

pub use rigview;
