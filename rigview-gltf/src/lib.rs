//! gltf mesh and texture loading for rigview.
//!
//! Meshes come out in the depth first order of the default scene's node
//! tree, one [`Mesh`] per triangle primitive, with tangent frames computed.
//! Materials, cameras and animations in the file are ignored.

use glam::UVec2;
use gltf::mesh::util::ReadIndices;
use rigview::types::{Handedness, Indices, Mesh, MeshValidationError, RawMeshData, Texture, TextureError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GltfLoadError {
    #[error("Gltf parsing or validation error")]
    Gltf(#[from] gltf::Error),
    #[error("Gltf file contains no triangle meshes")]
    NoMeshes,
    #[error("Primitive {primitive} of mesh {mesh:?} has no positions")]
    MissingPositions { mesh: String, primitive: usize },
    #[error("Primitive {primitive} of mesh {mesh:?} failed validation")]
    Mesh {
        mesh: String,
        primitive: usize,
        #[source]
        source: MeshValidationError,
    },
}

#[derive(Debug, Error)]
pub enum TextureLoadError {
    #[error("Texture {label:?} failed to decode")]
    Decode {
        label: String,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Loads every triangle primitive reachable from the default scene (or the
/// first scene when none is marked default) of a gltf or glb file.
pub fn load_meshes(data: &[u8]) -> Result<Vec<Mesh>, GltfLoadError> {
    profiling::scope!("load_meshes");

    let (document, buffers, _images) = gltf::import_slice(data)?;

    let mut nodes: Vec<gltf::Node<'_>> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => Vec::new(),
    };
    // Depth first, children in file order.
    nodes.reverse();

    let mut meshes = Vec::new();
    while let Some(node) = nodes.pop() {
        if let Some(mesh) = node.mesh() {
            load_mesh(&mesh, &buffers, &mut meshes)?;
        }
        let mut children: Vec<_> = node.children().collect();
        children.reverse();
        nodes.extend(children);
    }

    if meshes.is_empty() {
        return Err(GltfLoadError::NoMeshes);
    }

    log::info!("Loaded {} meshes", meshes.len());
    Ok(meshes)
}

fn load_mesh(mesh: &gltf::Mesh<'_>, buffers: &[gltf::buffer::Data], out: &mut Vec<Mesh>) -> Result<(), GltfLoadError> {
    let name = mesh.name().map_or_else(|| format!("#{}", mesh.index()), str::to_owned);

    for (primitive_index, primitive) in mesh.primitives().enumerate() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping primitive {primitive_index} of mesh {name:?}: {:?} is not a triangle list",
                primitive.mode()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

        let positions = reader
            .read_positions()
            .ok_or_else(|| GltfLoadError::MissingPositions {
                mesh: name.clone(),
                primitive: primitive_index,
            })?
            .flatten()
            .collect();
        let normals = reader.read_normals().map(|normals| normals.flatten().collect());
        let uvs = reader
            .read_tex_coords(0)
            .map(|uvs| uvs.into_f32().flatten().collect());
        let indices = reader.read_indices().map(|indices| match indices {
            ReadIndices::U8(iter) => Indices::U8(iter.collect()),
            ReadIndices::U16(iter) => Indices::U16(iter.collect()),
            ReadIndices::U32(iter) => Indices::U32(iter.collect()),
        });

        let raw = RawMeshData {
            positions,
            normals,
            uvs,
            indices,
        };
        let mesh = raw
            .into_mesh(Handedness::Right)
            .map_err(|source| GltfLoadError::Mesh {
                mesh: name.clone(),
                primitive: primitive_index,
                source,
            })?;
        log::debug!(
            "Mesh {name:?} primitive {primitive_index}: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        out.push(mesh);
    }

    Ok(())
}

/// Decodes a png or jpeg into rgba8. Channels are kept as stored, color
/// space conversion is up to the shader.
pub fn load_texture(data: &[u8], label: &str) -> Result<Texture, TextureLoadError> {
    profiling::scope!("load_texture");

    let image = image::load_from_memory(data)
        .map_err(|source| TextureLoadError::Decode {
            label: label.to_owned(),
            source,
        })?
        .into_rgba8();
    let size = UVec2::new(image.width(), image.height());
    log::debug!("Decoded texture {label:?} at {size}");
    Ok(Texture::new(Some(label.to_owned()), image.into_raw(), size)?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use glam::{Vec2, Vec3};

    use super::*;

    fn le_bytes(floats: &[f32]) -> Vec<u8> {
        floats.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// A node with a textured, indexed triangle whose child holds a bare
    /// triangle with only positions.
    fn two_triangles() -> Vec<u8> {
        let mut buffer = le_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        buffer.extend(le_bytes(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]));
        buffer.extend([0u16, 1, 2].iter().flat_map(|i| i.to_le_bytes()));
        let uri = format!("data:application/octet-stream;base64,{}", base64::encode(&buffer));

        format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                "scene": 0,
                "scenes": [{{ "nodes": [0] }}],
                "nodes": [{{ "mesh": 0, "children": [1] }}, {{ "mesh": 1 }}],
                "meshes": [
                    {{ "name": "textured", "primitives": [{{ "attributes": {{ "POSITION": 0, "TEXCOORD_0": 1 }}, "indices": 2 }}] }},
                    {{ "name": "bare", "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}
                ],
                "buffers": [{{ "byteLength": {len}, "uri": "{uri}" }}],
                "bufferViews": [
                    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                    {{ "buffer": 0, "byteOffset": 36, "byteLength": 24 }},
                    {{ "buffer": 0, "byteOffset": 60, "byteLength": 6 }}
                ],
                "accessors": [
                    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
                    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }},
                    {{ "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }}
                ]
            }}"#,
            len = buffer.len(),
        )
        .into_bytes()
    }

    #[test]
    fn loads_meshes_depth_first() {
        let meshes = load_meshes(&two_triangles()).unwrap();
        assert_eq!(meshes.len(), 2);

        let textured = &meshes[0];
        assert_eq!(textured.indices, vec![0, 1, 2]);
        assert_eq!(textured.uvs[1], Vec2::new(1.0, 0.0));
        assert!((textured.normals[0] - Vec3::Z).length() < 1e-6);
        assert!((textured.tangents[0] - Vec3::X).length() < 1e-6);
        assert!((textured.bitangents[0] - Vec3::Y).length() < 1e-6);

        let bare = &meshes[1];
        assert_eq!(bare.indices, vec![0, 1, 2]);
        assert!(bare.uvs.iter().all(|uv| *uv == Vec2::ZERO));
        assert!(bare.tangents.iter().all(|t| *t == Vec3::ZERO));
    }

    #[test]
    fn empty_scenes_are_an_error() {
        let gltf = br#"{ "asset": { "version": "2.0" }, "scenes": [{ "nodes": [0] }], "nodes": [{}] }"#;
        assert!(matches!(load_meshes(gltf), Err(GltfLoadError::NoMeshes)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(load_meshes(b"not a gltf file"), Err(GltfLoadError::Gltf(_))));
    }

    fn png(image: image::DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn textures_decode_to_rgba8() {
        let pixels = vec![10, 20, 30, 40, 200, 150, 100, 255];
        let image = image::RgbaImage::from_raw(2, 1, pixels.clone()).unwrap();
        let texture = load_texture(&png(image::DynamicImage::ImageRgba8(image)), "etc").unwrap();
        assert_eq!(texture.size, UVec2::new(2, 1));
        assert_eq!(texture.data, pixels);
        assert_eq!(texture.label.as_deref(), Some("etc"));
    }

    #[test]
    fn rgb_textures_get_opaque_alpha() {
        let image = image::RgbImage::from_raw(1, 1, vec![1, 2, 3]).unwrap();
        let texture = load_texture(&png(image::DynamicImage::ImageRgb8(image)), "color").unwrap();
        assert_eq!(texture.texel(0, 0), [1, 2, 3, 255]);
    }

    #[test]
    fn undecodable_textures_are_an_error() {
        assert!(matches!(
            load_texture(b"definitely not a png", "normal"),
            Err(TextureLoadError::Decode { .. })
        ));
    }
}
