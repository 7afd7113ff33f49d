//! Type declarations for the rigview viewer crates.
//!
//! This is reexported in the rigview crate proper and includes all the
//! "surface" data: meshes and their tangent frames, textures, part
//! identifiers and the scene light.

use bytemuck::{Pod, Zeroable};
/// Reexport of the glam version rigview is using.
pub use glam;
use glam::{UVec2, Vec2, Vec3};
use thiserror::Error;

mod raw;
pub mod shapes;

pub use raw::*;

macro_rules! changeable_struct {
    ($(#[$outer:meta])* pub struct $name:ident <- $name_change:ident { $($(#[$inner:meta])* $field_vis:vis $field_name:ident : $field_type:ty),* $(,)? } ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                $(#[$inner])* $field_vis $field_name : $field_type
            ),*
        }
        impl $name {
            pub fn update_from_changes(&mut self, change: $name_change) {
                $(
                    if let Some(inner) = change.$field_name {
                        self.$field_name = inner;
                    }
                );*
            }
        }
        #[doc = concat!("Describes a modification to a ", stringify!($name), ".")]
        #[derive(Debug, Default, Clone)]
        pub struct $name_change {
            $(
                $field_vis $field_name : Option<$field_type>
            ),*
        }
    };
}

/// The maximum amount of vertices any one mesh can have.
pub const MAX_VERTEX_COUNT: u32 = (1 << 24) - 1;
/// The maximum amount of indices any one mesh can have.
pub const MAX_INDEX_COUNT: u32 = u32::MAX;

/// Per-vertex attribute streams carried by a [`Mesh`] besides positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Normal,
    TextureCoordinates0,
    Tangent,
    Bitangent,
}

impl VertexAttribute {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::TextureCoordinates0 => "texture_coords_0",
            Self::Tangent => "tangent",
            Self::Bitangent => "bitangent",
        }
    }
}

/// Error returned from mesh validation.
#[derive(Debug, Error, PartialEq)]
pub enum MeshValidationError {
    #[error("Mesh's {} buffer has {actual} vertices but the position buffer has {expected}", .attribute.name())]
    MismatchedVertexCount {
        attribute: VertexAttribute,
        expected: usize,
        actual: usize,
    },
    #[error("Mesh has {count} vertices when the vertex limit is {MAX_VERTEX_COUNT}")]
    ExceededMaxVertexCount { count: usize },
    #[error("Mesh has {count} indicies when maximum index count is {MAX_INDEX_COUNT}")]
    ExceededMaxIndexCount { count: usize },
    #[error("Mesh has {count} indices which is not a multiple of three. Meshes are always composed of triangles")]
    IndexCountNotMultipleOfThree { count: usize },
    #[error(
        "Index at position {index} has the value {value} which is out of bounds for vertex buffers of {max} length"
    )]
    IndexOutOfBounds { index: usize, value: u32, max: u32 },
    #[error("Flat {buffer} buffer has {len} floats which is not a multiple of {components}")]
    MisalignedBuffer {
        buffer: &'static str,
        len: usize,
        components: usize,
    },
}

/// Easy to use builder for a [`Mesh`] that deals with common operations for
/// you.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    uvs: Option<Vec<Vec2>>,
    indices: Option<Vec<u32>>,

    handedness: Handedness,
    flip_winding_order: bool,
}
impl MeshBuilder {
    /// Create a new [`MeshBuilder`] with a given set of positions.
    ///
    /// All vertices must have positions.
    pub fn new(vertex_positions: Vec<Vec3>, handedness: Handedness) -> Self {
        Self {
            positions: vertex_positions,
            handedness,
            ..Self::default()
        }
    }

    /// Add vertex normals to the given mesh.
    pub fn with_vertex_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Add the first set of texture coordinates to the given mesh.
    ///
    /// Meshes without texture coordinates get a zero-filled set, which makes
    /// every triangle degenerate for tangent generation.
    pub fn with_vertex_texture_coordinates_0(mut self, coords: Vec<Vec2>) -> Self {
        self.uvs = Some(coords);
        self
    }

    /// Add indices to the given mesh.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Flip the winding order
    ///
    /// See [`Mesh::flip_winding_order`] for more information.
    pub fn with_flip_winding_order(mut self) -> Self {
        self.flip_winding_order = true;
        self
    }

    /// Build a mesh, adding whatever components weren't provided.
    ///
    /// Missing indices become the sequential list `0..N`, missing texture
    /// coordinates are zero-filled and missing normals are calculated. The
    /// tangent frame is always derived from the final buffers.
    pub fn build(self) -> Result<Mesh, MeshValidationError> {
        let vertex_count = self.positions.len();
        let has_normals = self.normals.is_some();

        let mut mesh = Mesh {
            normals: self.normals.unwrap_or_else(|| vec![Vec3::ZERO; vertex_count]),
            uvs: self.uvs.unwrap_or_else(|| vec![Vec2::ZERO; vertex_count]),
            tangents: vec![Vec3::ZERO; vertex_count],
            bitangents: vec![Vec3::ZERO; vertex_count],
            indices: self.indices.unwrap_or_else(|| (0..vertex_count as u32).collect()),
            positions: self.positions,
        };

        mesh.validate()?;

        // We need to flip winding order first, so the normals will be facing the right
        // direction.
        if self.flip_winding_order {
            mesh.flip_winding_order();
        }

        if !has_normals {
            mesh.calculate_normals(self.handedness);
        }

        mesh.calculate_tangent_frames();

        Ok(mesh)
    }
}

/// Geometry of a single drawable part.
///
/// Meshes are in Structure of Array format and must have all the vertex
/// arrays be the same length. This condition can be checked with the
/// [`Mesh::validate`] function.
///
/// These can be annoying to construct, so use the [`MeshBuilder`] to make it
/// easier.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub tangents: Vec<Vec3>,
    pub bitangents: Vec<Vec3>,

    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Validates that all vertex attributes have the same length and all
    /// indices are in bounds.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        let position_length = self.positions.len();
        let indices_length = self.indices.len();

        if position_length > MAX_VERTEX_COUNT as usize {
            return Err(MeshValidationError::ExceededMaxVertexCount { count: position_length });
        }

        let attribute_lengths = [
            (VertexAttribute::Normal, self.normals.len()),
            (VertexAttribute::TextureCoordinates0, self.uvs.len()),
            (VertexAttribute::Tangent, self.tangents.len()),
            (VertexAttribute::Bitangent, self.bitangents.len()),
        ];
        for (attribute, attribute_len) in attribute_lengths {
            if attribute_len != position_length {
                return Err(MeshValidationError::MismatchedVertexCount {
                    attribute,
                    actual: attribute_len,
                    expected: position_length,
                });
            }
        }

        if indices_length % 3 != 0 {
            return Err(MeshValidationError::IndexCountNotMultipleOfThree { count: indices_length });
        }

        if indices_length >= MAX_INDEX_COUNT as usize {
            return Err(MeshValidationError::ExceededMaxIndexCount { count: indices_length });
        }

        for (index, &value) in self.indices.iter().enumerate() {
            if value as usize >= position_length {
                return Err(MeshValidationError::IndexOutOfBounds {
                    index,
                    value,
                    max: position_length as u32,
                });
            }
        }

        Ok(())
    }

    /// Calculate normals for the given mesh, assuming smooth shading and
    /// per-vertex normals.
    ///
    /// It is sound to call this function with the wrong handedness, it will
    /// just result in flipped normals.
    pub fn calculate_normals(&mut self, handedness: Handedness) {
        match handedness {
            Handedness::Right => {
                Self::calculate_normals_for_buffers::<true>(&mut self.normals, &self.positions, &self.indices)
            }
            Handedness::Left => {
                Self::calculate_normals_for_buffers::<false>(&mut self.normals, &self.positions, &self.indices)
            }
        }
    }

    /// Calculate normals for the given buffers representing a mesh, assuming
    /// smooth shading and per-vertex normals.
    ///
    /// Right handed meshes use counter-clockwise front faces.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds for the position or normal buffer.
    pub fn calculate_normals_for_buffers<const RIGHT_HANDED: bool>(
        normals: &mut [Vec3],
        positions: &[Vec3],
        indices: &[u32],
    ) {
        debug_assert_eq!(normals.len(), positions.len());

        normals.fill(Vec3::ZERO);

        for idx in indices.chunks_exact(3) {
            let [idx0, idx1, idx2] = [idx[0] as usize, idx[1] as usize, idx[2] as usize];

            let pos1 = positions[idx0];
            let pos2 = positions[idx1];
            let pos3 = positions[idx2];

            let edge1 = pos2 - pos1;
            let edge2 = pos3 - pos1;

            let normal = if RIGHT_HANDED {
                edge1.cross(edge2)
            } else {
                edge2.cross(edge1)
            };

            normals[idx0] += normal;
            normals[idx1] += normal;
            normals[idx2] += normal;
        }

        for normal in normals.iter_mut() {
            *normal = normal.normalize_or_zero();
        }
    }

    /// Calculate the per-vertex tangent and bitangent of this mesh from its
    /// positions, normals and first set of texture coordinates.
    ///
    /// Returns the number of triangles skipped because their UV mapping has
    /// zero area.
    pub fn calculate_tangent_frames(&mut self) -> usize {
        Self::calculate_tangent_frames_for_buffers(
            &mut self.tangents,
            &mut self.bitangents,
            &self.positions,
            &self.normals,
            &self.uvs,
            &self.indices,
        )
    }

    /// Calculate tangents and bitangents for the given set of buffers.
    ///
    /// Each triangle contributes its (unnormalized) UV-space derivatives to
    /// all three of its vertices. Triangles whose UV determinant is exactly
    /// zero contribute nothing. Afterwards every accumulated vector is made
    /// orthogonal to the vertex normal and normalized; vectors that end up
    /// with no length stay zero.
    ///
    /// Returns the number of skipped triangles.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds for any of the buffers.
    pub fn calculate_tangent_frames_for_buffers(
        tangents: &mut [Vec3],
        bitangents: &mut [Vec3],
        positions: &[Vec3],
        normals: &[Vec3],
        uvs: &[Vec2],
        indices: &[u32],
    ) -> usize {
        debug_assert_eq!(tangents.len(), positions.len());
        debug_assert_eq!(bitangents.len(), positions.len());
        debug_assert_eq!(normals.len(), positions.len());
        debug_assert_eq!(uvs.len(), positions.len());

        tangents.fill(Vec3::ZERO);
        bitangents.fill(Vec3::ZERO);

        let mut skipped = 0;
        for idx in indices.chunks_exact(3) {
            let [idx0, idx1, idx2] = [idx[0] as usize, idx[1] as usize, idx[2] as usize];

            let pos1 = positions[idx0];
            let pos2 = positions[idx1];
            let pos3 = positions[idx2];

            let tex1 = uvs[idx0];
            let tex2 = uvs[idx1];
            let tex3 = uvs[idx2];

            let edge1 = pos2 - pos1;
            let edge2 = pos3 - pos1;

            let uv1 = tex2 - tex1;
            let uv2 = tex3 - tex1;

            let denom = uv1.x * uv2.y - uv2.x * uv1.y;
            if denom == 0.0 {
                skipped += 1;
                continue;
            }
            let r = 1.0 / denom;

            let tangent = (edge1 * uv2.y - edge2 * uv1.y) * r;
            let bitangent = (edge2 * uv1.x - edge1 * uv2.x) * r;

            for vertex in [idx0, idx1, idx2] {
                tangents[vertex] += tangent;
                bitangents[vertex] += bitangent;
            }
        }

        for ((tan, bitan), &norm) in tangents.iter_mut().zip(bitangents.iter_mut()).zip(normals) {
            *tan = orthonormalize_against(*tan, norm);
            *bitan = orthonormalize_against(*bitan, norm);
        }

        skipped
    }

    /// Inverts the winding order of a mesh. This is useful if you have meshes
    /// which are designed for right-handed (Counter-Clockwise) winding order
    /// for use in OpenGL or VK.
    ///
    /// This does not change vertex location, so does not change coordinate
    /// system. This will also not change the vertex normals. Calling
    /// [`Mesh::calculate_normals`] is advised after calling this function.
    pub fn flip_winding_order(&mut self) {
        for indices in self.indices.chunks_exact_mut(3) {
            indices.swap(0, 2);
        }
    }
}

/// Removes the component of `vector` along `normal` and normalizes the rest,
/// leaving degenerate results at zero.
fn orthonormalize_against(vector: Vec3, normal: Vec3) -> Vec3 {
    let projected = vector - normal * normal.dot(vector);
    let length = projected.length();
    if length > 0.0 && length.is_finite() {
        projected / length
    } else {
        Vec3::ZERO
    }
}

/// Error returned when texture data doesn't match its declared size.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("Texture {label:?} is {width}x{height} and needs {expected} bytes of rgba8 data but has {actual}")]
    DataSizeMismatch {
        label: Option<String>,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Texture {label:?} has a zero dimension")]
    Empty { label: Option<String> },
}

/// A texture with 4 channels of unsigned normalized 8-bit data, stored row by
/// row from the top left.
///
/// Channel data is kept exactly as decoded: no color space conversion is
/// applied on load.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub label: Option<String>,
    pub data: Vec<u8>,
    pub size: UVec2,
}

impl Texture {
    pub fn new(label: Option<String>, data: Vec<u8>, size: UVec2) -> Result<Self, TextureError> {
        if size.x == 0 || size.y == 0 {
            return Err(TextureError::Empty { label });
        }
        let expected = size.x as usize * size.y as usize * 4;
        if data.len() != expected {
            return Err(TextureError::DataSizeMismatch {
                label,
                width: size.x,
                height: size.y,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { label, data, size })
    }

    /// A single texel texture of the given color.
    pub fn solid(label: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            label: Some(label.into()),
            data: color.to_vec(),
            size: UVec2::ONE,
        }
    }

    /// Raw rgba8 value of the texel at the given integer coordinate.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the texture.
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.size.x && y < self.size.y, "texel ({x}, {y}) outside of {}", self.size);
        let offset = (y as usize * self.size.x as usize + x as usize) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.data[offset..offset + 4]);
        out
    }
}

/// Identifies a drawable part for shading purposes.
///
/// The value is uploaded to the GPU as a single `u32`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct PartId(pub u32);

impl PartId {
    pub const BODY: Self = Self(0);
    pub const TURRET: Self = Self(1);
    /// The only part that gets the rusted steel material variant.
    pub const INNER_WHEEL: Self = Self(2);
    pub const OUTER_WHEEL: Self = Self(3);
    pub const BARREL: Self = Self(4);
    pub const SHELL: Self = Self(5);
    pub const HAND: Self = Self(6);

    pub const fn is_inner_wheel(self) -> bool {
        self.0 == Self::INNER_WHEEL.0
    }
}

changeable_struct! {
    /// The scene's single directional light.
    pub struct DirectionalLight <- DirectionalLightChange {
        /// Direction the light travels in, world space. Does not need to be
        /// normalized.
        pub direction: Vec3,
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, 5.0, 5.0),
        }
    }
}

/// Describes the "Handedness" of a given coordinate system. Affects math done
/// in the space.
///
/// While a weird term, if you make your thumb X, your pointer Y,
/// and your middle finger Z, the handedness can be determined by which hand can
/// contort to represent the coordinate system.
///
/// For example
/// +X right, +Y up, +Z _into_ the screen is left handed.
/// +X right, +Y up, +Z _out of_ the screen is right handed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshBuilder {
        MeshBuilder::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Handedness::Right,
        )
        .with_vertex_normals(vec![Vec3::Z; 4])
        .with_vertex_texture_coordinates_0(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
        .with_indices(vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn quad_tangent_frame_follows_uv_axes() {
        let mesh = quad().build().unwrap();

        for (tangent, bitangent) in mesh.tangents.iter().zip(&mesh.bitangents) {
            assert!((*tangent - Vec3::X).length() < 1e-5, "{tangent}");
            assert!((*bitangent - Vec3::Y).length() < 1e-5, "{bitangent}");
        }
    }

    #[test]
    fn tangent_frames_are_unit_and_orthogonal_to_normals() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.3, 0.1),
            Vec3::new(0.4, 1.5, -0.2),
            Vec3::new(-1.0, 1.0, 0.7),
        ];
        let mesh = MeshBuilder::new(positions, Handedness::Right)
            .with_vertex_texture_coordinates_0(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(0.9, 0.1),
                Vec2::new(0.2, 0.8),
                Vec2::new(-0.5, 0.6),
            ])
            .with_indices(vec![0, 1, 2, 0, 2, 3])
            .build()
            .unwrap();

        for i in 0..mesh.vertex_count() {
            let n = mesh.normals[i];
            for v in [mesh.tangents[i], mesh.bitangents[i]] {
                assert!((v.length() - 1.0).abs() < 1e-4, "vertex {i}: {v}");
                assert!(v.dot(n).abs() < 1e-4, "vertex {i}: {v} . {n}");
            }
        }
    }

    #[test]
    fn zero_area_uvs_leave_zero_vectors() {
        let mut mesh = quad()
            .with_vertex_texture_coordinates_0(vec![Vec2::splat(0.5); 4])
            .build()
            .unwrap();

        assert_eq!(mesh.calculate_tangent_frames(), 2);
        for v in mesh.tangents.iter().chain(&mesh.bitangents) {
            assert!(v.is_finite());
            assert_eq!(*v, Vec3::ZERO);
        }
    }

    #[test]
    fn degenerate_triangle_is_skipped_but_neighbours_contribute() {
        // Triangle 0 has collapsed uvs, triangle 1 is a regular mapping sharing vertices 0 and 2.
        let mut tangents = vec![Vec3::ZERO; 4];
        let mut bitangents = vec![Vec3::ZERO; 4];
        let positions = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        let normals = [Vec3::Z; 4];
        let uvs = [Vec2::ZERO, Vec2::ZERO, Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let skipped = Mesh::calculate_tangent_frames_for_buffers(
            &mut tangents,
            &mut bitangents,
            &positions,
            &normals,
            &uvs,
            &[0, 1, 2, 0, 2, 3],
        );

        assert_eq!(skipped, 1);
        assert_eq!(tangents[1], Vec3::ZERO);
        assert!((tangents[3] - Vec3::X).length() < 1e-5);
        assert!(tangents.iter().chain(&bitangents).all(|v| v.is_finite()));
    }

    #[test]
    fn missing_uvs_and_indices_are_filled_in() {
        let mesh = MeshBuilder::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], Handedness::Right)
            .build()
            .unwrap();

        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.uvs, vec![Vec2::ZERO; 3]);
        assert_eq!(mesh.tangents, vec![Vec3::ZERO; 3]);
        for normal in &mesh.normals {
            assert!((*normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn left_handed_normals_point_the_other_way() {
        let mesh = MeshBuilder::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], Handedness::Left)
            .build()
            .unwrap();

        assert!((mesh.normals[0] + Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn validation_errors() {
        let mismatched = MeshBuilder::new(vec![Vec3::ZERO; 3], Handedness::Right)
            .with_vertex_normals(vec![Vec3::Z; 2])
            .build();
        assert_eq!(
            mismatched.unwrap_err(),
            MeshValidationError::MismatchedVertexCount {
                attribute: VertexAttribute::Normal,
                expected: 3,
                actual: 2
            }
        );

        let not_triangles = MeshBuilder::new(vec![Vec3::ZERO; 3], Handedness::Right)
            .with_indices(vec![0, 1])
            .build();
        assert_eq!(
            not_triangles.unwrap_err(),
            MeshValidationError::IndexCountNotMultipleOfThree { count: 2 }
        );

        let out_of_bounds = MeshBuilder::new(vec![Vec3::ZERO; 3], Handedness::Right)
            .with_indices(vec![0, 1, 3])
            .build();
        assert_eq!(
            out_of_bounds.unwrap_err(),
            MeshValidationError::IndexOutOfBounds {
                index: 2,
                value: 3,
                max: 3
            }
        );
    }

    #[test]
    fn flip_winding_order_swaps_first_and_last() {
        let mesh = quad().with_flip_winding_order().build().unwrap();
        assert_eq!(mesh.indices, vec![2, 1, 0, 3, 2, 0]);
    }

    #[test]
    fn texture_size_is_checked() {
        let err = Texture::new(Some("etc".into()), vec![0; 12], UVec2::new(2, 2)).unwrap_err();
        assert_eq!(
            err,
            TextureError::DataSizeMismatch {
                label: Some("etc".into()),
                width: 2,
                height: 2,
                expected: 16,
                actual: 12
            }
        );

        let texture = Texture::new(None, (0..16).collect(), UVec2::new(2, 2)).unwrap();
        assert_eq!(texture.texel(1, 1), [12, 13, 14, 15]);
    }

    #[test]
    fn light_changes_apply_only_set_fields() {
        let mut light = DirectionalLight::default();
        light.update_from_changes(DirectionalLightChange::default());
        assert_eq!(light.direction, Vec3::new(-1.0, 5.0, 5.0));

        light.update_from_changes(DirectionalLightChange {
            direction: Some(Vec3::NEG_Y),
        });
        assert_eq!(light.direction, Vec3::NEG_Y);
    }
}
