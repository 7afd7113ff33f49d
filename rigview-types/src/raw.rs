use glam::{Vec2, Vec3};

use crate::{Handedness, Mesh, MeshBuilder, MeshValidationError};

/// Triangle indices as they come out of a mesh file, in whatever width the
/// file stored them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens the indices to 32 bits.
    pub fn into_u32(self) -> Vec<u32> {
        match self {
            Self::U8(v) => v.into_iter().map(u32::from).collect(),
            Self::U16(v) => v.into_iter().map(u32::from).collect(),
            Self::U32(v) => v,
        }
    }
}

/// One sub-mesh as handed over by a mesh parser: flat float arrays with
/// optional channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMeshData {
    /// Three floats per vertex.
    pub positions: Vec<f32>,
    /// Three floats per vertex.
    pub normals: Option<Vec<f32>>,
    /// Two floats per vertex.
    pub uvs: Option<Vec<f32>>,
    pub indices: Option<Indices>,
}

impl RawMeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Converts the flat buffers into a validated [`Mesh`] with tangent frames.
    ///
    /// A missing UV channel becomes zeros and missing indices become the
    /// sequential list `0..N`.
    pub fn into_mesh(self, handedness: Handedness) -> Result<Mesh, MeshValidationError> {
        let positions: Vec<Vec3> = unflatten("position", &self.positions)?;
        let vertex_count = positions.len();

        let mut builder = MeshBuilder::new(positions, handedness);

        if let Some(normals) = self.normals {
            builder = builder.with_vertex_normals(unflatten("normal", &normals)?);
        }

        let uvs = match self.uvs {
            Some(uvs) => unflatten("texture_coords_0", &uvs)?,
            None => vec![Vec2::ZERO; vertex_count],
        };
        builder = builder.with_vertex_texture_coordinates_0(uvs);

        let indices = match self.indices {
            Some(indices) => indices.into_u32(),
            None => (0..vertex_count as u32).collect(),
        };

        builder.with_indices(indices).build()
    }
}

fn unflatten<T: bytemuck::Pod>(buffer: &'static str, floats: &[f32]) -> Result<Vec<T>, MeshValidationError> {
    let components = std::mem::size_of::<T>() / std::mem::size_of::<f32>();
    bytemuck::try_cast_slice::<f32, T>(floats)
        .map(<[T]>::to_vec)
        .map_err(|_| MeshValidationError::MisalignedBuffer {
            buffer,
            len: floats.len(),
            components,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_indices_widen_losslessly() {
        assert_eq!(Indices::U8(vec![0, 255]).into_u32(), vec![0, 255]);
        assert_eq!(Indices::U16(vec![7, u16::MAX]).into_u32(), vec![7, 65535]);
        assert_eq!(Indices::U32(vec![1, 2, 3]).into_u32(), vec![1, 2, 3]);
    }

    #[test]
    fn raw_data_without_optional_channels() {
        let raw = RawMeshData {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            ..RawMeshData::default()
        };
        assert_eq!(raw.vertex_count(), 3);

        let mesh = raw.into_mesh(Handedness::Right).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.uvs, vec![Vec2::ZERO; 3]);
        assert!(mesh.tangents.iter().all(|t| *t == Vec3::ZERO));
    }

    #[test]
    fn raw_data_with_all_channels() {
        let raw = RawMeshData {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            uvs: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            indices: Some(Indices::U16(vec![0, 1, 2])),
        };

        let mesh = raw.into_mesh(Handedness::Right).unwrap();
        assert_eq!(mesh.uvs[1], Vec2::X);
        assert!((mesh.tangents[0] - Vec3::X).length() < 1e-6);
        assert!((mesh.bitangents[0] - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn misaligned_flat_buffer_is_rejected() {
        let raw = RawMeshData {
            positions: vec![0.0; 8],
            ..RawMeshData::default()
        };
        assert_eq!(
            raw.into_mesh(Handedness::Right).unwrap_err(),
            MeshValidationError::MisalignedBuffer {
                buffer: "position",
                len: 8,
                components: 3
            }
        );
    }
}
