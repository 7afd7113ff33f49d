//! Arena of pivoted rigid nodes.
//!
//! Nodes are only ever appended and a child is always appended after its
//! parent, so the arena order is already a topological order. World matrices
//! are evaluated in a single forward pass.

use glam::{Mat4, Vec3};
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeIndex(pub usize);

/// Errors from building or mutating a [`PivotTree`].
#[derive(Debug, Error, PartialEq)]
pub enum HierarchyError {
    #[error("Node {index} does not exist in a tree of {len} nodes")]
    InvalidNode { index: usize, len: usize },
    #[error("Cannot rotate node {index} by {delta:?}, it holds a {current:?} rotation")]
    IncompatibleRotation {
        index: usize,
        current: Rotation,
        delta: Rotation,
    },
}

/// Errors from evaluating the pose of a [`PivotTree`].
#[derive(Debug, Error, PartialEq)]
pub enum PoseError {
    #[error("World matrix of node {label:?} ({index}) is singular (determinant {determinant}), it has no normal matrix")]
    SingularMatrix {
        index: usize,
        label: String,
        determinant: f32,
    },
}

/// Rotation of a node relative to its parent frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Rotation {
    /// Rotation of `angle` radians around `axis`. A zero axis is treated as no
    /// rotation.
    Axis { axis: Vec3, angle: f32 },
    /// Per-axis angles in radians, applied as `Rx * Ry * Rz`.
    Euler(Vec3),
}

impl Rotation {
    pub const IDENTITY: Self = Self::Euler(Vec3::ZERO);

    pub fn around(axis: Vec3, angle: f32) -> Self {
        Self::Axis { axis, angle }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Axis { axis, angle } => match axis.try_normalize() {
                Some(axis) => Mat4::from_axis_angle(axis, angle),
                None => Mat4::IDENTITY,
            },
            Self::Euler(angles) => {
                Mat4::from_rotation_x(angles.x) * Mat4::from_rotation_y(angles.y) * Mat4::from_rotation_z(angles.z)
            }
        }
    }

    /// Adds `delta` to this rotation's angle(s).
    ///
    /// Returns `None` when the two rotations can't be summed: different
    /// variants, or axis rotations around different axes.
    pub fn offset_by(self, delta: Self) -> Option<Self> {
        match (self, delta) {
            (Self::Axis { axis, angle }, Self::Axis { axis: d_axis, angle: d_angle }) if axis == d_axis => {
                Some(Self::Axis {
                    axis,
                    angle: angle + d_angle,
                })
            }
            (Self::Euler(angles), Self::Euler(d_angles)) => Some(Self::Euler(angles + d_angles)),
            _ => None,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// How a node's rotation is composed into its local matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PivotConvention {
    /// Rotate around a fixed point of the parent frame:
    /// `T(-pivot) * R * T(pivot)`.
    AroundPivot { pivot: Vec3 },
    /// Move to `offset` in the parent frame, rotate in place, then scale:
    /// `T(offset) * R * S`. Chained segments put `offset` at the tip of the
    /// previous segment.
    AttachAtTip { offset: Vec3, scale: Vec3 },
}

impl PivotConvention {
    /// Unscaled attachment at `offset`.
    pub const fn at(offset: Vec3) -> Self {
        Self::AttachAtTip { offset, scale: Vec3::ONE }
    }

    pub fn local_matrix(&self, rotation: &Rotation) -> Mat4 {
        match *self {
            Self::AroundPivot { pivot } => {
                Mat4::from_translation(-pivot) * rotation.matrix() * Mat4::from_translation(pivot)
            }
            Self::AttachAtTip { offset, scale } => {
                Mat4::from_translation(offset) * rotation.matrix() * Mat4::from_scale(scale)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PivotNode {
    pub label: String,
    pub convention: PivotConvention,
    pub rotation: Rotation,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl PivotNode {
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.convention.local_matrix(&self.rotation)
    }
}

/// World and normal matrix of a node.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NodePose {
    pub model: Mat4,
    pub normal: Mat4,
}

#[derive(Debug, Clone, Default)]
pub struct PivotTree {
    nodes: Vec<PivotNode>,
}

impl PivotTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_root(&mut self, label: impl Into<String>, convention: PivotConvention) -> NodeIndex {
        self.push(label.into(), convention, None)
    }

    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        label: impl Into<String>,
        convention: PivotConvention,
    ) -> Result<NodeIndex, HierarchyError> {
        self.check(parent)?;
        let child = self.push(label.into(), convention, Some(parent));
        self.nodes[parent.0].children.push(child);
        Ok(child)
    }

    fn push(&mut self, label: String, convention: PivotConvention, parent: Option<NodeIndex>) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(PivotNode {
            label,
            convention,
            rotation: Rotation::IDENTITY,
            parent,
            children: Vec::new(),
        });
        index
    }

    fn check(&self, index: NodeIndex) -> Result<(), HierarchyError> {
        match index.0 < self.nodes.len() {
            true => Ok(()),
            false => Err(HierarchyError::InvalidNode {
                index: index.0,
                len: self.nodes.len(),
            }),
        }
    }

    pub fn node(&self, index: NodeIndex) -> Result<&PivotNode, HierarchyError> {
        self.check(index)?;
        Ok(&self.nodes[index.0])
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Result<&mut PivotNode, HierarchyError> {
        self.check(index)?;
        Ok(&mut self.nodes[index.0])
    }

    pub fn find(&self, label: &str) -> Option<NodeIndex> {
        self.nodes.iter().position(|node| node.label == label).map(NodeIndex)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &PivotNode)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeIndex(idx), node))
    }

    /// Replaces the rotation of a node. Any finite angle is accepted.
    pub fn set_rotation(&mut self, index: NodeIndex, rotation: Rotation) -> Result<(), HierarchyError> {
        self.node_mut(index)?.rotation = rotation;
        Ok(())
    }

    /// Adds `delta` to the current rotation of a node.
    pub fn rotate_by(&mut self, index: NodeIndex, delta: Rotation) -> Result<(), HierarchyError> {
        let node = self.node_mut(index)?;
        node.rotation = node
            .rotation
            .offset_by(delta)
            .ok_or(HierarchyError::IncompatibleRotation {
                index: index.0,
                current: node.rotation,
                delta,
            })?;
        Ok(())
    }

    /// World matrices of every node, in arena order.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        profiling::scope!("PivotTree::world_matrices");

        let mut world = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.local_matrix();
            let matrix = match node.parent {
                // This is guaranteed to be computed because parents precede children.
                Some(parent) => world[parent.0] * local,
                None => local,
            };
            world.push(matrix);
        }
        world
    }

    /// World matrix of a single node, walking up its parent chain.
    pub fn world_matrix(&self, index: NodeIndex) -> Result<Mat4, HierarchyError> {
        let mut node = self.node(index)?;
        let mut matrix = node.local_matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            matrix = node.local_matrix() * matrix;
        }
        Ok(matrix)
    }

    /// World and normal matrices of every node, in arena order.
    pub fn pose(&self) -> Result<Vec<NodePose>, PoseError> {
        profiling::scope!("PivotTree::pose");

        self.world_matrices()
            .into_iter()
            .zip(&self.nodes)
            .enumerate()
            .map(|(index, (model, node))| {
                let normal = normal_matrix(model).ok_or_else(|| PoseError::SingularMatrix {
                    index,
                    label: node.label.clone(),
                    determinant: model.determinant(),
                })?;
                Ok(NodePose { model, normal })
            })
            .collect()
    }
}

/// Inverse transpose of `model`, used to carry normals into world space.
///
/// Returns `None` when the matrix can't be inverted.
pub fn normal_matrix(model: Mat4) -> Option<Mat4> {
    let determinant = model.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return None;
    }
    let normal = model.inverse().transpose();
    normal.is_finite().then_some(normal)
}
