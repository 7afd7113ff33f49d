//! Per-demo scene state.
//!
//! A scene owns everything a demo mutates between frames. Input is applied
//! with `apply`, the simulation is advanced with `tick`, and `frame` turns the
//! current state into the matrices the renderer consumes.

use glam::{Mat4, Vec3};
use rigview_types::{DirectionalLight, PartId};

use crate::{
    camera::{OrbitCamera, OrthographicCamera},
    hand::{HandRig, JointControl},
    hierarchy::{normal_matrix, HierarchyError, PoseError},
    projectile::{ExpiryPolicy, ProjectileSimulator},
    tank::{TankCommand, TankRig, TankState, TANK_PARTS},
};

/// Mesh slot the shell is drawn with; slots before it are the tank parts.
pub const SHELL_MESH: usize = TANK_PARTS.len();

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    Pose(#[from] PoseError),
    #[error("Shell at {position} has a singular model matrix")]
    SingularShell { position: Vec3 },
}

/// One part to draw this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FramePart {
    pub part: PartId,
    /// Index of the mesh in the demo's mesh list.
    pub mesh: usize,
    pub model: Mat4,
    pub normal: Mat4,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParts {
    pub view_projection: Mat4,
    pub light_direction: Vec3,
    pub parts: Vec<FramePart>,
}

#[derive(Debug, Clone)]
pub struct TankScene {
    pub state: TankState,
    pub rig: TankRig,
    pub projectiles: ProjectileSimulator,
    pub camera: OrbitCamera,
    pub light: DirectionalLight,
}

impl Default for TankScene {
    fn default() -> Self {
        Self::new(ExpiryPolicy::default())
    }
}

impl TankScene {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            state: TankState::default(),
            rig: TankRig::new(),
            projectiles: ProjectileSimulator::new(policy),
            camera: OrbitCamera::default(),
            light: DirectionalLight::default(),
        }
    }

    pub fn apply(&mut self, command: TankCommand) -> Result<(), SceneError> {
        match command {
            TankCommand::Fire => {
                // The muzzle has to be taken from the current joint state,
                // not whatever was drawn last frame.
                self.rig.set_state(&self.state)?;
                let shell = self.rig.fire(&self.state)?;
                log::info!("Fired shell from {} with velocity {}", shell.position, shell.velocity);
                self.projectiles.spawn(shell);
            }
            TankCommand::TogglePause => {
                let paused = self.projectiles.toggle_pause();
                log::info!("Projectiles {}", if paused { "paused" } else { "resumed" });
            }
            movement => {
                self.state.apply(movement);
                log::trace!("{movement:?} -> {:?}", self.state);
            }
        }
        Ok(())
    }

    pub fn tick(&mut self) {
        self.projectiles.step();
    }

    /// Tank parts in [`TANK_PARTS`] order, followed by every live shell.
    pub fn frame(&mut self, aspect: f32) -> Result<FrameParts, SceneError> {
        profiling::scope!("TankScene::frame");

        self.rig.set_state(&self.state)?;
        let pose = self.rig.tree().pose()?;

        let mut parts: Vec<FramePart> = self
            .rig
            .part_nodes()
            .into_iter()
            .zip(TANK_PARTS)
            .enumerate()
            .map(|(mesh, (node, part))| FramePart {
                part,
                mesh,
                model: pose[node.0].model,
                normal: pose[node.0].normal,
            })
            .collect();

        for shell in self.projectiles.alive() {
            let model = shell.model_matrix();
            let normal = normal_matrix(model).ok_or(SceneError::SingularShell {
                position: shell.position,
            })?;
            parts.push(FramePart {
                part: PartId::SHELL,
                mesh: SHELL_MESH,
                model,
                normal,
            });
        }

        Ok(FrameParts {
            view_projection: self.camera.view_projection(aspect),
            light_direction: self.light.direction,
            parts,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HandScene {
    pub rig: HandRig,
    pub camera: OrthographicCamera,
    pub light: DirectionalLight,
}

impl HandScene {
    pub fn new() -> Result<Self, SceneError> {
        Ok(Self {
            rig: HandRig::new()?,
            camera: OrthographicCamera {
                eye: Vec3::new(0.0, 10.0, 20.0),
                target: Vec3::new(0.0, 5.0, 0.0),
                half_height: 10.0,
                near: 0.1,
                far: 100.0,
            },
            light: DirectionalLight {
                direction: Vec3::new(-5.0, -10.0, 0.0),
            },
        })
    }

    /// Sets a joint from a slider value, clamped to the control's range.
    /// Returns the value actually applied.
    pub fn apply(&mut self, control: JointControl, degrees: f32) -> Result<f32, SceneError> {
        let clamped = control.clamp_degrees(degrees);
        if clamped != degrees {
            log::debug!("Clamped {} from {degrees} to {clamped}", control.name());
        }
        self.rig.set_joint(control, clamped)?;
        Ok(clamped)
    }

    /// Every hand segment, all drawn with mesh slot 0.
    pub fn frame(&self, aspect: f32) -> Result<FrameParts, SceneError> {
        profiling::scope!("HandScene::frame");

        let pose = self.rig.tree().pose()?;
        let parts = self
            .rig
            .segments()
            .iter()
            .map(|segment| FramePart {
                part: segment.part,
                mesh: 0,
                model: pose[segment.node.0].model,
                normal: pose[segment.node.0].normal,
            })
            .collect();

        Ok(FrameParts {
            view_projection: self.camera.view_projection(aspect),
            light_direction: self.light.direction,
            parts,
        })
    }
}
