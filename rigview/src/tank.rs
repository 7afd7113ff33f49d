//! The tank rig: a body driven around the ground plane, a turret turning on
//! top of it and a barrel pitching at the front of the turret.

use glam::{Mat4, Vec2, Vec3};
use rigview_types::PartId;

use crate::{
    hierarchy::{HierarchyError, NodeIndex, PivotConvention, PivotTree, Rotation},
    projectile::Projectile,
};

/// Height of the body origin above the ground.
pub const RIDE_HEIGHT: f32 = 0.46;
/// Point the turret turns around, in body space.
pub const TURRET_PIVOT: Vec3 = Vec3::new(0.45, 0.299, 0.0);
/// Point the barrel pitches around, in turret space.
pub const JOIN_PIVOT: Vec3 = Vec3::new(0.2, 0.0, 0.0);
/// Tip of the barrel as modelled, measured from the ground.
pub const BARREL_TIP: Vec3 = Vec3::new(0.65, 0.87, 0.0);

pub const MOVE_STEP: f32 = 0.1;
pub const TURN_STEP: f32 = 0.05;
pub const ELEVATION_STEP: f32 = 0.05;
/// Elevation commands are ignored once the barrel is past this angle.
pub const ELEVATION_LIMIT: f32 = 0.1;

pub const SHELL_SPEED: f32 = 1.3;
pub const SHELL_LIFT: f32 = 0.12;

/// Joint parameters of the tank. Angles are in radians.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TankState {
    /// Ground position, `x` and `z`.
    pub position: Vec2,
    pub rotation: f32,
    pub turret_rotation: f32,
    pub barrel_elevation: f32,
}

/// Discrete commands produced by the keyboard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TankCommand {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    TurretLeft,
    TurretRight,
    BarrelUp,
    BarrelDown,
    Fire,
    TogglePause,
}

impl TankCommand {
    /// Maps a key name to its command. Letter keys are case insensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key.to_ascii_lowercase().as_str() {
            "arrowup" | "up" => Self::Forward,
            "arrowdown" | "down" => Self::Backward,
            "arrowleft" | "left" => Self::TurnLeft,
            "arrowright" | "right" => Self::TurnRight,
            "a" => Self::TurretLeft,
            "d" => Self::TurretRight,
            "w" => Self::BarrelUp,
            "s" => Self::BarrelDown,
            " " | "space" => Self::Fire,
            "p" => Self::TogglePause,
            _ => return None,
        })
    }
}

impl TankState {
    /// Unit direction the hull faces on the ground plane, as `(x, z)`.
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.rotation.cos(), -self.rotation.sin())
    }

    /// Applies a movement command. Returns false for commands that don't move
    /// a joint (firing and pausing).
    pub fn apply(&mut self, command: TankCommand) -> bool {
        match command {
            TankCommand::Forward => self.position += self.forward() * MOVE_STEP,
            TankCommand::Backward => self.position -= self.forward() * MOVE_STEP,
            TankCommand::TurnLeft => self.rotation += TURN_STEP,
            TankCommand::TurnRight => self.rotation -= TURN_STEP,
            TankCommand::TurretLeft => self.turret_rotation += TURN_STEP,
            TankCommand::TurretRight => self.turret_rotation -= TURN_STEP,
            TankCommand::BarrelUp => {
                if self.barrel_elevation < ELEVATION_LIMIT {
                    self.barrel_elevation += ELEVATION_STEP;
                }
            }
            TankCommand::BarrelDown => {
                if self.barrel_elevation > -ELEVATION_LIMIT {
                    self.barrel_elevation -= ELEVATION_STEP;
                }
            }
            TankCommand::Fire | TankCommand::TogglePause => return false,
        }
        true
    }
}

/// The parts of the tank, in mesh order.
pub const TANK_PARTS: [PartId; 5] = [
    PartId::BODY,
    PartId::TURRET,
    PartId::INNER_WHEEL,
    PartId::OUTER_WHEEL,
    PartId::BARREL,
];

#[derive(Debug, Clone)]
pub struct TankRig {
    tree: PivotTree,
    body: NodeIndex,
    turret: NodeIndex,
    barrel: NodeIndex,
    inner_wheel: NodeIndex,
    outer_wheel: NodeIndex,
}

impl TankRig {
    pub fn new() -> Self {
        let mut tree = PivotTree::new();
        let body = tree.add_root("body", PivotConvention::at(Vec3::new(0.0, RIDE_HEIGHT, 0.0)));
        let turret = tree
            .add_child(body, "turret", PivotConvention::AroundPivot { pivot: TURRET_PIVOT })
            .expect("body was just added");
        let barrel = tree
            .add_child(turret, "barrel", PivotConvention::AroundPivot { pivot: JOIN_PIVOT })
            .expect("turret was just added");
        // The wheels are modelled in place and ride with the body.
        let inner_wheel = tree
            .add_child(body, "inner wheel", PivotConvention::at(Vec3::ZERO))
            .expect("body was just added");
        let outer_wheel = tree
            .add_child(body, "outer wheel", PivotConvention::at(Vec3::ZERO))
            .expect("body was just added");

        Self {
            tree,
            body,
            turret,
            barrel,
            inner_wheel,
            outer_wheel,
        }
    }

    pub fn tree(&self) -> &PivotTree {
        &self.tree
    }

    /// Node of every part in [`TANK_PARTS`] order.
    pub fn part_nodes(&self) -> [NodeIndex; 5] {
        [self.body, self.turret, self.inner_wheel, self.outer_wheel, self.barrel]
    }

    /// Writes the joint parameters of `state` into the rig.
    pub fn set_state(&mut self, state: &TankState) -> Result<(), HierarchyError> {
        self.tree.node_mut(self.body)?.convention =
            PivotConvention::at(Vec3::new(state.position.x, RIDE_HEIGHT, state.position.y));
        self.tree
            .set_rotation(self.body, Rotation::around(Vec3::Y, state.rotation))?;
        self.tree
            .set_rotation(self.turret, Rotation::around(Vec3::Y, state.turret_rotation))?;
        self.tree
            .set_rotation(self.barrel, Rotation::around(Vec3::Z, state.barrel_elevation))?;
        Ok(())
    }

    pub fn barrel_matrix(&self) -> Result<Mat4, HierarchyError> {
        self.tree.world_matrix(self.barrel)
    }

    /// World position of the barrel tip.
    pub fn muzzle_position(&self) -> Result<Vec3, HierarchyError> {
        let local = BARREL_TIP - Vec3::new(0.0, RIDE_HEIGHT, 0.0);
        Ok(self.barrel_matrix()?.transform_point3(local))
    }

    /// Spawns a shell at the muzzle, travelling the way the turret faces.
    ///
    /// The barrel elevation only moves the spawn point, the launch direction is
    /// always level plus a small fixed lift.
    pub fn fire(&self, state: &TankState) -> Result<Projectile, HierarchyError> {
        let aim = state.rotation + state.turret_rotation;
        let velocity = Vec3::new(aim.cos() * SHELL_SPEED, SHELL_LIFT, -aim.sin() * SHELL_SPEED);
        Ok(Projectile::new(self.muzzle_position()?, velocity))
    }
}

impl Default for TankRig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn posed(state: TankState) -> TankRig {
        let mut rig = TankRig::new();
        rig.set_state(&state).unwrap();
        rig
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(TankCommand::from_key("ArrowUp"), Some(TankCommand::Forward));
        assert_eq!(TankCommand::from_key("A"), Some(TankCommand::TurretLeft));
        assert_eq!(TankCommand::from_key(" "), Some(TankCommand::Fire));
        assert_eq!(TankCommand::from_key("space"), Some(TankCommand::Fire));
        assert_eq!(TankCommand::from_key("q"), None);
    }

    #[test]
    fn forward_follows_heading() {
        let mut state = TankState::default();
        state.apply(TankCommand::Forward);
        assert!((state.position - Vec2::new(0.1, 0.0)).length() < 1e-6);

        let mut state = TankState {
            rotation: FRAC_PI_2,
            ..TankState::default()
        };
        state.apply(TankCommand::Forward);
        assert!((state.position - Vec2::new(0.0, -0.1)).length() < 1e-6);
        state.apply(TankCommand::Backward);
        assert!(state.position.length() < 1e-6);
    }

    #[test]
    fn elevation_stops_at_the_limit() {
        let mut state = TankState::default();
        for _ in 0..10 {
            state.apply(TankCommand::BarrelUp);
        }
        assert!(state.barrel_elevation <= ELEVATION_LIMIT + ELEVATION_STEP);
        assert!(state.barrel_elevation >= ELEVATION_LIMIT);

        for _ in 0..20 {
            state.apply(TankCommand::BarrelDown);
        }
        assert!(state.barrel_elevation >= -ELEVATION_LIMIT - ELEVATION_STEP);
        assert!(state.barrel_elevation <= -ELEVATION_LIMIT);
    }

    #[test]
    fn fire_and_pause_are_not_movement() {
        let mut state = TankState::default();
        assert!(!state.apply(TankCommand::Fire));
        assert!(!state.apply(TankCommand::TogglePause));
        assert_eq!(state, TankState::default());
    }

    #[test]
    fn turret_turns_around_its_pivot() {
        let rest = posed(TankState::default());
        let turned = posed(TankState {
            turret_rotation: 0.9,
            ..TankState::default()
        });

        let turret = rest.part_nodes()[1];
        let fixed_point = -TURRET_PIVOT;
        let a = rest.tree().world_matrix(turret).unwrap().transform_point3(fixed_point);
        let b = turned.tree().world_matrix(turret).unwrap().transform_point3(fixed_point);
        assert!((a - b).length() < 1e-6);
    }

    #[test]
    fn muzzle_at_rest() {
        let rig = posed(TankState::default());
        let muzzle = rig.muzzle_position().unwrap();
        assert!((muzzle - BARREL_TIP).length() < 1e-6, "{muzzle}");
    }

    #[test]
    fn wheels_ride_with_the_body() {
        let rig = posed(TankState {
            position: Vec2::new(2.0, -1.0),
            rotation: 0.4,
            ..TankState::default()
        });
        let world = rig.tree().world_matrices();
        let [body, _, inner, outer, _] = rig.part_nodes();
        assert_eq!(world[inner.0], world[body.0]);
        assert_eq!(world[outer.0], world[body.0]);
        assert!((world[body.0].w_axis.truncate() - Vec3::new(2.0, RIDE_HEIGHT, -1.0)).length() < 1e-6);
    }

    #[test]
    fn shells_launch_along_the_turret() {
        let state = TankState {
            rotation: 0.3,
            turret_rotation: 0.2,
            barrel_elevation: 0.1,
            ..TankState::default()
        };
        let rig = posed(state);
        let shell = rig.fire(&state).unwrap();

        assert!((shell.velocity - Vec3::new(0.5f32.cos() * 1.3, 0.12, -0.5f32.sin() * 1.3)).length() < 1e-6);
        assert_eq!(shell.position, rig.muzzle_position().unwrap());
        assert!(shell.alive);
    }
}
