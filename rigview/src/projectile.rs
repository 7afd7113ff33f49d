//! Ballistic shells with ground collision.

use glam::{Mat4, Vec3};

/// Downward acceleration of a shell. Deliberately far below real gravity so
/// shots stay in frame.
pub const GRAVITY: f32 = 9.8 * 0.06;
/// Length of one simulation step in seconds.
pub const TIMESTEP: f32 = 1.0 / 60.0;
/// Below this speed the heading is left at its last value.
pub const MIN_HEADING_SPEED: f32 = 1e-6;
/// Uniform scale applied to the shell mesh.
pub const SHELL_SCALE: f32 = 1.1;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub alive: bool,
    heading: Vec3,
    dead_frames: u32,
}

impl Projectile {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        let mut projectile = Self {
            position,
            velocity,
            alive: true,
            heading: Vec3::X,
            dead_frames: 0,
        };
        projectile.update_heading();
        projectile
    }

    /// Advances a live projectile by `dt` seconds with explicit Euler
    /// integration. A projectile that goes below the ground is clamped onto it
    /// and dies. Dead projectiles don't move.
    pub fn step(&mut self, dt: f32) {
        if !self.alive {
            return;
        }

        self.velocity.y -= GRAVITY * dt;
        self.position += self.velocity * dt;

        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.alive = false;
        }

        self.update_heading();
    }

    fn update_heading(&mut self) {
        let speed = self.velocity.length();
        if speed > MIN_HEADING_SPEED {
            self.heading = self.velocity / speed;
        }
    }

    /// Unit direction of travel, or the last one seen while the projectile was
    /// moving.
    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// `(yaw, pitch)` in radians of the heading.
    pub fn orientation(&self) -> (f32, f32) {
        let Vec3 { x, y, z } = self.heading;
        let yaw = (-z).atan2(x);
        let pitch = y.atan2((x * x + z * z).sqrt());
        (yaw, pitch)
    }

    /// `T(position) * Ry(yaw) * Rz(pitch) * S(1.1)`: the shell mesh points
    /// down +X.
    pub fn model_matrix(&self) -> Mat4 {
        let (yaw, pitch) = self.orientation();
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(yaw)
            * Mat4::from_rotation_z(pitch)
            * Mat4::from_scale(Vec3::splat(SHELL_SCALE))
    }
}

/// When dead projectiles are dropped from the simulation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Unpaused steps a dead projectile is kept for before removal. Zero
    /// removes it on the step it dies.
    pub linger_frames: u32,
    /// Most projectiles kept at once. Spawning past the cap evicts the oldest
    /// dead projectile, or the oldest live one if none are dead.
    pub max_projectiles: usize,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            linger_frames: 120,
            max_projectiles: 256,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectileSimulator {
    projectiles: Vec<Projectile>,
    paused: bool,
    policy: ExpiryPolicy,
}

impl ProjectileSimulator {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            projectiles: Vec::new(),
            paused: false,
            policy,
        }
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn alive(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter().filter(|p| p.alive)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn spawn(&mut self, projectile: Projectile) {
        if self.policy.max_projectiles == 0 {
            return;
        }
        while self.projectiles.len() >= self.policy.max_projectiles {
            let evict = self.projectiles.iter().position(|p| !p.alive).unwrap_or(0);
            let evicted = self.projectiles.remove(evict);
            log::debug!("Evicted projectile at {} (alive: {})", evicted.position, evicted.alive);
        }
        self.projectiles.push(projectile);
    }

    /// Advances every projectile by one [`TIMESTEP`]. Does nothing at all
    /// while paused.
    pub fn step(&mut self) {
        profiling::scope!("ProjectileSimulator::step");

        if self.paused {
            return;
        }

        for projectile in &mut self.projectiles {
            if projectile.alive {
                projectile.step(TIMESTEP);
                if !projectile.alive {
                    log::debug!("Projectile hit the ground at {}", projectile.position);
                }
            } else {
                projectile.dead_frames = projectile.dead_frames.saturating_add(1);
            }
        }

        let linger_frames = self.policy.linger_frames;
        self.projectiles.retain(|p| p.alive || p.dead_frames < linger_frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_and_lands_exactly_on_the_ground() {
        let mut shell = Projectile::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 5.0, 0.0));

        let mut steps = 0;
        while shell.alive {
            let previous = shell;
            shell.step(TIMESTEP);
            steps += 1;

            assert!(shell.position.y >= 0.0);
            if !shell.alive {
                // The terminating step is the one that would have gone below ground.
                let unclamped = previous.position.y + (previous.velocity.y - GRAVITY * TIMESTEP) * TIMESTEP;
                assert!(unclamped < 0.0);
            }
            assert!(steps < 100_000, "never landed");
        }

        assert_eq!(shell.position.y, 0.0);
        assert!(shell.position.y.is_sign_positive());
    }

    #[test]
    fn gravity_only_touches_vertical_velocity() {
        let mut shell = Projectile::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.3, 0.12, -0.4));
        shell.step(TIMESTEP);

        assert_eq!(shell.velocity.x, 1.3);
        assert_eq!(shell.velocity.z, -0.4);
        assert_eq!(shell.velocity.y, 0.12 - GRAVITY * TIMESTEP);
        assert_eq!(shell.position, Vec3::new(0.0, 10.0, 0.0) + shell.velocity * TIMESTEP);
    }

    #[test]
    fn dead_projectiles_stay_put() {
        let mut shell = Projectile::new(Vec3::new(0.0, 0.001, 0.0), Vec3::new(1.0, -1.0, 0.0));
        shell.step(TIMESTEP);
        assert!(!shell.alive);

        let landed = shell;
        shell.step(TIMESTEP);
        assert_eq!(shell, landed);
    }

    #[test]
    fn pause_is_bit_identical() {
        let mut sim = ProjectileSimulator::default();
        sim.spawn(Projectile::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.3, 0.12, 0.7)));
        sim.spawn(Projectile::new(Vec3::new(1.0, 0.5, -1.0), Vec3::new(-0.3, 0.0, 1.1)));
        for _ in 0..7 {
            sim.step();
        }

        let bits = |sim: &ProjectileSimulator| -> Vec<[u32; 6]> {
            sim.projectiles()
                .iter()
                .map(|p| {
                    [
                        p.position.x.to_bits(),
                        p.position.y.to_bits(),
                        p.position.z.to_bits(),
                        p.velocity.x.to_bits(),
                        p.velocity.y.to_bits(),
                        p.velocity.z.to_bits(),
                    ]
                })
                .collect()
        };

        let before = bits(&sim);
        assert!(sim.toggle_pause());
        for frames in [1, 2, 60, 1000] {
            for _ in 0..frames {
                sim.step();
            }
            assert_eq!(bits(&sim), before);
        }
        assert!(!sim.toggle_pause());

        sim.step();
        assert_ne!(bits(&sim), before);
    }

    #[test]
    fn resuming_matches_an_uninterrupted_run() {
        let shell = Projectile::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(1.3, 0.12, 0.0));

        let mut straight = ProjectileSimulator::default();
        straight.spawn(shell);
        let mut interrupted = straight.clone();

        for _ in 0..30 {
            straight.step();
        }
        for _ in 0..10 {
            interrupted.step();
        }
        interrupted.set_paused(true);
        for _ in 0..50 {
            interrupted.step();
        }
        interrupted.set_paused(false);
        for _ in 0..20 {
            interrupted.step();
        }

        assert_eq!(straight.projectiles(), interrupted.projectiles());
    }

    #[test]
    fn orientation_of_level_and_climbing_shots() {
        let level = Projectile::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0));
        let (yaw, pitch) = level.orientation();
        assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(pitch, 0.0);

        let climbing = Projectile::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        let (yaw, pitch) = climbing.orientation();
        assert_eq!(yaw, 0.0);
        assert!((pitch - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn model_matrix_points_along_the_heading() {
        let shell = Projectile::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.3, 0.4, -1.2));
        let m = shell.model_matrix();

        let nose = m.transform_vector3(Vec3::X) / SHELL_SCALE;
        assert!((nose - shell.heading()).length() < 1e-5, "{nose} vs {}", shell.heading());
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn heading_survives_a_stop() {
        let mut shell = Projectile::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, GRAVITY * TIMESTEP, 0.0));
        shell.step(TIMESTEP);

        assert_eq!(shell.velocity, Vec3::ZERO);
        assert_eq!(shell.heading(), Vec3::Y);
        assert!(shell.orientation().1 > 1.5);

        let still = Projectile::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(still.heading(), Vec3::X);
    }

    #[test]
    fn dead_projectiles_linger_then_expire() {
        let mut sim = ProjectileSimulator::new(ExpiryPolicy {
            linger_frames: 3,
            max_projectiles: 8,
        });
        sim.spawn(Projectile::new(Vec3::new(0.0, 0.001, 0.0), Vec3::new(0.0, -1.0, 0.0)));

        sim.step();
        assert_eq!(sim.projectiles().len(), 1);
        assert_eq!(sim.alive().count(), 0);

        sim.set_paused(true);
        for _ in 0..10 {
            sim.step();
        }
        assert_eq!(sim.projectiles().len(), 1);
        sim.set_paused(false);

        sim.step();
        sim.step();
        assert_eq!(sim.projectiles().len(), 1);
        sim.step();
        assert!(sim.projectiles().is_empty());
    }

    #[test]
    fn cap_evicts_dead_before_live() {
        let mut sim = ProjectileSimulator::new(ExpiryPolicy {
            linger_frames: 1000,
            max_projectiles: 3,
        });
        sim.spawn(Projectile::new(Vec3::new(0.0, 9.0, 0.0), Vec3::ZERO));
        sim.spawn(Projectile::new(Vec3::new(1.0, 0.001, 0.0), Vec3::new(0.0, -1.0, 0.0)));
        sim.spawn(Projectile::new(Vec3::new(2.0, 9.0, 0.0), Vec3::ZERO));
        sim.step();
        assert_eq!(sim.alive().count(), 2);

        sim.spawn(Projectile::new(Vec3::new(3.0, 9.0, 0.0), Vec3::ZERO));
        let xs: Vec<f32> = sim.projectiles().iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 3.0]);

        sim.spawn(Projectile::new(Vec3::new(4.0, 9.0, 0.0), Vec3::ZERO));
        let xs: Vec<f32> = sim.projectiles().iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert!(sim.projectiles().len() <= 3);
    }
}
