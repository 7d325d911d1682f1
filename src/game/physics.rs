//! Projectile stepping - homing steering and position integration

use super::combat::Projectile;

/// Fraction of a unit vector toward the target added to velocity each tick
pub const HOMING_STEER_FACTOR: f32 = 0.1;
/// Homing projectile speed after renormalization (units per tick)
pub const HOMING_SPEED: f32 = 16.0;

/// Per-tick projectile physics
pub struct ProjectileStepper;

impl ProjectileStepper {
    /// Curve a homing projectile toward its target: add a steering nudge
    /// along the unit vector to the target, then renormalize speed so the
    /// pursuit bends without accelerating.
    pub fn steer_homing(projectile: &mut Projectile, target_x: f32, target_y: f32) {
        let dx = target_x - projectile.x;
        let dy = target_y - projectile.y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= 0.0 {
            return;
        }

        projectile.vx += (dx / distance) * HOMING_STEER_FACTOR;
        projectile.vy += (dy / distance) * HOMING_STEER_FACTOR;

        let speed = (projectile.vx * projectile.vx + projectile.vy * projectile.vy).sqrt();
        projectile.vx = (projectile.vx / speed) * HOMING_SPEED;
        projectile.vy = (projectile.vy / speed) * HOMING_SPEED;
    }

    /// Advance a projectile by its velocity
    pub fn integrate(projectile: &mut Projectile) {
        projectile.x += projectile.vx;
        projectile.y += projectile.vy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::ProjectileKind;
    use uuid::Uuid;

    fn homing_projectile(x: f32, y: f32, vx: f32, vy: f32) -> Projectile {
        Projectile {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            x,
            y,
            vx,
            vy,
            damage: 35,
            kind: ProjectileKind::Homing,
            target: Some(Uuid::new_v4()),
        }
    }

    fn speed(p: &Projectile) -> f32 {
        (p.vx * p.vx + p.vy * p.vy).sqrt()
    }

    #[test]
    fn steering_renormalizes_speed_every_tick() {
        let mut p = homing_projectile(0.0, 0.0, 15.0, 0.0);
        for _ in 0..50 {
            ProjectileStepper::steer_homing(&mut p, 200.0, 300.0);
            assert!((speed(&p) - HOMING_SPEED).abs() < 1e-3);
            ProjectileStepper::integrate(&mut p);
        }
    }

    #[test]
    fn steering_bends_velocity_toward_the_target() {
        // Flying along +x, target straight up: vy must grow, vx must shrink.
        let mut p = homing_projectile(0.0, 0.0, 15.0, 0.0);
        ProjectileStepper::steer_homing(&mut p, 0.0, 500.0);
        assert!(p.vy > 0.0);
        assert!(p.vx < HOMING_SPEED);
    }

    #[test]
    fn steering_from_the_target_position_is_a_no_op() {
        let mut p = homing_projectile(40.0, 40.0, 15.0, 0.0);
        ProjectileStepper::steer_homing(&mut p, 40.0, 40.0);
        assert_eq!((p.vx, p.vy), (15.0, 0.0));
    }

    #[test]
    fn integration_advances_by_velocity() {
        let mut p = homing_projectile(10.0, 20.0, 3.0, -4.0);
        ProjectileStepper::integrate(&mut p);
        assert_eq!((p.x, p.y), (13.0, 16.0));
    }
}
