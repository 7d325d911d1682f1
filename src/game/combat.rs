//! Combat resolver - firing patterns, projectiles, hit selection

use std::collections::HashMap;

use uuid::Uuid;

use crate::ws::protocol::{BulletView, PowerUpKind, ProjectileKind};

use super::world::Player;

/// Projectile speed in units per tick
pub const BULLET_SPEED: f32 = 15.0;
/// Damage for normal and triple shots
pub const BULLET_DAMAGE: i32 = 25;
/// Damage for homing shots
pub const HOMING_DAMAGE: i32 = 35;
/// Angular offset between triple-shot projectiles (radians)
pub const TRIPLE_SPREAD: f32 = 0.2;
/// A projectile hits the first living player closer than this
pub const HIT_RADIUS: f32 = 30.0;
/// Score credited to the shooter for a confirmed kill
pub const KILL_SCORE: u32 = 100;

/// Active projectile in the world
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    /// Owning player id; may dangle after the owner disconnects, at which
    /// point the projectile is purged with them.
    pub owner: Uuid,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub damage: i32,
    pub kind: ProjectileKind,
    /// Homing target chosen at fire time; never re-targeted
    pub target: Option<Uuid>,
}

impl Projectile {
    fn aimed(owner: Uuid, x: f32, y: f32, angle: f32, damage: i32, kind: ProjectileKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            x,
            y,
            vx: angle.cos() * BULLET_SPEED,
            vy: angle.sin() * BULLET_SPEED,
            damage,
            kind,
            target: None,
        }
    }

    pub fn view(&self) -> BulletView {
        BulletView {
            id: self.id,
            player_id: self.owner,
            x: self.x,
            y: self.y,
            velocity_x: self.vx,
            velocity_y: self.vy,
            damage: self.damage,
            kind: self.kind,
            target: self.target,
        }
    }
}

/// Spawn the projectiles for one fire request. The pattern follows the
/// power-up held at fire time; a single point of ammo covers the whole
/// pattern. Projectiles spawn at the client-reported muzzle position and
/// fly along the server-side facing angle.
pub fn spawn_shots(
    shooter: &Player,
    bullet_x: f32,
    bullet_y: f32,
    players: &HashMap<Uuid, Player>,
) -> Vec<Projectile> {
    match shooter.power_up {
        Some(PowerUpKind::Triple) => (-1..=1)
            .map(|i| {
                let angle = shooter.rotation + i as f32 * TRIPLE_SPREAD;
                Projectile::aimed(
                    shooter.id,
                    bullet_x,
                    bullet_y,
                    angle,
                    BULLET_DAMAGE,
                    ProjectileKind::Triple,
                )
            })
            .collect(),
        Some(PowerUpKind::Homing) => {
            let mut projectile = Projectile::aimed(
                shooter.id,
                bullet_x,
                bullet_y,
                shooter.rotation,
                HOMING_DAMAGE,
                ProjectileKind::Homing,
            );
            projectile.target = find_closest_enemy(players, shooter.id, shooter.x, shooter.y);
            vec![projectile]
        }
        None => vec![Projectile::aimed(
            shooter.id,
            bullet_x,
            bullet_y,
            shooter.rotation,
            BULLET_DAMAGE,
            ProjectileKind::Normal,
        )],
    }
}

/// Nearest living player other than `shooter_id`, by Euclidean distance
/// from `(from_x, from_y)`. Linear scan; fine at arena player counts.
pub fn find_closest_enemy(
    players: &HashMap<Uuid, Player>,
    shooter_id: Uuid,
    from_x: f32,
    from_y: f32,
) -> Option<Uuid> {
    let mut closest: Option<(Uuid, f32)> = None;
    for (id, player) in players {
        if *id == shooter_id || !player.alive {
            continue;
        }
        let dx = player.x - from_x;
        let dy = player.y - from_y;
        let dist_sq = dx * dx + dy * dy;
        if closest.map_or(true, |(_, best)| dist_sq < best) {
            closest = Some((*id, dist_sq));
        }
    }
    closest.map(|(id, _)| id)
}

/// Pick the hit target for a projectile at `(x, y)`: the closest living
/// player within [`HIT_RADIUS`], excluding the owner. Choosing the closest
/// keeps the outcome deterministic when several players are in range.
pub fn closest_target_in_radius(
    players: &HashMap<Uuid, Player>,
    owner: Uuid,
    x: f32,
    y: f32,
) -> Option<Uuid> {
    let radius_sq = HIT_RADIUS * HIT_RADIUS;
    let mut hit: Option<(Uuid, f32)> = None;
    for (id, player) in players {
        if *id == owner || !player.alive {
            continue;
        }
        let dx = player.x - x;
        let dy = player.y - y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq < radius_sq && hit.map_or(true, |(_, best)| dist_sq < best) {
            hit = Some((*id, dist_sq));
        }
    }
    hit.map(|(id, _)| id)
}
