//! World state store - players, projectiles, power-ups, arena bounds
//!
//! Pure state container. Callers (the engine) uphold the gameplay
//! invariants and decide what to broadcast; nothing here emits events.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::{
    GameArea, GameSnapshot, PlayerView, Position, PowerUpKind, PowerUpView,
};

use super::combat::Projectile;

/// Arena width in world units
pub const ARENA_WIDTH: f32 = 2000.0;
/// Arena height in world units
pub const ARENA_HEIGHT: f32 = 1500.0;

/// Movement speed reported to clients
pub const PLAYER_SPEED: f32 = 5.0;
/// Health on join and respawn
pub const MAX_HEALTH: i32 = 100;
/// Magazine capacity
pub const AMMO_CAPACITY: u32 = 10;

/// Live power-up cap
pub const MAX_POWER_UPS: usize = 5;
/// Power-up bounding box edge length
pub const POWER_UP_SIZE: f32 = 30.0;

/// Fixed rectangular arena bounds
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && x <= self.width && y >= 0.0 && y <= self.height
    }

    pub fn view(&self) -> GameArea {
        GameArea {
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

/// Authoritative player state
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub skin: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub speed: f32,
    pub health: i32,
    pub ammo: u32,
    pub reloading: bool,
    /// Bumped on every reload start and on respawn so that stale reload
    /// timers can recognize they no longer apply.
    pub reload_seq: u64,
    pub power_up: Option<PowerUpKind>,
    pub score: u32,
    pub alive: bool,
}

impl Player {
    pub fn new(id: Uuid, name: String, skin: String, x: f32, y: f32) -> Self {
        Self {
            id,
            name,
            skin,
            x,
            y,
            rotation: 0.0,
            speed: PLAYER_SPEED,
            health: MAX_HEALTH,
            ammo: AMMO_CAPACITY,
            reloading: false,
            reload_seq: 0,
            power_up: None,
            score: 0,
            alive: true,
        }
    }

    /// Reset combat state for a respawn at the given position. Any pending
    /// reload timer is orphaned by bumping the sequence token.
    pub fn respawn_at(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.health = MAX_HEALTH;
        self.ammo = AMMO_CAPACITY;
        self.reloading = false;
        self.reload_seq += 1;
        self.power_up = None;
        self.alive = true;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            skin: self.skin.clone(),
            x: self.x,
            y: self.y,
            rotation: self.rotation,
            speed: self.speed,
            health: self.health,
            ammo: self.ammo,
            reloading: self.reloading,
            power_up: self.power_up,
            score: self.score,
            alive: self.alive,
        }
    }
}

/// A collectible pickup in the arena
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub id: Uuid,
    pub kind: PowerUpKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PowerUp {
    pub fn view(&self) -> PowerUpView {
        PowerUpView {
            id: self.id,
            kind: self.kind,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// The shared mutable world. Owned exclusively by the game engine task;
/// every mutation happens on that single task.
pub struct World {
    pub players: HashMap<Uuid, Player>,
    pub projectiles: HashMap<Uuid, Projectile>,
    pub power_ups: Vec<PowerUp>,
    pub arena: Arena,
    pub rng: ChaCha8Rng,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            players: HashMap::new(),
            projectiles: HashMap::new(),
            power_ups: Vec::new(),
            arena: Arena::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Random in-bounds position for spawns and power-ups
    pub fn spawn_position(&mut self) -> Position {
        Position {
            x: self.rng.gen_range(0.0..self.arena.width),
            y: self.rng.gen_range(0.0..self.arena.height),
        }
    }

    /// Remove a player and every projectile they own. Returns the removed
    /// player, or None if the id never joined.
    pub fn remove_player(&mut self, id: Uuid) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.projectiles.retain(|_, p| p.owner != id);
        Some(player)
    }

    pub fn remove_power_up(&mut self, id: Uuid) -> Option<PowerUp> {
        let idx = self.power_ups.iter().position(|pu| pu.id == id)?;
        Some(self.power_ups.remove(idx))
    }

    pub fn player_views(&self) -> HashMap<Uuid, PlayerView> {
        self.players.iter().map(|(id, p)| (*id, p.view())).collect()
    }

    pub fn bullet_views(&self) -> HashMap<Uuid, crate::ws::protocol::BulletView> {
        self.projectiles
            .iter()
            .map(|(id, p)| (*id, p.view()))
            .collect()
    }

    /// Full world snapshot handed to a joining player
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.player_views(),
            bullets: self.bullet_views(),
            power_ups: self.power_ups.iter().map(PowerUp::view).collect(),
            game_area: self.arena.view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::ProjectileKind;

    fn test_projectile(owner: Uuid) -> Projectile {
        Projectile {
            id: Uuid::new_v4(),
            owner,
            x: 100.0,
            y: 100.0,
            vx: 15.0,
            vy: 0.0,
            damage: 25,
            kind: ProjectileKind::Normal,
            target: None,
        }
    }

    #[test]
    fn spawn_positions_stay_in_bounds() {
        let mut world = World::new(7);
        for _ in 0..100 {
            let pos = world.spawn_position();
            assert!(world.arena.contains(pos.x, pos.y));
        }
    }

    #[test]
    fn removing_a_player_purges_owned_projectiles() {
        let mut world = World::new(1);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        world
            .players
            .insert(a, Player::new(a, "a".into(), String::new(), 0.0, 0.0));
        world
            .players
            .insert(b, Player::new(b, "b".into(), String::new(), 0.0, 0.0));

        let pa1 = test_projectile(a);
        let pa2 = test_projectile(a);
        let pb = test_projectile(b);
        world.projectiles.insert(pa1.id, pa1);
        world.projectiles.insert(pa2.id, pa2);
        world.projectiles.insert(pb.id, pb.clone());

        let removed = world.remove_player(a);
        assert!(removed.is_some());
        assert_eq!(world.projectiles.len(), 1);
        assert!(world.projectiles.contains_key(&pb.id));
    }

    #[test]
    fn respawn_resets_combat_state_and_orphans_reload_timers() {
        let id = Uuid::new_v4();
        let mut player = Player::new(id, "a".into(), String::new(), 10.0, 10.0);
        player.health = -5;
        player.alive = false;
        player.ammo = 0;
        player.reloading = true;
        player.power_up = Some(PowerUpKind::Homing);
        let seq_before = player.reload_seq;

        player.respawn_at(50.0, 60.0);

        assert_eq!(player.health, MAX_HEALTH);
        assert_eq!(player.ammo, AMMO_CAPACITY);
        assert!(!player.reloading);
        assert!(player.power_up.is_none());
        assert!(player.alive);
        assert_eq!(player.reload_seq, seq_before + 1);
        assert_eq!((player.x, player.y), (50.0, 60.0));
    }

    #[test]
    fn remove_power_up_by_id() {
        let mut world = World::new(3);
        let id = Uuid::new_v4();
        world.power_ups.push(PowerUp {
            id,
            kind: PowerUpKind::Triple,
            x: 10.0,
            y: 10.0,
            width: POWER_UP_SIZE,
            height: POWER_UP_SIZE,
        });

        assert!(world.remove_power_up(Uuid::new_v4()).is_none());
        assert_eq!(world.power_ups.len(), 1);

        let taken = world.remove_power_up(id).unwrap();
        assert_eq!(taken.kind, PowerUpKind::Triple);
        assert!(world.power_ups.is_empty());
    }
}
