//! The authoritative game engine task
//!
//! One tokio task owns the [`World`]. Client events, disconnects, reload
//! timers and HTTP queries all arrive on a single command channel, and the
//! fixed-interval timers (tick, power-up spawner, scoreboard sync) run in
//! the same select loop, so no two mutations ever interleave.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::util::time::{POWER_UP_INTERVAL, RELOAD_DELAY, SCOREBOARD_INTERVAL, TICK_INTERVAL};
use crate::ws::protocol::{
    BulletView, ClientMsg, PlayerView, PowerUpKind, ProjectileKind, ScoreboardEntry, ServerMsg,
};

use super::combat::{self, Projectile, KILL_SCORE};
use super::physics::ProjectileStepper;
use super::world::{Player, PowerUp, World, AMMO_CAPACITY, MAX_POWER_UPS, POWER_UP_SIZE};
use super::{EngineCmd, Envelope, Scope};

/// Handle to the running engine, shared with the WS and HTTP layers
#[derive(Clone)]
pub struct GameHandle {
    pub cmd_tx: mpsc::Sender<EngineCmd>,
    pub events_tx: broadcast::Sender<Envelope>,
    pub player_count: Arc<AtomicUsize>,
}

impl GameHandle {
    /// Number of players currently in the arena
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    /// Subscribe to the outbound event stream
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.events_tx.subscribe()
    }

    /// Fetch the current player projections from the engine
    pub async fn players(&self) -> Option<Vec<PlayerView>> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(EngineCmd::Players(tx)).await.ok()?;
        rx.await.ok()
    }
}

/// The authoritative simulation
pub struct GameEngine {
    world: World,
    cmd_rx: mpsc::Receiver<EngineCmd>,
    /// Kept for reload timers, which report back through the command queue
    cmd_tx: mpsc::Sender<EngineCmd>,
    events_tx: broadcast::Sender<Envelope>,
    player_count: Arc<AtomicUsize>,
}

impl GameEngine {
    pub fn new(seed: u64) -> (Self, GameHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let (events_tx, _) = broadcast::channel(256);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = GameHandle {
            cmd_tx: cmd_tx.clone(),
            events_tx: events_tx.clone(),
            player_count: player_count.clone(),
        };

        let engine = Self {
            world: World::new(seed),
            cmd_rx,
            cmd_tx,
            events_tx,
            player_count,
        };

        (engine, handle)
    }

    /// Run the engine until every command sender is gone
    pub async fn run(mut self) {
        info!("Game engine started");

        let mut tick = interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut power_up_timer = interval(POWER_UP_INTERVAL);
        let mut scoreboard_timer = interval(SCOREBOARD_INTERVAL);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_cmd(cmd),
                    None => break,
                },
                _ = tick.tick() => self.step_projectiles(),
                _ = power_up_timer.tick() => self.spawn_power_up(),
                _ = scoreboard_timer.tick() => self.sync_scoreboard(),
            }
        }

        info!("Game engine stopped");
    }

    fn handle_cmd(&mut self, cmd: EngineCmd) {
        match cmd {
            EngineCmd::Client { conn_id, msg } => match msg {
                ClientMsg::JoinGame { name, skin } => self.handle_join(conn_id, name, skin),
                ClientMsg::PlayerMovement { x, y, rotation } => {
                    self.handle_movement(conn_id, x, y, rotation)
                }
                ClientMsg::PlayerShoot { x, y, reload } => {
                    self.handle_shoot(conn_id, x, y, reload)
                }
                ClientMsg::CollectPowerUp { id } => self.handle_collect(conn_id, id),
                ClientMsg::Respawn => self.handle_respawn(conn_id),
            },
            EngineCmd::Disconnect { conn_id } => self.handle_disconnect(conn_id),
            EngineCmd::ReloadComplete { conn_id, seq } => {
                self.handle_reload_complete(conn_id, seq)
            }
            EngineCmd::Players(reply) => {
                let _ = reply.send(self.world.players.values().map(Player::view).collect());
            }
        }
    }

    // ------------------------------------------------------------------
    // Inbound event handlers
    // ------------------------------------------------------------------

    fn handle_join(&mut self, conn_id: Uuid, name: String, skin: String) {
        if self.world.players.contains_key(&conn_id) {
            warn!(player_id = %conn_id, "Join ignored, already in the arena");
            return;
        }

        let position = self.world.spawn_position();
        let player = Player::new(conn_id, name, skin, position.x, position.y);
        let view = player.view();
        self.world.players.insert(conn_id, player);
        self.player_count
            .store(self.world.players.len(), Ordering::Relaxed);

        info!(
            player_id = %conn_id,
            name = %view.name,
            player_count = self.world.players.len(),
            "Player joined the arena"
        );

        self.emit_to(
            conn_id,
            ServerMsg::GameJoined {
                id: conn_id,
                position,
                game_state: self.world.snapshot(),
            },
        );
        self.emit_except(conn_id, ServerMsg::PlayerJoined(view));
    }

    fn handle_movement(&mut self, conn_id: Uuid, x: f32, y: f32, rotation: f32) {
        let Some(player) = self.world.players.get_mut(&conn_id) else {
            return;
        };
        if !player.alive {
            return;
        }
        player.x = x;
        player.y = y;
        player.rotation = rotation;

        self.emit_except(conn_id, ServerMsg::PlayerMoved { id: conn_id, x, y, rotation });
    }

    /// Fire request. Walks the reload state machine before anything leaves
    /// the barrel: reloading denies, an empty magazine starts a reload, an
    /// explicit reload flag dumps the magazine, otherwise one ammo covers
    /// the whole pattern of the held power-up.
    fn handle_shoot(&mut self, conn_id: Uuid, x: f32, y: f32, reload: bool) {
        let Some(player) = self.world.players.get(&conn_id) else {
            return;
        };
        if !player.alive {
            return;
        }
        if player.reloading {
            self.emit_to(
                conn_id,
                ServerMsg::ShootDenied {
                    reason: "reloading".to_string(),
                },
            );
            return;
        }
        if player.ammo == 0 {
            self.start_reload(conn_id);
            return;
        }
        if reload {
            if let Some(p) = self.world.players.get_mut(&conn_id) {
                p.ammo = 0;
            }
            self.start_reload(conn_id);
            return;
        }

        let ammo = match self.world.players.get_mut(&conn_id) {
            Some(p) => {
                p.ammo -= 1;
                p.ammo
            }
            None => return,
        };
        self.emit_to(conn_id, ServerMsg::AmmoUpdated { ammo });

        let shots = match self.world.players.get(&conn_id) {
            Some(shooter) => combat::spawn_shots(shooter, x, y, &self.world.players),
            None => return,
        };
        let views: Vec<BulletView> = shots.iter().map(Projectile::view).collect();
        for shot in shots {
            self.world.projectiles.insert(shot.id, shot);
        }
        self.emit_all(ServerMsg::BulletCreated { bullets: views });

        if ammo == 0 {
            self.start_reload(conn_id);
        }
    }

    fn handle_collect(&mut self, conn_id: Uuid, power_up_id: Uuid) {
        if !self.world.players.contains_key(&conn_id) {
            return;
        }
        let Some(power_up) = self.world.remove_power_up(power_up_id) else {
            return;
        };
        if let Some(player) = self.world.players.get_mut(&conn_id) {
            player.power_up = Some(power_up.kind);
        }

        info!(player_id = %conn_id, kind = ?power_up.kind, "Power-up collected");
        self.emit_all(ServerMsg::PowerUpCollected {
            player_id: conn_id,
            power_up_id,
            power_up_type: power_up.kind,
        });
    }

    fn handle_respawn(&mut self, conn_id: Uuid) {
        match self.world.players.get(&conn_id) {
            Some(player) if !player.alive => {}
            _ => return,
        }

        let position = self.world.spawn_position();
        if let Some(player) = self.world.players.get_mut(&conn_id) {
            player.respawn_at(position.x, position.y);
        }

        info!(player_id = %conn_id, "Player respawned");
        self.emit_to(conn_id, ServerMsg::Respawned { position });
        self.emit_except(
            conn_id,
            ServerMsg::PlayerRespawned {
                id: conn_id,
                x: position.x,
                y: position.y,
            },
        );
    }

    fn handle_disconnect(&mut self, conn_id: Uuid) {
        let Some(player) = self.world.remove_player(conn_id) else {
            return;
        };
        self.player_count
            .store(self.world.players.len(), Ordering::Relaxed);

        info!(
            player_id = %conn_id,
            name = %player.name,
            player_count = self.world.players.len(),
            "Player disconnected"
        );
        self.emit_all(ServerMsg::PlayerDisconnected { id: conn_id });
    }

    // ------------------------------------------------------------------
    // Reload state machine
    // ------------------------------------------------------------------

    /// Enter the reloading state and schedule the refill. The timer carries
    /// the player's sequence token; a disconnect or respawn in the meantime
    /// bumps or removes it, turning the completion into a no-op.
    fn start_reload(&mut self, conn_id: Uuid) {
        let seq = match self.world.players.get_mut(&conn_id) {
            Some(p) if !p.reloading => {
                p.reloading = true;
                p.reload_seq += 1;
                p.reload_seq
            }
            _ => return,
        };

        self.emit_to(conn_id, ServerMsg::ReloadStarted);

        let cmd_tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RELOAD_DELAY).await;
            let _ = cmd_tx
                .send(EngineCmd::ReloadComplete { conn_id, seq })
                .await;
        });
    }

    fn handle_reload_complete(&mut self, conn_id: Uuid, seq: u64) {
        let Some(player) = self.world.players.get_mut(&conn_id) else {
            return;
        };
        if !player.reloading || player.reload_seq != seq {
            return;
        }
        player.ammo = AMMO_CAPACITY;
        player.reloading = false;

        self.emit_to(conn_id, ServerMsg::AmmoReloaded { ammo: AMMO_CAPACITY });
    }

    // ------------------------------------------------------------------
    // Tick: projectile stepping and collision resolution
    // ------------------------------------------------------------------

    fn step_projectiles(&mut self) {
        // A tick with no projectiles changes nothing and broadcasts nothing.
        if self.world.projectiles.is_empty() {
            return;
        }

        // Steering reads player positions; collect them first so the
        // projectile map can be mutated freely.
        let alive_positions: std::collections::HashMap<Uuid, (f32, f32)> = self
            .world
            .players
            .iter()
            .filter(|(_, p)| p.alive)
            .map(|(id, p)| (*id, (p.x, p.y)))
            .collect();

        for projectile in self.world.projectiles.values_mut() {
            if projectile.kind == ProjectileKind::Homing {
                if let Some(&(tx, ty)) = projectile
                    .target
                    .and_then(|t| alive_positions.get(&t))
                {
                    ProjectileStepper::steer_homing(projectile, tx, ty);
                }
            }
            ProjectileStepper::integrate(projectile);
        }

        let out_of_bounds: Vec<Uuid> = self
            .world
            .projectiles
            .values()
            .filter(|p| !self.world.arena.contains(p.x, p.y))
            .map(|p| p.id)
            .collect();
        for id in out_of_bounds {
            self.world.projectiles.remove(&id);
            self.emit_all(ServerMsg::BulletDestroyed { id });
        }

        // Hits resolve sequentially: a victim killed by an earlier
        // projectile this tick is already dead for the later ones.
        let in_flight: Vec<(Uuid, Uuid, f32, f32, i32)> = self
            .world
            .projectiles
            .values()
            .map(|p| (p.id, p.owner, p.x, p.y, p.damage))
            .collect();
        for (id, owner, x, y, damage) in in_flight {
            let Some(victim_id) =
                combat::closest_target_in_radius(&self.world.players, owner, x, y)
            else {
                continue;
            };
            self.world.projectiles.remove(&id);
            self.resolve_hit(id, owner, victim_id, damage);
        }

        self.emit_all(ServerMsg::BulletsUpdate {
            bullets: self.world.bullet_views(),
        });
    }

    fn resolve_hit(&mut self, bullet_id: Uuid, owner: Uuid, victim_id: Uuid, damage: i32) {
        let health = match self.world.players.get_mut(&victim_id) {
            Some(victim) => {
                victim.health -= damage;
                victim.health
            }
            None => return,
        };

        self.emit_all(ServerMsg::BulletHit {
            bullet_id,
            target_id: victim_id,
            damage,
            health,
        });
        self.emit_all(ServerMsg::BulletDestroyed { id: bullet_id });

        if health > 0 {
            self.emit_all(ServerMsg::PlayerDamaged {
                id: victim_id,
                health,
            });
            return;
        }

        if let Some(victim) = self.world.players.get_mut(&victim_id) {
            victim.alive = false;
        }

        // The owner may have disconnected while the projectile was in
        // flight; the kill still happens, the score just has nowhere to go.
        let new_score = self.world.players.get_mut(&owner).map(|shooter| {
            shooter.score += KILL_SCORE;
            shooter.score
        });
        if let Some(score) = new_score {
            self.emit_all(ServerMsg::GlobalScoreUpdate {
                player_id: owner,
                score,
            });
            self.emit_to(owner, ServerMsg::ScoreUpdated { score });
        }

        info!(killed = %victim_id, killer = %owner, "Player killed");
        self.emit_all(ServerMsg::PlayerKilled {
            killed: victim_id,
            killer: owner,
        });
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    fn spawn_power_up(&mut self) {
        if self.world.players.is_empty() || self.world.power_ups.len() >= MAX_POWER_UPS {
            return;
        }

        let kind = if self.world.rng.gen_bool(0.5) {
            PowerUpKind::Triple
        } else {
            PowerUpKind::Homing
        };
        let position = self.world.spawn_position();
        let power_up = PowerUp {
            id: Uuid::new_v4(),
            kind,
            x: position.x,
            y: position.y,
            width: POWER_UP_SIZE,
            height: POWER_UP_SIZE,
        };
        let view = power_up.view();
        self.world.power_ups.push(power_up);

        info!(kind = ?kind, "Power-up spawned");
        self.emit_all(ServerMsg::PowerUpSpawned(view));
    }

    fn sync_scoreboard(&mut self) {
        if self.world.players.is_empty() {
            return;
        }
        let players: Vec<ScoreboardEntry> = self
            .world
            .players
            .values()
            .map(|p| ScoreboardEntry {
                id: p.id,
                name: p.name.clone(),
                score: p.score,
                alive: p.alive,
            })
            .collect();
        self.emit_all(ServerMsg::ScoreboardSync { players });
    }

    // ------------------------------------------------------------------
    // Broadcast helpers
    // ------------------------------------------------------------------

    fn emit(&self, scope: Scope, msg: ServerMsg) {
        let _ = self.events_tx.send(Envelope { scope, msg });
    }

    fn emit_all(&self, msg: ServerMsg) {
        self.emit(Scope::All, msg);
    }

    fn emit_to(&self, conn_id: Uuid, msg: ServerMsg) {
        self.emit(Scope::To(conn_id), msg);
    }

    fn emit_except(&self, conn_id: Uuid, msg: ServerMsg) {
        self.emit(Scope::Except(conn_id), msg);
    }
}
