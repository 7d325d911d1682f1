//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Power-up kinds that alter a player's firing pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    /// Three projectiles in a spread
    Triple,
    /// Single projectile that steers toward the nearest enemy
    Homing,
}

/// Projectile kinds (mirrors the power-up held at fire time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectileKind {
    Normal,
    Triple,
    Homing,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Enter the arena with a display name and skin reference
    JoinGame { name: String, skin: String },

    /// Client-reported position and facing for this frame
    PlayerMovement { x: f32, y: f32, rotation: f32 },

    /// Fire request; `x`/`y` is the muzzle position reported by the client.
    /// `reload` forces an immediate reload instead of firing.
    PlayerShoot {
        x: f32,
        y: f32,
        #[serde(default)]
        reload: bool,
    },

    /// Pick up a power-up by id
    CollectPowerUp { id: Uuid },

    /// Return to the arena after death
    Respawn,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Private reply to a join: assigned id, spawn position, full world state
    GameJoined {
        id: Uuid,
        position: Position,
        game_state: GameSnapshot,
    },

    /// A new player entered the arena
    PlayerJoined(PlayerView),

    /// A player moved (relayed to everyone but the mover)
    PlayerMoved {
        id: Uuid,
        x: f32,
        y: f32,
        rotation: f32,
    },

    /// Fire request rejected (private)
    ShootDenied { reason: String },

    /// Reload began; ammo is unavailable for the reload delay (private)
    ReloadStarted,

    /// Ammo count after a shot (private)
    AmmoUpdated { ammo: u32 },

    /// Reload finished, magazine full again (private)
    AmmoReloaded { ammo: u32 },

    /// Projectiles spawned by a single fire request
    BulletCreated { bullets: Vec<BulletView> },

    /// Full projectile map after a tick that changed projectile state
    BulletsUpdate { bullets: HashMap<Uuid, BulletView> },

    /// A projectile left the arena or hit a player
    BulletDestroyed { id: Uuid },

    /// A projectile struck a player
    BulletHit {
        bullet_id: Uuid,
        target_id: Uuid,
        damage: i32,
        health: i32,
    },

    /// Non-lethal hit: victim's remaining health
    PlayerDamaged { id: Uuid, health: i32 },

    /// Lethal hit
    PlayerKilled { killed: Uuid, killer: Uuid },

    /// A player's score changed (everyone)
    GlobalScoreUpdate { player_id: Uuid, score: u32 },

    /// Your score changed (private to the scorer)
    ScoreUpdated { score: u32 },

    /// A power-up appeared in the arena
    PowerUpSpawned(PowerUpView),

    /// A power-up was collected and transferred onto a player
    PowerUpCollected {
        player_id: Uuid,
        power_up_id: Uuid,
        power_up_type: PowerUpKind,
    },

    /// Private reply to a respawn request
    Respawned { position: Position },

    /// A dead player came back (relayed to everyone else)
    PlayerRespawned { id: Uuid, x: f32, y: f32 },

    /// A player left; their projectiles are gone with them
    PlayerDisconnected { id: Uuid },

    /// Periodic consistency backstop for scores
    ScoreboardSync { players: Vec<ScoreboardEntry> },
}

/// A 2D position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Player state as seen on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
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
    pub power_up: Option<PowerUpKind>,
    pub score: u32,
    pub alive: bool,
}

/// Projectile state as seen on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletView {
    pub id: Uuid,
    /// Owning player id
    pub player_id: Uuid,
    pub x: f32,
    pub y: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub damage: i32,
    #[serde(rename = "type")]
    pub kind: ProjectileKind,
    /// Homing target, if one was alive at fire time
    pub target: Option<Uuid>,
}

/// Power-up state as seen on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Arena bounds as seen on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameArea {
    pub width: f32,
    pub height: f32,
}

/// Full world state handed to a joining player
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub players: HashMap<Uuid, PlayerView>,
    pub bullets: HashMap<Uuid, BulletView>,
    pub power_ups: Vec<PowerUpView>,
    pub game_area: GameArea,
}

/// One row of the periodic scoreboard broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    pub alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msg_event_names_are_camel_case() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"joinGame","name":"ace","skin":"assets/skins/a.png"}"#)
                .unwrap();
        assert!(matches!(msg, ClientMsg::JoinGame { .. }));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"playerShoot","x":1.0,"y":2.0}"#).unwrap();
        match msg {
            ClientMsg::PlayerShoot { reload, .. } => assert!(!reload),
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"respawn"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Respawn));
    }

    #[test]
    fn server_msg_serializes_with_original_field_names() {
        let json = serde_json::to_value(ServerMsg::PowerUpCollected {
            player_id: Uuid::nil(),
            power_up_id: Uuid::nil(),
            power_up_type: PowerUpKind::Triple,
        })
        .unwrap();
        assert_eq!(json["type"], "powerUpCollected");
        assert_eq!(json["powerUpType"], "triple");
        assert!(json.get("playerId").is_some());

        let json = serde_json::to_value(ServerMsg::BulletHit {
            bullet_id: Uuid::nil(),
            target_id: Uuid::nil(),
            damage: 25,
            health: -5,
        })
        .unwrap();
        assert_eq!(json["type"], "bulletHit");
        assert_eq!(json["health"], -5);
    }

    #[test]
    fn bullet_view_kind_uses_type_key() {
        let view = BulletView {
            id: Uuid::nil(),
            player_id: Uuid::nil(),
            x: 0.0,
            y: 0.0,
            velocity_x: 15.0,
            velocity_y: 0.0,
            damage: 25,
            kind: ProjectileKind::Normal,
            target: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "normal");
        assert_eq!(json["playerId"], serde_json::json!(Uuid::nil()));
    }
}
