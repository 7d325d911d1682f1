//! Game simulation modules

pub mod combat;
pub mod engine;
pub mod physics;
pub mod world;

pub use engine::{GameEngine, GameHandle};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, PlayerView, ServerMsg};

/// Command consumed by the game engine task. Everything that touches the
/// world goes through this channel, so mutations never interleave.
#[derive(Debug)]
pub enum EngineCmd {
    /// Inbound client event, in per-connection arrival order
    Client { conn_id: Uuid, msg: ClientMsg },
    /// Connection closed; purge the player and their projectiles
    Disconnect { conn_id: Uuid },
    /// A reload timer fired. Applied only if the player still exists and
    /// the sequence token matches (no-op after disconnect or respawn).
    ReloadComplete { conn_id: Uuid, seq: u64 },
    /// Read-only projection of all players for the HTTP layer
    Players(oneshot::Sender<Vec<PlayerView>>),
}

/// Delivery scope for an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every connection
    All,
    /// Every connection except the named one
    Except(Uuid),
    /// Only the named connection
    To(Uuid),
}

impl Scope {
    pub fn delivers_to(&self, conn_id: Uuid) -> bool {
        match self {
            Scope::All => true,
            Scope::Except(id) => *id != conn_id,
            Scope::To(id) => *id == conn_id,
        }
    }
}

/// Outbound message plus its delivery scope. The engine fans these out on
/// one broadcast channel; each connection's writer task filters by scope.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub scope: Scope,
    pub msg: ServerMsg,
}
