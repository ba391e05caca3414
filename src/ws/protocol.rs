//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::entities::{Bullet, Direction, Player};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Enter the arena
    JoinGame {
        /// Display name; server assigns a default when absent or empty
        #[serde(default)]
        name: Option<String>,
    },

    /// Move one step and aim in the given direction
    PlayerMove { direction: Direction },

    /// Fire in the current aim direction (cooldown-gated server-side)
    PlayerShoot,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// A player entered the arena (sent to the joiner and broadcast to
    /// everyone else)
    PlayerJoined { id: Uuid, player: Player },

    /// Full state snapshot, sent privately to a session right after join
    GameState {
        players: HashMap<Uuid, Player>,
        bullets: HashMap<Uuid, Bullet>,
    },

    /// A player moved and/or changed aim
    PlayerMoved {
        id: Uuid,
        x: f32,
        y: f32,
        direction: Direction,
    },

    /// A bullet entered the arena
    BulletShot(Bullet),

    /// A bullet left the arena or struck a player
    BulletRemoved { id: Uuid },

    /// A bullet struck a player
    PlayerHit {
        player_id: Uuid,
        health: i32,
        damage: i32,
    },

    /// A player's health reached zero; `score` is the killer's credit
    PlayerDied {
        player_id: Uuid,
        killer_id: Uuid,
        score: u32,
    },

    /// A dead player came back at a fresh position
    PlayerRespawned {
        id: Uuid,
        x: f32,
        y: f32,
        health: i32,
    },

    /// A player disconnected
    PlayerLeft { id: Uuid },
}
