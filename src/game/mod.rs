//! Game simulation modules

pub mod arena;
pub mod entities;
pub mod store;

pub use arena::{Arena, ArenaHandle};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// A command serialized onto the arena task. The arena is the only owner
/// of game state; everything that mutates it arrives through this type.
#[derive(Debug)]
pub enum ArenaCommand {
    /// Transport opened a session; `outbound` carries its server messages
    Connect {
        session_id: Uuid,
        outbound: mpsc::UnboundedSender<ServerMsg>,
    },

    /// Transport reported the session closed
    Disconnect { session_id: Uuid },

    /// Inbound client message, stamped when the transport received it
    Client {
        session_id: Uuid,
        msg: ClientMsg,
        received_at: u64,
    },

    /// A respawn timer fired for a dead player
    Respawn { session_id: Uuid },
}
