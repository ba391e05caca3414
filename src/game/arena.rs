//! Arena state and authoritative tick loop
//!
//! A single task owns the entity store. Client commands arrive over a
//! channel and are drained in arrival order at each tick boundary, then
//! the simulation advances one step. No locks anywhere; the task is the
//! serialization point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{tick_duration, SIMULATION_TPS};
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::entities::{
    Bullet, Direction, Player, ARENA_HEIGHT, ARENA_WIDTH, KILL_SCORE, PLAYER_PALETTE,
    RESPAWN_DELAY_MS, SPAWN_MARGIN,
};
use super::store::EntityStore;
use super::ArenaCommand;

/// Outbound delivery to connected sessions.
///
/// Two scopes: to one session (join ack, state snapshot) and to all.
/// Delivery is best-effort; a session that is gone simply misses out.
pub struct SessionRouter {
    sessions: HashMap<Uuid, mpsc::UnboundedSender<ServerMsg>>,
}

impl SessionRouter {
    fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    fn register(&mut self, session_id: Uuid, outbound: mpsc::UnboundedSender<ServerMsg>) {
        self.sessions.insert(session_id, outbound);
    }

    fn unregister(&mut self, session_id: &Uuid) {
        self.sessions.remove(session_id);
    }

    pub fn send_to(&self, session_id: &Uuid, msg: ServerMsg) {
        if let Some(tx) = self.sessions.get(session_id) {
            let _ = tx.send(msg);
        }
    }

    pub fn broadcast(&self, msg: ServerMsg) {
        for tx in self.sessions.values() {
            let _ = tx.send(msg.clone());
        }
    }

    pub fn broadcast_except(&self, skip: &Uuid, msg: ServerMsg) {
        for (session_id, tx) in &self.sessions {
            if session_id != skip {
                let _ = tx.send(msg.clone());
            }
        }
    }
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    pub cmd_tx: mpsc::Sender<ArenaCommand>,
    player_count: Arc<AtomicUsize>,
}

impl ArenaHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// The authoritative arena
pub struct Arena {
    store: EntityStore,
    sessions: SessionRouter,
    cmd_rx: mpsc::Receiver<ArenaCommand>,
    /// Kept so respawn timers can message the arena back
    cmd_tx: mpsc::Sender<ArenaCommand>,
    /// Pending respawns, keyed by player id and aborted on disconnect
    respawn_timers: HashMap<Uuid, AbortHandle>,
    rng: ChaCha8Rng,
    player_count: Arc<AtomicUsize>,
}

impl Arena {
    pub fn new(seed: u64) -> (Self, ArenaHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = ArenaHandle {
            cmd_tx: cmd_tx.clone(),
            player_count: player_count.clone(),
        };

        let arena = Self {
            store: EntityStore::new(),
            sessions: SessionRouter::new(),
            cmd_rx,
            cmd_tx,
            respawn_timers: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            player_count,
        };

        (arena, handle)
    }

    /// Run the authoritative tick loop
    pub async fn run(mut self) {
        info!(tps = SIMULATION_TPS, "Arena started");

        let mut ticker = interval(tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.drain_commands();
            self.step();
        }
    }

    /// Apply all pending commands in arrival order
    fn drain_commands(&mut self) {
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            self.handle_command(cmd);
        }
    }

    fn handle_command(&mut self, cmd: ArenaCommand) {
        match cmd {
            ArenaCommand::Connect {
                session_id,
                outbound,
            } => {
                self.sessions.register(session_id, outbound);
                debug!(session_id = %session_id, "Session connected");
            }
            ArenaCommand::Disconnect { session_id } => self.handle_disconnect(session_id),
            ArenaCommand::Client {
                session_id,
                msg,
                received_at,
            } => match msg {
                ClientMsg::JoinGame { name } => self.handle_join(session_id, name),
                ClientMsg::PlayerMove { direction } => self.handle_move(session_id, direction),
                ClientMsg::PlayerShoot => self.handle_shoot(session_id, received_at),
            },
            ArenaCommand::Respawn { session_id } => self.handle_respawn(session_id),
        }
    }

    /// Handle a join request. Rejoin without disconnect is a no-op.
    fn handle_join(&mut self, session_id: Uuid, name: Option<String>) {
        if self.store.contains_player(&session_id) {
            warn!(session_id = %session_id, "Join ignored, player already in arena");
            return;
        }

        let color = PLAYER_PALETTE[self.store.player_count() % PLAYER_PALETTE.len()].to_string();
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Player{}", self.store.player_count() + 1));
        let (x, y) = self.spawn_position();

        let player = Player::new(session_id, name, color, x, y);
        let joined = player.clone();
        self.store.insert_player(player);
        self.player_count
            .store(self.store.player_count(), Ordering::Relaxed);

        // Ack to the joiner, announcement to everyone else
        self.sessions.send_to(
            &session_id,
            ServerMsg::PlayerJoined {
                id: session_id,
                player: joined.clone(),
            },
        );
        self.sessions.broadcast_except(
            &session_id,
            ServerMsg::PlayerJoined {
                id: session_id,
                player: joined,
            },
        );

        // Full snapshot goes to the joiner only
        self.sessions.send_to(
            &session_id,
            ServerMsg::GameState {
                players: self.store.players_snapshot(),
                bullets: self.store.bullets_snapshot(),
            },
        );

        info!(
            session_id = %session_id,
            players = self.store.player_count(),
            "Player joined arena"
        );
    }

    fn handle_move(&mut self, session_id: Uuid, direction: Direction) {
        if let Some(player) = self.store.player_mut(&session_id) {
            player.apply_move(direction);
            let (x, y) = (player.x, player.y);
            self.sessions.broadcast(ServerMsg::PlayerMoved {
                id: session_id,
                x,
                y,
                direction,
            });
        }
    }

    fn handle_shoot(&mut self, session_id: Uuid, now: u64) {
        if let Some(player) = self.store.player_mut(&session_id) {
            // Cooldown misses are dropped with no feedback
            if let Some(bullet) = player.try_shoot(now) {
                self.sessions.broadcast(ServerMsg::BulletShot(bullet.clone()));
                self.store.insert_bullet(bullet);
            }
        }
    }

    fn handle_disconnect(&mut self, session_id: Uuid) {
        self.sessions.unregister(&session_id);

        if let Some(timer) = self.respawn_timers.remove(&session_id) {
            timer.abort();
        }

        // Bullets the player fired keep flying and may still score
        if self.store.remove_player(&session_id).is_some() {
            self.player_count
                .store(self.store.player_count(), Ordering::Relaxed);
            self.sessions
                .broadcast(ServerMsg::PlayerLeft { id: session_id });
            info!(
                session_id = %session_id,
                players = self.store.player_count(),
                "Player left arena"
            );
        }
    }

    /// A respawn timer fired. The timer is aborted on disconnect, but a
    /// fired command can already be in flight; the presence check covers
    /// that race.
    fn handle_respawn(&mut self, session_id: Uuid) {
        self.respawn_timers.remove(&session_id);

        if !self.store.contains_player(&session_id) {
            return;
        }

        let (x, y) = self.spawn_position();
        if let Some(player) = self.store.player_mut(&session_id) {
            player.respawn_at(x, y);
            let health = player.health;
            self.sessions.broadcast(ServerMsg::PlayerRespawned {
                id: session_id,
                x,
                y,
                health,
            });
            debug!(session_id = %session_id, "Player respawned");
        }
    }

    /// Advance the simulation one tick: move bullets, resolve collisions
    fn step(&mut self) {
        // Snapshot ids up front; bullets are removed mid-sweep
        for bullet_id in self.store.bullet_ids() {
            let Some(bullet) = self.store.bullet_mut(&bullet_id) else {
                continue;
            };

            if !bullet.advance() {
                self.store.remove_bullet(&bullet_id);
                self.sessions
                    .broadcast(ServerMsg::BulletRemoved { id: bullet_id });
                continue;
            }

            let bullet = bullet.clone();

            // First overlapping player in iteration order wins; the owner
            // is never a target
            let mut target = None;
            for player_id in self.store.player_ids() {
                if player_id == bullet.owner_id {
                    continue;
                }
                if let Some(player) = self.store.player(&player_id) {
                    if bullet.overlaps(player) {
                        target = Some(player_id);
                        break;
                    }
                }
            }

            if let Some(target_id) = target {
                self.store.remove_bullet(&bullet_id);
                self.sessions
                    .broadcast(ServerMsg::BulletRemoved { id: bullet_id });
                self.resolve_hit(&bullet, target_id);
            }
        }
    }

    fn resolve_hit(&mut self, bullet: &Bullet, target_id: Uuid) {
        let Some(target) = self.store.player_mut(&target_id) else {
            return;
        };

        let was_alive = target.is_alive();
        target.apply_damage(bullet.damage);
        let health = target.health;

        self.sessions.broadcast(ServerMsg::PlayerHit {
            player_id: target_id,
            health,
            damage: bullet.damage,
        });

        // Death is edge-triggered: hits on an already-dead player report
        // the hit but never re-kill
        if was_alive && health == 0 {
            self.resolve_kill(target_id, bullet.owner_id);
        }
    }

    fn resolve_kill(&mut self, victim_id: Uuid, killer_id: Uuid) {
        // The killer may have disconnected while the bullet was in flight;
        // the kill still resolves and carries the credit amount
        let score = match self.store.player_mut(&killer_id) {
            Some(killer) => {
                killer.score += KILL_SCORE;
                killer.score
            }
            None => KILL_SCORE,
        };

        self.sessions.broadcast(ServerMsg::PlayerDied {
            player_id: victim_id,
            killer_id,
            score,
        });
        info!(victim = %victim_id, killer = %killer_id, "Player died");

        self.schedule_respawn(victim_id);
    }

    /// One-shot deferred respawn, cancellable by id on disconnect
    fn schedule_respawn(&mut self, session_id: Uuid) {
        let cmd_tx = self.cmd_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(RESPAWN_DELAY_MS)).await;
            let _ = cmd_tx.send(ArenaCommand::Respawn { session_id }).await;
        });

        if let Some(prev) = self.respawn_timers.insert(session_id, task.abort_handle()) {
            prev.abort();
        }
    }

    fn spawn_position(&mut self) -> (f32, f32) {
        let x = self.rng.gen_range(SPAWN_MARGIN..ARENA_WIDTH - SPAWN_MARGIN);
        let y = self.rng.gen_range(SPAWN_MARGIN..ARENA_HEIGHT - SPAWN_MARGIN);
        (x, y)
    }
}
