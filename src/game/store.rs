//! Entity store - the single source of truth for players and bullets
//!
//! The store is owned exclusively by the arena task. Nothing outside the
//! task holds references across ticks; callers re-fetch by id each time,
//! and iteration goes through snapshotted key lists so entities can be
//! removed mid-sweep without skipping or duplicating the rest.

use std::collections::HashMap;

use uuid::Uuid;

use super::entities::{Bullet, Player};

#[derive(Debug, Default)]
pub struct EntityStore {
    players: HashMap<Uuid, Player>,
    bullets: HashMap<Uuid, Bullet>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, id: &Uuid) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &Uuid) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn insert_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: &Uuid) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn contains_player(&self, id: &Uuid) -> bool {
        self.players.contains_key(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Snapshot of current player ids, safe to iterate while mutating
    pub fn player_ids(&self) -> Vec<Uuid> {
        self.players.keys().copied().collect()
    }

    pub fn bullet_mut(&mut self, id: &Uuid) -> Option<&mut Bullet> {
        self.bullets.get_mut(id)
    }

    pub fn insert_bullet(&mut self, bullet: Bullet) {
        self.bullets.insert(bullet.id, bullet);
    }

    pub fn remove_bullet(&mut self, id: &Uuid) -> Option<Bullet> {
        self.bullets.remove(id)
    }

    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    /// Snapshot of current bullet ids, safe to iterate while mutating
    pub fn bullet_ids(&self) -> Vec<Uuid> {
        self.bullets.keys().copied().collect()
    }

    /// Full-state copies for the join-time snapshot message
    pub fn players_snapshot(&self) -> HashMap<Uuid, Player> {
        self.players.clone()
    }

    pub fn bullets_snapshot(&self) -> HashMap<Uuid, Bullet> {
        self.bullets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Direction;

    fn player(x: f32, y: f32) -> Player {
        Player::new(Uuid::new_v4(), "p".to_string(), "#4ECDC4".to_string(), x, y)
    }

    #[test]
    fn test_player_roundtrip() {
        let mut store = EntityStore::new();
        let p = player(100.0, 100.0);
        let id = p.id;

        store.insert_player(p);
        assert!(store.contains_player(&id));
        assert_eq!(store.player_count(), 1);

        store.player_mut(&id).unwrap().apply_move(Direction::Up);
        assert_eq!(store.player(&id).unwrap().direction, Direction::Up);

        assert!(store.remove_player(&id).is_some());
        assert!(store.player(&id).is_none());
        assert!(store.remove_player(&id).is_none());
    }

    #[test]
    fn test_removal_during_id_sweep_visits_every_other_entity() {
        let mut store = EntityStore::new();
        let shooter = player(400.0, 300.0);
        for i in 0..10 {
            let mut b = Bullet::new(&shooter);
            b.x = i as f32;
            store.insert_bullet(b);
        }

        let ids = store.bullet_ids();
        assert_eq!(ids.len(), 10);

        let mut visited = 0;
        for id in ids {
            // Remove as we go; the snapshot must still yield each id once
            assert!(store.remove_bullet(&id).is_some());
            visited += 1;
        }
        assert_eq!(visited, 10);
        assert_eq!(store.bullet_count(), 0);
    }
}
