//! Game entities and the per-entity simulation rules

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Arena dimensions in world units
pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;

/// Player hitbox is a fixed square
pub const PLAYER_SIZE: f32 = 40.0;
/// Distance covered per accepted move command
pub const PLAYER_SPEED: f32 = 5.0;
pub const PLAYER_MAX_HEALTH: i32 = 100;

pub const BULLET_SIZE: f32 = 6.0;
/// Distance a bullet covers per simulation tick
pub const BULLET_SPEED: f32 = 8.0;
pub const BULLET_DAMAGE: i32 = 20;

pub const SHOOT_COOLDOWN_MS: u64 = 300;
pub const RESPAWN_DELAY_MS: u64 = 2000;
pub const KILL_SCORE: u32 = 100;

/// Spawn positions keep this margin from the arena edges
pub const SPAWN_MARGIN: f32 = 50.0;

/// Join colors, assigned round-robin by join order
pub const PLAYER_PALETTE: [&str; 5] = ["#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7"];

/// Movement / aiming direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Axis offset for travelling `dist` units in this direction
    pub fn offset(self, dist: f32) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -dist),
            Direction::Down => (0.0, dist),
            Direction::Left => (-dist, 0.0),
            Direction::Right => (dist, 0.0),
        }
    }
}

/// Player state (authoritative)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub speed: f32,
    /// 0..=100; 0 means dead and awaiting respawn
    pub health: i32,
    pub score: u32,
    /// Last movement direction, doubles as aim
    pub direction: Direction,
    /// Timestamp (unix millis) of the last accepted shot
    pub last_shot_at: u64,
    pub shoot_cooldown_ms: u64,
}

impl Player {
    pub fn new(id: Uuid, name: String, color: String, x: f32, y: f32) -> Self {
        Self {
            id,
            name,
            x,
            y,
            width: PLAYER_SIZE,
            height: PLAYER_SIZE,
            color,
            speed: PLAYER_SPEED,
            health: PLAYER_MAX_HEALTH,
            score: 0,
            direction: Direction::Right,
            last_shot_at: 0,
            shoot_cooldown_ms: SHOOT_COOLDOWN_MS,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Step one move command in `direction`, clamped to arena bounds.
    /// Also updates the aim direction.
    pub fn apply_move(&mut self, direction: Direction) {
        let (dx, dy) = direction.offset(self.speed);
        self.x = (self.x + dx).clamp(0.0, ARENA_WIDTH - self.width);
        self.y = (self.y + dy).clamp(0.0, ARENA_HEIGHT - self.height);
        self.direction = direction;
    }

    /// Attempt to fire at `now` (unix millis). Returns the spawned bullet,
    /// or `None` when still inside the cooldown window.
    pub fn try_shoot(&mut self, now: u64) -> Option<Bullet> {
        if now.saturating_sub(self.last_shot_at) < self.shoot_cooldown_ms {
            return None;
        }
        self.last_shot_at = now;
        Some(Bullet::new(self))
    }

    /// Apply damage with the health floored at 0.
    /// Returns true when health is now 0.
    pub fn apply_damage(&mut self, damage: i32) -> bool {
        self.health = (self.health - damage).max(0);
        self.health == 0
    }

    /// Reset to full health at a fresh position
    pub fn respawn_at(&mut self, x: f32, y: f32) {
        self.health = PLAYER_MAX_HEALTH;
        self.x = x;
        self.y = y;
    }
}

/// Active bullet in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Inherited from the owner at fire time, immutable thereafter
    pub direction: Direction,
    pub speed: f32,
    pub damage: i32,
    pub width: f32,
    pub height: f32,
}

impl Bullet {
    /// Spawn at the owner's center, travelling in the owner's aim direction
    pub fn new(owner: &Player) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            x: owner.x + owner.width / 2.0,
            y: owner.y + owner.height / 2.0,
            direction: owner.direction,
            speed: BULLET_SPEED,
            damage: BULLET_DAMAGE,
            width: BULLET_SIZE,
            height: BULLET_SIZE,
        }
    }

    /// Advance one tick. Returns false once the bullet has left the arena.
    pub fn advance(&mut self) -> bool {
        let (dx, dy) = self.direction.offset(self.speed);
        self.x += dx;
        self.y += dy;
        (0.0..=ARENA_WIDTH).contains(&self.x) && (0.0..=ARENA_HEIGHT).contains(&self.y)
    }

    /// Axis-aligned bounding box overlap against a player
    pub fn overlaps(&self, player: &Player) -> bool {
        self.x < player.x + player.width
            && self.x + self.width > player.x
            && self.y < player.y + player.height
            && self.y + self.height > player.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Uuid::new_v4(), "tester".to_string(), "#FF6B6B".to_string(), x, y)
    }

    #[test]
    fn test_move_clamps_to_arena_bounds() {
        let mut player = player_at(10.0, 10.0);

        for _ in 0..200 {
            player.apply_move(Direction::Left);
            player.apply_move(Direction::Up);
        }
        assert_eq!(player.x, 0.0);
        assert_eq!(player.y, 0.0);

        for _ in 0..400 {
            player.apply_move(Direction::Right);
            player.apply_move(Direction::Down);
        }
        assert_eq!(player.x, ARENA_WIDTH - PLAYER_SIZE);
        assert_eq!(player.y, ARENA_HEIGHT - PLAYER_SIZE);
    }

    #[test]
    fn test_move_updates_aim_direction() {
        let mut player = player_at(100.0, 100.0);
        player.apply_move(Direction::Up);
        assert_eq!(player.direction, Direction::Up);
    }

    #[test]
    fn test_shoot_cooldown_gate() {
        let mut player = player_at(100.0, 100.0);

        assert!(player.try_shoot(10_000).is_some());
        // Inside the window: silently dropped
        assert!(player.try_shoot(10_000 + SHOOT_COOLDOWN_MS - 1).is_none());
        // Dropped shots must not reset the window
        assert!(player.try_shoot(10_000 + SHOOT_COOLDOWN_MS).is_some());
    }

    #[test]
    fn test_bullet_spawns_at_player_center_with_aim() {
        let mut player = player_at(100.0, 100.0);
        player.apply_move(Direction::Down);
        let bullet = player.try_shoot(10_000).unwrap();

        assert_eq!(bullet.owner_id, player.id);
        assert_eq!(bullet.direction, Direction::Down);
        // One move applied before the shot
        assert_eq!(bullet.x, player.x + PLAYER_SIZE / 2.0);
        assert_eq!(bullet.y, player.y + PLAYER_SIZE / 2.0);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut player = player_at(100.0, 100.0);
        player.health = 10;

        assert!(player.apply_damage(BULLET_DAMAGE));
        assert_eq!(player.health, 0);
        assert!(!player.is_alive());

        // Further damage keeps the floor
        player.apply_damage(BULLET_DAMAGE);
        assert_eq!(player.health, 0);
    }

    #[test]
    fn test_respawn_restores_full_health() {
        let mut player = player_at(100.0, 100.0);
        player.apply_damage(PLAYER_MAX_HEALTH);
        player.respawn_at(200.0, 300.0);

        assert_eq!(player.health, PLAYER_MAX_HEALTH);
        assert_eq!(player.x, 200.0);
        assert_eq!(player.y, 300.0);
    }

    #[test]
    fn test_bullet_leaves_arena_within_bounded_ticks() {
        let mut player = player_at(0.0, ARENA_HEIGHT / 2.0);
        player.apply_move(Direction::Right);
        let mut bullet = player.try_shoot(10_000).unwrap();

        let max_ticks = (ARENA_WIDTH.max(ARENA_HEIGHT) / BULLET_SPEED) as u32 + 1;
        let mut ticks = 0;
        while bullet.advance() {
            ticks += 1;
            assert!(ticks <= max_ticks, "bullet failed to terminate");
        }
    }

    #[test]
    fn test_aabb_overlap() {
        let player = player_at(110.0, 100.0);
        let mut shooter = player_at(100.0, 100.0);
        let mut bullet = shooter.try_shoot(10_000).unwrap();

        // Spawned at (120, 120), inside the target's box
        assert!(bullet.overlaps(&player));

        // Just past the target's right edge
        bullet.x = player.x + player.width;
        assert!(!bullet.overlaps(&player));

        // Touching from the left counts (strict on the far side only)
        bullet.x = player.x - bullet.width + 1.0;
        assert!(bullet.overlaps(&player));
    }
}
