//! Discrete notifications emitted by the core
//!
//! Components buffer events during a frame; the host drains them and turns
//! them into flashes, particles and sounds.

use glam::Vec2;

use super::pool::ProjectileHandle;
use super::scheduler::ActorId;
use super::time::TimeRegime;

/// Why a projectile left the active list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Stopped by a wall, closed door or out-of-range tile
    Blocked,
    /// Drifted past the visible bounds plus margin
    OutOfBounds,
    /// Fixed lifetime ran out
    Expired,
    /// Forcibly recycled to make room under the cap
    Evicted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    RegimeChanged { from: TimeRegime, to: TimeRegime },
    ImpactFreezeStarted,
    ImpactFreezeEnded,
    ReactionWindowStarted,
    ReactionWindowSucceeded,
    ReactionWindowFailed,
    ProjectileGrazed { handle: ProjectileHandle, pos: Vec2 },
    PlayerHit { handle: ProjectileHandle, damage: f32 },
    EnemyHit { handle: ProjectileHandle, enemy: usize, damage: f32 },
    ProjectileRemoved { handle: ProjectileHandle, pos: Vec2, reason: RemovalReason },
    /// Bulk recycle (`clear_all` / `clear_in_radius`)
    FieldCleared { count: usize },
    TurnGranted { actor: ActorId },
    TurnEnded { actor: ActorId, player_turns: u64 },
}
