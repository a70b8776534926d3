//! Encounter entities and tuning
//!
//! The bodies that take turns and get shot. Everything a host needs to
//! snapshot an encounter lives here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::projectile::EmitterId;
use super::scheduler::{ActorId, SchedulableActor};
use super::world::Target;

/// Player defaults
pub const PLAYER_RADIUS: f32 = 5.0;
pub const PLAYER_HP: f32 = 100.0;
pub const PLAYER_SPEED: u32 = 50;
/// Distance covered by one move command
pub const MOVE_STEP: f32 = 32.0;
pub const PLAYER_BULLET_SPEED: f32 = 480.0;
/// Total arc of the player's spread shot (radians)
pub const PLAYER_SPREAD: f32 = std::f32::consts::FRAC_PI_6;

/// Enemy defaults
pub const ENEMY_RADIUS: f32 = 10.0;
pub const ENEMY_HP: f32 = 30.0;
pub const ENEMY_BULLET_SPEED: f32 = 140.0;

/// How long a turn's effect plays (unscaled ms)
pub const PLAYER_ACTION_MS: f32 = 250.0;
pub const ENEMY_ACTION_MS: f32 = 180.0;

/// A body on the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub actor: ActorId,
    /// Tag stamped on this body's bullets
    pub emitter: EmitterId,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// Initiative speed
    pub speed: u32,
}

impl Combatant {
    pub fn new(actor: ActorId, pos: Vec2, radius: f32, hp: f32, speed: u32) -> Self {
        Self {
            actor,
            emitter: EmitterId(actor.0),
            pos,
            radius,
            hp,
            max_hp: hp,
            speed,
        }
    }

    /// Scheduler entry for this body
    pub fn schedulable(&self, player_controlled: bool) -> SchedulableActor {
        let actor = SchedulableActor::new(self.actor, self.speed);
        if player_controlled { actor.player() } else { actor }
    }
}

impl Target for Combatant {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn take_damage(&mut self, amount: f32) -> f32 {
        let dealt = amount.max(0.0).min(self.hp);
        self.hp -= dealt;
        dealt
    }

    fn is_alive(&self) -> bool {
        self.hp > 0.0
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Where an encounter stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterOutcome {
    Ongoing,
    Victory,
    Defeat,
}
