//! Turn scheduling and time-dilated bullet simulation
//!
//! Everything here is single-threaded and frame-driven:
//! - Hosts call `update`/`frame` with wall-clock milliseconds
//! - The time controller turns that into scaled simulation time
//! - Seeded RNG only; iteration order is spawn order
//! - No rendering or platform dependencies

pub mod action;
pub mod collision;
pub mod engine;
pub mod events;
pub mod pool;
pub mod projectile;
pub mod scheduler;
pub mod state;
pub mod tick;
pub mod time;
pub mod world;

pub use action::{ActionPhase, TurnAction};
pub use collision::{Contact, circles_overlap, classify_contact, tile_of};
pub use engine::{EnemyHit, PlayerContact, PlayerHit, ProjectileEngine};
pub use events::{CoreEvent, RemovalReason};
pub use pool::{ProjectileHandle, ProjectilePool};
pub use projectile::{EmitterId, FireOptions, Pattern, Projectile};
pub use scheduler::{ActorId, InitiativeScheduler, SchedulableActor};
pub use state::{Combatant, EncounterOutcome, RngState};
pub use tick::{Encounter, FrameInput, PlayerCommand};
pub use time::{
    ListenerId, ReactionHandle, ReactionOutcome, TimeDilationController, TimeRegime, TimeScale,
};
pub use world::{Bounds, CollisionMap, Obstacle, OpenField, Target, TileGrid};
