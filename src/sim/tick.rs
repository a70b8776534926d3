//! Per-frame encounter driver
//!
//! Owns one of each core component and wires them together: the scheduler
//! decides whose turn it is, turns play out as timed actions, the time
//! controller scales every frame and the projectile engine moves bullets by
//! the scaled delta.

use std::f32::consts::FRAC_PI_3;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::action::TurnAction;
use super::collision::tile_of;
use super::engine::ProjectileEngine;
use super::events::CoreEvent;
use super::projectile::FireOptions;
use super::scheduler::{ActorId, InitiativeScheduler};
use super::state::{
    Combatant, ENEMY_ACTION_MS, ENEMY_BULLET_SPEED, ENEMY_RADIUS, EncounterOutcome, MOVE_STEP,
    PLAYER_ACTION_MS, PLAYER_BULLET_SPEED, PLAYER_HP, PLAYER_RADIUS, PLAYER_SPEED, PLAYER_SPREAD,
    RngState,
};
use super::time::{ReactionHandle, TimeDilationController, TimeRegime};
use super::world::{Bounds, CollisionMap, Target, TileGrid};
use crate::angle_between;
use crate::audio::AudioBus;
use crate::settings::Settings;

/// Input sampled once per frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Dodge pressed (resolves an open reaction window)
    pub dodge: bool,
    /// Focus held (`Some(true)`) or released (`Some(false)`)
    pub focus: Option<bool>,
}

/// What the player does with a granted turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Step one move length in this direction
    Move(Vec2),
    /// Single shot at a point
    FireAimed(Vec2),
    /// Three-shot fan toward a point
    FireSpread(Vec2),
    Wait,
}

/// Hit waiting on the player's reflexes
#[derive(Debug)]
struct PendingHit {
    handle: ReactionHandle,
    damage: f32,
}

pub struct Encounter {
    pub seed: u64,
    rng: Pcg32,
    pub time: TimeDilationController,
    pub projectiles: ProjectileEngine,
    pub scheduler: InitiativeScheduler,
    pub map: TileGrid,
    pub player: Combatant,
    pub enemies: Vec<Combatant>,
    /// Bullets grazed this encounter
    pub graze_count: u32,
    pub frame_count: u64,
    tile_size: f32,
    next_actor: u32,
    pending_hit: Option<PendingHit>,
    action: Option<TurnAction>,
    awaiting_player: bool,
    events: Vec<CoreEvent>,
}

impl Encounter {
    /// New encounter on `map` with the player standing at `player_pos`
    pub fn new(settings: &Settings, map: TileGrid, player_pos: Vec2, seed: u64, audio: Rc<AudioBus>) -> Self {
        let tile_size = settings.projectiles.tile_size;
        let bounds = Bounds::from_size(map.width() as f32 * tile_size, map.height() as f32 * tile_size);
        let mut scheduler = InitiativeScheduler::new(settings.scheduler.clone());
        let player = Combatant::new(ActorId(0), player_pos, PLAYER_RADIUS, PLAYER_HP, PLAYER_SPEED);
        scheduler.register(player.schedulable(true));

        log::info!("Encounter seeded with {seed}");
        Self {
            seed,
            rng: RngState::new(seed).to_rng(),
            time: TimeDilationController::new(settings.time.clone(), Rc::clone(&audio)),
            projectiles: ProjectileEngine::new(settings.projectiles.clone(), bounds, audio),
            scheduler,
            map,
            player,
            enemies: Vec::new(),
            graze_count: 0,
            frame_count: 0,
            tile_size,
            next_actor: 1,
            pending_hit: None,
            action: None,
            awaiting_player: false,
            events: Vec::new(),
        }
    }

    /// Override the player's initiative speed
    pub fn set_player_speed(&mut self, speed: u32) {
        self.player.speed = speed;
        self.scheduler.set_speed(self.player.actor, speed);
    }

    /// Add an enemy and enter it into the initiative order
    pub fn spawn_enemy(&mut self, pos: Vec2, speed: u32, hp: f32) -> ActorId {
        let actor = ActorId(self.next_actor);
        self.next_actor += 1;
        let enemy = Combatant::new(actor, pos, ENEMY_RADIUS, hp, speed);
        self.scheduler.register(enemy.schedulable(false));
        self.enemies.push(enemy);
        actor
    }

    pub fn outcome(&self) -> EncounterOutcome {
        if !self.player.is_alive() {
            EncounterOutcome::Defeat
        } else if self.enemies.is_empty() {
            EncounterOutcome::Victory
        } else {
            EncounterOutcome::Ongoing
        }
    }

    /// The player holds the turn and no command has been given yet
    pub fn awaiting_player(&self) -> bool {
        self.awaiting_player
    }

    /// Action currently playing out, if any
    pub fn action(&self) -> Option<&TurnAction> {
        self.action.as_ref()
    }

    pub fn reaction_pending(&self) -> bool {
        self.pending_hit.is_some()
    }

    /// Hand out the next turn
    ///
    /// Returns `None` while an action is still resolving, when the encounter
    /// is over or when nobody can act. Enemy turns fire immediately; a player
    /// turn waits for `player_command`.
    pub fn next_turn(&mut self) -> Option<ActorId> {
        if self.action.is_some() || self.outcome() != EncounterOutcome::Ongoing {
            return None;
        }
        if self.awaiting_player {
            return Some(self.player.actor);
        }

        let actor = self.scheduler.tick()?;
        if actor == self.player.actor {
            self.awaiting_player = true;
        } else {
            self.run_enemy_turn(actor);
        }
        self.collect_events();
        Some(actor)
    }

    /// Carry out the player's turn; false if it is not the player's turn or
    /// the move is blocked
    pub fn player_command(&mut self, command: PlayerCommand) -> bool {
        if !self.awaiting_player {
            return false;
        }
        let origin = self.player.pos;
        let shot = FireOptions {
            owner: Some(self.player.emitter),
            player_owned: true,
            ..self.projectiles.options()
        };

        match command {
            PlayerCommand::Move(dir) => {
                let dest = origin + dir.normalize_or_zero() * MOVE_STEP;
                let tile = tile_of(dest, self.tile_size);
                let blocked = self.map.obstacle_at(tile).is_some_and(|o| o.blocks_projectiles());
                if !self.map.is_walkable(tile) || blocked {
                    log::debug!("Move to {dest} blocked");
                    return false;
                }
                self.player.pos = dest;
            }
            PlayerCommand::FireAimed(target) => {
                self.projectiles.fire_aimed(origin, target, PLAYER_BULLET_SPEED, &shot);
            }
            PlayerCommand::FireSpread(target) => {
                let base = angle_between(origin, target);
                self.projectiles
                    .fire_spread(origin, base, 3, PLAYER_SPREAD, PLAYER_BULLET_SPEED, &shot);
            }
            PlayerCommand::Wait => {}
        }

        log::debug!("Player turn: {command:?}");
        self.awaiting_player = false;
        self.time.start_action();
        let mut action = TurnAction::new(self.player.actor);
        action.begin(PLAYER_ACTION_MS);
        self.action = Some(action);
        self.collect_events();
        true
    }

    fn run_enemy_turn(&mut self, actor: ActorId) {
        let Some(enemy) = self.enemies.iter().find(|e| e.actor == actor) else {
            log::warn!("Turn granted to unknown actor {actor:?}");
            self.scheduler.end_action(actor);
            return;
        };
        let origin = enemy.pos;
        let options = FireOptions {
            owner: Some(enemy.emitter),
            ..self.projectiles.options()
        };
        let target = self.player.pos;
        let base = angle_between(origin, target);

        let fired = match self.rng.random_range(0..4u32) {
            0 => {
                self.projectiles.fire_aimed(origin, target, ENEMY_BULLET_SPEED, &options);
                1
            }
            1 => self
                .projectiles
                .fire_spread(origin, base, 5, FRAC_PI_3, ENEMY_BULLET_SPEED, &options)
                .len(),
            2 => self
                .projectiles
                .fire_ring(origin, 12, ENEMY_BULLET_SPEED * 0.8, &options)
                .len(),
            _ => self
                .projectiles
                .fire_spiral(origin, 8, ENEMY_BULLET_SPEED * 0.7, 0.8, &options)
                .len(),
        };
        log::debug!("Enemy {actor:?} fired {fired} projectiles");

        let mut action = TurnAction::new(actor);
        action.begin(ENEMY_ACTION_MS);
        self.action = Some(action);
    }

    /// Advance one frame of `real_dt_ms` wall-clock milliseconds
    pub fn frame(&mut self, input: &FrameInput, real_dt_ms: f32) {
        self.frame_count += 1;

        if input.dodge {
            self.time.resolve_reaction_window_success();
        }
        match input.focus {
            Some(true) => {
                self.time.enter_focus();
            }
            Some(false) => {
                self.time.exit_focus();
            }
            None => {}
        }

        self.time.update(real_dt_ms);
        self.projectiles.update(real_dt_ms, &self.time, &self.map);

        self.settle_pending_hit();
        self.check_player_hits();
        self.check_enemy_hits();
        self.advance_action(real_dt_ms);
        self.collect_events();
    }

    fn settle_pending_hit(&mut self) {
        let Some(pending) = self.pending_hit.as_mut() else {
            return;
        };
        let Some(outcome) = pending.handle.poll() else {
            return;
        };
        let damage = pending.damage;
        self.pending_hit = None;
        if outcome.succeeded() {
            log::debug!("Dodged {damage} damage");
        } else {
            self.damage_player(damage);
        }
    }

    fn check_player_hits(&mut self) {
        if !self.player.is_alive() || self.pending_hit.is_some() {
            return;
        }
        let contact = self.projectiles.check_player_collision(&self.player);
        self.graze_count += contact.grazes.len() as u32;

        let Some(hit) = contact.hit else {
            return;
        };
        if self.time.is_invulnerable() {
            return;
        }
        self.projectiles.accept_player_hit(&hit);
        match self.time.trigger_reaction_window() {
            Some(handle) => {
                self.pending_hit = Some(PendingHit {
                    handle,
                    damage: hit.damage,
                });
            }
            None => self.damage_player(hit.damage),
        }
    }

    fn damage_player(&mut self, damage: f32) {
        let dealt = self.player.take_damage(damage);
        log::info!("Player took {dealt} damage ({} hp left)", self.player.hp);
        if !self.player.is_alive() {
            self.scheduler.set_alive(self.player.actor, false);
            log::info!("Player down after {} frames", self.frame_count);
        }
    }

    fn check_enemy_hits(&mut self) {
        let hits = self.projectiles.check_enemy_collision(&mut self.enemies);
        if hits.is_empty() {
            return;
        }
        let fallen: Vec<ActorId> = self
            .enemies
            .iter()
            .filter(|e| !e.is_alive())
            .map(|e| e.actor)
            .collect();
        if fallen.is_empty() {
            return;
        }
        for &actor in &fallen {
            self.scheduler.deregister(actor);
            log::info!("Enemy {actor:?} destroyed");
        }
        self.enemies.retain(|e| e.is_alive());
        self.time.trigger_impact_freeze();
    }

    fn advance_action(&mut self, real_dt_ms: f32) {
        // Effects hold still while the player is reacting
        if self.time.regime() == TimeRegime::ReactionWindow {
            return;
        }
        let Some(action) = self.action.as_mut() else {
            return;
        };
        action.advance(real_dt_ms);
        if !action.is_resolved() {
            return;
        }
        let actor = action.actor();
        self.action = None;
        if self.scheduler.contains(actor) {
            self.scheduler.end_action(actor);
        }
        if actor == self.player.actor {
            self.time.end_action();
        }
    }

    fn collect_events(&mut self) {
        self.events.extend(self.time.drain_events());
        self.events.extend(self.projectiles.drain_events());
        self.events.extend(self.scheduler.drain_events());
    }

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        self.collect_events();
        std::mem::take(&mut self.events)
    }
}
