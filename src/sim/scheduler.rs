//! Initiative scheduler
//!
//! Actors bank action points (AP) at their own speed. Whoever first holds at
//! least the action threshold acts; fast actors bank surplus and earn extra
//! turns. Accumulation advances in discrete steps, never by wall-clock time.

use serde::{Deserialize, Serialize};

use super::events::CoreEvent;
use crate::settings::SchedulerSettings;

/// Stable actor identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// An entity that can take turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulableActor {
    pub id: ActorId,
    /// AP gained per accumulation step
    pub speed: u32,
    pub action_points: u32,
    pub alive: bool,
    /// Wins exact AP ties
    pub player_controlled: bool,
}

impl SchedulableActor {
    pub fn new(id: ActorId, speed: u32) -> Self {
        Self {
            id,
            speed,
            action_points: 0,
            alive: true,
            player_controlled: false,
        }
    }

    /// Mark as the player's actor
    pub fn player(mut self) -> Self {
        self.player_controlled = true;
        self
    }
}

/// Registration-ordered initiative queue
#[derive(Debug, Clone, Default)]
pub struct InitiativeScheduler {
    settings: SchedulerSettings,
    /// Registration order doubles as the final tie-breaker
    actors: Vec<SchedulableActor>,
    current: Option<ActorId>,
    turn_count: u64,
    /// Accumulation steps taken so far
    elapsed_steps: u64,
    events: Vec<CoreEvent>,
}

impl InitiativeScheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn threshold(&self) -> u32 {
        self.settings.action_threshold
    }

    /// Add an actor with AP reset to zero; no-op if already present
    pub fn register(&mut self, mut actor: SchedulableActor) -> bool {
        if self.contains(actor.id) {
            return false;
        }
        actor.action_points = 0;
        log::debug!("registered actor {:?} (speed {})", actor.id, actor.speed);
        self.actors.push(actor);
        true
    }

    /// Remove an actor, releasing the turn if it held it
    pub fn deregister(&mut self, id: ActorId) -> Option<SchedulableActor> {
        let index = self.actors.iter().position(|a| a.id == id)?;
        if self.current == Some(id) {
            self.current = None;
        }
        Some(self.actors.remove(index))
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.iter().any(|a| a.id == id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&SchedulableActor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn actors(&self) -> &[SchedulableActor] {
        &self.actors
    }

    /// Liveness is owned by the actor's behavior; dead actors neither bank AP nor act
    pub fn set_alive(&mut self, id: ActorId, alive: bool) -> bool {
        match self.actors.iter_mut().find(|a| a.id == id) {
            Some(actor) => {
                actor.alive = alive;
                true
            }
            None => false,
        }
    }

    /// Change an actor's speed (haste/slow effects)
    pub fn set_speed(&mut self, id: ActorId, speed: u32) -> bool {
        match self.actors.iter_mut().find(|a| a.id == id) {
            Some(actor) => {
                actor.speed = speed;
                true
            }
            None => false,
        }
    }

    pub fn has_living_actor(&self) -> bool {
        self.actors.iter().any(|a| a.alive)
    }

    /// Actor currently holding the turn
    pub fn current(&self) -> Option<ActorId> {
        self.current
    }

    /// Number of turns the player has completed
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub fn elapsed_steps(&self) -> u64 {
        self.elapsed_steps
    }

    /// Next actor to act, accumulating AP until someone is eligible
    ///
    /// Returns `None` when nobody alive could ever act. While a turn is
    /// outstanding the same owner is returned again.
    pub fn tick(&mut self) -> Option<ActorId> {
        if let Some(current) = self.current {
            if self.actor(current).is_some_and(|a| a.alive) {
                log::warn!("tick() while {:?} still holds the turn", current);
                return Some(current);
            }
            self.current = None;
        }

        let living_speed: u64 = self
            .actors
            .iter()
            .filter(|a| a.alive)
            .map(|a| a.speed as u64)
            .sum();
        if !self.has_living_actor() {
            return None;
        }
        if living_speed == 0 && self.select_eligible().is_none() {
            log::warn!("no living actor has speed; nobody can act");
            return None;
        }

        loop {
            if let Some(id) = self.select_eligible() {
                self.current = Some(id);
                self.events.push(CoreEvent::TurnGranted { actor: id });
                return Some(id);
            }
            for actor in self.actors.iter_mut().filter(|a| a.alive) {
                actor.action_points = actor.action_points.saturating_add(actor.speed);
            }
            self.elapsed_steps += 1;
        }
    }

    /// Highest AP at or above threshold; player wins ties, then registration order
    fn select_eligible(&self) -> Option<ActorId> {
        let threshold = self.settings.action_threshold;
        let mut best: Option<&SchedulableActor> = None;
        for actor in self.actors.iter().filter(|a| a.alive && a.action_points >= threshold) {
            best = match best {
                None => Some(actor),
                Some(b) if actor.action_points > b.action_points => Some(actor),
                Some(b)
                    if actor.action_points == b.action_points
                        && actor.player_controlled
                        && !b.player_controlled =>
                {
                    Some(actor)
                }
                keep => keep,
            };
        }
        best.map(|a| a.id)
    }

    /// Spend one action's worth of AP; surplus stays banked
    ///
    /// Refused for unknown actors or those below threshold, so AP never goes
    /// negative.
    pub fn end_action(&mut self, id: ActorId) -> bool {
        let threshold = self.settings.action_threshold;
        let Some(actor) = self.actors.iter_mut().find(|a| a.id == id) else {
            log::warn!("end_action for unknown actor {:?}", id);
            return false;
        };
        if actor.action_points < threshold {
            log::warn!(
                "end_action for {:?} with {} AP (< {})",
                id,
                actor.action_points,
                threshold
            );
            return false;
        }
        actor.action_points -= threshold;
        if actor.player_controlled {
            self.turn_count += 1;
        }
        if self.current == Some(id) {
            self.current = None;
        }
        self.events.push(CoreEvent::TurnEnded {
            actor: id,
            player_turns: self.turn_count,
        });
        true
    }

    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }
}
