//! Global time-dilation state machine
//!
//! One regime is current at a time. Smoothed regimes ease `scale` toward
//! their target every frame; snap regimes (`ImpactFreeze`, `ReactionWindow`)
//! jump straight to it. Both countdowns run on unscaled wall-clock delta.

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};

use super::events::CoreEvent;
use crate::audio::{AudioBus, SoundCue};
use crate::settings::TimeSettings;

/// Named time regimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRegime {
    /// Nobody is acting; the world crawls
    Idle,
    /// A controlled action is playing out at full speed
    Active,
    /// Brief hit-stop after a significant kill
    ImpactFreeze,
    /// Full pause while the player may react to an incoming hit
    ReactionWindow,
    /// Sustained aim; normal speed, tagged for distinct presentation
    Focus,
}

impl TimeRegime {
    /// Regimes whose scale jumps instead of easing
    pub fn is_snap(self) -> bool {
        matches!(self, TimeRegime::ImpactFreeze | TimeRegime::ReactionWindow)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRegime::Idle => "Idle",
            TimeRegime::Active => "Active",
            TimeRegime::ImpactFreeze => "ImpactFreeze",
            TimeRegime::ReactionWindow => "ReactionWindow",
            TimeRegime::Focus => "Focus",
        }
    }
}

/// Anything that can report the current time scale
pub trait TimeScale {
    fn time_scale(&self) -> f32;
}

impl TimeScale for f32 {
    fn time_scale(&self) -> f32 {
        *self
    }
}

/// How a reaction window ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Resolved explicitly before the countdown ran out
    Success,
    /// Countdown ran out
    Expired,
}

impl ReactionOutcome {
    pub fn succeeded(self) -> bool {
        self == ReactionOutcome::Success
    }
}

/// Awaitable result of `trigger_reaction_window`
///
/// The controller holds the only sender and consumes it on resolution, so
/// the outcome arrives at most once.
#[derive(Debug)]
pub struct ReactionHandle {
    rx: Receiver<ReactionOutcome>,
    outcome: Option<ReactionOutcome>,
}

impl ReactionHandle {
    fn new(rx: Receiver<ReactionOutcome>) -> Self {
        Self { rx, outcome: None }
    }

    /// Non-blocking check; `Some` once the window has resolved
    ///
    /// A controller dropped with the window still open counts as expired.
    pub fn poll(&mut self) -> Option<ReactionOutcome> {
        if self.outcome.is_none() {
            match self.rx.try_recv() {
                Ok(outcome) => self.outcome = Some(outcome),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.outcome = Some(ReactionOutcome::Expired),
            }
        }
        self.outcome
    }

    pub fn is_resolved(&mut self) -> bool {
        self.poll().is_some()
    }
}

struct PendingReaction {
    remaining_ms: f32,
    resolver: Sender<ReactionOutcome>,
}

/// Identifies a registered scale listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Called after every update with `(scale, regime)`
pub type ScaleListener = Box<dyn FnMut(f32, TimeRegime)>;

pub struct TimeDilationController {
    settings: TimeSettings,
    regime: TimeRegime,
    current_scale: f32,
    target_scale: f32,
    freeze_remaining_ms: f32,
    reaction: Option<PendingReaction>,
    invulnerable_ms: f32,
    listeners: Vec<(ListenerId, ScaleListener)>,
    next_listener_id: u32,
    audio: Rc<AudioBus>,
    events: Vec<CoreEvent>,
}

impl TimeDilationController {
    pub fn new(settings: TimeSettings, audio: Rc<AudioBus>) -> Self {
        let idle = settings.idle_scale.clamp(0.0, 1.0);
        Self {
            settings,
            regime: TimeRegime::Idle,
            current_scale: idle,
            target_scale: idle,
            freeze_remaining_ms: 0.0,
            reaction: None,
            invulnerable_ms: 0.0,
            listeners: Vec::new(),
            next_listener_id: 1,
            audio,
            events: Vec::new(),
        }
    }

    /// Current (smoothed) time scale
    pub fn scale(&self) -> f32 {
        self.current_scale
    }

    pub fn target_scale(&self) -> f32 {
        self.target_scale
    }

    pub fn regime(&self) -> TimeRegime {
        self.regime
    }

    pub fn settings(&self) -> &TimeSettings {
        &self.settings
    }

    /// True while the post-reaction grace period is running
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0
    }

    pub fn reaction_pending(&self) -> bool {
        self.reaction.is_some()
    }

    /// Unscaled ms left in the open reaction window
    pub fn reaction_remaining_ms(&self) -> Option<f32> {
        self.reaction.as_ref().map(|r| r.remaining_ms)
    }

    /// Unscaled ms left in the impact freeze
    pub fn freeze_remaining_ms(&self) -> Option<f32> {
        (self.regime == TimeRegime::ImpactFreeze).then_some(self.freeze_remaining_ms)
    }

    fn target_for(&self, regime: TimeRegime) -> f32 {
        let s = &self.settings;
        let scale = match regime {
            TimeRegime::Idle => s.idle_scale,
            TimeRegime::Active => s.active_scale,
            TimeRegime::ImpactFreeze => s.impact_freeze_scale,
            TimeRegime::ReactionWindow => s.reaction_window_scale,
            TimeRegime::Focus => s.focus_scale,
        };
        scale.clamp(0.0, 1.0)
    }

    fn enter(&mut self, regime: TimeRegime) {
        let from = self.regime;
        self.regime = regime;
        self.target_scale = self.target_for(regime);
        if regime.is_snap() {
            self.current_scale = self.target_scale;
        }
        if from != regime {
            log::debug!(
                "time regime {} -> {} (target {:.2})",
                from.as_str(),
                regime.as_str(),
                self.target_scale
            );
            self.events.push(CoreEvent::RegimeChanged { from, to: regime });
        }
    }

    /// A controlled action begins: ease to full speed
    pub fn start_action(&mut self) -> bool {
        match self.regime {
            TimeRegime::Idle | TimeRegime::Focus => {
                self.enter(TimeRegime::Active);
                self.audio.play(SoundCue::TimeResume);
                true
            }
            other => {
                log::debug!("start_action ignored in {}", other.as_str());
                false
            }
        }
    }

    /// The controlled action finished: ease back into slow motion
    pub fn end_action(&mut self) -> bool {
        if self.regime != TimeRegime::Active {
            return false;
        }
        self.enter(TimeRegime::Idle);
        self.audio.play(SoundCue::TimeSlow);
        true
    }

    /// Enter sustained aim
    pub fn enter_focus(&mut self) -> bool {
        if self.regime.is_snap() {
            log::debug!("focus refused during {}", self.regime.as_str());
            return false;
        }
        self.enter(TimeRegime::Focus);
        true
    }

    pub fn exit_focus(&mut self) -> bool {
        if self.regime != TimeRegime::Focus {
            return false;
        }
        self.enter(TimeRegime::Idle);
        true
    }

    /// Snap into a short hit-stop
    ///
    /// Refused while a reaction window is open. Re-triggering during a freeze
    /// restarts the countdown.
    pub fn trigger_impact_freeze(&mut self) -> bool {
        if self.reaction.is_some() {
            log::warn!("impact freeze refused: reaction window open");
            return false;
        }
        self.freeze_remaining_ms = self.settings.impact_freeze_ms;
        self.enter(TimeRegime::ImpactFreeze);
        self.events.push(CoreEvent::ImpactFreezeStarted);
        self.audio.play(SoundCue::ImpactFreeze);
        true
    }

    /// Open a reaction window and hand back its pending outcome
    ///
    /// Returns `None` when a window is already open or the grace period is
    /// still running. An active impact freeze is cut short.
    pub fn trigger_reaction_window(&mut self) -> Option<ReactionHandle> {
        if self.reaction.is_some() {
            log::warn!("reaction window refused: one is already open");
            return None;
        }
        if self.is_invulnerable() {
            log::debug!(
                "reaction window refused: grace period ({:.0}ms left)",
                self.invulnerable_ms
            );
            return None;
        }
        if self.regime == TimeRegime::ImpactFreeze {
            self.freeze_remaining_ms = 0.0;
            self.events.push(CoreEvent::ImpactFreezeEnded);
        }

        let (tx, rx) = mpsc::channel();
        self.reaction = Some(PendingReaction {
            remaining_ms: self.settings.reaction_window_ms,
            resolver: tx,
        });
        self.enter(TimeRegime::ReactionWindow);
        self.events.push(CoreEvent::ReactionWindowStarted);
        self.audio.play(SoundCue::ReactionOpen);
        Some(ReactionHandle::new(rx))
    }

    /// Resolve the open window as a success; no-op without one
    pub fn resolve_reaction_window_success(&mut self) -> bool {
        let Some(pending) = self.reaction.take() else {
            return false;
        };
        self.finish_reaction(pending, ReactionOutcome::Success);
        true
    }

    fn finish_reaction(&mut self, pending: PendingReaction, outcome: ReactionOutcome) {
        // The handle may already be gone; the outcome is still final.
        let _ = pending.resolver.send(outcome);
        self.invulnerable_ms = self.settings.invulnerability_ms;
        self.enter(TimeRegime::Idle);
        match outcome {
            ReactionOutcome::Success => {
                log::info!("reaction window resolved in time");
                self.events.push(CoreEvent::ReactionWindowSucceeded);
                self.audio.play(SoundCue::ReactionSuccess);
            }
            ReactionOutcome::Expired => {
                log::info!("reaction window expired");
                self.events.push(CoreEvent::ReactionWindowFailed);
                self.audio.play(SoundCue::ReactionFail);
            }
        }
    }

    /// Advance countdowns and smoothing by one frame of unscaled time
    pub fn update(&mut self, real_dt_ms: f32) {
        let dt = real_dt_ms.max(0.0);

        if self.invulnerable_ms > 0.0 {
            self.invulnerable_ms = (self.invulnerable_ms - dt).max(0.0);
        }

        let reaction_expired = match self.reaction.as_mut() {
            Some(pending) => {
                pending.remaining_ms -= dt;
                !(pending.remaining_ms > 0.0)
            }
            None => false,
        };
        if reaction_expired {
            if let Some(pending) = self.reaction.take() {
                self.finish_reaction(pending, ReactionOutcome::Expired);
            }
        } else if self.regime == TimeRegime::ImpactFreeze {
            self.freeze_remaining_ms -= dt;
            if !(self.freeze_remaining_ms > 0.0) {
                self.freeze_remaining_ms = 0.0;
                self.enter(TimeRegime::Idle);
                self.events.push(CoreEvent::ImpactFreezeEnded);
            }
        }

        if !self.regime.is_snap() {
            // Exponential approach; never lands exactly on the target
            self.current_scale += (self.target_scale - self.current_scale) * self.settings.smoothing;
        }
        self.current_scale = self.current_scale.clamp(0.0, 1.0);
        self.audio.set_playback_rate(self.current_scale);

        let (scale, regime) = (self.current_scale, self.regime);
        for (_, listener) in self.listeners.iter_mut() {
            listener(scale, regime);
        }
    }

    pub fn add_listener(&mut self, listener: impl FnMut(f32, TimeRegime) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Take all events buffered since the last drain
    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TimeScale for TimeDilationController {
    fn time_scale(&self) -> f32 {
        self.current_scale
    }
}
