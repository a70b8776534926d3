//! Audio cue routing
//!
//! The core never mixes sound itself. It hands `SoundCue`s to an `AudioBus`
//! that the host constructs and injects; the bus applies volume, mute and the
//! time-dilation playback rate before forwarding to a host-provided sink.

use std::cell::Cell;

use crate::settings::AudioSettings;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Hit-stop after a significant kill
    ImpactFreeze,
    /// Reaction window opened
    ReactionOpen,
    /// Reaction window resolved by the player in time
    ReactionSuccess,
    /// Reaction window timed out
    ReactionFail,
    /// Hostile bullet brushed past the player
    Graze,
    /// Player took a bullet
    PlayerHit,
    /// Player bullet struck an enemy
    EnemyHit,
    /// Bullet stopped by a wall or closed door
    ProjectileBlocked,
    /// Time dropped into slow motion
    TimeSlow,
    /// Time returned to normal speed
    TimeResume,
}

/// Host-side audio backend
pub trait AudioSink {
    /// Play `cue` at `volume` (0-1), pitched by `playback_rate` (0-1)
    fn emit(&self, cue: SoundCue, volume: f32, playback_rate: f32);
}

/// Sink that drops every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn emit(&self, _cue: SoundCue, _volume: f32, _playback_rate: f32) {}
}

/// Sink that writes cues to the log (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AudioSink for LogSink {
    fn emit(&self, cue: SoundCue, volume: f32, playback_rate: f32) {
        log::debug!("sfx {:?} vol={:.2} rate={:.2}", cue, volume, playback_rate);
    }
}

/// Audio bus shared by the core components
///
/// Settings live in `Cell`s so a single `Rc<AudioBus>` can be handed to
/// every component and still be adjusted by the host.
pub struct AudioBus {
    sink: Box<dyn AudioSink>,
    master_volume: Cell<f32>,
    sfx_volume: Cell<f32>,
    muted: Cell<bool>,
    playback_rate: Cell<f32>,
}

impl Default for AudioBus {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for AudioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBus")
            .field("master_volume", &self.master_volume.get())
            .field("sfx_volume", &self.sfx_volume.get())
            .field("muted", &self.muted.get())
            .field("playback_rate", &self.playback_rate.get())
            .finish_non_exhaustive()
    }
}

impl AudioBus {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            master_volume: Cell::new(0.8),
            sfx_volume: Cell::new(1.0),
            muted: Cell::new(false),
            playback_rate: Cell::new(1.0),
        }
    }

    /// Bus that plays nothing
    pub fn silent() -> Self {
        Self::new(Box::new(SilentSink))
    }

    /// Build a bus and apply volume settings
    pub fn with_settings(sink: Box<dyn AudioSink>, settings: &AudioSettings) -> Self {
        let bus = Self::new(sink);
        bus.set_master_volume(settings.master_volume);
        bus.set_sfx_volume(settings.sfx_volume);
        bus.set_muted(settings.muted);
        bus
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&self, vol: f32) {
        self.master_volume.set(vol.clamp(0.0, 1.0));
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&self, vol: f32) {
        self.sfx_volume.set(vol.clamp(0.0, 1.0));
    }

    /// Mute/unmute all audio
    pub fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    /// Follow the global time scale (slow motion lowers pitch)
    pub fn set_playback_rate(&self, rate: f32) {
        self.playback_rate.set(rate.clamp(0.0, 1.0));
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate.get()
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted.get() {
            0.0
        } else {
            self.master_volume.get() * self.sfx_volume.get()
        }
    }

    /// Play a sound cue
    pub fn play(&self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.sink.emit(cue, vol, self.playback_rate.get());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Sink that remembers every cue, shared with the test body
    #[derive(Default, Clone)]
    pub(crate) struct RecordingSink {
        pub cues: Rc<RefCell<Vec<(SoundCue, f32, f32)>>>,
    }

    impl AudioSink for RecordingSink {
        fn emit(&self, cue: SoundCue, volume: f32, playback_rate: f32) {
            self.cues.borrow_mut().push((cue, volume, playback_rate));
        }
    }

    #[test]
    fn test_play_applies_volume() {
        let sink = RecordingSink::default();
        let bus = AudioBus::new(Box::new(sink.clone()));
        bus.set_master_volume(0.5);
        bus.set_sfx_volume(0.5);
        bus.play(SoundCue::Graze);

        let cues = sink.cues.borrow();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].0, SoundCue::Graze);
        assert!((cues[0].1 - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_muted_bus_drops_cues() {
        let sink = RecordingSink::default();
        let settings = AudioSettings {
            muted: true,
            ..Default::default()
        };
        let bus = AudioBus::with_settings(Box::new(sink.clone()), &settings);
        bus.play(SoundCue::PlayerHit);
        assert!(sink.cues.borrow().is_empty());
    }

    #[test]
    fn test_playback_rate_is_clamped_and_forwarded() {
        let sink = RecordingSink::default();
        let bus = AudioBus::new(Box::new(sink.clone()));
        bus.set_playback_rate(4.0);
        assert_eq!(bus.playback_rate(), 1.0);
        bus.set_playback_rate(0.25);
        bus.play(SoundCue::TimeSlow);
        assert_eq!(sink.cues.borrow()[0].2, 0.25);
    }
}
