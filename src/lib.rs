//! Tempo Core - turn scheduling and time-dilated bullet simulation
//!
//! Core modules:
//! - `sim`: Initiative scheduler, time-dilation state machine, projectile engine
//! - `settings`: Tunable constants loaded from JSON
//! - `audio`: Injected sound-cue service (no global audio state)

pub mod audio;
pub mod settings;
pub mod sim;

pub use audio::{AudioBus, AudioSink, SoundCue};
pub use settings::{DensityPreset, Settings, SettingsError};

use glam::Vec2;

/// Core configuration constants (defaults for `Settings`)
pub mod consts {
    /// AP an actor must bank before it may act
    pub const ACTION_THRESHOLD: u32 = 100;

    /// Target time scale per regime
    pub const IDLE_SCALE: f32 = 0.05;
    pub const ACTIVE_SCALE: f32 = 1.0;
    pub const IMPACT_FREEZE_SCALE: f32 = 0.1;
    pub const REACTION_WINDOW_SCALE: f32 = 0.0;
    pub const FOCUS_SCALE: f32 = 1.0;

    /// Fraction of the remaining gap closed per frame while smoothing
    pub const SCALE_SMOOTHING: f32 = 0.15;

    /// Countdown lengths in unscaled milliseconds
    pub const IMPACT_FREEZE_MS: f32 = 120.0;
    pub const REACTION_WINDOW_MS: f32 = 600.0;
    pub const INVULNERABILITY_MS: f32 = 750.0;

    /// Projectile pool cap
    pub const MAX_PROJECTILES: usize = 512;
    /// Graze radius = collision radius * this
    pub const GRAZE_MULTIPLIER: f32 = 3.0;
    /// Projectiles may drift this far past the visible bounds before cleanup
    pub const BOUNDS_MARGIN: f32 = 64.0;
    /// World units per map tile
    pub const TILE_SIZE: f32 = 32.0;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 4.0;
    pub const PROJECTILE_DAMAGE: f32 = 10.0;

    /// Nominal frame length used by the headless demo (ms)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
}

/// Normalized angle to [-π, π]; non-finite input maps to 0
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    (angle + PI).rem_euclid(TAU) - PI
}

/// Unit vector pointing along `angle`
#[inline]
pub fn heading_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of the ray from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
