//! Simulation settings
//!
//! Every tunable constant of the core lives here so hosts can ship a JSON
//! file instead of recompiling. Missing fields fall back to `consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Bullet density presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DensityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl DensityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DensityPreset::Low => "Low",
            DensityPreset::Medium => "Medium",
            DensityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(DensityPreset::Low),
            "medium" | "med" => Some(DensityPreset::Medium),
            "high" => Some(DensityPreset::High),
            _ => None,
        }
    }

    /// Projectile cap for this preset
    pub fn max_projectiles(&self) -> usize {
        match self {
            DensityPreset::Low => MAX_PROJECTILES / 2,
            DensityPreset::Medium => MAX_PROJECTILES,
            DensityPreset::High => MAX_PROJECTILES * 2,
        }
    }
}

/// Time-dilation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    pub idle_scale: f32,
    pub active_scale: f32,
    pub impact_freeze_scale: f32,
    pub reaction_window_scale: f32,
    pub focus_scale: f32,
    /// Fraction of the gap to the target closed each frame (0, 1]
    pub smoothing: f32,
    pub impact_freeze_ms: f32,
    pub reaction_window_ms: f32,
    /// Grace period after a reaction window during which no new window opens
    pub invulnerability_ms: f32,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            idle_scale: IDLE_SCALE,
            active_scale: ACTIVE_SCALE,
            impact_freeze_scale: IMPACT_FREEZE_SCALE,
            reaction_window_scale: REACTION_WINDOW_SCALE,
            focus_scale: FOCUS_SCALE,
            smoothing: SCALE_SMOOTHING,
            impact_freeze_ms: IMPACT_FREEZE_MS,
            reaction_window_ms: REACTION_WINDOW_MS,
            invulnerability_ms: INVULNERABILITY_MS,
        }
    }
}

/// Projectile engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    pub max_projectiles: usize,
    pub graze_multiplier: f32,
    pub bounds_margin: f32,
    pub tile_size: f32,
    pub default_radius: f32,
    pub default_damage: f32,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            max_projectiles: MAX_PROJECTILES,
            graze_multiplier: GRAZE_MULTIPLIER,
            bounds_margin: BOUNDS_MARGIN,
            tile_size: TILE_SIZE,
            default_radius: PROJECTILE_RADIUS,
            default_damage: PROJECTILE_DAMAGE,
        }
    }
}

/// Initiative tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub action_threshold: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            action_threshold: ACTION_THRESHOLD,
        }
    }
}

/// Volume levels handed to the audio bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

/// All core settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub density: DensityPreset,
    pub time: TimeSettings,
    pub projectiles: ProjectileSettings,
    pub scheduler: SchedulerSettings,
    pub audio: AudioSettings,
}

impl Settings {
    /// Create settings from a density preset (applies the preset's cap)
    pub fn from_preset(preset: DensityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a density preset (updates the projectile cap)
    pub fn apply_preset(&mut self, preset: DensityPreset) {
        self.density = preset;
        self.projectiles.max_projectiles = preset.max_projectiles();
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the core cannot honor
    pub fn validate(&self) -> Result<(), SettingsError> {
        let t = &self.time;
        let scales = [
            ("time.idle_scale", t.idle_scale),
            ("time.active_scale", t.active_scale),
            ("time.impact_freeze_scale", t.impact_freeze_scale),
            ("time.reaction_window_scale", t.reaction_window_scale),
            ("time.focus_scale", t.focus_scale),
        ];
        for (field, value) in scales {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("{value} is outside [0, 1]")));
            }
        }
        if !(t.smoothing > 0.0 && t.smoothing <= 1.0) {
            return Err(invalid("time.smoothing", format!("{} is outside (0, 1]", t.smoothing)));
        }
        let durations = [
            ("time.impact_freeze_ms", t.impact_freeze_ms),
            ("time.reaction_window_ms", t.reaction_window_ms),
        ];
        for (field, value) in durations {
            if !(value > 0.0) {
                return Err(invalid(field, format!("{value} must be positive")));
            }
        }
        if !(t.invulnerability_ms >= 0.0) {
            return Err(invalid("time.invulnerability_ms", "must not be negative".into()));
        }

        let p = &self.projectiles;
        if p.max_projectiles == 0 {
            return Err(invalid("projectiles.max_projectiles", "must be at least 1".into()));
        }
        if !(p.graze_multiplier >= 1.0) {
            return Err(invalid(
                "projectiles.graze_multiplier",
                format!("{} is below 1", p.graze_multiplier),
            ));
        }
        if !(p.tile_size > 0.0) {
            return Err(invalid("projectiles.tile_size", "must be positive".into()));
        }
        if !(p.bounds_margin >= 0.0) {
            return Err(invalid("projectiles.bounds_margin", "must not be negative".into()));
        }
        if self.scheduler.action_threshold == 0 {
            return Err(invalid("scheduler.action_threshold", "must be at least 1".into()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { field, reason }
}
