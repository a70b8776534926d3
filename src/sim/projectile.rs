//! Projectile records and spawn options

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{heading_vector, normalize_angle};

/// Identifies whatever emitted a projectile (an enemy, a turret, the player)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmitterId(pub u32);

/// Emission pattern tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pattern {
    #[default]
    Single,
    Aimed,
    Spread,
    Ring,
    Spiral,
}

/// Per-shot parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireOptions {
    pub damage: f32,
    pub radius: f32,
    pub pattern: Pattern,
    pub owner: Option<EmitterId>,
    /// Player bullets hit enemies; everything else hits the player
    pub player_owned: bool,
    /// Opaque to the core; the renderer picks a sprite from it
    pub visual_key: u32,
    /// Scaled milliseconds before the projectile expires
    pub lifetime_ms: Option<f32>,
    /// Heading change in radians per scaled second
    pub angular_velocity: f32,
    /// Speed change in units per scaled second squared
    pub acceleration: f32,
}

impl Default for FireOptions {
    fn default() -> Self {
        Self {
            damage: PROJECTILE_DAMAGE,
            radius: PROJECTILE_RADIUS,
            pattern: Pattern::Single,
            owner: None,
            player_owned: false,
            visual_key: 0,
            lifetime_ms: None,
            angular_velocity: 0.0,
            acceleration: 0.0,
        }
    }
}

impl FireOptions {
    /// Hostile shot from `owner`
    pub fn hostile(owner: EmitterId) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }

    /// Shot fired by the player
    pub fn player_shot() -> Self {
        Self {
            player_owned: true,
            ..Default::default()
        }
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }
}

/// One bullet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Direction of travel (radians)
    pub heading: f32,
    pub speed: f32,
    pub radius: f32,
    pub graze_radius: f32,
    pub damage: f32,
    pub pattern: Pattern,
    pub owner: Option<EmitterId>,
    pub player_owned: bool,
    pub visual_key: u32,
    /// Set once the player has been credited for grazing this bullet
    pub grazed: bool,
    pub active: bool,
    /// Scaled milliseconds since launch
    pub age_ms: f32,
    pub lifetime_ms: Option<f32>,
    pub angular_velocity: f32,
    pub acceleration: f32,
}

impl Projectile {
    /// A fresh, active projectile
    pub fn launch(
        pos: Vec2,
        angle: f32,
        speed: f32,
        options: &FireOptions,
        graze_multiplier: f32,
    ) -> Self {
        let heading = normalize_angle(angle);
        let speed = if speed.is_finite() { speed } else { 0.0 };
        Self {
            pos,
            vel: heading_vector(heading) * speed,
            heading,
            speed,
            radius: options.radius,
            graze_radius: options.radius * graze_multiplier,
            damage: options.damage,
            pattern: options.pattern,
            owner: options.owner,
            player_owned: options.player_owned,
            visual_key: options.visual_key,
            grazed: false,
            active: true,
            age_ms: 0.0,
            lifetime_ms: options.lifetime_ms,
            angular_velocity: options.angular_velocity,
            acceleration: options.acceleration,
        }
    }

    /// Apply angular velocity and acceleration (`dt` in seconds)
    pub fn steer(&mut self, dt: f32) {
        if self.angular_velocity == 0.0 && self.acceleration == 0.0 {
            return;
        }
        self.heading = normalize_angle(self.heading + self.angular_velocity * dt);
        self.speed = (self.speed + self.acceleration * dt).max(0.0);
        self.vel = heading_vector(self.heading) * self.speed;
    }

    /// Move along the current velocity (`dt` in seconds)
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime_ms.is_some_and(|life| self.age_ms >= life)
    }

    pub fn is_hostile(&self) -> bool {
        !self.player_owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_launch_derives_velocity_and_graze_radius() {
        let opts = FireOptions {
            radius: 5.0,
            ..Default::default()
        };
        let p = Projectile::launch(Vec2::ZERO, FRAC_PI_2, 100.0, &opts, 3.0);
        assert!(p.vel.x.abs() < 1e-4);
        assert!((p.vel.y - 100.0).abs() < 1e-4);
        assert_eq!(p.graze_radius, 15.0);
        assert!(p.active && !p.grazed);
        assert_eq!(p.age_ms, 0.0);
    }

    #[test]
    fn test_steer_rotates_and_accelerates() {
        let opts = FireOptions {
            angular_velocity: 1.0,
            acceleration: 20.0,
            ..Default::default()
        };
        let mut p = Projectile::launch(Vec2::ZERO, 0.0, 50.0, &opts, 3.0);
        p.steer(0.5);
        assert!((p.heading - 0.5).abs() < 1e-6);
        assert!((p.speed - 60.0).abs() < 1e-4);
        assert!((p.vel.length() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_deceleration_stops_at_zero() {
        let opts = FireOptions {
            acceleration: -1000.0,
            ..Default::default()
        };
        let mut p = Projectile::launch(Vec2::ZERO, 0.0, 50.0, &opts, 3.0);
        p.steer(1.0);
        assert_eq!(p.speed, 0.0);
        assert_eq!(p.vel, Vec2::ZERO);
    }

    #[test]
    fn test_lifetime_expiry() {
        let opts = FireOptions {
            lifetime_ms: Some(100.0),
            ..Default::default()
        };
        let mut p = Projectile::launch(Vec2::ZERO, 0.0, 0.0, &opts, 3.0);
        p.age_ms = 99.0;
        assert!(!p.is_expired());
        p.age_ms = 100.0;
        assert!(p.is_expired());
    }
}
