//! Vector projectile engine
//!
//! Owns every bullet in flight. Motion is integrated with the real frame
//! delta multiplied by the current time scale, so bullets crawl while time
//! is dilated and stop entirely during a reaction window.

use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec2;

use super::collision::{Contact, circles_overlap, classify_contact, tile_of};
use super::events::{CoreEvent, RemovalReason};
use super::pool::{ProjectileHandle, ProjectilePool};
use super::projectile::{FireOptions, Pattern, Projectile};
use super::time::TimeScale;
use super::world::{Bounds, CollisionMap, Target};
use crate::angle_between;
use crate::audio::{AudioBus, SoundCue};
use crate::settings::ProjectileSettings;

/// Hostile bullet touching the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerHit {
    pub handle: ProjectileHandle,
    pub damage: f32,
    pub pos: Vec2,
}

/// Outcome of `check_player_collision`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerContact {
    /// Oldest hostile bullet in hit range, if any
    pub hit: Option<PlayerHit>,
    /// Bullets grazed for the first time this check
    pub grazes: Vec<ProjectileHandle>,
}

/// Player bullet that struck an enemy (already recycled)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyHit {
    pub handle: ProjectileHandle,
    /// Index into the slice passed to `check_enemy_collision`
    pub enemy: usize,
    /// Damage actually dealt
    pub damage: f32,
}

pub struct ProjectileEngine {
    settings: ProjectileSettings,
    pool: ProjectilePool,
    bounds: Bounds,
    audio: Rc<AudioBus>,
    events: Vec<CoreEvent>,
}

impl ProjectileEngine {
    pub fn new(settings: ProjectileSettings, bounds: Bounds, audio: Rc<AudioBus>) -> Self {
        let pool = ProjectilePool::with_capacity(settings.max_projectiles);
        Self {
            settings,
            pool,
            bounds,
            audio,
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ProjectileSettings {
        &self.settings
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Fire options seeded with this engine's default radius and damage
    pub fn options(&self) -> FireOptions {
        FireOptions {
            damage: self.settings.default_damage,
            radius: self.settings.default_radius,
            ..Default::default()
        }
    }

    pub fn active_count(&self) -> usize {
        self.pool.len()
    }

    pub fn get(&self, handle: ProjectileHandle) -> Option<&Projectile> {
        self.pool.get(handle)
    }

    /// Active projectiles, oldest first
    pub fn iter(&self) -> impl Iterator<Item = (ProjectileHandle, &Projectile)> + '_ {
        self.pool.iter()
    }

    /// Make room under the cap by recycling the oldest bullets
    fn make_room(&mut self) {
        while self.pool.len() >= self.settings.max_projectiles {
            let Some(oldest) = self.pool.oldest() else {
                break;
            };
            let pos = self.pool.get(oldest).map(|p| p.pos).unwrap_or_default();
            self.pool.release(oldest);
            log::debug!("projectile cap {} reached; evicted oldest", self.settings.max_projectiles);
            self.events.push(CoreEvent::ProjectileRemoved {
                handle: oldest,
                pos,
                reason: RemovalReason::Evicted,
            });
        }
    }

    fn spawn(&mut self, projectile: Projectile) -> ProjectileHandle {
        self.make_room();
        self.pool.acquire(projectile)
    }

    /// One projectile along `angle` (radians) at `speed` units/s
    pub fn fire(&mut self, origin: Vec2, angle: f32, speed: f32, options: &FireOptions) -> ProjectileHandle {
        let projectile = Projectile::launch(origin, angle, speed, options, self.settings.graze_multiplier);
        self.spawn(projectile)
    }

    /// One projectile with an explicit velocity
    pub fn fire_velocity(&mut self, origin: Vec2, velocity: Vec2, options: &FireOptions) -> ProjectileHandle {
        let angle = velocity.y.atan2(velocity.x);
        let mut projectile =
            Projectile::launch(origin, angle, velocity.length(), options, self.settings.graze_multiplier);
        projectile.vel = velocity;
        self.spawn(projectile)
    }

    /// One projectile toward `target`
    pub fn fire_aimed(&mut self, origin: Vec2, target: Vec2, speed: f32, options: &FireOptions) -> ProjectileHandle {
        let options = options.clone().with_pattern(Pattern::Aimed);
        self.fire(origin, angle_between(origin, target), speed, &options)
    }

    /// `count` projectiles evenly across `[base - spread/2, base + spread/2]`
    pub fn fire_spread(
        &mut self,
        origin: Vec2,
        base_angle: f32,
        count: u32,
        spread: f32,
        speed: f32,
        options: &FireOptions,
    ) -> Vec<ProjectileHandle> {
        let options = options.clone().with_pattern(Pattern::Spread);
        if count == 1 {
            return vec![self.fire(origin, base_angle, speed, &options)];
        }
        let start = base_angle - spread / 2.0;
        let step = spread / count.saturating_sub(1).max(1) as f32;
        (0..count)
            .map(|i| self.fire(origin, start + step * i as f32, speed, &options))
            .collect()
    }

    /// `count` projectiles evenly around a full circle
    pub fn fire_ring(&mut self, origin: Vec2, count: u32, speed: f32, options: &FireOptions) -> Vec<ProjectileHandle> {
        let options = options.clone().with_pattern(Pattern::Ring);
        self.emit_ring(origin, count, speed, &options)
    }

    /// Ring whose headings keep turning at `angular_speed` rad/s
    pub fn fire_spiral(
        &mut self,
        origin: Vec2,
        count: u32,
        speed: f32,
        angular_speed: f32,
        options: &FireOptions,
    ) -> Vec<ProjectileHandle> {
        let mut options = options.clone().with_pattern(Pattern::Spiral);
        options.angular_velocity = angular_speed;
        self.emit_ring(origin, count, speed, &options)
    }

    fn emit_ring(&mut self, origin: Vec2, count: u32, speed: f32, options: &FireOptions) -> Vec<ProjectileHandle> {
        let step = TAU / count.max(1) as f32;
        (0..count)
            .map(|i| self.fire(origin, step * i as f32, speed, options))
            .collect()
    }

    /// Advance all projectiles by one frame
    ///
    /// `real_dt_ms` is wall-clock time; it is multiplied by `time`'s scale
    /// before anything moves or ages.
    pub fn update(&mut self, real_dt_ms: f32, time: &dyn TimeScale, map: &dyn CollisionMap) {
        let scaled_ms = real_dt_ms.max(0.0) * time.time_scale().clamp(0.0, 1.0);
        if scaled_ms <= 0.0 {
            return;
        }
        let dt = scaled_ms / 1000.0;
        let tile_size = self.settings.tile_size;
        let margin = self.settings.bounds_margin;
        let bounds = self.bounds;
        let events = &mut self.events;
        let audio = &self.audio;

        self.pool.retain(|handle, p| {
            p.steer(dt);
            p.integrate(dt);
            p.age_ms += scaled_ms;

            let tile = tile_of(p.pos, tile_size);
            let blocked = !map.is_walkable(tile)
                || map.obstacle_at(tile).is_some_and(|o| o.blocks_projectiles());
            let reason = if blocked {
                RemovalReason::Blocked
            } else if !bounds.contains_with_margin(p.pos, margin) {
                RemovalReason::OutOfBounds
            } else if p.is_expired() {
                RemovalReason::Expired
            } else {
                return true;
            };

            if reason == RemovalReason::Blocked {
                audio.play(SoundCue::ProjectileBlocked);
            }
            events.push(CoreEvent::ProjectileRemoved {
                handle,
                pos: p.pos,
                reason,
            });
            false
        });
    }

    /// Hit and graze test against the player
    ///
    /// Only hostile bullets count. Each bullet is credited as a graze at most
    /// once per lifetime. The hitting bullet is left in place and no hit
    /// event is emitted; the caller decides whether to `accept_player_hit`.
    pub fn check_player_collision(&mut self, player: &dyn Target) -> PlayerContact {
        let center = player.position();
        let player_radius = player.radius();
        let mut contact = PlayerContact::default();

        self.pool.for_each_mut(|handle, p| {
            if !p.is_hostile() {
                return;
            }
            match classify_contact(p.pos, p.radius, p.graze_radius, center, player_radius) {
                Contact::Hit { .. } => {
                    if contact.hit.is_none() {
                        contact.hit = Some(PlayerHit {
                            handle,
                            damage: p.damage,
                            pos: p.pos,
                        });
                    }
                }
                Contact::Graze { .. } if !p.grazed => {
                    p.grazed = true;
                    contact.grazes.push(handle);
                }
                _ => {}
            }
        });

        for &handle in &contact.grazes {
            let pos = self.pool.get(handle).map(|p| p.pos).unwrap_or(center);
            self.events.push(CoreEvent::ProjectileGrazed { handle, pos });
            self.audio.play(SoundCue::Graze);
        }
        contact
    }

    /// Take a reported hit: recycle the bullet and announce it
    ///
    /// False for a stale handle, in which case nothing is emitted.
    pub fn accept_player_hit(&mut self, hit: &PlayerHit) -> bool {
        if !self.pool.release(hit.handle) {
            return false;
        }
        self.events.push(CoreEvent::PlayerHit {
            handle: hit.handle,
            damage: hit.damage,
        });
        self.audio.play(SoundCue::PlayerHit);
        true
    }

    /// Player bullets against enemies; a bullet stops at the first enemy it touches
    pub fn check_enemy_collision<T: Target>(&mut self, enemies: &mut [T]) -> Vec<EnemyHit> {
        let mut hits = Vec::new();
        self.pool.retain(|handle, p| {
            if !p.player_owned {
                return true;
            }
            for (i, enemy) in enemies.iter_mut().enumerate() {
                if !enemy.is_alive() {
                    continue;
                }
                if circles_overlap(p.pos, p.radius, enemy.position(), enemy.radius()) {
                    let damage = enemy.take_damage(p.damage);
                    hits.push(EnemyHit {
                        handle,
                        enemy: i,
                        damage,
                    });
                    return false;
                }
            }
            true
        });

        for hit in &hits {
            self.events.push(CoreEvent::EnemyHit {
                handle: hit.handle,
                enemy: hit.enemy,
                damage: hit.damage,
            });
            self.audio.play(SoundCue::EnemyHit);
        }
        hits
    }

    /// Recycle one projectile; false for stale handles
    pub fn recycle(&mut self, handle: ProjectileHandle) -> bool {
        self.pool.release(handle)
    }

    /// Recycle everything in flight
    pub fn clear_all(&mut self) -> usize {
        let count = self.pool.clear();
        if count > 0 {
            log::debug!("cleared {} projectiles", count);
            self.events.push(CoreEvent::FieldCleared { count });
        }
        count
    }

    /// Recycle every projectile whose center lies within `radius` of `center`
    pub fn clear_in_radius(&mut self, center: Vec2, radius: f32) -> usize {
        let before = self.pool.len();
        let r2 = radius * radius;
        self.pool.retain(|_, p| p.pos.distance_squared(center) > r2);
        let count = before - self.pool.len();
        if count > 0 {
            self.events.push(CoreEvent::FieldCleared { count });
        }
        count
    }

    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::EmitterId;
    use crate::sim::world::{OpenField, TileGrid};
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    struct Dummy {
        pos: Vec2,
        radius: f32,
        hp: f32,
    }

    impl Dummy {
        fn at(x: f32, y: f32) -> Self {
            Self {
                pos: Vec2::new(x, y),
                radius: 5.0,
                hp: 30.0,
            }
        }
    }

    impl Target for Dummy {
        fn position(&self) -> Vec2 {
            self.pos
        }
        fn radius(&self) -> f32 {
            self.radius
        }
        fn take_damage(&mut self, amount: f32) -> f32 {
            let dealt = amount.min(self.hp);
            self.hp -= dealt;
            dealt
        }
        fn is_alive(&self) -> bool {
            self.hp > 0.0
        }
    }

    fn engine_with(max: usize) -> ProjectileEngine {
        let settings = ProjectileSettings {
            max_projectiles: max,
            ..Default::default()
        };
        ProjectileEngine::new(
            settings,
            Bounds::from_size(640.0, 480.0),
            Rc::new(AudioBus::silent()),
        )
    }

    fn engine() -> ProjectileEngine {
        engine_with(ProjectileSettings::default().max_projectiles)
    }

    fn hostile() -> FireOptions {
        FireOptions::hostile(EmitterId(1))
    }

    #[test]
    fn test_spread_is_symmetric() {
        let mut e = engine();
        let handles = e.fire_spread(Vec2::new(100.0, 100.0), 0.0, 3, FRAC_PI_2, 50.0, &hostile());
        let headings: Vec<f32> = handles.iter().map(|h| e.get(*h).unwrap().heading).collect();
        let expected = [-FRAC_PI_4, 0.0, FRAC_PI_4];
        for (got, want) in headings.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
        assert_eq!(e.get(handles[0]).unwrap().pattern, Pattern::Spread);
    }

    #[test]
    fn test_fire_with_wild_angles_returns() {
        let mut e = engine();
        let huge = e.fire(Vec2::new(100.0, 100.0), 1.0e9, 50.0, &hostile());
        let p = e.get(huge).unwrap();
        assert!((-PI..=PI).contains(&p.heading));
        assert!(p.vel.is_finite());

        let inf = e.fire(Vec2::new(100.0, 100.0), f32::INFINITY, 50.0, &hostile());
        let p = e.get(inf).unwrap();
        assert_eq!(p.heading, 0.0);
        assert!((p.vel - Vec2::new(50.0, 0.0)).length() < 1e-4);

        e.fire_spread(Vec2::new(100.0, 100.0), f32::NAN, 5, FRAC_PI_2, 50.0, &hostile());
        e.update(16.0, &1.0f32, &OpenField);
        assert_eq!(e.active_count(), 7);
    }

    #[test]
    fn test_spread_of_one_uses_base_angle() {
        let mut e = engine();
        let handles = e.fire_spread(Vec2::ZERO, 1.25, 1, PI, 50.0, &hostile());
        assert_eq!(handles.len(), 1);
        assert_eq!(e.get(handles[0]).unwrap().heading, 1.25);
        assert!(e.fire_spread(Vec2::ZERO, 0.0, 0, PI, 50.0, &hostile()).is_empty());
    }

    #[test]
    fn test_ring_covers_full_circle() {
        let mut e = engine();
        let handles = e.fire_ring(Vec2::new(300.0, 200.0), 8, 40.0, &hostile());
        assert_eq!(handles.len(), 8);
        let sum: Vec2 = handles.iter().map(|h| e.get(*h).unwrap().vel).sum();
        assert!(sum.length() < 1e-3, "ring velocities cancel out");
    }

    #[test]
    fn test_aimed_points_at_target() {
        let mut e = engine();
        let h = e.fire_aimed(Vec2::new(10.0, 10.0), Vec2::new(10.0, 60.0), 100.0, &hostile());
        let p = e.get(h).unwrap();
        assert!((p.heading - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(p.pattern, Pattern::Aimed);
    }

    #[test]
    fn test_update_uses_scaled_delta() {
        let mut e = engine();
        let h = e.fire(Vec2::new(100.0, 100.0), 0.0, 100.0, &hostile());
        e.update(100.0, &0.5f32, &OpenField);
        let p = e.get(h).unwrap();
        assert!((p.pos.x - 105.0).abs() < 1e-4);
        assert!((p.age_ms - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_scale_freezes_everything() {
        let mut e = engine();
        let opts = FireOptions {
            lifetime_ms: Some(10.0),
            ..hostile()
        };
        let h = e.fire(Vec2::new(100.0, 100.0), 0.0, 100.0, &opts);
        e.update(1000.0, &0.0f32, &OpenField);
        let p = e.get(h).unwrap();
        assert_eq!(p.pos, Vec2::new(100.0, 100.0));
        assert_eq!(p.age_ms, 0.0);
    }

    #[test]
    fn test_spiral_heading_rotates() {
        let mut e = engine();
        let handles = e.fire_spiral(Vec2::new(320.0, 240.0), 4, 10.0, 1.0, &hostile());
        e.update(500.0, &1.0f32, &OpenField);
        let p = e.get(handles[0]).unwrap();
        assert!((p.heading - 0.5).abs() < 1e-5);
        assert_eq!(p.pattern, Pattern::Spiral);
    }

    #[test]
    fn test_wall_blocks_projectile() {
        // Wall column at tile x = 2 (world x 64..96)
        let grid = TileGrid::from_rows(&["..#..", "..#..", "..#.."]);
        let mut e = engine();
        let h = e.fire(Vec2::new(40.0, 48.0), 0.0, 300.0, &hostile());
        e.update(50.0, &1.0f32, &grid);
        assert!(e.get(h).is_some());
        e.update(50.0, &1.0f32, &grid);
        assert!(e.get(h).is_none());
        assert!(e.drain_events().iter().any(|ev| matches!(
            ev,
            CoreEvent::ProjectileRemoved { reason: RemovalReason::Blocked, .. }
        )));
    }

    #[test]
    fn test_open_door_lets_projectile_through() {
        let mut grid = TileGrid::from_rows(&["..D......"]);
        let mut e = engine();
        let closed = e.fire(Vec2::new(40.0, 16.0), 0.0, 500.0, &hostile());
        e.update(60.0, &1.0f32, &grid);
        assert!(e.get(closed).is_none());

        grid.set_door(glam::IVec2::new(2, 0), true);
        let open = e.fire(Vec2::new(40.0, 16.0), 0.0, 500.0, &hostile());
        e.update(60.0, &1.0f32, &grid);
        assert!(e.get(open).is_some());
    }

    #[test]
    fn test_pillar_blocks_and_foliage_passes() {
        let grid = TileGrid::from_rows(&["..P......", "..\"......"]);
        let mut e = engine();
        let into_pillar = e.fire(Vec2::new(40.0, 16.0), 0.0, 500.0, &hostile());
        let into_grass = e.fire(Vec2::new(40.0, 48.0), 0.0, 500.0, &hostile());
        e.update(60.0, &1.0f32, &grid);
        assert!(e.get(into_pillar).is_none());
        assert!(e.get(into_grass).is_some());
    }

    #[test]
    fn test_out_of_range_tile_is_blocking() {
        let grid = TileGrid::new(2, 2);
        let mut e = engine();
        let h = e.fire(Vec2::new(40.0, 40.0), 0.0, 100.0, &hostile());
        e.update(300.0, &1.0f32, &grid);
        assert!(e.get(h).is_none());
    }

    #[test]
    fn test_leaving_bounds_recycles() {
        let mut e = engine();
        let h = e.fire(Vec2::new(630.0, 100.0), 0.0, 1000.0, &hostile());
        e.update(50.0, &1.0f32, &OpenField);
        // 680 is still inside the 64 unit margin
        assert!(e.get(h).is_some());
        e.update(50.0, &1.0f32, &OpenField);
        assert!(e.get(h).is_none());
    }

    #[test]
    fn test_lifetime_counts_scaled_time() {
        let mut e = engine();
        let opts = FireOptions {
            lifetime_ms: Some(100.0),
            ..hostile()
        };
        let h = e.fire(Vec2::new(100.0, 100.0), 0.0, 0.0, &opts);
        e.update(1000.0, &0.05f32, &OpenField);
        assert!(e.get(h).is_some());
        e.update(60.0, &1.0f32, &OpenField);
        assert!(e.get(h).is_none());
    }

    #[test]
    fn test_graze_fires_once_per_projectile() {
        let mut e = engine();
        let player = Dummy::at(100.0, 100.0);
        // radius 4 -> graze radius 12; distance 15 sits in the band
        let h = e.fire(Vec2::new(115.0, 100.0), 0.0, 0.0, &hostile());

        let first = e.check_player_collision(&player);
        assert_eq!(first.grazes, vec![h]);
        assert!(first.hit.is_none());
        for _ in 0..5 {
            e.update(16.0, &1.0f32, &OpenField);
            let again = e.check_player_collision(&player);
            assert!(again.grazes.is_empty());
        }
        assert!(e.get(h).unwrap().grazed);
    }

    #[test]
    fn test_player_hit_ignores_player_bullets() {
        let mut e = engine();
        let player = Dummy::at(100.0, 100.0);
        e.fire(Vec2::new(101.0, 100.0), 0.0, 0.0, &FireOptions::player_shot());
        assert_eq!(e.check_player_collision(&player), PlayerContact::default());

        let hostile_shot = e.fire(Vec2::new(102.0, 100.0), 0.0, 0.0, &hostile());
        let contact = e.check_player_collision(&player);
        assert_eq!(contact.hit.map(|h| h.handle), Some(hostile_shot));
        // A bullet inside the hit range is never also a graze
        assert!(contact.grazes.is_empty());
    }

    #[test]
    fn test_hit_is_announced_only_when_accepted() {
        let mut e = engine();
        let player = Dummy::at(100.0, 100.0);
        let h = e.fire(Vec2::new(102.0, 100.0), 0.0, 0.0, &hostile());

        for _ in 0..3 {
            let contact = e.check_player_collision(&player);
            assert_eq!(contact.hit.map(|hit| hit.handle), Some(h));
        }
        let hit_events = |events: &[CoreEvent]| {
            events
                .iter()
                .filter(|ev| matches!(ev, CoreEvent::PlayerHit { .. }))
                .count()
        };
        assert_eq!(hit_events(&e.drain_events()), 0);

        let hit = e.check_player_collision(&player).hit.unwrap();
        assert!(e.accept_player_hit(&hit));
        assert!(e.get(h).is_none());
        assert!(!e.accept_player_hit(&hit));
        assert_eq!(hit_events(&e.drain_events()), 1);
    }

    #[test]
    fn test_first_hostile_hit_wins() {
        let mut e = engine();
        let player = Dummy::at(0.0, 0.0);
        let older = e.fire(Vec2::new(3.0, 0.0), 0.0, 0.0, &hostile());
        e.fire(Vec2::new(0.0, 3.0), 0.0, 0.0, &hostile());
        let contact = e.check_player_collision(&player);
        assert_eq!(contact.hit.unwrap().handle, older);
    }

    #[test]
    fn test_pool_reuse_hygiene() {
        let mut e = engine();
        let player = Dummy::at(100.0, 100.0);
        let opts = FireOptions {
            lifetime_ms: Some(5000.0),
            ..hostile()
        };
        let first = e.fire(Vec2::new(115.0, 100.0), 0.0, 0.0, &opts);
        e.update(100.0, &1.0f32, &OpenField);
        e.check_player_collision(&player);
        assert!(e.get(first).unwrap().grazed);
        assert!(e.get(first).unwrap().age_ms > 0.0);

        assert!(e.recycle(first));
        let second = e.fire(Vec2::new(400.0, 400.0), 0.0, 0.0, &hostile());
        assert_eq!(second.index(), first.index());
        let p = e.get(second).unwrap();
        assert!(!p.grazed);
        assert!(p.active);
        assert_eq!(p.age_ms, 0.0);
        assert_eq!(p.lifetime_ms, None);
        assert!(e.get(first).is_none());
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        const MAX: usize = 16;
        let mut e = engine_with(MAX);
        let handles: Vec<_> = (0..=MAX)
            .map(|i| e.fire(Vec2::new(10.0 + i as f32, 10.0), 0.0, 0.0, &hostile()))
            .collect();
        assert_eq!(e.active_count(), MAX);
        assert!(e.get(handles[0]).is_none());
        assert!(e.get(handles[1]).is_some());
        assert!(e.get(handles[MAX]).is_some());
        assert!(e.drain_events().iter().any(|ev| matches!(
            ev,
            CoreEvent::ProjectileRemoved { reason: RemovalReason::Evicted, .. }
        )));
    }

    #[test]
    fn test_enemy_collision_recycles_and_damages() {
        let mut e = engine();
        let mut enemies = vec![Dummy::at(200.0, 100.0), Dummy::at(300.0, 100.0)];
        let shot = e.fire(Vec2::new(299.0, 100.0), 0.0, 0.0, &FireOptions::player_shot());
        let stray = e.fire(Vec2::new(201.0, 100.0), 0.0, 0.0, &hostile());

        let hits = e.check_enemy_collision(&mut enemies);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].handle, shot);
        assert_eq!(hits[0].enemy, 1);
        assert_eq!(hits[0].damage, 10.0);
        assert_eq!(enemies[1].hp, 20.0);
        assert!(e.get(shot).is_none());
        assert!(e.get(stray).is_some(), "hostile bullets pass through enemies");
    }

    #[test]
    fn test_dead_enemy_is_not_hit() {
        let mut e = engine();
        let mut enemies = vec![Dummy::at(50.0, 50.0)];
        enemies[0].hp = 0.0;
        let shot = e.fire(Vec2::new(50.0, 50.0), 0.0, 0.0, &FireOptions::player_shot());
        assert!(e.check_enemy_collision(&mut enemies).is_empty());
        assert!(e.get(shot).is_some());
    }

    #[test]
    fn test_clear_in_radius() {
        let mut e = engine();
        e.fire(Vec2::new(100.0, 100.0), 0.0, 0.0, &hostile());
        e.fire(Vec2::new(110.0, 100.0), 0.0, 0.0, &hostile());
        let far = e.fire(Vec2::new(300.0, 100.0), 0.0, 0.0, &hostile());
        assert_eq!(e.clear_in_radius(Vec2::new(100.0, 100.0), 20.0), 2);
        assert_eq!(e.active_count(), 1);
        assert!(e.get(far).is_some());
        assert_eq!(e.clear_all(), 1);
        assert_eq!(e.active_count(), 0);
        assert!(e.drain_events().contains(&CoreEvent::FieldCleared { count: 1 }));
    }

    #[test]
    fn test_fire_velocity_keeps_explicit_vector() {
        let mut e = engine();
        let h = e.fire_velocity(Vec2::new(50.0, 50.0), Vec2::new(0.0, -20.0), &hostile());
        let p = e.get(h).unwrap();
        assert_eq!(p.vel, Vec2::new(0.0, -20.0));
        assert!((p.heading + FRAC_PI_2).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_active_never_exceeds_cap(cap in 1usize..64, volleys in prop::collection::vec(1u32..24, 1..20)) {
            let mut e = engine_with(cap);
            for (i, count) in volleys.iter().enumerate() {
                e.fire_ring(Vec2::new(320.0, 240.0), *count, 30.0, &hostile());
                e.update(16.0, &1.0f32, &OpenField);
                prop_assert!(e.active_count() <= cap, "volley {} overflowed", i);
            }
        }

        #[test]
        fn prop_graze_credited_at_most_once(offsets in prop::collection::vec(9.5f32..16.9, 1..30)) {
            let mut e = engine();
            let player = Dummy::at(320.0, 240.0);
            for (i, d) in offsets.iter().enumerate() {
                let angle = i as f32 * 0.7;
                e.fire(player.pos + crate::heading_vector(angle) * *d, angle, 0.0, &hostile());
            }
            let first = e.check_player_collision(&player).grazes.len();
            prop_assert_eq!(first, offsets.len());
            prop_assert!(e.check_player_collision(&player).grazes.is_empty());
        }
    }
}
