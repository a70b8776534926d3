//! Circle contact tests
//!
//! Bullets and bodies are circles. A bullet touching a body is a hit; one
//! inside its own graze ring but outside the hit range is a graze.

use glam::{IVec2, Vec2};

/// Result of classifying a bullet against a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Circles overlap
    Hit { penetration: f32 },
    /// Inside the graze band but not touching
    Graze { clearance: f32 },
    Clear,
}

/// Strict circle overlap (touching edges do not count)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// Classify a bullet with hit radius `radius` and graze radius
/// `graze_radius` against a body at `target` with radius `target_radius`
pub fn classify_contact(
    pos: Vec2,
    radius: f32,
    graze_radius: f32,
    target: Vec2,
    target_radius: f32,
) -> Contact {
    let dist = pos.distance(target);
    let hit_reach = radius + target_radius;
    if dist < hit_reach {
        return Contact::Hit {
            penetration: hit_reach - dist,
        };
    }
    let graze_reach = graze_radius + target_radius;
    if dist < graze_reach {
        return Contact::Graze {
            clearance: dist - hit_reach,
        };
    }
    Contact::Clear
}

/// Tile containing a world position
#[inline]
pub fn tile_of(pos: Vec2, tile_size: f32) -> IVec2 {
    (pos / tile_size).floor().as_ivec2()
}
