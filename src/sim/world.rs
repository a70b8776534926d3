//! Collaborator interfaces the core consumes
//!
//! The map, the player and the enemies are owned elsewhere. The core only
//! needs tile occupancy queries and a few entity accessors.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Something occupying a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Obstacle {
    Door { open: bool },
    /// Solid furniture, crates, statues
    Pillar,
    /// Tall grass and the like; bullets fly through
    Foliage,
}

impl Obstacle {
    pub fn blocks_projectiles(&self) -> bool {
        match self {
            Obstacle::Door { open } => !open,
            Obstacle::Pillar => true,
            Obstacle::Foliage => false,
        }
    }
}

/// Tile occupancy queries
///
/// Implementations must treat tiles outside the map as not walkable.
pub trait CollisionMap {
    fn is_walkable(&self, tile: IVec2) -> bool;
    fn obstacle_at(&self, tile: IVec2) -> Option<Obstacle>;
}

/// Endless empty floor
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenField;

impl CollisionMap for OpenField {
    fn is_walkable(&self, _tile: IVec2) -> bool {
        true
    }

    fn obstacle_at(&self, _tile: IVec2) -> Option<Obstacle> {
        None
    }
}

/// Fixed-size tile map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    width: i32,
    height: i32,
    walls: Vec<bool>,
    obstacles: Vec<Option<Obstacle>>,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width: width as i32,
            height: height as i32,
            walls: vec![false; len],
            obstacles: vec![None; len],
        }
    }

    /// Build from ASCII rows: `#` wall, `D` closed door, `d` open door,
    /// `P` pillar, `"` foliage, anything else floor
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let tile = IVec2::new(x as i32, y as i32);
                match c {
                    '#' => grid.set_wall(tile, true),
                    'D' => grid.set_obstacle(tile, Some(Obstacle::Door { open: false })),
                    'd' => grid.set_obstacle(tile, Some(Obstacle::Door { open: true })),
                    'P' => grid.set_obstacle(tile, Some(Obstacle::Pillar)),
                    '"' => grid.set_obstacle(tile, Some(Obstacle::Foliage)),
                    _ => {}
                }
            }
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    fn index(&self, tile: IVec2) -> Option<usize> {
        let in_range = tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height;
        in_range.then(|| (tile.y * self.width + tile.x) as usize)
    }

    pub fn set_wall(&mut self, tile: IVec2, wall: bool) {
        if let Some(i) = self.index(tile) {
            self.walls[i] = wall;
        }
    }

    pub fn set_obstacle(&mut self, tile: IVec2, obstacle: Option<Obstacle>) {
        if let Some(i) = self.index(tile) {
            self.obstacles[i] = obstacle;
        }
    }

    /// Open or close the door on `tile`; false if there is no door
    pub fn set_door(&mut self, tile: IVec2, open: bool) -> bool {
        match self.index(tile).map(|i| &mut self.obstacles[i]) {
            Some(Some(Obstacle::Door { open: state })) => {
                *state = open;
                true
            }
            _ => false,
        }
    }
}

impl CollisionMap for TileGrid {
    fn is_walkable(&self, tile: IVec2) -> bool {
        self.index(tile).is_some_and(|i| !self.walls[i])
    }

    fn obstacle_at(&self, tile: IVec2) -> Option<Obstacle> {
        self.index(tile).and_then(|i| self.obstacles[i])
    }
}

/// An entity projectiles can hit
pub trait Target {
    /// Hit-center in world units
    fn position(&self) -> Vec2;
    fn radius(&self) -> f32;
    /// Apply damage, returning what was actually dealt
    fn take_damage(&mut self, amount: f32) -> f32;
    fn is_alive(&self) -> bool {
        true
    }
}

/// Visible play area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Bounds of a `width` x `height` area anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn contains_with_margin(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= self.min.x - margin
            && pos.y >= self.min.y - margin
            && pos.x <= self.max.x + margin
            && pos.y <= self.max.y + margin
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_blocks_unless_open() {
        assert!(Obstacle::Door { open: false }.blocks_projectiles());
        assert!(!Obstacle::Door { open: true }.blocks_projectiles());
        assert!(Obstacle::Pillar.blocks_projectiles());
        assert!(!Obstacle::Foliage.blocks_projectiles());
    }

    #[test]
    fn test_grid_out_of_range_is_closed() {
        let grid = TileGrid::new(4, 4);
        assert!(grid.is_walkable(IVec2::new(3, 3)));
        assert!(!grid.is_walkable(IVec2::new(-1, 0)));
        assert!(!grid.is_walkable(IVec2::new(4, 0)));
        assert!(!grid.is_walkable(IVec2::new(0, 4)));
    }

    #[test]
    fn test_grid_from_rows() {
        let mut grid = TileGrid::from_rows(&["#..", ".D.", "..P"]);
        assert_eq!((grid.width(), grid.height()), (3, 3));
        assert!(!grid.is_walkable(IVec2::new(0, 0)));
        assert_eq!(
            grid.obstacle_at(IVec2::new(1, 1)),
            Some(Obstacle::Door { open: false })
        );
        assert!(grid.set_door(IVec2::new(1, 1), true));
        assert_eq!(
            grid.obstacle_at(IVec2::new(1, 1)),
            Some(Obstacle::Door { open: true })
        );
        assert!(!grid.set_door(IVec2::new(2, 2), true));
    }

    #[test]
    fn test_bounds_margin() {
        let b = Bounds::from_size(100.0, 50.0);
        assert!(b.contains_with_margin(Vec2::new(-10.0, 25.0), 16.0));
        assert!(!b.contains_with_margin(Vec2::new(-20.0, 25.0), 16.0));
        assert_eq!(b.center(), Vec2::new(50.0, 25.0));
    }
}
