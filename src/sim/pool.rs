//! Generational projectile arena
//!
//! Slots are addressed by index. A free list recycles indices and each slot
//! carries a generation counter that is bumped on release, so handles to a
//! recycled projectile stop resolving. Spawning overwrites the whole slot
//! value; nothing from the previous occupant survives.

use std::collections::VecDeque;

use super::projectile::Projectile;

/// Stable reference to one projectile lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileHandle {
    index: u32,
    generation: u32,
}

impl ProjectileHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    projectile: Projectile,
}

impl Slot {
    fn retire(&mut self) {
        self.projectile.active = false;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectilePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Active slot indices, oldest first
    active: VecDeque<u32>,
}

impl ProjectilePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            active: VecDeque::with_capacity(capacity),
        }
    }

    /// Active projectile count
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Slots waiting for reuse
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    /// Store an active projectile, reusing a free slot when one exists
    pub fn acquire(&mut self, projectile: Projectile) -> ProjectileHandle {
        debug_assert!(projectile.active);
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].projectile = projectile;
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    projectile,
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.active.push_back(index);
        ProjectileHandle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    fn resolves(&self, handle: ProjectileHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|s| s.generation == handle.generation && s.projectile.active)
    }

    pub fn get(&self, handle: ProjectileHandle) -> Option<&Projectile> {
        if self.resolves(handle) {
            Some(&self.slots[handle.index()].projectile)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: ProjectileHandle) -> Option<&mut Projectile> {
        if self.resolves(handle) {
            Some(&mut self.slots[handle.index()].projectile)
        } else {
            None
        }
    }

    /// Oldest active projectile
    pub fn oldest(&self) -> Option<ProjectileHandle> {
        self.active.front().map(|&index| self.handle_at(index))
    }

    fn handle_at(&self, index: u32) -> ProjectileHandle {
        ProjectileHandle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Return a projectile to the free list; stale handles are ignored
    pub fn release(&mut self, handle: ProjectileHandle) -> bool {
        if !self.resolves(handle) {
            return false;
        }
        if let Some(pos) = self.active.iter().position(|&i| i == handle.index) {
            self.active.remove(pos);
        }
        self.slots[handle.index()].retire();
        self.free.push(handle.index);
        true
    }

    /// Keep projectiles for which `keep` returns true; release the rest
    ///
    /// Visits in spawn order and preserves it.
    pub fn retain(&mut self, mut keep: impl FnMut(ProjectileHandle, &mut Projectile) -> bool) {
        let slots = &mut self.slots;
        let free = &mut self.free;
        self.active.retain(|&index| {
            let slot = &mut slots[index as usize];
            let handle = ProjectileHandle {
                index,
                generation: slot.generation,
            };
            if keep(handle, &mut slot.projectile) {
                true
            } else {
                slot.retire();
                free.push(index);
                false
            }
        });
    }

    /// Visit active projectiles mutably, in spawn order
    pub fn for_each_mut(&mut self, mut f: impl FnMut(ProjectileHandle, &mut Projectile)) {
        for &index in &self.active {
            let slot = &mut self.slots[index as usize];
            let handle = ProjectileHandle {
                index,
                generation: slot.generation,
            };
            f(handle, &mut slot.projectile);
        }
    }

    /// Active projectiles in spawn order
    pub fn iter(&self) -> impl Iterator<Item = (ProjectileHandle, &Projectile)> + '_ {
        self.active.iter().map(move |&index| {
            let slot = &self.slots[index as usize];
            (
                ProjectileHandle {
                    index,
                    generation: slot.generation,
                },
                &slot.projectile,
            )
        })
    }

    /// Release everything; returns how many were active
    pub fn clear(&mut self) -> usize {
        let count = self.active.len();
        for index in self.active.drain(..) {
            self.slots[index as usize].retire();
            self.free.push(index);
        }
        count
    }
}
