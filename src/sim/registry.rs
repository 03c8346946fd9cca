//! Entity arena with two-phase deletion
//!
//! Entities are never removed mid-frame. Killing an entity only sets its
//! deletion flag; the flagged entity stays in its pool (and can still be
//! inspected by later passes of the same frame) until [`Registry::compact`]
//! runs at the frame boundary.

use serde::{Deserialize, Serialize};

use super::state::{Bullet, Enemy, Particle, Player, PowerUp};

/// Stable entity identity, unique within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Common behaviour of every pooled entity
pub trait Entity {
    fn id(&self) -> EntityId;
    /// Deletion flag. Once set it is never cleared.
    fn is_dead(&self) -> bool;
    /// Flag for removal at the next compaction
    fn kill(&mut self);
}

/// Ordered pool of one entity kind (insertion order == id order)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    items: Vec<T>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Pool<T> {
    pub fn push(&mut self, item: T) -> EntityId {
        let id = item.id();
        self.items.push(item);
        id
    }

    /// Every entity, including ones flagged this frame
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Entities not flagged for deletion
    pub fn live(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|e| !e.is_dead())
    }

    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut().filter(|e| !e.is_dead())
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.iter_mut().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Drop every flagged entity, returning how many were removed
    pub fn compact(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|e| !e.is_dead());
        before - self.items.len()
    }
}

/// Canonical entity collections for one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    pub player: Player,
    pub bullets: Pool<Bullet>,
    pub enemies: Pool<Enemy>,
    pub power_ups: Pool<PowerUp>,
    pub particles: Pool<Particle>,
    next_id: u32,
}

impl Registry {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            bullets: Pool::default(),
            enemies: Pool::default(),
            power_ups: Pool::default(),
            particles: Pool::default(),
            // 0 is reserved for the player
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn_bullet(&mut self, build: impl FnOnce(EntityId) -> Bullet) -> EntityId {
        let id = self.next_entity_id();
        self.bullets.push(build(id))
    }

    pub fn spawn_enemy(&mut self, build: impl FnOnce(EntityId) -> Enemy) -> EntityId {
        let id = self.next_entity_id();
        self.enemies.push(build(id))
    }

    pub fn spawn_power_up(&mut self, build: impl FnOnce(EntityId) -> PowerUp) -> EntityId {
        let id = self.next_entity_id();
        self.power_ups.push(build(id))
    }

    pub fn spawn_particle(&mut self, build: impl FnOnce(EntityId) -> Particle) -> EntityId {
        let id = self.next_entity_id();
        self.particles.push(build(id))
    }

    /// End-of-frame removal of every flagged entity
    pub fn compact(&mut self) -> usize {
        self.bullets.compact()
            + self.enemies.compact()
            + self.power_ups.compact()
            + self.particles.compact()
    }

    /// True if any entity in any pool still carries a deletion flag
    pub fn has_pending_removals(&self) -> bool {
        self.bullets.iter().any(|e| e.is_dead())
            || self.enemies.iter().any(|e| e.is_dead())
            || self.power_ups.iter().any(|e| e.is_dead())
            || self.particles.iter().any(|e| e.is_dead())
    }
}
