use std::collections::{HashSet, VecDeque};

use crate::tile::{TileDescriptor, TileId};

/// Result of inserting a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insertion {
    pub inserted: usize,
    /// Tiles pushed out to respect capacity, oldest first
    pub evicted: Vec<TileDescriptor>,
    /// Ids already present, skipped
    pub duplicates: usize,
}

/// Live tiles in insertion order, bounded by capacity with FIFO eviction
#[derive(Debug, Clone)]
pub struct SceneState {
    tiles: VecDeque<TileDescriptor>,
    ids: HashSet<TileId>,
    capacity: usize,
}

impl SceneState {
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Append a batch, evicting the oldest tiles so the scene stays within capacity.
    ///
    /// A batch larger than the capacity keeps only its newest tiles; the
    /// discarded head of the batch is reported as evicted.
    pub fn insert_batch(&mut self, batch: Vec<TileDescriptor>) -> Insertion {
        let mut result = Insertion::default();

        for tile in batch {
            if self.ids.contains(&tile.id) {
                log::warn!("{} already in scene, skipping", tile.id);
                result.duplicates += 1;
                continue;
            }
            if self.capacity == 0 {
                result.evicted.push(tile);
                continue;
            }
            if self.tiles.len() == self.capacity {
                if let Some(oldest) = self.tiles.pop_front() {
                    self.ids.remove(&oldest.id);
                    result.evicted.push(oldest);
                }
            }
            self.ids.insert(tile.id);
            self.tiles.push_back(tile);
            result.inserted += 1;
        }

        result
    }

    pub fn get(&self, id: TileId) -> Option<&TileDescriptor> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.ids.contains(&id)
    }

    pub fn remove(&mut self, id: TileId) -> Option<TileDescriptor> {
        if !self.ids.remove(&id) {
            return None;
        }
        let index = self.tiles.iter().position(|t| t.id == id)?;
        self.tiles.remove(index)
    }

    /// Keep tiles matching the predicate, returns how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(&TileDescriptor) -> bool) -> usize {
        let before = self.tiles.len();
        let ids = &mut self.ids;
        self.tiles.retain(|tile| {
            let kept = keep(tile);
            if !kept {
                ids.remove(&tile.id);
            }
            kept
        });
        before - self.tiles.len()
    }

    /// Tiles in insertion (draw) order
    pub fn iter(&self) -> impl Iterator<Item = &TileDescriptor> {
        self.tiles.iter()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.ids.clear();
    }
}
