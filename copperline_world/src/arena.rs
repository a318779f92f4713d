// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot arena owning every item ever inserted into a world.
//!
//! Revisions record [`ItemId`]s; the arena is the single place item storage
//! lives. Freeing a slot invalidates every outstanding id for it: stale ids
//! never alias a newer item because the generation must match.

use core::fmt::Debug;

use crate::item::Item;
use crate::revision::RevisionId;

/// Identifier of an item slot: index plus generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u32, pub(crate) u32);

impl ItemId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

struct Slot {
    generation: u32,
    item: Item,
}

/// Arena of items with generational handles.
#[derive(Default)]
pub struct ItemArena {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>, // last generation per slot (persists across frees)
    free_list: Vec<usize>,
}

impl Debug for ItemArena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("ItemArena")
            .field("slots_total", &total)
            .field("slots_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl ItemArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an item and return its handle.
    pub fn alloc(&mut self, item: Item) -> ItemId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(Slot { generation, item });
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ItemId uses 32-bit indices by design."
            )]
            {
                ItemId::new(idx as u32, generation)
            }
        } else {
            let generation = 1_u32;
            self.slots.push(Some(Slot { generation, item }));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ItemId uses 32-bit indices by design."
            )]
            {
                ItemId::new((self.slots.len() - 1) as u32, generation)
            }
        }
    }

    /// Destroy the item behind `id`. The id (and any copy of it) goes stale.
    pub fn free(&mut self, id: ItemId) -> Option<Item> {
        if !self.is_alive(id) {
            return None;
        }
        let slot = self.slots[id.idx()].take()?;
        self.free_list.push(id.idx());
        Some(slot.item)
    }

    /// Whether `id` refers to a live item.
    pub fn is_alive(&self, id: ItemId) -> bool {
        self.slots
            .get(id.idx())
            .and_then(|s| s.as_ref())
            .map(|s| s.generation == id.1)
            .unwrap_or(false)
    }

    /// Access an item; panics if `id` is stale.
    pub fn item(&self, id: ItemId) -> &Item {
        let slot = self.slots[id.idx()].as_ref().expect("dangling ItemId");
        assert_eq!(slot.generation, id.1, "dangling ItemId");
        &slot.item
    }

    /// Access an item mutably; panics if `id` is stale.
    pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
        let slot = self.slots[id.idx()].as_mut().expect("dangling ItemId");
        assert_eq!(slot.generation, id.1, "dangling ItemId");
        &mut slot.item
    }

    /// Access an item if it is still alive.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        if self.is_alive(id) {
            Some(self.item(id))
        } else {
            None
        }
    }

    /// Update an item's owner back-pointer.
    pub(crate) fn set_owner(&mut self, id: ItemId, owner: Option<RevisionId>) {
        self.item_mut(id).data_mut().owner = owner;
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Whether no items are alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
