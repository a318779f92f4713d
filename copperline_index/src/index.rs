// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The spatial index: an R-tree of payload boxes plus per-net sublists.

use core::fmt::Debug;
use std::collections::BTreeMap;

use copperline_geom::Rect;
use rstar::{AABB, RTree, RTreeObject};

#[derive(Clone, Debug, PartialEq)]
struct Entry<P> {
    min: [i64; 2],
    max: [i64; 2],
    payload: P,
}

impl<P> Entry<P> {
    fn new(payload: P, bounds: Rect) -> Self {
        Self {
            min: [bounds.min.x, bounds.min.y],
            max: [bounds.max.x, bounds.max.y],
            payload,
        }
    }
}

impl<P: Clone + PartialEq> RTreeObject for Entry<P> {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Bounding-box keyed multi-item index with per-net sublists.
///
/// `P` is a small copyable payload (an item handle). The same payload must
/// be removed with the same bounds and net it was added with; shapes in the
/// world model are immutable, so the caller can always re-derive them.
pub struct SpatialIndex<P: Copy + Eq + Debug> {
    tree: RTree<Entry<P>>,
    nets: BTreeMap<i32, Vec<P>>,
}

impl<P: Copy + Eq + Debug> Default for SpatialIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy + Eq + Debug> Debug for SpatialIndex<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("items", &self.tree.size())
            .field("nets", &self.nets.len())
            .finish_non_exhaustive()
    }
}

impl<P: Copy + Eq + Debug> SpatialIndex<P> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            nets: BTreeMap::new(),
        }
    }

    /// Insert a payload under its bounding box, registered to `net`.
    pub fn add(&mut self, payload: P, bounds: Rect, net: i32) {
        self.tree.insert(Entry::new(payload, bounds));
        self.nets.entry(net).or_default().push(payload);
    }

    /// Remove a payload previously added with the same bounds and net.
    /// Returns whether anything was removed.
    pub fn remove(&mut self, payload: P, bounds: Rect, net: i32) -> bool {
        let removed = self.tree.remove(&Entry::new(payload, bounds)).is_some();
        if removed
            && let Some(list) = self.nets.get_mut(&net)
        {
            list.retain(|&p| p != payload);
            if list.is_empty() {
                self.nets.remove(&net);
            }
        }
        removed
    }

    /// Visit every payload whose box intersects `probe` inflated by
    /// `envelope`. The visitor returns `false` to stop the enumeration.
    /// Returns the number of payloads visited.
    ///
    /// `envelope` must be an upper bound on any clearance the visitor will
    /// test for; probing with a larger clearance can miss candidates.
    pub fn query(&self, probe: Rect, envelope: i64, mut visitor: impl FnMut(P) -> bool) -> usize {
        let window = probe.inflate(envelope);
        let aabb = AABB::from_corners(
            [window.min.x, window.min.y],
            [window.max.x, window.max.y],
        );
        let mut visited = 0;
        for entry in self.tree.locate_in_envelope_intersecting(&aabb) {
            visited += 1;
            if !visitor(entry.payload) {
                break;
            }
        }
        visited
    }

    /// The payloads registered to `net`, in insertion order.
    pub fn items_for_net(&self, net: i32) -> &[P] {
        self.nets.get(&net).map_or(&[], Vec::as_slice)
    }

    /// The nets that currently have at least one payload.
    pub fn nets(&self) -> impl Iterator<Item = i32> + '_ {
        self.nets.keys().copied()
    }

    /// Iterate all payloads, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = P> + '_ {
        self.tree.iter().map(|e| e.payload)
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.nets.clear();
    }
}
