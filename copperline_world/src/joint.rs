// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Joints: local connectivity hubs at shared item vertices.
//!
//! A joint exists per `(position, net)` key and layer span. Two joints may
//! share a key only while their layer spans are disjoint; linking an item
//! whose span bridges them merges them into one. Queries ignore joints whose
//! last link has been removed.

use std::collections::HashMap;

use copperline_geom::Vec2;
use smallvec::SmallVec;

use crate::arena::{ItemArena, ItemId};
use crate::item::{Item, LayerRange};

/// Hash key of a joint: position and net.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct JointTag {
    /// Vertex position.
    pub pos: Vec2,
    /// Net id.
    pub net: i32,
}

/// A connectivity hub: the set of items meeting at one position on
/// overlapping layers of one net.
#[derive(Clone, Debug)]
pub struct Joint {
    tag: JointTag,
    layers: LayerRange,
    links: SmallVec<[ItemId; 4]>,
    locked: bool,
}

impl Joint {
    fn new(tag: JointTag, layers: LayerRange) -> Self {
        Self {
            tag,
            layers,
            links: SmallVec::new(),
            locked: false,
        }
    }

    /// Vertex position.
    pub fn pos(&self) -> Vec2 {
        self.tag.pos
    }

    /// Net id.
    pub fn net(&self) -> i32 {
        self.tag.net
    }

    /// Layer span (union of the linked items' spans).
    pub fn layers(&self) -> LayerRange {
        self.layers
    }

    /// The linked items.
    pub fn links(&self) -> &[ItemId] {
        &self.links
    }

    /// Number of linked items.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether the joint keeps line assembly from walking through it when
    /// asked to stop at locked joints.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Set or clear the lock bit.
    pub fn lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// A line corner joins exactly two segments and nothing else.
    pub fn is_line_corner(&self, items: &ItemArena) -> bool {
        self.links.len() == 2
            && self
                .links
                .iter()
                .all(|&id| matches!(items.item(id), Item::Segment(_)))
    }

    /// The other segment at a two-segment corner.
    pub fn next_segment(&self, current: ItemId, items: &ItemArena) -> Option<ItemId> {
        self.links
            .iter()
            .copied()
            .find(|&id| id != current && matches!(items.item(id), Item::Segment(_)))
    }

    fn link(&mut self, item: ItemId) {
        self.links.push(item);
    }

    fn unlink(&mut self, item: ItemId) {
        if let Some(i) = self.links.iter().position(|&id| id == item) {
            self.links.remove(i);
        }
    }

    fn merge(&mut self, other: Joint) {
        self.layers = self.layers.merge(&other.layers);
        self.locked |= other.locked;
        for id in other.links {
            if !self.links.contains(&id) {
                self.links.push(id);
            }
        }
    }
}

/// Keyed multimap from `(position, net)` to layer-disjoint joints.
#[derive(Default)]
pub struct JointMap {
    buckets: HashMap<JointTag, Vec<Joint>>,
}

impl core::fmt::Debug for JointMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JointMap")
            .field("tags", &self.buckets.len())
            .field("joints", &self.buckets.values().map(Vec::len).sum::<usize>())
            .finish_non_exhaustive()
    }
}

impl JointMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the joint at the key, creating it if needed and merging every
    /// existing joint at the key whose layer span overlaps `layers`.
    pub fn touch(&mut self, pos: Vec2, layers: LayerRange, net: i32) -> &mut Joint {
        let tag = JointTag { pos, net };
        let bucket = self.buckets.entry(tag).or_default();
        let mut joint = Joint::new(tag, layers);
        // Merging can widen the span, which can overlap further joints;
        // repeat until none are left.
        while let Some(i) = bucket
            .iter()
            .position(|j| j.layers.overlaps(&joint.layers))
        {
            joint.merge(bucket.swap_remove(i));
        }
        bucket.push(joint);
        bucket.last_mut().expect("bucket was just pushed to")
    }

    /// Link an item into the joint at the key.
    pub fn link(&mut self, pos: Vec2, layers: LayerRange, net: i32, item: ItemId) {
        self.touch(pos, layers, net).link(item);
    }

    /// Remove an item link from the joint at the key.
    pub fn unlink(&mut self, pos: Vec2, layers: LayerRange, net: i32, item: ItemId) {
        self.touch(pos, layers, net).unlink(item);
    }

    /// First joint at `(pos, net)` whose span contains `layer`. Joints with
    /// no remaining links are ignored.
    pub fn find(&self, pos: Vec2, layer: i32, net: i32) -> Option<&Joint> {
        self.buckets
            .get(&JointTag { pos, net })?
            .iter()
            .find(|j| j.layers.contains(layer) && !j.links.is_empty())
    }

    /// Remove every joint at `(pos, net)` whose span overlaps `layers` and
    /// return the union of their link sets. Used when removing a via that
    /// unified several spans into one joint.
    pub fn take_overlapping(
        &mut self,
        pos: Vec2,
        net: i32,
        layers: LayerRange,
    ) -> SmallVec<[ItemId; 8]> {
        let tag = JointTag { pos, net };
        let mut links: SmallVec<[ItemId; 8]> = SmallVec::new();
        if let Some(bucket) = self.buckets.get_mut(&tag) {
            let mut i = 0;
            while i < bucket.len() {
                if bucket[i].layers.overlaps(&layers) {
                    for id in bucket.swap_remove(i).links {
                        if !links.contains(&id) {
                            links.push(id);
                        }
                    }
                } else {
                    i += 1;
                }
            }
            if bucket.is_empty() {
                self.buckets.remove(&tag);
            }
        }
        links
    }

    /// Iterate all joints that still have links.
    pub fn iter(&self) -> impl Iterator<Item = &Joint> {
        self.buckets
            .values()
            .flatten()
            .filter(|j| !j.links.is_empty())
    }

    /// Number of joints that still have links.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no linked joints remain.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
