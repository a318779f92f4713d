// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The revision tree: ownership and lifetime of every item, and the
//! branch/squash/revert/checkout algebra over speculative edits.
//!
//! A revision records the items *added* in it (which it owns) and *shadows*
//! for ancestor-owned items it removed. The tree is an arena of revisions
//! indexed by generational handles; destroying a revision destroys the items
//! it owns, so callers unhook spatial/joint indices before releasing one.

use core::fmt::Debug;

use crate::arena::{ItemArena, ItemId};
use crate::item::Item;

/// Identifier of a revision: slot index plus generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RevisionId(pub(crate) u32, pub(crate) u32);

impl RevisionId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
struct RevisionNode {
    generation: u32,
    parent: Option<RevisionId>,
    branches: Vec<RevisionId>,
    added: Vec<ItemId>,
    removed: Vec<ItemId>,
}

/// Tree of revisions rooted at [`RevisionTree::root`].
pub struct RevisionTree {
    slots: Vec<Option<RevisionNode>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: RevisionId,
}

impl Debug for RevisionTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("RevisionTree")
            .field("revisions", &alive)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Default for RevisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionTree {
    /// Create a tree containing only a root revision.
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: RevisionId::new(0, 0),
        };
        tree.root = tree.alloc(RevisionNode::default());
        tree
    }

    /// The root revision.
    pub fn root(&self) -> RevisionId {
        self.root
    }

    /// Whether `rev` refers to a live revision.
    pub fn is_alive(&self, rev: RevisionId) -> bool {
        self.slots
            .get(rev.idx())
            .and_then(|s| s.as_ref())
            .map(|s| s.generation == rev.1)
            .unwrap_or(false)
    }

    /// Parent revision, `None` for the root or a detached branch.
    pub fn parent(&self, rev: RevisionId) -> Option<RevisionId> {
        self.node(rev).parent
    }

    /// Child branches.
    pub fn branches(&self, rev: RevisionId) -> &[RevisionId] {
        &self.node(rev).branches
    }

    /// Items owned by `rev` (added in it), in insertion order.
    pub fn added_items(&self, rev: RevisionId) -> &[ItemId] {
        &self.node(rev).added
    }

    /// Shadows recorded by `rev`, in insertion order.
    pub fn removed_items(&self, rev: RevisionId) -> &[ItemId] {
        &self.node(rev).removed
    }

    /// Distance from the root (root is 0).
    ///
    /// Recomputed by walking up; the tree stores no depth to keep in sync.
    pub fn depth(&self, rev: RevisionId) -> usize {
        let mut depth = 0;
        let mut cursor = self.node(rev).parent;
        while let Some(r) = cursor {
            depth += 1;
            cursor = self.node(r).parent;
        }
        depth
    }

    /// Whether `rev`'s added-list owns the item.
    pub fn owns(&self, rev: RevisionId, item: ItemId) -> bool {
        self.node(rev).added.contains(&item)
    }

    /// Whether the item is shadowed in `rev` or any of its ancestors.
    pub fn is_shadowed(&self, rev: RevisionId, item: ItemId) -> bool {
        let mut cursor = Some(rev);
        while let Some(r) = cursor {
            let node = self.node(r);
            if node.removed.contains(&item) {
                return true;
            }
            cursor = node.parent;
        }
        false
    }

    /// Number of non-cancelling changes recorded in `rev` alone.
    pub fn num_changes(&self, rev: RevisionId) -> usize {
        let node = self.node(rev);
        node.added.len() + node.removed.len()
    }

    /// Store `item` in the arena and make `rev` its owner.
    ///
    /// `rev` must be the leaf the caller is editing.
    pub fn add_item(&mut self, rev: RevisionId, item: Item, items: &mut ItemArena) -> ItemId {
        let id = items.alloc(item);
        items.set_owner(id, Some(rev));
        self.node_mut(rev).added.push(id);
        id
    }

    /// Remove the item from `rev`: erase and destroy it when `rev` owns it,
    /// record a shadow otherwise.
    pub fn remove_item(&mut self, rev: RevisionId, item: ItemId, items: &mut ItemArena) {
        let node = self.node_mut(rev);
        if let Some(i) = node.added.iter().position(|&id| id == item) {
            node.added.remove(i);
            items.free(item);
        } else {
            node.removed.push(item);
        }
    }

    /// Create an empty child branch of `rev`.
    pub fn branch(&mut self, rev: RevisionId) -> RevisionId {
        let child = self.alloc(RevisionNode {
            parent: Some(rev),
            ..RevisionNode::default()
        });
        self.node_mut(rev).branches.push(child);
        child
    }

    /// Squash `rev` into its parent and return the parent.
    ///
    /// The parent absorbs `rev`'s changes, drops its *other* branches (they
    /// diverged from a state that no longer exists), and adopts `rev`'s
    /// branches. Panics when `rev` is a root.
    pub fn squash(&mut self, rev: RevisionId, items: &mut ItemArena) -> RevisionId {
        let parent = self.node(rev).parent.expect("squash on a root revision");

        let removed = core::mem::take(&mut self.node_mut(rev).removed);
        for item in removed {
            self.remove_item(parent, item, items);
        }
        let added = core::mem::take(&mut self.node_mut(rev).added);
        for &item in &added {
            items.set_owner(item, Some(parent));
        }
        self.node_mut(parent).added.extend(added);

        self.node_mut(parent).branches.retain(|&b| b != rev);
        self.clear_branches(parent, items);

        let adopted = core::mem::take(&mut self.node_mut(rev).branches);
        for &b in &adopted {
            self.node_mut(b).parent = Some(parent);
        }
        self.node_mut(parent).branches = adopted;

        self.free_slot(rev);
        parent
    }

    /// Detach `branch` from `parent` without destroying it. The branch
    /// subtree stays alive with no parent until re-discarded via
    /// [`RevisionTree::discard_subtree`].
    pub fn release_branch(&mut self, parent: RevisionId, branch: RevisionId) -> RevisionId {
        debug_assert!(
            self.node(parent).branches.contains(&branch),
            "release of a non-branch"
        );
        self.node_mut(parent).branches.retain(|&b| b != branch);
        self.node_mut(branch).parent = None;
        branch
    }

    /// Remove `branch` from `parent` and destroy its whole subtree,
    /// including every item the subtree owns.
    pub fn discard_branch(&mut self, parent: RevisionId, branch: RevisionId, items: &mut ItemArena) {
        self.release_branch(parent, branch);
        self.discard_subtree(branch, items);
    }

    /// Destroy a detached subtree and every item it owns.
    pub fn discard_subtree(&mut self, rev: RevisionId, items: &mut ItemArena) {
        let node = self.take_slot(rev);
        for id in node.added {
            items.free(id);
        }
        for b in node.branches {
            self.discard_subtree(b, items);
        }
    }

    /// Destroy all branches of `rev` (and the items introduced below it).
    pub fn clear_branches(&mut self, rev: RevisionId, items: &mut ItemArena) {
        let branches = core::mem::take(&mut self.node_mut(rev).branches);
        for b in branches {
            self.node_mut(b).parent = None;
            self.discard_subtree(b, items);
        }
    }

    /// Empty `rev` itself: destroy its own items, forget its shadows, and
    /// drop its branches. The revision stays in the tree.
    pub fn clear_revision(&mut self, rev: RevisionId, items: &mut ItemArena) {
        let added = core::mem::take(&mut self.node_mut(rev).added);
        for id in added {
            items.free(id);
        }
        self.node_mut(rev).removed.clear();
        self.clear_branches(rev, items);
    }

    /// Aggregate changes of `rev` alone as a change set.
    pub fn revision_changes(&self, rev: RevisionId) -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.apply_revision(self, rev);
        changes
    }

    /// Upward path `[from .. ancestor)`; the whole path is a revert leg.
    ///
    /// Panics when `ancestor` is not reachable via parents.
    pub fn path_to_ancestor(&self, from: RevisionId, ancestor: RevisionId) -> RevisionPath {
        let mut revert = Vec::new();
        let mut cursor = from;
        while cursor != ancestor {
            revert.push(cursor);
            cursor = self
                .node(cursor)
                .parent
                .expect("path target is not an ancestor");
        }
        RevisionPath::new(revert, Vec::new())
    }

    /// Path between two arbitrary revisions of one tree: walk the deeper end
    /// up to equal depth, then both in lockstep to their nearest common
    /// ancestor.
    ///
    /// Panics when the revisions share no ancestor.
    pub fn path_between(&self, from: RevisionId, to: RevisionId) -> RevisionPath {
        let mut from_depth = self.depth(from);
        let mut to_depth = self.depth(to);
        let mut revert = Vec::new();
        let mut apply = Vec::new();
        let mut from_cursor = Some(from);
        let mut to_cursor = Some(to);

        while from_depth > to_depth {
            let r = from_cursor.expect("depth and parent chain disagree");
            revert.push(r);
            from_cursor = self.node(r).parent;
            from_depth -= 1;
        }
        while to_depth > from_depth {
            let r = to_cursor.expect("depth and parent chain disagree");
            apply.push(r);
            to_cursor = self.node(r).parent;
            to_depth -= 1;
        }
        while let (Some(f), Some(t)) = (from_cursor, to_cursor) {
            if f == t {
                break;
            }
            revert.push(f);
            apply.push(t);
            from_cursor = self.node(f).parent;
            to_cursor = self.node(t).parent;
        }

        assert!(
            from_cursor.is_some() && from_cursor == to_cursor,
            "revisions share no common ancestor"
        );
        RevisionPath::new(revert, apply)
    }

    // --- internals ---

    fn node(&self, rev: RevisionId) -> &RevisionNode {
        let node = self.slots[rev.idx()].as_ref().expect("dangling RevisionId");
        assert_eq!(node.generation, rev.1, "dangling RevisionId");
        node
    }

    fn node_mut(&mut self, rev: RevisionId) -> &mut RevisionNode {
        let node = self.slots[rev.idx()].as_mut().expect("dangling RevisionId");
        assert_eq!(node.generation, rev.1, "dangling RevisionId");
        node
    }

    fn alloc(&mut self, mut node: RevisionNode) -> RevisionId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            node.generation = generation;
            self.slots[idx] = Some(node);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "RevisionId uses 32-bit indices by design."
            )]
            {
                RevisionId::new(idx as u32, generation)
            }
        } else {
            let generation = 1_u32;
            node.generation = generation;
            self.slots.push(Some(node));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "RevisionId uses 32-bit indices by design."
            )]
            {
                RevisionId::new((self.slots.len() - 1) as u32, generation)
            }
        }
    }

    fn take_slot(&mut self, rev: RevisionId) -> RevisionNode {
        let node = self.slots[rev.idx()].take().expect("dangling RevisionId");
        assert_eq!(node.generation, rev.1, "dangling RevisionId");
        self.free_list.push(rev.idx());
        node
    }

    fn free_slot(&mut self, rev: RevisionId) {
        let _ = self.take_slot(rev);
    }
}

/// How to move a world between two revisions: revert these, then apply
/// those.
#[derive(Clone, Debug, Default)]
pub struct RevisionPath {
    revert: Vec<RevisionId>,
    apply: Vec<RevisionId>,
}

impl RevisionPath {
    /// Build a path from its legs. Both are ordered deepest-first, as they
    /// are collected walking up the tree.
    pub fn new(revert: Vec<RevisionId>, apply: Vec<RevisionId>) -> Self {
        Self { revert, apply }
    }

    /// Total number of legs.
    pub fn len(&self) -> usize {
        self.revert.len() + self.apply.len()
    }

    /// Whether the path is empty (source equals target).
    pub fn is_empty(&self) -> bool {
        self.revert.is_empty() && self.apply.is_empty()
    }

    /// Swap the direction of travel.
    pub fn invert(&mut self) {
        core::mem::swap(&mut self.revert, &mut self.apply);
    }

    /// The inverted path.
    pub fn inverted(mut self) -> Self {
        self.invert();
        self
    }

    /// Revisions to revert, in order (deepest first).
    pub fn revert_sequence(&self) -> impl Iterator<Item = RevisionId> + '_ {
        self.revert.iter().copied()
    }

    /// Revisions to apply, in order (nearest the common ancestor first).
    pub fn apply_sequence(&self) -> impl Iterator<Item = RevisionId> + '_ {
        self.apply.iter().rev().copied()
    }
}

/// Aggregated, self-cancelling add/remove delta over item handles.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    added: Vec<ItemId>,
    removed: Vec<ItemId>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
    }

    /// Record an addition; cancels a pending removal of the same item.
    pub fn add(&mut self, item: ItemId) {
        if let Some(i) = self.removed.iter().position(|&id| id == item) {
            self.removed.remove(i);
        } else {
            self.added.push(item);
        }
    }

    /// Record a removal; cancels a pending addition of the same item.
    pub fn remove(&mut self, item: ItemId) {
        if let Some(i) = self.added.iter().position(|&id| id == item) {
            self.added.remove(i);
        } else {
            self.removed.push(item);
        }
    }

    /// Fold a revision's changes in, forward.
    pub fn apply_revision(&mut self, tree: &RevisionTree, rev: RevisionId) {
        for &item in tree.added_items(rev) {
            self.add(item);
        }
        for &item in tree.removed_items(rev) {
            self.remove(item);
        }
    }

    /// Fold a revision's changes in, backward.
    pub fn revert_revision(&mut self, tree: &RevisionTree, rev: RevisionId) {
        for &item in tree.added_items(rev) {
            self.remove(item);
        }
        for &item in tree.removed_items(rev) {
            self.add(item);
        }
    }

    /// Compose a whole path into one net delta: revert legs first, then
    /// apply legs nearest the common ancestor first, exactly as
    /// [`crate::World::walk_path`] would traverse them.
    pub fn from_path(tree: &RevisionTree, path: &RevisionPath) -> Self {
        let mut changes = Self::new();
        for rev in path.revert_sequence() {
            changes.revert_revision(tree, rev);
        }
        for rev in path.apply_sequence() {
            changes.apply_revision(tree, rev);
        }
        changes
    }

    /// Net additions.
    pub fn added_items(&self) -> &[ItemId] {
        &self.added
    }

    /// Net removals.
    pub fn removed_items(&self) -> &[ItemId] {
        &self.removed
    }

    /// Whether the delta is empty.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
