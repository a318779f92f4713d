// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The world facade: spatial index + joint map + current revision.
//!
//! A [`World`] binds the item arena, the revision tree, the spatial index
//! and the joint map behind one mutation and query surface. Mutations go
//! through the current revision so they can be branched, squashed, reverted
//! or checked out later; queries see exactly the items reachable from the
//! current revision.

use std::collections::HashSet;

use copperline_geom::{LineChain, Rect, Shape, Vec2};
use copperline_index::SpatialIndex;
use tracing::{debug, trace};

use crate::arena::{ItemArena, ItemId};
use crate::item::{Item, ItemMeta, KindMask, LayerRange, ParentRef, Segment, Solid, Via};
use crate::joint::{Joint, JointMap};
use crate::line::Line;
use crate::revision::{ChangeSet, RevisionId, RevisionPath, RevisionTree};

/// Tunables of a world.
#[derive(Copy, Clone, Debug)]
pub struct WorldConfig {
    /// Upper bound on any pairwise clearance a query will consider; sizes
    /// the spatial query window. Queries with a larger required clearance
    /// can miss candidates.
    pub max_clearance: i64,
    /// Clearance used when no rule resolver is installed.
    pub default_clearance: i64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_clearance: 800_000,
            default_clearance: 100_000,
        }
    }
}

/// Pairwise clearance oracle supplied by the host.
pub trait RuleResolver {
    /// Required clearance between two items.
    fn clearance(&self, a: &ItemMeta, b: &ItemMeta) -> i64;
}

/// Per-query visitor capability: called for every spatial candidate until it
/// returns `false`.
pub trait ObstacleVisitor {
    /// Inspect one candidate; return `false` to stop the query.
    fn visit(&mut self, world: &World, candidate: ItemId) -> bool;
}

/// A collision hit: the obstacle found for the probe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Obstacle {
    /// The colliding world item.
    pub item: ItemId,
}

/// Result of a nearest-obstacle sweep along a line.
#[derive(Clone, Debug)]
pub struct NearestObstacle {
    /// The obstacle item.
    pub item: ItemId,
    /// The obstacle's clearance hull (empty when no intersection was found).
    pub hull: LineChain,
    /// First hull crossing along the line.
    pub ip_first: Vec2,
    /// Arc-length distance of the first crossing; `i64::MAX` when the line
    /// never crosses a hull.
    pub dist_first: i64,
    /// Last hull crossing along the line, over all obstacles.
    pub ip_last: Vec2,
    /// Arc-length distance of the last crossing.
    pub dist_last: i64,
}

/// Filters applied by [`World::query_colliding`].
#[derive(Copy, Clone, Debug)]
pub struct CollisionFilter {
    /// Accepted obstacle kinds.
    pub kinds: KindMask,
    /// Stop after this many hits.
    pub limit: Option<usize>,
    /// Ignore candidates on the probe's own net.
    pub different_nets_only: bool,
    /// Override the resolved clearance entirely.
    pub force_clearance: Option<i64>,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            kinds: KindMask::ANY,
            limit: None,
            different_nets_only: false,
            force_clearance: None,
        }
    }
}

impl CollisionFilter {
    /// Filter accepting only the given kinds.
    pub fn of_kind(kinds: KindMask) -> Self {
        Self {
            kinds,
            ..Self::default()
        }
    }
}

/// A collision probe: an item (owned or transient) or a line view.
#[derive(Copy, Clone, Debug)]
pub enum Probe<'a> {
    /// Probe with an item's footprint.
    Item(&'a Item),
    /// Probe with a whole line view (every segment, plus its via).
    Line(&'a Line),
}

impl Probe<'_> {
    fn bbox(&self) -> Rect {
        match self {
            Self::Item(item) => item.bbox(),
            Self::Line(line) => line.bbox(),
        }
    }

    fn meta(&self) -> ItemMeta {
        match self {
            Self::Item(item) => item.meta(),
            Self::Line(line) => line.meta(),
        }
    }

    fn collides_with_item(&self, item: &Item, clearance: i64, different_nets_only: bool) -> bool {
        match self {
            Self::Item(probe) => probe.collides(item, clearance, different_nets_only),
            Self::Line(line) => line_collides_item(line, item, clearance, different_nets_only),
        }
    }
}

fn line_segment_item(line: &Line, i: usize) -> Segment {
    Segment::new(line.segment(i), line.width(), line.net(), line.layers())
}

fn line_collides_item(line: &Line, item: &Item, clearance: i64, different_nets_only: bool) -> bool {
    if different_nets_only && line.net() == item.net() {
        return false;
    }
    if line.layers().overlaps(&item.layers()) {
        let other = item.shape();
        for i in 0..line.segment_count() {
            let capsule = Shape::segment(line.segment(i), line.width());
            if capsule.collides_with(&other, clearance) {
                return true;
            }
        }
    }
    if let Some(via) = line.via()
        && via.layers().overlaps(&item.layers())
        && via.shape().collides_with(&item.shape(), clearance)
    {
        return true;
    }
    false
}

fn line_collides_line(a: &Line, b: &Line, clearance: i64) -> bool {
    for i in 0..a.segment_count() {
        let seg = Item::Segment(line_segment_item(a, i));
        if line_collides_item(b, &seg, clearance, false) {
            return true;
        }
    }
    if let Some(via) = a.via() {
        let via = Item::Via(via.clone());
        if line_collides_item(b, &via, clearance, false) {
            return true;
        }
    }
    false
}

enum IndexAnchor {
    Point(Vec2),
    Ends(Vec2, Vec2),
    ViaPoint(Vec2),
}

/// The spatial world model.
pub struct World {
    items: ItemArena,
    revisions: RevisionTree,
    current: RevisionId,
    index: SpatialIndex<ItemId>,
    joints: JointMap,
    config: WorldConfig,
    resolver: Option<Box<dyn RuleResolver>>,
}

impl core::fmt::Debug for World {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("World")
            .field("items", &self.items)
            .field("index", &self.index)
            .field("joints", &self.joints)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world with default tunables.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world.
    pub fn with_config(config: WorldConfig) -> Self {
        debug_assert!(config.max_clearance > 0 && config.default_clearance >= 0);
        let revisions = RevisionTree::new();
        let current = revisions.root();
        debug!(max_clearance = config.max_clearance, "created world");
        Self {
            items: ItemArena::new(),
            revisions,
            current,
            index: SpatialIndex::new(),
            joints: JointMap::new(),
            config,
            resolver: None,
        }
    }

    /// Install (or remove) the clearance rule resolver.
    pub fn set_rule_resolver(&mut self, resolver: Option<Box<dyn RuleResolver>>) {
        self.resolver = resolver;
    }

    /// The world tunables.
    pub fn config(&self) -> WorldConfig {
        self.config
    }

    /// Resolve the required clearance between two items, falling back to the
    /// configured default when no resolver is installed.
    pub fn clearance(&self, a: &ItemMeta, b: &ItemMeta) -> i64 {
        match &self.resolver {
            Some(r) => r.clearance(a, b),
            None => self.config.default_clearance,
        }
    }

    /// The item arena (read-only).
    pub fn items(&self) -> &ItemArena {
        &self.items
    }

    /// The revision tree (read-only).
    pub fn revisions(&self) -> &RevisionTree {
        &self.revisions
    }

    /// The joint map (read-only view for diagnostics).
    pub fn joints(&self) -> &JointMap {
        &self.joints
    }

    /// Iterate every item currently visible to queries.
    pub fn visible_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.index.iter()
    }

    // --- mutation ---

    /// Insert a solid pad.
    pub fn add_solid(&mut self, solid: Solid) -> ItemId {
        let id = self
            .revisions
            .add_item(self.current, Item::Solid(solid), &mut self.items);
        self.add_item_index(id);
        id
    }

    /// Insert a via.
    pub fn add_via(&mut self, via: Via) -> ItemId {
        let id = self
            .revisions
            .add_item(self.current, Item::Via(via), &mut self.items);
        self.add_item_index(id);
        id
    }

    /// Insert a wire segment.
    ///
    /// Zero-length segments are ignored. Unless `allow_redundant` is set, a
    /// segment that duplicates an existing one (same endpoints, layer start
    /// and net) is skipped. Returns `None` in both cases.
    pub fn add_segment(&mut self, segment: Segment, allow_redundant: bool) -> Option<ItemId> {
        let seg = segment.seg();
        if seg.a == seg.b {
            trace!(pos = ?seg.a, "ignoring segment with coincident endpoints");
            return None;
        }
        if !allow_redundant
            && let Some(existing) =
                self.find_redundant_segment(seg.a, seg.b, segment.layers(), segment.net())
        {
            trace!(?existing, "skipping redundant segment");
            return None;
        }
        let id = self
            .revisions
            .add_item(self.current, Item::Segment(segment), &mut self.items);
        self.add_item_index(id);
        Some(id)
    }

    /// Insert a line view by inserting (or binding to) its segments.
    ///
    /// The line itself is never owned by the revision tree; its owner field
    /// only records the revision the view is valid against.
    pub fn add_line(&mut self, line: &mut Line, allow_redundant: bool) {
        debug_assert!(!line.is_linked(), "line is already linked to segments");
        for i in 0..line.segment_count() {
            let seg = line.segment(i);
            if seg.a == seg.b {
                continue;
            }
            if !allow_redundant
                && let Some(existing) =
                    self.find_redundant_segment(seg.a, seg.b, line.layers(), line.net())
            {
                line.link_segment(existing);
                continue;
            }
            let id = self
                .add_segment(line_segment_item(line, i), true)
                .expect("segment endpoints are distinct");
            line.link_segment(id);
        }
        line.set_owner(Some(self.current));
    }

    /// Insert an item by kind.
    pub fn add_item(&mut self, item: Item, allow_redundant: bool) -> Option<ItemId> {
        match item {
            Item::Solid(s) => Some(self.add_solid(s)),
            Item::Via(v) => Some(self.add_via(v)),
            Item::Segment(s) => self.add_segment(s, allow_redundant),
        }
    }

    /// Remove an item: unhook it from the indices and record the removal in
    /// the current revision (destroying the item when the current revision
    /// owns it, shadowing it otherwise).
    pub fn remove(&mut self, id: ItemId) {
        self.remove_item_index(id);
        self.revisions.remove_item(self.current, id, &mut self.items);
    }

    /// Remove every segment linked by the line, then detach the view.
    pub fn remove_line(&mut self, line: &mut Line) {
        let links: Vec<ItemId> = line.links().to_vec();
        for id in links {
            self.remove(id);
        }
        line.set_owner(None);
        line.clear_links();
    }

    /// Remove `old` and insert `new` in its place.
    pub fn replace(&mut self, old: ItemId, new: Item) -> Option<ItemId> {
        self.remove(old);
        self.add_item(new, false)
    }

    /// Remove `old`'s segments and insert `new`'s.
    pub fn replace_line(&mut self, old: &mut Line, new: &mut Line) {
        self.remove_line(old);
        self.add_line(new, false);
    }

    // --- queries ---

    /// Run a raw spatial query around the probe, dispatching every candidate
    /// to the visitor. Returns the number of candidates visited.
    pub fn query_colliding_visitor(
        &self,
        probe: &Probe<'_>,
        visitor: &mut dyn ObstacleVisitor,
    ) -> usize {
        self.index
            .query(probe.bbox(), self.config.max_clearance, |id| {
                visitor.visit(self, id)
            })
    }

    /// Collect the obstacles colliding with the probe.
    ///
    /// Clearance per candidate is the forced override when set, otherwise
    /// the resolved pairwise clearance plus half the probe's width when the
    /// probe is a line (centerline to edge).
    pub fn query_colliding(&self, probe: &Probe<'_>, filter: &CollisionFilter) -> Vec<Obstacle> {
        let mut obstacles = Vec::new();
        let extra = match probe {
            Probe::Line(line) => line.width() / 2,
            Probe::Item(_) => 0,
        };
        let probe_meta = probe.meta();
        self.index
            .query(probe.bbox(), self.config.max_clearance, |id| {
                let candidate = self.items.item(id);
                if !candidate.of_kind(filter.kinds) {
                    return true;
                }
                let clearance = match filter.force_clearance {
                    Some(forced) => forced,
                    None => extra + self.clearance(&candidate.meta(), &probe_meta),
                };
                if !probe.collides_with_item(candidate, clearance, filter.different_nets_only) {
                    return true;
                }
                obstacles.push(Obstacle { item: id });
                match filter.limit {
                    Some(limit) => obstacles.len() < limit,
                    None => true,
                }
            });
        obstacles
    }

    /// First obstacle colliding with the probe, if any. Line probes test
    /// segment by segment (then the terminating via) and stop at the first
    /// hit.
    pub fn check_colliding(&self, probe: &Probe<'_>, kinds: KindMask) -> Option<Obstacle> {
        match probe {
            Probe::Line(line) => {
                for i in 0..line.segment_count() {
                    let seg = Item::Segment(line_segment_item(line, i));
                    if let Some(hit) = self.first_collision(&Probe::Item(&seg), kinds) {
                        return Some(hit);
                    }
                }
                if let Some(via) = line.via() {
                    let via = Item::Via(via.clone());
                    if let Some(hit) = self.first_collision(&Probe::Item(&via), kinds) {
                        return Some(hit);
                    }
                }
                None
            }
            probe => self.first_collision(probe, kinds),
        }
    }

    /// Direct pairwise collision test between two probes.
    ///
    /// Clearance is the forced value when given, otherwise the resolved
    /// pairwise clearance; either probe being a line adds half its width.
    pub fn check_colliding_items(
        &self,
        a: &Probe<'_>,
        b: &Probe<'_>,
        force_clearance: Option<i64>,
    ) -> bool {
        let mut clearance =
            force_clearance.unwrap_or_else(|| self.clearance(&a.meta(), &b.meta()));
        if let Probe::Line(line) = a {
            clearance += line.width() / 2;
        }
        if let Probe::Line(line) = b {
            clearance += line.width() / 2;
        }
        match (a, b) {
            (Probe::Item(x), Probe::Item(y)) => x.collides(y, clearance, false),
            (Probe::Line(line), Probe::Item(item)) | (Probe::Item(item), Probe::Line(line)) => {
                line_collides_item(line, item, clearance, false)
            }
            (Probe::Line(x), Probe::Line(y)) => line_collides_line(x, y, clearance),
        }
    }

    /// Find the obstacle whose clearance hull the line crosses first, by
    /// arc length along the line (and through its terminating via).
    ///
    /// With `restricted` set, only obstacles in the set are considered.
    /// When candidates collide but the line never crosses a hull (it starts
    /// inside one), the first candidate is reported with infinite distances.
    pub fn nearest_obstacle(
        &self,
        line: &Line,
        kinds: KindMask,
        restricted: Option<&HashSet<ItemId>>,
    ) -> Option<NearestObstacle> {
        let filter = CollisionFilter::of_kind(kinds);
        let mut candidates: Vec<Obstacle> = Vec::new();
        for i in 0..line.segment_count() {
            let seg = Item::Segment(line_segment_item(line, i));
            candidates.extend(self.query_colliding(&Probe::Item(&seg), &filter));
        }
        if let Some(via) = line.via() {
            let via = Item::Via(via.clone());
            candidates.extend(self.query_colliding(&Probe::Item(&via), &filter));
        }
        if candidates.is_empty() {
            return None;
        }

        let line_meta = line.meta();
        let mut best: Option<(ItemId, LineChain)> = None;
        let mut ip_first = Vec2::ZERO;
        let mut dist_first = i64::MAX;
        let mut ip_last = Vec2::ZERO;
        let mut dist_last = i64::MIN;

        for candidate in &candidates {
            if let Some(set) = restricted
                && !set.contains(&candidate.item)
            {
                continue;
            }
            let obstacle = self.items.item(candidate.item);
            let clearance = self.clearance(&obstacle.meta(), &line_meta);
            let hull = obstacle.hull(clearance, line.width());

            let mut isects = Vec::new();
            if let Some(via) = line.via() {
                let via_meta = Item::Via(via.clone()).meta();
                let via_clearance = self.clearance(&obstacle.meta(), &via_meta);
                let via_hull = via.hull(via_clearance, line.width());
                via_hull.intersect_into(&hull, &mut isects);
                for &p in &isects {
                    let dist = line.length() + (p - via.pos()).length();
                    if dist < dist_first {
                        dist_first = dist;
                        ip_first = p;
                        best = Some((candidate.item, hull.clone()));
                    }
                    if dist > dist_last {
                        dist_last = dist;
                        ip_last = p;
                    }
                }
                isects.clear();
            }

            hull.intersect_into(line.chain(), &mut isects);
            for &p in &isects {
                let dist = line
                    .chain()
                    .path_length(p)
                    .expect("hull crossing lies on the probed line");
                if dist < dist_first {
                    dist_first = dist;
                    ip_first = p;
                    best = Some((candidate.item, hull.clone()));
                }
                if dist > dist_last {
                    dist_last = dist;
                    ip_last = p;
                }
            }
        }

        match best {
            Some((item, hull)) => Some(NearestObstacle {
                item,
                hull,
                ip_first,
                dist_first,
                ip_last,
                dist_last,
            }),
            // Candidates collided, but the line never crossed a hull.
            None => Some(NearestObstacle {
                item: candidates[0].item,
                hull: LineChain::new(),
                ip_first: Vec2::ZERO,
                dist_first: i64::MAX,
                ip_last: Vec2::ZERO,
                dist_last: i64::MAX,
            }),
        }
    }

    /// Every item whose footprint contains the point.
    pub fn hit_test(&self, p: Vec2) -> Vec<ItemId> {
        let probe = Shape::circle(p, 0);
        let mut hits = Vec::new();
        self.index
            .query(Rect::from_point(p), self.config.max_clearance, |id| {
                if self.items.item(id).shape().collides_with(&probe, 0) {
                    hits.push(id);
                }
                true
            });
        hits
    }

    // --- connectivity ---

    /// First joint at `(pos, net)` whose layer span contains `layer`.
    pub fn find_joint(&self, pos: Vec2, layer: i32, net: i32) -> Option<&Joint> {
        self.joints.find(pos, layer, net)
    }

    /// The joint an item is linked to at `pos`.
    pub fn find_joint_for(&self, pos: Vec2, item: ItemId) -> Option<&Joint> {
        let it = self.items.item(item);
        self.joints.find(pos, it.layers().start(), it.net())
    }

    /// Set or clear the lock bit on the joint at `pos` touching `item`.
    pub fn lock_joint(&mut self, pos: Vec2, item: ItemId, lock: bool) {
        let (layers, net) = {
            let it = self.items.item(item);
            (it.layers(), it.net())
        };
        self.joints.touch(pos, layers, net).lock(lock);
    }

    /// An existing segment with the same endpoints, layer start and net.
    pub fn find_redundant_segment(
        &self,
        a: Vec2,
        b: Vec2,
        layers: LayerRange,
        net: i32,
    ) -> Option<ItemId> {
        let joint = self.joints.find(a, layers.start(), net)?;
        for &id in joint.links() {
            if let Item::Segment(other) = self.items.item(id) {
                let (a2, b2) = (other.seg().a, other.seg().b);
                if other.layers().start() == layers.start()
                    && ((a == a2 && b == b2) || (a == b2 && b == a2))
                {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Reconstruct the maximal line containing the seed segment.
    ///
    /// Walks away from both segment ends through two-segment corner joints,
    /// stopping at junctions, line ends, locked joints (when asked to) and
    /// on closing a loop. The seed's position within the assembled link list
    /// is `line.links().iter().position(..)` of the seed id.
    pub fn assemble_line(&self, seed: ItemId, stop_at_locked_joints: bool) -> Line {
        let Item::Segment(seed_seg) = self.items.item(seed) else {
            panic!("assemble_line requires a segment seed");
        };
        let (width, layers, net) = (seed_seg.width(), seed_seg.layers(), seed_seg.net());

        let mut backward = Vec::new();
        let guard_hit = self.follow_line(seed, false, stop_at_locked_joints, &mut backward);
        let mut forward = Vec::new();
        if !guard_hit {
            self.follow_line(seed, true, stop_at_locked_joints, &mut forward);
        }

        let mut line = Line::new(LineChain::new(), width, layers, net);
        line.set_owner(Some(self.current));

        backward.reverse();
        let mut prev: Option<ItemId> = None;
        for (pos, seg) in backward.into_iter().chain(forward) {
            line.push_point(pos);
            if let Some(id) = seg
                && prev != Some(id)
            {
                line.link_segment(id);
            }
            prev = seg;
        }
        debug_assert!(line.segment_count() != 0, "assembly produced a point");
        line
    }

    /// Every line starting at a segment of joint `a` that also passes
    /// through joint `b`, clipped to the span between the two joints.
    pub fn find_lines_between_joints(&self, a: &Joint, b: &Joint) -> Vec<Line> {
        let mut lines = Vec::new();
        for &id in a.links() {
            if !matches!(self.items.item(id), Item::Segment(_)) {
                continue;
            }
            let mut line = self.assemble_line(id, false);
            if !line.layers().overlaps(&b.layers()) {
                continue;
            }
            let (Some(start), Some(end)) = (line.chain().find(a.pos()), line.chain().find(b.pos()))
            else {
                continue;
            };
            let (start, end) = if end < start { (end, start) } else { (start, end) };
            line.clip_vertex_range(start, end);
            lines.push(line);
        }
        lines
    }

    /// The joints at the two ends of a line.
    pub fn find_line_ends(&self, line: &Line) -> Option<(&Joint, &Joint)> {
        let first = *line.points().first()?;
        let last = *line.points().last()?;
        let a = self.joints.find(first, line.layers().start(), line.net())?;
        let b = self.joints.find(last, line.layers().start(), line.net())?;
        Some((a, b))
    }

    /// All items registered to a net.
    pub fn items_for_net(&self, net: i32) -> &[ItemId] {
        self.index.items_for_net(net)
    }

    /// Reset every item's rank and clear the given marker bits.
    pub fn clear_ranks(&mut self, marker_mask: u32) {
        let ids: Vec<ItemId> = self.index.iter().collect();
        for id in ids {
            let data = self.items.item_mut(id).data_mut();
            data.rank = -1;
            data.marker &= !marker_mask;
        }
    }

    /// Items carrying any of the given marker bits.
    pub fn find_by_marker(&self, marker_mask: u32) -> Vec<ItemId> {
        self.index
            .iter()
            .filter(|&id| self.items.item(id).marker() & marker_mask != 0)
            .collect()
    }

    /// Remove every item carrying any of the given marker bits.
    pub fn remove_by_marker(&mut self, marker_mask: u32) {
        // Buffer first: removal invalidates index iteration.
        let garbage = self.find_by_marker(marker_mask);
        for id in garbage {
            self.remove(id);
        }
    }

    /// Set an item's router-pass marker bits.
    pub fn set_marker(&mut self, id: ItemId, marker: u32) {
        self.items.item_mut(id).data_mut().marker = marker;
    }

    /// Set an item's router-pass rank.
    pub fn set_rank(&mut self, id: ItemId, rank: i32) {
        self.items.item_mut(id).data_mut().rank = rank;
    }

    /// Set an item's host-board back-pointer.
    pub fn set_parent(&mut self, id: ItemId, parent: Option<ParentRef>) {
        self.items.item_mut(id).data_mut().parent = parent;
    }

    /// The visible item whose host-board back-pointer matches.
    pub fn find_item_by_parent(&self, net: i32, parent: ParentRef) -> Option<ItemId> {
        self.index
            .items_for_net(net)
            .iter()
            .copied()
            .find(|&id| self.items.item(id).parent() == Some(parent))
    }

    // --- revision control ---

    /// The current revision.
    pub fn revision(&self) -> RevisionId {
        self.current
    }

    /// Aggregate changes of the current revision alone.
    pub fn revision_changes(&self) -> ChangeSet {
        self.revisions.revision_changes(self.current)
    }

    /// Upward path from the current revision to an ancestor.
    pub fn path_to(&self, ancestor: RevisionId) -> RevisionPath {
        self.revisions.path_to_ancestor(self.current, ancestor)
    }

    /// Branch the current revision and move onto the new leaf; returns the
    /// previous revision.
    pub fn branch_move(&mut self) -> RevisionId {
        let previous = self.current;
        self.current = self.revisions.branch(previous);
        previous
    }

    /// Squash the current revision into its parent. Indices are untouched:
    /// the visible item set does not change.
    pub fn squash(&mut self) {
        self.current = self.revisions.squash(self.current, &mut self.items);
    }

    /// Squash until the current revision *is* `ancestor`.
    pub fn squash_to_revision(&mut self, ancestor: RevisionId) {
        while self.current != ancestor {
            self.squash();
        }
    }

    /// Squash until the current revision's parent is `ancestor`.
    pub fn squash_to_parent_revision(&mut self, ancestor: RevisionId) {
        while self.revisions.parent(self.current) != Some(ancestor) {
            self.squash();
        }
    }

    /// Throw the current revision away: unhook its changes from the indices
    /// and destroy it (and the items it owns), moving onto its parent.
    pub fn revert(&mut self) {
        let parent = self
            .revisions
            .parent(self.current)
            .expect("revert on the root revision");
        self.revert_revision_indices(self.current);
        self.revisions
            .discard_branch(parent, self.current, &mut self.items);
        self.current = parent;
    }

    /// Revert until the current revision *is* `ancestor`.
    pub fn revert_to_revision(&mut self, ancestor: RevisionId) {
        while self.current != ancestor {
            self.revert();
        }
    }

    /// Revert until the current revision's parent is `ancestor`.
    pub fn revert_to_parent_revision(&mut self, ancestor: RevisionId) {
        while self.revisions.parent(self.current) != Some(ancestor) {
            self.revert();
        }
    }

    /// Move the world onto `target`, reverting and applying revisions along
    /// the tree path between the two.
    pub fn checkout_revision(&mut self, target: RevisionId) {
        let path = self.revisions.path_between(self.current, target);
        self.walk_path(&path);
    }

    /// Traverse a revision path relative to the current revision, updating
    /// the spatial and joint indices on every leg.
    pub fn walk_path(&mut self, path: &RevisionPath) {
        for rev in path.revert_sequence() {
            assert_eq!(rev, self.current, "path revert leg must start at the current revision");
            self.revert_revision_indices(rev);
            self.current = self
                .revisions
                .parent(rev)
                .expect("path revert leg walked past a root");
        }
        for rev in path.apply_sequence() {
            assert_eq!(
                self.revisions.parent(rev),
                Some(self.current),
                "path apply leg must descend from the current revision"
            );
            self.apply_revision_indices(rev);
            self.current = rev;
        }
    }

    /// Destroy all branches of the current revision.
    pub fn clear_branches(&mut self) {
        self.revisions.clear_branches(self.current, &mut self.items);
    }

    /// Empty the indices and the current revision's own change lists. The
    /// revision tree above the current revision is left alone.
    pub fn clear(&mut self) {
        self.index.clear();
        self.joints.clear();
        self.revisions.clear_revision(self.current, &mut self.items);
    }

    // --- internals ---

    fn first_collision(&self, probe: &Probe<'_>, kinds: KindMask) -> Option<Obstacle> {
        let filter = CollisionFilter {
            kinds,
            limit: Some(1),
            ..CollisionFilter::default()
        };
        self.query_colliding(probe, &filter).into_iter().next()
    }

    fn anchor_of(item: &Item) -> IndexAnchor {
        match item {
            Item::Solid(s) => IndexAnchor::Point(s.pos()),
            Item::Via(v) => IndexAnchor::ViaPoint(v.pos()),
            Item::Segment(s) => IndexAnchor::Ends(s.seg().a, s.seg().b),
        }
    }

    fn add_item_index(&mut self, id: ItemId) {
        let (anchor, layers, net, bbox) = {
            let item = self.items.item(id);
            (Self::anchor_of(item), item.layers(), item.net(), item.bbox())
        };
        match anchor {
            IndexAnchor::Point(p) | IndexAnchor::ViaPoint(p) => {
                self.joints.link(p, layers, net, id);
            }
            IndexAnchor::Ends(a, b) => {
                self.joints.link(a, layers, net, id);
                self.joints.link(b, layers, net, id);
            }
        }
        self.index.add(id, bbox, net);
    }

    fn remove_item_index(&mut self, id: ItemId) {
        let (anchor, layers, net, bbox) = {
            let item = self.items.item(id);
            (Self::anchor_of(item), item.layers(), item.net(), item.bbox())
        };
        match anchor {
            IndexAnchor::Point(p) => {
                self.joints.unlink(p, layers, net, id);
            }
            IndexAnchor::Ends(a, b) => {
                self.joints.unlink(a, layers, net, id);
                self.joints.unlink(b, layers, net, id);
            }
            IndexAnchor::ViaPoint(p) => {
                // The via may have unified several layer spans into one
                // joint; drop every overlapping joint and re-link the
                // remaining items under their own spans.
                let links = self.joints.take_overlapping(p, net, layers);
                trace!(links = links.len(), "refragmenting via joint");
                for link in links {
                    if link == id {
                        continue;
                    }
                    let link_layers = self.items.item(link).layers();
                    self.joints.link(p, link_layers, net, link);
                }
            }
        }
        self.index.remove(id, bbox, net);
    }

    fn apply_revision_indices(&mut self, rev: RevisionId) {
        for id in self.revisions.removed_items(rev).to_vec() {
            self.remove_item_index(id);
        }
        for id in self.revisions.added_items(rev).to_vec() {
            self.add_item_index(id);
        }
    }

    fn revert_revision_indices(&mut self, rev: RevisionId) {
        for id in self.revisions.added_items(rev).to_vec() {
            self.remove_item_index(id);
        }
        for id in self.revisions.removed_items(rev).to_vec() {
            self.add_item_index(id);
        }
    }

    /// Walk from the seed towards one side, recording `(corner, segment)`
    /// pairs. Returns whether the walk closed a loop; the closing corner is
    /// recorded with no segment.
    fn follow_line(
        &self,
        seed: ItemId,
        forward: bool,
        stop_at_locked: bool,
        out: &mut Vec<(Vec2, Option<ItemId>)>,
    ) -> bool {
        const MAX_STEPS: usize = 16 * 1024;

        let seg_of = |id: ItemId| match self.items.item(id) {
            Item::Segment(s) => s.seg(),
            _ => unreachable!("line corners link only segments"),
        };

        let seed_seg = seg_of(seed);
        let guard = if forward { seed_seg.b } else { seed_seg.a };
        let mut current = seed;
        let mut prev_reversed = false;

        for count in 0.. {
            let seg = seg_of(current);
            let p = if forward ^ prev_reversed { seg.b } else { seg.a };
            let joint = self
                .find_joint_for(p, current)
                .expect("missing joint during line assembly");

            if count > 0 && p == guard {
                out.push((joint.pos(), None));
                return true;
            }
            out.push((joint.pos(), Some(current)));

            let locked = stop_at_locked && joint.is_locked();
            if locked || !joint.is_line_corner(&self.items) || out.len() >= MAX_STEPS {
                break;
            }

            let next = joint
                .next_segment(current, &self.items)
                .expect("line corner has two segments");
            let next_seg = seg_of(next);
            prev_reversed = joint.pos() == if forward { next_seg.b } else { next_seg.a };
            current = next;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Kind;
    use copperline_geom::Seg;

    struct FixedClearance(i64);

    impl RuleResolver for FixedClearance {
        fn clearance(&self, _: &ItemMeta, _: &ItemMeta) -> i64 {
            self.0
        }
    }

    fn v(x: i64, y: i64) -> Vec2 {
        Vec2::new(x, y)
    }

    fn seg_item(ax: i64, ay: i64, bx: i64, by: i64, net: i32, layer: i32) -> Segment {
        Segment::new(
            Seg::new(v(ax, ay), v(bx, by)),
            100,
            net,
            LayerRange::single(layer),
        )
    }

    fn pad(x: i64, y: i64, side: i64, net: i32, layer: i32) -> Solid {
        let h = side / 2;
        Solid::new(
            v(x, y),
            LineChain::closed([
                v(x - h, y - h),
                v(x + h, y - h),
                v(x + h, y + h),
                v(x - h, y + h),
            ]),
            net,
            LayerRange::single(layer),
        )
    }

    fn probe_line(points: &[(i64, i64)], net: i32) -> Line {
        Line::new(
            LineChain::from_points(points.iter().map(|&(x, y)| v(x, y))),
            100,
            LayerRange::single(0),
            net,
        )
    }

    /// Two pads on net 1 bridged by one segment, 200 units of clearance.
    fn pads_and_segment() -> (World, ItemId) {
        let mut w = World::new();
        w.set_rule_resolver(Some(Box::new(FixedClearance(200))));
        w.add_solid(pad(0, 0, 200, 1, 0));
        w.add_solid(pad(1000, 0, 200, 1, 0));
        let s = w.add_segment(seg_item(0, 0, 1000, 0, 1, 0), false).unwrap();
        (w, s)
    }

    fn visible(w: &World) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = w.visible_items().collect();
        items.sort();
        items
    }

    type JointSnap = (i64, i64, i32, i32, i32, bool, Vec<ItemId>);

    fn snapshot(w: &World) -> (Vec<ItemId>, Vec<JointSnap>) {
        let mut joints: Vec<JointSnap> = w
            .joints()
            .iter()
            .map(|j| {
                let mut links = j.links().to_vec();
                links.sort();
                (
                    j.pos().x,
                    j.pos().y,
                    j.net(),
                    j.layers().start(),
                    j.layers().end(),
                    j.is_locked(),
                    links,
                )
            })
            .collect();
        joints.sort();
        (visible(w), joints)
    }

    // Identity-free signature of an item, for comparing worlds built along
    // different revision histories.
    type ItemSig = (u8, i32, i32, i32, [i64; 5]);

    fn item_sig(item: &Item) -> ItemSig {
        let layers = item.layers();
        let geometry = match item {
            Item::Solid(s) => [s.pos().x, s.pos().y, 0, 0, 0],
            Item::Via(via) => [via.pos().x, via.pos().y, via.diameter(), 0, 0],
            Item::Segment(s) => [s.seg().a.x, s.seg().a.y, s.seg().b.x, s.seg().b.y, s.width()],
        };
        let kind = match item.kind() {
            Kind::Solid => 0,
            Kind::Via => 1,
            Kind::Segment => 2,
            Kind::Line => 3,
        };
        (kind, item.net(), layers.start(), layers.end(), geometry)
    }

    fn world_sig(w: &World) -> (Vec<ItemSig>, Vec<(i64, i64, i32, i32, i32, Vec<ItemSig>)>) {
        let mut items: Vec<ItemSig> = w
            .visible_items()
            .map(|id| item_sig(w.items().item(id)))
            .collect();
        items.sort();
        let mut joints: Vec<(i64, i64, i32, i32, i32, Vec<ItemSig>)> = w
            .joints()
            .iter()
            .map(|j| {
                let mut links: Vec<ItemSig> = j
                    .links()
                    .iter()
                    .map(|&id| item_sig(w.items().item(id)))
                    .collect();
                links.sort();
                (
                    j.pos().x,
                    j.pos().y,
                    j.net(),
                    j.layers().start(),
                    j.layers().end(),
                    links,
                )
            })
            .collect();
        joints.sort();
        (items, joints)
    }

    // Visible set recomputed from the revision algebra alone.
    fn expected_visible(w: &World) -> Vec<ItemId> {
        let tree = w.revisions();
        let mut chain = Vec::new();
        let mut cursor = Some(w.revision());
        while let Some(rev) = cursor {
            chain.push(rev);
            cursor = tree.parent(rev);
        }
        chain.reverse();
        let mut changes = ChangeSet::new();
        for rev in chain {
            changes.apply_revision(tree, rev);
        }
        let mut out = changes.added_items().to_vec();
        out.sort();
        out
    }

    #[test]
    fn nearest_obstacle_reports_the_blocking_segment() {
        let (w, s) = pads_and_segment();

        // Starts inside the hull: the obstacle is reported with infinite
        // distance because the line never crosses the hull boundary.
        let near = probe_line(&[(0, 50), (1000, 50)], 2);
        let hit = w.nearest_obstacle(&near, KindMask::SEGMENT, None).unwrap();
        assert_eq!(hit.item, s);
        assert_eq!(hit.dist_first, i64::MAX);

        let far = probe_line(&[(0, 500), (1000, 500)], 2);
        assert!(w.nearest_obstacle(&far, KindMask::SEGMENT, None).is_none());
    }

    #[test]
    fn nearest_obstacle_distances_run_along_the_line() {
        let (mut w, s) = pads_and_segment();
        let s2 = w
            .add_segment(seg_item(1500, 0, 1600, 0, 1, 0), false)
            .unwrap();

        // Hull inflation: width/2 + clearance + probe width/2 = 300.
        let line = probe_line(&[(-2000, 50), (2000, 50)], 2);
        let hit = w.nearest_obstacle(&line, KindMask::SEGMENT, None).unwrap();
        assert_eq!(hit.item, s, "the closer obstacle wins");
        assert_eq!(hit.ip_first, v(-300, 50));
        assert_eq!(hit.dist_first, 1700);
        assert_eq!(hit.ip_last, v(1900, 50), "last crossing over all obstacles");
        assert_eq!(hit.dist_last, 3900);

        // Restricting to the farther obstacle re-ranks it first.
        let only_s2: HashSet<ItemId> = [s2].into_iter().collect();
        let hit = w
            .nearest_obstacle(&line, KindMask::SEGMENT, Some(&only_s2))
            .unwrap();
        assert_eq!(hit.item, s2);
        assert_eq!(hit.dist_first, 3200);
    }

    #[test]
    fn speculative_via_reverts_cleanly() {
        let mut w = World::new();
        let root = w.revision();
        w.branch_move();

        let via = w.add_via(Via::new(v(500, 0), 400, 2, LayerRange::new(0, 1)));
        let joint = w.find_joint(v(500, 0), 0, 2).unwrap();
        assert_eq!(joint.links(), [via]);

        w.revert();
        assert_eq!(w.revision(), root);
        assert!(w.find_joint(v(500, 0), 0, 2).is_none());
        assert!(!w.items().is_alive(via), "reverting destroys the via");
    }

    #[test]
    fn assemble_line_walks_both_directions() {
        let mut w = World::new();
        let a = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        let b = w.add_segment(seg_item(100, 0, 200, 0, 1, 0), false).unwrap();
        let c = w.add_segment(seg_item(200, 0, 300, 0, 1, 0), false).unwrap();

        let line = w.assemble_line(b, false);
        assert_eq!(
            line.points(),
            [v(0, 0), v(100, 0), v(200, 0), v(300, 0)]
        );
        assert_eq!(line.links(), [a, b, c]);
        assert_eq!(line.links().iter().position(|&id| id == b), Some(1));
        assert_eq!(line.owner(), Some(w.revision()));
    }

    #[test]
    fn checkout_switches_between_branches() {
        let mut w = World::new();
        let root = w.revision();

        w.branch_move();
        let b1 = w.revision();
        let x = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();

        w.checkout_revision(root);
        w.branch_move();
        let b2 = w.revision();
        let y = w
            .add_segment(seg_item(0, 100, 100, 100, 1, 0), false)
            .unwrap();

        w.checkout_revision(b1);
        assert_eq!(visible(&w), [x]);
        assert_eq!(expected_visible(&w), [x]);

        w.checkout_revision(b2);
        assert_eq!(visible(&w), [y]);
        assert_eq!(expected_visible(&w), [y]);

        w.checkout_revision(root);
        assert!(visible(&w).is_empty());
        assert!(expected_visible(&w).is_empty());
    }

    #[test]
    fn checkout_round_trip_restores_state() {
        let mut w = World::new();
        let root = w.revision();
        w.branch_move();
        let b1 = w.revision();
        w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        w.add_via(Via::new(v(100, 0), 400, 1, LayerRange::new(0, 3)));

        w.checkout_revision(root);
        w.branch_move();
        let b2 = w.revision();
        w.add_segment(seg_item(0, 100, 100, 100, 2, 0), false).unwrap();

        w.checkout_revision(b1);
        let before = snapshot(&w);
        w.checkout_revision(b2);
        w.checkout_revision(b1);
        assert_eq!(snapshot(&w), before, "state restored exactly");
    }

    #[test]
    fn replace_keeps_a_single_segment() {
        let (mut w, s) = pads_and_segment();
        let s2 = w
            .replace(s, Item::Segment(seg_item(0, 0, 1000, 0, 1, 0)))
            .unwrap();
        assert!(!w.items().is_alive(s));

        let segments: Vec<ItemId> = w
            .visible_items()
            .filter(|&id| matches!(w.items().item(id), Item::Segment(_)))
            .collect();
        assert_eq!(segments, [s2]);

        for pos in [v(0, 0), v(1000, 0)] {
            let joint = w.find_joint(pos, 0, 1).unwrap();
            let non_pad: Vec<ItemId> = joint
                .links()
                .iter()
                .copied()
                .filter(|&id| !matches!(w.items().item(id), Item::Solid(_)))
                .collect();
            assert_eq!(non_pad, [s2], "one non-pad link at {pos:?}");
        }
    }

    #[test]
    fn check_colliding_finds_a_via_in_the_path() {
        let mut w = World::new();
        w.set_rule_resolver(Some(Box::new(FixedClearance(0))));
        let line = probe_line(&[(0, 0), (1000, 0)], 1);

        assert!(w.check_colliding(&Probe::Line(&line), KindMask::VIA).is_none());

        // A segment in the way is ignored by the kind mask.
        w.add_segment(seg_item(0, 100, 1000, 100, 3, 0), false).unwrap();
        let via = w.add_via(Via::new(v(500, 100), 200, 2, LayerRange::new(0, 1)));

        let hit = w
            .check_colliding(&Probe::Line(&line), KindMask::VIA)
            .unwrap();
        assert_eq!(hit.item, via);
    }

    #[test]
    fn via_removal_refragments_joints() {
        let mut w = World::new();
        let p = v(500, 500);
        let top = w
            .add_segment(
                Segment::new(Seg::new(p, v(1000, 500)), 100, 1, LayerRange::single(0)),
                false,
            )
            .unwrap();
        let bottom = w
            .add_segment(
                Segment::new(Seg::new(p, v(0, 500)), 100, 1, LayerRange::single(3)),
                false,
            )
            .unwrap();
        let via = w.add_via(Via::new(p, 400, 1, LayerRange::new(0, 3)));

        let unified = w.find_joint(p, 1, 1).unwrap();
        assert_eq!(unified.layers(), LayerRange::new(0, 3));
        assert_eq!(unified.link_count(), 3);

        w.remove(via);
        let top_joint = w.find_joint(p, 0, 1).unwrap();
        assert_eq!(top_joint.links(), [top]);
        assert_eq!(top_joint.layers(), LayerRange::single(0));
        let bottom_joint = w.find_joint(p, 3, 1).unwrap();
        assert_eq!(bottom_joint.links(), [bottom]);
        assert_eq!(bottom_joint.layers(), LayerRange::single(3));
        assert!(w.find_joint(p, 1, 1).is_none(), "the bridge is gone");
    }

    #[test]
    fn revert_restores_indices_exactly() {
        let (mut w, s) = pads_and_segment();
        let before = snapshot(&w);

        w.branch_move();
        w.add_via(Via::new(v(500, 0), 400, 1, LayerRange::new(0, 3)));
        w.add_segment(seg_item(500, 0, 500, 400, 1, 0), false).unwrap();
        w.remove(s);
        assert_ne!(snapshot(&w), before);

        w.revert();
        assert_eq!(snapshot(&w), before);
    }

    #[test]
    fn squash_chain_matches_direct_edits() {
        let mut direct = World::new();
        let doomed = direct
            .add_segment(seg_item(0, 0, 1000, 0, 1, 0), false)
            .unwrap();
        direct.add_segment(seg_item(0, 200, 1000, 200, 1, 0), false).unwrap();
        direct.remove(doomed);
        direct.add_via(Via::new(v(0, 200), 400, 1, LayerRange::new(0, 3)));

        let mut branched = World::new();
        let root = branched.revision();
        let doomed = branched
            .add_segment(seg_item(0, 0, 1000, 0, 1, 0), false)
            .unwrap();
        branched.branch_move();
        branched
            .add_segment(seg_item(0, 200, 1000, 200, 1, 0), false)
            .unwrap();
        branched.branch_move();
        branched.remove(doomed);
        branched.add_via(Via::new(v(0, 200), 400, 1, LayerRange::new(0, 3)));
        branched.squash_to_revision(root);

        assert_eq!(branched.revision(), root);
        assert_eq!(world_sig(&branched), world_sig(&direct));
        assert_eq!(visible(&branched), expected_visible(&branched));
    }

    #[test]
    fn assemble_line_closes_loops() {
        let mut w = World::new();
        let s1 = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        let s2 = w.add_segment(seg_item(100, 0, 100, 100, 1, 0), false).unwrap();
        let s3 = w.add_segment(seg_item(100, 100, 0, 100, 1, 0), false).unwrap();
        let s4 = w.add_segment(seg_item(0, 100, 0, 0, 1, 0), false).unwrap();

        let line = w.assemble_line(s1, false);
        assert_eq!(line.points().len(), 5, "closing vertex repeats the start");
        assert_eq!(line.points().first(), line.points().last());

        let mut links = line.links().to_vec();
        links.sort();
        let mut expected = vec![s1, s2, s3, s4];
        expected.sort();
        assert_eq!(links, expected, "each loop segment linked exactly once");
    }

    #[test]
    fn zero_length_and_redundant_segments_are_skipped() {
        let mut w = World::new();
        assert!(w.add_segment(seg_item(5, 5, 5, 5, 1, 0), false).is_none());

        let first = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        assert!(w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).is_none());
        // Reversed endpoints are just as redundant.
        assert!(w.add_segment(seg_item(100, 0, 0, 0, 1, 0), false).is_none());
        // Another net is not redundant.
        assert!(w.add_segment(seg_item(0, 0, 100, 0, 2, 0), false).is_some());
        // Explicitly allowed duplicates insert.
        assert!(w.add_segment(seg_item(0, 0, 100, 0, 1, 0), true).is_some());

        assert!(w.items().is_alive(first));
    }

    #[test]
    fn add_line_binds_existing_segments() {
        let mut w = World::new();
        let existing = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();

        let mut line = probe_line(&[(0, 0), (100, 0), (200, 0)], 1);
        w.add_line(&mut line, false);

        assert_eq!(line.links().len(), 2);
        assert_eq!(line.links()[0], existing, "first span binds the old segment");
        assert_eq!(line.owner(), Some(w.revision()));
        assert_eq!(visible(&w).len(), 2);

        // Removing the line removes both segments.
        w.remove_line(&mut line);
        assert!(visible(&w).is_empty());
        assert!(!line.is_linked());
        assert_eq!(line.owner(), None);
    }

    #[test]
    fn hit_test_is_shape_exact() {
        let (mut w, s) = pads_and_segment();
        let mut at_origin = w.hit_test(v(0, 0));
        at_origin.sort();
        assert_eq!(at_origin.len(), 2, "pad and segment meet at the origin");

        assert_eq!(w.hit_test(v(500, 0)), [s]);
        assert!(w.hit_test(v(500, 51)).is_empty(), "off the half-width");
        assert!(w.hit_test(v(5000, 5000)).is_empty());

        w.remove(s);
        assert!(w.hit_test(v(500, 0)).is_empty());
    }

    #[test]
    fn markers_and_ranks_round_trip() {
        let mut w = World::new();
        let s1 = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        let s2 = w.add_segment(seg_item(0, 100, 100, 100, 1, 0), false).unwrap();
        let s3 = w.add_segment(seg_item(0, 200, 100, 200, 1, 0), false).unwrap();

        w.set_marker(s1, 0b01);
        w.set_marker(s2, 0b11);
        w.set_rank(s1, 7);

        let mut marked = w.find_by_marker(0b01);
        marked.sort();
        assert_eq!(marked, [s1, s2]);

        w.clear_ranks(0b01);
        assert_eq!(w.items().item(s1).rank(), -1);
        assert_eq!(w.items().item(s1).marker(), 0);
        assert_eq!(w.items().item(s2).marker(), 0b10);

        w.remove_by_marker(0b10);
        assert_eq!(visible(&w), {
            let mut rest = vec![s1, s3];
            rest.sort();
            rest
        });
        assert!(!w.items().is_alive(s2));
    }

    #[test]
    fn find_item_by_parent_scans_the_net() {
        let mut w = World::new();
        let s = w.add_segment(seg_item(0, 0, 100, 0, 5, 0), false).unwrap();
        w.add_segment(seg_item(0, 100, 100, 100, 5, 0), false).unwrap();
        w.set_parent(s, Some(ParentRef(42)));

        assert_eq!(w.find_item_by_parent(5, ParentRef(42)), Some(s));
        assert_eq!(w.find_item_by_parent(5, ParentRef(43)), None);
        assert_eq!(w.find_item_by_parent(6, ParentRef(42)), None);
    }

    #[test]
    fn find_lines_between_joints_clips_to_span() {
        let mut w = World::new();
        let s1 = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        let s2 = w.add_segment(seg_item(100, 0, 200, 0, 1, 0), false).unwrap();
        w.add_segment(seg_item(200, 0, 300, 0, 1, 0), false).unwrap();

        let a = w.find_joint(v(0, 0), 0, 1).unwrap();
        let b = w.find_joint(v(200, 0), 0, 1).unwrap();
        let lines = w.find_lines_between_joints(a, b);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].points(), [v(0, 0), v(100, 0), v(200, 0)]);
        assert_eq!(lines[0].links(), [s1, s2]);
    }

    #[test]
    fn locked_joints_stop_assembly() {
        let mut w = World::new();
        let s1 = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        w.add_segment(seg_item(100, 0, 200, 0, 1, 0), false).unwrap();
        w.lock_joint(v(100, 0), s1, true);

        let stopped = w.assemble_line(s1, true);
        assert_eq!(stopped.points(), [v(0, 0), v(100, 0)]);
        assert_eq!(stopped.links(), [s1]);

        let full = w.assemble_line(s1, false);
        assert_eq!(full.points().len(), 3, "lock ignored unless requested");
    }

    #[test]
    fn pairwise_checks_respect_forced_clearance() {
        let mut w = World::new();
        w.set_rule_resolver(Some(Box::new(FixedClearance(150))));
        let a = Item::Segment(seg_item(0, 0, 1000, 0, 1, 0));
        let b = Item::Segment(seg_item(0, 200, 1000, 200, 2, 0));

        // Gap between edges is 100.
        assert!(!w.check_colliding_items(&Probe::Item(&a), &Probe::Item(&b), Some(99)));
        assert!(w.check_colliding_items(&Probe::Item(&a), &Probe::Item(&b), Some(100)));
        // Resolver says 150, which reaches.
        assert!(w.check_colliding_items(&Probe::Item(&a), &Probe::Item(&b), None));

        // Line probes add their half-width on top of the resolved value.
        let line = probe_line(&[(0, 300), (1000, 300)], 3);
        assert!(w.check_colliding_items(&Probe::Item(&a), &Probe::Line(&line), None));
        assert!(!w.check_colliding_items(&Probe::Item(&a), &Probe::Line(&line), Some(100)));
    }

    #[test]
    fn query_colliding_filters_kinds_nets_and_limits() {
        let mut w = World::new();
        w.set_rule_resolver(Some(Box::new(FixedClearance(100))));
        w.add_segment(seg_item(0, 0, 1000, 0, 1, 0), false).unwrap();
        w.add_segment(seg_item(0, 100, 1000, 100, 1, 0), false).unwrap();

        let probe = Item::Segment(seg_item(0, 50, 1000, 50, 1, 0));
        let hits = w.query_colliding(&Probe::Item(&probe), &CollisionFilter::default());
        assert_eq!(hits.len(), 2);

        let limited = w.query_colliding(
            &Probe::Item(&probe),
            &CollisionFilter {
                limit: Some(1),
                ..CollisionFilter::default()
            },
        );
        assert_eq!(limited.len(), 1);

        let other_nets = w.query_colliding(
            &Probe::Item(&probe),
            &CollisionFilter {
                different_nets_only: true,
                ..CollisionFilter::default()
            },
        );
        assert!(other_nets.is_empty(), "probe shares the net");

        let vias_only = w.query_colliding(
            &Probe::Item(&probe),
            &CollisionFilter::of_kind(KindMask::VIA),
        );
        assert!(vias_only.is_empty());
    }

    #[test]
    fn world_clear_empties_indices() {
        let (mut w, _) = pads_and_segment();
        let rev = w.revision();
        w.clear();
        assert!(visible(&w).is_empty());
        assert!(w.joints().is_empty());
        assert!(w.items().is_empty(), "root-owned items are destroyed");
        assert_eq!(w.revision(), rev);
        assert_eq!(w.revisions().num_changes(rev), 0);
    }

    #[test]
    fn revision_changes_reflect_the_current_revision() {
        let mut w = World::new();
        let s = w.add_segment(seg_item(0, 0, 100, 0, 1, 0), false).unwrap();
        w.branch_move();
        let t = w.add_segment(seg_item(100, 0, 200, 0, 1, 0), false).unwrap();
        w.remove(s);

        let changes = w.revision_changes();
        assert_eq!(changes.added_items(), [t]);
        assert_eq!(changes.removed_items(), [s]);
    }
}
