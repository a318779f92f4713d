// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line views: maximal chains of wire segments, reconstructed on demand.
//!
//! A line is never owned by a revision and never enters the spatial index;
//! it borrows identity from the segments it links. Its owner field only
//! tracks which revision the view was assembled against.

use copperline_geom::{LineChain, Rect, Seg, Vec2};

use crate::arena::ItemId;
use crate::item::{ItemMeta, Kind, LayerRange, Via};
use crate::revision::RevisionId;

/// A transient polyline over linked wire segments, optionally terminated by
/// a via.
#[derive(Clone, Debug)]
pub struct Line {
    chain: LineChain,
    width: i64,
    layers: LayerRange,
    net: i32,
    links: Vec<ItemId>,
    via: Option<Via>,
    owner: Option<RevisionId>,
}

impl Line {
    /// Create a line view over a chain of vertices.
    pub fn new(chain: LineChain, width: i64, layers: LayerRange, net: i32) -> Self {
        Self {
            chain,
            width,
            layers,
            net,
            links: Vec::new(),
            via: None,
            owner: None,
        }
    }

    /// The vertex chain.
    pub fn chain(&self) -> &LineChain {
        &self.chain
    }

    /// The vertices.
    pub fn points(&self) -> &[Vec2] {
        self.chain.points()
    }

    /// Trace width.
    pub fn width(&self) -> i64 {
        self.width
    }

    /// Layer span.
    pub fn layers(&self) -> LayerRange {
        self.layers
    }

    /// Net id.
    pub fn net(&self) -> i32 {
        self.net
    }

    /// Number of centerline segments.
    pub fn segment_count(&self) -> usize {
        self.chain.segment_count()
    }

    /// The `i`-th centerline segment.
    pub fn segment(&self, i: usize) -> Seg {
        self.chain.segment(i)
    }

    /// Total centerline length.
    pub fn length(&self) -> i64 {
        self.chain.length()
    }

    /// Append a vertex to the chain.
    pub fn push_point(&mut self, p: Vec2) {
        self.chain.append(p);
    }

    /// The linked segment items, in chain order.
    pub fn links(&self) -> &[ItemId] {
        &self.links
    }

    /// Whether the view is bound to any world segments.
    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    /// Bind a world segment to this view.
    pub fn link_segment(&mut self, id: ItemId) {
        self.links.push(id);
    }

    pub(crate) fn clear_links(&mut self) {
        self.links.clear();
    }

    /// The revision this view was assembled against or added to.
    pub fn owner(&self) -> Option<RevisionId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<RevisionId>) {
        self.owner = owner;
    }

    /// The terminating via, if the line ends with one.
    pub fn via(&self) -> Option<&Via> {
        self.via.as_ref()
    }

    /// Whether the line ends with a via.
    pub fn ends_with_via(&self) -> bool {
        self.via.is_some()
    }

    /// Attach a terminating via (carried by value, like the vertices).
    pub fn set_via(&mut self, via: Via) {
        self.via = Some(via);
    }

    /// Detach the terminating via.
    pub fn clear_via(&mut self) {
        self.via = None;
    }

    /// Restrict the view to the vertex range `[start, end]`, clipping the
    /// linked segment list along with it when fully linked.
    pub fn clip_vertex_range(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end < self.chain.vertex_count());
        if self.links.len() + 1 == self.chain.vertex_count() {
            self.links.truncate(end);
            self.links.drain(..start);
        }
        let points: Vec<Vec2> = self.points()[start..=end].to_vec();
        self.chain = LineChain::from_points(points);
    }

    /// The attribute view for clearance resolution.
    pub fn meta(&self) -> ItemMeta {
        ItemMeta {
            kind: Kind::Line,
            net: self.net,
            layers: self.layers,
            width: self.width,
        }
    }

    /// Bounding box of the chain (and terminating via), including width.
    pub fn bbox(&self) -> Rect {
        let mut bbox = self.chain.bbox().inflate(self.width / 2);
        if let Some(via) = &self.via {
            bbox = bbox.union(&Rect::from_point(via.pos()).inflate(via.diameter() / 2));
        }
        bbox
    }
}
