// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Polyline (line chain) with arc-length queries.

use alloc::vec::Vec;

use crate::rect::Rect;
use crate::seg::Seg;
use crate::vector::Vec2;

/// An open or closed chain of line segments.
///
/// A closed chain has an implicit segment from the last vertex back to the
/// first; hulls are closed chains, routed paths are open ones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineChain {
    points: Vec<Vec2>,
    closed: bool,
}

impl LineChain {
    /// Create an empty open chain.
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            closed: false,
        }
    }

    /// Create an open chain from vertices (consecutive duplicates collapsed).
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut chain = Self::new();
        for p in points {
            chain.append(p);
        }
        chain
    }

    /// Create a closed chain from vertices (consecutive duplicates
    /// collapsed; a final vertex repeating the first is dropped, the closing
    /// segment being implicit).
    pub fn closed(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut chain = Self::from_points(points);
        if chain.points.len() > 1 && chain.points.first() == chain.points.last() {
            chain.points.pop();
        }
        chain.closed = true;
        chain
    }

    /// Whether the chain is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The vertices.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Vertex count.
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Append a vertex, collapsing consecutive duplicates.
    pub fn append(&mut self, p: Vec2) {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    /// Number of segments (a closed chain wraps around).
    pub fn segment_count(&self) -> usize {
        match (self.closed, self.points.len()) {
            (_, 0 | 1) => 0,
            (false, n) => n - 1,
            (true, n) => n,
        }
    }

    /// The `i`-th segment; for a closed chain, index `n - 1` is the closing
    /// segment back to the first vertex.
    pub fn segment(&self, i: usize) -> Seg {
        let n = self.points.len();
        debug_assert!(i < self.segment_count(), "segment index out of range");
        Seg::new(self.points[i], self.points[(i + 1) % n])
    }

    /// Iterate the segments in order.
    pub fn segments(&self) -> impl Iterator<Item = Seg> + '_ {
        (0..self.segment_count()).map(|i| self.segment(i))
    }

    /// Total arc length.
    pub fn length(&self) -> i64 {
        self.segments().map(|s| s.length()).sum()
    }

    /// Arc length from the start of the chain to `p`, which must lie on the
    /// chain (within one unit of rounding). `None` when it does not.
    pub fn path_length(&self, p: Vec2) -> Option<i64> {
        let mut acc = 0;
        for s in self.segments() {
            if s.contains(p) {
                return Some(acc + (p - s.a).length());
            }
            acc += s.length();
        }
        None
    }

    /// Index of the vertex equal to `p`, if any.
    pub fn find(&self, p: Vec2) -> Option<usize> {
        self.points.iter().position(|&q| q == p)
    }

    /// Append every intersection point between the two chains to `out`.
    pub fn intersect_into(&self, other: &LineChain, out: &mut Vec<Vec2>) {
        for s in self.segments() {
            for t in other.segments() {
                s.intersect_into(&t, out);
            }
        }
    }

    /// Bounding box of the vertices.
    pub fn bbox(&self) -> Rect {
        Rect::from_points(&self.points)
    }
}
