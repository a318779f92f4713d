// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copperline Index: a clearance-envelope AABB index keyed by caller payloads.
//!
//! This is the spatial lookup layer of the router world model. It stores
//! copyable payloads (item handles) under their axis-aligned bounding boxes
//! and answers one question fast: *which stored items could come within a
//! given clearance of this probe box?*
//!
//! - [`SpatialIndex::add`] / [`SpatialIndex::remove`] key payloads by their
//!   bounding box; the caller re-derives the box from its immutable shape.
//! - [`SpatialIndex::query`] visits every payload whose box intersects the
//!   probe box inflated by a clearance envelope. The visitor returns `false`
//!   to stop early. Visit order is unspecified; false positives are expected
//!   and filtered by the visitor.
//! - Per-net sublists ([`SpatialIndex::items_for_net`]) support
//!   connectivity-wide scans without touching the tree.
//!
//! The R-tree underneath is the [`rstar`] crate; this crate only adds the
//! envelope convention, net bookkeeping, and the visitor protocol.
//!
//! # Example
//!
//! ```rust
//! use copperline_geom::{Rect, Vec2};
//! use copperline_index::SpatialIndex;
//!
//! let mut idx: SpatialIndex<u32> = SpatialIndex::new();
//! idx.add(1, Rect::new(Vec2::new(0, 0), Vec2::new(100, 100)), 7);
//! idx.add(2, Rect::new(Vec2::new(500, 0), Vec2::new(600, 100)), 7);
//!
//! let mut hits = Vec::new();
//! idx.query(Rect::from_point(Vec2::new(400, 50)), 150, |p| {
//!     hits.push(p);
//!     true
//! });
//! assert_eq!(hits, [2]);
//! assert_eq!(idx.items_for_net(7).len(), 2);
//! ```

pub mod index;

pub use index::SpatialIndex;
