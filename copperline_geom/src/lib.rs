// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copperline Geom: integer 2D geometry for board-space computations.
//!
//! All coordinates are integers (nominally micrometers). Lengths and
//! distances are Euclidean, rounded towards zero; intermediate products are
//! computed in widened accumulators (`i128`) so that board-scale coordinates
//! never overflow.
//!
//! - [`Vec2`], [`Rect`], [`Seg`], [`Circle`]: the primitive types.
//! - [`Shape`]: a tagged union of circle / thick segment / polygon with
//!   clearance-aware pairwise collision tests.
//! - [`LineChain`]: an open or closed polyline with arc-length queries and
//!   chain-chain intersection.
//! - [`hull`]: octagonal outlines that expand a shape by a clearance amount,
//!   reducing clearance-aware tests to plain polygon intersection.
//!
//! It does not depend on any external geometry crate; higher layers decide
//! what the coordinates mean.
//!
//! # Example
//!
//! ```rust
//! use copperline_geom::{Seg, Shape, Vec2};
//!
//! let a = Shape::segment(Seg::new(Vec2::new(0, 0), Vec2::new(1000, 0)), 100);
//! let b = Shape::circle(Vec2::new(500, 300), 50);
//!
//! assert!(a.collides_with(&b, 200));
//! assert!(!a.collides_with(&b, 50));
//! ```

#![no_std]

extern crate alloc;

pub mod chain;
pub mod hull;
pub mod rect;
pub mod seg;
pub mod shape;
pub mod vector;

pub use chain::LineChain;
pub use hull::{circle_hull, convex_hull, octagonal_hull, segment_hull};
pub use rect::Rect;
pub use seg::Seg;
pub use shape::{Circle, Shape, edge_distance, polygon_contains};
pub use vector::Vec2;
