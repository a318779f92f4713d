// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copperline World: the spatial world model of a push-and-shove PCB router.
//!
//! The world represents routed objects (pads, vias, wire segments) as a
//! mutable, branchable, revisionable graph and answers clearance-aware
//! collision and connectivity queries against it at interactive latency.
//!
//! Four tightly coupled subsystems share one item population:
//!
//! - a **spatial index** ([`copperline_index`]) answering
//!   clearance-envelope collision queries;
//! - a **joint map** ([`joint`]) tracking which items meet at which vertex,
//!   merging and splitting as layer spans overlap;
//! - a **revision tree** ([`revision`]) owning every item ever inserted and
//!   supporting branch/squash/revert/checkout over speculative edits;
//! - an **assembly** step ([`World::assemble_line`]) reconstructing maximal
//!   segment chains between junctions on demand.
//!
//! The [`World`] facade binds them behind one mutation and query surface.
//! Routing heuristics, file I/O, UI, and rule configuration live elsewhere;
//! clearance rules enter through the [`RuleResolver`] trait.
//!
//! # Example
//!
//! ```rust
//! use copperline_geom::{Seg, Vec2};
//! use copperline_world::{KindMask, LayerRange, Probe, Segment, World};
//!
//! let mut world = World::new();
//! let layer = LayerRange::single(0);
//!
//! let seg = world
//!     .add_segment(
//!         Segment::new(Seg::new(Vec2::new(0, 0), Vec2::new(1000, 0)), 100, 1, layer),
//!         false,
//!     )
//!     .unwrap();
//!
//! // Speculative edit: branch, remove, then throw the branch away.
//! let before = world.branch_move();
//! world.remove(seg);
//! assert!(world.hit_test(Vec2::new(500, 0)).is_empty());
//! world.revert();
//!
//! assert_eq!(world.revision(), before);
//! assert_eq!(world.hit_test(Vec2::new(500, 0)), [seg]);
//!
//! // Collision query against a transient probe.
//! let probe = Segment::new(Seg::new(Vec2::new(0, 100), Vec2::new(1000, 100)), 100, 2, layer);
//! let probe = copperline_world::Item::Segment(probe);
//! assert!(world.check_colliding(&Probe::Item(&probe), KindMask::SEGMENT).is_some());
//! ```

pub mod arena;
pub mod item;
pub mod joint;
pub mod line;
pub mod revision;
pub mod world;

pub use arena::{ItemArena, ItemId};
pub use item::{
    Item, ItemData, ItemMeta, Kind, KindMask, LayerRange, NET_UNASSIGNED, ParentRef, Segment,
    Solid, Via,
};
pub use joint::{Joint, JointMap, JointTag};
pub use line::Line;
pub use revision::{ChangeSet, RevisionId, RevisionPath, RevisionTree};
pub use world::{
    CollisionFilter, NearestObstacle, Obstacle, ObstacleVisitor, Probe, RuleResolver, World,
    WorldConfig,
};
