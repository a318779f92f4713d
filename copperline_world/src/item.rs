// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The item model: solids, vias and wire segments, plus the shared
//! attributes every routed object carries.

use copperline_geom::{LineChain, Rect, Seg, Shape, Vec2, circle_hull, octagonal_hull, segment_hull};

use crate::revision::RevisionId;

/// Net id used for items that have no net assigned yet.
pub const NET_UNASSIGNED: i32 = -1;

bitflags::bitflags! {
    /// Item-kind filter mask for collision and search queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KindMask: u8 {
        /// Solid pads and other immovable copper.
        const SOLID   = 0b0000_0001;
        /// Vias.
        const VIA     = 0b0000_0010;
        /// Wire segments.
        const SEGMENT = 0b0000_0100;
        /// Assembled line views.
        const LINE    = 0b0000_1000;
    }
}

impl KindMask {
    /// Every kind.
    pub const ANY: Self = Self::all();
}

/// The kind of a routed object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A solid pad.
    Solid,
    /// A via.
    Via,
    /// A wire segment.
    Segment,
    /// A transient assembled line (never owned by a revision).
    Line,
}

impl Kind {
    /// The mask bit for this kind.
    pub fn mask(self) -> KindMask {
        match self {
            Self::Solid => KindMask::SOLID,
            Self::Via => KindMask::VIA,
            Self::Segment => KindMask::SEGMENT,
            Self::Line => KindMask::LINE,
        }
    }
}

/// Closed integer interval of board layers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerRange {
    start: i32,
    end: i32,
}

impl LayerRange {
    /// Range covering both layers (order-insensitive).
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Range covering a single layer.
    pub const fn single(layer: i32) -> Self {
        Self {
            start: layer,
            end: layer,
        }
    }

    /// First layer of the range.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last layer of the range.
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Whether the layer lies within the range.
    pub fn contains(&self, layer: i32) -> bool {
        self.start <= layer && layer <= self.end
    }

    /// Whether the ranges share at least one layer.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest range covering both ranges.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether the range spans more than one layer.
    pub fn is_multilayer(&self) -> bool {
        self.start != self.end
    }
}

/// Opaque, equality-comparable reference into the host board model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParentRef(pub u64);

/// Attributes shared by every owned item.
///
/// Shape, net, layers and width are immutable once the item is inserted;
/// marker and rank are scratch state for router passes and carry no meaning
/// here.
#[derive(Clone, Debug)]
pub struct ItemData {
    /// Net id, or [`NET_UNASSIGNED`].
    pub net: i32,
    /// Layer span.
    pub layers: LayerRange,
    /// Router-pass marker bits.
    pub marker: u32,
    /// Router-pass rank; `-1` when unranked.
    pub rank: i32,
    /// The revision whose added-list owns this item.
    pub owner: Option<RevisionId>,
    /// Back-pointer into the host board model.
    pub parent: Option<ParentRef>,
}

impl ItemData {
    fn new(net: i32, layers: LayerRange) -> Self {
        Self {
            net,
            layers,
            marker: 0,
            rank: -1,
            owner: None,
            parent: None,
        }
    }
}

/// A solid pad: a fixed polygon outline.
#[derive(Clone, Debug)]
pub struct Solid {
    data: ItemData,
    pos: Vec2,
    outline: LineChain,
}

impl Solid {
    /// Create a pad at `pos` with a closed polygon `outline`.
    pub fn new(pos: Vec2, outline: LineChain, net: i32, layers: LayerRange) -> Self {
        debug_assert!(outline.is_closed(), "pad outlines are closed chains");
        Self {
            data: ItemData::new(net, layers),
            pos,
            outline,
        }
    }

    /// Anchor position (the joint location).
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    /// The pad outline.
    pub fn outline(&self) -> &LineChain {
        &self.outline
    }
}

/// A via: a drilled barrel connecting a span of layers.
#[derive(Clone, Debug)]
pub struct Via {
    data: ItemData,
    pos: Vec2,
    diameter: i64,
}

impl Via {
    /// Create a via at `pos` with the given pad `diameter`.
    pub fn new(pos: Vec2, diameter: i64, net: i32, layers: LayerRange) -> Self {
        Self {
            data: ItemData::new(net, layers),
            pos,
            diameter,
        }
    }

    /// Center position.
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    /// Pad diameter.
    pub fn diameter(&self) -> i64 {
        self.diameter
    }

    /// Net id.
    pub fn net(&self) -> i32 {
        self.data.net
    }

    /// Layer span.
    pub fn layers(&self) -> LayerRange {
        self.data.layers
    }

    pub(crate) fn shape(&self) -> Shape {
        Shape::circle(self.pos, self.diameter / 2)
    }

    /// Octagonal outline inflated by `clearance` plus half the walkaround
    /// width.
    pub fn hull(&self, clearance: i64, walkaround_width: i64) -> LineChain {
        circle_hull(self.pos, self.diameter / 2, clearance + walkaround_width / 2)
    }
}

/// A wire segment with a round pen width.
#[derive(Clone, Debug)]
pub struct Segment {
    data: ItemData,
    seg: Seg,
    width: i64,
}

impl Segment {
    /// Create a segment over `seg` with the given trace `width`.
    pub fn new(seg: Seg, width: i64, net: i32, layers: LayerRange) -> Self {
        Self {
            data: ItemData::new(net, layers),
            seg,
            width,
        }
    }

    /// The centerline.
    pub fn seg(&self) -> Seg {
        self.seg
    }

    /// Trace width.
    pub fn width(&self) -> i64 {
        self.width
    }

    /// Net id.
    pub fn net(&self) -> i32 {
        self.data.net
    }

    /// Layer span.
    pub fn layers(&self) -> LayerRange {
        self.data.layers
    }
}

/// An owned routed object.
///
/// Line views are deliberately absent: they are transient compositions of
/// segments and can never enter a revision or the spatial index.
#[derive(Clone, Debug)]
pub enum Item {
    /// A solid pad.
    Solid(Solid),
    /// A via.
    Via(Via),
    /// A wire segment.
    Segment(Segment),
}

/// The attribute view handed to rule resolvers and clearance computations.
#[derive(Copy, Clone, Debug)]
pub struct ItemMeta {
    /// Item kind.
    pub kind: Kind,
    /// Net id.
    pub net: i32,
    /// Layer span.
    pub layers: LayerRange,
    /// Conductor width (trace width, via diameter, zero for pads).
    pub width: i64,
}

impl Item {
    /// The item's kind tag.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Solid(_) => Kind::Solid,
            Self::Via(_) => Kind::Via,
            Self::Segment(_) => Kind::Segment,
        }
    }

    /// Whether the item's kind is in the mask.
    pub fn of_kind(&self, mask: KindMask) -> bool {
        mask.contains(self.kind().mask())
    }

    /// Shared attributes.
    pub fn data(&self) -> &ItemData {
        match self {
            Self::Solid(s) => &s.data,
            Self::Via(v) => &v.data,
            Self::Segment(s) => &s.data,
        }
    }

    /// Shared attributes, mutably.
    pub fn data_mut(&mut self) -> &mut ItemData {
        match self {
            Self::Solid(s) => &mut s.data,
            Self::Via(v) => &mut v.data,
            Self::Segment(s) => &mut s.data,
        }
    }

    /// Net id.
    pub fn net(&self) -> i32 {
        self.data().net
    }

    /// Layer span.
    pub fn layers(&self) -> LayerRange {
        self.data().layers
    }

    /// Router-pass marker bits.
    pub fn marker(&self) -> u32 {
        self.data().marker
    }

    /// Router-pass rank.
    pub fn rank(&self) -> i32 {
        self.data().rank
    }

    /// The revision owning this item, if inserted.
    pub fn owner(&self) -> Option<RevisionId> {
        self.data().owner
    }

    /// Host board back-pointer.
    pub fn parent(&self) -> Option<ParentRef> {
        self.data().parent
    }

    /// Conductor width: trace width, via diameter, zero for pads.
    pub fn width(&self) -> i64 {
        match self {
            Self::Solid(_) => 0,
            Self::Via(v) => v.diameter,
            Self::Segment(s) => s.width,
        }
    }

    /// The geometric footprint.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Solid(s) => Shape::polygon(s.outline.clone()),
            Self::Via(v) => v.shape(),
            Self::Segment(s) => Shape::segment(s.seg, s.width),
        }
    }

    /// Bounding box, including conductor thickness.
    pub fn bbox(&self) -> Rect {
        match self {
            Self::Solid(s) => s.outline.bbox(),
            Self::Via(v) => Rect::from_point(v.pos).inflate(v.diameter / 2),
            Self::Segment(s) => s.seg.bbox().inflate(s.width / 2),
        }
    }

    /// The attribute view for clearance resolution.
    pub fn meta(&self) -> ItemMeta {
        ItemMeta {
            kind: self.kind(),
            net: self.net(),
            layers: self.layers(),
            width: self.width(),
        }
    }

    /// Clearance-aware collision against another item.
    ///
    /// Items on disjoint layers never collide; with `different_nets_only`
    /// set, items on the same net never collide.
    pub fn collides(&self, other: &Item, clearance: i64, different_nets_only: bool) -> bool {
        if different_nets_only && self.net() == other.net() {
            return false;
        }
        if !self.layers().overlaps(&other.layers()) {
            return false;
        }
        self.shape().collides_with(&other.shape(), clearance)
    }

    /// Octagonal hull inflated by `clearance` plus half the walkaround
    /// width, for reduction of clearance tests to polygon intersection.
    pub fn hull(&self, clearance: i64, walkaround_width: i64) -> LineChain {
        let inflate = clearance + walkaround_width / 2;
        match self {
            Self::Solid(s) => {
                let bbox = s.outline.bbox();
                octagonal_hull(
                    bbox.min,
                    Vec2::new(bbox.width(), bbox.height()),
                    inflate,
                    inflate / 5,
                )
            }
            Self::Via(v) => v.hull(clearance, walkaround_width),
            Self::Segment(s) => segment_hull(s.seg, s.width, inflate),
        }
    }
}
