// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clearance-aware collision between heterogeneous shapes.

use crate::chain::LineChain;
use crate::rect::Rect;
use crate::seg::Seg;
use crate::vector::Vec2;

/// A circle (a via barrel, or a zero-radius point probe).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Circle {
    /// Center position.
    pub center: Vec2,
    /// Radius; zero is a point.
    pub radius: i64,
}

/// Geometric footprint of a routed object.
///
/// Collision is symmetric and clearance-aware: two shapes collide at
/// clearance `c` when their boundaries come within `c` of each other (or
/// overlap). Thick segments are capsules; polygons are closed chains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A circle.
    Circle(Circle),
    /// A segment swept with a round pen of diameter `width`.
    Segment {
        /// Centerline.
        seg: Seg,
        /// Pen diameter.
        width: i64,
    },
    /// A closed polygon outline.
    Polygon(LineChain),
}

impl Shape {
    /// Circle shape.
    pub const fn circle(center: Vec2, radius: i64) -> Self {
        Self::Circle(Circle { center, radius })
    }

    /// Thick-segment (capsule) shape.
    pub const fn segment(seg: Seg, width: i64) -> Self {
        Self::Segment { seg, width }
    }

    /// Polygon shape; the chain must be closed.
    pub fn polygon(outline: LineChain) -> Self {
        debug_assert!(outline.is_closed(), "polygon outlines are closed chains");
        Self::Polygon(outline)
    }

    /// Bounding box of the shape, including segment thickness.
    pub fn bbox(&self) -> Rect {
        match self {
            Self::Circle(c) => Rect::from_point(c.center).inflate(c.radius),
            Self::Segment { seg, width } => seg.bbox().inflate(width / 2),
            Self::Polygon(outline) => outline.bbox(),
        }
    }

    /// Whether two shapes come within `clearance` of each other.
    pub fn collides_with(&self, other: &Shape, clearance: i64) -> bool {
        use Shape::*;
        match (self, other) {
            (Circle(a), Circle(b)) => {
                (b.center - a.center).length() <= a.radius + b.radius + clearance
            }
            (Circle(c), Segment { seg, width }) | (Segment { seg, width }, Circle(c)) => {
                seg.distance(c.center) <= c.radius + width / 2 + clearance
            }
            (Segment { seg: s1, width: w1 }, Segment { seg: s2, width: w2 }) => {
                s1.distance_to_seg(s2) <= w1 / 2 + w2 / 2 + clearance
            }
            (Circle(c), Polygon(outline)) | (Polygon(outline), Circle(c)) => {
                polygon_contains(outline, c.center)
                    || edge_distance(outline, c.center) <= c.radius + clearance
            }
            (Segment { seg, width }, Polygon(outline))
            | (Polygon(outline), Segment { seg, width }) => {
                outline
                    .segments()
                    .any(|e| e.distance_to_seg(seg) <= width / 2 + clearance)
                    || polygon_contains(outline, seg.a)
            }
            (Polygon(a), Polygon(b)) => {
                a.segments()
                    .any(|ea| b.segments().any(|eb| ea.distance_to_seg(&eb) <= clearance))
                    || b.points().first().is_some_and(|&p| polygon_contains(a, p))
                    || a.points().first().is_some_and(|&p| polygon_contains(b, p))
            }
        }
    }
}

/// Even-odd containment test for a closed chain.
///
/// Points exactly on the boundary may land on either side; collision callers
/// pair this with an edge-distance test, which settles boundary cases.
pub fn polygon_contains(outline: &LineChain, p: Vec2) -> bool {
    let mut inside = false;
    for s in outline.segments() {
        let (a, b) = (s.a, s.b);
        if (a.y > p.y) != (b.y > p.y) {
            let dy = (b.y - a.y) as i128;
            let lhs = (p.x - a.x) as i128 * dy;
            let rhs = (b.x - a.x) as i128 * (p.y - a.y) as i128;
            if (dy > 0 && lhs < rhs) || (dy < 0 && lhs > rhs) {
                inside = !inside;
            }
        }
    }
    inside
}

/// Minimum distance from a point to the outline's edges.
pub fn edge_distance(outline: &LineChain, p: Vec2) -> i64 {
    outline
        .segments()
        .map(|s| s.distance(p))
        .min()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i64, y0: i64, side: i64) -> LineChain {
        LineChain::closed([
            Vec2::new(x0, y0),
            Vec2::new(x0 + side, y0),
            Vec2::new(x0 + side, y0 + side),
            Vec2::new(x0, y0 + side),
        ])
    }

    #[test]
    fn circle_circle() {
        let a = Shape::circle(Vec2::new(0, 0), 100);
        let b = Shape::circle(Vec2::new(400, 0), 100);
        assert!(a.collides_with(&b, 200));
        assert!(!a.collides_with(&b, 199));
    }

    #[test]
    fn capsule_capsule() {
        let a = Shape::segment(Seg::new(Vec2::new(0, 0), Vec2::new(1000, 0)), 100);
        let b = Shape::segment(Seg::new(Vec2::new(0, 300), Vec2::new(1000, 300)), 100);
        // Centerline gap 300, radii 50 + 50.
        assert!(a.collides_with(&b, 200));
        assert!(!a.collides_with(&b, 199));
    }

    #[test]
    fn point_probe_against_capsule() {
        let s = Shape::segment(Seg::new(Vec2::new(0, 0), Vec2::new(1000, 0)), 100);
        let on = Shape::circle(Vec2::new(500, 50), 0);
        let off = Shape::circle(Vec2::new(500, 51), 0);
        assert!(s.collides_with(&on, 0));
        assert!(!s.collides_with(&off, 0));
    }

    #[test]
    fn polygon_containment_and_distance() {
        let sq = square(0, 0, 100);
        assert!(polygon_contains(&sq, Vec2::new(50, 50)));
        assert!(!polygon_contains(&sq, Vec2::new(150, 50)));
        assert_eq!(edge_distance(&sq, Vec2::new(150, 50)), 50);
    }

    #[test]
    fn polygon_against_others() {
        let pad = Shape::polygon(square(0, 0, 100));
        let near = Shape::circle(Vec2::new(180, 50), 30);
        assert!(pad.collides_with(&near, 50));
        assert!(!pad.collides_with(&near, 49));

        // A segment crossing straight through the pad.
        let through = Shape::segment(Seg::new(Vec2::new(-50, 50), Vec2::new(150, 50)), 10);
        assert!(pad.collides_with(&through, 0));

        // A segment wholly inside the pad (no edge within reach of zero
        // clearance is impossible here, containment catches it).
        let inside = Shape::segment(Seg::new(Vec2::new(40, 50), Vec2::new(60, 50)), 10);
        assert!(pad.collides_with(&inside, 0));

        let far = Shape::polygon(square(150, 0, 50));
        assert!(!pad.collides_with(&far, 49));
        assert!(pad.collides_with(&far, 50));
    }
}
