// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Octagonal clearance hulls.
//!
//! A hull expands a shape's footprint by a clearance amount into a closed
//! convex chain, turning "collide at clearance `c`" into "intersect the
//! hull". Hulls are conservative octagons: they contain the exact rounded
//! offset shape, never less.

use alloc::vec::Vec;

use crate::chain::LineChain;
use crate::seg::Seg;
use crate::vector::Vec2;

/// Octagonal outline of a rectangle `[p0, p0 + size]` inflated by
/// `clearance`, with the four corners cut back by `chamfer` along each axis.
///
/// A zero chamfer degenerates to the inflated rectangle.
pub fn octagonal_hull(p0: Vec2, size: Vec2, clearance: i64, chamfer: i64) -> LineChain {
    let cl = clearance;
    let ch = chamfer;
    LineChain::closed([
        Vec2::new(p0.x - cl, p0.y + ch - cl),
        Vec2::new(p0.x - cl, p0.y + size.y - ch + cl),
        Vec2::new(p0.x + ch - cl, p0.y + size.y + cl),
        Vec2::new(p0.x + size.x - ch + cl, p0.y + size.y + cl),
        Vec2::new(p0.x + size.x + cl, p0.y + size.y - ch + cl),
        Vec2::new(p0.x + size.x + cl, p0.y + ch - cl),
        Vec2::new(p0.x + size.x - ch + cl, p0.y - cl),
        Vec2::new(p0.x + ch - cl, p0.y - cl),
    ])
}

/// Regular octagon tangent to (and containing) the circle of
/// `radius + clearance` around `center`.
pub fn circle_hull(center: Vec2, radius: i64, clearance: i64) -> LineChain {
    let rho = radius + clearance;
    let k = octagon_inset(rho);
    octagonal_hull(
        center - Vec2::new(rho, rho),
        Vec2::new(2 * rho, 2 * rho),
        0,
        rho - k,
    )
}

/// Octagonal capsule around a segment of the given `width`, inflated by
/// `clearance`: the convex hull of the two endpoint octagons.
pub fn segment_hull(seg: Seg, width: i64, clearance: i64) -> LineChain {
    let rho = width / 2 + clearance;
    if seg.a == seg.b {
        return circle_hull(seg.a, width / 2, clearance);
    }
    let k = octagon_inset(rho);
    let mut points = Vec::with_capacity(16);
    for c in [seg.a, seg.b] {
        points.extend_from_slice(&[
            Vec2::new(c.x + rho, c.y + k),
            Vec2::new(c.x + k, c.y + rho),
            Vec2::new(c.x - k, c.y + rho),
            Vec2::new(c.x - rho, c.y + k),
            Vec2::new(c.x - rho, c.y - k),
            Vec2::new(c.x - k, c.y - rho),
            Vec2::new(c.x + k, c.y - rho),
            Vec2::new(c.x + rho, c.y - k),
        ]);
    }
    LineChain::closed(convex_hull(points))
}

// Half-chord of the tangent octagon: rho * tan(pi/8), rounded up so the
// octagon edges stay outside the circle.
fn octagon_inset(rho: i64) -> i64 {
    const TAN_PI_8_NUM: i128 = 414_214;
    const TAN_PI_8_DEN: i128 = 1_000_000;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "the inset is strictly smaller than the i64 input radius"
    )]
    {
        ((rho as i128 * TAN_PI_8_NUM + TAN_PI_8_DEN - 1) / TAN_PI_8_DEN) as i64
    }
}

/// Convex hull of a point set (monotone chain), counter-clockwise, without
/// collinear interior vertices. Degenerate inputs return what is left of
/// them.
pub fn convex_hull(mut points: Vec<Vec2>) -> Vec<Vec2> {
    points.sort_by_key(|p| (p.x, p.y));
    points.dedup();
    if points.len() <= 2 {
        return points;
    }

    fn half_hull(points: impl Iterator<Item = Vec2>) -> Vec<Vec2> {
        let mut hull: Vec<Vec2> = Vec::new();
        for p in points {
            while hull.len() >= 2 {
                let a = hull[hull.len() - 2];
                let b = hull[hull.len() - 1];
                if (b - a).cross(p - a) <= 0 {
                    hull.pop();
                } else {
                    break;
                }
            }
            hull.push(p);
        }
        hull
    }

    let mut lower = half_hull(points.iter().copied());
    let mut upper = half_hull(points.iter().rev().copied());
    // The seam points appear in both halves.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
