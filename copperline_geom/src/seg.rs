// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line segment with integer endpoints.

use alloc::vec::Vec;

use crate::rect::Rect;
use crate::vector::{Vec2, int_sqrt};

/// A directed line segment from `a` to `b`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Seg {
    /// Start point.
    pub a: Vec2,
    /// End point.
    pub b: Vec2,
}

impl Seg {
    /// Create a segment from endpoints.
    pub const fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Segment length, rounded towards zero.
    pub fn length(&self) -> i64 {
        (self.b - self.a).length()
    }

    /// Bounding box of the endpoints.
    pub fn bbox(&self) -> Rect {
        Rect::new(self.a, self.b)
    }

    /// Euclidean distance from the segment to a point.
    ///
    /// Exact up to one unit of rounding; sufficient for clearance tests on
    /// micrometer coordinates.
    pub fn distance(&self, p: Vec2) -> i64 {
        let d = self.b - self.a;
        let ap = p - self.a;
        let d_sq = d.length_sq();
        if d_sq == 0 {
            return ap.length();
        }
        let t = ap.dot(d);
        if t <= 0 {
            return ap.length();
        }
        if t >= d_sq {
            return (p - self.b).length();
        }
        let num = d.cross(ap).unsigned_abs();
        let den = int_sqrt(d_sq).unsigned_abs() as u128;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "perpendicular distance never exceeds an endpoint distance, which fits in i64"
        )]
        {
            (num / den) as i64
        }
    }

    /// Whether the point lies on the segment, within one unit of rounding.
    ///
    /// The tolerance absorbs the rounding of intersection points computed by
    /// [`Seg::intersect_into`] back onto the chain they came from.
    pub fn contains(&self, p: Vec2) -> bool {
        self.distance(p) <= 1
    }

    /// Euclidean distance between two segments (zero when they cross).
    pub fn distance_to_seg(&self, other: &Seg) -> i64 {
        if self.intersects(other) {
            return 0;
        }
        self.distance(other.a)
            .min(self.distance(other.b))
            .min(other.distance(self.a))
            .min(other.distance(self.b))
    }

    /// Whether the segments share at least one point (touching counts).
    pub fn intersects(&self, other: &Seg) -> bool {
        let d1 = self.b - self.a;
        let d2 = other.b - other.a;
        let o1 = sign(d1.cross(other.a - self.a));
        let o2 = sign(d1.cross(other.b - self.a));
        let o3 = sign(d2.cross(self.a - other.a));
        let o4 = sign(d2.cross(self.b - other.a));

        if o1 != o2 && o3 != o4 && o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0 {
            return true;
        }
        (o1 == 0 && self.exact_contains(other.a))
            || (o2 == 0 && self.exact_contains(other.b))
            || (o3 == 0 && other.exact_contains(self.a))
            || (o4 == 0 && other.exact_contains(self.b))
    }

    /// Append the intersection points of two segments to `out`.
    ///
    /// A proper crossing or an endpoint touch contributes one point, rounded
    /// to the nearest integer coordinates. Collinear overlap contributes the
    /// overlap's endpoints. Disjoint segments contribute nothing.
    pub fn intersect_into(&self, other: &Seg, out: &mut Vec<Vec2>) {
        let d1 = self.b - self.a;
        let d2 = other.b - other.a;
        let ao = other.a - self.a;
        let denom = d1.cross(d2);

        if denom == 0 {
            if d1.cross(ao) != 0 {
                return;
            }
            // Collinear (or degenerate): the overlap endpoints are exactly
            // those endpoints contained in the opposite segment.
            let mut push = |p: Vec2| {
                if !out.contains(&p) {
                    out.push(p);
                }
            };
            for p in [other.a, other.b] {
                if self.exact_contains(p) {
                    push(p);
                }
            }
            for p in [self.a, self.b] {
                if other.exact_contains(p) {
                    push(p);
                }
            }
            return;
        }

        let (mut t_num, mut u_num, mut denom) = (ao.cross(d2), ao.cross(d1), denom);
        if denom < 0 {
            t_num = -t_num;
            u_num = -u_num;
            denom = -denom;
        }
        if t_num < 0 || t_num > denom || u_num < 0 || u_num > denom {
            return;
        }

        let p = Vec2::new(
            self.a.x + round_div(d1.x as i128 * t_num, denom),
            self.a.y + round_div(d1.y as i128 * t_num, denom),
        );
        if !out.contains(&p) {
            out.push(p);
        }
    }

    // Exact on-segment test: collinear and within the parameter range.
    fn exact_contains(&self, p: Vec2) -> bool {
        let d = self.b - self.a;
        if d == Vec2::ZERO {
            return p == self.a;
        }
        let ap = p - self.a;
        if d.cross(ap) != 0 {
            return false;
        }
        let t = ap.dot(d);
        t >= 0 && t <= d.length_sq()
    }
}

fn sign(v: i128) -> i8 {
    match v {
        0 => 0,
        v if v > 0 => 1,
        _ => -1,
    }
}

/// Divide rounding to nearest (half away from the floor), `d > 0`.
fn round_div(n: i128, d: i128) -> i64 {
    debug_assert!(d > 0);
    #[allow(
        clippy::cast_possible_truncation,
        reason = "the quotient is a coordinate interpolated between two i64 endpoints"
    )]
    {
        (2 * n + d).div_euclid(2 * d) as i64
    }
}
