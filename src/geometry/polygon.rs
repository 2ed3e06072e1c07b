// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polygon ring type, ray-casting containment and convex clipping.
//!
//! All planar math treats longitude as x and latitude as y. That is not
//! distance-preserving, but containment and clipping only need orientation
//! and ordering, which survive the equirectangular view at district scale.

use crate::geometry::primitives::{Bounds, GeoPoint};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Minimum vertex count for a usable ring.
pub const MIN_POLYGON_POINTS: usize = 3;

/// An implicitly closed ring of points.
///
/// The last vertex is NOT a copy of the first: consumers iterate the ring as
/// a cycle. Constructors strip a duplicated closing vertex so the seam point
/// is never counted twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GeoPoint>")]
pub struct Polygon(Vec<GeoPoint>);

#[derive(Debug, thiserror::Error)]
#[error("ring has fewer than 3 distinct vertices")]
pub struct DegenerateRing;

impl TryFrom<Vec<GeoPoint>> for Polygon {
    type Error = DegenerateRing;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self, Self::Error> {
        Self::new(points).ok_or(DegenerateRing)
    }
}

impl Polygon {
    /// Build a ring, rejecting anything with fewer than three distinct-position vertices.
    pub fn new(mut points: Vec<GeoPoint>) -> Option<Self> {
        if points.len() > 1 {
            let (first, last) = (points[0], points[points.len() - 1]);
            if first.approx_eq(&last) {
                points.pop();
            }
        }
        if points.len() < MIN_POLYGON_POINTS {
            return None;
        }
        Some(Self(points))
    }

    pub(crate) fn from_coords(coords: &[Coord<f64>]) -> Option<Self> {
        Self::new(coords.iter().map(|c| GeoPoint::from_coord(*c)).collect())
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        // A constructed polygon always has at least three points.
        Bounds::from_points(&self.0).unwrap_or_else(|| Bounds::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Even-odd ray-casting test.
    ///
    /// Points exactly on an edge or vertex may land on either side.
    pub fn contains(&self, p: &GeoPoint) -> bool {
        let (x, y) = (p.lng, p.lat);
        let pts = &self.0;
        let mut inside = false;
        let mut j = pts.len() - 1;
        for i in 0..pts.len() {
            let (xi, yi) = (pts[i].lng, pts[i].lat);
            let (xj, yj) = (pts[j].lng, pts[j].lat);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Shoelace signed area in square degrees; positive when counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        let coords: Vec<Coord<f64>> = self.0.iter().map(GeoPoint::coord).collect();
        signed_area(&coords)
    }

    /// Area-weighted centroid, falling back to the vertex mean for degenerate rings.
    pub fn centroid(&self) -> GeoPoint {
        let coords: Vec<Coord<f64>> = self.0.iter().map(GeoPoint::coord).collect();
        GeoPoint::from_coord(centroid(&coords))
    }

    /// Closed `geo` polygon for GeoJSON output.
    pub fn to_geo(&self) -> geo::Polygon<f64> {
        let coords: Vec<Coord<f64>> = self.0.iter().map(GeoPoint::coord).collect();
        // LineString -> Polygon closes the ring.
        geo::Polygon::new(geo::LineString::from(coords), vec![])
    }
}

pub(crate) fn cross(o: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

pub(crate) fn signed_area(ring: &[Coord<f64>]) -> f64 {
    if ring.len() < MIN_POLYGON_POINTS {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

pub(crate) fn centroid(ring: &[Coord<f64>]) -> Coord<f64> {
    let area = signed_area(ring);
    if area.abs() < f64::EPSILON {
        let n = ring.len().max(1) as f64;
        let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
        return Coord {
            x: sx / n,
            y: sy / n,
        };
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let f = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * f;
        cy += (a.y + b.y) * f;
    }
    Coord {
        x: cx / (6.0 * area),
        y: cy / (6.0 * area),
    }
}

/// Keep the part of `subject` left of the directed line `a -> b`.
pub(crate) fn clip_to_left_of(subject: &[Coord<f64>], a: Coord<f64>, b: Coord<f64>) -> Vec<Coord<f64>> {
    let mut output = Vec::with_capacity(subject.len() + 2);
    if subject.is_empty() {
        return output;
    }
    let mut prev = subject[subject.len() - 1];
    let mut prev_side = cross(a, b, prev);
    for &cur in subject {
        let cur_side = cross(a, b, cur);
        if cur_side >= 0.0 {
            if prev_side < 0.0 {
                output.push(intersect(prev, cur, prev_side, cur_side));
            }
            output.push(cur);
        } else if prev_side >= 0.0 {
            output.push(intersect(prev, cur, prev_side, cur_side));
        }
        prev = cur;
        prev_side = cur_side;
    }
    output
}

/// Point where segment `p -> q` crosses the clip line, from the signed side values.
fn intersect(p: Coord<f64>, q: Coord<f64>, side_p: f64, side_q: f64) -> Coord<f64> {
    let t = side_p / (side_p - side_q);
    Coord {
        x: p.x + (q.x - p.x) * t,
        y: p.y + (q.y - p.y) * t,
    }
}

/// Sutherland–Hodgman clip of `subject` against a convex, counter-clockwise `clip` ring.
pub fn sutherland_hodgman(subject: &[Coord<f64>], clip: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut output = subject.to_vec();
    for i in 0..clip.len() {
        if output.is_empty() {
            break;
        }
        let a = clip[i];
        let b = clip[(i + 1) % clip.len()];
        output = clip_to_left_of(&output, a, b);
    }
    output
}
