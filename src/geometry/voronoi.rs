// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clipped Voronoi tessellation for point-only district sources.
//!
//! Each raw cell is the intersection of a padded bounding rectangle with the
//! perpendicular-bisector half-planes toward every other seed. Cells are then
//! clipped to the seeds' convex hull, pushed outward by a fixed margin so
//! cells on the rim keep usable area.

use crate::geometry::polygon::{centroid, clip_to_left_of, signed_area, sutherland_hodgman, Polygon};
use crate::geometry::primitives::{Bounds, GeoPoint};
use geo::{ConvexHull, Coord, MultiPoint, Point};

/// Padding around the seed bounding box for raw cells (degrees).
pub const VORONOI_BOUNDS_PADDING_DEGREES: f64 = 0.1;

/// Outward push of the clipping hull (degrees, ~1.3 km).
pub const HULL_MARGIN_DEGREES: f64 = 0.012;

/// A named point with no boundary geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoronoiSite {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

impl VoronoiSite {
    fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// One tessellation cell, tagged with its seed's id.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCell {
    pub id: i64,
    pub polygon: Polygon,
}

/// Build one cell per site. Fewer than two sites produce nothing.
pub fn compute_voronoi(sites: &[VoronoiSite]) -> Vec<VoronoiCell> {
    if sites.len() < 2 {
        return Vec::new();
    }

    let seeds: Vec<GeoPoint> = sites.iter().map(|s| GeoPoint::new(s.lat, s.lon)).collect();
    let Some(bounds) = Bounds::from_points(&seeds) else {
        return Vec::new();
    };
    let frame = frame_ring(&bounds.padded(VORONOI_BOUNDS_PADDING_DEGREES));
    let hull = expanded_hull(sites);
    if hull.is_none() {
        tracing::debug!(sites = sites.len(), "Degenerate seed hull, using raw Voronoi cells");
    }

    let mut cells = Vec::with_capacity(sites.len());
    for (i, site) in sites.iter().enumerate() {
        let raw = raw_cell(i, sites, &frame);

        let clipped = match &hull {
            Some(hull) => sutherland_hodgman(&raw, hull),
            None => Vec::new(),
        };

        let ring = if clipped.len() >= 3 { clipped } else { raw };
        match Polygon::from_coords(&ring) {
            Some(polygon) => cells.push(VoronoiCell {
                id: site.id,
                polygon,
            }),
            None => tracing::debug!(id = site.id, "Dropping empty Voronoi cell"),
        }
    }

    cells
}

/// Counter-clockwise rectangle ring.
fn frame_ring(b: &Bounds) -> Vec<Coord<f64>> {
    vec![
        Coord {
            x: b.min_lng,
            y: b.min_lat,
        },
        Coord {
            x: b.max_lng,
            y: b.min_lat,
        },
        Coord {
            x: b.max_lng,
            y: b.max_lat,
        },
        Coord {
            x: b.min_lng,
            y: b.max_lat,
        },
    ]
}

/// Region of `frame` closer to `sites[index]` than to any other site.
fn raw_cell(index: usize, sites: &[VoronoiSite], frame: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let seed = sites[index].coord();
    let mut cell = frame.to_vec();
    for (j, other) in sites.iter().enumerate() {
        if j == index || cell.is_empty() {
            continue;
        }
        let other = other.coord();
        let d = Coord {
            x: other.x - seed.x,
            y: other.y - seed.y,
        };
        if d.x == 0.0 && d.y == 0.0 {
            // Coincident seeds share one cell.
            continue;
        }
        let mid = Coord {
            x: (seed.x + other.x) / 2.0,
            y: (seed.y + other.y) / 2.0,
        };
        // Left of mid -> mid + rot90(d) is the seed's side of the bisector.
        let along = Coord {
            x: mid.x - d.y,
            y: mid.y + d.x,
        };
        cell = clip_to_left_of(&cell, mid, along);
    }
    cell
}

/// Convex hull of the seeds pushed outward from its centroid, wound CCW.
///
/// `None` when the seeds are collinear (no area to clip against).
fn expanded_hull(sites: &[VoronoiSite]) -> Option<Vec<Coord<f64>>> {
    let points: MultiPoint<f64> = sites.iter().map(|s| Point::from(s.coord())).collect();
    let hull = points.convex_hull();

    let mut ring: Vec<Coord<f64>> = hull.exterior().0.clone();
    if ring.len() > 1 && ring[0] == ring[ring.len() - 1] {
        ring.pop();
    }
    if ring.len() < 3 || signed_area(&ring).abs() < f64::EPSILON {
        return None;
    }

    let center = centroid(&ring);
    let mut expanded: Vec<Coord<f64>> = ring
        .iter()
        .map(|v| {
            let (dx, dy) = (v.x - center.x, v.y - center.y);
            let len = dx.hypot(dy);
            if len == 0.0 {
                *v
            } else {
                Coord {
                    x: v.x + dx / len * HULL_MARGIN_DEGREES,
                    y: v.y + dy / len * HULL_MARGIN_DEGREES,
                }
            }
        })
        .collect();

    if signed_area(&expanded) < 0.0 {
        expanded.reverse();
    }
    Some(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: i64, lat: f64, lon: f64) -> VoronoiSite {
        VoronoiSite { id, lat, lon }
    }

    #[test]
    fn test_single_site_produces_nothing() {
        assert!(compute_voronoi(&[site(1, 0.0, 0.0)]).is_empty());
        assert!(compute_voronoi(&[]).is_empty());
    }

    #[test]
    fn test_two_sites_fall_back_to_raw_cells() {
        // Two seeds are collinear, so there is no hull and the raw halves are kept.
        let cells = compute_voronoi(&[site(1, 0.0, 0.0), site(2, 0.0, 0.02)]);
        assert_eq!(cells.len(), 2);
        let left = &cells[0].polygon;
        assert!(left.contains(&GeoPoint::new(0.0, -0.05)));
        assert!(!left.contains(&GeoPoint::new(0.0, 0.05)));
    }

    #[test]
    fn test_cells_tagged_with_site_ids() {
        let cells = compute_voronoi(&[
            site(10, 0.0, 0.0),
            site(20, 0.0, 0.02),
            site(30, 0.02, 0.01),
        ]);
        let ids: Vec<i64> = cells.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_hull_margin_keeps_rim_cells_around_seed() {
        let cells = compute_voronoi(&[
            site(1, 0.0, 0.0),
            site(2, 0.0, 0.02),
            site(3, 0.02, 0.01),
        ]);
        // Each seed sits strictly inside its own clipped cell.
        for (cell, seed) in cells.iter().zip([(0.0, 0.0), (0.0, 0.02), (0.02, 0.01)]) {
            assert!(cell.polygon.contains(&GeoPoint::new(seed.0, seed.1)));
        }
    }

    #[test]
    fn test_expanded_hull_is_ccw() {
        let hull = expanded_hull(&[
            site(1, 0.0, 0.0),
            site(2, 0.02, 0.01),
            site(3, 0.0, 0.02),
        ])
        .unwrap();
        assert!(signed_area(&hull) > 0.0);
    }
}
