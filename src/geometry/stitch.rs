// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Join boundary segments that share endpoints into rings.
//!
//! Administrative relations arrive as many "outer" ways in no particular
//! order or direction. Rings are grown greedily: the first pooled way whose
//! endpoint touches either end of the current ring is attached, reversed if
//! needed. The first match wins, not the shortest closing path, so ambiguous
//! inputs can yield a valid but non-minimal ring.

use crate::geometry::polygon::Polygon;
use crate::geometry::primitives::GeoPoint;
use std::collections::VecDeque;

/// Stitch `ways` into rings, keeping those with at least three points.
///
/// A way that touches nothing becomes its own (possibly open) ring rather
/// than being dropped.
pub fn stitch_ways(ways: &[Vec<GeoPoint>]) -> Vec<Polygon> {
    let mut pool: VecDeque<Vec<GeoPoint>> = ways.iter().filter(|w| !w.is_empty()).cloned().collect();
    let mut rings = Vec::new();

    while let Some(mut ring) = pool.pop_front() {
        while !is_closed(&ring) {
            let Some(idx) = find_attachable(&pool, &ring) else {
                break;
            };
            let Some(way) = pool.remove(idx) else {
                break;
            };
            attach(&mut ring, way);
        }

        let len = ring.len();
        match Polygon::new(ring) {
            Some(polygon) => rings.push(polygon),
            None => tracing::debug!(points = len, "Dropping degenerate stitched ring"),
        }
    }

    rings
}

fn is_closed(ring: &[GeoPoint]) -> bool {
    ring.len() > 2 && ring[0].approx_eq(&ring[ring.len() - 1])
}

fn find_attachable(pool: &VecDeque<Vec<GeoPoint>>, ring: &[GeoPoint]) -> Option<usize> {
    let head = ring.first()?;
    let tail = ring.last()?;
    pool.iter().position(|way| match (way.first(), way.last()) {
        (Some(first), Some(last)) => {
            first.approx_eq(tail) || last.approx_eq(tail) || first.approx_eq(head) || last.approx_eq(head)
        }
        _ => false,
    })
}

/// Attach `way` to whichever end of `ring` it touches, dropping the shared vertex.
fn attach(ring: &mut Vec<GeoPoint>, mut way: Vec<GeoPoint>) {
    let (Some(&head), Some(&tail)) = (ring.first(), ring.last()) else {
        return;
    };
    let (Some(&first), Some(&last)) = (way.first(), way.last()) else {
        return;
    };

    if first.approx_eq(&tail) {
        ring.extend(way.into_iter().skip(1));
    } else if last.approx_eq(&tail) {
        way.reverse();
        ring.extend(way.into_iter().skip(1));
    } else if last.approx_eq(&head) {
        way.pop();
        way.append(ring);
        *ring = way;
    } else {
        // first touches head: flip so it ends at head, then prepend.
        way.reverse();
        way.pop();
        way.append(ring);
        *ring = way;
    }
}
