// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-size degree buckets for windowed point queries.

use crate::geometry::primitives::{Bounds, GeoPoint};
use std::collections::HashMap;

/// Default bucket edge in degrees (~550 m).
pub const DEFAULT_CELL_SIZE_DEGREES: f64 = 0.005;

/// Auxiliary index over a point set. Never persisted; rebuilt wholesale
/// when the source set changes (import, reset).
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    buckets: HashMap<(i64, i64), Vec<GeoPoint>>,
    len: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE_DEGREES)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE_DEGREES
        };
        Self {
            cell_size,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    pub fn from_points<'a, I>(cell_size: f64, points: I) -> Self
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut grid = Self::new(cell_size);
        for p in points {
            grid.add(*p);
        }
        grid
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cell_of(&self, lat: f64, lng: f64) -> (i64, i64) {
        (
            (lat / self.cell_size).floor() as i64,
            (lng / self.cell_size).floor() as i64,
        )
    }

    pub fn add(&mut self, point: GeoPoint) {
        let key = self.cell_of(point.lat, point.lng);
        self.buckets.entry(key).or_default().push(point);
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// All points in buckets overlapping `bounds`, widened by one cell on
    /// every side so points just across a bucket edge are not lost.
    ///
    /// The result is a bucket union: it may include points slightly outside
    /// `bounds`, and its order is unspecified.
    pub fn query(&self, bounds: &Bounds) -> Vec<GeoPoint> {
        let (min_row, min_col) = self.cell_of(bounds.min_lat, bounds.min_lng);
        let (max_row, max_col) = self.cell_of(bounds.max_lat, bounds.max_lng);
        let (min_row, min_col) = (min_row.saturating_sub(1), min_col.saturating_sub(1));
        let (max_row, max_col) = (max_row.saturating_add(1), max_col.saturating_add(1));

        let rows = (i128::from(max_row) - i128::from(min_row) + 1).max(0) as u128;
        let cols = (i128::from(max_col) - i128::from(min_col) + 1).max(0) as u128;

        let mut out = Vec::new();
        if rows * cols > self.buckets.len() as u128 {
            // Huge window: cheaper to walk the occupied buckets.
            for ((row, col), points) in &self.buckets {
                if (min_row..=max_row).contains(row) && (min_col..=max_col).contains(col) {
                    out.extend_from_slice(points);
                }
            }
        } else {
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    if let Some(points) = self.buckets.get(&(row, col)) {
                        out.extend_from_slice(points);
                    }
                }
            }
        }
        out
    }
}
