// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fog mask contract.
//!
//! Pixel work belongs to the host renderer. This module fixes what it must
//! draw: consecutive trail points within [`CONNECT_THRESHOLD_METERS`] are
//! joined by a cleared corridor; a larger gap starts a new, independent
//! stroke. The threshold decides what counts as one contiguous path and is
//! not a styling knob.

use crate::geometry::{haversine_meters, Bounds, GeoPoint};
use serde::Serialize;

/// Maximum gap between consecutive points that still forms a corridor.
pub const CONNECT_THRESHOLD_METERS: f64 = 50.0;

/// Default corridor half-width in pixels.
pub const DEFAULT_CORRIDOR_HALF_WIDTH_PX: f32 = 18.0;

/// Split a trail into contiguous strokes.
///
/// The trail may interleave several runs and need not be time-ordered.
/// A stroke with a single point is a lone clear spot.
pub fn trail_strokes(trail: &[GeoPoint]) -> Vec<Vec<GeoPoint>> {
    let mut strokes: Vec<Vec<GeoPoint>> = Vec::new();
    let mut current: Vec<GeoPoint> = Vec::new();
    for p in trail {
        if let Some(prev) = current.last() {
            if haversine_meters(prev, p) > CONNECT_THRESHOLD_METERS {
                strokes.push(std::mem::take(&mut current));
            }
        }
        current.push(*p);
    }
    if !current.is_empty() {
        strokes.push(current);
    }
    strokes
}

/// Strokes whose extent overlaps `view`.
pub fn strokes_in_view(trail: &[GeoPoint], view: &Bounds) -> Vec<Vec<GeoPoint>> {
    trail_strokes(trail)
        .into_iter()
        .filter(|s| Bounds::from_points(s).is_some_and(|b| b.intersects(view)))
        .collect()
}

/// A position on the renderer's surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// Maps geographic coordinates onto a pixel surface (Web Mercator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: Bounds,
    pub width_px: u32,
    pub height_px: u32,
}

impl Viewport {
    pub fn new(bounds: Bounds, width_px: u32, height_px: u32) -> Self {
        Self {
            bounds,
            width_px,
            height_px,
        }
    }

    pub fn project(&self, p: &GeoPoint) -> ScreenPoint {
        let x_span = (self.bounds.max_lng - self.bounds.min_lng).max(f64::EPSILON);
        let top = mercator_y(self.bounds.max_lat);
        let bottom = mercator_y(self.bounds.min_lat);
        let y_span = (top - bottom).max(f64::EPSILON);

        let x = (p.lng - self.bounds.min_lng) / x_span * self.width_px as f64;
        let y = (top - mercator_y(p.lat)) / y_span * self.height_px as f64;
        ScreenPoint {
            x: x as f32,
            y: y as f32,
        }
    }
}

/// Mercator northing, growing northwards.
fn mercator_y(lat: f64) -> f64 {
    let lat = lat.clamp(-85.051_128, 85.051_128).to_radians();
    (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln()
}

/// What a fog renderer must be able to clear.
pub trait FogRenderer {
    /// Clear a corridor along a polyline of at least two points.
    fn clear_corridor(&mut self, points: &[ScreenPoint], half_width_px: f32);
    /// Clear a disc around an isolated point.
    fn clear_spot(&mut self, point: ScreenPoint, radius_px: f32);
}

/// Drive `renderer` with every stroke of `trail` visible in `viewport`.
pub fn paint_fog<R: FogRenderer>(
    trail: &[GeoPoint],
    viewport: &Viewport,
    renderer: &mut R,
    half_width_px: f32,
) {
    for stroke in strokes_in_view(trail, &viewport.bounds) {
        let projected: Vec<ScreenPoint> = stroke.iter().map(|p| viewport.project(p)).collect();
        match projected.as_slice() {
            [single] => renderer.clear_spot(*single, half_width_px),
            points => renderer.clear_corridor(points, half_width_px),
        }
    }
}
