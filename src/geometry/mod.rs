// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geospatial building blocks: points, rings, indexing, stitching and tessellation.

pub mod grid;
pub mod polygon;
pub mod primitives;
pub mod stitch;
pub mod voronoi;

pub use grid::SpatialGrid;
pub use polygon::Polygon;
pub use primitives::{cell_key, haversine_meters, Bounds, GeoPoint};
pub use stitch::stitch_ways;
pub use voronoi::{compute_voronoi, VoronoiCell, VoronoiSite};
