// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current district set and fetch coordination.
//!
//! The set is only ever replaced wholesale. A fetch is described by a
//! [`FetchTicket`]; when its result arrives it is applied only if no newer
//! fetch or direct load has happened since. Superseded results are dropped.

use crate::geometry::{haversine_meters, Bounds, GeoPoint};
use crate::models::District;
use std::sync::Arc;

/// Default relocation distance that triggers a re-fetch (meters).
pub const DEFAULT_REFETCH_THRESHOLD_METERS: f64 = 5_000.0;

/// Default half-size of the fetched box (meters).
pub const DEFAULT_FETCH_RADIUS_METERS: f64 = 4_000.0;

/// An in-flight fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub center: GeoPoint,
    pub bounds: Bounds,
}

/// The districts for the current map area.
#[derive(Debug, Default)]
pub struct DistrictService {
    districts: Arc<Vec<District>>,
    origin: Option<GeoPoint>,
    pending: Option<FetchTicket>,
    generation: u64,
    refetch_threshold_meters: f64,
    fetch_radius_meters: f64,
}

impl DistrictService {
    pub fn new(refetch_threshold_meters: f64, fetch_radius_meters: f64) -> Self {
        Self {
            refetch_threshold_meters,
            fetch_radius_meters,
            ..Default::default()
        }
    }

    /// Shared handle to the current set. Cheap to clone; never mutated in place.
    pub fn districts(&self) -> Arc<Vec<District>> {
        Arc::clone(&self.districts)
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    pub fn origin(&self) -> Option<GeoPoint> {
        self.origin
    }

    pub fn pending(&self) -> Option<&FetchTicket> {
        self.pending.as_ref()
    }

    /// True when `position` is far from both the loaded area and any pending fetch.
    pub fn needs_fetch(&self, position: &GeoPoint) -> bool {
        let near = |c: &GeoPoint| haversine_meters(c, position) <= self.refetch_threshold_meters;
        if self.origin.as_ref().is_some_and(near) {
            return false;
        }
        !self.pending.as_ref().is_some_and(|t| near(&t.center))
    }

    /// Start a fetch around `position` if the user has moved far enough.
    pub fn plan_fetch(&mut self, position: &GeoPoint) -> Option<FetchTicket> {
        if !self.needs_fetch(position) {
            return None;
        }
        Some(self.begin_fetch(position))
    }

    /// Start a fetch unconditionally, superseding any pending one.
    pub fn begin_fetch(&mut self, position: &GeoPoint) -> FetchTicket {
        self.generation += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            center: GeoPoint::new(position.lat, position.lng),
            bounds: Bounds::around(position, self.fetch_radius_meters),
        };
        tracing::debug!(
            generation = ticket.generation,
            lat = ticket.center.lat,
            lng = ticket.center.lng,
            "District fetch planned"
        );
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Apply a fetch result. Returns `false` if the ticket was superseded.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, districts: Vec<District>) -> bool {
        if ticket.generation != self.generation {
            tracing::warn!(
                generation = ticket.generation,
                current = self.generation,
                "Discarding superseded district fetch"
            );
            return false;
        }
        self.pending = None;
        self.install(districts, Some(ticket.center));
        true
    }

    /// Forget a failed fetch so the next fix can plan a new one.
    /// The current set stays in place.
    pub fn abandon_fetch(&mut self, ticket: &FetchTicket) {
        if self.pending.as_ref().is_some_and(|p| p.generation == ticket.generation) {
            self.pending = None;
        }
    }

    /// Replace the set directly, superseding any in-flight fetch.
    pub fn replace(&mut self, districts: Vec<District>, origin: Option<GeoPoint>) {
        self.generation += 1;
        self.pending = None;
        self.install(districts, origin);
    }

    fn install(&mut self, districts: Vec<District>, origin: Option<GeoPoint>) {
        let origin = origin.or_else(|| {
            districts
                .iter()
                .map(|d| d.bounds)
                .reduce(|a, b| a.union(&b))
                .map(|b| b.center())
        });
        tracing::info!(count = districts.len(), "District set replaced");
        self.districts = Arc::new(districts);
        self.origin = origin;
    }
}
