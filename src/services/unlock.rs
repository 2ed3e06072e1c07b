// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! District containment and the append-only unlocked set.

use crate::geometry::GeoPoint;
use crate::models::{District, DistrictState, DistrictUnlock};
use std::collections::BTreeSet;

/// Ids of every district the user has ever entered. Never shrinks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnlockedSet(BTreeSet<String>);

impl UnlockedSet {
    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Idempotent; returns `true` only on first insertion.
    pub fn insert(&mut self, id: String) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn to_set(&self) -> BTreeSet<String> {
        self.0.clone()
    }
}

/// Tests accepted points against districts and records unlocks.
#[derive(Debug, Default)]
pub struct UnlockEngine {
    unlocked: UnlockedSet,
}

impl UnlockEngine {
    pub fn new(unlocked: UnlockedSet) -> Self {
        Self { unlocked }
    }

    pub fn unlocked(&self) -> &UnlockedSet {
        &self.unlocked
    }

    pub fn state_of(&self, district: &District) -> DistrictState {
        if self.unlocked.contains(&district.key()) {
            DistrictState::Unlocked
        } else {
            DistrictState::Locked
        }
    }

    /// Every district containing `p`, locked or not.
    pub fn containing<'a>(&self, p: &GeoPoint, districts: &'a [District]) -> Vec<&'a District> {
        districts.iter().filter(|d| d.contains(p)).collect()
    }

    /// Unlock every district containing `p`; returns only the newly unlocked ones.
    ///
    /// Callers feed this with points accepted during an active run.
    pub fn check(&mut self, p: &GeoPoint, districts: &[District]) -> Vec<DistrictUnlock> {
        let mut fresh = Vec::new();
        for district in districts {
            if !district.contains(p) {
                continue;
            }
            let id = district.key();
            if self.unlocked.insert(id.clone()) {
                tracing::info!(id = %id, name = %district.name, "District unlocked");
                fresh.push(DistrictUnlock {
                    id,
                    name: district.name.clone(),
                });
            }
        }
        fresh
    }
}
