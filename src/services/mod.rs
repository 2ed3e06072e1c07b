// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - engine logic layer.

pub mod districts;
pub mod fog;
pub mod normalizer;
pub mod notify;
pub mod overpass;
pub mod session;
pub mod tracker;
pub mod unlock;

pub use districts::{DistrictService, FetchTicket};
pub use normalizer::normalize;
pub use notify::{Notification, Notifier};
pub use overpass::{FetchError, OverpassClient};
pub use session::{ExplorationStats, FixReport, GpsFix, ImportSummary, Session, StopReport};
pub use tracker::{FixOutcome, Rejection, RunState, RunTracker, TrackerConfig};
pub use unlock::{UnlockEngine, UnlockedSet};
