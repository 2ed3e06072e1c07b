// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod district;
pub mod osm;
pub mod run;
pub mod snapshot;

pub use district::{District, DistrictSource, DistrictState, DistrictUnlock};
pub use osm::{OsmElement, OsmPayload, PayloadError};
pub use run::RunSummary;
pub use snapshot::{ExportDocument, ImportError, Snapshot};
