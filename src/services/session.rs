// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Top-level owner of all engine state.
//!
//! Every event (GPS fix, run start/stop, import, reset, district load) is a
//! single `&mut self` call processed to completion. State-changing events
//! save the snapshot before returning; a failed save is logged and reported
//! as `saved: false`, while the in-memory state stays as mutated.

use crate::config::Config;
use crate::db::JsonStore;
use crate::geometry::{cell_key, Bounds, GeoPoint, SpatialGrid};
use crate::models::{
    District, DistrictUnlock, ExportDocument, ImportError, OsmPayload, RunSummary, Snapshot,
};
use crate::services::districts::{DistrictService, FetchTicket};
use crate::services::normalizer::normalize;
use crate::services::notify::{Notification, Notifier};
use crate::services::tracker::{FixOutcome, RunState, RunTracker};
use crate::services::unlock::{UnlockEngine, UnlockedSet};
use crate::time_utils::format_millis_rfc3339;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A raw reading from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Epoch ms; the ingestion time is used when absent.
    #[serde(default)]
    pub t: Option<i64>,
}

/// What happened to one fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixReport {
    pub outcome: FixOutcome,
    pub unlocked: Vec<DistrictUnlock>,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopReport {
    /// `None` when the run had fewer than two accepted points.
    pub summary: Option<RunSummary>,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub revealed: usize,
    pub runs: usize,
    pub saved: bool,
}

/// Exploration totals for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExplorationStats {
    pub explored_cells: usize,
    pub revealed_points: usize,
    pub total_runs: usize,
    pub total_distance_meters: f64,
    pub unlocked_districts: usize,
    pub known_districts: usize,
    pub known_unlocked: usize,
}

pub struct Session {
    tracker: RunTracker,
    revealed: Vec<GeoPoint>,
    grid: SpatialGrid,
    runs: Vec<RunSummary>,
    unlock: UnlockEngine,
    districts: DistrictService,
    store: JsonStore,
    notifier: Notifier,
    extras: serde_json::Map<String, serde_json::Value>,
    cell_key_precision: u32,
}

impl Session {
    /// Build a session from whatever `store` holds (empty if nothing usable).
    pub fn load(config: &Config, store: JsonStore, notifier: Notifier) -> Self {
        let snapshot = store.load();
        let grid = SpatialGrid::from_points(config.grid_cell_degrees, &snapshot.revealed);
        Self {
            tracker: RunTracker::new(config.tracker),
            revealed: snapshot.revealed,
            grid,
            runs: snapshot.runs,
            unlock: UnlockEngine::new(UnlockedSet::from_ids(snapshot.unlocked)),
            districts: DistrictService::new(
                config.refetch_threshold_meters,
                config.fetch_radius_meters,
            ),
            store,
            notifier,
            extras: snapshot.extras,
            cell_key_precision: config.cell_key_precision,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn run_state(&self) -> RunState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub fn revealed(&self) -> &[GeoPoint] {
        &self.revealed
    }

    /// Revealed points near `bounds` (bucket union, unordered).
    pub fn revealed_in(&self, bounds: &Bounds) -> Vec<GeoPoint> {
        self.grid.query(bounds)
    }

    pub fn runs(&self) -> &[RunSummary] {
        &self.runs
    }

    pub fn unlocked(&self) -> &UnlockedSet {
        self.unlock.unlocked()
    }

    pub fn districts(&self) -> Arc<Vec<District>> {
        self.districts.districts()
    }

    pub fn district_service(&self) -> &DistrictService {
        &self.districts
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // ─── Run lifecycle ───────────────────────────────────────────

    /// Idle -> Running. Returns `false` if a run is already active.
    pub fn start_run(&mut self, now_ms: i64) -> bool {
        if !self.tracker.start(now_ms) {
            return false;
        }
        tracing::info!(started_at = now_ms, "Run started");
        self.notifier
            .emit(Notification::RunStarted { started_at: now_ms });
        true
    }

    /// Filter a fix; accepted points are revealed and tested for unlocks.
    pub fn ingest_fix(&mut self, fix: GpsFix, now_ms: i64) -> FixReport {
        let point = GeoPoint {
            lat: fix.lat,
            lng: fix.lng,
            t: Some(fix.t.unwrap_or(now_ms)),
        };

        let outcome = self.tracker.accept_point(point, fix.accuracy);
        let FixOutcome::Accepted { step_meters } = outcome else {
            if let FixOutcome::Rejected(reason) = outcome {
                tracing::debug!(reason = reason.code(), "Fix rejected");
            }
            return FixReport {
                outcome,
                unlocked: Vec::new(),
                saved: true,
            };
        };

        tracing::debug!(
            lat = point.lat,
            lng = point.lng,
            step_meters,
            "Fix accepted"
        );

        self.revealed.push(point);
        self.grid.add(point);

        let districts = self.districts.districts();
        let unlocked = self.unlock.check(&point, &districts);
        for unlock in &unlocked {
            self.notifier.emit(Notification::from(unlock.clone()));
        }

        FixReport {
            outcome,
            unlocked,
            saved: self.persist(),
        }
    }

    /// Running -> Idle, recording the run if it has at least two points.
    ///
    /// Points revealed by a discarded run stay revealed.
    pub fn stop_run(&mut self, now_ms: i64) -> StopReport {
        if !self.tracker.is_running() {
            return StopReport {
                summary: None,
                saved: true,
            };
        }

        let summary = self.tracker.stop(now_ms);
        let saved = match &summary {
            Some(run) => {
                tracing::info!(
                    id = %run.id,
                    points = run.points.len(),
                    distance_meters = run.distance_meters,
                    "Run stopped"
                );
                self.runs.push(run.clone());
                self.persist()
            }
            None => {
                tracing::info!("Run stopped without enough points, discarded");
                true
            }
        };

        self.notifier.emit(Notification::RunStopped {
            summary: summary.clone(),
        });
        StopReport { summary, saved }
    }

    // ─── Trail maintenance ───────────────────────────────────────

    /// Clear the revealed trail. Run history and unlocks are kept.
    pub fn reset_trail(&mut self) -> bool {
        tracing::info!(points = self.revealed.len(), "Clearing revealed trail");
        self.revealed.clear();
        self.grid.clear();
        self.persist()
    }

    pub fn export(&self, now_ms: i64) -> ExportDocument {
        ExportDocument {
            revealed: self.revealed.clone(),
            runs: self.runs.clone(),
            exported_at: format_millis_rfc3339(now_ms),
        }
    }

    /// Replace trail and history with an exported document.
    ///
    /// A rejected document leaves the session untouched.
    pub fn import(&mut self, json: &str) -> Result<ImportSummary, ImportError> {
        let doc = ExportDocument::parse(json)?;
        self.revealed = doc.revealed;
        self.runs = doc.runs;
        self.grid = SpatialGrid::from_points(self.grid.cell_size(), &self.revealed);
        tracing::info!(
            revealed = self.revealed.len(),
            runs = self.runs.len(),
            "Imported trail"
        );
        Ok(ImportSummary {
            revealed: self.revealed.len(),
            runs: self.runs.len(),
            saved: self.persist(),
        })
    }

    pub fn stats(&self) -> ExplorationStats {
        let cells: HashSet<String> = self
            .revealed
            .iter()
            .map(|p| cell_key(p, self.cell_key_precision))
            .collect();
        let districts = self.districts.districts();
        let known_unlocked = districts
            .iter()
            .filter(|d| self.unlock.unlocked().contains(&d.key()))
            .count();

        ExplorationStats {
            explored_cells: cells.len(),
            revealed_points: self.revealed.len(),
            total_runs: self.runs.len(),
            total_distance_meters: self.runs.iter().map(|r| r.distance_meters).sum(),
            unlocked_districts: self.unlock.unlocked().len(),
            known_districts: districts.len(),
            known_unlocked,
        }
    }

    // ─── Districts ───────────────────────────────────────────────

    /// Normalize and install a payload, superseding any in-flight fetch.
    pub fn load_districts(&mut self, payload: &OsmPayload, origin: Option<GeoPoint>) -> usize {
        let districts = normalize(payload);
        let count = districts.len();
        self.districts.replace(districts, origin);
        count
    }

    pub fn plan_district_fetch(&mut self, position: &GeoPoint) -> Option<FetchTicket> {
        self.districts.plan_fetch(position)
    }

    pub fn begin_district_fetch(&mut self, position: &GeoPoint) -> FetchTicket {
        self.districts.begin_fetch(position)
    }

    /// Install a fetch result. Returns `None` if the fetch was superseded.
    pub fn complete_district_fetch(
        &mut self,
        ticket: &FetchTicket,
        payload: &OsmPayload,
    ) -> Option<usize> {
        let districts = normalize(payload);
        let count = districts.len();
        self.districts
            .complete_fetch(ticket, districts)
            .then_some(count)
    }

    pub fn abandon_district_fetch(&mut self, ticket: &FetchTicket) {
        self.districts.abandon_fetch(ticket);
    }

    /// Current districts as GeoJSON with per-district `unlocked` flags.
    pub fn districts_geojson(&self) -> geojson::FeatureCollection {
        let features = self
            .districts
            .districts()
            .iter()
            .map(|d| d.to_feature(self.unlock.unlocked().contains(&d.key())))
            .collect();
        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    // ─── Persistence ─────────────────────────────────────────────

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            revealed: self.revealed.clone(),
            runs: self.runs.clone(),
            unlocked: self.unlock.unlocked().to_set(),
            extras: self.extras.clone(),
        }
    }

    fn persist(&self) -> bool {
        match self.store.save(&self.snapshot()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save snapshot, continuing in memory");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::models::DistrictSource;
    use crate::services::tracker::Rejection;

    const T0: i64 = 1_700_000_000_000;

    fn square_district(id: i64, name: &str, lat: f64, lng: f64, half: f64) -> District {
        let ring = Polygon::new(vec![
            GeoPoint::new(lat - half, lng - half),
            GeoPoint::new(lat - half, lng + half),
            GeoPoint::new(lat + half, lng + half),
            GeoPoint::new(lat + half, lng - half),
        ])
        .unwrap();
        District::new(id, name.to_string(), vec![ring], None, DistrictSource::Way).unwrap()
    }

    fn fix(lat: f64, lng: f64, t: i64) -> GpsFix {
        GpsFix {
            lat,
            lng,
            accuracy: None,
            t: Some(t),
        }
    }

    fn session() -> Session {
        Session::load(&Config::default(), JsonStore::in_memory(), Notifier::default())
    }

    #[test]
    fn test_fix_while_idle_is_rejected() {
        let mut s = session();
        let report = s.ingest_fix(fix(37.0, -122.0, T0), T0);
        assert_eq!(report.outcome, FixOutcome::Rejected(Rejection::NotRunning));
        assert!(s.revealed().is_empty());
    }

    #[test]
    fn test_accepted_fix_unlocks_once() {
        let mut s = session();
        s.districts
            .replace(vec![square_district(7, "Downtown", 37.0, -122.0, 0.01)], None);
        let mut rx = s.notifier().subscribe();

        assert!(s.start_run(T0));
        let first = s.ingest_fix(fix(37.0, -122.0, T0), T0);
        assert!(first.outcome.is_accepted());
        assert_eq!(first.unlocked.len(), 1);
        assert_eq!(first.unlocked[0].name, "Downtown");
        assert!(first.saved);

        // ~11 m north, still inside
        let second = s.ingest_fix(fix(37.0001, -122.0, T0 + 5_000), T0 + 5_000);
        assert!(second.outcome.is_accepted());
        assert!(second.unlocked.is_empty());
        assert!(s.unlocked().contains("7"));

        assert!(matches!(
            rx.try_recv(),
            Ok(Notification::RunStarted { started_at: T0 })
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(Notification::DistrictUnlocked { .. })
        ));
    }

    #[test]
    fn test_stop_records_run_and_keeps_trail() {
        let mut s = session();
        s.start_run(T0);
        s.ingest_fix(fix(37.0, -122.0, T0), T0);
        s.ingest_fix(fix(37.0001, -122.0, T0 + 10_000), T0 + 10_000);
        let report = s.stop_run(T0 + 20_000);
        let run = report.summary.expect("run recorded");
        assert_eq!(run.points.len(), 2);
        assert_eq!(s.runs().len(), 1);
        assert_eq!(s.revealed().len(), 2);
        assert_eq!(s.run_state(), RunState::Idle);
    }

    #[test]
    fn test_single_point_run_discarded_but_revealed() {
        let mut s = session();
        s.start_run(T0);
        s.ingest_fix(fix(37.0, -122.0, T0), T0);
        let report = s.stop_run(T0 + 1_000);
        assert!(report.summary.is_none());
        assert!(s.runs().is_empty());
        assert_eq!(s.revealed().len(), 1);
    }

    #[test]
    fn test_state_survives_reload() {
        let store = JsonStore::in_memory();
        let config = Config::default();
        {
            let mut s = Session::load(&config, store.clone(), Notifier::default());
            s.districts
                .replace(vec![square_district(3, "Mission", 37.0, -122.0, 0.01)], None);
            s.start_run(T0);
            s.ingest_fix(fix(37.0, -122.0, T0), T0);
            s.ingest_fix(fix(37.0002, -122.0, T0 + 10_000), T0 + 10_000);
            s.stop_run(T0 + 10_000);
        }
        let s = Session::load(&config, store, Notifier::default());
        assert_eq!(s.revealed().len(), 2);
        assert_eq!(s.runs().len(), 1);
        assert!(s.unlocked().contains("3"));
        assert_eq!(s.revealed_in(&Bounds::new(36.99, -122.01, 37.01, -121.99)).len(), 2);
    }

    #[test]
    fn test_save_failure_reported_not_fatal() {
        let blocker = std::env::temp_dir().join(format!("fogwalk-blocker-{}", std::process::id()));
        std::fs::write(&blocker, "x").unwrap();
        let store = JsonStore::open(blocker.join("snapshot.json"));

        let mut s = Session::load(&Config::default(), store, Notifier::default());
        s.start_run(T0);
        let report = s.ingest_fix(fix(37.0, -122.0, T0), T0);
        assert!(report.outcome.is_accepted());
        assert!(!report.saved);
        assert_eq!(s.revealed().len(), 1);
        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn test_reset_keeps_runs_and_unlocks() {
        let mut s = session();
        s.districts
            .replace(vec![square_district(1, "A", 37.0, -122.0, 0.01)], None);
        s.start_run(T0);
        s.ingest_fix(fix(37.0, -122.0, T0), T0);
        s.ingest_fix(fix(37.0002, -122.0, T0 + 10_000), T0 + 10_000);
        s.stop_run(T0 + 10_000);

        assert!(s.reset_trail());
        assert!(s.revealed().is_empty());
        assert!(s.revealed_in(&Bounds::new(36.0, -123.0, 38.0, -121.0)).is_empty());
        assert_eq!(s.runs().len(), 1);
        assert!(s.unlocked().contains("1"));
    }

    #[test]
    fn test_import_replaces_and_rejects_bad_documents() {
        let mut s = session();
        s.start_run(T0);
        s.ingest_fix(fix(10.0, 10.0, T0), T0);

        assert!(s.import(r#"{"revealed": "nope", "runs": []}"#).is_err());
        assert_eq!(s.revealed().len(), 1);

        let summary = s
            .import(r#"{"revealed": [{"lat": 1.0, "lng": 2.0}, {"lat": 1.0, "lng": 2.001}], "runs": []}"#)
            .unwrap();
        assert_eq!(summary.revealed, 2);
        assert_eq!(s.revealed()[0], GeoPoint::new(1.0, 2.0));
        assert!(s.revealed_in(&Bounds::new(10.0, 10.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_stats_counts_cells() {
        let mut s = session();
        s.districts.replace(
            vec![
                square_district(1, "A", 37.0, -122.0, 0.01),
                square_district(2, "B", 38.0, -122.0, 0.01),
            ],
            None,
        );
        s.start_run(T0);
        s.ingest_fix(fix(37.0, -122.0, T0), T0);
        // Same 4-decimal cell as the first point, but far enough to accept.
        s.ingest_fix(fix(37.00003, -122.0, T0 + 5_000), T0 + 5_000);
        s.ingest_fix(fix(37.001, -122.0, T0 + 60_000), T0 + 60_000);

        let stats = s.stats();
        assert_eq!(stats.revealed_points, 3);
        assert_eq!(stats.explored_cells, 2);
        assert_eq!(stats.known_districts, 2);
        assert_eq!(stats.unlocked_districts, 1);
        assert_eq!(stats.known_unlocked, 1);
    }

    #[test]
    fn test_stale_fetch_discarded() {
        let mut s = session();
        let origin = GeoPoint::new(37.0, -122.0);
        let first = s.begin_district_fetch(&origin);
        let second = s.begin_district_fetch(&GeoPoint::new(38.0, -122.0));

        let payload = OsmPayload::parse(
            r#"{"elements": [{"type": "way", "id": 5, "tags": {"name": "Old"},
                "geometry": [{"lat": 37.0, "lon": -122.0}, {"lat": 37.0, "lon": -121.99},
                             {"lat": 37.01, "lon": -121.99}, {"lat": 37.0, "lon": -122.0}]}]}"#,
        )
        .unwrap();
        assert_eq!(s.complete_district_fetch(&first, &payload), None);
        assert!(s.districts().is_empty());
        assert_eq!(s.complete_district_fetch(&second, &payload), Some(1));
        assert_eq!(s.districts_geojson().features.len(), 1);
    }

    #[test]
    fn test_export_shape() {
        let mut s = session();
        s.start_run(T0);
        s.ingest_fix(fix(37.0, -122.0, T0), T0);
        let doc = s.export(T0);
        assert_eq!(doc.revealed.len(), 1);
        assert!(doc.runs.is_empty());
        assert_eq!(doc.exported_at.as_deref(), Some("2023-11-14T22:13:20Z"));
    }
}
