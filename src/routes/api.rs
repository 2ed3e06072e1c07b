// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Engine API routes.

use crate::error::{AppError, Result};
use crate::geometry::{Bounds, GeoPoint};
use crate::models::{ExportDocument, OsmPayload, RunSummary};
use crate::services::fog::strokes_in_view;
use crate::services::{
    ExplorationStats, FetchTicket, FixReport, GpsFix, ImportSummary, Notification, RunState,
    Session, StopReport,
};
use crate::time_utils::now_millis;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest trail window served in one request, in degrees per side.
const MAX_TRAIL_WINDOW_DEGREES: f64 = 2.0;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/run/start", post(start_run))
        .route("/api/run/stop", post(stop_run))
        .route("/api/fix", post(ingest_fix))
        .route("/api/districts", get(get_districts).post(load_districts))
        .route("/api/districts/refresh", post(refresh_districts))
        .route("/api/runs", get(get_runs))
        .route("/api/runs/{id}", get(get_run))
        .route("/api/stats", get(get_stats))
        .route("/api/trail", get(get_trail))
        .route("/api/export", get(export_trail))
        .route("/api/import", post(import_trail))
        .route("/api/reset", post(reset_trail))
        .route("/api/events", get(events))
}

/// Run a session event on the blocking pool, since it may rewrite the
/// snapshot file before returning.
async fn with_session_blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T>
where
    F: FnOnce(&mut Session) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || {
        let mut session = state.session.blocking_lock();
        f(&mut *session)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))
}

// ─── Run Lifecycle ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StartResponse {
    /// `false` if a run was already active.
    pub started: bool,
    pub state: RunState,
}

async fn start_run(State(state): State<Arc<AppState>>) -> Json<StartResponse> {
    let mut session = state.session.lock().await;
    let started = session.start_run(now_millis());
    Json(StartResponse {
        started,
        state: session.run_state(),
    })
}

async fn stop_run(State(state): State<Arc<AppState>>) -> Result<Json<StopReport>> {
    let now = now_millis();
    let report = with_session_blocking(&state, move |session| session.stop_run(now)).await?;
    Ok(Json(report))
}

// ─── Fix Ingestion ───────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct FixRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[validate(range(min = 0.0))]
    pub accuracy: Option<f64>,
    pub t: Option<i64>,
}

impl From<FixRequest> for GpsFix {
    fn from(req: FixRequest) -> Self {
        GpsFix {
            lat: req.lat,
            lng: req.lng,
            accuracy: req.accuracy,
            t: req.t,
        }
    }
}

/// Feed one GPS fix to the engine.
///
/// An accepted fix far from the loaded district area kicks off a background
/// district fetch when auto-fetch is enabled.
async fn ingest_fix(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FixRequest>,
) -> Result<Json<FixReport>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid fix: {}", e)))?;
    let fix = GpsFix::from(req);

    let now = now_millis();
    let auto_fetch = state.config.auto_fetch_districts;
    let (report, ticket) = with_session_blocking(&state, move |session| {
        let report = session.ingest_fix(fix, now);
        let ticket = if report.outcome.is_accepted() && auto_fetch {
            session.plan_district_fetch(&GeoPoint::new(fix.lat, fix.lng))
        } else {
            None
        };
        (report, ticket)
    })
    .await?;

    if let Some(ticket) = ticket {
        tokio::spawn(run_district_fetch(state.clone(), ticket));
    }

    Ok(Json(report))
}

/// Fetch outside the session lock, then hand the result back by ticket.
async fn run_district_fetch(state: Arc<AppState>, ticket: FetchTicket) -> Option<usize> {
    let result = state.overpass.fetch(&ticket.bounds).await;
    let mut session = state.session.lock().await;
    match result {
        Ok(payload) => session.complete_district_fetch(&ticket, &payload),
        Err(e) => {
            tracing::warn!(
                error = %e,
                generation = ticket.generation,
                "District fetch failed, keeping current set"
            );
            session.abandon_district_fetch(&ticket);
            None
        }
    }
}

// ─── Districts ───────────────────────────────────────────────

async fn get_districts(State(state): State<Arc<AppState>>) -> Json<geojson::FeatureCollection> {
    let session = state.session.lock().await;
    Json(session.districts_geojson())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DistrictsLoaded {
    pub count: usize,
    /// Elements skipped because they could not be decoded.
    pub dropped: usize,
}

/// Install a raw boundary payload (`{ "elements": [...] }`) directly.
async fn load_districts(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<DistrictsLoaded>> {
    let payload = OsmPayload::parse(&body)?;
    let mut session = state.session.lock().await;
    let count = session.load_districts(&payload, None);
    Ok(Json(DistrictsLoaded {
        count,
        dropped: payload.dropped,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// Fetch even if the position is near the loaded area.
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RefreshResponse {
    /// `false` when the current set already covers the position.
    pub fetched: bool,
    pub count: usize,
}

async fn refresh_districts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid position: {}", e)))?;
    let position = GeoPoint::new(req.lat, req.lng);

    let ticket = {
        let mut session = state.session.lock().await;
        let ticket = if req.force {
            Some(session.begin_district_fetch(&position))
        } else {
            session.plan_district_fetch(&position)
        };
        match ticket {
            Some(ticket) => ticket,
            None => {
                return Ok(Json(RefreshResponse {
                    fetched: false,
                    count: session.districts().len(),
                }))
            }
        }
    };

    let payload = match state.overpass.fetch(&ticket.bounds).await {
        Ok(payload) => payload,
        Err(e) => {
            state.session.lock().await.abandon_district_fetch(&ticket);
            return Err(e.into());
        }
    };

    let mut session = state.session.lock().await;
    let count = session
        .complete_district_fetch(&ticket, &payload)
        .ok_or_else(|| AppError::Conflict("Superseded by a newer district fetch".to_string()))?;
    Ok(Json(RefreshResponse {
        fetched: true,
        count,
    }))
}

// ─── History & Stats ─────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunListItem {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub started_at: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub ended_at: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_ms: i64,
    pub distance_meters: f64,
    pub point_count: usize,
    /// Google encoded polyline, precision 5.
    pub polyline: Option<String>,
}

impl From<&RunSummary> for RunListItem {
    fn from(run: &RunSummary) -> Self {
        RunListItem {
            id: run.id.clone(),
            started_at: run.started_at,
            ended_at: run.ended_at,
            duration_ms: run.duration_ms(),
            distance_meters: run.distance_meters,
            point_count: run.points.len(),
            polyline: run.encoded_polyline(),
        }
    }
}

/// Run history, newest first.
async fn get_runs(State(state): State<Arc<AppState>>) -> Json<Vec<RunListItem>> {
    let session = state.session.lock().await;
    Json(session.runs().iter().rev().map(RunListItem::from).collect())
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RunSummary>> {
    let session = state.session.lock().await;
    session
        .runs()
        .iter()
        .find(|run| run.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Run {} not found", id)))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ExplorationStats> {
    Json(state.session.lock().await.stats())
}

// ─── Trail ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TrailResponse {
    /// Revealed points in buckets overlapping the window (unordered).
    pub points: Vec<GeoPoint>,
    /// Ordered polylines to clear, split at gaps.
    pub strokes: Vec<Vec<GeoPoint>>,
}

async fn get_trail(
    State(state): State<Arc<AppState>>,
    Query(bounds): Query<Bounds>,
) -> Result<Json<TrailResponse>> {
    if !bounds.is_valid() {
        return Err(AppError::BadRequest(
            "Invalid window: need minlat <= maxlat and minlon <= maxlon".to_string(),
        ));
    }
    if bounds.max_lat - bounds.min_lat > MAX_TRAIL_WINDOW_DEGREES
        || bounds.max_lng - bounds.min_lng > MAX_TRAIL_WINDOW_DEGREES
    {
        return Err(AppError::BadRequest(format!(
            "Window too large: at most {} degrees per side",
            MAX_TRAIL_WINDOW_DEGREES
        )));
    }

    let session = state.session.lock().await;
    Ok(Json(TrailResponse {
        points: session.revealed_in(&bounds),
        strokes: strokes_in_view(session.revealed(), &bounds),
    }))
}

async fn export_trail(State(state): State<Arc<AppState>>) -> Json<ExportDocument> {
    Json(state.session.lock().await.export(now_millis()))
}

async fn import_trail(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ImportSummary>> {
    let summary = with_session_blocking(&state, move |session| session.import(&body)).await??;
    Ok(Json(summary))
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub saved: bool,
}

async fn reset_trail(State(state): State<Arc<AppState>>) -> Result<Json<ResetResponse>> {
    let saved = with_session_blocking(&state, Session::reset_trail).await?;
    Ok(Json(ResetResponse { saved }))
}

// ─── Notifications ───────────────────────────────────────────

/// Server-sent event stream of gameplay notifications.
async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.notifier.subscribe();
    Sse::new(notification_stream(rx)).keep_alive(KeepAlive::default())
}

fn notification_stream(
    rx: broadcast::Receiver<Notification>,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    let event = match Event::default()
                        .event(notification.name())
                        .json_data(&notification)
                    {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to encode notification");
                            continue;
                        }
                    };
                    return Some((Ok(event), rx));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}
