// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run state machine and GPS noise filtering.
//!
//! A fix is accepted when the tracker is running and either:
//! 1. it is the first point of the run, or
//! 2. the implied speed from the last accepted point is at most
//!    `max_speed_mps` and the step is at least `min_step_meters`.
//!
//! The speed check runs before the step check, so a far-and-fast fix is
//! reported as a jump rather than as jitter.

use crate::geometry::{haversine_meters, GeoPoint};
use crate::models::RunSummary;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Default jump threshold (m/s).
pub const DEFAULT_MAX_SPEED_MPS: f64 = 50.0;

/// Default jitter floor (m).
pub const DEFAULT_MIN_STEP_METERS: f64 = 2.0;

/// Filter thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub max_speed_mps: f64,
    pub min_step_meters: f64,
    /// Fixes reporting a worse accuracy radius are rejected. Off when `None`.
    pub max_accuracy_meters: Option<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_speed_mps: DEFAULT_MAX_SPEED_MPS,
            min_step_meters: DEFAULT_MIN_STEP_METERS,
            max_accuracy_meters: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RunState {
    Idle,
    Running,
}

/// Why a fix was not incorporated. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Rejection {
    NotRunning,
    InvalidPosition,
    GpsJump { speed_mps: f64 },
    TooSmall { distance_meters: f64 },
    LowAccuracy { accuracy_meters: f64 },
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::NotRunning => "not_running",
            Rejection::InvalidPosition => "invalid_position",
            Rejection::GpsJump { .. } => "gps_jump",
            Rejection::TooSmall { .. } => "too_small",
            Rejection::LowAccuracy { .. } => "low_accuracy",
        }
    }
}

/// Result of offering a fix to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FixOutcome {
    Accepted {
        /// Distance added to the run (0 for the first point).
        step_meters: f64,
    },
    Rejected(Rejection),
}

impl FixOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FixOutcome::Accepted { .. })
    }
}

/// Owns the current run's path and distance.
#[derive(Debug)]
pub struct RunTracker {
    config: TrackerConfig,
    state: RunState,
    path: Vec<GeoPoint>,
    distance_meters: f64,
    started_at: i64,
}

impl RunTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
            path: Vec::new(),
            distance_meters: 0.0,
            started_at: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn started_at(&self) -> Option<i64> {
        self.is_running().then_some(self.started_at)
    }

    /// Idle -> Running. Returns `false` (and changes nothing) if already running.
    pub fn start(&mut self, now_ms: i64) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = RunState::Running;
        self.path.clear();
        self.distance_meters = 0.0;
        self.started_at = now_ms;
        true
    }

    /// Offer a fix. `accuracy` is the provider's reported radius, if any.
    ///
    /// Points without a timestamp are compared as if 1 ms had elapsed.
    pub fn accept_point(&mut self, p: GeoPoint, accuracy: Option<f64>) -> FixOutcome {
        if !self.is_running() {
            return FixOutcome::Rejected(Rejection::NotRunning);
        }
        if !p.is_valid() {
            return FixOutcome::Rejected(Rejection::InvalidPosition);
        }

        if let (Some(limit), Some(acc)) = (self.config.max_accuracy_meters, accuracy) {
            if acc > limit {
                return FixOutcome::Rejected(Rejection::LowAccuracy {
                    accuracy_meters: acc,
                });
            }
        }

        let Some(last) = self.path.last().copied() else {
            self.path.push(p);
            return FixOutcome::Accepted { step_meters: 0.0 };
        };

        let dt_ms = match (p.t, last.t) {
            (Some(now), Some(prev)) => now.saturating_sub(prev).max(1),
            _ => 1,
        };
        let d = haversine_meters(&last, &p);
        let speed = d / (dt_ms as f64 / 1000.0);

        if speed > self.config.max_speed_mps {
            return FixOutcome::Rejected(Rejection::GpsJump { speed_mps: speed });
        }
        if d < self.config.min_step_meters {
            return FixOutcome::Rejected(Rejection::TooSmall { distance_meters: d });
        }

        self.path.push(p);
        self.distance_meters += d;
        FixOutcome::Accepted { step_meters: d }
    }

    /// Running -> Idle. Runs with fewer than two accepted points are discarded.
    pub fn stop(&mut self, now_ms: i64) -> Option<RunSummary> {
        if !self.is_running() {
            return None;
        }
        self.state = RunState::Idle;
        let points = std::mem::take(&mut self.path);
        let distance_meters = std::mem::replace(&mut self.distance_meters, 0.0);

        if points.len() < 2 {
            tracing::debug!(points = points.len(), "Discarding false-start run");
            return None;
        }

        Some(RunSummary {
            id: format!("run-{}", self.started_at),
            started_at: self.started_at,
            ended_at: now_ms.max(self.started_at),
            distance_meters,
            points,
        })
    }
}
