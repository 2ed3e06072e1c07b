// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fogwalk: reveal the map by walking it.
//!
//! This crate provides the geospatial engine behind a fog-of-war exploration
//! game (trail reveal, district boundaries, unlock detection) and a small
//! HTTP API that drives it.

pub mod config;
pub mod db;
pub mod error;
pub mod geometry;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{Notifier, OverpassClient, Session};
use tokio::sync::Mutex;

/// Shared application state.
///
/// All engine events go through `session`, one at a time. Network fetches
/// run outside the lock and hand their result back through a ticket.
pub struct AppState {
    pub config: Config,
    pub session: Mutex<Session>,
    pub overpass: OverpassClient,
    pub notifier: Notifier,
}
