//! Storage layer (JSON snapshot file).

pub mod json_store;

pub use json_store::{JsonStore, StoreError};
