//! Consumer and persistence boundary for the urania chart core.
//!
//! The core computes; this crate validates consumer input, persists
//! snapshots through the [`store::ChartStore`] collaborator, and exposes
//! the chart and forecasting operations an API layer calls.

pub mod service;
pub mod store;

pub use service::{BirthInput, ChartService, StoredChart};
pub use store::{decode_snapshot, encode_snapshot, ChartRecord, ChartStore, InMemoryChartStore};
