//! Core types and services for the vehicle registry and its compliance certificates.

/// Certificate reconciliation against the certificates list.
pub mod certificates;
/// Rules deciding which certificates a vehicle has to present.
pub mod eligibility;
/// Last-key memo guarding derived recomputations.
pub mod gate;
/// In-memory list store used by tests and offline runs.
pub mod memory;
/// Domain models shared by every store adapter.
pub mod model;
/// Traits describing the remote list store.
pub mod ports;
/// Filter and query values understood by every store adapter.
pub mod query;
/// High-level service facade used by clients.
pub mod service;
/// Issue and expiry date checks for drafted documents.
pub mod validity;
/// Vehicle lookups and upserts against the vehicles list.
pub mod vehicles;

pub use certificates::{CertificateService, DELETE_BATCH_SIZE, latest_per_kind};
pub use eligibility::*;
pub use gate::*;
pub use model::*;
pub use ports::*;
pub use query::*;
pub use service::*;
pub use validity::*;
pub use vehicles::VehicleService;
