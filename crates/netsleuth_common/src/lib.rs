//! netsleuth core - concurrent network-incident correlation.
//!
//! Given a user identity, queries the authentication/session manager (ISE)
//! and the wireless/client-health manager (DNA Center), normalizes their
//! XML/JSON payloads, enriches failures from the local failure catalog, and
//! assembles a single ordered diagnostic report.

pub mod config;
pub mod dnac;
pub mod engine;
pub mod error;
pub mod ise;
pub mod mac;
pub mod model;
pub mod normalize;
pub mod report;
pub mod store;

pub use config::{EngineConfig, EnvConfig};
pub use dnac::{DnacClient, HealthSource};
pub use engine::{macs_for_identity, Correlator};
pub use error::{ConfigError, EngineError, SourceError, StoreError};
pub use ise::{IseClient, SessionSource};
pub use mac::MacAddress;
pub use model::{
    DiagnosticReport, FailureDetail, HealthRecord, IssueEntry, IssueRecord, OrderedMap,
    SessionRecord, WirelessEntry,
};
pub use store::FailureStore;
