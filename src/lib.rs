//! HealthMate client orchestration core.
//!
//! The framework-independent layer of the HealthMate client: a typed
//! gateway client plus three state machines — history aggregation with
//! optimistic deletion, SOS dispatch with bounded-time geolocation, and
//! the symptom-selection/prediction flow. A UI shell drives these
//! through explicit transition functions; no rendering lives here.

pub mod config;
pub mod error;
pub mod gateway;
pub mod geolocation;
pub mod history;
pub mod models;
pub mod sos;
pub mod symptoms;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a shell embedding this core.
///
/// Honors `RUST_LOG`, falling back to the crate default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
