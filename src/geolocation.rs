//! Bounded-time geolocation acquisition.
//!
//! `acquire_location` never fails: capability absence, sensor errors,
//! and deadline expiry all collapse into [`LocationFix::FALLBACK`], so
//! alert dispatch always has a value to send. A missing fix is strictly
//! better than a failed alert.

use std::time::Duration;

use thiserror::Error;

use crate::models::LocationFix;

/// A sensor-level failure. Absorbed by [`acquire_location`]; never
/// reaches dispatch code.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Injectable capability interface over the device location sensor.
#[allow(async_fn_in_trait)] // static dispatch only
pub trait LocationProvider {
    /// Whether the device exposes a location sensor at all. A `false`
    /// here is a capability check, not a failure — no request is made.
    fn is_supported(&self) -> bool;

    /// Request a single fix. May take arbitrarily long; the caller
    /// bounds it with a deadline.
    async fn current_fix(&self) -> Result<LocationFix, SensorError>;
}

/// Acquire a location fix within `deadline`, or fall back.
///
/// Always resolves to a usable [`LocationFix`] within `deadline` plus
/// scheduling slack; never returns an error.
pub async fn acquire_location<L: LocationProvider>(
    provider: &L,
    deadline: Duration,
) -> LocationFix {
    if !provider.is_supported() {
        tracing::warn!("no location capability, using fallback fix");
        return LocationFix::FALLBACK;
    }

    match tokio::time::timeout(deadline, provider.current_fix()).await {
        Ok(Ok(fix)) => fix,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "location sensor failed, using fallback fix");
            LocationFix::FALLBACK
        }
        Err(_) => {
            tracing::warn!(
                deadline_secs = deadline.as_secs(),
                "location fix timed out, using fallback fix"
            );
            LocationFix::FALLBACK
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Providers
// ═══════════════════════════════════════════════════════════

/// Provider returning a fixed coordinate, optionally after a delay.
/// The deterministic double for dispatch tests.
pub struct FixedLocationProvider {
    fix: LocationFix,
    delay: Option<Duration>,
}

impl FixedLocationProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            fix: LocationFix {
                latitude,
                longitude,
            },
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl LocationProvider for FixedLocationProvider {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_fix(&self) -> Result<LocationFix, SensorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.fix)
    }
}

/// Provider for devices without a location sensor.
pub struct UnsupportedLocationProvider;

impl LocationProvider for UnsupportedLocationProvider {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_fix(&self) -> Result<LocationFix, SensorError> {
        Err(SensorError::Unavailable("no sensor present".into()))
    }
}

/// Provider simulating a user who denied the location permission.
pub struct DenyingLocationProvider;

impl LocationProvider for DenyingLocationProvider {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_fix(&self) -> Result<LocationFix, SensorError> {
        Err(SensorError::PermissionDenied)
    }
}

/// Provider whose fix never arrives. Exercises the deadline path.
pub struct StalledLocationProvider;

impl LocationProvider for StalledLocationProvider {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_fix(&self) -> Result<LocationFix, SensorError> {
        std::future::pending().await
    }
}
