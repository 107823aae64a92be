//! SOS dispatch state machine.
//!
//! Sequences contact-count lookup, location acquisition, alert
//! submission, and the device-dial handoff. The state lives in a
//! `Mutex` cell tagged with a dialog epoch: every open/dismiss bumps
//! the epoch, so async work finishing after the dialog went away
//! compares epochs and discards its result instead of mutating state.
//!
//! Invariants:
//! - steps are strictly sequential; the re-entrancy guard ignores
//!   confirm while Locating or Sending (no duplicate submissions);
//! - the dial handoff fires exactly once per server-acknowledged send,
//!   and never after a failed one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::config;
use crate::error::GatewayError;
use crate::gateway::HealthGateway;
use crate::geolocation::{acquire_location, LocationProvider};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Observable dispatcher state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SosState {
    /// No dialog open.
    Idle,
    /// Dialog open, awaiting user confirmation. The count is
    /// best-effort — zero until (and unless) the lookup lands.
    Confirming { contact_count: usize },
    /// Acquiring a location fix under the deadline.
    Locating,
    /// Alert submission in flight. Dismissal is refused here.
    Sending,
    /// Server acknowledged; dial handoff scheduled.
    Sent,
}

impl std::fmt::Display for SosState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Confirming { contact_count } => {
                write!(f, "confirming ({contact_count} contacts)")
            }
            Self::Locating => write!(f, "locating"),
            Self::Sending => write!(f, "sending"),
            Self::Sent => write!(f, "sent"),
        }
    }
}

/// Ties async completions to the dialog session that started them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogToken {
    epoch: u64,
}

/// What a confirm attempt did.
#[derive(Debug)]
pub enum SendOutcome {
    /// Alert acknowledged by the gateway; dial handoff fired.
    Delivered,
    /// Submission failed; dispatcher returned to `Confirming` so the
    /// user may retry. No automatic retry.
    Failed(GatewayError),
    /// Guard hit: not in a confirmable state, or a stale token.
    Ignored,
    /// Dialog was dismissed while locating; nothing was sent.
    Abandoned,
}

/// Device-level emergency dial action. The shell supplies the real
/// implementation; this core only guarantees when it fires.
pub trait EmergencyDialer {
    fn dial(&self, number: &str);
}

/// Dialer that records the handoff in the log. Placeholder wiring for
/// shells that have no dial capability.
pub struct LoggingDialer;

impl EmergencyDialer for LoggingDialer {
    fn dial(&self, number: &str) {
        tracing::info!(number, "emergency dial handoff");
    }
}

/// Test double counting dial handoffs. Clone shares the counter.
#[derive(Clone, Default)]
pub struct CountingDialer {
    calls: Arc<AtomicUsize>,
    last_number: Arc<Mutex<Option<String>>>,
}

impl CountingDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_number(&self) -> Option<String> {
        self.last_number.lock().unwrap().clone()
    }
}

impl EmergencyDialer for CountingDialer {
    fn dial(&self, number: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_number.lock().unwrap() = Some(number.to_string());
    }
}

// ═══════════════════════════════════════════════════════════
// SosDispatcher
// ═══════════════════════════════════════════════════════════

struct Cell {
    state: SosState,
    epoch: u64,
}

/// The dispatcher. Methods take `&self`; share it in an `Arc` when the
/// shell drives confirm and dismiss from separate tasks.
pub struct SosDispatcher<G, L, D>
where
    G: HealthGateway,
    L: LocationProvider,
    D: EmergencyDialer,
{
    gateway: G,
    location: L,
    dialer: D,
    locate_deadline: Duration,
    handoff_delay: Duration,
    cell: Mutex<Cell>,
}

impl<G, L, D> SosDispatcher<G, L, D>
where
    G: HealthGateway,
    L: LocationProvider,
    D: EmergencyDialer,
{
    pub fn new(gateway: G, location: L, dialer: D) -> Self {
        Self::with_timings(
            gateway,
            location,
            dialer,
            config::GEOLOCATION_DEADLINE,
            config::DIAL_HANDOFF_DELAY,
        )
    }

    /// Constructor with explicit deadlines, for tests.
    pub fn with_timings(
        gateway: G,
        location: L,
        dialer: D,
        locate_deadline: Duration,
        handoff_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            location,
            dialer,
            locate_deadline,
            handoff_delay,
            cell: Mutex::new(Cell {
                state: SosState::Idle,
                epoch: 0,
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SosState {
        self.cell.lock().unwrap().state.clone()
    }

    /// Open the alert dialog. Only valid from `Idle`; returns the token
    /// that keys this dialog session's async completions.
    pub fn open(&self) -> Option<DialogToken> {
        let mut cell = self.cell.lock().unwrap();
        if cell.state != SosState::Idle {
            return None;
        }
        cell.epoch += 1;
        cell.state = SosState::Confirming { contact_count: 0 };
        Some(DialogToken { epoch: cell.epoch })
    }

    /// Best-effort contact-count lookup for the open dialog.
    ///
    /// Failure is non-fatal (the count stays zero) and a completion
    /// arriving after the dialog was dismissed or reopened is discarded.
    /// Returns the applied count, or `None` if it was discarded.
    pub async fn load_contact_count(&self, token: DialogToken) -> Option<usize> {
        let count = match self.gateway.fetch_contacts().await {
            Ok(contacts) => contacts.len(),
            Err(e) => {
                tracing::warn!(error = %e, "contact-count lookup failed, keeping zero");
                return None;
            }
        };

        let mut cell = self.cell.lock().unwrap();
        if cell.epoch != token.epoch {
            tracing::debug!("contact count arrived for a closed dialog, discarding");
            return None;
        }
        if let SosState::Confirming { .. } = cell.state {
            cell.state = SosState::Confirming {
                contact_count: count,
            };
            Some(count)
        } else {
            None
        }
    }

    /// Close the dialog. Allowed everywhere except `Sending`; bumps the
    /// epoch so in-flight lookups and geolocation are abandoned.
    pub fn dismiss(&self) -> bool {
        let mut cell = self.cell.lock().unwrap();
        match cell.state {
            SosState::Sending => false,
            SosState::Idle => true,
            _ => {
                cell.epoch += 1;
                cell.state = SosState::Idle;
                true
            }
        }
    }

    /// User confirmed the send.
    ///
    /// Confirming → Locating → Sending → Sent, strictly sequential.
    /// Calls while Locating or Sending are ignored (re-entrancy guard).
    pub async fn confirm(&self, token: DialogToken) -> SendOutcome {
        // Guarded entry: claim the Locating step or bail.
        let contact_count = {
            let mut cell = self.cell.lock().unwrap();
            if cell.epoch != token.epoch {
                return SendOutcome::Ignored;
            }
            match cell.state {
                SosState::Confirming { contact_count } => {
                    cell.state = SosState::Locating;
                    contact_count
                }
                _ => return SendOutcome::Ignored,
            }
        };

        // Cannot fail: falls back to the sentinel fix on any trouble.
        let fix = acquire_location(&self.location, self.locate_deadline).await;

        {
            let mut cell = self.cell.lock().unwrap();
            if cell.epoch != token.epoch {
                // Dialog dismissed while locating — nothing was sent.
                return SendOutcome::Abandoned;
            }
            cell.state = SosState::Sending;
        }

        match self.gateway.send_sos(fix).await {
            Ok(()) => {
                self.cell.lock().unwrap().state = SosState::Sent;
                tracing::info!(
                    latitude = fix.latitude,
                    longitude = fix.longitude,
                    contact_count,
                    "sos alert delivered"
                );
                // Confirmation stays on screen briefly, then the device
                // dialer takes over. Exactly once per delivered send.
                tokio::time::sleep(self.handoff_delay).await;
                self.dialer.dial(config::EMERGENCY_NUMBER);
                SendOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(error = %e, "sos submission failed, back to confirming");
                self.cell.lock().unwrap().state = SosState::Confirming { contact_count };
                SendOutcome::Failed(e)
            }
        }
    }
}
