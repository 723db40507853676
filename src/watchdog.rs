//! Liveness watchdog: kill the process when the connection goes silent.
//!
//! Some disconnects never surface as read errors — the socket just stops
//! carrying traffic. The watchdog ticks once a second and compares now
//! against the last inbound message; past the limit it aborts the whole
//! process, unconditionally. Restart belongs to the external supervisor.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::error;

/// Maximum tolerated inbound silence before the process dies.
pub const SILENCE_LIMIT: Duration = Duration::from_secs(5 * 60);

/// Watchdog timer period.
const TICK: Duration = Duration::from_secs(1);

/// Shared "time of last inbound message" record.
///
/// Written by the session dispatcher on every inbound message, read by the
/// watchdog loop.
#[derive(Debug)]
pub struct Liveness {
    last_inbound: Mutex<Instant>,
}

impl Liveness {
    /// Start the clock at "now" — connection setup counts as activity.
    pub fn new() -> Self {
        Self {
            last_inbound: Mutex::new(Instant::now()),
        }
    }

    /// Record inbound activity, restarting the silence window.
    pub fn beat(&self) {
        self.beat_at(Instant::now());
    }

    /// How long the connection has been silent.
    pub fn silence(&self) -> Duration {
        self.silence_at(Instant::now())
    }

    fn beat_at(&self, now: Instant) {
        let mut last = match self.last_inbound.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = now;
    }

    fn silence_at(&self, now: Instant) -> Duration {
        let last = match self.last_inbound.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        now.saturating_duration_since(*last)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the watchdog loop forever.
///
/// The only component allowed to terminate the process: exceeding
/// [`SILENCE_LIMIT`] exits with status 1 immediately — no draining, no
/// cleanup, no reconnect.
pub async fn run(liveness: Arc<Liveness>) {
    let mut interval = tokio::time::interval(TICK);
    loop {
        interval.tick().await;
        let silence = liveness.silence();
        if silence > SILENCE_LIMIT {
            error!(
                silence_secs = silence.as_secs(),
                "too long since the last IRC message, blowing up"
            );
            std::process::exit(1);
        }
    }
}
