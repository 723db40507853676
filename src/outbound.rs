//! The one outbound funnel.
//!
//! Every component that emits — the session dispatcher and the feed poller —
//! holds a clone of [`Outbound`]. Chatter goes through [`Outbound::send_gated`]
//! and is dropped when the token bucket is empty; protocol control traffic and
//! feed announcements (which pace themselves) use [`Outbound::send`]. The
//! writer task behind the channel serializes actual socket writes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::irc::Message;
use crate::limiter::RateLimiter;

/// Shared handle for emitting protocol messages.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::Sender<Message>,
    limiter: Arc<RateLimiter>,
}

impl Outbound {
    /// Wrap the transport's outbound channel and the shared limiter.
    pub fn new(tx: mpsc::Sender<Message>, limiter: Arc<RateLimiter>) -> Self {
        Self { tx, limiter }
    }

    /// Emit unconditionally (control traffic, self-paced feed announcements).
    pub async fn send(&self, msg: Message) {
        if self.tx.send(msg).await.is_err() {
            // Writer task is gone; the dispatcher will exit when the read
            // side closes, or the watchdog will fire on silence.
            warn!("outbound channel closed, message lost");
        }
    }

    /// Emit only when the rate limiter grants a token; otherwise drop the
    /// message silently. Returns whether the message was emitted.
    pub async fn send_gated(&self, msg: Message) -> bool {
        if !self.limiter.allow() {
            debug!(command = %msg.command, "rate limiter dropped outbound message");
            return false;
        }
        self.send(msg).await;
        true
    }
}
