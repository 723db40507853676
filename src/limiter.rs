//! Token-bucket gate for outbound chatter.
//!
//! One shared limiter sits in front of channel messages so the bot cannot
//! flood. There is no queue: an emission either takes a token now or is
//! dropped by the caller.

use std::sync::Mutex;
use std::time::Instant;

/// Default burst capacity: one message.
const DEFAULT_CAPACITY: f64 = 1.0;

/// Default refill rate: half a token per second, one message per 2 s sustained.
const DEFAULT_REFILL_PER_SEC: f64 = 0.5;

/// A token bucket with capacity, steady refill, and consume-or-deny semantics.
///
/// Interior mutability so the session dispatcher and the feed poller can share
/// one instance behind an `Arc`. Tokens never exceed capacity.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a limiter with the given burst capacity and refill rate.
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            capacity,
            refill_per_sec,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// The production configuration: burst 1, refill 0.5 tokens/s.
    pub fn chat_default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_REFILL_PER_SEC)
    }

    /// Try to consume one token. `true` means the caller may emit now;
    /// `false` means the message must be dropped — never queued.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Clock-parameterized variant of [`allow`](Self::allow) for deterministic tests.
    fn allow_at(&self, now: Instant) -> bool {
        let mut bucket = match self.bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens =
            (bucket.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
