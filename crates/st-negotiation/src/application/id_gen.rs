//! Offer id generation.
//!
//! Ids are `<prefix>-<unix millis>`. Two ids generated within the same
//! millisecond would collide, so the millisecond part is forced strictly
//! increasing within a process. Collisions across processes are left to
//! the ledger's duplicate-id check.

use crate::domain::OfferId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Client-side offer id generator.
#[derive(Debug)]
pub struct OfferIdGenerator {
    prefix: String,
    last: AtomicU64,
}

impl OfferIdGenerator {
    /// Create a generator with an id prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last: AtomicU64::new(0),
        }
    }

    /// Next id.
    pub fn next_id(&self) -> OfferId {
        let millis = self.next_millis(now_millis());
        OfferId::new(format!("{}-{}", self.prefix, millis))
    }

    fn next_millis(&self, now: u64) -> u64 {
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = if now > last { now } else { last + 1 };
            match self
                .last
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
