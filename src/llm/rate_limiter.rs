// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pacing for batched embedding requests

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::sync::Arc;
use std::time::Duration;

/// Spaces consecutive embedding batches at least `delay` apart
///
/// The first batch goes out immediately.
#[derive(Clone)]
pub struct BatchPacer {
    limiter: Option<Arc<GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    delay: Duration,
}

impl BatchPacer {
    /// Create a new pacer; a zero delay disables pacing
    pub fn new(delay: Duration) -> Self {
        let limiter = Quota::with_period(delay).map(|quota| Arc::new(GovRateLimiter::direct(quota)));

        Self { limiter, delay }
    }

    /// Wait until the next batch may be sent
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Get the configured spacing between batches
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }
}
