use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{seconds, Throttle};

/// Request gate shared by every fetch of a crawl.
///
/// Clones share the same gate, so the overall request rate stays bounded no
/// matter how many fetches run concurrently.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    gate: Arc<Gate>,
}

#[derive(Debug)]
enum Gate {
    Open,
    Interval {
        period: Duration,
        next_slot: Mutex<Option<Instant>>,
    },
    Bucket {
        permits: Arc<Semaphore>,
    },
}

impl RateLimiter {
    pub fn unlimited() -> Self {
        Self {
            gate: Arc::new(Gate::Open),
        }
    }

    /// Consecutive acquisitions are at least `period` apart.
    pub fn interval(period: Duration) -> Self {
        if period.is_zero() {
            return Self::unlimited();
        }
        Self {
            gate: Arc::new(Gate::Interval {
                period,
                next_slot: Mutex::new(None),
            }),
        }
    }

    /// At most `per_second` acquisitions per second.
    ///
    /// Must be called within a tokio runtime, permits are refilled by a background
    /// task that ends once the last clone of this limiter is dropped.
    pub fn per_second(per_second: usize) -> Self {
        let permits = Arc::new(Semaphore::new(per_second));

        let refill = Arc::downgrade(&permits);
        tokio::spawn(async move {
            let mut ticks = time::interval(Duration::from_secs(1));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks.tick().await;
            loop {
                ticks.tick().await;
                match Weak::upgrade(&refill) {
                    Some(permits) => {
                        let available = permits.available_permits();
                        permits.add_permits(per_second.saturating_sub(available));
                    }
                    None => break,
                }
            }
        });

        Self {
            gate: Arc::new(Gate::Bucket { permits }),
        }
    }

    /// Waits until the next request is allowed.
    pub async fn acquire(&self) {
        match self.gate.as_ref() {
            Gate::Open => (),
            Gate::Interval { period, next_slot } => {
                let slot = {
                    let mut next_slot = next_slot.lock().await;
                    let now = Instant::now();
                    let slot = next_slot.map_or(now, |next| next.max(now));
                    *next_slot = Some(slot + *period);
                    slot
                };
                time::sleep_until(slot).await;
            }
            Gate::Bucket { permits } => {
                if let Ok(permit) = permits.acquire().await {
                    permit.forget();
                }
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl From<Option<Throttle>> for RateLimiter {
    fn from(throttle: Option<Throttle>) -> Self {
        match throttle {
            None => Self::unlimited(),
            Some(Throttle::PerSecond(n)) => Self::per_second(n.get()),
            Some(Throttle::Delay(secs)) => match seconds(secs) {
                Some(period) => Self::interval(period),
                None => {
                    log::warn!("Ignoring invalid throttle delay {secs}, requests are unlimited");
                    Self::unlimited()
                }
            },
        }
    }
}
