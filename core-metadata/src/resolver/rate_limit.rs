//! Minimum-interval throttle per external source class

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Default spacing between two grants for the same source class
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Group of outbound calls that share one throttle.
///
/// Usually one per remote service; constructed-link verification uses one
/// class per probed host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceClass(&'static str);

impl SourceClass {
    pub const MUSICBRAINZ: SourceClass = SourceClass("musicbrainz");
    pub const LASTFM: SourceClass = SourceClass("lastfm");
    pub const DISCOGS: SourceClass = SourceClass("discogs");
    pub const SPOTIFY: SourceClass = SourceClass("spotify");
    pub const LYRICS_OVH: SourceClass = SourceClass("lyrics.ovh");
    pub const LRCLIB: SourceClass = SourceClass("lrclib");
    pub const LOCAL_STORE: SourceClass = SourceClass("local-store");
    /// Umbrella class of the link-verification provider; each probe is
    /// throttled under its host class instead.
    pub const LINK_CHECK: SourceClass = SourceClass("link-check");
    pub const WIKIPEDIA: SourceClass = SourceClass("wikipedia");
    pub const GENIUS: SourceClass = SourceClass("genius");
    pub const LASTFM_WEB: SourceClass = SourceClass("last.fm");
    pub const BANDCAMP: SourceClass = SourceClass("bandcamp");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Per-class minimum-interval throttle.
///
/// `acquire` returns once at least the class interval has passed since the
/// previous grant for that class. Waiters on one class queue on a fair
/// mutex, so grants are handed out in arrival order. Classes never block
/// each other.
///
/// ## Usage
///
/// ```ignore
/// use core_metadata::resolver::{RateLimiter, SourceClass};
///
/// let limiter = RateLimiter::new(Duration::from_secs(1));
/// limiter.acquire(SourceClass::MUSICBRAINZ).await;
/// // first request
/// limiter.acquire(SourceClass::MUSICBRAINZ).await;
/// // second request, at least one second later
/// ```
pub struct RateLimiter {
    default_interval: Duration,
    overrides: HashMap<SourceClass, Duration>,
    slots: Mutex<HashMap<SourceClass, Arc<Mutex<Option<Instant>>>>>,
}

impl RateLimiter {
    /// Throttle every class to `interval`, except the local store and the
    /// umbrella link-check class, which are never delayed.
    pub fn new(interval: Duration) -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(SourceClass::LOCAL_STORE, Duration::ZERO);
        overrides.insert(SourceClass::LINK_CHECK, Duration::ZERO);

        Self {
            default_interval: interval,
            overrides,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// No delay for any class
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Override the interval of one class
    pub fn with_interval(mut self, class: SourceClass, interval: Duration) -> Self {
        self.overrides.insert(class, interval);
        self
    }

    pub fn interval_for(&self, class: SourceClass) -> Duration {
        self.overrides
            .get(&class)
            .copied()
            .unwrap_or(self.default_interval)
    }

    /// Wait until a call to `class` is allowed, then record the grant.
    pub async fn acquire(&self, class: SourceClass) {
        let interval = self.interval_for(class);
        if interval.is_zero() {
            return;
        }

        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(class).or_default())
        };

        let mut last_grant = slot.lock().await;
        if let Some(last) = *last_grant {
            let elapsed = last.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!(source = %class, wait_ms = wait.as_millis() as u64, "Rate limiting");
                sleep(wait).await;
            }
        }
        *last_grant = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("default_interval", &self.default_interval)
            .field("overrides", &self.overrides)
            .finish()
    }
}
