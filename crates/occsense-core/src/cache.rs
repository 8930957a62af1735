//! Refresh cache over a frame source.
//!
//! Holds the last successfully decoded response together with its refresh
//! time. A new frame is read and decoded only when nothing is cached, the
//! cache was invalidated, or the minimum refresh interval has elapsed. One
//! refresh runs at a time; concurrent callers wait on the same lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::frame::{self, error::DecodeError};
use crate::response::Response;
use crate::source::{FrameSource, SourceError};

/// Default minimum interval between refreshes.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("frame source error: {0}")]
    Source(#[from] SourceError),
    #[error("frame decode error: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub min_refresh_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }
}

struct CacheState<S> {
    source: S,
    current: Option<Arc<Response>>,
    last_refresh: Option<Instant>,
    stale: bool,
}

/// Serialized access to the current decoded response of one device.
///
/// # Examples
/// ```
/// use occsense_core::{CacheConfig, SensorCache, StaticFrameSource, fixtures::SAMPLE_FRAME};
///
/// let cache = SensorCache::new(StaticFrameSource::new(SAMPLE_FRAME), CacheConfig::default());
/// let first = cache.current()?;
/// let second = cache.current()?;
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// # Ok::<(), occsense_core::CacheError>(())
/// ```
pub struct SensorCache<S> {
    config: CacheConfig,
    state: Mutex<CacheState<S>>,
}

impl<S: FrameSource> SensorCache<S> {
    pub fn new(source: S, config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState {
                source,
                current: None,
                last_refresh: None,
                stale: true,
            }),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Return the cached response, refreshing it first when due.
    ///
    /// # Errors
    /// Returns the source or decode error of a failed refresh. The previous
    /// good response stays available through [`SensorCache::last_good`].
    pub fn current(&self) -> Result<Arc<Response>, CacheError> {
        self.current_at(Instant::now())
    }

    fn current_at(&self, now: Instant) -> Result<Arc<Response>, CacheError> {
        let mut state = self.state.lock();
        if let Some(response) = state.current.as_ref().filter(|_| !self.is_due(&state, now)) {
            debug!("serving cached sensor response");
            return Ok(Arc::clone(response));
        }

        debug!("refreshing sensor response");
        // Failed attempts also start a new interval.
        state.last_refresh = Some(now);
        let frame = state.source.read_frame()?;
        let response = Arc::new(frame::decode(&frame, None)?);
        state.current = Some(Arc::clone(&response));
        state.stale = false;
        Ok(response)
    }

    /// Last successfully decoded response, without refreshing.
    pub fn last_good(&self) -> Option<Arc<Response>> {
        self.state.lock().current.clone()
    }

    /// Force the next [`SensorCache::current`] call to refresh.
    pub fn invalidate(&self) {
        self.state.lock().stale = true;
    }

    fn is_due(&self, state: &CacheState<S>, now: Instant) -> bool {
        if state.stale {
            return true;
        }
        match state.last_refresh {
            Some(last) => now.saturating_duration_since(last) >= self.config.min_refresh_interval,
            None => true,
        }
    }
}
