//! Rate-limited warnings.
//!
//! Some conditions are worth reporting but can repeat for every file of a
//! large tree. [`RateLimitedWarnings`] lets the first warning through and
//! drops the rest until the interval has passed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Destination for warnings
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Forwards warnings to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

const NEVER: u64 = u64::MAX;

/// At most one warning per `interval`, shared across threads
pub struct RateLimitedWarnings {
    sink: Arc<dyn WarningSink>,
    interval: Duration,
    origin: Instant,
    /// Milliseconds since `origin` of the last emitted warning
    last_emitted: AtomicU64,
}

impl RateLimitedWarnings {
    pub fn new(sink: Arc<dyn WarningSink>, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            origin: Instant::now(),
            last_emitted: AtomicU64::new(NEVER),
        }
    }

    /// Warnings go to `tracing`, one per minute
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink), Duration::from_secs(60))
    }

    /// Emit the message unless one was emitted within the interval.
    /// The message is only built when it is emitted. Returns whether it was.
    pub fn warn<F>(&self, message: F) -> bool
    where
        F: FnOnce() -> String,
    {
        let now = self.origin.elapsed().as_millis() as u64;
        let last = self.last_emitted.load(Ordering::Relaxed);
        if last != NEVER && now.saturating_sub(last) < self.interval.as_millis() as u64 {
            return false;
        }
        if self
            .last_emitted
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            // Another thread emitted first
            return false;
        }
        self.sink.warn(&message());
        true
    }
}

impl Default for RateLimitedWarnings {
    fn default() -> Self {
        Self::tracing()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_only_first_warning_within_interval() {
        let sink = Arc::new(RecordingSink::default());
        let warnings = RateLimitedWarnings::new(sink.clone(), Duration::from_secs(3600));

        assert!(warnings.warn(|| "first".to_string()));
        assert!(!warnings.warn(|| "second".to_string()));
        assert!(!warnings.warn(|| unreachable!("message built while suppressed")));

        assert_eq!(sink.messages.lock().unwrap().as_slice(), ["first"]);
    }

    #[test]
    fn test_zero_interval_never_suppresses() {
        let sink = Arc::new(RecordingSink::default());
        let warnings = RateLimitedWarnings::new(sink.clone(), Duration::ZERO);
        for i in 0..3 {
            warnings.warn(|| format!("warning {}", i));
        }
        assert_eq!(sink.count(), 3);
    }

    #[test]
    fn test_shared_across_threads() {
        let sink = Arc::new(RecordingSink::default());
        let warnings = Arc::new(RateLimitedWarnings::new(sink.clone(), Duration::from_secs(3600)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let warnings = warnings.clone();
                std::thread::spawn(move || {
                    warnings.warn(|| "concurrent".to_string());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.count(), 1);
    }
}
