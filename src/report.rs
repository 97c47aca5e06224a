//! Error reporting sinks

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::ERROR_ALERT_WINDOW;
use crate::error::Error;
use crate::traits::ErrorReporter;

/// Reports errors to the log only
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, err: &Error) {
        log::error!("{}", err);
    }
}

/// Logs every error, but only forwards an error to `inner` (usually something that alerts the user)
/// when no error of the same category has been reported within a time window.
#[derive(Debug)]
pub struct RateLimitedReporter<R> {
    inner: R,
    window: Duration,
    /// When each category was last reported, within the window
    recent: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl<R: ErrorReporter> RateLimitedReporter<R> {
    pub fn new(inner: R) -> Self {
        Self::with_window(inner, ERROR_ALERT_WINDOW)
    }

    pub fn with_window(inner: R, window: Duration) -> Self {
        Self { inner, window, recent: Mutex::new(HashMap::new()) }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// How many errors of this category were reported within the window
    pub fn recent_count(&self, category: &str) -> usize {
        self.recent_count_at(category, Instant::now())
    }

    fn recent_count_at(&self, category: &str, now: Instant) -> usize {
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        match recent.get_mut(category) {
            None => 0,
            Some(times) => {
                prune(times, now, self.window);
                times.len()
            },
        }
    }

    fn report_at(&self, err: &Error, now: Instant) {
        log::error!("{}", err);

        let should_alert = {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
            recent.retain(|_, times| {
                prune(times, now, self.window);
                times.is_empty() == false
            });
            let times = recent.entry(err.category()).or_default();
            let should_alert = times.is_empty();
            times.push_back(now);
            should_alert
        };

        if should_alert {
            self.inner.report(err);
        } else {
            log::debug!("Not alerting about {:?} again", err.category());
        }
    }
}

impl<R: ErrorReporter> ErrorReporter for RateLimitedReporter<R> {
    fn report(&self, err: &Error) {
        self.report_at(err, Instant::now())
    }
}

fn prune(times: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = times.front() {
        if now.duration_since(*oldest) >= window {
            times.pop_front();
        } else {
            break;
        }
    }
}
