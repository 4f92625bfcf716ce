//! Consumed telemetry surface
//!
//! The cache reports timings and named boolean samples but never requires a
//! backend: everything degrades to a no-op when the host has no sink.

use std::time::Instant;

/// A histogram-style telemetry sink supplied by the host platform
pub trait Telemetry: Send + Sync {
    /// Record an elapsed-time sample, in microseconds, under `name`
    fn record_microseconds(&self, name: &str, micros: u64);

    /// Record a named boolean sample
    fn record_boolean(&self, name: &str, sample: bool);
}

/// A restartable timer that reports into an optional [`Telemetry`] sink
pub struct CacheTimer<'a> {
    telemetry: Option<&'a dyn Telemetry>,
    started: Instant,
}

impl std::fmt::Debug for CacheTimer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheTimer")
            .field("telemetry", &self.telemetry.map(|_| "<dyn Telemetry>"))
            .field("started", &self.started)
            .finish()
    }
}

impl<'a> CacheTimer<'a> {
    /// Start timing now
    #[must_use]
    pub fn start(telemetry: Option<&'a dyn Telemetry>) -> Self {
        Self {
            telemetry,
            started: Instant::now(),
        }
    }

    /// Restart the timer, discarding the elapsed time so far
    pub fn reset(&mut self) {
        self.started = Instant::now();
    }

    /// Record the elapsed microseconds under `name`
    ///
    /// A no-op when no telemetry sink is attached.
    pub fn record(&self, name: &str) {
        if let Some(telemetry) = self.telemetry {
            let micros = u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX);
            telemetry.record_microseconds(name, micros);
        }
    }
}
