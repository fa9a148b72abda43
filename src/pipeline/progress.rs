//! Fractional progress reporting shared by every pipeline stage

use std::sync::{Arc, Mutex};

type Sink = dyn Fn(f32, &str) + Send + Sync;

/// Reports `(fraction, message)` pairs to a single sink.
///
/// A reporter owns a sub-range of the overall `[0.0, 1.0]` sweep. Stages report
/// local fractions in `[0.0, 1.0]` and the reporter maps them into its range.
/// All reporters derived from the same root share one high-water mark, so the
/// sink never observes a fraction lower than one it has already seen.
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Arc<Sink>,
    last: Arc<Mutex<f32>>,
    start: f32,
    end: f32,
}

impl ProgressReporter {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(f32, &str) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
            last: Arc::new(Mutex::new(0.0)),
            start: 0.0,
            end: 1.0,
        }
    }

    /// A reporter that discards everything
    pub fn silent() -> Self {
        Self::new(|_, _| {})
    }

    /// Carve out `[start, end]` of this reporter's range, both given as local fractions
    pub fn sub_range(&self, start: f32, end: f32) -> Self {
        let start = start.clamp(0.0, 1.0);
        let end = end.clamp(start, 1.0);
        Self {
            sink: self.sink.clone(),
            last: self.last.clone(),
            start: self.map(start),
            end: self.map(end),
        }
    }

    pub fn report(&self, fraction: f32, message: &str) {
        let mapped = self.map(fraction.clamp(0.0, 1.0));

        // Held while calling the sink so concurrent reporters cannot reorder
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let value = mapped.max(*last);
        *last = value;
        (self.sink)(value, message);
    }

    fn map(&self, fraction: f32) -> f32 {
        self.start + (self.end - self.start) * fraction
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}
