use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Limits how many units of work run at the same time.
///
/// Wrap in an `Arc` via [`Throttler::new`], then call [`Throttler::acquire`] before
/// each unit of work. At most `max_concurrent` tasks hold a permit simultaneously.
/// The throttler also remembers the highest number of permits that were ever held
/// at once, which is reported in diagnostics.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
}

/// A held concurrency slot. The slot is released when the permit is dropped.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Throttler {
    /// Create a new throttler that allows at most `max_concurrent` tasks at a time.
    ///
    /// A cap of zero is treated as one so that work always makes progress.
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        let max_concurrent = max_concurrent.max(1);
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
        })
    }

    /// Wait for a free concurrency slot.
    ///
    /// The returned permit must be held for the duration of the work.
    pub async fn acquire(&self) -> Permit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed");

        let current = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        let _ = self.peak.fetch_max(current, Ordering::AcqRel);

        Permit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of permits currently held.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of permits held at the same time since creation.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}
