//! Run-wide admission gate for outbound requests
//!
//! One gate is shared by every term and every page of a run. A permit is
//! held only for the duration of a single network attempt; backoff sleeps
//! happen outside the gate and do not count against the ceiling.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore};

/// Shared semaphore with in-flight instrumentation
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    ceiling: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter however the admitted future ends
struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    /// Creates a gate admitting at most `ceiling` futures at once
    ///
    /// A ceiling of 0 is raised to 1.
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(ceiling)),
            ceiling,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Runs `fut` once a permit is available
    ///
    /// The permit is released when `fut` completes or is dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - Output of the admitted future
    /// * `Err(AcquireError)` - The gate was closed before admission
    pub async fn admit<F, T>(&self, fut: F) -> Result<T, AcquireError>
    where
        F: Future<Output = T>,
    {
        let _permit = self.semaphore.acquire().await?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard {
            in_flight: self.in_flight.as_ref(),
        };

        Ok(fut.await)
    }

    /// Stops admitting new futures; waiting callers get an error
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Futures currently admitted
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of futures ever admitted at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
