//! Result aggregation and order reconstruction.
//!
//! The aggregator consumes job results in completion order and rebuilds the
//! response in job-number order. It tracks a failure *boundary*: the smallest
//! job number known to have failed. Everything at or after the boundary is
//! discarded, so a response is always a contiguous prefix of the intended
//! round-robin order.
//!
//! ```text
//! Collecting --(progress >= requested)--> Stopping --(stream drained)--> Done
//! ```

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::core::error::FetchError;
use crate::core::job::{ContentItem, JobNumber, JobResult};
use crate::core::worker_pool::WorkerPool;

/// Aggregator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// Accepting results.
    Collecting,
    /// Enough progress observed; the pool has been asked to stop.
    Stopping,
    /// Result stream drained and output built.
    Done,
}

/// Final product of one aggregation.
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    /// Items of jobs `0..boundary`, in job-number order.
    pub items: Vec<ContentItem>,
    /// Jobs the request asked for.
    pub requested_count: usize,
    /// Effective truncation point.
    pub boundary: JobNumber,
    /// Sum of requested counts over every observed result.
    pub progress: usize,
    /// Distinct jobs a result was received for.
    pub observed: usize,
    /// Jobs the dispatcher handed to the pool before it stopped. Zero when the
    /// outcome was built outside [`aggregate`](crate::core::engine::aggregate).
    pub dispatched: usize,
    /// The failure that set the boundary, if one did.
    pub boundary_failure: Option<(JobNumber, FetchError)>,
}

impl AggregateOutcome {
    /// Whether the response is shorter than the full schedule of jobs.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.boundary < self.requested_count
    }
}

/// Aggregation state for one request. Owned by a single thread.
#[derive(Debug)]
pub struct Aggregator {
    requested_count: usize,
    collected: HashMap<JobNumber, Vec<ContentItem>>,
    observed: HashSet<JobNumber>,
    boundary: JobNumber,
    progress: usize,
    state: AggregatorState,
    boundary_failure: Option<(JobNumber, FetchError)>,
}

impl Aggregator {
    /// Fresh state for a request of `requested_count` jobs.
    ///
    /// Nothing is sized from `requested_count`; storage grows with the
    /// results actually received.
    #[must_use]
    pub fn new(requested_count: usize) -> Self {
        Self {
            requested_count,
            collected: HashMap::new(),
            observed: HashSet::new(),
            boundary: requested_count,
            progress: 0,
            state: AggregatorState::Collecting,
            boundary_failure: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> AggregatorState {
        self.state
    }

    /// Smallest failing job number seen so far, or the requested count.
    #[must_use]
    pub const fn boundary(&self) -> JobNumber {
        self.boundary
    }

    /// Sum of requested counts over every observed result.
    #[must_use]
    pub const fn progress(&self) -> usize {
        self.progress
    }

    /// Record one result.
    ///
    /// Returns `true` exactly once, on the transition to
    /// [`AggregatorState::Stopping`]; the caller must then stop the pool.
    pub fn accept(&mut self, result: JobResult) -> bool {
        let JobResult {
            job_number,
            requested_count,
            outcome,
        } = result;

        if job_number >= self.requested_count {
            warn!(job_number = job_number, "Result for unknown job ignored");
            return false;
        }
        if !self.observed.insert(job_number) {
            warn!(job_number = job_number, "Duplicate result ignored");
            return false;
        }

        match outcome {
            Ok(items) if job_number < self.boundary => {
                self.collected.insert(job_number, items);
            }
            Ok(_) => {
                debug!(job_number = job_number, boundary = self.boundary, "Result after failure boundary dropped");
            }
            Err(err) if job_number < self.boundary => {
                debug!(job_number = job_number, error = %err, "Failure boundary moved");
                self.boundary = job_number;
                self.collected.retain(|n, _| *n < job_number);
                self.boundary_failure = Some((job_number, err));
            }
            Err(err) => {
                debug!(job_number = job_number, error = %err, "Failure after boundary ignored");
            }
        }

        self.progress += requested_count;
        if self.state == AggregatorState::Collecting && self.progress >= self.requested_count {
            self.state = AggregatorState::Stopping;
            return true;
        }
        false
    }

    /// Build the ordered output. Call once the result stream is drained.
    ///
    /// If the stream ended before every job was observed (cancellation, dead
    /// workers), the boundary is lowered to the first unobserved job so the
    /// output never has a gap.
    pub fn finish(&mut self) -> AggregateOutcome {
        self.state = AggregatorState::Done;

        // At most `observed.len()` numbers can be seen, so the scan is bounded by it.
        let first_unobserved = (0..self.requested_count)
            .find(|n| !self.observed.contains(n))
            .unwrap_or(self.requested_count);
        let boundary = self.boundary.min(first_unobserved);

        let mut collected = std::mem::take(&mut self.collected);
        let items = (0..boundary)
            .filter_map(|n| collected.remove(&n))
            .flatten()
            .collect();

        AggregateOutcome {
            items,
            requested_count: self.requested_count,
            boundary,
            progress: self.progress,
            observed: self.observed.len(),
            dispatched: 0,
            boundary_failure: self.boundary_failure.take(),
        }
    }

    /// Drain `pool`'s result stream, stopping the pool once enough progress is
    /// observed, and build the output.
    pub fn collect(mut self, pool: &WorkerPool) -> AggregateOutcome {
        for result in pool.results() {
            if self.accept(result) {
                debug!(progress = self.progress, boundary = self.boundary, "Enough progress, stopping pool");
                pool.stop();
            }
        }
        self.finish()
    }
}
