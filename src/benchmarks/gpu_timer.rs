//! Double-buffered GPU elapsed-time queries.
//!
//! GPU timer results arrive asynchronously. Asking for the result of the query that
//! brackets the frame being submitted right now would stall the CPU until the GPU
//! drains its queue, which is exactly the throughput we are trying to measure.
//! [`GpuTimer`] instead hands out query slots from a small ring and, at the end of
//! every frame, collects the result of a slot issued on an *earlier* frame. When
//! that result is not there yet the timer reports [`GpuTime::Pending`] and tries
//! again next frame; it never waits.
//!
//! The device side lives behind [`QueryRing`] so the bookkeeping here does not
//! depend on a particular graphics API (see `renderer::timestamp` for the wgpu one).

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::time_sample::TimeSample;

/// Result of [`GpuTimer::end_frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpuTime {
    /// GPU time of a previously submitted frame.
    Elapsed(TimeSample),
    /// No earlier query has resolved yet (always the case on the first frame).
    Pending,
    /// GPU timing is not available for this frame.
    Unavailable,
}

impl GpuTime {
    /// The elapsed time, if one was collected.
    pub fn elapsed(&self) -> Option<TimeSample> {
        match self {
            GpuTime::Elapsed(sample) => Some(*sample),
            _ => None,
        }
    }
}

/// Non-blocking state of one query slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPoll {
    /// The bracketed work took this many nanoseconds.
    Ready(u64),
    /// Still executing or still being read back.
    Pending,
    /// The result could not be read.
    Failed,
}

/// Failure to create the query objects.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The device does not expose elapsed-time queries.
    #[error("the device does not support timestamp queries")]
    Unsupported,
    /// The device reported a zero tick period, results would be meaningless.
    #[error("the device reports an invalid timestamp period ({0})")]
    InvalidPeriod(f32),
}

/// Device-side ring of elapsed-time queries.
pub trait QueryRing {
    /// Called once the frame bracketed by `slot` has been submitted.
    fn submitted(&mut self, slot: usize);

    /// Reads the result of `slot` without blocking.
    fn poll(&mut self, slot: usize) -> QueryPoll;
}

enum Queries<Q> {
    Uncreated,
    Ready(Q),
    Failed,
}

/// Hands out query slots around render submissions and collects earlier results.
pub struct GpuTimer<Q> {
    depth: usize,
    queries: Queries<Q>,
    next_slot: usize,
    issued: Option<usize>,
    in_flight: VecDeque<usize>,
    /// Leading entries of `in_flight` whose results belong to work that is no
    /// longer measured.
    stale: usize,
}

impl<Q: QueryRing> GpuTimer<Q> {
    /// Creates a timer whose ring will hold `depth` slots (at least one).
    ///
    /// The query objects themselves are created lazily by the first
    /// [`GpuTimer::begin_frame`] and released when the timer is dropped.
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            queries: Queries::Uncreated,
            next_slot: 0,
            issued: None,
            in_flight: VecDeque::new(),
            stale: 0,
        }
    }

    /// Picks the slot that will bracket the upcoming render submission.
    ///
    /// `create` builds the ring on first use; if it fails, GPU timing stays
    /// disabled for the lifetime of this timer and CPU timing carries on alone.
    /// Returns `None` when this frame will not be GPU-timed, either because
    /// queries are unavailable or because every slot is still in flight.
    pub fn begin_frame<F>(&mut self, create: F) -> Option<usize>
    where
        F: FnOnce(usize) -> Result<Q, QueryError>,
    {
        if matches!(self.queries, Queries::Uncreated) {
            self.queries = match create(self.depth) {
                Ok(queries) => Queries::Ready(queries),
                Err(err) => {
                    warn!("GPU timing disabled, falling back to CPU timing only: {err}");
                    Queries::Failed
                }
            };
        }

        if !matches!(self.queries, Queries::Ready(_)) {
            return None;
        }

        let slot = self.next_slot;
        if self.in_flight.contains(&slot) {
            debug!(slot, "query slot still in flight, frame is not GPU-timed");
            return None;
        }

        self.next_slot = (slot + 1) % self.depth;
        self.issued = Some(slot);
        Some(slot)
    }

    /// Closes the current frame and returns the time of an earlier one.
    ///
    /// Must be called after the frame's work was submitted.
    pub fn end_frame(&mut self) -> GpuTime {
        let Queries::Ready(queries) = &mut self.queries else {
            self.issued = None;
            return GpuTime::Unavailable;
        };

        let mut result = match self.in_flight.front().copied() {
            Some(slot) => match queries.poll(slot) {
                QueryPoll::Ready(nanos) => {
                    self.in_flight.pop_front();
                    GpuTime::Elapsed(TimeSample::from_nanos(nanos))
                }
                QueryPoll::Pending => GpuTime::Pending,
                QueryPoll::Failed => {
                    self.in_flight.pop_front();
                    warn!(slot, "GPU query result could not be read");
                    GpuTime::Unavailable
                }
            },
            None => GpuTime::Pending,
        };
        if result != GpuTime::Pending && self.stale > 0 {
            self.stale -= 1;
            result = GpuTime::Pending;
        }

        if let Some(slot) = self.issued.take() {
            queries.submitted(slot);
            self.in_flight.push_back(slot);
        }

        result
    }

    /// The device-side ring, once it has been created successfully.
    pub fn queries(&self) -> Option<&Q> {
        match &self.queries {
            Queries::Ready(queries) => Some(queries),
            _ => None,
        }
    }

    /// Drops the results of every slot submitted so far.
    ///
    /// The slots still drain through the ring, so none is reused while its
    /// readback is pending, but their times are reported as
    /// [`GpuTime::Pending`] instead of being attributed to the work that
    /// follows.
    pub fn discard_in_flight(&mut self) {
        self.stale = self.in_flight.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockRing {
        submitted: Vec<usize>,
        results: HashMap<usize, VecDeque<QueryPoll>>,
        polled: Vec<usize>,
    }

    impl QueryRing for MockRing {
        fn submitted(&mut self, slot: usize) {
            self.submitted.push(slot);
            self.results
                .entry(slot)
                .or_default()
                .push_back(QueryPoll::Ready(1_000_000 * (slot as u64 + 1)));
        }

        fn poll(&mut self, slot: usize) -> QueryPoll {
            self.polled.push(slot);
            self.results
                .get_mut(&slot)
                .and_then(|queue| queue.pop_front())
                .unwrap_or(QueryPoll::Pending)
        }
    }

    #[test]
    fn first_frame_is_pending_and_later_frames_read_the_previous_slot() {
        let mut timer = GpuTimer::new(2);

        assert_eq!(timer.begin_frame(|_| Ok(MockRing::default())), Some(0));
        assert_eq!(timer.end_frame(), GpuTime::Pending);

        assert_eq!(timer.begin_frame(|_| unreachable!()), Some(1));
        assert_eq!(
            timer.end_frame(),
            GpuTime::Elapsed(TimeSample::from_nanos(1_000_000))
        );

        assert_eq!(timer.begin_frame(|_| unreachable!()), Some(0));
        assert_eq!(
            timer.end_frame(),
            GpuTime::Elapsed(TimeSample::from_nanos(2_000_000))
        );

        let ring = timer.queries().unwrap();
        assert_eq!(ring.submitted, vec![0, 1, 0]);
        // The slot being submitted is never the one polled in the same frame.
        assert_eq!(ring.polled, vec![0, 1]);
    }

    #[test]
    fn creation_failure_degrades_to_unavailable() {
        let mut timer: GpuTimer<MockRing> = GpuTimer::new(2);

        assert_eq!(timer.begin_frame(|_| Err(QueryError::Unsupported)), None);
        assert_eq!(timer.end_frame(), GpuTime::Unavailable);
        assert!(timer.queries().is_none());

        // Creation is attempted exactly once.
        assert_eq!(timer.begin_frame(|_| unreachable!()), None);
        assert_eq!(timer.end_frame(), GpuTime::Unavailable);
    }

    #[test]
    fn busy_slot_skips_gpu_timing_instead_of_blocking() {
        let mut timer = GpuTimer::new(1);
        assert_eq!(timer.begin_frame(|_| Ok(MockRing::default())), Some(0));
        assert_eq!(timer.end_frame(), GpuTime::Pending);

        // Slot 0 has not been collected yet, so this frame is not bracketed.
        assert_eq!(timer.begin_frame(|_| unreachable!()), None);
        assert_eq!(
            timer.end_frame(),
            GpuTime::Elapsed(TimeSample::from_nanos(1_000_000))
        );

        assert_eq!(timer.begin_frame(|_| unreachable!()), Some(0));
    }

    #[test]
    fn failed_read_only_affects_that_frame() {
        let mut timer = GpuTimer::new(2);
        timer.begin_frame(|_| Ok(MockRing::default()));
        timer.end_frame();

        if let Queries::Ready(ring) = &mut timer.queries {
            ring.results.insert(0, VecDeque::from([QueryPoll::Failed]));
        }

        timer.begin_frame(|_| unreachable!());
        assert_eq!(timer.end_frame(), GpuTime::Unavailable);
        assert!(timer.queries().is_some());

        timer.begin_frame(|_| unreachable!());
        assert_eq!(
            timer.end_frame(),
            GpuTime::Elapsed(TimeSample::from_nanos(2_000_000))
        );
    }

    #[test]
    fn discarded_slots_do_not_report_into_the_next_measurement() {
        let mut timer = GpuTimer::new(2);
        timer.begin_frame(|_| Ok(MockRing::default()));
        timer.end_frame();
        timer.begin_frame(|_| unreachable!());
        timer.end_frame();

        // Slot 1 is still in flight when the measured work changes.
        timer.discard_in_flight();

        assert_eq!(timer.begin_frame(|_| unreachable!()), Some(0));
        assert_eq!(timer.end_frame(), GpuTime::Pending);
        assert_eq!(timer.begin_frame(|_| unreachable!()), Some(1));
        assert_eq!(
            timer.end_frame(),
            GpuTime::Elapsed(TimeSample::from_nanos(1_000_000))
        );
        assert_eq!(timer.queries().unwrap().polled, vec![0, 1, 0]);
    }
}
