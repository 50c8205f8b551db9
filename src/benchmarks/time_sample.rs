//! Duration samples shared by CPU and GPU timing.
//!
//! A [`TimeSample`] is one measured duration. CPU samples come from a [`Stopwatch`]
//! reading the monotonic clock; GPU samples are built from elapsed-time query
//! results in nanoseconds. Both end up in the same type so the summary and the
//! result store never care where a number came from.

use std::time::{Duration, Instant};

/// A single measured duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct TimeSample(Duration);

impl TimeSample {
    /// An empty sample.
    pub const ZERO: TimeSample = TimeSample(Duration::ZERO);

    /// Builds a sample from a GPU elapsed-time query result.
    pub fn from_nanos(nanos: u64) -> Self {
        Self(Duration::from_nanos(nanos))
    }

    /// Builds a sample from a wall-clock duration.
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// The sample in seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// The sample in milliseconds.
    pub fn as_millis_f64(&self) -> f64 {
        self.0.as_secs_f64() * 1_000.0
    }
}

impl std::ops::Add for TimeSample {
    type Output = TimeSample;

    fn add(self, rhs: TimeSample) -> TimeSample {
        TimeSample(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for TimeSample {
    fn add_assign(&mut self, rhs: TimeSample) {
        self.0 += rhs.0;
    }
}

/// Measures CPU time from the moment it is started.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Starts measuring now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since [`Stopwatch::start`].
    pub fn elapsed(&self) -> TimeSample {
        TimeSample(self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanos_convert_to_seconds_and_millis() {
        let sample = TimeSample::from_nanos(16_666_667);
        assert!((sample.as_secs_f64() - 0.016_666_667).abs() < 1e-12);
        assert!((sample.as_millis_f64() - 16.666_667).abs() < 1e-9);
    }

    #[test]
    fn samples_accumulate() {
        let mut total = TimeSample::ZERO;
        total += TimeSample::from_duration(Duration::from_millis(3));
        total += TimeSample::from_nanos(2_000_000);
        assert_eq!(total, TimeSample::from_duration(Duration::from_millis(5)));
    }

    #[test]
    fn stopwatch_measures_from_start() {
        let stopwatch = Stopwatch::start();
        std::thread::sleep(Duration::from_millis(2));
        let first = stopwatch.elapsed();
        assert!(first >= TimeSample::from_duration(Duration::from_millis(2)));
        assert!(stopwatch.elapsed() >= first);
    }
}
