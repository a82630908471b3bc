//! Progress schedule for generation jobs.
//!
//! The provider does not report intermediate progress, so the percentage
//! is derived from the poll count: it climbs with each poll, holds at
//! [`POLL_PERCENT_CAP`] until the job reports done, and the remaining
//! range is reserved for download and completion.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const INIT_MESSAGE: &str = "Initializing neural engines...";
pub const INIT_PERCENT: u8 = 5;

/// Rotating status messages shown while the job is polled.
pub const PHASE_MESSAGES: &[&str] = &[
    "Synthesizing motion vectors...",
    "Rendering temporal consistency...",
    "Applying cinematic lighting...",
    "Optimizing 3D textures...",
    "Finalizing high-speed export...",
];

/// Highest percentage reported while the job is still running.
pub const POLL_PERCENT_CAP: u8 = 95;

pub const DOWNLOAD_MESSAGE: &str = "Downloading manifesting result...";
pub const DOWNLOAD_PERCENT: u8 = 98;

pub const COMPLETE_MESSAGE: &str = "Materialization complete.";
pub const COMPLETE_PERCENT: u8 = 100;

pub const CANCELLED_MESSAGE: &str = "Generation sequence terminated by user.";

/// Fallback shown when a failure carries no provider detail.
pub const GENERIC_ERROR_MESSAGE: &str = "Error encountered during synthesis.";

// ---------------------------------------------------------------------------
// ProgressTick
// ---------------------------------------------------------------------------

/// One `(message, percent)` observation. `percent` is always in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressTick {
    pub message: String,
    pub percent: u8,
}

impl ProgressTick {
    pub fn new(message: impl Into<String>, percent: u8) -> Self {
        Self {
            message: message.into(),
            percent: percent.min(COMPLETE_PERCENT),
        }
    }

    pub fn init() -> Self {
        Self::new(INIT_MESSAGE, INIT_PERCENT)
    }

    pub fn downloading() -> Self {
        Self::new(DOWNLOAD_MESSAGE, DOWNLOAD_PERCENT)
    }

    pub fn complete() -> Self {
        Self::new(COMPLETE_MESSAGE, COMPLETE_PERCENT)
    }
}

/// Percentage reported on the `step`-th poll (0-based).
///
/// `min(95, floor((step + 1) * 100 / (phases + 2)))`: the two extra
/// slots account for the init and download ticks.
pub fn poll_percent(step: u32) -> u8 {
    let total_steps = PHASE_MESSAGES.len() as u64 + 2;
    let raw = (u64::from(step) + 1) * 100 / total_steps;
    raw.min(u64::from(POLL_PERCENT_CAP)) as u8
}

/// Status message for the `step`-th poll, cycling through the phases.
pub fn poll_message(step: u32) -> &'static str {
    PHASE_MESSAGES[step as usize % PHASE_MESSAGES.len()]
}

pub fn poll_tick(step: u32) -> ProgressTick {
    ProgressTick::new(poll_message(step), poll_percent(step))
}

// ---------------------------------------------------------------------------
// Reporter contract
// ---------------------------------------------------------------------------

/// Observer that receives progress ticks from a running job.
///
/// Called synchronously from the job's control flow, never concurrently
/// with itself. Any `FnMut(&ProgressTick)` closure is a reporter.
pub trait ProgressReporter: Send {
    fn report(&mut self, tick: &ProgressTick);
}

impl<F> ProgressReporter for F
where
    F: FnMut(&ProgressTick) + Send,
{
    fn report(&mut self, tick: &ProgressTick) {
        self(tick)
    }
}

/// Wraps a reporter and guarantees a non-decreasing percentage.
///
/// A tick whose percent is lower than the last one delivered is raised
/// to the last value before it reaches the inner reporter.
pub struct MonotonicReporter<'a, R: ProgressReporter + ?Sized> {
    inner: &'a mut R,
    last_percent: u8,
}

impl<'a, R: ProgressReporter + ?Sized> MonotonicReporter<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            last_percent: 0,
        }
    }

    pub fn emit(&mut self, mut tick: ProgressTick) {
        tick.percent = tick.percent.max(self.last_percent);
        self.last_percent = tick.percent;
        self.inner.report(&tick);
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Schedule --

    #[test]
    fn poll_percent_follows_schedule() {
        let got: Vec<u8> = (0..9).map(poll_percent).collect();
        assert_eq!(got, vec![14, 28, 42, 57, 71, 85, 95, 95, 95]);
    }

    #[test]
    fn poll_percent_is_non_decreasing_and_bounded() {
        let mut last = INIT_PERCENT;
        for step in 0..500 {
            let p = poll_percent(step);
            assert!(p >= last, "step {step}: {p} < {last}");
            assert!(p <= POLL_PERCENT_CAP);
            last = p;
        }
        assert!(last < DOWNLOAD_PERCENT);
    }

    #[test]
    fn poll_percent_survives_huge_step() {
        assert_eq!(poll_percent(u32::MAX), POLL_PERCENT_CAP);
    }

    #[test]
    fn poll_message_cycles() {
        assert_eq!(poll_message(0), PHASE_MESSAGES[0]);
        assert_eq!(poll_message(4), PHASE_MESSAGES[4]);
        assert_eq!(poll_message(5), PHASE_MESSAGES[0]);
        assert_eq!(poll_message(12), PHASE_MESSAGES[2]);
    }

    #[test]
    fn tick_percent_is_clamped_to_100() {
        assert_eq!(ProgressTick::new("x", 250).percent, 100);
    }

    // -- Reporter --

    #[test]
    fn closure_is_a_reporter() {
        let mut seen = Vec::new();
        let mut reporter = |t: &ProgressTick| seen.push(t.percent);
        reporter.report(&ProgressTick::init());
        reporter.report(&ProgressTick::downloading());
        assert_eq!(seen, vec![5, 98]);
    }

    #[test]
    fn monotonic_reporter_never_goes_backwards() {
        let mut seen = Vec::new();
        let mut sink = |t: &ProgressTick| seen.push(t.percent);
        let mut reporter = MonotonicReporter::new(&mut sink);
        reporter.emit(ProgressTick::new("a", 40));
        reporter.emit(ProgressTick::new("b", 10));
        reporter.emit(ProgressTick::new("c", 60));
        assert_eq!(reporter.last_percent(), 60);
        assert_eq!(seen, vec![40, 40, 60]);
    }
}
