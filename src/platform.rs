//! Host-environment primitives the core depends on but does not implement
//! itself: the wall clock, and a single opportunistically-random word.
//!
//! Production code drives these through [`SystemClock`]. The crate's own
//! unit tests swap in [`FixedClock`] so invariants that depend on ordering
//! (not on specific wall-clock values) can be checked deterministically.
//! This is an internal test seam, never a public determinism knob:
//! reproducible output given a declared seed is an explicit non-goal.
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of wall-clock time and opportunistic randomness. Abstracted so
/// the crate's own tests can replay a fixed sequence; every production
/// `Generator` uses [`SystemClock`].
pub(crate) trait Clock {
    fn now_millis(&mut self) -> u64;
    fn random_word(&mut self) -> u32;
}

/// The real clock: wall time since the Unix epoch, and `getrandom` for the
/// opportunistic word.
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&mut self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    #[cfg(feature = "getrandom")]
    fn random_word(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        // `getrandom` failing is a platform-level emergency; falling back to
        // a weaker source is a host decision, not the core's, so we log and
        // surface zero rather than panicking a generator that may otherwise
        // still be well seeded from its pools.
        if let Err(err) = getrandom::getrandom(&mut bytes) {
            log::warn!("platform random source unavailable: {err}");
        }
        u32::from_le_bytes(bytes)
    }

    #[cfg(not(feature = "getrandom"))]
    fn random_word(&mut self) -> u32 {
        0
    }
}

/// A deterministic clock for this crate's own test suite: a fixed or
/// stepped timestamp, and a queue of words to hand out one at a time.
#[cfg(test)]
pub(crate) struct FixedClock {
    pub(crate) millis: u64,
    pub(crate) step_millis: u64,
    pub(crate) words: std::collections::VecDeque<u32>,
}

#[cfg(test)]
impl FixedClock {
    pub(crate) fn new(start_millis: u64) -> Self {
        Self {
            millis: start_millis,
            step_millis: 0,
            words: std::collections::VecDeque::new(),
        }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_millis(&mut self) -> u64 {
        let t = self.millis;
        self.millis += self.step_millis;
        t
    }

    fn random_word(&mut self) -> u32 {
        self.words.pop_front().unwrap_or(0x5EED_5EED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_reports_plausible_time() {
        let mut clock = SystemClock;
        assert!(clock.now_millis() > 1_700_000_000_000);
    }

    #[test]
    fn fixed_clock_replays_queued_words_then_a_default() {
        let mut clock = FixedClock::new(42);
        clock.words.extend([1, 2, 3]);
        assert_eq!(clock.now_millis(), 42);
        assert_eq!(clock.random_word(), 1);
        assert_eq!(clock.random_word(), 2);
        assert_eq!(clock.random_word(), 3);
        assert_eq!(clock.random_word(), 0x5EED_5EED);
    }

    #[test]
    fn fixed_clock_steps_when_configured() {
        let mut clock = FixedClock::new(0);
        clock.step_millis = 10;
        assert_eq!(clock.now_millis(), 0);
        assert_eq!(clock.now_millis(), 10);
        assert_eq!(clock.now_millis(), 20);
    }
}
