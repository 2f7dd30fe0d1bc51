//! The readiness oracle: a pure function of the generator's entropy
//! counters and the clock, indexed by a "paranoia level".

use bitflags::bitflags;

use crate::error::RngError;

/// Required entropy, in bits, per paranoia level `[0, 10]`.
pub const PARANOIA_LEVELS: [u32; 11] = [0, 48, 64, 96, 128, 192, 256, 384, 512, 768, 1024];

/// Bits of entropy a single reseed must drain from pool 0 before the oracle
/// will consider a time-triggered reseed due.
pub const BITS_PER_RESEED: u64 = 80;

bitflags! {
    /// The readiness state returned by [`evaluate`]: bitwise-combinable
    /// flag values, `NOT_READY=0`, `READY=1`, `REQUIRES_RESEED=2`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Readiness: u8 {
        /// Alias for the empty set; spelled out for clarity at call sites.
        const NOT_READY = 0;
        const READY = 0b01;
        const REQUIRES_RESEED = 0b10;
    }
}

/// Resolve a paranoia index (or the generator's default) into a required
/// bit count, validating the index is in range.
pub fn required_bits(paranoia: Option<u8>, default_paranoia: u8) -> Result<u32, RngError> {
    let p = paranoia.unwrap_or(default_paranoia);
    PARANOIA_LEVELS
        .get(p as usize)
        .copied()
        .ok_or(RngError::ParanoiaOutOfRange(p))
}

/// Evaluate the readiness oracle. See §4.2 of the design notes: this is a
/// pure function, no field of `Generator` is read beyond what is passed in.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    working_strength: u64,
    pool_strength: u64,
    pool0_bits: u64,
    now_millis: u64,
    next_reseed_millis: u64,
    need: u32,
) -> Readiness {
    let need = need as u64;
    if working_strength >= need {
        if pool0_bits > BITS_PER_RESEED && now_millis > next_reseed_millis {
            Readiness::REQUIRES_RESEED | Readiness::READY
        } else {
            Readiness::READY
        }
    } else if pool_strength >= need {
        Readiness::REQUIRES_RESEED
    } else {
        Readiness::NOT_READY
    }
}

/// Progress toward readiness, in `[0.0, 1.0]`.
pub fn progress(working_strength: u64, pool_strength: u64, need: u32) -> f64 {
    let need = need as u64;
    if working_strength >= need || pool_strength > need {
        1.0
    } else {
        pool_strength as f64 / need as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_is_not_ready() {
        let need = PARANOIA_LEVELS[6];
        assert_eq!(evaluate(0, 0, 0, 0, 0, need), Readiness::NOT_READY);
        assert_eq!(progress(0, 0, need), 0.0);
    }

    #[test]
    fn sufficient_pool_strength_requires_reseed() {
        let need = PARANOIA_LEVELS[0];
        let r = evaluate(0, 10, 10, 0, 0, need);
        assert!(r.contains(Readiness::REQUIRES_RESEED));
        assert!(!r.contains(Readiness::READY));
    }

    #[test]
    fn working_strength_alone_is_ready() {
        let need = PARANOIA_LEVELS[3];
        let r = evaluate(need as u64, 0, 0, 100, 200, need);
        assert_eq!(r, Readiness::READY);
    }

    #[test]
    fn ready_but_due_for_reseed() {
        let need = PARANOIA_LEVELS[3];
        let r = evaluate(need as u64, 0, BITS_PER_RESEED + 1, 300, 200, need);
        assert_eq!(r, Readiness::REQUIRES_RESEED | Readiness::READY);
    }

    #[test]
    fn progress_saturates_at_one() {
        let need = PARANOIA_LEVELS[2];
        assert_eq!(progress(0, need as u64 + 1, need), 1.0);
        assert_eq!(progress(need as u64, 0, need), 1.0);
    }

    #[test]
    fn progress_is_proportional() {
        let need = PARANOIA_LEVELS[4];
        assert_eq!(progress(0, need as u64 / 2, need), 0.5);
    }

    #[test]
    fn out_of_range_paranoia_is_rejected() {
        assert_eq!(
            required_bits(Some(11), 0),
            Err(RngError::ParanoiaOutOfRange(11))
        );
        assert_eq!(required_bits(None, 11), Err(RngError::ParanoiaOutOfRange(11)));
    }

    #[test]
    fn readiness_is_monotonic_in_working_strength_and_antitonic_in_paranoia() {
        let lo_need = PARANOIA_LEVELS[2];
        let hi_need = PARANOIA_LEVELS[8];
        let weak = evaluate(10, 10, 0, 0, 0, hi_need);
        let strong = evaluate(hi_need as u64, 10, 0, 0, 0, hi_need);
        assert!(!weak.contains(Readiness::READY));
        assert!(strong.contains(Readiness::READY));

        let easy = evaluate(10, 10, 0, 0, 0, lo_need);
        assert!(easy.contains(Readiness::READY) || easy.contains(Readiness::REQUIRES_RESEED));
    }
}
