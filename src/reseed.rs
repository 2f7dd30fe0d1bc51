//! The reseed engine: folds a Fortuna-scheduled prefix of pools, plus
//! fresh platform entropy, into the working key.

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::Generator;

impl Generator {
    /// Fold pools into the working key and rekey the output stage.
    ///
    /// When `full` is `false`, pool `i` participates only when bit `i` of
    /// the pre-increment `reseed_count` is set, the Fortuna schedule that
    /// makes pool `i` drain once every `2^i` reseeds. When `full` is
    /// `true`, every pool participates regardless of `reseed_count`.
    pub(crate) fn reseed_from_pools(&mut self, full: bool) {
        let mut seed_words: Vec<u32> = Vec::new();

        self.next_reseed = self.clock.now_millis() + MILLISECONDS_PER_RESEED;
        seed_words.push(self.next_reseed as u32);

        for _ in 0..16 {
            seed_words.push(self.clock.random_word());
        }

        let mut strength: u64 = 0;
        for i in 0..self.pools.len() {
            let (digest, bits) = self.pools.drain(i);
            seed_words.extend(digest_to_words(&digest));
            strength += bits;

            if !full && (self.reseed_count >> i) & 1 == 1 {
                break;
            }
        }

        let pools_len = self.pools.len() as u64;
        if self.reseed_count + 1 >= (1u64 << pools_len) {
            self.pools.grow();
        }

        self.pool_strength = self.pool_strength.saturating_sub(strength);
        if strength > self.working_strength {
            self.working_strength = strength;
        }
        self.reseed_count += 1;

        let mut previous_key = self.output.current_key();
        let mut hasher = Sha256::new();
        hasher.update(previous_key);
        for w in &seed_words {
            hasher.update(w.to_le_bytes());
        }
        let new_key: [u8; 32] = hasher.finalize().into();
        seed_words.zeroize();
        previous_key.zeroize();

        log::debug!(
            "reseed #{} folded {} bits (full={full})",
            self.reseed_count,
            strength
        );

        self.output.rekey(new_key);
    }
}

const MILLISECONDS_PER_RESEED: u64 = 30_000;

fn digest_to_words(digest: &[u8; 32]) -> [u32; 8] {
    let mut words = [0u32; 8];
    for (word, chunk) in words.iter_mut().zip(digest.chunks_exact(4)) {
        *word = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::EntropyInput;
    use crate::platform::FixedClock;

    fn fresh() -> Generator {
        Generator::with_clock(Box::new(FixedClock::new(0)))
    }

    #[test]
    fn full_reseed_drains_every_pool() {
        let mut rng = fresh();
        for _ in 0..4 {
            rng.pools.grow();
        }
        for i in 0..rng.pools.len() {
            rng.pools.add_bits(i, 7);
        }
        rng.reseed_from_pools(true);
        assert_eq!(rng.pools.pool_bits().iter().sum::<u64>(), 0);
    }

    #[test]
    fn partial_reseed_follows_the_fortuna_bit_schedule() {
        let mut rng = fresh();
        for _ in 0..4 {
            rng.pools.grow();
        }
        assert_eq!(rng.pools.len(), 5);

        // reseed_count == 0: bit 0 of 0 is unset, so the loop runs through
        // all pools without an early stop (it only stops early once it
        // processes a pool whose index bit is set in reseed_count).
        rng.add_entropy(EntropyInput::Word(1), Some(5), "x");
        rng.reseed_from_pools(false);
        assert_eq!(rng.reseed_count, 1);
    }

    #[test]
    fn working_strength_never_decreases_across_zero_strength_reseeds() {
        let mut rng = fresh();
        rng.add_entropy(EntropyInput::Word(1), Some(100), "x");
        rng.reseed_from_pools(true);
        let after_first = rng.working_strength;
        assert!(after_first > 0);

        // A reseed that drains no bits must not lower working_strength.
        rng.reseed_from_pools(true);
        assert_eq!(rng.working_strength, after_first);
    }

    #[test]
    fn pool_bank_grows_on_the_fortuna_boundary() {
        let mut rng = fresh();
        let initial_len = rng.pools.len();
        for _ in 0..16 {
            rng.add_entropy(EntropyInput::Word(1), Some(1), "x");
            rng.reseed_from_pools(false);
        }
        assert!(rng.pools.len() > initial_len);
    }

    #[test]
    fn reseed_always_rekeys_the_output_stage() {
        let mut rng = fresh();
        assert!(!rng.output.is_keyed());
        rng.reseed_from_pools(true);
        assert!(rng.output.is_keyed());
    }
}
