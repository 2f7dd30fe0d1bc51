//! The output stage: AES-256 in counter mode over a 128-bit counter,
//! rekeying itself from its own output at burst boundaries and after every
//! call ("gating").

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use zeroize::Zeroize;

/// A burst of output is gated at this many words.
pub const MAX_WORDS_PER_BURST: usize = 65536;

/// The AES-CTR output stage. `cipher` is `None` until the first reseed;
/// the working key is undefined at cold start.
///
/// `key` is kept alongside the cipher (rather than only inside the opaque
/// `Aes256` instance) because the reseed protocol hashes the *current*
/// working key together with freshly drawn pool material, and the current
/// key may have been changed by a gate since the last reseed, so the
/// reseed engine must be able to read it back.
pub(crate) struct OutputStage {
    cipher: Option<Aes256>,
    counter: [u32; 4],
    key: [u8; 32],
}

impl OutputStage {
    pub(crate) fn new() -> Self {
        Self {
            cipher: None,
            counter: [0; 4],
            key: [0; 32],
        }
    }

    pub(crate) fn is_keyed(&self) -> bool {
        self.cipher.is_some()
    }

    /// The current 256-bit working key. Zero at cold start.
    pub(crate) fn current_key(&self) -> [u8; 32] {
        self.key
    }

    /// Install a new 256-bit key, replacing and zeroizing any prior cipher
    /// state, then advance the counter by one (the reseed protocol's
    /// post-rekey counter bump).
    pub(crate) fn rekey(&mut self, key: [u8; 32]) {
        self.set_key(key);
        self.increment_counter();
    }

    fn set_key(&mut self, key: [u8; 32]) {
        self.key.zeroize();
        self.key = key;
        self.cipher = Some(Aes256::new_from_slice(&self.key).expect("AES-256 key is exactly 32 bytes"));
    }

    /// Increment the 128-bit little-endian counter by one, word-wise,
    /// carrying into the next word only on wraparound.
    fn increment_counter(&mut self) {
        for word in &mut self.counter {
            let (next, carry) = word.overflowing_add(1);
            *word = next;
            if !carry {
                break;
            }
        }
    }

    /// Produce one AES block (four `u32` words) by encrypting the current
    /// counter, then advance the counter for the next call.
    fn gen4(&mut self) -> [u32; 4] {
        self.increment_counter();
        let cipher = self
            .cipher
            .as_ref()
            .expect("gen4 called before the output stage was keyed");

        let mut block = aes::Block::default();
        for (chunk, word) in block.chunks_exact_mut(4).zip(self.counter.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        cipher.encrypt_block(&mut block);

        let mut out = [0u32; 4];
        for (word, chunk) in out.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        out
    }

    /// Rekey from the next two output blocks (256 bits), destroying
    /// backward compromise: the previous key is unrecoverable from output
    /// produced after this call.
    pub(crate) fn gate(&mut self) {
        let a = self.gen4();
        let b = self.gen4();
        let mut key = [0u8; 32];
        for (dst, word) in key.chunks_exact_mut(4).zip(a.iter().chain(b.iter())) {
            dst.copy_from_slice(&word.to_le_bytes());
        }
        self.set_key(key);
        key.zeroize();
    }

    /// Produce `n` words of output, gating every [`MAX_WORDS_PER_BURST`]
    /// words and once more after the loop.
    pub(crate) fn generate(&mut self, n: usize) -> Vec<u32> {
        let mut out = Vec::with_capacity(n);
        let mut emitted = 0usize;
        while emitted < n {
            let block = self.gen4();
            for word in block {
                if emitted >= n {
                    break;
                }
                out.push(word);
                emitted += 1;
                if emitted % MAX_WORDS_PER_BURST == 0 {
                    self.gate();
                }
            }
        }
        self.gate();
        out
    }
}

impl Drop for OutputStage {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_stage() -> OutputStage {
        let mut s = OutputStage::new();
        s.rekey([7u8; 32]);
        s
    }

    #[test]
    fn unkeyed_stage_reports_not_keyed() {
        let s = OutputStage::new();
        assert!(!s.is_keyed());
    }

    #[test]
    fn rekey_marks_stage_keyed() {
        let s = keyed_stage();
        assert!(s.is_keyed());
    }

    #[test]
    fn counter_increments_with_carry() {
        let mut s = OutputStage::new();
        s.counter = [u32::MAX, 0, 0, 0];
        s.increment_counter();
        assert_eq!(s.counter, [0, 1, 0, 0]);
    }

    #[test]
    fn generate_zero_words_still_gates() {
        let mut gated = keyed_stage();
        let out = gated.generate(0);
        assert!(out.is_empty());

        let mut ungated = keyed_stage();
        // Same key, same starting counter: if `generate(0)` had not gated,
        // the next block from each stage would match exactly.
        assert_ne!(gated.gen4(), ungated.gen4());
    }

    #[test]
    fn generate_changes_the_key() {
        let mut s = keyed_stage();
        let before = s.current_key();
        s.generate(4);
        assert_ne!(before, s.current_key());
        let after_first = s.current_key();
        s.generate(0);
        assert_ne!(after_first, s.current_key());
    }

    #[test]
    fn generate_truncates_to_requested_length() {
        let mut s = keyed_stage();
        let out = s.generate(7);
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn burst_boundary_triggers_intra_call_gate() {
        let mut s = keyed_stage();
        let out = s.generate(MAX_WORDS_PER_BURST + 4);
        assert_eq!(out.len(), MAX_WORDS_PER_BURST + 4);
    }
}
