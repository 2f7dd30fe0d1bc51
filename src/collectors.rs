//! Adapters that translate host-environment events into [`Generator::add_entropy`]
//! calls, plus the persistence boundary the host uses to stir in a blob
//! saved from a previous run.
//!
//! The core never touches an OS API or a key-value store itself; everything
//! here is a thin, typed translation layer with a fixed bit/tag contract per
//! event kind.

use crate::entropy::EntropyInput;
use crate::error::RngError;
use crate::Generator;

/// A host-provided place to load and save a small persisted blob across
/// process restarts. Implementations decide where the blob lives (a file, a
/// key-value store, browser storage); the core only ever treats it as
/// zero-entropy stirring input, never as a source of claimed strength.
pub trait PersistStore {
    /// Load the previously saved blob, if any.
    fn load(&self) -> Option<Vec<u8>>;
    /// Save a freshly drawn blob for the next run to load.
    fn save(&self, blob: &[u8]);
}

impl Generator {
    /// A pointer/mouse movement, credited at 2 bits.
    pub fn on_pointer_move(&mut self, x: u32, y: u32) {
        self.add_entropy(EntropyInput::Words(vec![x, y]), Some(2), "mouse");
    }

    /// A keystroke, credited at 1 bit.
    pub fn on_keystroke(&mut self, code: u32) {
        self.add_entropy(EntropyInput::Word(code), Some(1), "keyboard");
    }

    /// An accelerometer reading, credited at 3 bits. `orientation` is the
    /// device's orientation reading packed into a single word; hosts that
    /// cannot supply one submit an empty text payload instead of guessing.
    pub fn on_accelerometer(&mut self, ax: u32, ay: u32, az: u32, orientation: Option<u32>) {
        match orientation {
            Some(bits) => self.add_entropy(
                EntropyInput::Words(vec![ax, ay, az, bits]),
                Some(3),
                "accelerometer",
            ),
            None => self.add_entropy(EntropyInput::Text(String::new()), Some(3), "accelerometer"),
        }
    }

    /// Stir in 48 words of platform randomness, 1 bit credited each. Meant
    /// to be called once at startup so the generator has some working
    /// strength before host events start arriving.
    pub fn seed_from_platform_init(&mut self) {
        for _ in 0..48 {
            let word = self.clock.random_word();
            self.add_entropy(EntropyInput::Word(word), Some(1), "init");
        }
    }

    /// Stir in a blob loaded from a [`PersistStore`], crediting zero bits:
    /// a compromised store must not be able to inflate claimed strength.
    pub fn load_persisted_state(&mut self, store: &dyn PersistStore) {
        if let Some(blob) = store.load() {
            let text = String::from_utf8_lossy(&blob).into_owned();
            self.add_entropy(EntropyInput::Text(text), Some(0), "loadpool");
        }
    }

    /// Draw four fresh words and hand them to a [`PersistStore`] as 16
    /// little-endian bytes, for the next run to load back in.
    pub fn save_persisted_state(&mut self, store: &dyn PersistStore) -> Result<(), RngError> {
        let words = self.random_words(4, None)?;
        let mut blob = Vec::with_capacity(16);
        for word in words {
            blob.extend_from_slice(&word.to_le_bytes());
        }
        store.save(&blob);
        Ok(())
    }

    /// Stir in a piece of host context (e.g. `"location"`, `"cookie"`),
    /// crediting zero bits: low-entropy but not worthless.
    pub fn note_context(&mut self, tag: &str, value: &str) {
        self.add_entropy(EntropyInput::Text(value.to_string()), Some(0), tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FixedClock;
    use std::cell::RefCell;

    fn fresh() -> Generator {
        let mut clock = FixedClock::new(0);
        clock.words.extend(std::iter::repeat(0x1234_5678).take(64));
        Generator::with_clock(Box::new(clock))
    }

    #[test]
    fn pointer_move_routes_through_add_entropy() {
        let mut rng = fresh();
        rng.on_pointer_move(10, 20);
        assert!(rng.pool_strength >= 2);
    }

    #[test]
    fn keystroke_credits_one_bit() {
        let mut rng = fresh();
        rng.on_keystroke(65);
        assert_eq!(rng.pool_strength, 1);
    }

    #[test]
    fn accelerometer_without_orientation_still_credits_bits() {
        let mut rng = fresh();
        rng.on_accelerometer(1, 2, 3, None);
        assert_eq!(rng.pool_strength, 3);
    }

    #[test]
    fn platform_init_submits_forty_eight_words() {
        let mut rng = fresh();
        rng.seed_from_platform_init();
        assert_eq!(rng.pool_strength, 48);
    }

    struct MemStore {
        blob: RefCell<Option<Vec<u8>>>,
    }

    impl PersistStore for MemStore {
        fn load(&self) -> Option<Vec<u8>> {
            self.blob.borrow().clone()
        }
        fn save(&self, blob: &[u8]) {
            *self.blob.borrow_mut() = Some(blob.to_vec());
        }
    }

    #[test]
    fn load_persisted_state_is_zero_strength() {
        let mut rng = fresh();
        let store = MemStore {
            blob: RefCell::new(Some(b"previous run".to_vec())),
        };
        rng.load_persisted_state(&store);
        assert_eq!(rng.pool_strength, 0);
    }

    #[test]
    fn load_persisted_state_with_nothing_saved_is_a_no_op() {
        let mut rng = fresh();
        let store = MemStore {
            blob: RefCell::new(None),
        };
        rng.load_persisted_state(&store);
        assert_eq!(rng.pool_strength, 0);
    }

    #[test]
    fn save_persisted_state_round_trips_sixteen_bytes() {
        let mut rng = fresh();
        rng.set_default_paranoia(0).unwrap();
        rng.seed_from_platform_init();
        let store = MemStore {
            blob: RefCell::new(None),
        };
        rng.save_persisted_state(&store).unwrap();
        assert_eq!(store.load().unwrap().len(), 16);
    }

    #[test]
    fn save_persisted_state_propagates_not_ready() {
        let mut rng = fresh();
        let store = MemStore {
            blob: RefCell::new(None),
        };
        assert_eq!(
            rng.save_persisted_state(&store),
            Err(RngError::NotReady)
        );
    }

    #[test]
    fn note_context_is_zero_strength() {
        let mut rng = fresh();
        rng.note_context("cookie", "abc123");
        assert_eq!(rng.pool_strength, 0);
    }
}
