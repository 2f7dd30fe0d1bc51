//! A cryptographically secure pseudo-random number generator modeled on the
//! Fortuna design of Ferguson and Schneier, adapted for environments that
//! must become usable quickly and cannot assume a persisted seed file is
//! present at startup.
//!
//! # Usage
//! Create an instance with [`Generator::new`] (or use the optional
//! process-wide [`Generator::singleton`]). Feed it entropy as it becomes
//! available via [`Generator::add_entropy`], then draw output with
//! [`Generator::random_words`] once [`Generator::is_ready`] reports
//! readiness at your chosen [paranoia level](readiness::PARANOIA_LEVELS).
//!
//! # Examples
//! Basic usage:
//! ```
//! use fortuna_rng::{entropy::EntropyInput, Generator};
//!
//! let mut rng = Generator::new();
//! rng.set_default_paranoia(0).unwrap();
//! rng.add_entropy(EntropyInput::Text("some unpredictable string".into()), None, "user");
//! let words = rng.random_words(4, None).unwrap();
//! assert_eq!(words.len(), 4);
//! ```
//!
//! Reacting to the `seeded` event once enough entropy has accumulated:
//! ```
//! use fortuna_rng::entropy::EntropyInput;
//! use fortuna_rng::events::{Event, EventName};
//! use fortuna_rng::Generator;
//!
//! let mut rng = Generator::new();
//! rng.set_default_paranoia(0).unwrap();
//! rng.add_event_listener(EventName::Seeded, |event| {
//!     if let Event::Seeded(bits) = event {
//!         assert!(bits > 0);
//!     }
//! });
//! rng.add_entropy(EntropyInput::Text("seed material".into()), Some(128), "init");
//! ```
//!
//! # Determinism & Portability
//! This generator is explicitly **not** deterministic or reproducible:
//! accounted entropy, wall-clock timestamps, and opportunistic platform
//! randomness are folded into every reseed. There is no seed-replay API by
//! design; forward/backward secrecy beyond Fortuna's own guarantees, and
//! deterministic output given a declared seed, are both non-goals.
//!
//! # Design
//! The hard part is the entropy accounting, not the cipher. Submissions are
//! routed round-robin per source into an append-only bank of streaming
//! SHA-256 pools; a [readiness oracle](readiness) gates output on a
//! paranoia-selected bit threshold; reseeding drains a Fortuna-scheduled
//! prefix of pools into the AES-256-CTR working key; and the output stage
//! rekeys itself from its own output at burst boundaries and after every
//! call, so a compromise of the key at time T cannot be used to recover
//! output produced before T ("gating").
#![forbid(unsafe_op_in_unsafe_fn)]
#![deny(future_incompatible, rust_2018_idioms)]
#![warn(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

pub mod collectors;
pub mod entropy;
pub mod error;
pub mod events;
pub mod readiness;

mod cipher;
mod platform;
mod pool;
mod reseed;

use std::sync::{Mutex, OnceLock};

use entropy::EntropyInput;
use error::RngError;
use events::{Event, EventDispatcher, EventName, ListenerId};
use platform::{Clock, SystemClock};
use pool::PoolBank;
use readiness::Readiness;

/// The Fortuna-style generator core. See the crate-level docs for an
/// overview of how the pieces fit together.
pub struct Generator {
    pools: PoolBank,
    reseed_count: u64,
    event_seq: u64,
    output: cipher::OutputStage,
    working_strength: u64,
    pool_strength: u64,
    next_reseed: u64,
    default_paranoia: u8,
    collectors_started: bool,
    listeners: EventDispatcher,
    clock: Box<dyn Clock>,
}

impl Generator {
    /// A fresh, independent, cold-start instance. No entropy has been
    /// added and no reseed has happened: [`Generator::random_words`] will
    /// fail with [`RngError::NotReady`] until enough entropy is submitted.
    pub fn new() -> Self {
        Self {
            pools: PoolBank::new(),
            reseed_count: 0,
            event_seq: 0,
            output: cipher::OutputStage::new(),
            working_strength: 0,
            pool_strength: 0,
            next_reseed: 0,
            default_paranoia: 6,
            collectors_started: false,
            listeners: EventDispatcher::new(),
            clock: Box::new(SystemClock),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_clock(clock: Box<dyn Clock>) -> Self {
        let mut g = Self::new();
        g.clock = clock;
        g
    }

    /// The optional process-wide instance. Constructed lazily, once, on
    /// first access; independent instances via [`Generator::new`] remain
    /// fully supported for tests and multi-instance hosts.
    pub fn singleton() -> &'static Mutex<Generator> {
        static SINGLETON: OnceLock<Mutex<Generator>> = OnceLock::new();
        SINGLETON.get_or_init(|| Mutex::new(Generator::new()))
    }

    /// Set the default paranoia level used when callers pass `None`.
    pub fn set_default_paranoia(&mut self, paranoia: u8) -> Result<(), RngError> {
        readiness::required_bits(Some(paranoia), self.default_paranoia)?;
        self.default_paranoia = paranoia;
        Ok(())
    }

    fn required_bits(&self, paranoia: Option<u8>) -> Result<u32, RngError> {
        readiness::required_bits(paranoia, self.default_paranoia)
    }

    /// Evaluate the readiness oracle at `paranoia` (or the default).
    pub fn is_ready(&mut self, paranoia: Option<u8>) -> Result<Readiness, RngError> {
        let need = self.required_bits(paranoia)?;
        let now = self.clock.now_millis();
        Ok(readiness::evaluate(
            self.working_strength,
            self.pool_strength,
            self.pools.pool0_bits(),
            now,
            self.next_reseed,
            need,
        ))
    }

    /// Progress toward readiness at `paranoia` (or the default), in
    /// `[0.0, 1.0]`.
    pub fn get_progress(&self, paranoia: Option<u8>) -> Result<f64, RngError> {
        let need = self.required_bits(paranoia)?;
        Ok(readiness::progress(
            self.working_strength,
            self.pool_strength,
            need,
        ))
    }

    /// Route an entropy submission to a pool and update the accounting.
    /// See the [`entropy`] module for the header layout and bit-estimation
    /// rules.
    pub fn add_entropy(
        &mut self,
        data: EntropyInput,
        estimated_bits: Option<u32>,
        source_tag: &str,
    ) {
        let was_not_ready = self
            .is_ready(None)
            .map(|r| r == Readiness::NOT_READY)
            .unwrap_or(true);

        let bits = estimated_bits.unwrap_or_else(|| match &data {
            EntropyInput::Word(_) => 0,
            EntropyInput::Words(words) => entropy::estimate_words_bits(words),
            EntropyInput::Text(text) => entropy::estimate_text_bits(text),
        });

        let t = self.clock.now_millis();
        let r = self.clock.random_word();
        let id = self.pools.source_id(source_tag);
        let seq = self.event_seq;
        self.event_seq += 1;
        let robin = self.pools.next_robin(source_tag);

        let header = [
            id,
            seq as u32,
            entropy::type_tag(&data),
            bits,
            t as u32,
            r,
            entropy::payload_len(&data),
        ];

        let pool = self.pools.pool_mut(robin);
        pool.update_words(&header);
        match &data {
            EntropyInput::Word(v) => pool.update_words(&[*v]),
            EntropyInput::Words(words) => pool.update_words(words),
            EntropyInput::Text(text) => {
                let codes: Vec<u32> = text.chars().map(|c| c as u32).collect();
                pool.update_words(&codes);
            }
        }

        self.pools.add_bits(robin, bits as u64);
        self.pool_strength += bits as u64;

        if was_not_ready {
            let now_ready = self
                .is_ready(None)
                .map(|r| r != Readiness::NOT_READY)
                .unwrap_or(false);
            if now_ready {
                let credited = self.working_strength.max(self.pool_strength);
                self.listeners
                    .fire(EventName::Seeded, Event::Seeded(credited));
            }
            if let Ok(p) = self.get_progress(None) {
                self.listeners.fire(EventName::Progress, Event::Progress(p));
            }
        }
    }

    /// Draw `nwords` 32-bit words of output, reseeding first if the
    /// readiness oracle requires it.
    pub fn random_words(
        &mut self,
        nwords: usize,
        paranoia: Option<u8>,
    ) -> Result<Vec<u32>, RngError> {
        let state = self.is_ready(paranoia)?;
        if !state.contains(Readiness::READY) {
            return Err(RngError::NotReady);
        }
        // A `READY` oracle result only means enough entropy has been
        // accounted; the output stage itself is still unkeyed until its
        // first reseed. Force that first reseed here rather than calling
        // into an unkeyed cipher.
        if state.contains(Readiness::REQUIRES_RESEED) || !self.output.is_keyed() {
            self.reseed_from_pools(false);
        }
        Ok(self.output.generate(nwords))
    }

    /// Register a listener for `name`. Returns an opaque handle usable with
    /// [`Generator::remove_event_listener`].
    pub fn add_event_listener(
        &mut self,
        name: EventName,
        listener: impl FnMut(Event) + 'static,
    ) -> ListenerId {
        self.listeners.add(name, listener)
    }

    /// Remove a previously registered listener by its handle.
    pub fn remove_event_listener(&mut self, name: EventName, id: ListenerId) {
        self.listeners.remove(name, id);
    }

    /// Idempotently mark external collectors as started. See
    /// [`collectors`] for the adapters this gates.
    pub fn start_collectors(&mut self) {
        if !self.collectors_started {
            self.collectors_started = true;
            log::debug!("entropy collectors started");
        }
    }

    /// Idempotently mark external collectors as stopped.
    pub fn stop_collectors(&mut self) {
        if self.collectors_started {
            self.collectors_started = false;
            log::debug!("entropy collectors stopped");
        }
    }

    pub(crate) fn collectors_started(&self) -> bool {
        self.collectors_started
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "rand-core")]
mod rand_core_impl {
    use super::Generator;

    impl rand_core::RngCore for Generator {
        fn next_u32(&mut self) -> u32 {
            self.random_words(1, None)
                .expect("Generator::next_u32 called before readiness; add entropy first")[0]
        }

        fn next_u64(&mut self) -> u64 {
            let words = self
                .random_words(2, None)
                .expect("Generator::next_u64 called before readiness; add entropy first");
            (words[0] as u64) | ((words[1] as u64) << 32)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.try_fill_bytes(dest)
                .expect("Generator::fill_bytes called before readiness; add entropy first");
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            let nwords = dest.len().div_ceil(4);
            let words = self
                .random_words(nwords, None)
                .map_err(|_| rand_core::Error::new(super::error::RngError::NotReady))?;
            for (chunk, word) in dest.chunks_mut(4).zip(words.iter()) {
                let bytes = word.to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
            Ok(())
        }
    }

    impl rand_core::CryptoRng for Generator {}
}
