//! The typed entropy-submission variant and the conservative bit estimators
//! used when a caller does not supply an explicit `estimated_bits`.

/// A single entropy submission, as a closed, statically checked variant:
/// the core never inspects runtime types, so there is no "unsupported
/// type" failure mode at this layer (see `RngError::InvalidInput` for
/// where that check actually lives, at the collector-adapter boundary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntropyInput {
    /// A single 32-bit word, e.g. a keystroke code.
    Word(u32),
    /// An ordered sequence of 32-bit words, e.g. a pointer position.
    Words(Vec<u32>),
    /// A text string, fed to the pool as its character-code stream.
    Text(String),
}

/// Bit-length of `v`, i.e. `floor(log2(v)) + 1`, or `0` for `v == 0`.
fn bit_length(v: u32) -> u32 {
    32 - v.leading_zeros()
}

/// Estimate the entropy, in bits, of a sequence of words when the caller
/// does not supply an explicit estimate: the sum of each element's bit
/// length, capped at 32 bits per element (see `DESIGN.md` for why the cap
/// exists).
pub(crate) fn estimate_words_bits(words: &[u32]) -> u32 {
    words.iter().map(|&v| bit_length(v).min(32)).sum()
}

/// Estimate the entropy, in bits, of a text submission when the caller does
/// not supply an explicit estimate: one bit per character, a deliberately
/// conservative default.
pub(crate) fn estimate_text_bits(text: &str) -> u32 {
    text.chars().count() as u32
}

/// The discriminant tag fed into the pool header: `1`/`2`/`3` for word /
/// word-sequence / text submissions.
pub(crate) fn type_tag(input: &EntropyInput) -> u32 {
    match input {
        EntropyInput::Word(_) => 1,
        EntropyInput::Words(_) => 2,
        EntropyInput::Text(_) => 3,
    }
}

/// The payload length field recorded in the header: `1` for a single word,
/// the element count for a word sequence, the character count for text.
pub(crate) fn payload_len(input: &EntropyInput) -> u32 {
    match input {
        EntropyInput::Word(_) => 1,
        EntropyInput::Words(words) => words.len() as u32,
        EntropyInput::Text(text) => text.chars().count() as u32,
    }
}
