//! Sentence framing and checksums
//!
//! Implements the `$<portion>*<checksum>\r\n` envelope shared by PMTK
//! commands and their acknowledgments. The checksum is the XOR fold of every
//! byte between the `$` and the `*`, rendered as two uppercase hex digits.

use super::{PmtkError, NEWLINE};

/// A sentence split into its checksummed parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSentence {
    /// Everything strictly between `$` and `*`
    pub portion: String,
    /// Everything after `*`; callers that keep a trailing newline here will
    /// fail verification
    pub checksum: String,
}

/// Compute the checksum of a sentence portion
///
/// XOR of all byte values, as a two-digit uppercase hex string.
pub fn checksum(portion: &str) -> String {
    let sum = portion.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("{:02X}", sum)
}

/// Frame a portion into a complete sentence with `$`, `*`, checksum and CRLF
pub fn frame(portion: &str) -> String {
    format!("${}*{}{}", portion, checksum(portion), NEWLINE)
}

/// Split a raw sentence at its first `$` and the first `*` after it
pub fn split(sentence: &str) -> Result<SplitSentence, PmtkError> {
    let dollar = sentence
        .find('$')
        .ok_or_else(|| PmtkError::MalformedSentence(sentence.to_string()))?;
    let star = sentence[dollar..]
        .find('*')
        .map(|offset| dollar + offset)
        .ok_or_else(|| PmtkError::MalformedSentence(sentence.to_string()))?;

    Ok(SplitSentence {
        portion: sentence[dollar + 1..star].to_string(),
        checksum: sentence[star + 1..].to_string(),
    })
}

/// Check that a sentence's checksum field matches its portion
///
/// The comparison is exact: lowercase hex digits do not verify.
pub fn verify(sentence: &str) -> bool {
    match split(sentence) {
        Ok(parts) => checksum(&parts.portion) == parts.checksum,
        Err(_) => false,
    }
}
