//! Baud-rate auto-detection
//!
//! Probes a fixed list of candidate rates with a PMTK test transaction until
//! one of them produces a recognizable reply.

use super::commands::{probe_matcher, Command};
use super::transaction::{self, TransactionSpec};
use super::transport::Transport;
use super::PmtkError;

/// Candidate baud rates, tried in this order
///
/// The two most common rates come first; the list is deliberately not
/// numerically sorted and the order is part of the observable detection
/// latency.
pub const PROBE_BAUD_RATES: [u32; 7] = [115200, 9600, 4800, 14400, 19200, 38400, 57600];

/// Find the baud rate the device is currently configured for
///
/// Each candidate gets one probe transaction. A timeout means "wrong rate,
/// try the next one". Any other failure aborts the search immediately, since
/// it signals a real transport problem rather than a mismatched speed. The
/// probe matcher is a loose character-class check, not full PMTK validation:
/// until a rate is confirmed, all we can judge is whether the bytes decode
/// cleanly.
pub async fn detect_baud_rate<T: Transport>(transport: &T, path: &str) -> Result<u32, PmtkError> {
    let probe = TransactionSpec::new(Command::Test.request()?, probe_matcher);

    for &baud in &PROBE_BAUD_RATES {
        match transaction::execute(transport, path, baud, &probe).await {
            Ok(line) => {
                tracing::debug!("baud rate detected: {baud} (reply: {line:?})");
                return Ok(baud);
            }
            Err(PmtkError::Timeout) => {
                tracing::debug!("no reply at {baud} baud, trying next candidate");
            }
            Err(e) => return Err(e),
        }
    }

    Err(PmtkError::BaudRateNotDetected)
}
