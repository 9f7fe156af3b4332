//! Single request/response serial transactions
//!
//! One transaction is one open-write-match-close cycle: open the port, poke
//! it with a bare newline to dislodge stale data, discard the first line that
//! comes back, write the real request, then wait for a line the matcher
//! accepts. A fixed deadline bounds the whole exchange; the channel is closed
//! on every path.

use std::time::Duration;

use super::transport::{LineChannel, Transport};
use super::{PmtkError, DEFAULT_TIMEOUT_MS, NEWLINE};

/// What one transaction sends and how it recognizes its response
pub struct TransactionSpec {
    /// Fully framed request sentence, including its CRLF
    pub request: String,
    /// Accepts the line that completes the transaction
    pub matcher: Box<dyn Fn(&str) -> bool + Send + Sync>,
    /// Line delimiter for both directions
    pub newline: &'static str,
}

impl TransactionSpec {
    /// Build a spec with the standard CRLF delimiter
    pub fn new(request: String, matcher: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            request,
            matcher: Box::new(matcher),
            newline: NEWLINE,
        }
    }
}

impl std::fmt::Debug for TransactionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSpec")
            .field("request", &self.request)
            .field("newline", &self.newline)
            .finish_non_exhaustive()
    }
}

/// Execute one request/response exchange over a freshly opened channel
///
/// Returns the first line accepted by the spec's matcher, or
/// [`PmtkError::Timeout`] if none arrives within the deadline. Transport
/// failures surface unchanged. The channel never outlives the call.
pub async fn execute<T: Transport>(
    transport: &T,
    path: &str,
    baud: u32,
    spec: &TransactionSpec,
) -> Result<String, PmtkError> {
    tracing::debug!(
        "transaction on {path} at {baud} baud: {:?}",
        spec.request.trim_end()
    );

    let mut channel = transport.open(path, baud, spec.newline.as_bytes()).await?;

    let result = match tokio::time::timeout(
        Duration::from_millis(DEFAULT_TIMEOUT_MS),
        exchange(&mut channel, spec),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(PmtkError::Timeout),
    };

    channel.close().await;

    match &result {
        Ok(line) => tracing::debug!("transaction complete: {line:?}"),
        Err(e) => tracing::debug!("transaction failed at {baud} baud: {e}"),
    }
    result
}

async fn exchange<C: LineChannel>(
    channel: &mut C,
    spec: &TransactionSpec,
) -> Result<String, PmtkError> {
    // Wake probe: a bare newline pushes any partially received sentence out
    // of the device's line buffer as the first line.
    channel.send(spec.newline.as_bytes()).await?;

    let mut flushed = false;
    loop {
        let line = match channel.next_line().await? {
            Some(line) => line,
            None => {
                return Err(PmtkError::Transport(
                    "channel closed before a matching response".to_string(),
                ))
            }
        };

        // The first line is stale data dislodged by the probe. Discard it
        // whatever it contains, and only then send the real request.
        if !flushed {
            flushed = true;
            tracing::trace!("discarding stale line: {line:?}");
            channel.send(spec.request.as_bytes()).await?;
            continue;
        }

        if (spec.matcher)(&line) {
            return Ok(line);
        }
        tracing::trace!("line did not match: {line:?}");
    }
}
