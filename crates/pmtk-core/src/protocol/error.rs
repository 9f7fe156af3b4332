//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to a GPS device
#[derive(Error, Debug)]
pub enum PmtkError {
    #[error("Malformed sentence (missing '$' or '*'): {0}")]
    MalformedSentence(String),

    #[error("Invalid checksum for: {0}")]
    Checksum(String),

    #[error("Unexpected PMTK format: {0}")]
    UnexpectedFormat(String),

    #[error("Not a valid acknowledgment: {0}")]
    NotAnAcknowledgment(String),

    #[error("Invalid command / packet: {0}")]
    InvalidCommand(String),

    #[error("Unsupported command / packet: {0}")]
    UnsupportedCommand(String),

    #[error("Valid command / packet, but action failed: {0}")]
    ActionFailed(String),

    #[error("Unexpected acknowledgment status: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No matching response before the transaction timeout")]
    Timeout,

    #[error("Serial transport error: {0}")]
    Transport(String),

    #[error("Baud rate could not be detected")]
    BaudRateNotDetected,

    #[error("Already waiting for a response from the GPS device")]
    Busy,
}
