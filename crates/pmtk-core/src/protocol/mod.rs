//! PMTK Serial Protocol
//!
//! Implements the MediaTek PMTK command protocol for GPS receivers:
//! checksummed ASCII sentences, one-shot request/response transactions over
//! a serial line, and baud-rate auto-detection.

pub mod commands;
mod detect;
mod error;
pub mod sentence;
pub mod serial;
mod session;
mod transaction;
mod transport;

pub use commands::{looks_like_pmtk_sentence, probe_matcher, standard_ack, Command};
pub use detect::{detect_baud_rate, PROBE_BAUD_RATES};
pub use error::PmtkError;
pub use serial::{list_ports, PortInfo};
pub use session::{BaudSetting, Session, SessionConfig};
pub use transaction::{execute, TransactionSpec};
pub use transport::{LineChannel, LineCodec, SerialChannel, SerialTransport, Transport};

/// Default baud rate when the caller does not specify one
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Timeout for one request/response transaction in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Sentence terminator used by PMTK devices
pub const NEWLINE: &str = "\r\n";
