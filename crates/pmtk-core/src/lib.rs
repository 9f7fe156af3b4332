//! # PMTK Core Library
//!
//! Core functionality for driving MediaTek GPS receivers over a serial line
//! using the PMTK command protocol.

#![warn(missing_docs)]

//!
//! This library provides:
//! - Checksummed `$...*CC\r\n` sentence framing and validation
//! - A PMTK command catalog (test, baud rate, NMEA output selection and rate)
//! - Single request/response serial transactions with flush-and-timeout
//!   semantics
//! - Baud-rate auto-detection across the common candidate rates
//!
//! ## Example
//!
//! ```rust,ignore
//! use pmtk_core::protocol::{BaudSetting, Command, Session};
//!
//! // Probe for the receiver's current baud rate, then talk to it
//! let session = Session::connect("/dev/ttyUSB0", BaudSetting::Detect).await?;
//! session.invoke(Command::Test).await?;
//! session
//!     .invoke(Command::SetNmeaOutput(vec!["GGA".into(), "RMC".into()]))
//!     .await?;
//! ```

pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        BaudSetting, Command, PmtkError, Session, SessionConfig, Transport,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
