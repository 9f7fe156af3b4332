//! Device sessions
//!
//! A session owns the device path and baud rate and serializes commands: at
//! most one transaction is in flight at a time, and a second `invoke` while
//! one is outstanding is rejected rather than queued. No port handle is held
//! between commands; every transaction opens and closes the serial channel
//! itself.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use super::commands::{looks_like_pmtk_sentence, Command};
use super::detect::detect_baud_rate;
use super::transaction::{self, TransactionSpec};
use super::transport::{SerialTransport, Transport};
use super::{PmtkError, DEFAULT_BAUD_RATE};

/// How a session picks its baud rate
///
/// Serializes as the string `"detect"` or as a bare number, so a config file
/// can say `"baud": 9600` or `"baud": "detect"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BaudRepr", into = "BaudRepr")]
pub enum BaudSetting {
    /// Probe the candidate list and adopt whatever rate the device answers at
    Detect,

    /// Use this rate without probing
    Fixed(u32),
}

impl Default for BaudSetting {
    fn default() -> Self {
        BaudSetting::Fixed(DEFAULT_BAUD_RATE)
    }
}

/// Wire form of [`BaudSetting`]: a number, or the keyword `"detect"`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum BaudRepr {
    Rate(u32),
    Keyword(String),
}

impl TryFrom<BaudRepr> for BaudSetting {
    type Error = String;

    fn try_from(repr: BaudRepr) -> Result<Self, String> {
        match repr {
            BaudRepr::Rate(rate) => Ok(BaudSetting::Fixed(rate)),
            BaudRepr::Keyword(word) if word == "detect" => Ok(BaudSetting::Detect),
            BaudRepr::Keyword(word) => {
                Err(format!("expected a baud rate or \"detect\", got {word:?}"))
            }
        }
    }
}

impl From<BaudSetting> for BaudRepr {
    fn from(setting: BaudSetting) -> Self {
        match setting {
            BaudSetting::Detect => BaudRepr::Keyword("detect".to_string()),
            BaudSetting::Fixed(rate) => BaudRepr::Rate(rate),
        }
    }
}

/// Serializable description of a session, for config-driven setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Serial device path (e.g. "/dev/ttyUSB0")
    pub device: String,

    /// Baud-rate selection; defaults to a fixed 9600
    #[serde(default)]
    pub baud: BaudSetting,
}

/// A handle to one GPS device
///
/// Generic over [`Transport`] so tests can run against an in-memory fake;
/// real callers use [`Session::connect`].
pub struct Session<T: Transport = SerialTransport> {
    transport: T,
    device: String,
    baud_rate: u32,
    busy: AtomicBool,
}

impl Session<SerialTransport> {
    /// Open a session on a real serial device
    ///
    /// With [`BaudSetting::Detect`] the candidate rates are probed first and
    /// the detected rate is adopted for the session's lifetime.
    pub async fn connect(
        device: impl Into<String>,
        baud: BaudSetting,
    ) -> Result<Self, PmtkError> {
        Self::with_transport(SerialTransport, device, baud).await
    }

    /// Open a session described by a [`SessionConfig`]
    pub async fn from_config(config: &SessionConfig) -> Result<Self, PmtkError> {
        Self::connect(config.device.clone(), config.baud).await
    }
}

impl<T: Transport> Session<T> {
    /// Open a session over a custom transport
    pub async fn with_transport(
        transport: T,
        device: impl Into<String>,
        baud: BaudSetting,
    ) -> Result<Self, PmtkError> {
        let device = device.into();
        let baud_rate = match baud {
            BaudSetting::Detect => detect_baud_rate(&transport, &device).await?,
            BaudSetting::Fixed(rate) => rate,
        };
        tracing::debug!("session on {device} at {baud_rate} baud");

        Ok(Self {
            transport,
            device,
            baud_rate,
            busy: AtomicBool::new(false),
        })
    }

    /// Device path this session talks to
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Baud rate in use, detected or configured
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Send one command and return its parsed acknowledgment
    ///
    /// Fails with [`PmtkError::Busy`] while another invoke is outstanding:
    /// the session is a mutual-exclusion gate, not a queue. Parameter
    /// validation happens before any I/O; acknowledgment errors surface only
    /// after the transaction itself has succeeded.
    pub async fn invoke(&self, command: Command) -> Result<String, PmtkError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(PmtkError::Busy);
        }
        // Cleared on every exit path, including cancellation
        let _guard = BusyGuard(&self.busy);

        let request = command.request()?;
        let spec = TransactionSpec::new(request, looks_like_pmtk_sentence);
        let raw =
            transaction::execute(&self.transport, &self.device, self.baud_rate, &spec).await?;
        command.parse_ack(&raw)
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
