//! PMTK command catalog
//!
//! Each command knows how to build its framed request sentence and how to
//! parse the device's acknowledgment. The catalog is plain data: one variant
//! per command, validation up front, no I/O.

use std::sync::OnceLock;

use regex::Regex;

use super::{sentence, PmtkError};

/// Baud rates accepted by the `PMTK251` command (0 keeps the device default)
pub const VALID_BAUD_RATES: [u32; 11] = [
    0, 4800, 9600, 14400, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

/// NMEA sentence types selectable via `PMTK314`, with their flag positions
const NMEA_TOKENS: [(&str, usize); 7] = [
    ("GLL", 0),
    ("RMC", 1),
    ("VTG", 2),
    ("GGA", 3),
    ("GSA", 4),
    ("GSV", 5),
    ("ZDA", 17),
];

/// Number of flag fields in a `PMTK314` sentence
const NMEA_FLAG_COUNT: usize = 19;

/// PMTK commands for GPS receiver control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Test communication (`PMTK000`)
    Test,

    /// Change the device baud rate (`PMTK251`)
    SetBaudrate(u32),

    /// Select which NMEA sentence types the device streams (`PMTK314`)
    SetNmeaOutput(Vec<String>),

    /// Restore the manufacturer default NMEA output set (`PMTK314,-1`)
    ResetNmeaOutput,

    /// Set the NMEA output interval in milliseconds (`PMTK220`)
    SetNmeaOutputRate(u32),

    /// Send an arbitrary portion verbatim, framed and checksummed
    Custom(String),
}

impl Command {
    /// Build the complete request sentence, validating parameters first
    ///
    /// Validation failures surface here, before any I/O is attempted.
    pub fn request(&self) -> Result<String, PmtkError> {
        Ok(sentence::frame(&self.portion()?))
    }

    /// Parse the device's raw response line for this command
    ///
    /// Catalog commands expect a standard `PMTK001` acknowledgment; `Custom`
    /// passes the response through untouched.
    pub fn parse_ack(&self, raw: &str) -> Result<String, PmtkError> {
        match self {
            Command::Custom(_) => Ok(raw.to_string()),
            _ => standard_ack(raw),
        }
    }

    fn portion(&self) -> Result<String, PmtkError> {
        match self {
            Command::Test => Ok("PMTK000".to_string()),
            Command::SetBaudrate(rate) => {
                if !VALID_BAUD_RATES.contains(rate) {
                    return Err(PmtkError::InvalidParameter(format!(
                        "invalid baudrate supplied: {rate}"
                    )));
                }
                Ok(format!("PMTK251,{rate}"))
            }
            Command::SetNmeaOutput(tokens) => {
                let mut flags = [0u8; NMEA_FLAG_COUNT];
                for token in tokens {
                    let index = nmea_token_index(token).ok_or_else(|| {
                        PmtkError::InvalidParameter(format!("invalid NMEA token: {token}"))
                    })?;
                    flags[index] = 1;
                }
                let joined = flags
                    .iter()
                    .map(|flag| flag.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                Ok(format!("PMTK314,{joined}"))
            }
            Command::ResetNmeaOutput => Ok("PMTK314,-1".to_string()),
            Command::SetNmeaOutputRate(ms) => {
                if !(50..=5000).contains(ms) {
                    return Err(PmtkError::InvalidParameter(format!(
                        "invalid NMEA output rate: {ms}ms (must be 50-5000)"
                    )));
                }
                Ok(format!("PMTK220,{ms}"))
            }
            Command::Custom(portion) => Ok(portion.clone()),
        }
    }
}

fn nmea_token_index(token: &str) -> Option<usize> {
    NMEA_TOKENS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, index)| *index)
}

/// Parse a standard `PMTK001` acknowledgment sentence
///
/// Returns the raw sentence on status 3 (success). The other status codes
/// map to their own error variants, carrying the echoed command id.
pub fn standard_ack(raw: &str) -> Result<String, PmtkError> {
    if !sentence::verify(raw) {
        return Err(PmtkError::Checksum(raw.to_string()));
    }
    let parts = sentence::split(raw)?;
    let fields: Vec<&str> = parts.portion.split(',').collect();
    if fields.len() != 3 {
        return Err(PmtkError::UnexpectedFormat(raw.to_string()));
    }
    if fields[0] != "PMTK001" {
        return Err(PmtkError::NotAnAcknowledgment(raw.to_string()));
    }
    match fields[2] {
        "0" => Err(PmtkError::InvalidCommand(fields[1].to_string())),
        "1" => Err(PmtkError::UnsupportedCommand(fields[1].to_string())),
        "2" => Err(PmtkError::ActionFailed(fields[1].to_string())),
        "3" => Ok(raw.to_string()),
        _ => Err(PmtkError::UnexpectedResponse(raw.to_string())),
    }
}

/// True if the line contains a complete PMTK sentence with a checksum
///
/// Generic "is this a PMTK reply" test, for commands whose echoed id is not
/// known ahead of time.
pub fn looks_like_pmtk_sentence(line: &str) -> bool {
    static PMTK_RE: OnceLock<Regex> = OnceLock::new();
    let re = PMTK_RE.get_or_init(|| Regex::new(r"\$PMTK[,.a-zA-Z0-9]+\*[0-9]{2}").unwrap());
    re.is_match(line)
}

/// Loose syntactic sanity check used while the baud rate is still unknown
///
/// The whole line must consist of sentence characters (`$ , * .` and ASCII
/// alphanumerics). Deliberately weaker than [`looks_like_pmtk_sentence`]:
/// at an untested rate we only care whether the bytes decode cleanly.
pub fn probe_matcher(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '$' | ',' | '*' | '.'))
}
