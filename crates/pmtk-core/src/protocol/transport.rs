//! Serial transport seam
//!
//! Transactions talk to the device through the [`Transport`] and
//! [`LineChannel`] traits so the protocol logic runs identically over real
//! hardware and the in-memory fakes used in tests. The real implementation
//! opens a tokio-serial port and frames it with a newline-delimited codec.

use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tokio_util::bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, Framed};

use super::PmtkError;

/// A line-delimited channel to an open device
#[allow(async_fn_in_trait)]
pub trait LineChannel: Send {
    /// Write raw bytes, flushing them to the device
    async fn send(&mut self, bytes: &[u8]) -> Result<(), PmtkError>;

    /// Next received line, without its delimiter; `None` once the peer has
    /// closed the channel
    async fn next_line(&mut self) -> Result<Option<String>, PmtkError>;

    /// Close the channel; a no-op if it is already closed
    async fn close(&mut self);
}

/// Opens line-delimited channels to a device path at a given baud rate
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Channel type produced by [`Transport::open`]
    type Channel: LineChannel;

    /// Open the device at `baud`, splitting incoming data on `newline`
    async fn open(
        &self,
        path: &str,
        baud: u32,
        newline: &[u8],
    ) -> Result<Self::Channel, PmtkError>;
}

/// Line codec with a configurable delimiter
///
/// Decodes incoming bytes into `String` lines split on the delimiter,
/// lossily: bytes received at a mismatched baud rate are garbage but must
/// still surface as lines so the caller can reject them. Encoding writes the
/// given bytes verbatim; framed requests already carry their own CRLF.
#[derive(Debug, Clone)]
pub struct LineCodec {
    delimiter: Vec<u8>,
}

impl LineCodec {
    /// Create a codec splitting on `delimiter`
    pub fn new(delimiter: &[u8]) -> Self {
        Self {
            delimiter: delimiter.to_vec(),
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, std::io::Error> {
        let position = src
            .windows(self.delimiter.len())
            .position(|window| window == self.delimiter.as_slice());
        match position {
            Some(pos) => {
                let line = src.split_to(pos);
                src.advance(self.delimiter.len());
                Ok(Some(String::from_utf8_lossy(&line).into_owned()))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<Bytes> for LineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), std::io::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

/// Real serial transport backed by tokio-serial
///
/// Ports are opened 8N1 with no flow control, the standard GPS module
/// configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialTransport;

impl Transport for SerialTransport {
    type Channel = SerialChannel;

    async fn open(
        &self,
        path: &str,
        baud: u32,
        newline: &[u8],
    ) -> Result<SerialChannel, PmtkError> {
        let mut port = tokio_serial::new(path, baud)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| PmtkError::Transport(e.to_string()))?;

        #[cfg(unix)]
        if let Err(e) = port.set_exclusive(false) {
            tracing::warn!("could not release exclusive lock on {path}: {e}");
        }

        tracing::debug!("opened {path} at {baud} baud");

        Ok(SerialChannel {
            framed: Framed::new(port, LineCodec::new(newline)),
            open: true,
        })
    }
}

/// [`LineChannel`] over a framed tokio-serial stream
pub struct SerialChannel {
    framed: Framed<SerialStream, LineCodec>,
    open: bool,
}

impl LineChannel for SerialChannel {
    async fn send(&mut self, bytes: &[u8]) -> Result<(), PmtkError> {
        self.framed
            .send(Bytes::copy_from_slice(bytes))
            .await
            .map_err(|e| PmtkError::Transport(e.to_string()))
    }

    async fn next_line(&mut self) -> Result<Option<String>, PmtkError> {
        match self.framed.next().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(PmtkError::Transport(e.to_string())),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            if let Err(e) = self.framed.get_mut().shutdown().await {
                tracing::debug!("error closing serial port: {e}");
            }
        }
    }
}

/// Scripted in-memory transport used by transaction, detector and session
/// tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use super::{LineChannel, Transport};
    use crate::protocol::PmtkError;

    /// Behavior of the device for one `open()` at a given baud rate
    #[derive(Debug, Clone)]
    pub(crate) enum Script {
        /// Emit these lines in order, then go quiet until the timeout
        Lines(Vec<String>),
        /// Never emit a line (what a mismatched baud rate looks like when
        /// the garbage never forms a complete line)
        Silent,
        /// Fail the open itself
        OpenError(String),
        /// Emit these lines, then fail the next read
        LinesThenError(Vec<String>, String),
    }

    /// [`Transport`] that replays a per-baud-rate script
    pub(crate) struct FakeTransport {
        scripts: HashMap<u32, Script>,
        fallback: Option<Script>,
        /// Baud rates passed to `open`, in order
        pub(crate) opens: Mutex<Vec<u32>>,
        /// Everything written to any channel, in order
        pub(crate) writes: Arc<Mutex<Vec<String>>>,
    }

    impl FakeTransport {
        pub(crate) fn new(scripts: HashMap<u32, Script>) -> Self {
            Self {
                scripts,
                fallback: None,
                opens: Mutex::new(Vec::new()),
                writes: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Single script for every baud rate
        pub(crate) fn always(script: Script) -> Self {
            let mut transport = Self::new(HashMap::new());
            transport.fallback = Some(script);
            transport
        }

        pub(crate) fn opened_rates(&self) -> Vec<u32> {
            self.opens.lock().unwrap().clone()
        }

        pub(crate) fn written(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        type Channel = FakeChannel;

        async fn open(
            &self,
            _path: &str,
            baud: u32,
            _newline: &[u8],
        ) -> Result<FakeChannel, PmtkError> {
            self.opens.lock().unwrap().push(baud);
            let script = self
                .scripts
                .get(&baud)
                .or(self.fallback.as_ref())
                .cloned()
                .unwrap_or(Script::Silent);

            let (incoming, fail_after) = match script {
                Script::OpenError(msg) => return Err(PmtkError::Transport(msg)),
                Script::Lines(lines) => (lines.into(), None),
                Script::Silent => (VecDeque::new(), None),
                Script::LinesThenError(lines, msg) => (lines.into(), Some(msg)),
            };

            Ok(FakeChannel {
                incoming,
                fail_after,
                writes: Arc::clone(&self.writes),
                open: true,
            })
        }
    }

    /// Channel that pops scripted lines and records writes
    pub(crate) struct FakeChannel {
        incoming: VecDeque<String>,
        fail_after: Option<String>,
        writes: Arc<Mutex<Vec<String>>>,
        open: bool,
    }

    impl LineChannel for FakeChannel {
        async fn send(&mut self, bytes: &[u8]) -> Result<(), PmtkError> {
            self.writes
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(bytes).into_owned());
            Ok(())
        }

        async fn next_line(&mut self) -> Result<Option<String>, PmtkError> {
            if let Some(line) = self.incoming.pop_front() {
                return Ok(Some(line));
            }
            if let Some(msg) = self.fail_after.take() {
                return Err(PmtkError::Transport(msg));
            }
            // Nothing more to say: hang until the transaction deadline
            futures::future::pending().await
        }

        async fn close(&mut self) {
            self.open = false;
        }
    }
}
