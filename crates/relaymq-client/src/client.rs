//! The broker session: one stream, one logical sequence of sends and
//! blocking reads.
//!
//! Control traffic shares the stream with data. Outgoing control
//! operations are encoded Actions wrapped in a message addressed to the
//! reserved control destination; inbound messages for that destination are
//! intercepted here and never surfaced to application code.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::Bytes;
use tracing::{debug, info, warn};

use relaymq_frame::{FrameConfig, FrameReader, FrameWriter};
use relaymq_wire::{Action, BondRequest, ConnectionConfigure, Message, WireError};

use crate::error::{ClientError, Result};

/// The broker's default listening port.
pub const DEFAULT_PORT: u16 = 7621;

/// Reserved destination marking a message as a control frame.
pub const CONTROL_DESTINATION: &str = "+";

/// An inbound frame, resolved into data or control at the session boundary.
enum Inbound {
    Data(Message),
    Control(Action),
}

/// A connected broker session.
///
/// Owns its transport exclusively; single-threaded, blocking I/O. All
/// reads may block until the broker sends bytes. Dropping (or [`close`])
/// is the only teardown.
///
/// [`close`]: Client::close
pub struct Client<S = TcpStream> {
    reader: FrameReader<S>,
    writer: FrameWriter<S>,
    // Last locally requested configuration; fire-and-forget, the broker
    // never confirms it.
    ack_requested: bool,
    confirm_requested: bool,
}

impl Client<TcpStream> {
    /// Connect to a broker.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_config(host, port, FrameConfig::default())
    }

    /// Connect to a broker on [`DEFAULT_PORT`].
    pub fn connect_default(host: &str) -> Result<Self> {
        Self::connect(host, DEFAULT_PORT)
    }

    /// Connect with explicit frame configuration; read/write timeouts are
    /// applied to the socket.
    pub fn connect_with_config(host: &str, port: u16, config: FrameConfig) -> Result<Self> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        let reader_stream = stream.try_clone()?;
        info!(host, port, "connected to broker");
        Ok(Self::from_parts_with_config(reader_stream, stream, config))
    }

    /// Shut the connection down. Consumes the session; a second close is
    /// unrepresentable.
    pub fn close(self) -> Result<()> {
        self.writer.get_ref().shutdown(Shutdown::Both)?;
        Ok(())
    }

    /// Clone the underlying socket handle.
    ///
    /// Shutting the clone down from another thread (or a signal handler)
    /// makes a blocked read return
    /// [`ConnectionClosed`](relaymq_frame::FrameError::ConnectionClosed)
    /// instead of waiting for the next frame.
    pub fn try_clone_stream(&self) -> Result<TcpStream> {
        Ok(self.writer.get_ref().try_clone()?)
    }
}

impl<S: Read + Write> Client<S> {
    /// Build a session from separate read and write streams (typically two
    /// clones of one socket).
    pub fn from_parts(reader_stream: S, writer_stream: S) -> Self {
        Self::from_parts_with_config(reader_stream, writer_stream, FrameConfig::default())
    }

    /// Build a session from streams with explicit frame configuration.
    pub fn from_parts_with_config(reader_stream: S, writer_stream: S, config: FrameConfig) -> Self {
        Self {
            reader: FrameReader::with_config(reader_stream, config.clone()),
            writer: FrameWriter::with_config(writer_stream, config),
            ack_requested: false,
            confirm_requested: false,
        }
    }

    /// Send one configuration change to the broker.
    ///
    /// Fire-and-forget: the broker applies it in stream order but never
    /// confirms.
    pub fn configure(&mut self, cfg: ConnectionConfigure) -> Result<()> {
        if cfg.ack == Some(true) {
            self.ack_requested = true;
        }
        if cfg.confirm == Some(true) {
            self.confirm_requested = true;
        }
        self.send_action(&Action::Configure(cfg))
    }

    /// Ask the broker to copy all traffic to this connection.
    pub fn tap(&mut self) -> Result<()> {
        self.configure(ConnectionConfigure {
            tap: Some(true),
            ..ConnectionConfigure::default()
        })
    }

    /// Require per-message acknowledgement before the broker considers a
    /// delivery done.
    pub fn request_ack(&mut self) -> Result<()> {
        self.configure(ConnectionConfigure {
            ack: Some(true),
            ..ConnectionConfigure::default()
        })
    }

    /// Require per-message confirmation (broker-defined, distinct from ack).
    pub fn request_confirm(&mut self) -> Result<()> {
        self.configure(ConnectionConfigure {
            confirm: Some(true),
            ..ConnectionConfigure::default()
        })
    }

    /// Limit how many unacknowledged deliveries the broker keeps in flight.
    pub fn set_inflight_max(&mut self, max: u32) -> Result<()> {
        self.configure(ConnectionConfigure {
            inflight: Some(max),
            ..ConnectionConfigure::default()
        })
    }

    /// Whether ack mode has been requested on this session.
    pub fn ack_requested(&self) -> bool {
        self.ack_requested
    }

    /// Whether confirm mode has been requested on this session.
    pub fn confirm_requested(&self) -> bool {
        self.confirm_requested
    }

    /// Subscribe this connection to a destination.
    pub fn subscribe(&mut self, destination: impl Into<String>) -> Result<()> {
        self.send_action(&Action::Subscribe {
            destination: destination.into(),
        })
    }

    /// Flush queued messages for a destination.
    pub fn flush(&mut self, destination: impl Into<String>) -> Result<()> {
        self.send_action(&Action::Flush {
            destination: destination.into(),
        })
    }

    /// Acknowledge a delivered message by id.
    pub fn ack(&mut self, id: u64) -> Result<()> {
        self.send_action(&Action::Ack { id })
    }

    /// Confirm a delivered message by id.
    pub fn confirm(&mut self, id: u64) -> Result<()> {
        self.send_action(&Action::Confirm { id })
    }

    /// Ask the broker for occupancy stats on a destination. The reply
    /// arrives as a stat-flagged message; see [`Message::as_stat`].
    pub fn request_stat(&mut self, destination: impl Into<String>) -> Result<()> {
        self.send_action(&Action::RequestStat {
            destination: destination.into(),
        })
    }

    /// Switch a destination to broadcast mode.
    pub fn make_broadcast(&mut self, destination: impl Into<String>) -> Result<()> {
        self.send_action(&Action::MakeBroadcast {
            destination: destination.into(),
        })
    }

    /// Switch a destination to transient storage.
    pub fn make_transient(&mut self, destination: impl Into<String>) -> Result<()> {
        self.send_action(&Action::MakeTransient {
            destination: destination.into(),
        })
    }

    /// Switch a destination to durable storage.
    pub fn make_durable(&mut self, destination: impl Into<String>) -> Result<()> {
        self.send_action(&Action::MakeDurable {
            destination: destination.into(),
        })
    }

    /// Switch a destination to ephemeral mode.
    pub fn make_ephemeral(&mut self, destination: impl Into<String>) -> Result<()> {
        self.send_action(&Action::MakeEphemeral {
            destination: destination.into(),
        })
    }

    /// Bind a durable queue to a delivery destination.
    pub fn request_bond(
        &mut self,
        queue: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<()> {
        self.send_action(&Action::Bond(BondRequest {
            queue: queue.into(),
            destination: destination.into(),
        }))
    }

    /// Publish a payload to a destination.
    pub fn broadcast(
        &mut self,
        destination: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Result<()> {
        self.send_message(&Message::new(destination, payload))
    }

    /// Publish a payload to a queue destination. Same wire traffic as
    /// [`broadcast`](Client::broadcast); delivery semantics are decided by
    /// the destination's mode on the broker.
    pub fn queue(
        &mut self,
        destination: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Result<()> {
        self.broadcast(destination, payload)
    }

    /// Encode and frame one message onto the stream.
    pub fn send_message(&mut self, msg: &Message) -> Result<()> {
        self.writer.send(&msg.to_bytes())?;
        Ok(())
    }

    fn send_action(&mut self, action: &Action) -> Result<()> {
        debug!(code = action.code(), "sending control action");
        self.send_message(&Message::new(CONTROL_DESTINATION, action.to_bytes()))
    }

    /// Block until the next data message arrives.
    ///
    /// Inbound control frames are consumed and processed in stream order
    /// before the next frame is read, so any number of them may be handled
    /// before this returns. A queue-error control frame raises
    /// [`ClientError::Queue`]; any other inbound action raises
    /// [`ClientError::Protocol`].
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            let frame = self.reader.read_frame()?;
            let msg = Message::decode(&frame)?;
            match classify(msg)? {
                Inbound::Data(msg) => return Ok(msg),
                Inbound::Control(action) => self.handle_control(action)?,
            }
        }
    }

    /// Block until the next data message arrives and return its payload.
    pub fn read(&mut self) -> Result<Bytes> {
        Ok(self.read_message()?.payload)
    }

    fn handle_control(&mut self, action: Action) -> Result<()> {
        match action {
            Action::QueueError(err) => {
                warn!(queue = %err.queue, error = %err.error, "broker reported queue error");
                Err(ClientError::Queue {
                    queue: err.queue,
                    error: err.error,
                })
            }
            other => Err(ClientError::Protocol(other.code())),
        }
    }
}

#[cfg(unix)]
impl<S: Read + Write + std::os::fd::AsRawFd> Client<S> {
    /// Probe whether a read would make progress without blocking.
    ///
    /// Bounded by `timeout`; `Duration::ZERO` never waits. Readiness means
    /// a read attempt will not block at the socket level, not that a full
    /// frame has arrived.
    pub fn ready(&self, timeout: std::time::Duration) -> Result<bool> {
        Ok(self.reader.ready(timeout)?)
    }
}

fn classify(msg: Message) -> Result<Inbound> {
    if msg.destination != CONTROL_DESTINATION {
        return Ok(Inbound::Data(msg));
    }
    match Action::decode(&msg.payload) {
        Ok(action) => Ok(Inbound::Control(action)),
        Err(WireError::UnknownAction(code)) => Err(ClientError::Protocol(code)),
        Err(err) => Err(err.into()),
    }
}
