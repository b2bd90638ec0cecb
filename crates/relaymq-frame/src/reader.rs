use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame payload (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached
    /// before a complete frame, including mid-frame.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                tracing::trace!(len = payload.len(), "frame received");
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Whether the internal buffer already holds enough bytes that the next
    /// `read_frame` call will return (or fail) without touching the stream.
    fn has_buffered_frame(&self) -> bool {
        if self.buf.len() < HEADER_SIZE {
            return false;
        }
        let mut len_bytes = [0u8; HEADER_SIZE];
        len_bytes.copy_from_slice(&self.buf[..HEADER_SIZE]);
        let payload_len = u32::from_be_bytes(len_bytes) as usize;
        // An oversized length means read_frame errors immediately instead
        // of blocking, so the reader counts as ready.
        payload_len > self.config.max_payload_size || self.buf.len() >= HEADER_SIZE + payload_len
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(unix)]
impl<T: Read + std::os::fd::AsRawFd> FrameReader<T> {
    /// Probe whether a `read_frame` call would make progress without
    /// blocking at the socket level.
    ///
    /// True if a complete frame is already buffered, or if the stream
    /// reports readable within `timeout` (pass `Duration::ZERO` to never
    /// wait). Socket readability does not guarantee a *complete* frame is
    /// available, only that a read attempt will not block on the first
    /// byte.
    pub fn ready(&self, timeout: Duration) -> Result<bool> {
        if self.has_buffered_frame() {
            return Ok(true);
        }
        poll_readable(self.inner.as_raw_fd(), timeout).map_err(FrameError::Io)
    }
}

#[cfg(unix)]
fn poll_readable(fd: std::os::fd::RawFd, timeout: Duration) -> std::io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;

    loop {
        // SAFETY: `pfd` is a valid pollfd for the duration of the call and
        // `fd` is an open descriptor owned by the caller's stream.
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        // POLLHUP/POLLERR also mean a read attempt will not block.
        return Ok(rc > 0
            && pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0);
    }
}
