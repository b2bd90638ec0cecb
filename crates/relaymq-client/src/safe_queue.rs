//! Acknowledge-on-success dispatch.
//!
//! Collects per-destination handlers and invokes one for each delivered
//! message. A message is acknowledged only after its handler returns
//! `Ok`; a failed handler leaves the message unacknowledged so the broker
//! redelivers it. No local retry, no backoff.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;

use tracing::debug;

use crate::client::Client;
use crate::error::{ClientError, Result};

/// A subscription handler. Returning `Err` suppresses the ack and the
/// error propagates to whoever drives the dispatcher.
pub type Handler =
    Box<dyn FnMut(&[u8]) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>>;

/// Dispatches delivered messages to per-destination handlers with
/// ack-on-success semantics.
///
/// Constructed with ack mode already requested: every subscription made
/// through here expects explicit per-message acknowledgement.
pub struct SafeQueue<S = TcpStream> {
    client: Client<S>,
    handlers: HashMap<String, Handler>,
}

impl SafeQueue<TcpStream> {
    /// Connect to a broker and request ack mode.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::from_client(Client::connect(host, port)?)
    }

    /// Close the underlying session.
    pub fn close(self) -> Result<()> {
        self.client.close()
    }
}

impl<S: Read + Write> SafeQueue<S> {
    /// Wrap an existing session, requesting ack mode on it.
    pub fn from_client(mut client: Client<S>) -> Result<Self> {
        client.request_ack()?;
        Ok(Self {
            client,
            handlers: HashMap::new(),
        })
    }

    /// Subscribe to a destination and register its handler.
    ///
    /// The last handler registered for a destination wins; there is no
    /// fan-out.
    pub fn subscribe<F>(&mut self, destination: impl Into<String>, handler: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>
            + 'static,
    {
        let destination = destination.into();
        self.client.subscribe(destination.clone())?;
        self.handlers.insert(destination, Box::new(handler));
        Ok(())
    }

    /// Block for one data message and dispatch it.
    ///
    /// The handler runs synchronously; the ack goes out only after it
    /// returns `Ok`. A handler error propagates as
    /// [`ClientError::Handler`] with no ack sent. A message for a
    /// destination without a handler is dropped unacknowledged — the
    /// broker will redeliver it to someone else.
    pub fn process_one(&mut self) -> Result<()> {
        let msg = self.client.read_message()?;

        let Some(handler) = self.handlers.get_mut(&msg.destination) else {
            debug!(
                destination = %msg.destination,
                "no handler registered; leaving message unacknowledged"
            );
            return Ok(());
        };

        handler(&msg.payload).map_err(|source| ClientError::Handler {
            destination: msg.destination.clone(),
            source,
        })?;

        match msg.id {
            Some(id) => self.client.ack(id)?,
            None => debug!(
                destination = %msg.destination,
                "delivered message has no id; skipping ack"
            ),
        }
        Ok(())
    }

    /// Process messages forever.
    ///
    /// The first error — a failed handler included — stops the loop and
    /// propagates; the connection stays open, and restarting is the
    /// caller's call.
    pub fn process(&mut self) -> Result<()> {
        loop {
            self.process_one()?;
        }
    }

    /// Access the underlying session (e.g. to flush or request stats).
    pub fn client_mut(&mut self) -> &mut Client<S> {
        &mut self.client
    }
}

#[cfg(unix)]
impl<S: Read + Write + std::os::fd::AsRawFd> SafeQueue<S> {
    /// Dispatch one message if the transport has data ready, otherwise
    /// return immediately.
    ///
    /// Returns whether a message was processed. Never blocks the caller.
    pub fn poll(&mut self) -> Result<bool> {
        if self.client.ready(std::time::Duration::ZERO)? {
            self.process_one()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
