//! Control-plane operations.
//!
//! On the wire an Action is three fields (`type`, `payload`, `id`) where the
//! payload's interpretation depends entirely on the type code. That tagged
//! union is surfaced here as a sum type: each variant owns its decoded
//! payload, and decode validates the tag before touching the payload.

use bytes::{Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::varint::{
    expect_wire_type, get_key, get_len_bytes, get_varint, put_bool_field, put_bytes_field,
    put_i32_field, put_str_field, put_u32_field, put_u64_field, require_utf8, skip_field, WT_LEN,
    WT_VARINT,
};

/// A control-plane operation, sent (or received) as the payload of a
/// message addressed to the control destination.
///
/// The numeric codes are wire-stable; see [`Action::code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Subscribe the connection to a destination (code 1).
    Subscribe { destination: String },
    /// Adjust session configuration (code 2).
    Configure(ConnectionConfigure),
    /// Flush queued messages for a destination (code 4).
    Flush { destination: String },
    /// Acknowledge a delivered message (code 6).
    Ack { id: u64 },
    /// Confirm a delivered message (code 8).
    Confirm { id: u64 },
    /// Request occupancy stats for a destination (code 9).
    RequestStat { destination: String },
    /// Switch a destination to broadcast mode (code 10).
    MakeBroadcast { destination: String },
    /// Switch a destination to transient storage (code 11).
    MakeTransient { destination: String },
    /// Switch a destination to durable storage (code 12).
    MakeDurable { destination: String },
    /// Broker-reported fault for a queue (code 13, broker to client only).
    QueueError(QueueError),
    /// Bind a durable queue to a delivery destination (code 14).
    Bond(BondRequest),
    /// Switch a destination to ephemeral mode (code 15).
    MakeEphemeral { destination: String },
}

impl Action {
    /// The wire-stable operation code for this action.
    pub fn code(&self) -> i32 {
        match self {
            Action::Subscribe { .. } => 1,
            Action::Configure(_) => 2,
            Action::Flush { .. } => 4,
            Action::Ack { .. } => 6,
            Action::Confirm { .. } => 8,
            Action::RequestStat { .. } => 9,
            Action::MakeBroadcast { .. } => 10,
            Action::MakeTransient { .. } => 11,
            Action::MakeDurable { .. } => 12,
            Action::QueueError(_) => 13,
            Action::Bond(_) => 14,
            Action::MakeEphemeral { .. } => 15,
        }
    }

    fn wire_payload(&self) -> Option<Bytes> {
        match self {
            Action::Subscribe { destination }
            | Action::Flush { destination }
            | Action::RequestStat { destination }
            | Action::MakeBroadcast { destination }
            | Action::MakeTransient { destination }
            | Action::MakeDurable { destination }
            | Action::MakeEphemeral { destination } => {
                Some(Bytes::copy_from_slice(destination.as_bytes()))
            }
            Action::Configure(cfg) => {
                let mut dst = BytesMut::new();
                cfg.encode(&mut dst);
                Some(dst.freeze())
            }
            Action::QueueError(err) => {
                let mut dst = BytesMut::new();
                err.encode(&mut dst);
                Some(dst.freeze())
            }
            Action::Bond(bond) => {
                let mut dst = BytesMut::new();
                bond.encode(&mut dst);
                Some(dst.freeze())
            }
            Action::Ack { .. } | Action::Confirm { .. } => None,
        }
    }

    fn wire_id(&self) -> Option<u64> {
        match self {
            Action::Ack { id } | Action::Confirm { id } => Some(*id),
            _ => None,
        }
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        put_i32_field(dst, 1, self.code());
        if let Some(payload) = self.wire_payload() {
            put_bytes_field(dst, 2, &payload);
        }
        if let Some(id) = self.wire_id() {
            put_u64_field(dst, 3, id);
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut code = None;
        let mut payload: Option<Bytes> = None;
        let mut id = None;

        while let Some((field, wt)) = get_key(&mut buf)? {
            match field {
                1 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    code = Some(get_varint(&mut buf)? as i32);
                }
                2 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    payload = Some(Bytes::copy_from_slice(get_len_bytes(&mut buf)?));
                }
                3 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    id = Some(get_varint(&mut buf)?);
                }
                _ => skip_field(&mut buf, field, wt)?,
            }
        }

        let code = code.ok_or(WireError::MissingField {
            entity: "Action",
            field: "type",
        })?;

        fn destination_payload(payload: Option<Bytes>) -> Result<String> {
            let bytes = payload.ok_or(WireError::MissingField {
                entity: "Action",
                field: "payload",
            })?;
            require_utf8(&bytes, "payload")
        }
        fn nested_payload(payload: &Option<Bytes>) -> Result<&Bytes> {
            payload.as_ref().ok_or(WireError::MissingField {
                entity: "Action",
                field: "payload",
            })
        }
        let target_id = id.ok_or(WireError::MissingField {
            entity: "Action",
            field: "id",
        });

        match code {
            1 => Ok(Action::Subscribe {
                destination: destination_payload(payload)?,
            }),
            2 => Ok(Action::Configure(ConnectionConfigure::decode(
                nested_payload(&payload)?,
            )?)),
            4 => Ok(Action::Flush {
                destination: destination_payload(payload)?,
            }),
            6 => Ok(Action::Ack { id: target_id? }),
            8 => Ok(Action::Confirm { id: target_id? }),
            9 => Ok(Action::RequestStat {
                destination: destination_payload(payload)?,
            }),
            10 => Ok(Action::MakeBroadcast {
                destination: destination_payload(payload)?,
            }),
            11 => Ok(Action::MakeTransient {
                destination: destination_payload(payload)?,
            }),
            12 => Ok(Action::MakeDurable {
                destination: destination_payload(payload)?,
            }),
            13 => Ok(Action::QueueError(QueueError::decode(nested_payload(
                &payload,
            )?)?)),
            14 => Ok(Action::Bond(BondRequest::decode(nested_payload(
                &payload,
            )?)?)),
            15 => Ok(Action::MakeEphemeral {
                destination: destination_payload(payload)?,
            }),
            other => Err(WireError::UnknownAction(other)),
        }
    }
}

/// Session configuration changes. Absent fields leave the broker default
/// untouched, so `inflight: Some(0)` and `inflight: None` mean different
/// things.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfigure {
    pub tap: Option<bool>,
    pub ack: Option<bool>,
    pub confirm: Option<bool>,
    pub inflight: Option<u32>,
}

impl ConnectionConfigure {
    pub fn encode(&self, dst: &mut BytesMut) {
        if let Some(tap) = self.tap {
            put_bool_field(dst, 1, tap);
        }
        if let Some(ack) = self.ack {
            put_bool_field(dst, 2, ack);
        }
        if let Some(confirm) = self.confirm {
            put_bool_field(dst, 3, confirm);
        }
        if let Some(inflight) = self.inflight {
            put_u32_field(dst, 4, inflight);
        }
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut cfg = Self::default();

        while let Some((field, wt)) = get_key(&mut buf)? {
            match field {
                1 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    cfg.tap = Some(get_varint(&mut buf)? != 0);
                }
                2 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    cfg.ack = Some(get_varint(&mut buf)? != 0);
                }
                3 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    cfg.confirm = Some(get_varint(&mut buf)? != 0);
                }
                4 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    cfg.inflight = Some(get_varint(&mut buf)? as u32);
                }
                _ => skip_field(&mut buf, field, wt)?,
            }
        }

        Ok(cfg)
    }
}

/// Binds a durable queue name to a delivery destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondRequest {
    pub queue: String,
    pub destination: String,
}

impl BondRequest {
    pub fn encode(&self, dst: &mut BytesMut) {
        put_str_field(dst, 1, &self.queue);
        put_str_field(dst, 2, &self.destination);
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut queue = None;
        let mut destination = None;

        while let Some((field, wt)) = get_key(&mut buf)? {
            match field {
                1 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    queue = Some(require_utf8(get_len_bytes(&mut buf)?, "queue")?);
                }
                2 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    destination = Some(require_utf8(get_len_bytes(&mut buf)?, "destination")?);
                }
                _ => skip_field(&mut buf, field, wt)?,
            }
        }

        Ok(Self {
            queue: queue.ok_or(WireError::MissingField {
                entity: "BondRequest",
                field: "queue",
            })?,
            destination: destination.ok_or(WireError::MissingField {
                entity: "BondRequest",
                field: "destination",
            })?,
        })
    }
}

/// Broker-reported fault tied to a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueError {
    pub queue: String,
    pub error: String,
}

impl QueueError {
    pub fn encode(&self, dst: &mut BytesMut) {
        put_str_field(dst, 1, &self.queue);
        put_str_field(dst, 2, &self.error);
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut queue = None;
        let mut error = None;

        while let Some((field, wt)) = get_key(&mut buf)? {
            match field {
                1 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    queue = Some(require_utf8(get_len_bytes(&mut buf)?, "queue")?);
                }
                2 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    error = Some(require_utf8(get_len_bytes(&mut buf)?, "error")?);
                }
                _ => skip_field(&mut buf, field, wt)?,
            }
        }

        Ok(Self {
            queue: queue.ok_or(WireError::MissingField {
                entity: "QueueError",
                field: "queue",
            })?,
            error: error.ok_or(WireError::MissingField {
                entity: "QueueError",
                field: "error",
            })?,
        })
    }
}
