use bytes::{Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::stat::Stat;
use crate::varint::{
    expect_wire_type, get_key, get_len_bytes, get_varint, put_bytes_field, put_str_field,
    put_u32_field, put_u64_field, require_utf8, skip_field, WT_LEN, WT_VARINT,
};

/// `kind` value marking a message as a stat reply.
///
/// Current broker revisions flag stat replies with a dedicated numeric kind
/// field; destination-based detection from older revisions is not supported.
pub const STAT_KIND: u32 = 1;

/// One unit of traffic on the stream: either application data for a
/// destination or, when addressed to the control destination, an encoded
/// [`Action`](crate::Action).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Logical queue/topic name, or the reserved control destination.
    pub destination: String,
    /// Application payload, or an encoded Action for control messages.
    pub payload: Bytes,
    /// Broker-assigned id, present on deliveries that expect ack/confirm.
    pub id: Option<u64>,
    /// Broker-defined flag bitmask.
    pub flags: Option<u32>,
    /// Id to echo back in a confirm.
    pub confirm_id: Option<u64>,
    /// Message kind marker; `STAT_KIND` flags a stat reply.
    pub kind: Option<u32>,
}

impl Message {
    pub fn new(destination: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            destination: destination.into(),
            payload: payload.into(),
            id: None,
            flags: None,
            confirm_id: None,
            kind: None,
        }
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        put_str_field(dst, 1, &self.destination);
        put_bytes_field(dst, 2, &self.payload);
        if let Some(id) = self.id {
            put_u64_field(dst, 3, id);
        }
        if let Some(flags) = self.flags {
            put_u32_field(dst, 4, flags);
        }
        if let Some(confirm_id) = self.confirm_id {
            put_u64_field(dst, 5, confirm_id);
        }
        if let Some(kind) = self.kind {
            put_u32_field(dst, 6, kind);
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut destination = None;
        let mut payload = None;
        let mut id = None;
        let mut flags = None;
        let mut confirm_id = None;
        let mut kind = None;

        while let Some((field, wt)) = get_key(&mut buf)? {
            match field {
                1 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    destination = Some(require_utf8(get_len_bytes(&mut buf)?, "destination")?);
                }
                2 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    payload = Some(Bytes::copy_from_slice(get_len_bytes(&mut buf)?));
                }
                3 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    id = Some(get_varint(&mut buf)?);
                }
                4 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    flags = Some(get_varint(&mut buf)? as u32);
                }
                5 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    confirm_id = Some(get_varint(&mut buf)?);
                }
                6 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    kind = Some(get_varint(&mut buf)? as u32);
                }
                _ => skip_field(&mut buf, field, wt)?,
            }
        }

        Ok(Self {
            destination: destination.ok_or(WireError::MissingField {
                entity: "Message",
                field: "destination",
            })?,
            payload: payload.ok_or(WireError::MissingField {
                entity: "Message",
                field: "payload",
            })?,
            id,
            flags,
            confirm_id,
            kind,
        })
    }

    /// Whether this message is a stat reply.
    pub fn is_stat(&self) -> bool {
        self.kind == Some(STAT_KIND)
    }

    /// Decode the payload as a [`Stat`] if this message is a stat reply.
    ///
    /// The payload is only decoded on demand; a non-stat message yields
    /// `Ok(None)`.
    pub fn as_stat(&self) -> Result<Option<Stat>> {
        if !self.is_stat() {
            return Ok(None);
        }
        Stat::decode(&self.payload).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_required_only() {
        let msg = Message::new("/orders", &b"payload"[..]);
        let decoded = Message::decode(&msg.to_bytes()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.id, None);
        assert_eq!(decoded.flags, None);
    }

    #[test]
    fn roundtrip_all_fields() {
        let msg = Message {
            destination: "/orders".into(),
            payload: Bytes::from_static(b"x"),
            id: Some(u64::MAX),
            flags: Some(0b1010),
            confirm_id: Some(7),
            kind: Some(STAT_KIND),
        };
        assert_eq!(Message::decode(&msg.to_bytes()).unwrap(), msg);
    }

    #[test]
    fn explicit_zero_id_distinguishable_from_absent() {
        let with_zero = Message {
            id: Some(0),
            ..Message::new("/q", &b""[..])
        };
        let without = Message::new("/q", &b""[..]);

        let with_zero = Message::decode(&with_zero.to_bytes()).unwrap();
        let without = Message::decode(&without.to_bytes()).unwrap();
        assert_eq!(with_zero.id, Some(0));
        assert_eq!(without.id, None);
    }

    #[test]
    fn missing_destination_is_error() {
        let mut dst = BytesMut::new();
        put_bytes_field(&mut dst, 2, b"payload-only");
        assert!(matches!(
            Message::decode(&dst),
            Err(WireError::MissingField {
                entity: "Message",
                field: "destination",
            })
        ));
    }

    #[test]
    fn missing_payload_is_error() {
        let mut dst = BytesMut::new();
        put_str_field(&mut dst, 1, "/q");
        assert!(matches!(
            Message::decode(&dst),
            Err(WireError::MissingField {
                entity: "Message",
                field: "payload",
            })
        ));
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let msg = Message::new("/q", &b"data"[..]);
        let mut dst = BytesMut::new();
        msg.encode(&mut dst);
        // A field number this client has never heard of.
        put_u64_field(&mut dst, 99, 12345);
        put_bytes_field(&mut dst, 100, b"future stuff");

        assert_eq!(Message::decode(&dst).unwrap(), msg);
    }

    #[test]
    fn wrong_wire_type_for_known_field_is_error() {
        let mut dst = BytesMut::new();
        // destination declared length-delimited, sent as varint
        put_u64_field(&mut dst, 1, 5);
        put_bytes_field(&mut dst, 2, b"payload");
        assert!(matches!(
            Message::decode(&dst),
            Err(WireError::UnexpectedWireType { field: 1, .. })
        ));
    }

    #[test]
    fn stat_detection_by_kind() {
        let mut msg = Message::new("/q", &b""[..]);
        assert!(!msg.is_stat());
        assert!(msg.as_stat().unwrap().is_none());

        msg.kind = Some(STAT_KIND);
        assert!(msg.is_stat());
    }

    #[test]
    fn as_stat_decodes_payload_lazily() {
        let stat = Stat {
            name: "/q".into(),
            exists: true,
            transient_size: Some(3),
            durable_size: None,
        };
        let mut payload = BytesMut::new();
        stat.encode(&mut payload);

        let msg = Message {
            kind: Some(STAT_KIND),
            ..Message::new("/q", payload.freeze())
        };
        assert_eq!(msg.as_stat().unwrap().unwrap(), stat);
    }

    #[test]
    fn invalid_utf8_destination_is_error() {
        let mut dst = BytesMut::new();
        put_bytes_field(&mut dst, 1, &[0xff, 0xfe]);
        put_bytes_field(&mut dst, 2, b"payload");
        assert!(matches!(
            Message::decode(&dst),
            Err(WireError::InvalidUtf8 {
                field: "destination"
            })
        ));
    }
}
