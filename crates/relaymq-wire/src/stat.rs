use bytes::BytesMut;

use crate::error::{Result, WireError};
use crate::varint::{
    expect_wire_type, get_key, get_len_bytes, get_varint, put_bool_field, put_str_field,
    put_u32_field, require_utf8, skip_field, WT_LEN, WT_VARINT,
};

/// Occupancy/existence report for a queue, carried as the payload of a
/// stat-flagged [`Message`](crate::Message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub name: String,
    pub exists: bool,
    pub transient_size: Option<u32>,
    pub durable_size: Option<u32>,
}

impl Stat {
    /// Total queue occupancy: transient plus durable, absent sizes count
    /// as zero. Widened so two broker-supplied u32 counts cannot overflow
    /// the sum.
    pub fn size(&self) -> u64 {
        u64::from(self.transient_size.unwrap_or(0)) + u64::from(self.durable_size.unwrap_or(0))
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        put_str_field(dst, 1, &self.name);
        put_bool_field(dst, 2, self.exists);
        if let Some(transient) = self.transient_size {
            put_u32_field(dst, 3, transient);
        }
        if let Some(durable) = self.durable_size {
            put_u32_field(dst, 4, durable);
        }
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut name = None;
        let mut exists = None;
        let mut transient_size = None;
        let mut durable_size = None;

        while let Some((field, wt)) = get_key(&mut buf)? {
            match field {
                1 => {
                    expect_wire_type(field, wt, WT_LEN)?;
                    name = Some(require_utf8(get_len_bytes(&mut buf)?, "name")?);
                }
                2 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    exists = Some(get_varint(&mut buf)? != 0);
                }
                3 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    transient_size = Some(get_varint(&mut buf)? as u32);
                }
                4 => {
                    expect_wire_type(field, wt, WT_VARINT)?;
                    durable_size = Some(get_varint(&mut buf)? as u32);
                }
                _ => skip_field(&mut buf, field, wt)?,
            }
        }

        Ok(Self {
            name: name.ok_or(WireError::MissingField {
                entity: "Stat",
                field: "name",
            })?,
            exists: exists.ok_or(WireError::MissingField {
                entity: "Stat",
                field: "exists",
            })?,
            transient_size,
            durable_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(stat: &Stat) -> Stat {
        let mut dst = BytesMut::new();
        stat.encode(&mut dst);
        Stat::decode(&dst).unwrap()
    }

    #[test]
    fn roundtrip_required_only() {
        let stat = Stat {
            name: "/q".into(),
            exists: false,
            transient_size: None,
            durable_size: None,
        };
        assert_eq!(roundtrip(&stat), stat);
        assert_eq!(stat.size(), 0);
    }

    #[test]
    fn roundtrip_with_sizes() {
        let stat = Stat {
            name: "/q".into(),
            exists: true,
            transient_size: Some(3),
            durable_size: Some(4),
        };
        assert_eq!(roundtrip(&stat), stat);
        assert_eq!(stat.size(), 7);
    }

    #[test]
    fn size_sums_beyond_u32_range() {
        let stat = Stat {
            name: "/q".into(),
            exists: true,
            transient_size: Some(u32::MAX),
            durable_size: Some(1),
        };
        assert_eq!(stat.size(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn explicit_zero_size_distinguishable_from_absent() {
        let stat = Stat {
            name: "/q".into(),
            exists: true,
            transient_size: Some(0),
            durable_size: None,
        };
        let decoded = roundtrip(&stat);
        assert_eq!(decoded.transient_size, Some(0));
        assert_eq!(decoded.durable_size, None);
    }

    #[test]
    fn missing_exists_is_error() {
        let mut dst = BytesMut::new();
        put_str_field(&mut dst, 1, "/q");
        assert!(matches!(
            Stat::decode(&dst),
            Err(WireError::MissingField {
                entity: "Stat",
                field: "exists",
            })
        ));
    }
}
