use crate::constants::{MAX_PROPERTY_PAYLOAD, PROPERTY_HEADER_SIZE};
use crate::error::EchonetError;
use bytes::{BufMut, Bytes, BytesMut};

/// One `[EPC][PDC][EDT]` record of a frame's property list.
///
/// The payload is kept exactly as it arrived; numeric interpretation happens
/// in [`crate::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRecord {
    pub code: u8,
    pub payload: Bytes,
}

impl PropertyRecord {
    pub fn new(code: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    /// A record with no payload, as carried by Get requests
    pub fn empty(code: u8) -> Self {
        Self {
            code,
            payload: Bytes::new(),
        }
    }

    /// Number of bytes this record occupies on the wire
    pub fn wire_len(&self) -> usize {
        PROPERTY_HEADER_SIZE + self.payload.len()
    }

    /// Decode the record starting at `offset`, returning it with the number
    /// of bytes consumed.
    pub fn decode(bytes: &Bytes, offset: usize) -> Result<(Self, usize), EchonetError> {
        let remaining = bytes.len().saturating_sub(offset);
        let code = bytes.get(offset).copied();
        let declared = offset.checked_add(1).and_then(|i| bytes.get(i)).copied();

        let (code, declared) = match (code, declared) {
            (Some(code), Some(declared)) => (code, declared as usize),
            (code, _) => {
                return Err(EchonetError::TruncatedProperty {
                    offset,
                    code: code.unwrap_or_default(),
                    declared: PROPERTY_HEADER_SIZE,
                    remaining,
                });
            }
        };

        let consumed = PROPERTY_HEADER_SIZE + declared;
        if remaining < consumed {
            return Err(EchonetError::TruncatedProperty {
                offset,
                code,
                declared,
                remaining: remaining - PROPERTY_HEADER_SIZE,
            });
        }

        let start = offset + PROPERTY_HEADER_SIZE;
        let payload = bytes.slice(start..start + declared);
        Ok((Self { code, payload }, consumed))
    }

    /// Append the encoded record to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<(), EchonetError> {
        let len = self.payload.len();
        if len > MAX_PROPERTY_PAYLOAD {
            return Err(EchonetError::PayloadTooLarge { code: self.code, len });
        }
        buf.reserve(self.wire_len());
        buf.put_u8(self.code);
        buf.put_u8(len as u8);
        buf.put_slice(&self.payload);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Bytes, EchonetError> {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }
}
