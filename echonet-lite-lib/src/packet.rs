use crate::constants::{
    CONTROLLER_CLASS_CODE, DEFAULT_INSTANCE_CODE, ENVELOPE_SIZE, MAX_PROPERTY_COUNT,
};
use crate::error::EchonetError;
use crate::property::PropertyRecord;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use strum_macros::Display;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// EHD1: protocol family marker.
#[derive(Debug, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum FormatMarker {
    /// Pre-Lite ECHONET, reserved
    Legacy = 0b1000_0000,
    Lite = 0b0001_0000,

    #[num_enum(catch_all)]
    Other(u8),
}

/// EHD2: frame layout. Only `Type1` (specified message format) is produced.
#[derive(Debug, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum MessageFormat {
    Type1 = 0b1000_0001,
    Type2 = 0b1000_0010,

    #[num_enum(catch_all)]
    Other(u8),
}

#[derive(Debug, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum ClassGroupCode {
    Sensor = 0x00,
    AirConditioner = 0x01,
    HousingEquipment = 0x02,
    Cooking = 0x03,
    Health = 0x04,
    ManagementControl = 0x05,
    AudioVisual = 0x06,
    Profile = 0x0E,
    UserDefined = 0x0F,

    #[num_enum(catch_all)]
    Other(u8),
}

/// ESV: what the frame asks for or answers.
#[derive(Debug, Clone, Copy, Display, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ServiceCode {
    // 0x5X: the device did not accept the request
    #[strum(to_string = "SetI_SNA")]
    SetISna = 0x50,
    #[strum(to_string = "SetC_SNA")]
    SetCSna = 0x51,
    #[strum(to_string = "Get_SNA")]
    GetSna = 0x52,
    #[strum(to_string = "INF_SNA")]
    InfSna = 0x53,
    #[strum(to_string = "SetGet_SNA")]
    SetGetSna = 0x5E,

    // 0x6X: requests
    SetI = 0x60,
    SetC = 0x61,
    Get = 0x62,
    #[strum(to_string = "INF_REQ")]
    InfReq = 0x63,
    SetGet = 0x6E,

    // 0x7X: responses and notifications
    #[strum(to_string = "Set_Res")]
    SetRes = 0x71,
    #[strum(to_string = "Get_Res")]
    GetRes = 0x72,
    #[strum(to_string = "INF")]
    Inf = 0x73,
    #[strum(to_string = "INFC")]
    Infc = 0x74,
    #[strum(to_string = "INFC_Res")]
    InfcRes = 0x7A,
    #[strum(to_string = "SetGet_Res")]
    SetGetRes = 0x7E,

    #[num_enum(catch_all)]
    Other(u8),
}

impl_wire_eq!(FormatMarker, MessageFormat, ClassGroupCode, ServiceCode);

impl ServiceCode {
    pub fn is_request(&self) -> bool {
        let value: u8 = (*self).into();
        (0x60..0x70).contains(&value)
    }

    /// Responses and notifications, not-accepted variants included.
    pub fn is_response(&self) -> bool {
        let value: u8 = (*self).into();
        (0x70..0x80).contains(&value) || self.is_not_accepted()
    }

    pub fn is_not_accepted(&self) -> bool {
        let value: u8 = (*self).into();
        (0x50..0x60).contains(&value)
    }
}

/// EOJ: the addressed object (class group, class, instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectId {
    pub class_group: ClassGroupCode,
    pub class_code: u8,
    pub instance_code: u8,
}

impl ObjectId {
    pub fn new(class_group: ClassGroupCode, class_code: u8, instance_code: u8) -> Self {
        Self {
            class_group,
            class_code,
            instance_code,
        }
    }

    /// The controller object (`05 FF 01`) a host speaks as.
    pub fn controller() -> Self {
        Self::new(
            ClassGroupCode::ManagementControl,
            CONTROLLER_CLASS_CODE,
            DEFAULT_INSTANCE_CODE,
        )
    }

    fn read(buf: &mut impl Buf) -> Self {
        Self {
            class_group: ClassGroupCode::from_primitive(buf.get_u8()),
            class_code: buf.get_u8(),
            instance_code: buf.get_u8(),
        }
    }

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.class_group.into());
        buf.put_u8(self.class_code);
        buf.put_u8(self.instance_code);
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group: u8 = self.class_group.into();
        write!(f, "{:02X}{:02X}{:02X}", group, self.class_code, self.instance_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub format: FormatMarker,
    pub message_format: MessageFormat,
    pub transaction_id: u16,
}

impl Header {
    pub fn new(transaction_id: u16) -> Self {
        Self {
            format: FormatMarker::Lite,
            message_format: MessageFormat::Type1,
            transaction_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub source: ObjectId,
    pub destination: ObjectId,
    pub service: ServiceCode,
    pub properties: Vec<PropertyRecord>,
}

impl Packet {
    /// Build a Get request asking `destination` for `codes`, in the given order.
    ///
    /// The destination instance is always `0x01`. Every record has an empty
    /// payload.
    pub fn build_get_request(
        source: ObjectId,
        destination: ObjectId,
        codes: &[u8],
        transaction_id: u16,
    ) -> Self {
        Packet {
            header: Header::new(transaction_id),
            source,
            destination: ObjectId {
                instance_code: DEFAULT_INSTANCE_CODE,
                ..destination
            },
            service: ServiceCode::Get,
            properties: codes.iter().copied().map(PropertyRecord::empty).collect(),
        }
    }

    pub fn transaction_id(&self) -> u16 {
        self.header.transaction_id
    }

    pub fn wire_len(&self) -> usize {
        ENVELOPE_SIZE + self.properties.iter().map(PropertyRecord::wire_len).sum::<usize>()
    }

    /// Parse a complete frame. No partial packet is ever returned.
    pub fn decode(bytes: Bytes) -> Result<Self, EchonetError> {
        let total = bytes.len();
        if total < ENVELOPE_SIZE {
            return Err(EchonetError::TooShort {
                expected: ENVELOPE_SIZE,
                actual: total,
            });
        }

        let mut envelope = &bytes[..ENVELOPE_SIZE];
        let format = FormatMarker::from_primitive(envelope.get_u8());
        let message_format = MessageFormat::from_primitive(envelope.get_u8());
        // TID arrives low byte first
        let transaction_id = envelope.get_u16_le();
        let source = ObjectId::read(&mut envelope);
        let destination = ObjectId::read(&mut envelope);
        let service = ServiceCode::from_primitive(envelope.get_u8());
        let count = envelope.get_u8() as usize;

        let mut offset = ENVELOPE_SIZE;
        let mut properties = Vec::with_capacity(count);
        for _ in 0..count {
            if offset >= total {
                return Err(EchonetError::TrailingOrMissingBytes { consumed: offset, total });
            }
            let (record, consumed) = PropertyRecord::decode(&bytes, offset)?;
            offset += consumed;
            properties.push(record);
        }
        if offset != total {
            return Err(EchonetError::TrailingOrMissingBytes { consumed: offset, total });
        }

        debug!(
            "Decoded {:?} frame tid={} {} -> {} with {} properties",
            service,
            transaction_id,
            source,
            destination,
            properties.len()
        );

        Ok(Packet {
            header: Header {
                format,
                message_format,
                transaction_id,
            },
            source,
            destination,
            service,
            properties,
        })
    }

    pub fn encode(&self) -> Result<Bytes, EchonetError> {
        if self.properties.len() > MAX_PROPERTY_COUNT {
            return Err(EchonetError::TooManyProperties(self.properties.len()));
        }

        let mut buf = BytesMut::with_capacity(self.wire_len());
        buf.put_u8(self.header.format.into());
        buf.put_u8(self.header.message_format.into());
        buf.put_u16_le(self.header.transaction_id);
        self.source.write(&mut buf);
        self.destination.write(&mut buf);
        buf.put_u8(self.service.into());
        buf.put_u8(self.properties.len() as u8);
        for property in &self.properties {
            property.encode_into(&mut buf)?;
        }
        Ok(buf.freeze())
    }
}

impl TryFrom<Bytes> for Packet {
    type Error = EchonetError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        Packet::decode(bytes)
    }
}

impl TryFrom<&Packet> for Bytes {
    type Error = EchonetError;

    fn try_from(packet: &Packet) -> Result<Self, Self::Error> {
        packet.encode()
    }
}
