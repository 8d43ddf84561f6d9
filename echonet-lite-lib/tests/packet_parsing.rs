//! Tests for frame encoding and decoding

mod common;

use common::*;

#[test]
fn test_get_request_scenario() {
    let packet = Packet::build_get_request(
        ObjectId::controller(),
        ObjectId::new(ClassGroupCode::HousingEquipment, 0x88, 0x01),
        &[0xE7],
        1,
    );
    let bytes = packet.encode().expect("Failed to encode request");

    assert_eq!(bytes, hex_to_bytes(GET_POWER_REQUEST), "Got {:02X?}", bytes.as_ref());
}

#[test]
fn test_decode_calibrated_response() {
    let packet = Packet::try_from(fixture(CALIBRATED_RESPONSE)).expect("Failed to parse response");

    assert_eq!(packet.header, Header::new(1));
    assert_eq!(packet.source, ObjectId::new(ClassGroupCode::HousingEquipment, 0x88, 0x01));
    assert_eq!(packet.destination, ObjectId::controller());
    assert_eq!(packet.service, ServiceCode::GetRes);

    let codes: Vec<u8> = packet.properties.iter().map(|p| p.code).collect();
    assert_eq!(codes, vec![0xE1, 0xD3, 0xE7, 0xE0]);
    assert_eq!(packet.properties[1].payload.as_ref(), &[0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn test_roundtrip_response() {
    let original = fixture(CALIBRATED_RESPONSE);
    let packet = Packet::decode(original.clone()).expect("Failed to parse response");
    let roundtrip = packet.encode().expect("Failed to encode response");

    assert_eq!(
        original.as_ref(),
        roundtrip.as_ref(),
        "Round-trip should preserve bytes exactly. Original: {:02x?}, Got: {:02x?}",
        original.as_ref(),
        roundtrip.as_ref()
    );
}

#[test]
fn test_roundtrip_packet_value() {
    let packet = Packet {
        header: Header::new(0xBEEF),
        source: ObjectId::new(ClassGroupCode::HousingEquipment, 0x88, 0x01),
        destination: ObjectId::controller(),
        service: ServiceCode::Inf,
        properties: vec![
            PropertyRecord::new(0xEA, vec![0x07, 0xE8, 0x01, 0x0F, 0x00, 0x1E, 0x00, 0x00, 0x00, 0x12, 0x34]),
            PropertyRecord::empty(0x80),
            PropertyRecord::new(0xE2, vec![0xAB; 255]),
        ],
    };

    let decoded = Packet::decode(packet.encode().unwrap()).unwrap();
    assert_eq!(decoded, packet);
}

#[test]
fn test_payload_bytes_is_zero_copy_slice() {
    let bytes = fixture(CALIBRATED_RESPONSE);
    let packet = Packet::decode(bytes.clone()).unwrap();
    let power = &packet.properties[2];

    // 12 envelope + E1(3) + D3(6) + E7 header(2)
    assert_eq!(power.payload.as_ref(), &bytes[23..27]);
}

mod roundtrip {
    use super::*;
    use echonet_lite_lib::packet::{FormatMarker, MessageFormat};
    use num_enum::FromPrimitive;
    use proptest::prelude::*;

    fn object_id() -> impl Strategy<Value = ObjectId> {
        (any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(group, class, instance)| ObjectId::new(ClassGroupCode::from_primitive(group), class, instance))
    }

    fn property() -> impl Strategy<Value = PropertyRecord> {
        (any::<u8>(), prop::collection::vec(any::<u8>(), 0..=255))
            .prop_map(|(code, payload)| PropertyRecord::new(code, payload))
    }

    fn packet() -> impl Strategy<Value = Packet> {
        (
            any::<u8>(),
            any::<u8>(),
            any::<u16>(),
            object_id(),
            object_id(),
            any::<u8>(),
            prop::collection::vec(property(), 0..8),
        )
            .prop_map(|(ehd1, ehd2, tid, source, destination, esv, properties)| Packet {
                // Raw catch-all values, including bytes that have a named variant
                header: Header {
                    format: FormatMarker::Other(ehd1),
                    message_format: MessageFormat::Other(ehd2),
                    transaction_id: tid,
                },
                source,
                destination,
                service: ServiceCode::Other(esv),
                properties,
            })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(packet in packet()) {
            let bytes = packet.encode().expect("Generated packets are within wire limits");
            prop_assert_eq!(bytes.len(), packet.wire_len());

            let decoded = Packet::decode(bytes.clone()).expect("Encoded packet must decode");
            prop_assert_eq!(&decoded, &packet);
            prop_assert_eq!(decoded.encode().unwrap(), bytes);
        }

        #[test]
        fn prop_decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = Packet::decode(Bytes::from(data));
        }
    }
}
