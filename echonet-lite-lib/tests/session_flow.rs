//! Tests for the request/response cycle of a meter session

mod common;

use common::*;

fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[test]
fn test_first_request_uses_tid_1() {
    init_tracing();
    let mut session = MeterSession::new(MeterProfile::default());

    let request = session.build_request(&[0xE7]).unwrap();
    assert_eq!(request, hex_to_bytes(GET_POWER_REQUEST));
    assert_eq!(session.tracker().outstanding(), Some(1));
}

#[test]
fn test_reading_request_lists_calibration_first() {
    let mut session = MeterSession::new(MeterProfile::default());
    let request = session.build_reading_request().unwrap();
    let packet = Packet::decode(request).unwrap();

    assert_eq!(packet.service, ServiceCode::Get);
    assert_eq!(packet.properties[0].code, 0xE1);
    assert_eq!(packet.properties[1].code, 0xD3);
    assert_eq!(
        packet.properties.len(),
        2 + MeterProfile::default().measurements.len()
    );
}

#[test]
fn test_full_cycle() {
    init_tracing();
    let mut session = MeterSession::new(MeterProfile::default());
    session.build_reading_request().unwrap();

    let reading = session
        .handle_response(fixture(CALIBRATED_RESPONSE))
        .expect("Response should be accepted");

    assert_eq!(reading.transaction_id, 1);
    assert_eq!(reading.service, ServiceCode::GetRes);
    assert_eq!(reading.instantaneous_power_w, Some(100));
    assert!(approx(reading.cumulative_energy_positive_kwh.unwrap(), 1.0));
    assert_eq!(reading.instantaneous_current, None);
    assert_eq!(reading.cumulative_energy_negative_kwh, None);
    assert!(!reading.is_empty());
    assert_eq!(session.tracker().outstanding(), None);
}

#[test]
fn test_second_request_blocked_until_answered() {
    let mut session = MeterSession::new(MeterProfile::default());
    session.build_request(&[0xE7]).unwrap();

    assert_eq!(session.build_request(&[0xE7]), Err(EchonetError::RequestPending(1)));

    session.handle_response(fixture(CALIBRATED_RESPONSE)).unwrap();
    let next = Packet::decode(session.build_request(&[0xE7]).unwrap()).unwrap();
    assert_eq!(next.transaction_id(), 2);
}

#[test]
fn test_mismatched_response_is_rejected() {
    let mut session = MeterSession::new(MeterProfile::default());
    session.build_request(&[0xE7]).unwrap();

    let stale = meter_response(7, vec![PropertyRecord::new(0xE7, 1_i32.to_le_bytes().to_vec())]);
    assert_eq!(
        session.handle_response(stale),
        Err(EchonetError::TransactionMismatch { expected: 1, response: 7 })
    );
    assert_eq!(session.tracker().outstanding(), Some(1), "Caller may keep waiting");

    // The real answer still gets through
    let reading = session.handle_response(fixture(CALIBRATED_RESPONSE)).unwrap();
    assert_eq!(reading.instantaneous_power_w, Some(100));
}

#[test]
fn test_malformed_response_keeps_request_outstanding() {
    let mut session = MeterSession::new(MeterProfile::default());
    session.build_request(&[0xE7]).unwrap();

    assert!(matches!(
        session.handle_response(fixture("1081 0100 0288")),
        Err(EchonetError::TooShort { .. })
    ));
    assert_eq!(session.tracker().outstanding(), Some(1));

    assert_eq!(session.abandon(), Some(1));
    assert_eq!(session.build_request(&[0xE7]).map(|b| b[2]), Ok(2));
}

#[test]
fn test_calibration_retained_across_responses() {
    let mut session = MeterSession::new(MeterProfile::default());

    session.build_reading_request().unwrap();
    let first = meter_response(
        1,
        vec![
            PropertyRecord::new(0xE1, vec![0x02]),
            PropertyRecord::new(0xD3, 60_u32.to_le_bytes().to_vec()),
        ],
    );
    session.handle_response(first).unwrap();
    assert!(approx(session.calibration().cumulative_energy_unit, 0.01));
    assert_eq!(session.calibration().transformation_ratio, 60);

    // No metadata in this one: the energy reading uses the earlier calibration
    session.build_request(&[0xE0]).unwrap();
    let second = meter_response(2, vec![PropertyRecord::new(0xE0, 500_i32.to_le_bytes().to_vec())]);
    let reading = session.handle_response(second).unwrap();

    assert!(approx(reading.cumulative_energy_positive_kwh.unwrap(), 500.0 * 60.0 * 0.01));
    assert_eq!(reading.calibration, *session.calibration());
}

#[test]
fn test_invalid_coefficient_keeps_previous_calibration() {
    let mut session = MeterSession::new(MeterProfile::default());
    session.build_request(&[0xE1, 0xD3]).unwrap();
    session
        .handle_response(meter_response(
            1,
            vec![
                PropertyRecord::new(0xE1, vec![0x01]),
                PropertyRecord::new(0xD3, 10_u32.to_le_bytes().to_vec()),
            ],
        ))
        .unwrap();

    session.build_request(&[0xE1, 0xD3]).unwrap();
    session
        .handle_response(meter_response(
            2,
            vec![
                PropertyRecord::new(0xE1, vec![0x03]),
                PropertyRecord::new(0xD3, 5_000_000_u32.to_le_bytes().to_vec()),
            ],
        ))
        .unwrap();

    assert!(approx(session.calibration().cumulative_energy_unit, 0.1));
    assert_eq!(session.calibration().transformation_ratio, 10);
}

#[cfg(feature = "serde")]
#[test]
fn test_reading_serializes() {
    let mut session = MeterSession::new(MeterProfile::default());
    session.build_reading_request().unwrap();
    let reading = session.handle_response(fixture(CALIBRATED_RESPONSE)).unwrap();

    let json = serde_json::to_value(&reading).unwrap();
    assert_eq!(json["instantaneous_power_w"], 100);
    assert!(json["instantaneous_current"].is_null());
}
