//! Common test utilities and shared imports

// Shared across test files; not every item is used by each one
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use echonet_lite_lib::error::EchonetError;
#[allow(unused_imports)]
pub use echonet_lite_lib::extract::{self, CalibrationState};
#[allow(unused_imports)]
pub use echonet_lite_lib::packet::{ClassGroupCode, Header, ObjectId, Packet, ServiceCode};
#[allow(unused_imports)]
pub use echonet_lite_lib::profile::MeterProfile;
#[allow(unused_imports)]
pub use echonet_lite_lib::property::PropertyRecord;
#[allow(unused_imports)]
pub use echonet_lite_lib::session::MeterSession;
#[allow(unused_imports)]
pub use echonet_lite_lib::transaction::TransactionTracker;

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Route library logs to the test harness; safe to call from every test
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Get request for instantaneous power, TID 1
#[allow(dead_code)]
pub const GET_POWER_REQUEST: &str = "1081010005FF010288016201E700";

/// Get_Res, TID 1: E1=01 (0.1 kWh), D3=1, E7=100 W, E0=10
#[allow(dead_code)]
pub const CALIBRATED_RESPONSE: &str =
    "10810100028801 05FF01 72 04 E10101 D30401000000 E70464000000 E0040A000000";

/// Strip the readability spaces from fixture hex
#[allow(dead_code)]
pub fn fixture(hex_data: &str) -> Bytes {
    hex_to_bytes(&hex_data.replace(' ', ""))
}

/// A Get_Res frame from the meter to the controller
#[allow(dead_code)]
pub fn meter_response(tid: u16, properties: Vec<PropertyRecord>) -> Bytes {
    Packet {
        header: Header::new(tid),
        source: MeterProfile::LOW_VOLTAGE_SMART_ELECTRIC_METER.destination(),
        destination: ObjectId::controller(),
        service: ServiceCode::GetRes,
        properties,
    }
    .encode()
    .expect("Failed to encode fixture response")
}
