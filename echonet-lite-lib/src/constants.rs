// Protocol constants for ECHONET Lite frames

/// Size of the fixed envelope: EHD1, EHD2, TID(2), SEOJ(3), DEOJ(3), ESV, OPC
pub const ENVELOPE_SIZE: usize = 12;

/// Size of a property record header (EPC + PDC)
pub const PROPERTY_HEADER_SIZE: usize = 2;

/// Largest payload a single property can carry (PDC is one byte)
pub const MAX_PROPERTY_PAYLOAD: usize = u8::MAX as usize;

/// Largest number of properties in one frame (OPC is one byte)
pub const MAX_PROPERTY_COUNT: usize = u8::MAX as usize;

/// Controller class code inside the management/control class group
pub const CONTROLLER_CLASS_CODE: u8 = 0xFF;

/// Instance code used for both ends of a B-route exchange
pub const DEFAULT_INSTANCE_CODE: u8 = 0x01;

/// Low-voltage smart electric energy meter class code
pub const LOW_VOLTAGE_SMART_METER_CLASS_CODE: u8 = 0x88;

/// Largest accepted synthetic transformation ratio (coefficient)
pub const MAX_COEFFICIENT: u32 = 999_999;

/// Scale of one instantaneous current count, in amperes
pub const CURRENT_LSB_A: f64 = 0.1;

/// 32-bit "no data" / overflow / underflow markers
pub const SENTINELS_I32: [i32; 3] = [i32::MIN, i32::MAX, i32::MAX - 1];

/// 16-bit "no data" / overflow / underflow markers
pub const SENTINELS_I16: [i16; 3] = [i16::MIN, i16::MAX, i16::MAX - 1];
