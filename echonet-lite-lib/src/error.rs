use thiserror::Error;

/// The primary error type for the `echonet-lite-lib` library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EchonetError {
    #[error("Packet too short: need at least {expected} envelope bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Truncated property 0x{code:02X} at offset {offset}: declared {declared} bytes, {remaining} remaining")]
    TruncatedProperty {
        offset: usize,
        code: u8,
        declared: usize,
        remaining: usize,
    },

    #[error("Property list consumed {consumed} of {total} bytes")]
    TrailingOrMissingBytes { consumed: usize, total: usize },

    #[error("Property 0x{code:02X} payload of {len} bytes exceeds 255")]
    PayloadTooLarge { code: u8, len: usize },

    #[error("Packet carries {0} properties, the counter holds at most 255")]
    TooManyProperties(usize),

    #[error("Transaction ID mismatch: expected={expected}, response={response}")]
    TransactionMismatch { expected: u16, response: u16 },

    #[error("Request {0} is still waiting for its response")]
    RequestPending(u16),

    #[error("No request is waiting for a response")]
    NoRequestPending,

    #[error("Property 0x{code:02X} with {expected_len} byte payload not present")]
    PropertyAbsent { code: u8, expected_len: usize },

    #[error("Property 0x{code:02X} holds no-data marker 0x{raw:X}")]
    SentinelValue { code: u8, raw: u32 },

    #[error("Unknown cumulative energy unit code 0x{0:02X}")]
    UnknownUnitCode(u8),

    #[error("Coefficient {0} out of range (0..=999999)")]
    CoefficientOutOfRange(u32),

    #[error("Measurement {0} is not part of profile {1}")]
    UnsupportedMeasurement(String, &'static str),
}
