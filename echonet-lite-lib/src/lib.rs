/// Equality by wire byte, so `Other(0x72)` and the named variant for `0x72`
/// are the same value.
macro_rules! impl_wire_eq {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    u8::from(*self) == u8::from(*other)
                }
            }

            impl Eq for $ty {}
        )+
    };
}

pub mod constants;
pub mod error;
pub mod extract;
pub mod packet;
pub mod profile;
pub mod property;
pub mod session;
pub mod transaction;


pub use error::EchonetError;
pub use extract::{CalibrationState, InstantaneousCurrent, OperationStatus};
pub use packet::{ClassGroupCode, FormatMarker, Header, MessageFormat, ObjectId, Packet, ServiceCode};
pub use profile::{Measurement, MeterProfile, MeterProperty, PropertySpec};
pub use property::PropertyRecord;
pub use session::{MeterReading, MeterSession};
pub use transaction::TransactionTracker;
