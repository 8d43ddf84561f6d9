//! Device-class property vocabularies.
//!
//! A [`MeterProfile`] is plain data: it names the destination object of a
//! meter class, the property codes carrying calibration metadata, and the
//! code and payload width of every measurement the extractor understands.

use crate::constants::{DEFAULT_INSTANCE_CODE, LOW_VOLTAGE_SMART_METER_CLASS_CODE};
use crate::packet::{ClassGroupCode, ObjectId};
use num_enum::{FromPrimitive, IntoPrimitive};
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Property codes (EPC) of the low-voltage smart electric energy meter class.
#[derive(Debug, Clone, Copy, Display, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum MeterProperty {
    OperationStatus = 0x80,
    BRouteIdentificationNumber = 0xC0,
    CumulativeEnergy1Minute = 0xD0,
    OwnerClassification = 0xD1,
    Phase = 0xD2,
    Coefficient = 0xD3,
    SyntheticTransformationMagnification = 0xD4,
    CertifiedNumber = 0xD5,
    TestExpirationDate = 0xD6,
    CumulativeEnergyEffectiveDigits = 0xD7,
    CumulativeEnergyPositive = 0xE0,
    CumulativeEnergyUnit = 0xE1,
    CumulativeEnergyHistoryPositive = 0xE2,
    CumulativeEnergyNegative = 0xE3,
    CumulativeEnergyHistoryNegative = 0xE4,
    DateOfCumulativeEnergyHistory = 0xE5,
    InstantaneousPower = 0xE7,
    InstantaneousCurrents = 0xE8,
    InstantaneousVoltage = 0xE9,
    FixedCumulativeEnergyPositive = 0xEA,
    FixedCumulativeEnergyNegative = 0xEB,
    CumulativeEnergyHistory2 = 0xEC,
    DateOfCumulativeEnergyHistory2 = 0xED,
    CumulativeEnergyHistory3 = 0xEE,
    DateOfCumulativeEnergyHistory3 = 0xEF,

    #[num_enum(catch_all)]
    Other(u8),
}

impl_wire_eq!(MeterProperty);

/// Logical measurements a profile can map to properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Measurement {
    #[strum(to_string = "instantaneous power")]
    InstantaneousPower,
    #[strum(to_string = "instantaneous current")]
    InstantaneousCurrent,
    #[strum(to_string = "cumulative energy (positive)")]
    CumulativeEnergyPositive,
    #[strum(to_string = "cumulative energy (negative)")]
    CumulativeEnergyNegative,
    #[strum(to_string = "effective digits")]
    EffectiveDigits,
    #[strum(to_string = "operation status")]
    OperationStatus,
}

/// Where a measurement lives: its property and exact payload width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub measurement: Measurement,
    pub property: MeterProperty,
    pub len: usize,
}

impl PropertySpec {
    const fn new(measurement: Measurement, property: MeterProperty, len: usize) -> Self {
        Self {
            measurement,
            property,
            len,
        }
    }

    /// EPC byte of the property
    pub fn code(&self) -> u8 {
        self.property.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterProfile {
    pub name: &'static str,
    pub class_group: ClassGroupCode,
    pub class_code: u8,
    /// 1-byte cumulative energy unit code
    pub unit_property: MeterProperty,
    /// 4-byte synthetic transformation ratio
    pub coefficient_property: MeterProperty,
    pub measurements: &'static [PropertySpec],
}

const LOW_VOLTAGE_MEASUREMENTS: &[PropertySpec] = &[
    PropertySpec::new(Measurement::InstantaneousPower, MeterProperty::InstantaneousPower, 4),
    PropertySpec::new(Measurement::InstantaneousCurrent, MeterProperty::InstantaneousCurrents, 4),
    PropertySpec::new(Measurement::CumulativeEnergyPositive, MeterProperty::CumulativeEnergyPositive, 4),
    PropertySpec::new(Measurement::CumulativeEnergyNegative, MeterProperty::CumulativeEnergyNegative, 4),
    PropertySpec::new(Measurement::EffectiveDigits, MeterProperty::CumulativeEnergyEffectiveDigits, 1),
    PropertySpec::new(Measurement::OperationStatus, MeterProperty::OperationStatus, 1),
];

impl MeterProfile {
    pub const LOW_VOLTAGE_SMART_ELECTRIC_METER: MeterProfile = MeterProfile {
        name: "low-voltage smart electric energy meter",
        class_group: ClassGroupCode::HousingEquipment,
        class_code: LOW_VOLTAGE_SMART_METER_CLASS_CODE,
        unit_property: MeterProperty::CumulativeEnergyUnit,
        coefficient_property: MeterProperty::Coefficient,
        measurements: LOW_VOLTAGE_MEASUREMENTS,
    };

    /// The DEOJ a request to this meter class is addressed to.
    pub fn destination(&self) -> ObjectId {
        ObjectId::new(self.class_group, self.class_code, DEFAULT_INSTANCE_CODE)
    }

    pub fn spec_for(&self, measurement: Measurement) -> Option<PropertySpec> {
        self.measurements
            .iter()
            .find(|spec| spec.measurement == measurement)
            .copied()
    }

    /// Calibration properties first, then every measurement in table order.
    pub fn reading_request_codes(&self) -> Vec<u8> {
        let mut codes = Vec::with_capacity(2 + self.measurements.len());
        codes.push(self.unit_property.into());
        codes.push(self.coefficient_property.into());
        codes.extend(self.measurements.iter().map(PropertySpec::code));
        codes
    }
}

impl Default for MeterProfile {
    fn default() -> Self {
        Self::LOW_VOLTAGE_SMART_ELECTRIC_METER
    }
}
