//! Calibrated values from meter property payloads.
//!
//! Every extraction is independent: a missing or invalid property fails only
//! its own measurement. Payload integers are little-endian as received.

use crate::constants::{CURRENT_LSB_A, MAX_COEFFICIENT, SENTINELS_I16, SENTINELS_I32};
use crate::error::EchonetError;
use crate::packet::Packet;
use crate::profile::{Measurement, MeterProfile};
use crate::property::PropertyRecord;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use tracing::{debug, info, warn};
use zerocopy::byteorder::little_endian::{I16, I32, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integer widths that carry protocol "no data" markers.
pub trait Sentinel: Copy {
    fn is_sentinel(self) -> bool;
    fn raw_bits(self) -> u32;
}

impl Sentinel for i32 {
    fn is_sentinel(self) -> bool {
        SENTINELS_I32.contains(&self)
    }

    fn raw_bits(self) -> u32 {
        self as u32
    }
}

impl Sentinel for i16 {
    fn is_sentinel(self) -> bool {
        SENTINELS_I16.contains(&self)
    }

    fn raw_bits(self) -> u32 {
        self as u16 as u32
    }
}

pub fn is_sentinel_invalid<T: Sentinel>(value: T) -> bool {
    value.is_sentinel()
}

/// E8 payload: R phase then T phase, 0.1 A per count
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct InstantaneousCurrentRaw {
    pub r_phase: I16,
    pub t_phase: I16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstantaneousCurrent {
    pub r_phase_a: f64, // Amperes
    pub t_phase_a: f64, // Amperes
}

impl fmt::Display for InstantaneousCurrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R: {:.1} A, T: {:.1} A", self.r_phase_a, self.t_phase_a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum OperationStatus {
    On = 0x30,
    Off = 0x31,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Scale and multiplier applied to cumulative energy counts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationState {
    /// kWh per count
    pub cumulative_energy_unit: f64,
    pub transformation_ratio: u32,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            cumulative_energy_unit: 1.0,
            transformation_ratio: 1,
        }
    }
}

impl CalibrationState {
    /// Replace this state with one derived from `packet`.
    ///
    /// Returns `false` and leaves the state untouched unless the packet
    /// carries both a valid unit and a valid coefficient.
    pub fn refresh(&mut self, packet: &Packet, profile: &MeterProfile) -> bool {
        match derive_calibration(packet, profile) {
            Ok(fresh) => {
                if fresh != *self {
                    info!(
                        "Calibration changed: unit {} -> {}, ratio {} -> {}",
                        self.cumulative_energy_unit,
                        fresh.cumulative_energy_unit,
                        self.transformation_ratio,
                        fresh.transformation_ratio
                    );
                }
                *self = fresh;
                true
            }
            Err(EchonetError::PropertyAbsent { code, .. }) => {
                debug!("Keeping calibration, property 0x{:02X} not in response", code);
                false
            }
            Err(e) => {
                warn!("Keeping calibration, response carried invalid metadata: {}", e);
                false
            }
        }
    }

    pub fn energy_kwh(&self, raw: i32) -> f64 {
        raw as f64 * self.transformation_ratio as f64 * self.cumulative_energy_unit
    }
}

impl fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unit {} kWh, ratio {}",
            self.cumulative_energy_unit, self.transformation_ratio
        )
    }
}

/// First record with `code` whose payload is exactly `expected_len` bytes.
///
/// A record with the right code but wrong width counts as absent.
pub fn find_property(packet: &Packet, code: u8, expected_len: usize) -> Option<&PropertyRecord> {
    packet
        .properties
        .iter()
        .find(|record| record.code == code && record.payload.len() == expected_len)
}

fn require(packet: &Packet, code: u8, expected_len: usize) -> Result<&PropertyRecord, EchonetError> {
    find_property(packet, code, expected_len).ok_or(EchonetError::PropertyAbsent { code, expected_len })
}

fn require_measurement<'a>(
    packet: &'a Packet,
    profile: &MeterProfile,
    measurement: Measurement,
) -> Result<&'a PropertyRecord, EchonetError> {
    let spec = profile
        .spec_for(measurement)
        .ok_or_else(|| EchonetError::UnsupportedMeasurement(measurement.to_string(), profile.name))?;
    require(packet, spec.code(), spec.len)
}

fn checked<T: Sentinel>(code: u8, value: T) -> Result<T, EchonetError> {
    if is_sentinel_invalid(value) {
        warn!("Property 0x{:02X} reports no data (0x{:X})", code, value.raw_bits());
        return Err(EchonetError::SentinelValue {
            code,
            raw: value.raw_bits(),
        });
    }
    Ok(value)
}

fn read_i32(record: &PropertyRecord) -> Result<i32, EchonetError> {
    let value = I32::read_from_bytes(record.payload.as_ref()).map_err(|_| EchonetError::PropertyAbsent {
        code: record.code,
        expected_len: size_of::<I32>(),
    })?;
    checked(record.code, value.get())
}

fn read_u8(record: &PropertyRecord) -> Result<u8, EchonetError> {
    record.payload.first().copied().ok_or(EchonetError::PropertyAbsent {
        code: record.code,
        expected_len: 1,
    })
}

/// kWh per count for a cumulative energy unit code (E1).
pub fn resolve_unit(raw: u8) -> Result<f64, EchonetError> {
    match raw {
        0x00 => Ok(1.0),
        0x01 => Ok(0.1),
        0x02 => Ok(0.01),
        0x03 => Ok(0.001),
        0x04 => Ok(0.0001),
        0x0A => Ok(10.0),
        0x0B => Ok(100.0),
        0x0C => Ok(1000.0),
        0x0D => Ok(10000.0),
        other => Err(EchonetError::UnknownUnitCode(other)),
    }
}

pub fn derive_calibration(packet: &Packet, profile: &MeterProfile) -> Result<CalibrationState, EchonetError> {
    let unit = require(packet, profile.unit_property.into(), 1)?;
    let coefficient = require(packet, profile.coefficient_property.into(), size_of::<U32>())?;

    let cumulative_energy_unit = resolve_unit(read_u8(unit)?)?;
    let transformation_ratio = U32::read_from_bytes(coefficient.payload.as_ref())
        .map_err(|_| EchonetError::PropertyAbsent {
            code: coefficient.code,
            expected_len: size_of::<U32>(),
        })?
        .get();
    if transformation_ratio > MAX_COEFFICIENT {
        return Err(EchonetError::CoefficientOutOfRange(transformation_ratio));
    }

    Ok(CalibrationState {
        cumulative_energy_unit,
        transformation_ratio,
    })
}

/// Instantaneous power in watts (E7).
pub fn instantaneous_power(packet: &Packet, profile: &MeterProfile) -> Result<i32, EchonetError> {
    read_i32(require_measurement(packet, profile, Measurement::InstantaneousPower)?)
}

/// Instantaneous R/T phase currents (E8). Both channels must be valid.
pub fn instantaneous_current(packet: &Packet, profile: &MeterProfile) -> Result<InstantaneousCurrent, EchonetError> {
    let record = require_measurement(packet, profile, Measurement::InstantaneousCurrent)?;
    let raw = InstantaneousCurrentRaw::read_from_bytes(record.payload.as_ref()).map_err(|_| {
        EchonetError::PropertyAbsent {
            code: record.code,
            expected_len: size_of::<InstantaneousCurrentRaw>(),
        }
    })?;

    let r_phase = checked(record.code, raw.r_phase.get())?;
    let t_phase = checked(record.code, raw.t_phase.get())?;

    Ok(InstantaneousCurrent {
        r_phase_a: r_phase as f64 * CURRENT_LSB_A,
        t_phase_a: t_phase as f64 * CURRENT_LSB_A,
    })
}

/// Cumulative energy bought from the grid, in kWh (E0).
pub fn cumulative_energy_positive(
    packet: &Packet,
    profile: &MeterProfile,
    calibration: &CalibrationState,
) -> Result<f64, EchonetError> {
    let raw = read_i32(require_measurement(packet, profile, Measurement::CumulativeEnergyPositive)?)?;
    Ok(calibration.energy_kwh(raw))
}

/// Cumulative energy sold to the grid, in kWh (E3).
pub fn cumulative_energy_negative(
    packet: &Packet,
    profile: &MeterProfile,
    calibration: &CalibrationState,
) -> Result<f64, EchonetError> {
    let raw = read_i32(require_measurement(packet, profile, Measurement::CumulativeEnergyNegative)?)?;
    Ok(calibration.energy_kwh(raw))
}

/// Number of significant digits of the cumulative energy counters (D7).
pub fn effective_digits(packet: &Packet, profile: &MeterProfile) -> Result<u8, EchonetError> {
    read_u8(require_measurement(packet, profile, Measurement::EffectiveDigits)?)
}

pub fn operation_status(packet: &Packet, profile: &MeterProfile) -> Result<OperationStatus, EchonetError> {
    let raw = read_u8(require_measurement(packet, profile, Measurement::OperationStatus)?)?;
    Ok(OperationStatus::from_primitive(raw))
}
