use crate::error::EchonetError;
use crate::extract::{self, CalibrationState, InstantaneousCurrent, OperationStatus};
use crate::packet::{ObjectId, Packet, ServiceCode};
use crate::profile::{Measurement, MeterProfile};
use crate::transaction::TransactionTracker;
use bytes::Bytes;
use std::fmt;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything one response yielded. A `None` means no reading, never zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeterReading {
    pub transaction_id: u16,
    pub service: ServiceCode,
    pub instantaneous_power_w: Option<i32>,
    pub instantaneous_current: Option<InstantaneousCurrent>,
    pub cumulative_energy_positive_kwh: Option<f64>,
    pub cumulative_energy_negative_kwh: Option<f64>,
    pub effective_digits: Option<u8>,
    pub operation_status: Option<OperationStatus>,
    /// Calibration in effect when the energy values were computed
    pub calibration: CalibrationState,
}

impl MeterReading {
    /// Read every measurement of `profile` out of `packet` using `calibration`.
    pub fn from_packet(packet: &Packet, profile: &MeterProfile, calibration: &CalibrationState) -> Self {
        MeterReading {
            transaction_id: packet.transaction_id(),
            service: packet.service,
            instantaneous_power_w: reading(Measurement::InstantaneousPower, extract::instantaneous_power(packet, profile)),
            instantaneous_current: reading(
                Measurement::InstantaneousCurrent,
                extract::instantaneous_current(packet, profile),
            ),
            cumulative_energy_positive_kwh: reading(
                Measurement::CumulativeEnergyPositive,
                extract::cumulative_energy_positive(packet, profile, calibration),
            ),
            cumulative_energy_negative_kwh: reading(
                Measurement::CumulativeEnergyNegative,
                extract::cumulative_energy_negative(packet, profile, calibration),
            ),
            effective_digits: reading(Measurement::EffectiveDigits, extract::effective_digits(packet, profile)),
            operation_status: reading(Measurement::OperationStatus, extract::operation_status(packet, profile)),
            calibration: *calibration,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instantaneous_power_w.is_none()
            && self.instantaneous_current.is_none()
            && self.cumulative_energy_positive_kwh.is_none()
            && self.cumulative_energy_negative_kwh.is_none()
            && self.effective_digits.is_none()
            && self.operation_status.is_none()
    }
}

fn reading<T>(measurement: Measurement, result: Result<T, EchonetError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("No {} reading: {}", measurement, e);
            None
        }
    }
}

fn or_dash<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

impl fmt::Display for MeterReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TID {}: Power: {} W, Current: {}, Energy+: {} kWh, Energy-: {} kWh ({})",
            self.transaction_id,
            or_dash(&self.instantaneous_power_w),
            or_dash(&self.instantaneous_current),
            or_dash(&self.cumulative_energy_positive_kwh),
            or_dash(&self.cumulative_energy_negative_kwh),
            self.calibration
        )
    }
}

/// Request/response state for a single meter.
///
/// Produces request frames and consumes response frames; moving the bytes is
/// left to the caller's transport.
#[derive(Debug, Clone)]
pub struct MeterSession {
    profile: MeterProfile,
    source: ObjectId,
    tracker: TransactionTracker,
    calibration: CalibrationState,
}

impl MeterSession {
    pub fn new(profile: MeterProfile) -> Self {
        Self {
            profile,
            source: ObjectId::controller(),
            tracker: TransactionTracker::new(),
            calibration: CalibrationState::default(),
        }
    }

    pub fn profile(&self) -> &MeterProfile {
        &self.profile
    }

    pub fn tracker(&self) -> &TransactionTracker {
        &self.tracker
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Encode a Get request for `codes` under a freshly minted id.
    pub fn build_request(&mut self, codes: &[u8]) -> Result<Bytes, EchonetError> {
        let id = self.tracker.next_transaction_id()?;
        let packet = Packet::build_get_request(self.source, self.profile.destination(), codes, id);
        match packet.encode() {
            Ok(bytes) => {
                debug!("Built Get request tid={} for {} properties", id, codes.len());
                Ok(bytes)
            }
            Err(e) => {
                self.tracker.abandon();
                Err(e)
            }
        }
    }

    /// Request calibration metadata and every measurement of the profile.
    pub fn build_reading_request(&mut self) -> Result<Bytes, EchonetError> {
        let codes = self.profile.reading_request_codes();
        self.build_request(&codes)
    }

    /// Decode a response, pair it with the outstanding request and read it.
    ///
    /// Malformed frames and foreign transaction ids are rejected without
    /// touching the outstanding request or the calibration.
    pub fn handle_response(&mut self, bytes: Bytes) -> Result<MeterReading, EchonetError> {
        let packet = Packet::decode(bytes)?;
        self.tracker.complete(packet.transaction_id())?;

        if self.calibration.refresh(&packet, &self.profile) {
            debug!("Calibration now {}", self.calibration);
        }

        let reading = MeterReading::from_packet(&packet, &self.profile, &self.calibration);
        info!("{}", reading);
        Ok(reading)
    }

    /// Drop the outstanding request, e.g. after the transport timed out.
    pub fn abandon(&mut self) -> Option<u16> {
        self.tracker.abandon()
    }
}
