// libs/appointment-cell/src/models.rs
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

use shared_models::AppError;
use shared_utils::datetime::DateTimeError;

pub const DEFAULT_BOOKING_DURATION_MINUTES: u32 = 30;
pub const MAX_BOOKING_DURATION_MINUTES: i64 = u32::MAX as i64;

pub static APPOINTMENT_DATE_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$").expect("date-time pattern compiles")
});

// ==============================================================================
// BOOKING PAYLOADS
// ==============================================================================

/// A booking as collected from the UI, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub doctor_user_id: Option<i64>,
    #[serde(default)]
    pub availability_slot_id: Option<i64>,
    #[serde(default)]
    pub appointment_date_time: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

/// The request body sent to reserve a slot. Only constructed from a request
/// that passed validation, or from a canonical slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub doctor_user_id: i64,
    pub availability_slot_id: i64,
    pub appointment_date_time: String,
    pub duration_minutes: u32,
}

impl From<BookingPayload> for BookingRequest {
    fn from(payload: BookingPayload) -> Self {
        Self {
            doctor_user_id: Some(payload.doctor_user_id),
            availability_slot_id: Some(payload.availability_slot_id),
            appointment_date_time: Some(payload.appointment_date_time),
            duration_minutes: Some(payload.duration_minutes as i64),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl BookingValidation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Invalid booking: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error(transparent)]
    DateTime(#[from] DateTimeError),

    #[error("Slot {0} is already booked")]
    SlotAlreadyBooked(i64),

    #[error("Slot {0} is not in the current day view")]
    SlotNotFound(i64),

    #[error("Appointment on slot {0} belongs to another patient")]
    NotYourAppointment(i64),

    #[error("A request is already in progress")]
    Busy,

    #[error("Cannot {action} while {state}")]
    InvalidState { state: String, action: &'static str },

    #[error(transparent)]
    Api(#[from] AppError),
}

impl AppointmentError {
    pub fn user_message(&self) -> String {
        match self {
            AppointmentError::Validation(errors) => errors.join("\n"),
            AppointmentError::Api(err) => err.user_message(),
            AppointmentError::SlotAlreadyBooked(_) => {
                "This time slot has already been booked.".to_string()
            }
            AppointmentError::NotYourAppointment(_) => {
                "You can only cancel your own appointments.".to_string()
            }
            AppointmentError::Busy => "Please wait for the current request to finish.".to_string(),
            other => other.to_string(),
        }
    }
}
