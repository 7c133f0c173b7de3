// libs/appointment-cell/src/services/booking.rs
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use availability_cell::models::{Appointment, AvailabilitySlot};
use shared_api_client::ApiClient;
use shared_models::AppError;
use shared_utils::datetime::API_DATE_TIME_FORMAT;

use crate::models::{
    AppointmentError, BookingPayload, BookingRequest, BookingValidation, CancelAppointmentRequest,
    APPOINTMENT_DATE_TIME_PATTERN, DEFAULT_BOOKING_DURATION_MINUTES, MAX_BOOKING_DURATION_MINUTES,
};

/// Checks a booking draft. Never fails; problems are listed in `errors`.
pub fn validate_booking_data(request: &BookingRequest) -> BookingValidation {
    let mut errors = Vec::new();

    if !matches!(request.doctor_user_id, Some(id) if id != 0) {
        errors.push("Doctor ID is required".to_string());
    }

    if !matches!(request.availability_slot_id, Some(id) if id != 0) {
        errors.push("Availability slot ID is required".to_string());
    }

    match request.appointment_date_time.as_deref().map(str::trim) {
        None | Some("") => errors.push("Appointment date and time is required".to_string()),
        Some(value) if !APPOINTMENT_DATE_TIME_PATTERN.is_match(value) => {
            errors.push("Appointment date and time must be in YYYY-MM-DDTHH:mm:ss format".to_string())
        }
        Some(_) => {}
    }

    match request.duration_minutes {
        Some(minutes) if minutes > MAX_BOOKING_DURATION_MINUTES => errors.push(format!(
            "Duration must be at most {} minutes",
            MAX_BOOKING_DURATION_MINUTES
        )),
        Some(minutes) if minutes >= 1 => {}
        _ => errors.push("Duration must be at least 1 minute".to_string()),
    }

    BookingValidation::from_errors(errors)
}

impl BookingRequest {
    pub fn validate(&self) -> BookingValidation {
        validate_booking_data(self)
    }

    pub fn into_payload(self) -> Result<BookingPayload, AppointmentError> {
        let validation = self.validate();
        if !validation.is_valid {
            return Err(AppointmentError::Validation(validation.errors));
        }

        match (
            self.doctor_user_id,
            self.availability_slot_id,
            self.appointment_date_time,
            self.duration_minutes.and_then(|d| u32::try_from(d).ok()),
        ) {
            (Some(doctor_user_id), Some(availability_slot_id), Some(date_time), Some(duration_minutes)) => {
                Ok(BookingPayload {
                    doctor_user_id,
                    availability_slot_id,
                    appointment_date_time: date_time.trim().to_string(),
                    duration_minutes,
                })
            }
            _ => Err(AppointmentError::Validation(vec![
                "Duration is out of range".to_string(),
            ])),
        }
    }
}

/// Composes the booking body for a slot. The slot's own duration is used
/// when it has one, otherwise the default of 30 minutes.
pub fn create_booking_data(slot: &AvailabilitySlot, doctor_id: i64) -> BookingPayload {
    BookingPayload {
        doctor_user_id: doctor_id,
        availability_slot_id: slot.id,
        appointment_date_time: slot.start_date_time().format(API_DATE_TIME_FORMAT).to_string(),
        duration_minutes: slot.duration_minutes.unwrap_or(DEFAULT_BOOKING_DURATION_MINUTES),
    }
}

/// Remote booking operations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookingGateway: Send + Sync {
    async fn book(&self, payload: &BookingPayload) -> Result<Value>;

    async fn cancel(&self, appointment_id: i64, request: &CancelAppointmentRequest) -> Result<()>;

    async fn my_appointments(&self) -> Result<Vec<Value>>;
}

#[async_trait]
impl BookingGateway for ApiClient {
    async fn book(&self, payload: &BookingPayload) -> Result<Value> {
        let body = serde_json::to_value(payload)?;
        self.request(Method::POST, "/api/appointments/book", Some(body)).await
    }

    async fn cancel(&self, appointment_id: i64, request: &CancelAppointmentRequest) -> Result<()> {
        let path = format!("/api/appointments/{}/cancel", appointment_id);
        let body = serde_json::to_value(request)?;
        self.request_empty(Method::PUT, &path, Some(body)).await
    }

    async fn my_appointments(&self) -> Result<Vec<Value>> {
        self.request(Method::GET, "/api/appointments/my", None).await
    }
}

pub struct BookingService {
    gateway: Arc<dyn BookingGateway>,
}

impl BookingService {
    pub fn new(gateway: Arc<dyn BookingGateway>) -> Self {
        Self { gateway }
    }

    pub fn with_api(api: Arc<ApiClient>) -> Self {
        Self::new(api)
    }

    /// Books a slot. The payload is validated again before it leaves.
    pub async fn book(&self, payload: &BookingPayload) -> Result<Appointment, AppointmentError> {
        let checked = BookingRequest::from(payload.clone()).into_payload()?;
        info!(
            "Booking slot {} with doctor {} at {}",
            checked.availability_slot_id, checked.doctor_user_id, checked.appointment_date_time
        );

        let response = self
            .gateway
            .book(&checked)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        serde_json::from_value::<Appointment>(response).map_err(|e| {
            warn!("Booking response could not be read: {}", e);
            AppointmentError::Api(AppError::Internal(format!("Unreadable booking response: {}", e)))
        })
    }

    pub async fn cancel(
        &self,
        appointment_id: i64,
        reason: Option<String>,
    ) -> Result<(), AppointmentError> {
        info!("Cancelling appointment {}", appointment_id);

        let request = CancelAppointmentRequest {
            cancellation_reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        };

        self.gateway
            .cancel(appointment_id, &request)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        Ok(())
    }

    /// The signed-in patient's appointments; unreadable entries are skipped.
    pub async fn my_appointments(&self) -> Result<Vec<Appointment>, AppointmentError> {
        let values = self
            .gateway
            .my_appointments()
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        let appointments: Vec<Appointment> = values
            .into_iter()
            .filter_map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| warn!("Dropping appointment record: {}", e))
                    .ok()
            })
            .collect();

        debug!("Loaded {} appointments", appointments.len());
        Ok(appointments)
    }
}
