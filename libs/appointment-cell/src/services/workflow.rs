// libs/appointment-cell/src/services/workflow.rs
use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, info, warn};

use availability_cell::models::AvailabilitySlot;

use crate::models::{AppointmentError, BookingPayload};
use crate::services::booking::create_booking_data;

/// Where the scheduling modal currently is. The confirm views carry the
/// selected slot, so a confirm view without a slot cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Idle,
    SlotList {
        doctor_id: i64,
        date: NaiveDate,
    },
    BookingConfirm {
        doctor_id: i64,
        date: NaiveDate,
        slot: AvailabilitySlot,
    },
    CancelConfirm {
        doctor_id: i64,
        date: NaiveDate,
        slot: AvailabilitySlot,
        appointment_id: i64,
        reason: String,
    },
}

impl ModalState {
    pub fn doctor_id(&self) -> Option<i64> {
        match self {
            ModalState::Idle => None,
            ModalState::SlotList { doctor_id, .. }
            | ModalState::BookingConfirm { doctor_id, .. }
            | ModalState::CancelConfirm { doctor_id, .. } => Some(*doctor_id),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ModalState::Idle => None,
            ModalState::SlotList { date, .. }
            | ModalState::BookingConfirm { date, .. }
            | ModalState::CancelConfirm { date, .. } => Some(*date),
        }
    }

    pub fn selected_slot(&self) -> Option<&AvailabilitySlot> {
        match self {
            ModalState::BookingConfirm { slot, .. } | ModalState::CancelConfirm { slot, .. } => {
                Some(slot)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ModalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModalState::Idle => "idle",
            ModalState::SlotList { .. } => "showing slots",
            ModalState::BookingConfirm { .. } => "confirming a booking",
            ModalState::CancelConfirm { .. } => "confirming a cancellation",
        };
        f.write_str(name)
    }
}

/// The request a confirm step asks the caller to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowAction {
    Book {
        doctor_id: i64,
        date: NaiveDate,
        payload: BookingPayload,
    },
    Cancel {
        doctor_id: i64,
        date: NaiveDate,
        appointment_id: i64,
        reason: Option<String>,
    },
}

impl WorkflowAction {
    pub fn doctor_id(&self) -> i64 {
        match self {
            WorkflowAction::Book { doctor_id, .. } | WorkflowAction::Cancel { doctor_id, .. } => {
                *doctor_id
            }
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            WorkflowAction::Book { date, .. } | WorkflowAction::Cancel { date, .. } => *date,
        }
    }
}

/// Drives the slot list and the two confirmation views. One request may be
/// in flight at a time; every event is rejected until it completes.
#[derive(Debug, Clone)]
pub struct WorkflowController {
    state: ModalState,
    current_user_id: i64,
    busy: bool,
    last_error: Option<String>,
}

impl WorkflowController {
    pub fn new(current_user_id: i64) -> Self {
        Self {
            state: ModalState::Idle,
            current_user_id,
            busy: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn current_user_id(&self) -> i64 {
        self.current_user_id
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_open(&self) -> bool {
        self.state != ModalState::Idle
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn ensure_idle_request(&self) -> Result<(), AppointmentError> {
        if self.busy {
            warn!("Workflow event rejected while a request is in flight");
            return Err(AppointmentError::Busy);
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> AppointmentError {
        warn!("Invalid workflow event: cannot {} while {}", action, self.state);
        AppointmentError::InvalidState {
            state: self.state.to_string(),
            action,
        }
    }

    /// Opens the slot list for a day, or switches the open list to another day.
    pub fn open(&mut self, doctor_id: i64, date: NaiveDate) -> Result<(), AppointmentError> {
        self.ensure_idle_request()?;
        match self.state {
            ModalState::Idle | ModalState::SlotList { .. } => {
                debug!("Opening slot list for doctor {} on {}", doctor_id, date);
                self.state = ModalState::SlotList { doctor_id, date };
                self.last_error = None;
                Ok(())
            }
            _ => Err(self.invalid("open a day")),
        }
    }

    /// Open slots lead to the booking view, the user's own booked slots to
    /// the cancel view. Slots booked by someone else are not selectable.
    pub fn select_slot(&mut self, slot: &AvailabilitySlot) -> Result<(), AppointmentError> {
        self.ensure_idle_request()?;
        let (doctor_id, date) = match self.state {
            ModalState::SlotList { doctor_id, date } => (doctor_id, date),
            _ => return Err(self.invalid("select a slot")),
        };

        if !slot.is_booked {
            debug!("Slot {} selected for booking", slot.id);
            self.state = ModalState::BookingConfirm {
                doctor_id,
                date,
                slot: slot.clone(),
            };
            self.last_error = None;
            return Ok(());
        }

        match slot.appointment.as_ref() {
            Some(appointment) if slot.is_booked_by(self.current_user_id) => {
                debug!("Slot {} selected for cancellation", slot.id);
                self.state = ModalState::CancelConfirm {
                    doctor_id,
                    date,
                    slot: slot.clone(),
                    appointment_id: appointment.id,
                    reason: String::new(),
                };
                self.last_error = None;
                Ok(())
            }
            Some(_) => Err(AppointmentError::NotYourAppointment(slot.id)),
            None => Err(AppointmentError::SlotAlreadyBooked(slot.id)),
        }
    }

    pub fn set_cancellation_reason(&mut self, text: &str) -> Result<(), AppointmentError> {
        self.ensure_idle_request()?;
        if let ModalState::CancelConfirm { reason, .. } = &mut self.state {
            *reason = text.to_string();
            return Ok(());
        }
        Err(self.invalid("edit the cancellation reason"))
    }

    /// Starts the request for the current confirm view and marks the
    /// controller busy until `complete` is called.
    pub fn confirm(&mut self) -> Result<WorkflowAction, AppointmentError> {
        self.ensure_idle_request()?;
        let action = match &self.state {
            ModalState::BookingConfirm {
                doctor_id,
                date,
                slot,
            } => WorkflowAction::Book {
                doctor_id: *doctor_id,
                date: *date,
                payload: create_booking_data(slot, *doctor_id),
            },
            ModalState::CancelConfirm {
                doctor_id,
                date,
                appointment_id,
                reason,
                ..
            } => WorkflowAction::Cancel {
                doctor_id: *doctor_id,
                date: *date,
                appointment_id: *appointment_id,
                reason: Some(reason.trim().to_string()).filter(|r| !r.is_empty()),
            },
            _ => return Err(self.invalid("confirm")),
        };

        info!("Workflow request started while {}", self.state);
        self.busy = true;
        self.last_error = None;
        Ok(action)
    }

    /// Finishes the in-flight request. Success closes the modal; a failure
    /// keeps the confirm view open with the message.
    pub fn complete(&mut self, outcome: Result<(), String>) -> Result<(), AppointmentError> {
        if !self.busy {
            return Err(self.invalid("complete a request"));
        }
        self.busy = false;

        match outcome {
            Ok(()) => {
                info!("Workflow request succeeded, closing");
                self.state = ModalState::Idle;
                self.last_error = None;
            }
            Err(message) => {
                warn!("Workflow request failed: {}", message);
                self.last_error = Some(message);
            }
        }
        Ok(())
    }

    /// Leaves a confirm view and returns to the slot list.
    pub fn dismiss(&mut self) -> Result<(), AppointmentError> {
        self.ensure_idle_request()?;
        let (doctor_id, date) = match self.state {
            ModalState::BookingConfirm { doctor_id, date, .. }
            | ModalState::CancelConfirm { doctor_id, date, .. } => (doctor_id, date),
            _ => return Err(self.invalid("dismiss")),
        };

        self.state = ModalState::SlotList { doctor_id, date };
        self.last_error = None;
        Ok(())
    }

    /// Closes the whole modal and drops every sub-state.
    pub fn close(&mut self) -> Result<(), AppointmentError> {
        self.ensure_idle_request()?;
        self.state = ModalState::Idle;
        self.last_error = None;
        Ok(())
    }
}
