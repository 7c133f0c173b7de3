// libs/appointment-cell/src/services/session.rs
use chrono::NaiveDate;
use tracing::{info, warn};

use availability_cell::models::{AvailabilitySlot, DaySlots};
use availability_cell::services::AvailabilityService;
use shared_utils::datetime::DateInput;

use crate::models::AppointmentError;
use crate::services::booking::BookingService;
use crate::services::workflow::{ModalState, WorkflowAction, WorkflowController};

/// What a confirmed action ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Booked { slot_id: i64, appointment_id: i64 },
    Cancelled { appointment_id: i64 },
}

/// One user's scheduling modal: the day being looked at, the workflow state
/// and the services behind them.
pub struct SchedulingSession {
    availability: AvailabilityService,
    bookings: BookingService,
    workflow: WorkflowController,
    day: DaySlots,
    notice: Option<String>,
}

impl SchedulingSession {
    pub fn new(
        availability: AvailabilityService,
        bookings: BookingService,
        current_user_id: i64,
    ) -> Self {
        Self {
            availability,
            bookings,
            workflow: WorkflowController::new(current_user_id),
            day: DaySlots::default(),
            notice: None,
        }
    }

    pub fn state(&self) -> &ModalState {
        self.workflow.state()
    }

    pub fn workflow(&self) -> &WorkflowController {
        &self.workflow
    }

    pub fn day(&self) -> &DaySlots {
        &self.day
    }

    /// The last message meant for an alert, success or failure.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn availability(&mut self) -> &mut AvailabilityService {
        &mut self.availability
    }

    /// Opens the slot list for a doctor's day. A failed fetch still leaves
    /// the list open, empty, with the failure in `notice`.
    pub async fn open_day(
        &mut self,
        doctor_id: i64,
        date: impl Into<DateInput>,
    ) -> Result<&DaySlots, AppointmentError> {
        let date: NaiveDate = self.availability.reconciler().local_day(date)?;
        self.workflow.open(doctor_id, date)?;
        self.notice = None;

        match self.availability.slots_for_day(doctor_id, date).await {
            Ok(day) => {
                self.day = day;
                Ok(&self.day)
            }
            Err(e) => {
                warn!("Could not load slots for doctor {} on {}: {}", doctor_id, date, e);
                self.day = DaySlots::default();
                self.notice = Some(e.user_message());
                Err(e.into())
            }
        }
    }

    pub fn select_slot(&mut self, slot_id: i64) -> Result<&AvailabilitySlot, AppointmentError> {
        let slot = self
            .day
            .find(slot_id)
            .ok_or(AppointmentError::SlotNotFound(slot_id))?;
        self.workflow.select_slot(slot)?;
        Ok(slot)
    }

    pub fn set_cancellation_reason(&mut self, reason: &str) -> Result<(), AppointmentError> {
        self.workflow.set_cancellation_reason(reason)
    }

    /// Sends the pending booking or cancellation. On success the doctor's
    /// cached slots are dropped and the day is loaded again.
    pub async fn confirm(&mut self) -> Result<ConfirmOutcome, AppointmentError> {
        let action = self.workflow.confirm()?;
        let result = self.perform(&action).await;

        match result {
            Ok(outcome) => {
                self.workflow.complete(Ok(()))?;
                self.notice = Some(match outcome {
                    ConfirmOutcome::Booked { .. } => "Appointment booked successfully.".to_string(),
                    ConfirmOutcome::Cancelled { .. } => {
                        "Appointment cancelled successfully.".to_string()
                    }
                });

                self.availability.invalidate(action.doctor_id());
                match self
                    .availability
                    .slots_for_day(action.doctor_id(), action.date())
                    .await
                {
                    Ok(day) => self.day = day,
                    Err(e) => warn!("Could not reload slots after {:?}: {}", outcome, e),
                }

                Ok(outcome)
            }
            Err(e) => {
                let message = e.user_message();
                self.workflow.complete(Err(message.clone()))?;
                self.notice = Some(message);
                Err(e)
            }
        }
    }

    async fn perform(&self, action: &WorkflowAction) -> Result<ConfirmOutcome, AppointmentError> {
        match action {
            WorkflowAction::Book { payload, .. } => {
                let appointment = self.bookings.book(payload).await?;
                info!(
                    "Booked appointment {} on slot {}",
                    appointment.id, payload.availability_slot_id
                );
                Ok(ConfirmOutcome::Booked {
                    slot_id: payload.availability_slot_id,
                    appointment_id: appointment.id,
                })
            }
            WorkflowAction::Cancel {
                appointment_id,
                reason,
                ..
            } => {
                self.bookings.cancel(*appointment_id, reason.clone()).await?;
                Ok(ConfirmOutcome::Cancelled {
                    appointment_id: *appointment_id,
                })
            }
        }
    }

    pub fn dismiss(&mut self) -> Result<(), AppointmentError> {
        self.workflow.dismiss()
    }

    pub fn close(&mut self) -> Result<(), AppointmentError> {
        self.workflow.close()?;
        self.day = DaySlots::default();
        self.notice = None;
        Ok(())
    }
}
