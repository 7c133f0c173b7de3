use chrono::{FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_utils::datetime::{
    parse_date_time, parse_time, DateInput, DateTimeError, API_DATE_FORMAT,
};

use crate::models::{
    Appointment, AppointmentStatus, AvailabilitySlot, DaySlots, RawAppointment, RawSlot, RawTime,
    SlotShapeError,
};

/// Turns raw slot records into canonical slots and matches them to calendar
/// days as seen from one display offset.
#[derive(Debug, Clone, Copy)]
pub struct SlotReconciler {
    offset: FixedOffset,
}

impl Default for SlotReconciler {
    fn default() -> Self {
        Self::utc()
    }
}

impl SlotReconciler {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match FixedOffset::east_opt(config.display_utc_offset_minutes * 60) {
            Some(offset) => Self::new(offset),
            None => {
                warn!(
                    "Display offset of {} minutes is out of range, using UTC",
                    config.display_utc_offset_minutes
                );
                Self::utc()
            }
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar day `input` falls on locally. Only zoned timestamps are
    /// converted; bare dates keep their day under any offset.
    pub fn local_day(&self, input: impl Into<DateInput>) -> Result<NaiveDate, DateTimeError> {
        input.into().local_date(self.offset)
    }

    pub fn canonicalize(&self, raw: RawSlot) -> Result<AvailabilitySlot, SlotShapeError> {
        let id = match &raw.id {
            Some(raw_id) => raw_id
                .as_i64()
                .ok_or_else(|| SlotShapeError::InvalidId(raw_id.to_string()))?,
            None => return Err(SlotShapeError::MissingId),
        };

        let start_text = raw
            .start_time
            .as_ref()
            .map(RawTime::as_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(SlotShapeError::MissingStartTime { slot_id: id })?;

        let (start_day, start_time) =
            self.split_time(&start_text).ok_or_else(|| SlotShapeError::InvalidTime {
                slot_id: id,
                value: start_text.clone(),
            })?;

        // A start time carrying its own date stands in for a missing date field.
        let date = match raw.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(text) => self.local_day(text).map_err(|_| SlotShapeError::InvalidDate {
                slot_id: id,
                value: text.to_string(),
            })?,
            None => start_day.ok_or(SlotShapeError::MissingDate { slot_id: id })?,
        };

        let end_time = match raw.end_time.as_ref().map(RawTime::as_text) {
            Some(text) if !text.trim().is_empty() => {
                let (_, end) = self.split_time(&text).ok_or(SlotShapeError::InvalidTime {
                    slot_id: id,
                    value: text.clone(),
                })?;
                if end <= start_time {
                    return Err(SlotShapeError::EndBeforeStart { slot_id: Some(id) });
                }
                Some(end)
            }
            _ => None,
        };

        let declared = match raw.duration_minutes {
            Some(minutes) if minutes >= 1 => u32::try_from(minutes).ok(),
            Some(minutes) => {
                warn!("Slot {} declares a non-positive duration ({}), ignoring it", id, minutes);
                None
            }
            None => None,
        };

        let duration_minutes = match end_time {
            Some(end) => {
                let span = (end - start_time).num_minutes() as u32;
                if let Some(duration) = declared.filter(|d| *d != span) {
                    warn!(
                        "Slot {} declares {} minutes but spans {}, using the span",
                        id, duration, span
                    );
                }
                Some(span)
            }
            None => declared,
        };

        let appointment = raw
            .appointment
            .and_then(|appointment| self.canonicalize_appointment(appointment, id));

        let is_booked = raw.is_booked.unwrap_or(false)
            || appointment.as_ref().map(Appointment::is_active).unwrap_or(false);

        Ok(AvailabilitySlot {
            id,
            doctor_id: raw.doctor_id.as_ref().and_then(|d| d.as_i64()),
            date,
            start_time,
            end_time,
            duration_minutes,
            is_booked,
            appointment,
        })
    }

    /// Decodes and canonicalizes every record, dropping the ones that fail.
    pub fn canonicalize_values(&self, values: Vec<Value>) -> Vec<AvailabilitySlot> {
        let received = values.len();
        let slots: Vec<AvailabilitySlot> = values
            .into_iter()
            .filter_map(|value| {
                serde_json::from_value::<RawSlot>(value)
                    .map_err(|e| SlotShapeError::Malformed(e.to_string()))
                    .and_then(|raw| self.canonicalize(raw))
                    .map_err(|e| warn!("Dropping slot record: {}", e))
                    .ok()
            })
            .collect();

        if slots.len() < received {
            debug!("Kept {} of {} slot records", slots.len(), received);
        }

        slots
    }

    pub fn canonicalize_all(&self, raws: Vec<RawSlot>) -> Vec<AvailabilitySlot> {
        raws.into_iter()
            .filter_map(|raw| {
                self.canonicalize(raw)
                    .map_err(|e| warn!("Dropping slot record: {}", e))
                    .ok()
            })
            .collect()
    }

    /// Raw records in, one day's buckets out.
    pub fn reconcile_day(
        &self,
        values: Vec<Value>,
        target: impl Into<DateInput>,
    ) -> Result<DaySlots, DateTimeError> {
        let target = self.local_day(target)?;
        let slots = self.canonicalize_values(values);
        Ok(partition(slots_on(&slots, target)))
    }

    fn canonicalize_appointment(&self, raw: RawAppointment, slot_id: i64) -> Option<Appointment> {
        let id = match raw.id.as_ref().and_then(|id| id.as_i64()) {
            Some(id) => id,
            None => {
                warn!("Slot {} embeds an appointment without a usable id, ignoring it", slot_id);
                return None;
            }
        };

        let status = AppointmentStatus::from_wire(raw.status.as_deref());

        Some(Appointment {
            id,
            patient_id: raw.patient_id.as_ref().and_then(|p| p.as_i64()),
            availability_slot_id: raw
                .availability_slot_id
                .as_ref()
                .and_then(|s| s.as_i64())
                .or(Some(slot_id)),
            cancellation_reason: raw.cancellation_reason.filter(|r| !r.trim().is_empty()),
            status,
        })
    }

    /// Reads a bare time of day, or the local date and time of a full date-time.
    fn split_time(&self, text: &str) -> Option<(Option<NaiveDate>, NaiveTime)> {
        if let Ok(time) = parse_time(text) {
            return Some((None, time));
        }

        parse_date_time(text, Some(self.offset))
            .ok()
            .map(|date_time| (Some(date_time.date()), date_time.time()))
    }
}

/// Slots whose `YYYY-MM-DD` key equals the target day's.
pub fn slots_on(slots: &[AvailabilitySlot], target: NaiveDate) -> Vec<AvailabilitySlot> {
    let key = target.format(API_DATE_FORMAT).to_string();
    slots
        .iter()
        .filter(|slot| slot.date_key() == key)
        .cloned()
        .collect()
}

/// Splits slots into available and booked, each ordered by start time.
pub fn partition(slots: impl IntoIterator<Item = AvailabilitySlot>) -> DaySlots {
    let (mut booked, mut available): (Vec<_>, Vec<_>) =
        slots.into_iter().partition(|slot| slot.is_booked);

    available.sort_by_key(|slot| (slot.start_time, slot.id));
    booked.sort_by_key(|slot| (slot.start_time, slot.id));

    DaySlots { available, booked }
}
