use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

use shared_utils::datetime::{API_DATE_FORMAT, API_TIME_FORMAT};

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

// ==============================================================================
// RAW WIRE RECORDS
// ==============================================================================

/// Identifiers arrive as numbers from some endpoints and as strings from others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawId::Number(n) => Some(*n),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Times arrive as `"09:30"`, `"0930"`, `930` or full date-time strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Number(i64),
    Text(String),
}

impl RawTime {
    pub fn as_text(&self) -> String {
        match self {
            RawTime::Number(n) => n.to_string(),
            RawTime::Text(s) => s.clone(),
        }
    }
}

/// An availability slot exactly as the API sends it. Nothing here is trusted
/// until it has been through `SlotReconciler::canonicalize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSlot {
    #[serde(default, alias = "slotId", alias = "slot_id", alias = "availabilitySlotId")]
    pub id: Option<RawId>,
    #[serde(default, alias = "doctor_id", alias = "doctorUserId", alias = "doctor_user_id")]
    pub doctor_id: Option<RawId>,
    #[serde(
        default,
        alias = "slotDate",
        alias = "slot_date",
        alias = "availableDate",
        alias = "available_date"
    )]
    pub date: Option<String>,
    #[serde(default, alias = "start_time", alias = "start")]
    pub start_time: Option<RawTime>,
    #[serde(default, alias = "end_time", alias = "end")]
    pub end_time: Option<RawTime>,
    #[serde(default, alias = "duration_minutes", alias = "duration")]
    pub duration_minutes: Option<i64>,
    #[serde(default, alias = "is_booked", alias = "booked")]
    pub is_booked: Option<bool>,
    #[serde(default)]
    pub appointment: Option<RawAppointment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppointment {
    #[serde(default, alias = "appointmentId", alias = "appointment_id")]
    pub id: Option<RawId>,
    #[serde(default, alias = "patient_id", alias = "patientUserId", alias = "patient_user_id")]
    pub patient_id: Option<RawId>,
    #[serde(default, alias = "slotId", alias = "slot_id", alias = "availability_slot_id")]
    pub availability_slot_id: Option<RawId>,
    #[serde(default, alias = "cancellation_reason")]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ==============================================================================
// CANONICAL MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Booked,
    Cancelled,
}

impl AppointmentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "booked" | "scheduled" | "confirmed" => Some(AppointmentStatus::Booked),
            "cancelled" | "canceled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Unknown or missing statuses are read as booked so a slot is never
    /// offered twice.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some(text) => Self::parse(text).unwrap_or_else(|| {
                warn!("Unknown appointment status {:?}, treating it as booked", text);
                AppointmentStatus::Booked
            }),
            None => AppointmentStatus::Booked,
        }
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_wire(text.as_deref()))
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    #[serde(default, alias = "patient_id")]
    pub patient_id: Option<i64>,
    #[serde(default, alias = "availability_slot_id", alias = "slotId")]
    pub availability_slot_id: Option<i64>,
    #[serde(default, alias = "cancellation_reason")]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        self.status == AppointmentStatus::Booked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub doctor_id: Option<i64>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub is_booked: bool,
    pub appointment: Option<Appointment>,
}

impl AvailabilitySlot {
    /// `YYYY-MM-DD`, the form days are compared in.
    pub fn date_key(&self) -> String {
        self.date.format(API_DATE_FORMAT).to_string()
    }

    pub fn start_date_time(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn effective_duration(&self) -> u32 {
        self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    pub fn end_date_time(&self) -> NaiveDateTime {
        match self.end_time {
            Some(end) => self.date.and_time(end),
            None => self.start_date_time() + Duration::minutes(self.effective_duration() as i64),
        }
    }

    /// True when the slot's active appointment belongs to `patient_id`.
    pub fn is_booked_by(&self, patient_id: i64) -> bool {
        self.appointment
            .as_ref()
            .map(|a| a.is_active() && a.patient_id == Some(patient_id))
            .unwrap_or(false)
    }

    pub fn time_label(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_date_time().format("%H:%M")
        )
    }
}

/// One day's slots split into what can still be booked and what cannot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySlots {
    pub available: Vec<AvailabilitySlot>,
    pub booked: Vec<AvailabilitySlot>,
}

impl DaySlots {
    pub fn total(&self) -> usize {
        self.available.len() + self.booked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn find(&self, slot_id: i64) -> Option<&AvailabilitySlot> {
        self.available
            .iter()
            .chain(self.booked.iter())
            .find(|slot| slot.id == slot_id)
    }
}

// ==============================================================================
// DOCTOR AVAILABILITY MANAGEMENT
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub doctor_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: u32,
}

impl CreateSlotRequest {
    /// Builds a request for a single slot. Duration defaults to the span
    /// between start and end and must match it when given.
    pub fn new(
        doctor_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_minutes: Option<u32>,
    ) -> Result<Self, SlotShapeError> {
        if start_time >= end_time {
            return Err(SlotShapeError::EndBeforeStart { slot_id: None });
        }

        let span = (end_time - start_time).num_minutes() as u32;
        let duration = duration_minutes.unwrap_or(span);
        if duration < 1 || duration != span {
            return Err(SlotShapeError::DurationMismatch {
                slot_id: None,
                duration,
                span,
            });
        }

        Ok(Self {
            doctor_id,
            date: date.format(API_DATE_FORMAT).to_string(),
            start_time: start_time.format(API_TIME_FORMAT).to_string(),
            end_time: end_time.format(API_TIME_FORMAT).to_string(),
            duration_minutes: duration,
        })
    }
}

// ==============================================================================
// CALENDAR VIEW DATA
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub available: usize,
    pub booked: usize,
}

impl DaySummary {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            available: 0,
            booked: 0,
        }
    }

    pub fn has_slots(&self) -> bool {
        self.available + self.booked > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarCell {
    Padding,
    Day(DaySummary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Sunday-first cells, padded on both ends to whole weeks.
    pub cells: Vec<CalendarCell>,
}

impl CalendarMonth {
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    pub fn days(&self) -> impl Iterator<Item = &DaySummary> {
        self.cells.iter().filter_map(|cell| match cell {
            CalendarCell::Day(day) => Some(day),
            CalendarCell::Padding => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarWeek {
    pub days: Vec<DaySummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub month: u32,
    pub available: usize,
    pub booked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarYear {
    pub year: i32,
    pub months: Vec<MonthSummary>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Why a raw slot record was rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotShapeError {
    #[error("Slot record could not be decoded: {0}")]
    Malformed(String),

    #[error("Slot record has no id")]
    MissingId,

    #[error("Slot id is not numeric: {0}")]
    InvalidId(String),

    #[error("Slot {slot_id} has no date")]
    MissingDate { slot_id: i64 },

    #[error("Slot {slot_id} has an unparseable date: {value}")]
    InvalidDate { slot_id: i64, value: String },

    #[error("Slot {slot_id} has no start time")]
    MissingStartTime { slot_id: i64 },

    #[error("Slot {slot_id} has an unparseable time: {value}")]
    InvalidTime { slot_id: i64, value: String },

    #[error("Slot end time must be after start time (slot {slot_id:?})")]
    EndBeforeStart { slot_id: Option<i64> },

    #[error("Slot duration {duration} does not match its {span} minute span (slot {slot_id:?})")]
    DurationMismatch {
        slot_id: Option<i64>,
        duration: u32,
        span: u32,
    },
}
