use chrono::{Duration, NaiveDate, NaiveTime};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use appointment_cell::models::AppointmentError;
use appointment_cell::services::{BookingService, ConfirmOutcome, ModalState, SchedulingSession};
use availability_cell::models::{AvailabilitySlot, CalendarCell, CreateSlotRequest, DaySlots};
use availability_cell::services::calendar::{month_view, week_view, year_view};
use availability_cell::services::AvailabilityService;
use notification_cell::services::NotificationService;
use profile_cell::models::{ProfileError, ProfileUpdate, UserProfile};
use profile_cell::services::ProfileService;
use shared_api_client::ApiClient;
use shared_config::AppConfig;
use shared_models::AppError;

use crate::cli::{Commands, ProfileCommand};

/// Errors that carry a message fit for the terminal.
pub trait UserFacing: std::fmt::Display {
    fn user_message(&self) -> String;
}

impl UserFacing for AppError {
    fn user_message(&self) -> String {
        AppError::user_message(self)
    }
}

impl UserFacing for AppointmentError {
    fn user_message(&self) -> String {
        AppointmentError::user_message(self)
    }
}

impl UserFacing for ProfileError {
    fn user_message(&self) -> String {
        ProfileError::user_message(self)
    }
}

fn report<E: UserFacing>(err: E) -> String {
    error!("Command failed: {}", err);
    err.user_message()
}

pub struct CommandContext {
    config: AppConfig,
    api: Arc<ApiClient>,
}

impl CommandContext {
    pub fn new(config: AppConfig) -> Self {
        let api = Arc::new(ApiClient::new(&config));
        Self { config, api }
    }

    fn availability(&self) -> AvailabilityService {
        AvailabilityService::with_api(&self.config, self.api.clone())
    }

    fn profiles(&self) -> ProfileService {
        ProfileService::with_api(self.api.clone())
    }

    async fn session(&self) -> Result<SchedulingSession, String> {
        let me = self.profiles().current_user().await.map_err(report)?;
        Ok(SchedulingSession::new(
            self.availability(),
            BookingService::with_api(self.api.clone()),
            me.user.id,
        ))
    }

    pub async fn run(&self, command: Commands) -> Result<(), String> {
        match command {
            Commands::Slots { doctor, date } => self.slots(doctor, &date).await,
            Commands::Book { doctor, date, slot } => self.book(doctor, &date, slot).await,
            Commands::Cancel {
                doctor,
                date,
                slot,
                reason,
            } => self.cancel(doctor, &date, slot, reason).await,
            Commands::Month {
                doctor,
                year,
                month,
            } => self.month(doctor, year, month).await,
            Commands::Week { doctor, date } => self.week(doctor, date).await,
            Commands::Year { doctor, year } => self.year(doctor, year).await,
            Commands::CreateSlot {
                doctor,
                date,
                start,
                end,
                duration,
            } => self.create_slot(doctor, date, start, end, duration).await,
            Commands::DeleteSlot { doctor, slot } => self.delete_slot(doctor, slot).await,
            Commands::Appointments => self.appointments().await,
            Commands::Notifications { mark_all_read } => self.notifications(mark_all_read).await,
            Commands::MarkRead { id } => self.mark_read(id).await,
            Commands::Profile { action } => self.profile(action).await,
        }
    }

    async fn slots(&self, doctor: i64, date: &str) -> Result<(), String> {
        let mut availability = self.availability();
        let day = availability
            .slots_for_day(doctor, date)
            .await
            .map_err(report)?;
        print_day(&day);
        Ok(())
    }

    async fn book(&self, doctor: i64, date: &str, slot: i64) -> Result<(), String> {
        let mut session = self.session().await?;
        session.open_day(doctor, date).await.map_err(report)?;
        session.select_slot(slot).map_err(report)?;
        if !matches!(session.state(), ModalState::BookingConfirm { .. }) {
            session.dismiss().map_err(report)?;
            return Err(format!(
                "Slot {} is one of your appointments. Use cancel instead.",
                slot
            ));
        }

        if let ConfirmOutcome::Booked { appointment_id, .. } =
            session.confirm().await.map_err(report)?
        {
            println!("Booked appointment {}", appointment_id);
        }
        print_day(session.day());
        Ok(())
    }

    async fn cancel(
        &self,
        doctor: i64,
        date: &str,
        slot: i64,
        reason: Option<String>,
    ) -> Result<(), String> {
        let mut session = self.session().await?;
        session.open_day(doctor, date).await.map_err(report)?;
        session.select_slot(slot).map_err(report)?;
        if !matches!(session.state(), ModalState::CancelConfirm { .. }) {
            session.dismiss().map_err(report)?;
            return Err(format!("Slot {} is not booked. Use book instead.", slot));
        }
        if let Some(reason) = reason {
            session.set_cancellation_reason(&reason).map_err(report)?;
        }

        session.confirm().await.map_err(report)?;
        println!("{}", session.notice().unwrap_or("Appointment cancelled."));
        Ok(())
    }

    async fn doctor_slots(&self, doctor: i64) -> Result<Vec<AvailabilitySlot>, String> {
        self.availability()
            .slots_for_doctor(doctor)
            .await
            .map_err(report)
    }

    async fn month(&self, doctor: i64, year: i32, month: u32) -> Result<(), String> {
        let slots = self.doctor_slots(doctor).await?;
        let view = month_view(year, month, &slots).map_err(|e| e.to_string())?;

        println!("{:04}-{:02}", view.year, view.month);
        println!("  Su    Mo    Tu    We    Th    Fr    Sa");
        for week in view.weeks() {
            let line: Vec<String> = week
                .iter()
                .map(|cell| match cell {
                    CalendarCell::Padding => "      ".to_string(),
                    CalendarCell::Day(day) if day.has_slots() => {
                        format!("{:>2}({}) ", day.date.format("%d"), day.available)
                    }
                    CalendarCell::Day(day) => format!("{:>2}    ", day.date.format("%d")),
                })
                .collect();
            println!("{}", line.concat());
        }
        Ok(())
    }

    async fn week(&self, doctor: i64, anchor: NaiveDate) -> Result<(), String> {
        let slots = self.doctor_slots(doctor).await?;
        for day in week_view(anchor, &slots).days {
            println!(
                "{}  {} open, {} booked",
                day.date.format("%a %Y-%m-%d"),
                day.available,
                day.booked
            );
        }
        Ok(())
    }

    async fn year(&self, doctor: i64, year: i32) -> Result<(), String> {
        let slots = self.doctor_slots(doctor).await?;
        let view = year_view(year, &slots);
        for month in view.months {
            println!(
                "{:04}-{:02}  {} open, {} booked",
                view.year, month.month, month.available, month.booked
            );
        }
        Ok(())
    }

    async fn create_slot(
        &self,
        doctor: i64,
        date: NaiveDate,
        start: NaiveTime,
        end: Option<NaiveTime>,
        duration: Option<u32>,
    ) -> Result<(), String> {
        let end = end.unwrap_or_else(|| {
            let minutes = duration.unwrap_or(self.config.default_slot_minutes);
            start + Duration::minutes(minutes as i64)
        });
        let request =
            CreateSlotRequest::new(doctor, date, start, end, duration).map_err(|e| e.to_string())?;

        let slot = self
            .availability()
            .create_slot(request)
            .await
            .map_err(report)?;
        println!("Created slot {} on {} ({})", slot.id, slot.date_key(), slot.time_label());
        Ok(())
    }

    async fn delete_slot(&self, doctor: i64, slot: i64) -> Result<(), String> {
        self.availability()
            .delete_slot(doctor, slot)
            .await
            .map_err(report)?;
        println!("Deleted slot {}", slot);
        Ok(())
    }

    async fn appointments(&self) -> Result<(), String> {
        let appointments = BookingService::with_api(self.api.clone())
            .my_appointments()
            .await
            .map_err(report)?;

        if appointments.is_empty() {
            println!("No appointments");
        }
        for appointment in appointments {
            println!(
                "#{}  slot {}  {:?}",
                appointment.id,
                appointment
                    .availability_slot_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                appointment.status
            );
        }
        Ok(())
    }

    async fn notifications(&self, mark_all_read: bool) -> Result<(), String> {
        let mut service = NotificationService::with_api(self.api.clone());
        let inbox = service.list().await.map_err(report)?;

        for notification in &inbox.notifications {
            println!(
                "{} {}  {}  {}",
                if notification.is_read { " " } else { "*" },
                notification.created_at.format("%Y-%m-%d %H:%M"),
                notification.title,
                notification.id
            );
        }

        if mark_all_read {
            service.mark_all_read().await.map_err(report)?;
            info!("Marked all notifications as read");
        }
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> Result<(), String> {
        NotificationService::with_api(self.api.clone())
            .mark_read(id)
            .await
            .map_err(report)
    }

    async fn profile(&self, action: ProfileCommand) -> Result<(), String> {
        let service = self.profiles();
        let profile = match action {
            ProfileCommand::Show => service.current_user().await,
            ProfileCommand::Update {
                first_name,
                last_name,
                email,
                phone,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    email,
                    phone,
                };
                service.update_profile(&update).await
            }
            ProfileCommand::Photo { path } => service.upload_photo_file(Path::new(&path)).await,
        }
        .map_err(report)?;

        print_profile(&profile);
        Ok(())
    }
}

fn print_day(day: &DaySlots) {
    if day.is_empty() {
        println!("No slots on this day");
        return;
    }

    println!("Available:");
    for slot in &day.available {
        println!("  [{}] {}", slot.id, slot.time_label());
    }
    println!("Booked:");
    for slot in &day.booked {
        println!("  [{}] {}", slot.id, slot.time_label());
    }
}

fn print_profile(profile: &UserProfile) {
    println!("{} ({})", profile.user.display_name(), profile.user.role);
    if let Some(email) = &profile.user.email {
        println!("  email: {}", email);
    }
    if let Some(phone) = &profile.phone {
        println!("  phone: {}", phone);
    }
    if let Some(url) = &profile.profile_photo_url {
        println!("  photo: {}", url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};

    const DOCTOR: i64 = 2;
    const PATIENT: i64 = 7;

    async fn context_with_day(server: &MockServer, slots: serde_json::Value) -> CommandContext {
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(MockApiResponses::current_user(&TestUser::patient(PATIENT))),
            )
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/appointments/doctors/2/availability"))
            .respond_with(ResponseTemplate::new(200).set_body_json(slots))
            .mount(server)
            .await;

        CommandContext::new(TestConfig::with_base_url(&server.uri()).to_app_config())
    }

    #[tokio::test]
    async fn test_cancel_on_open_slot_does_not_book() {
        let mock_server = MockServer::start().await;
        let context = context_with_day(
            &mock_server,
            json!([MockApiResponses::open_slot(5, DOCTOR, "2023-12-01", "14:30", "15:00")]),
        )
        .await;

        Mock::given(method("POST"))
            .and(path("/api/appointments/book"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = context
            .run(Commands::Cancel {
                doctor: DOCTOR,
                date: "2023-12-01".to_string(),
                slot: 5,
                reason: Some("Travelling".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err, "Slot 5 is not booked. Use book instead.");
    }

    #[tokio::test]
    async fn test_book_on_own_appointment_does_not_cancel() {
        let mock_server = MockServer::start().await;
        let context = context_with_day(
            &mock_server,
            json!([MockApiResponses::booked_slot(5, DOCTOR, "2023-12-01", "14:30", PATIENT, 40)]),
        )
        .await;

        Mock::given(method("PUT"))
            .and(path("/api/appointments/40/cancel"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = context
            .run(Commands::Book {
                doctor: DOCTOR,
                date: "2023-12-01".to_string(),
                slot: 5,
            })
            .await
            .unwrap_err();
        assert_eq!(err, "Slot 5 is one of your appointments. Use cancel instead.");
    }
}
