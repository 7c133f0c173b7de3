use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::AppointmentError;
use appointment_cell::services::{ConfirmOutcome, ModalState, SchedulingSession};
use availability_cell::services::AvailabilityService;
use appointment_cell::services::BookingService;
use shared_api_client::ApiClient;
use shared_models::AppError;
use shared_utils::test_utils::{MockApiResponses, TestConfig};

const DOCTOR: i64 = 2;
const PATIENT: i64 = 7;
const AVAILABILITY_PATH: &str = "/api/appointments/doctors/2/availability";

fn session_for(server: &MockServer) -> SchedulingSession {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    let api = Arc::new(ApiClient::new(&config));
    SchedulingSession::new(
        AvailabilityService::with_api(&config, api.clone()),
        BookingService::with_api(api),
        PATIENT,
    )
}

async fn mount_day(server: &MockServer, slots: serde_json::Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path(AVAILABILITY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(slots))
        .up_to_n_times(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_booking_flow_refreshes_the_day() {
    let mock_server = MockServer::start().await;

    mount_day(
        &mock_server,
        json!([
            MockApiResponses::open_slot(1, DOCTOR, "2023-12-01", "14:30", "15:00"),
            MockApiResponses::open_slot(2, DOCTOR, "2023-12-01", "15:00", "15:30"),
        ]),
        1,
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .and(header("Authorization", TestConfig::default().bearer().as_str()))
        .and(body_json(json!({
            "doctorUserId": DOCTOR,
            "availabilitySlotId": 1,
            "appointmentDateTime": "2023-12-01T14:30:00",
            "durationMinutes": 30
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(MockApiResponses::appointment(500, PATIENT, 1, "booked")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut session = session_for(&mock_server);
    let day = session.open_day(DOCTOR, "2023-12-01").await.unwrap();
    assert_eq!(day.available.len(), 2);

    session.select_slot(1).unwrap();
    assert_matches!(session.state(), ModalState::BookingConfirm { .. });

    // after booking the day is fetched again and shows the slot as taken
    mount_day(
        &mock_server,
        json!([
            MockApiResponses::booked_slot(1, DOCTOR, "2023-12-01", "14:30", PATIENT, 500),
            MockApiResponses::open_slot(2, DOCTOR, "2023-12-01", "15:00", "15:30"),
        ]),
        1,
    )
    .await;

    let outcome = session.confirm().await.unwrap();
    assert_eq!(
        outcome,
        ConfirmOutcome::Booked {
            slot_id: 1,
            appointment_id: 500
        }
    );
    assert_eq!(session.state(), &ModalState::Idle);
    assert_eq!(session.day().booked.len(), 1);
    assert_eq!(session.day().available.len(), 1);
    assert!(session.notice().is_some());
}

#[tokio::test]
async fn test_failed_booking_keeps_confirm_view() {
    let mock_server = MockServer::start().await;

    mount_day(
        &mock_server,
        json!([MockApiResponses::open_slot(1, DOCTOR, "2023-12-01", "14:30", "15:00")]),
        1,
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(MockApiResponses::error_response("Slot already booked")),
        )
        .mount(&mock_server)
        .await;

    let mut session = session_for(&mock_server);
    session.open_day(DOCTOR, "2023-12-01").await.unwrap();
    session.select_slot(1).unwrap();

    let err = session.confirm().await.unwrap_err();
    assert_matches!(err, AppointmentError::Api(AppError::Conflict(_)));
    assert_matches!(session.state(), ModalState::BookingConfirm { .. });
    assert!(!session.workflow().is_busy());
    assert_eq!(
        session.workflow().last_error(),
        Some("That time slot is no longer available.")
    );
}

#[tokio::test]
async fn test_cancel_own_appointment() {
    let mock_server = MockServer::start().await;

    mount_day(
        &mock_server,
        json!([
            MockApiResponses::booked_slot(1, DOCTOR, "2023-12-01", "09:00", PATIENT, 40),
            MockApiResponses::booked_slot(2, DOCTOR, "2023-12-01", "09:30", 99, 41),
        ]),
        2,
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/api/appointments/40/cancel"))
        .and(body_json(json!({ "cancellationReason": "Travelling" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut session = session_for(&mock_server);
    session.open_day(DOCTOR, "2023-12-01").await.unwrap();

    assert_matches!(
        session.select_slot(2),
        Err(AppointmentError::NotYourAppointment(2))
    );

    session.select_slot(1).unwrap();
    session.set_cancellation_reason("Travelling").unwrap();

    let outcome = session.confirm().await.unwrap();
    assert_eq!(outcome, ConfirmOutcome::Cancelled { appointment_id: 40 });
    assert_eq!(session.state(), &ModalState::Idle);
}

#[tokio::test]
async fn test_failed_fetch_leaves_an_empty_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(AVAILABILITY_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(MockApiResponses::error_response("expired")))
        .mount(&mock_server)
        .await;

    let mut session = session_for(&mock_server);
    let err = session.open_day(DOCTOR, "2023-12-01").await.unwrap_err();

    assert_matches!(err, AppointmentError::Api(AppError::Auth(_)));
    assert_matches!(session.state(), ModalState::SlotList { .. });
    assert!(session.day().is_empty());
    assert_eq!(
        session.notice(),
        Some("Your session has expired. Please sign in again.")
    );
}

#[tokio::test]
async fn test_unknown_slot_is_not_selectable() {
    let mock_server = MockServer::start().await;
    mount_day(&mock_server, json!([]), 1).await;

    let mut session = session_for(&mock_server);
    session.open_day(DOCTOR, "2023-12-01").await.unwrap();

    assert_matches!(session.select_slot(42), Err(AppointmentError::SlotNotFound(42)));
}

#[tokio::test]
async fn test_upper_case_status_in_booking_response_counts_as_booked() {
    let mock_server = MockServer::start().await;

    mount_day(
        &mock_server,
        json!([MockApiResponses::open_slot(1, DOCTOR, "2023-12-01", "14:30", "15:00")]),
        1,
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 500, "status": "SCHEDULED"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut session = session_for(&mock_server);
    session.open_day(DOCTOR, "2023-12-01").await.unwrap();
    session.select_slot(1).unwrap();

    mount_day(
        &mock_server,
        json!([MockApiResponses::booked_slot(1, DOCTOR, "2023-12-01", "14:30", PATIENT, 500)]),
        1,
    )
    .await;

    let outcome = session.confirm().await.unwrap();
    assert_eq!(
        outcome,
        ConfirmOutcome::Booked {
            slot_id: 1,
            appointment_id: 500
        }
    );
    assert_eq!(session.state(), &ModalState::Idle);
    assert_eq!(session.day().booked.len(), 1);
}
