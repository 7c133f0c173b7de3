use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::models::{CreateSlotRequest, SlotShapeError};
use availability_cell::services::AvailabilityService;
use shared_api_client::ApiClient;
use shared_models::AppError;
use shared_utils::test_utils::{MockApiResponses, TestConfig};

fn service_for(server: &MockServer) -> (AvailabilityService, TestConfig) {
    let test_config = TestConfig::with_base_url(&server.uri());
    let config = test_config.to_app_config();
    let api = Arc::new(ApiClient::new(&config));
    (AvailabilityService::with_api(&config, api), test_config)
}

#[tokio::test]
async fn test_slots_for_day_fetches_with_bearer_token() {
    let mock_server = MockServer::start().await;
    let (mut service, config) = service_for(&mock_server);

    Mock::given(method("GET"))
        .and(path("/api/appointments/doctors/2/availability"))
        .and(header("Authorization", config.bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::open_slot(1, 2, "2023-12-01", "09:00", "09:30"),
            MockApiResponses::booked_slot(2, 2, "2023-12-01", "10:00", 7, 50),
            MockApiResponses::open_slot(3, 2, "2023-12-04", "09:00", "09:30"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let day = service.slots_for_day(2, "2023-12-01").await.unwrap();
    assert_eq!(day.available.len(), 1);
    assert_eq!(day.booked.len(), 1);

    // served from cache, the mock expects a single call
    let other_day = service.slots_for_day(2, "2023-12-04").await.unwrap();
    assert_eq!(other_day.available.len(), 1);
}

#[tokio::test]
async fn test_server_error_is_reported_not_thrown() {
    let mock_server = MockServer::start().await;
    let (mut service, _) = service_for(&mock_server);

    Mock::given(method("GET"))
        .and(path("/api/appointments/doctors/2/availability"))
        .respond_with(ResponseTemplate::new(500).set_body_json(MockApiResponses::error_response("boom")))
        .mount(&mock_server)
        .await;

    let err = service.slots_for_day(2, "2023-12-01").await.unwrap_err();
    assert_matches!(err, AppError::ExternalService(_));
    assert!(!err.user_message().contains("boom"));
}

#[tokio::test]
async fn test_create_slot_posts_canonical_payload() {
    let mock_server = MockServer::start().await;
    let (mut service, _) = service_for(&mock_server);

    Mock::given(method("POST"))
        .and(path("/api/appointments/availability"))
        .and(body_json(json!({
            "doctorId": 2,
            "date": "2023-12-01",
            "startTime": "14:00:00",
            "endTime": "14:30:00",
            "durationMinutes": 30
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(
            MockApiResponses::open_slot(11, 2, "2023-12-01", "14:00:00", "14:30:00"),
        ))
        .mount(&mock_server)
        .await;

    let request = CreateSlotRequest::new(
        2,
        NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        None,
    )
    .unwrap();

    let slot = service.create_slot(request).await.unwrap();
    assert_eq!(slot.id, 11);
    assert_eq!(slot.duration_minutes, Some(30));
}

#[test]
fn test_create_slot_request_validation() {
    let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let half_past = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

    assert_matches!(
        CreateSlotRequest::new(2, date, half_past, nine, None),
        Err(SlotShapeError::EndBeforeStart { .. })
    );
    assert_matches!(
        CreateSlotRequest::new(2, date, nine, half_past, Some(45)),
        Err(SlotShapeError::DurationMismatch { duration: 45, span: 30, .. })
    );
    assert!(CreateSlotRequest::new(2, date, nine, half_past, Some(30)).is_ok());
}
