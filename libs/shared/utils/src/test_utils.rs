use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{CurrentUser, UserRole};

pub const TEST_TOKEN: &str = "test-bearer-token";

pub struct TestConfig {
    pub api_base_url: String,
    pub auth_token: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            auth_token: TEST_TOKEN.to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            auth_token: Some(self.auth_token.clone()),
            ..AppConfig::default()
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.auth_token)
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl TestUser {
    pub fn new(id: i64, email: &str, role: UserRole) -> Self {
        Self {
            id,
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(id: i64) -> Self {
        Self::new(id, "doctor@example.com", UserRole::Doctor)
    }

    pub fn patient(id: i64) -> Self {
        Self::new(id, "patient@example.com", UserRole::Patient)
    }

    pub fn to_user(&self) -> CurrentUser {
        CurrentUser {
            email: Some(self.email.clone()),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
            ..CurrentUser::new(self.id, self.role)
        }
    }
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn open_slot(id: i64, doctor_id: i64, date: &str, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": id,
            "doctorId": doctor_id,
            "date": date,
            "startTime": start,
            "endTime": end,
            "durationMinutes": 30,
            "isBooked": false,
            "appointment": null
        })
    }

    pub fn booked_slot(
        id: i64,
        doctor_id: i64,
        date: &str,
        start: &str,
        patient_id: i64,
        appointment_id: i64,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "doctorId": doctor_id,
            "date": date,
            "startTime": start,
            "durationMinutes": 30,
            "isBooked": true,
            "appointment": Self::appointment(appointment_id, patient_id, id, "booked")
        })
    }

    pub fn appointment(id: i64, patient_id: i64, slot_id: i64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "patientId": patient_id,
            "availabilitySlotId": slot_id,
            "status": status,
            "cancellationReason": null
        })
    }

    pub fn current_user(user: &TestUser) -> serde_json::Value {
        json!({
            "id": user.id,
            "email": user.email,
            "role": user.role.to_string(),
            "firstName": "Test",
            "lastName": "User"
        })
    }

    pub fn notification(read: bool) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "title": "Appointment booked",
            "message": "Your appointment on 2023-12-01 at 14:30 is confirmed",
            "isRead": read,
            "createdAt": "2023-11-30T10:00:00Z"
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({
            "error": message
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_base_url("http://127.0.0.1:9999");
        let app_config = config.to_app_config();

        assert_eq!(app_config.api_base_url, "http://127.0.0.1:9999");
        assert_eq!(app_config.auth_token.as_deref(), Some(TEST_TOKEN));
        assert_eq!(config.bearer(), format!("Bearer {}", TEST_TOKEN));
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor(7);
        let model = user.to_user();
        assert_eq!(model.id, 7);
        assert!(model.is_doctor());
        assert_eq!(model.email, Some(user.email.clone()));
    }

    #[test]
    fn test_slot_fixtures_carry_booking_state() {
        let open = MockApiResponses::open_slot(1, 2, "2023-12-01", "09:00", "09:30");
        assert_eq!(open["isBooked"], false);

        let booked = MockApiResponses::booked_slot(3, 2, "2023-12-01", "10:00", 5, 9);
        assert_eq!(booked["appointment"]["patientId"], 5);
    }
}
