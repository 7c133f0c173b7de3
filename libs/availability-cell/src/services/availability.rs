use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use shared_api_client::ApiClient;
use shared_config::AppConfig;
use shared_models::AppError;
use shared_utils::datetime::DateInput;

use crate::models::{AvailabilitySlot, CreateSlotRequest, DaySlots};
use crate::services::reconciliation::{partition, slots_on, SlotReconciler};

/// Remote operations on availability slots.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SlotGateway: Send + Sync {
    async fn fetch_doctor_slots(&self, doctor_id: i64) -> Result<Vec<Value>>;

    async fn create_slot(&self, request: &CreateSlotRequest) -> Result<Value>;

    async fn delete_slot(&self, slot_id: i64) -> Result<()>;
}

#[async_trait]
impl SlotGateway for ApiClient {
    async fn fetch_doctor_slots(&self, doctor_id: i64) -> Result<Vec<Value>> {
        let path = format!("/api/appointments/doctors/{}/availability", doctor_id);
        self.request(Method::GET, &path, None).await
    }

    async fn create_slot(&self, request: &CreateSlotRequest) -> Result<Value> {
        let body = serde_json::to_value(request)?;
        self.request(Method::POST, "/api/appointments/availability", Some(body))
            .await
    }

    async fn delete_slot(&self, slot_id: i64) -> Result<()> {
        let path = format!("/api/appointments/availability/{}", slot_id);
        self.request_empty(Method::DELETE, &path, None).await
    }
}

struct CachedSlots {
    slots: Vec<AvailabilitySlot>,
    fetched_at: Instant,
}

/// Per-doctor slot cache in front of the API. Mutations made through this
/// service, or reported through `invalidate`, drop the doctor's entry so the
/// next read goes back to the server.
pub struct AvailabilityService {
    gateway: Arc<dyn SlotGateway>,
    reconciler: SlotReconciler,
    cache: HashMap<i64, CachedSlots>,
    ttl: Duration,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, gateway: Arc<dyn SlotGateway>) -> Self {
        Self {
            gateway,
            reconciler: SlotReconciler::from_config(config),
            cache: HashMap::new(),
            ttl: Duration::from_secs(config.slot_cache_ttl_secs),
        }
    }

    pub fn with_api(config: &AppConfig, api: Arc<ApiClient>) -> Self {
        Self::new(config, api)
    }

    pub fn reconciler(&self) -> &SlotReconciler {
        &self.reconciler
    }

    /// All valid slots of a doctor, from cache while fresh.
    pub async fn slots_for_doctor(&mut self, doctor_id: i64) -> Result<Vec<AvailabilitySlot>, AppError> {
        if let Some(cached) = self.cache.get(&doctor_id) {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!("Slot cache hit for doctor {}", doctor_id);
                return Ok(cached.slots.clone());
            }
        }

        self.refresh(doctor_id).await
    }

    /// Fetches a doctor's slots from the server regardless of the cache.
    pub async fn refresh(&mut self, doctor_id: i64) -> Result<Vec<AvailabilitySlot>, AppError> {
        debug!("Fetching slots for doctor {}", doctor_id);

        let values = self
            .gateway
            .fetch_doctor_slots(doctor_id)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;

        let slots = self.reconciler.canonicalize_values(values);
        self.cache.insert(
            doctor_id,
            CachedSlots {
                slots: slots.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(slots)
    }

    /// The doctor's slots on one calendar day, split into available and booked.
    pub async fn slots_for_day(
        &mut self,
        doctor_id: i64,
        date: impl Into<DateInput>,
    ) -> Result<DaySlots, AppError> {
        let target = self
            .reconciler
            .local_day(date)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let slots = self.slots_for_doctor(doctor_id).await?;
        Ok(partition(slots_on(&slots, target)))
    }

    pub fn invalidate(&mut self, doctor_id: i64) {
        if self.cache.remove(&doctor_id).is_some() {
            debug!("Invalidated slot cache for doctor {}", doctor_id);
        }
    }

    pub fn is_cached(&self, doctor_id: i64) -> bool {
        self.cache.contains_key(&doctor_id)
    }

    pub async fn create_slot(&mut self, request: CreateSlotRequest) -> Result<AvailabilitySlot, AppError> {
        info!(
            "Creating slot for doctor {} on {} at {}",
            request.doctor_id, request.date, request.start_time
        );

        let created = self
            .gateway
            .create_slot(&request)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;
        self.invalidate(request.doctor_id);

        self.reconciler
            .canonicalize_values(vec![created])
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Server returned an unreadable slot".to_string()))
    }

    pub async fn delete_slot(&mut self, doctor_id: i64, slot_id: i64) -> Result<(), AppError> {
        info!("Deleting slot {} of doctor {}", slot_id, doctor_id);

        self.gateway
            .delete_slot(slot_id)
            .await
            .map_err(|e| AppError::from_api_error(&e))?;
        self.invalidate(doctor_id);

        Ok(())
    }
}
