pub mod availability;
pub mod calendar;
pub mod reconciliation;

pub use availability::{AvailabilityService, SlotGateway};
pub use reconciliation::{partition, slots_on, SlotReconciler};
