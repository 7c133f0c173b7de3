pub mod booking;
pub mod session;
pub mod workflow;

pub use booking::{create_booking_data, validate_booking_data, BookingGateway, BookingService};
pub use session::{ConfirmOutcome, SchedulingSession};
pub use workflow::{ModalState, WorkflowAction, WorkflowController};
