pub mod models;
pub mod publisher;
pub mod slot;

pub use models::{EventRequest, EventResult};
pub use publisher::{AuthorizationError, EventPublisher};
pub use slot::{TimeSlot, find_slot};
