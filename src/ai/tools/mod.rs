pub mod find_slot;
pub use find_slot::FindSlotTool;

pub mod create_event;
pub use create_event::CreateEventTool;
