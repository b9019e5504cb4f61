pub mod agents;
pub mod crew;
pub mod prompt;
pub mod tools;

pub use crew::{Agent, Crew, CrewOutput, Task, TaskOutput};
