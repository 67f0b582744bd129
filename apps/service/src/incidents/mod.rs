/// Incident lifecycle - turns the stream of checks for a site into at most one
/// open incident at a time
pub mod handler;
pub mod machine;

pub use handler::{IncidentHandler, IncidentReport};
pub use machine::Transition;
