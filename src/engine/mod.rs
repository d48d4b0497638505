//! The record-management engine: per-entity controllers, their modal edit
//! sessions, toolkit-neutral form state and the cross-controller event queue.

mod controller;
mod events;
mod forms;
mod session;

pub use controller::RecordController;
pub use events::{Event, EventQueue};
pub use forms::{FormBinding, FormState, Input, InputKind, Picker};
pub use session::{EditSession, Mode, Outcome};
