//! Core library surface for the customer scheduler.
//!
//! The record engine (`engine`, `db`, `validation`) is usable without the
//! terminal front-end; `main.rs` wires it to `ui` together with the config
//! file and the log file.
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod time;
pub mod ui;
pub mod validation;

/// Settings loaded at startup.
pub use config::{Config, OverlapScope};

/// The persistence layer: the shared session and one repository per entity.
pub use db::{AppointmentRepository, CustomerRepository, Repository, Session};

pub use engine::{Event, EventQueue, RecordController};
pub use error::{EngineError, EngineResult, ValidationError, ValidationReason};

/// The two editable domain types.
pub use models::{Appointment, Customer};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
