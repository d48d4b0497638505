//! Persistence module split across logical submodules.

mod appointments;
mod connection;
mod customers;
mod reference;
pub mod reports;
mod repository;

pub use appointments::{AppointmentFilter, AppointmentRepository, Period};
pub use connection::{ensure_schema, Session};
pub use customers::CustomerRepository;
pub use reference::load_lookups;
pub use repository::{DeleteReport, Dependent, Repository};
