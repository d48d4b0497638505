//! Domain models that mirror the SQLite schema and get passed throughout the
//! engine. Editable entities describe their fields in a static table so the
//! generic validator and the list views can walk them without knowing the
//! concrete type.

mod appointment;
mod customer;
mod reference;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::validation::ValidationContext;

pub use appointment::Appointment;
pub use customer::Customer;
pub use reference::{Contact, Country, Division, Lookups, User};

/// Anything with a database identity. An id of `0` means "not saved yet".
pub trait Record {
    /// Singular display name used in messages ("Customer").
    const KIND: &'static str;

    fn id(&self) -> i64;

    fn is_new(&self) -> bool {
        self.id() == 0
    }
}

/// A borrowed view of one field, as seen by the generic validator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    /// Foreign key; `0` is the unset sentinel.
    Key(i64),
    Instant(DateTime<Utc>),
}

/// One row of an entity's field table.
pub struct FieldDescriptor<E> {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub get: for<'a> fn(&'a E) -> FieldValue<'a>,
}

impl<E> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish()
    }
}

/// An editable record the engine can create, update and delete.
pub trait Entity: Record + Clone + fmt::Debug + 'static {
    /// Template used when the user starts a Create session.
    fn blank() -> Self;

    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Entity-specific checks run after every required field is present.
    fn validate_rules(&self, _ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Copy the editable fields of `edited` onto `self`. The id never moves.
    fn merge(&mut self, edited: &Self);
}
