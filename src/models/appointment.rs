use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::error::{ValidationError, ValidationReason};
use crate::validation::ValidationContext;

use super::{Entity, FieldDescriptor, FieldValue, Record};

/// A scheduled meeting with a customer. `start` and `end` are absolute
/// instants; zones only matter when rendering or checking business hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub(crate) id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub kind: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub customer_id: i64,
    pub user_id: i64,
    pub contact_id: i64,
}

const APPOINTMENT_FIELDS: &[FieldDescriptor<Appointment>] = &[
    FieldDescriptor {
        name: "title",
        label: "Title",
        required: true,
        get: |a| FieldValue::Text(&a.title),
    },
    FieldDescriptor {
        name: "description",
        label: "Description",
        required: true,
        get: |a| FieldValue::Text(&a.description),
    },
    FieldDescriptor {
        name: "location",
        label: "Location",
        required: true,
        get: |a| FieldValue::Text(&a.location),
    },
    FieldDescriptor {
        name: "kind",
        label: "Type",
        required: true,
        get: |a| FieldValue::Text(&a.kind),
    },
    FieldDescriptor {
        name: "start",
        label: "Start",
        required: true,
        get: |a| FieldValue::Instant(a.start),
    },
    FieldDescriptor {
        name: "end",
        label: "End",
        required: true,
        get: |a| FieldValue::Instant(a.end),
    },
    FieldDescriptor {
        name: "customer_id",
        label: "Customer",
        required: true,
        get: |a| FieldValue::Key(a.customer_id),
    },
    FieldDescriptor {
        name: "user_id",
        label: "User",
        required: true,
        get: |a| FieldValue::Key(a.user_id),
    },
    FieldDescriptor {
        name: "contact_id",
        label: "Contact",
        required: true,
        get: |a| FieldValue::Key(a.contact_id),
    },
];

impl Appointment {
    /// Build an unsaved appointment.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        kind: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        customer_id: i64,
        user_id: i64,
        contact_id: i64,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            location: location.into(),
            kind: kind.into(),
            start,
            end,
            customer_id,
            user_id,
            contact_id,
        }
    }

    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl Record for Appointment {
    const KIND: &'static str = "Appointment";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Appointment {
    /// Starts at the next full hour and lasts one hour.
    fn blank() -> Self {
        let now = Utc::now();
        let start = now
            .duration_trunc(Duration::hours(1))
            .unwrap_or(now)
            + Duration::hours(1);
        Appointment::new("", "", "", "", start, start + Duration::hours(1), 0, 0, 0)
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        APPOINTMENT_FIELDS
    }

    fn validate_rules(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let hours = ctx.hours;
        for (label, instant) in [("Start", self.start), ("End", self.end)] {
            if !hours.contains(instant) {
                return Err(ValidationError::new(label, ValidationReason::OutOfRange)
                    .with_detail(hours.describe()));
            }
        }
        if self.start >= self.end {
            return Err(ValidationError::new("Start", ValidationReason::StartAfterEnd));
        }

        let lookups = ctx.lookups;
        if !lookups.customers.contains_key(&self.customer_id) {
            return Err(ValidationError::new("Customer", ValidationReason::Unknown));
        }
        if !lookups.contacts.contains_key(&self.contact_id) {
            return Err(ValidationError::new("Contact", ValidationReason::Unknown));
        }
        if !lookups.users.contains_key(&self.user_id) {
            return Err(ValidationError::new("User", ValidationReason::Unknown));
        }
        Ok(())
    }

    fn merge(&mut self, edited: &Self) {
        self.title = edited.title.trim().to_string();
        self.description = edited.description.trim().to_string();
        self.location = edited.location.trim().to_string();
        self.kind = edited.kind.trim().to_string();
        self.start = edited.start;
        self.end = edited.end;
        self.customer_id = edited.customer_id;
        self.user_id = edited.user_id;
        self.contact_id = edited.contact_id;
    }
}
