use std::fmt;

use crate::error::{ValidationError, ValidationReason};
use crate::validation::ValidationContext;

use super::{Entity, FieldDescriptor, FieldValue, Record};

/// A customer of the organisation. The division is the only geographic link;
/// the country is always derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub(crate) id: i64,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub phone: String,
    pub division_id: i64,
}

const CUSTOMER_FIELDS: &[FieldDescriptor<Customer>] = &[
    FieldDescriptor {
        name: "name",
        label: "Name",
        required: true,
        get: |c| FieldValue::Text(&c.name),
    },
    FieldDescriptor {
        name: "address",
        label: "Address",
        required: true,
        get: |c| FieldValue::Text(&c.address),
    },
    FieldDescriptor {
        name: "postal_code",
        label: "Postal Code",
        required: true,
        get: |c| FieldValue::Text(&c.postal_code),
    },
    FieldDescriptor {
        name: "phone",
        label: "Phone",
        required: true,
        get: |c| FieldValue::Text(&c.phone),
    },
    FieldDescriptor {
        name: "division_id",
        label: "Division",
        required: true,
        get: |c| FieldValue::Key(c.division_id),
    },
];

impl Customer {
    /// Build an unsaved customer.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        postal_code: impl Into<String>,
        phone: impl Into<String>,
        division_id: i64,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            address: address.into(),
            postal_code: postal_code.into(),
            phone: phone.into(),
            division_id,
        }
    }

    /// Only the repository moves ids: after an insert, and back to zero after
    /// a delete.
    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl Record for Customer {
    const KIND: &'static str = "Customer";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Customer {
    fn blank() -> Self {
        Customer::new("", "", "", "", 0)
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        CUSTOMER_FIELDS
    }

    fn validate_rules(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        if ctx.lookups.division(self.division_id).is_none() {
            return Err(ValidationError::new("Division", ValidationReason::Unknown));
        }
        Ok(())
    }

    fn merge(&mut self, edited: &Self) {
        self.name = edited.name.trim().to_string();
        self.address = edited.address.trim().to_string();
        self.postal_code = edited.postal_code.trim().to_string();
        self.phone = edited.phone.trim().to_string();
        self.division_id = edited.division_id;
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
