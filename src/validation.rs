//! Two-layer validation: every required field in an entity's field table must
//! be present, then the entity's own rules run.

use crate::error::{ValidationError, ValidationReason};
use crate::models::{Entity, FieldValue, Lookups};
use crate::time::BusinessHours;

/// What custom rules may consult. Nothing here touches the database.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub hours: &'a BusinessHours,
    pub lookups: &'a Lookups,
}

/// Check the required fields only. Text fails when blank after trimming, a
/// foreign key fails when it still holds the unset sentinel.
pub fn validate_required<E: Entity>(entity: &E) -> Result<(), ValidationError> {
    for field in E::fields().iter().filter(|field| field.required) {
        let missing = match (field.get)(entity) {
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::Key(key) => key == 0,
            FieldValue::Instant(_) => false,
        };
        if missing {
            return Err(ValidationError::new(field.label, ValidationReason::Empty));
        }
    }
    Ok(())
}

pub fn validate<E: Entity>(entity: &E, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
    validate_required(entity)?;
    entity.validate_rules(ctx).inspect_err(|err| {
        log::debug!(
            "{} #{} rejected: {} ({})",
            E::KIND,
            entity.id(),
            err.field,
            err.reason.code()
        );
    })
}
