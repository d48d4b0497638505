//! The generic half of the data-access layer: how an entity maps to fixed SQL
//! templates and how those templates are run with positional arguments.

use std::fmt::Write as _;

use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::{EngineError, EngineResult};
use crate::models::Entity;

use super::connection::Session;

/// A record removed as a side effect of deleting its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependent {
    pub kind: &'static str,
    pub id: i64,
    pub label: String,
}

/// What a successful delete removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub kind: &'static str,
    pub id: i64,
    pub cascaded: Vec<Dependent>,
}

impl DeleteReport {
    /// Confirmation text for the user, listing cascaded rows by id and type.
    pub fn message(&self) -> String {
        let mut message = format!("{} #{} deleted.", self.kind, self.id);
        if !self.cascaded.is_empty() {
            message.push_str(" Also removed:");
            for dependent in &self.cascaded {
                let _ = write!(
                    message,
                    " {} #{} ({});",
                    dependent.kind, dependent.id, dependent.label
                );
            }
            message.pop();
            message.push('.');
        }
        message
    }
}

/// Persistence contract for one entity type.
pub trait Repository<E: Entity> {
    /// Optional narrowing applied by `find_all`.
    type Filter;

    fn find_all(&self, filter: Option<&Self::Filter>) -> EngineResult<Vec<E>>;

    /// Insert a new row and write the generated key back onto `entity`.
    fn insert(&self, entity: &mut E) -> EngineResult<i64>;

    /// Update the row matching `entity`'s id; returns the affected row count.
    fn update(&self, entity: &E) -> EngineResult<usize>;

    /// Remove the row (after any dependents) and reset `entity`'s id to zero.
    fn delete(&self, entity: &mut E) -> EngineResult<DeleteReport>;

    /// Ids of other records that would clash with `entity` if it were saved.
    fn conflicts(&self, _entity: &E) -> EngineResult<Vec<i64>> {
        Ok(Vec::new())
    }

    /// Whether `entity` belongs in a list loaded with `filter`.
    fn matches(&self, _filter: &Self::Filter, _entity: &E) -> bool {
        true
    }

    fn can_persist(&self, entity: &E) -> EngineResult<bool> {
        Ok(self.conflicts(entity)?.is_empty())
    }
}

/// A SQL statement paired with the name reported when it fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SqlTemplate {
    pub(crate) sql: &'static str,
    pub(crate) operation: &'static str,
}

/// Static mapping between an entity and its table.
///
/// `INSERT` binds `to_values()` followed by created-by and last-updated-by.
/// `UPDATE` binds `to_values()`, last-updated-by, and the id last.
/// `DELETE` binds the id only.
pub(crate) trait TableMapping: Entity {
    /// Column list and FROM clause, without WHERE or ORDER BY.
    const SELECT: SqlTemplate;
    const INSERT: SqlTemplate;
    const UPDATE: SqlTemplate;
    const DELETE: SqlTemplate;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Editable fields in declaration order.
    fn to_values(&self) -> Vec<Value>;

    fn assign_id(&mut self, id: i64);
}

pub(crate) fn load_rows<E: TableMapping>(
    session: &Session,
    where_clause: Option<&str>,
    order_by: &str,
    args: &[Value],
) -> EngineResult<Vec<E>> {
    let mut sql = E::SELECT.sql.to_string();
    if let Some(clause) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(order_by);
    session.query(E::SELECT.operation, &sql, args, E::from_row)
}

pub(crate) fn insert_row<E: TableMapping>(session: &Session, entity: &mut E) -> EngineResult<i64> {
    let actor = Value::from(session.user().id);
    let mut args = entity.to_values();
    args.push(actor.clone());
    args.push(actor);

    let id = session.insert(E::INSERT.operation, E::INSERT.sql, &args)?;
    entity.assign_id(id);
    log::info!("inserted {} #{id}", E::KIND);
    Ok(id)
}

pub(crate) fn update_row<E: TableMapping>(session: &Session, entity: &E) -> EngineResult<usize> {
    let mut args = entity.to_values();
    args.push(Value::from(session.user().id));
    args.push(Value::from(entity.id()));

    let updated = session.execute(E::UPDATE.operation, E::UPDATE.sql, &args)?;
    log::info!("updated {} #{} ({updated} row(s))", E::KIND, entity.id());
    Ok(updated)
}

/// Delete the primary row. A missing row is an error so callers never drop
/// a record from memory that the database still holds.
pub(crate) fn delete_row<E: TableMapping>(session: &Session, entity: &E) -> EngineResult<()> {
    let deleted = session.execute(
        E::DELETE.operation,
        E::DELETE.sql,
        &[Value::from(entity.id())],
    )?;
    if deleted == 0 {
        return Err(EngineError::no_rows(E::DELETE.operation));
    }
    log::info!("deleted {} #{}", E::KIND, entity.id());
    Ok(())
}
