use std::rc::Rc;

use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::EngineResult;
use crate::models::{Appointment, Customer, Record};

use super::connection::Session;
use super::repository::{
    delete_row, insert_row, load_rows, update_row, DeleteReport, Dependent, Repository,
    SqlTemplate, TableMapping,
};

impl TableMapping for Customer {
    const SELECT: SqlTemplate = SqlTemplate {
        sql: "SELECT id, name, address, postal_code, phone, division_id FROM customers",
        operation: "load customers",
    };
    const INSERT: SqlTemplate = SqlTemplate {
        sql: "INSERT INTO customers
                (name, address, postal_code, phone, division_id, created_by, last_updated_by)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        operation: "insert customer",
    };
    const UPDATE: SqlTemplate = SqlTemplate {
        sql: "UPDATE customers
              SET name = ?1, address = ?2, postal_code = ?3, phone = ?4, division_id = ?5,
                  last_updated_by = ?6, last_update = CURRENT_TIMESTAMP
              WHERE id = ?7",
        operation: "update customer",
    };
    const DELETE: SqlTemplate = SqlTemplate {
        sql: "DELETE FROM customers WHERE id = ?1",
        operation: "delete customer",
    };

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut customer = Customer::new(
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get(5)?,
        );
        customer.id = row.get(0)?;
        Ok(customer)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.name.trim().to_string()),
            Value::from(self.address.trim().to_string()),
            Value::from(self.postal_code.trim().to_string()),
            Value::from(self.phone.trim().to_string()),
            Value::from(self.division_id),
        ]
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Customer persistence. Deleting a customer removes its appointments first,
/// inside the same transaction.
pub struct CustomerRepository {
    session: Rc<Session>,
}

impl CustomerRepository {
    pub fn new(session: Rc<Session>) -> Self {
        Self { session }
    }

    fn dependents(&self, customer_id: i64) -> EngineResult<Vec<Dependent>> {
        self.session.query(
            "load dependent appointments",
            "SELECT id, type FROM appointments WHERE customer_id = ?1 ORDER BY `start`, id",
            &[Value::from(customer_id)],
            |row| {
                Ok(Dependent {
                    kind: Appointment::KIND,
                    id: row.get(0)?,
                    label: row.get(1)?,
                })
            },
        )
    }
}

impl Repository<Customer> for CustomerRepository {
    type Filter = ();

    fn find_all(&self, _filter: Option<&()>) -> EngineResult<Vec<Customer>> {
        load_rows(&self.session, None, "id", &[])
    }

    fn insert(&self, entity: &mut Customer) -> EngineResult<i64> {
        insert_row(&self.session, entity)
    }

    fn update(&self, entity: &Customer) -> EngineResult<usize> {
        update_row(&self.session, entity)
    }

    fn delete(&self, entity: &mut Customer) -> EngineResult<DeleteReport> {
        let id = entity.id();
        let cascaded = self.session.transaction("delete customer", |session| {
            let dependents = self.dependents(id)?;
            session.execute(
                "delete customer appointments",
                "DELETE FROM appointments WHERE customer_id = ?1",
                &[Value::from(id)],
            )?;
            delete_row(session, entity)?;
            Ok(dependents)
        })?;

        if !cascaded.is_empty() {
            log::info!(
                "cascade removed {} appointment(s) of customer #{id}",
                cascaded.len()
            );
        }
        entity.assign_id(0);
        Ok(DeleteReport {
            kind: Customer::KIND,
            id,
            cascaded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::appointments::AppointmentRepository;
    use crate::config::OverlapScope;
    use crate::error::{EngineError, PersistenceCause};
    use chrono::{TimeZone, Utc};

    fn session() -> Rc<Session> {
        Rc::new(Session::open_in_memory("test").expect("open session"))
    }

    fn acme() -> Customer {
        Customer::new("Acme", "1 Main St", "00000", "555-0100", 1)
    }

    #[test]
    fn insert_assigns_generated_id() {
        let repo = CustomerRepository::new(session());
        let mut customer = acme();
        let id = repo.insert(&mut customer).expect("insert");
        assert!(id > 0);
        assert_eq!(customer.id(), id);

        let loaded = repo.find_all(None).expect("load");
        assert_eq!(loaded, vec![customer]);
    }

    #[test]
    fn insert_records_the_acting_user() {
        let session = session();
        let repo = CustomerRepository::new(Rc::clone(&session));
        let mut customer = acme();
        repo.insert(&mut customer).expect("insert");
        let (created, updated): (i64, i64) = session
            .conn()
            .query_row(
                "SELECT created_by, last_updated_by FROM customers WHERE id = ?1",
                [customer.id()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("audit columns");
        assert_eq!(created, session.user().id);
        assert_eq!(updated, session.user().id);
    }

    #[test]
    fn update_binds_id_last() {
        let repo = CustomerRepository::new(session());
        let mut customer = acme();
        repo.insert(&mut customer).expect("insert");
        customer.phone = "555-0199".into();
        assert_eq!(repo.update(&customer).expect("update"), 1);
        let loaded = repo.find_all(None).expect("load");
        assert_eq!(loaded[0].phone, "555-0199");
    }

    #[test]
    fn update_of_missing_row_touches_nothing() {
        let repo = CustomerRepository::new(session());
        let mut ghost = acme();
        ghost.assign_id(404);
        assert_eq!(repo.update(&ghost).expect("update"), 0);
    }

    #[test]
    fn delete_cascades_to_appointments() {
        let session = session();
        let customers = CustomerRepository::new(Rc::clone(&session));
        let appointments = AppointmentRepository::new(Rc::clone(&session), OverlapScope::Global);

        let mut customer = acme();
        customers.insert(&mut customer).expect("insert customer");
        for (day, kind) in [(4, "Planning"), (5, "De-Briefing")] {
            let start = Utc.with_ymd_and_hms(2024, 3, day, 14, 0, 0).unwrap();
            let mut appointment = Appointment::new(
                "Review",
                "Quarterly",
                "Room 1",
                kind,
                start,
                start + chrono::Duration::hours(1),
                customer.id(),
                session.user().id,
                1,
            );
            appointments.insert(&mut appointment).expect("insert appointment");
        }

        let customer_id = customer.id();
        let report = customers.delete(&mut customer).expect("delete");
        assert_eq!(customer.id(), 0);
        assert_eq!(report.id, customer_id);
        let labels: Vec<&str> = report.cascaded.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Planning", "De-Briefing"]);
        assert!(appointments.find_all(None).expect("load").is_empty());
        assert!(customers.find_all(None).expect("load").is_empty());
    }

    #[test]
    fn failed_delete_leaves_dependents_in_place() {
        let session = session();
        let customers = CustomerRepository::new(Rc::clone(&session));
        let appointments = AppointmentRepository::new(Rc::clone(&session), OverlapScope::Global);

        let mut customer = acme();
        customers.insert(&mut customer).expect("insert customer");
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap();
        let mut appointment = Appointment::new(
            "Review",
            "Quarterly",
            "Room 1",
            "Planning",
            start,
            start + chrono::Duration::hours(1),
            customer.id(),
            session.user().id,
            1,
        );
        appointments.insert(&mut appointment).expect("insert appointment");

        // Point the in-memory copy at a row that does not exist but shares the
        // dependents' customer id: the primary delete affects nothing and the
        // whole transaction must roll back.
        session
            .conn()
            .execute("PRAGMA foreign_keys = OFF", [])
            .expect("pragma");
        session
            .conn()
            .execute("UPDATE customers SET id = 999 WHERE id = ?1", [customer.id()])
            .expect("move customer");

        let err = customers.delete(&mut customer).expect_err("primary row missing");
        assert!(matches!(
            err,
            EngineError::PersistenceFailed {
                cause: PersistenceCause::NoRowsAffected,
                ..
            }
        ));
        assert_ne!(customer.id(), 0);
        assert_eq!(appointments.find_all(None).expect("load").len(), 1);
    }
}
