//! Read-only aggregations behind the Reports screen. Each function returns
//! plain data; turning it into text is the UI's job.

use rusqlite::types::Value;

use crate::error::EngineResult;
use crate::models::{Appointment, Contact, Customer, Division};

use super::connection::Session;
use super::repository::load_rows;

/// Appointment totals grouped by month (1-12) and by type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentTotals {
    pub by_month: Vec<(u32, i64)>,
    pub by_type: Vec<(String, i64)>,
}

/// One contact and its appointments, soonest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSchedule {
    pub contact: Contact,
    pub appointments: Vec<Appointment>,
}

/// One division and the customers located in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionCustomers {
    pub division: Division,
    pub customers: Vec<Customer>,
}

pub fn appointment_totals(session: &Session) -> EngineResult<AppointmentTotals> {
    let by_month = session.query(
        "count appointments by month",
        "SELECT CAST(strftime('%m', `start`) AS INTEGER) AS month, COUNT(*)
         FROM appointments GROUP BY month ORDER BY month",
        &[],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let by_type = session.query(
        "count appointments by type",
        "SELECT type, COUNT(*) FROM appointments GROUP BY type ORDER BY type",
        &[],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(AppointmentTotals { by_month, by_type })
}

/// Every contact with at least one appointment, ordered by contact id.
pub fn contact_schedules(session: &Session) -> EngineResult<Vec<ContactSchedule>> {
    let contacts = session.query(
        "load scheduled contacts",
        "SELECT DISTINCT c.id, c.name, c.email
         FROM contacts c
         INNER JOIN appointments a ON a.contact_id = c.id
         ORDER BY c.id",
        &[],
        |row| {
            Ok(Contact {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        },
    )?;

    let mut schedules = Vec::with_capacity(contacts.len());
    for contact in contacts {
        let appointments = load_rows::<Appointment>(
            session,
            Some("contact_id = ?1"),
            "`start`, id",
            &[Value::from(contact.id)],
        )?;
        schedules.push(ContactSchedule {
            contact,
            appointments,
        });
    }
    Ok(schedules)
}

/// Customers grouped by division, divisions ordered by name.
pub fn customers_by_division(session: &Session) -> EngineResult<Vec<DivisionCustomers>> {
    let rows = session.query(
        "load customers by division",
        "SELECT d.id, d.division, d.country_id,
                c.id, c.name, c.address, c.postal_code, c.phone, c.division_id
         FROM customers c
         INNER JOIN first_level_divisions d ON d.id = c.division_id
         ORDER BY d.division, c.id",
        &[],
        |row| {
            let division = Division {
                id: row.get(0)?,
                name: row.get(1)?,
                country_id: row.get(2)?,
            };
            let mut customer = Customer::new(
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get(8)?,
            );
            customer.id = row.get(3)?;
            Ok((division, customer))
        },
    )?;

    let mut groups: Vec<DivisionCustomers> = Vec::new();
    for (division, customer) in rows {
        match groups.last_mut() {
            Some(group) if group.division.id == division.id => group.customers.push(customer),
            _ => groups.push(DivisionCustomers {
                division,
                customers: vec![customer],
            }),
        }
    }
    Ok(groups)
}
