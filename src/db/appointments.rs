use std::rc::Rc;

use chrono::{DateTime, Datelike, Duration, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::Row;

use crate::config::OverlapScope;
use crate::error::EngineResult;
use crate::models::{Appointment, Record};
use crate::time::{from_storage, to_storage};

use super::connection::Session;
use super::repository::{
    delete_row, insert_row, load_rows, update_row, DeleteReport, Repository, SqlTemplate,
    TableMapping,
};

/// Calendar bucket used to narrow the appointment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// 1-12
    Month(u32),
    /// SQLite `%W`: Monday-based week of the year, 00-53.
    Week(u32),
}

/// Appointments whose stored (UTC) start falls in `period` of `year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub year: i32,
    pub period: Period,
}

impl AppointmentFilter {
    fn clause(&self) -> (&'static str, Vec<Value>) {
        let clause = match self.period {
            Period::Month(_) => {
                "CAST(strftime('%Y', `start`) AS INTEGER) = ?1
                 AND CAST(strftime('%m', `start`) AS INTEGER) = ?2"
            }
            Period::Week(_) => {
                "CAST(strftime('%Y', `start`) AS INTEGER) = ?1
                 AND CAST(strftime('%W', `start`) AS INTEGER) = ?2"
            }
        };
        let value = match self.period {
            Period::Month(month) => month,
            Period::Week(week) => week,
        };
        (clause, vec![Value::from(self.year), Value::from(value)])
    }

    /// Same test as the SQL clause, applied to an instant already in memory.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if instant.year() != self.year {
            return false;
        }
        match self.period {
            Period::Month(month) => instant.month() == month,
            Period::Week(week) => monday_week(instant) == week,
        }
    }

    pub fn describe(&self) -> String {
        match self.period {
            Period::Month(month) => format!("{}-{month:02}", self.year),
            Period::Week(week) => format!("{} week {week}", self.year),
        }
    }
}

/// `strftime('%W')`: days before the year's first Monday are week 0.
fn monday_week(instant: DateTime<Utc>) -> u32 {
    (instant.ordinal0() + 7 - instant.weekday().num_days_from_monday()) / 7
}

fn instant_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    from_storage(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

impl TableMapping for Appointment {
    const SELECT: SqlTemplate = SqlTemplate {
        sql: "SELECT id, title, description, location, type, `start`, `end`,
                     customer_id, user_id, contact_id
              FROM appointments",
        operation: "load appointments",
    };
    const INSERT: SqlTemplate = SqlTemplate {
        sql: "INSERT INTO appointments
                (title, description, location, type, `start`, `end`,
                 customer_id, user_id, contact_id, created_by, last_updated_by)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        operation: "insert appointment",
    };
    const UPDATE: SqlTemplate = SqlTemplate {
        sql: "UPDATE appointments
              SET title = ?1, description = ?2, location = ?3, type = ?4,
                  `start` = ?5, `end` = ?6, customer_id = ?7, user_id = ?8, contact_id = ?9,
                  last_updated_by = ?10, last_update = CURRENT_TIMESTAMP
              WHERE id = ?11",
        operation: "update appointment",
    };
    const DELETE: SqlTemplate = SqlTemplate {
        sql: "DELETE FROM appointments WHERE id = ?1",
        operation: "delete appointment",
    };

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut appointment = Appointment::new(
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            instant_column(row, 5)?,
            instant_column(row, 6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
        );
        appointment.id = row.get(0)?;
        Ok(appointment)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.title.trim().to_string()),
            Value::from(self.description.trim().to_string()),
            Value::from(self.location.trim().to_string()),
            Value::from(self.kind.trim().to_string()),
            Value::from(to_storage(self.start)),
            Value::from(to_storage(self.end)),
            Value::from(self.customer_id),
            Value::from(self.user_id),
            Value::from(self.contact_id),
        ]
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Appointment persistence plus the overlap check and the filter/alert
/// queries that only make sense for appointments.
pub struct AppointmentRepository {
    session: Rc<Session>,
    scope: OverlapScope,
}

impl AppointmentRepository {
    pub fn new(session: Rc<Session>, scope: OverlapScope) -> Self {
        Self { session, scope }
    }

    /// Years that have at least one appointment, ascending.
    pub fn distinct_years(&self) -> EngineResult<Vec<i32>> {
        self.session.query(
            "load appointment years",
            "SELECT DISTINCT CAST(strftime('%Y', `start`) AS INTEGER) AS year
             FROM appointments ORDER BY year",
            &[],
            |row| row.get(0),
        )
    }

    /// Months (1-12) of `year` that have at least one appointment.
    pub fn distinct_months(&self, year: i32) -> EngineResult<Vec<u32>> {
        self.distinct_within(year, "%m", "load appointment months")
    }

    /// `%W` weeks of `year` that have at least one appointment.
    pub fn distinct_weeks(&self, year: i32) -> EngineResult<Vec<u32>> {
        self.distinct_within(year, "%W", "load appointment weeks")
    }

    fn distinct_within(
        &self,
        year: i32,
        part: &'static str,
        operation: &'static str,
    ) -> EngineResult<Vec<u32>> {
        let sql = format!(
            "SELECT DISTINCT CAST(strftime('{part}', `start`) AS INTEGER) AS bucket
             FROM appointments
             WHERE CAST(strftime('%Y', `start`) AS INTEGER) = ?1
             ORDER BY bucket"
        );
        self.session
            .query(operation, &sql, &[Value::from(year)], |row| row.get(0))
    }

    /// Appointments starting between `now` and `now + window`, soonest first.
    pub fn upcoming(&self, now: DateTime<Utc>, window: Duration) -> EngineResult<Vec<Appointment>> {
        load_rows(
            &self.session,
            Some("`start` BETWEEN ?1 AND ?2"),
            "`start`, id",
            &[
                Value::from(to_storage(now)),
                Value::from(to_storage(now + window)),
            ],
        )
    }
}

impl Repository<Appointment> for AppointmentRepository {
    type Filter = AppointmentFilter;

    fn find_all(&self, filter: Option<&AppointmentFilter>) -> EngineResult<Vec<Appointment>> {
        match filter {
            Some(filter) => {
                let (clause, args) = filter.clause();
                load_rows(&self.session, Some(clause), "`start`, id", &args)
            }
            None => load_rows(&self.session, None, "`start`, id", &[]),
        }
    }

    fn insert(&self, entity: &mut Appointment) -> EngineResult<i64> {
        insert_row(&self.session, entity)
    }

    fn matches(&self, filter: &AppointmentFilter, entity: &Appointment) -> bool {
        filter.contains(entity.start)
    }

    fn update(&self, entity: &Appointment) -> EngineResult<usize> {
        update_row(&self.session, entity)
    }

    fn delete(&self, entity: &mut Appointment) -> EngineResult<DeleteReport> {
        let id = entity.id();
        delete_row(&self.session, entity)?;
        entity.assign_id(0);
        Ok(DeleteReport {
            kind: Appointment::KIND,
            id,
            cascaded: Vec::new(),
        })
    }

    /// Two windows overlap when `new.start <= existing.end` and
    /// `new.end >= existing.start`; touching endpoints count. The record's
    /// own row never conflicts with itself.
    fn conflicts(&self, entity: &Appointment) -> EngineResult<Vec<i64>> {
        let mut sql = String::from(
            "SELECT id FROM appointments
             WHERE ?1 <= `end` AND ?2 >= `start` AND id <> ?3",
        );
        let mut args = vec![
            Value::from(to_storage(entity.start)),
            Value::from(to_storage(entity.end)),
            Value::from(entity.id()),
        ];
        if self.scope == OverlapScope::SameCustomer {
            sql.push_str(" AND customer_id = ?4");
            args.push(Value::from(entity.customer_id));
        }
        sql.push_str(" ORDER BY id");

        let conflicting = self
            .session
            .query("check appointment overlap", &sql, &args, |row| row.get(0))?;
        if !conflicting.is_empty() {
            log::info!(
                "appointment #{} overlaps {:?} ({:?} scope)",
                entity.id(),
                conflicting,
                self.scope
            );
        }
        Ok(conflicting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::customers::CustomerRepository;
    use crate::models::Customer;
    use chrono::TimeZone;

    struct Fixture {
        session: Rc<Session>,
        customer_id: i64,
    }

    fn fixture() -> Fixture {
        let session = Rc::new(Session::open_in_memory("test").expect("open session"));
        let customers = CustomerRepository::new(Rc::clone(&session));
        let mut customer = Customer::new("Acme", "1 Main St", "00000", "555-0100", 1);
        customers.insert(&mut customer).expect("insert customer");
        Fixture {
            customer_id: customer.id(),
            session,
        }
    }

    fn eastern(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        chrono_tz::US::Eastern
            .with_ymd_and_hms(2024, 3, d, h, m, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc)
    }

    fn meeting(fx: &Fixture, start: DateTime<Utc>, end: DateTime<Utc>) -> Appointment {
        Appointment::new(
            "Review",
            "Quarterly",
            "Room 1",
            "Planning",
            start,
            end,
            fx.customer_id,
            fx.session.user().id,
            1,
        )
    }

    #[test]
    fn overlapping_window_cannot_be_persisted() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let mut a = meeting(&fx, eastern(1, 9, 0), eastern(1, 10, 0));
        repo.insert(&mut a).expect("insert a");

        let b = meeting(&fx, eastern(1, 9, 30), eastern(1, 10, 30));
        assert!(!repo.can_persist(&b).expect("check"));
        assert_eq!(repo.conflicts(&b).expect("check"), vec![a.id()]);
    }

    #[test]
    fn record_never_conflicts_with_itself() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let mut a = meeting(&fx, eastern(1, 9, 0), eastern(1, 10, 0));
        repo.insert(&mut a).expect("insert a");

        let mut moved = a.clone();
        moved.end = eastern(1, 10, 30);
        assert!(repo.can_persist(&moved).expect("check"));
    }

    #[test]
    fn touching_endpoints_count_as_overlap() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let mut a = meeting(&fx, eastern(1, 9, 0), eastern(1, 10, 0));
        repo.insert(&mut a).expect("insert a");
        let b = meeting(&fx, eastern(1, 10, 0), eastern(1, 11, 0));
        assert!(!repo.can_persist(&b).expect("check"));
        let c = meeting(&fx, eastern(1, 10, 1), eastern(1, 11, 0));
        assert!(repo.can_persist(&c).expect("check"));
    }

    #[test]
    fn scope_decides_whether_other_customers_conflict() {
        let fx = fixture();
        let customers = CustomerRepository::new(Rc::clone(&fx.session));
        let mut other = Customer::new("Globex", "2 Side St", "11111", "555-0200", 2);
        customers.insert(&mut other).expect("insert other");

        let global = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let scoped = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::SameCustomer);
        let mut a = meeting(&fx, eastern(1, 9, 0), eastern(1, 10, 0));
        global.insert(&mut a).expect("insert a");

        let mut b = meeting(&fx, eastern(1, 9, 30), eastern(1, 10, 30));
        b.customer_id = other.id();
        assert!(!global.can_persist(&b).expect("global check"));
        assert!(scoped.can_persist(&b).expect("scoped check"));
    }

    #[test]
    fn round_trip_preserves_instants() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let mut a = meeting(&fx, eastern(1, 9, 15), eastern(1, 10, 45));
        repo.insert(&mut a).expect("insert");
        let loaded = repo.find_all(None).expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].start, eastern(1, 9, 15));
        assert_eq!(loaded[0].end, eastern(1, 10, 45));
        assert_eq!(loaded[0], a);
    }

    #[test]
    fn filter_by_month_and_week() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let mut march = meeting(&fx, eastern(4, 9, 0), eastern(4, 10, 0));
        repo.insert(&mut march).expect("insert march");
        let april_start = Utc.with_ymd_and_hms(2024, 4, 2, 14, 0, 0).unwrap();
        let mut april = meeting(&fx, april_start, april_start + Duration::hours(1));
        repo.insert(&mut april).expect("insert april");

        let by_month = repo
            .find_all(Some(&AppointmentFilter {
                year: 2024,
                period: Period::Month(4),
            }))
            .expect("month filter");
        assert_eq!(by_month, vec![april.clone()]);

        // 2024-03-04 is the Monday that opens %W week 10.
        let by_week = repo
            .find_all(Some(&AppointmentFilter {
                year: 2024,
                period: Period::Week(10),
            }))
            .expect("week filter");
        assert_eq!(by_week, vec![march]);

        assert_eq!(repo.distinct_years().expect("years"), vec![2024]);
        assert_eq!(repo.distinct_months(2024).expect("months"), vec![3, 4]);
        assert_eq!(repo.distinct_weeks(2024).expect("weeks"), vec![10, 14]);
    }

    #[test]
    fn in_memory_week_agrees_with_sqlite() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        // 2023 starts on a Sunday, 2024 on a Monday.
        for (y, m, d) in [(2023, 1, 1), (2023, 1, 2), (2024, 1, 1), (2024, 12, 31)] {
            let start = Utc.with_ymd_and_hms(y, m, d, 15, 0, 0).unwrap();
            let week: u32 = fx
                .session
                .conn()
                .query_row(
                    "SELECT CAST(strftime('%W', ?1) AS INTEGER)",
                    [to_storage(start)],
                    |row| row.get(0),
                )
                .expect("strftime");
            let filter = AppointmentFilter {
                year: y,
                period: Period::Week(week),
            };
            let appointment = meeting(&fx, start, start + Duration::hours(1));
            assert!(repo.matches(&filter, &appointment), "{y}-{m}-{d}");
            let next = AppointmentFilter {
                year: y,
                period: Period::Week(week + 1),
            };
            assert!(!repo.matches(&next, &appointment));
        }
        assert_eq!(monday_week(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()), 0);
        assert_eq!(monday_week(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()), 1);
    }

    #[test]
    fn upcoming_window_is_inclusive() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();
        let mut soon = meeting(&fx, now + Duration::minutes(15), now + Duration::minutes(45));
        repo.insert(&mut soon).expect("insert soon");
        let mut later = meeting(&fx, now + Duration::minutes(16), now + Duration::minutes(50));
        repo.insert(&mut later).expect("insert later");

        let upcoming = repo.upcoming(now, Duration::minutes(15)).expect("upcoming");
        assert_eq!(upcoming, vec![soon]);
    }

    #[test]
    fn deleting_twice_reports_missing_row() {
        let fx = fixture();
        let repo = AppointmentRepository::new(Rc::clone(&fx.session), OverlapScope::Global);
        let mut a = meeting(&fx, eastern(1, 9, 0), eastern(1, 10, 0));
        repo.insert(&mut a).expect("insert");
        let mut copy = a.clone();
        repo.delete(&mut a).expect("delete");
        assert_eq!(a.id(), 0);
        assert!(repo.delete(&mut copy).is_err());
    }
}
