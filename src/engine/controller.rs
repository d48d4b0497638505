//! The in-memory list for one entity type, and the only path by which that
//! list changes. Edits go through a single [`EditSession`]; persistence goes
//! through the repository; the list is touched only after the repository
//! reports success.

use crate::db::{DeleteReport, Repository};
use crate::error::{EngineError, EngineResult};
use crate::models::Lookups;
use crate::time::DisplayZone;
use crate::validation::ValidationContext;

use super::events::{Event, EventQueue};
use super::forms::FormBinding;
use super::session::{EditSession, Mode, Outcome};

pub struct RecordController<E, R>
where
    E: FormBinding,
    R: Repository<E>,
{
    repo: R,
    records: Vec<E>,
    selected: usize,
    filter: Option<R::Filter>,
    session: Option<EditSession<E>>,
    events: EventQueue,
}

impl<E, R> RecordController<E, R>
where
    E: FormBinding,
    R: Repository<E>,
{
    pub fn new(repo: R, events: EventQueue) -> Self {
        Self {
            repo,
            records: Vec::new(),
            selected: 0,
            filter: None,
            session: None,
            events,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Replace the list with what the repository returns for `filter`.
    pub fn load(&mut self, filter: Option<R::Filter>) -> EngineResult<()> {
        let records = self.repo.find_all(filter.as_ref())?;
        self.records = records;
        self.filter = filter;
        self.clamp_selection();
        log::debug!("loaded {} {} record(s)", self.records.len(), E::KIND);
        Ok(())
    }

    /// Reload with the filter currently in effect.
    pub fn reload(&mut self) -> EngineResult<()> {
        let records = self.repo.find_all(self.filter.as_ref())?;
        self.records = records;
        self.clamp_selection();
        Ok(())
    }

    pub fn filter(&self) -> Option<&R::Filter> {
        self.filter.as_ref()
    }

    pub fn records(&self) -> &[E] {
        &self.records
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_record(&self) -> Option<&E> {
        self.records.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.records.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&EditSession<E>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession<E>> {
        self.session.as_mut()
    }

    /// Open a Create session on a blank template. Ignored while editing.
    pub fn begin_create(&mut self, lookups: &Lookups, zone: DisplayZone) -> bool {
        self.begin(E::blank(), Mode::Create, lookups, zone)
    }

    /// Open a Read session on the selection. Ignored while editing or when
    /// nothing is selected.
    pub fn begin_view(&mut self, lookups: &Lookups, zone: DisplayZone) -> bool {
        match self.selected_record().cloned() {
            Some(record) => self.begin(record, Mode::Read, lookups, zone),
            None => false,
        }
    }

    /// Open an Update session on a copy of the selection.
    pub fn begin_update(&mut self, lookups: &Lookups, zone: DisplayZone) -> bool {
        match self.selected_record().cloned() {
            Some(record) => self.begin(record, Mode::Update, lookups, zone),
            None => false,
        }
    }

    fn begin(&mut self, draft: E, mode: Mode, lookups: &Lookups, zone: DisplayZone) -> bool {
        if self.session.is_some() {
            log::debug!("{} session already open; {mode:?} ignored", E::KIND);
            return false;
        }
        self.session = Some(EditSession::open(draft, mode, lookups, zone));
        true
    }

    /// Abandon the open session, if any. Nothing is written.
    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }

    /// Submit the open session and persist the result.
    ///
    /// Returns the saved id, or `None` when there was nothing to save (no
    /// session, or a Read session closing). Validation failures and conflicts
    /// leave the session open with the message attached; persistence failures
    /// close it. In every failure case the list is unchanged.
    pub fn commit(&mut self, ctx: &ValidationContext<'_>) -> EngineResult<Option<i64>> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };

        let candidate = match session.submit(ctx) {
            Ok(Outcome::Committed(candidate)) => candidate,
            Ok(Outcome::Closed) => return Ok(None),
            Err(err) => {
                self.session = Some(session);
                return Err(err.into());
            }
        };

        match self.persist(candidate) {
            Ok(id) => Ok(Some(id)),
            Err(err) => {
                if err.keeps_session_open() {
                    session.set_error(err.to_string());
                    self.session = Some(session);
                }
                Err(err)
            }
        }
    }

    fn persist(&mut self, mut candidate: E) -> EngineResult<i64> {
        if !self.repo.can_persist(&candidate)? {
            let conflicting = self.repo.conflicts(&candidate)?;
            log::info!(
                "{} #{} rejected: overlaps {conflicting:?}",
                E::KIND,
                candidate.id()
            );
            return Err(EngineError::ConflictDetected {
                kind: E::KIND,
                conflicting,
            });
        }

        let id = if candidate.is_new() {
            let id = self.repo.insert(&mut candidate)?;
            // Same trimming as the stored row; merge never touches the id.
            let edited = candidate.clone();
            candidate.merge(&edited);
            if self.in_filter(&candidate) {
                self.records.push(candidate);
                self.selected = self.records.len() - 1;
            }
            id
        } else {
            let id = candidate.id();
            let updated = self.repo.update(&candidate)?;
            if updated != 1 {
                return Err(EngineError::no_rows("update record"));
            }
            if let Some(idx) = self.records.iter().position(|record| record.id() == id) {
                self.records[idx].merge(&candidate);
                if !self.in_filter(&self.records[idx]) {
                    self.records.remove(idx);
                    self.clamp_selection();
                }
            }
            id
        };

        self.events.emit(Event::RecordSaved { kind: E::KIND, id });
        Ok(id)
    }

    /// Delete the selection through the repository (dependents first) and
    /// drop it from the list. Ignored while a session is open.
    pub fn delete_selected(&mut self) -> EngineResult<Option<DeleteReport>> {
        if self.session.is_some() {
            log::debug!("{} session open; delete ignored", E::KIND);
            return Ok(None);
        }
        let Some(mut target) = self.selected_record().cloned() else {
            return Ok(None);
        };

        let report = self.repo.delete(&mut target)?;
        if target.is_new() {
            self.records.remove(self.selected);
            self.clamp_selection();
        }
        self.events.emit(Event::RecordDeleted {
            kind: report.kind,
            id: report.id,
            cascaded: report.cascaded.clone(),
        });
        Ok(Some(report))
    }

    fn in_filter(&self, record: &E) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| self.repo.matches(filter, record))
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.records.len() {
            self.selected = self.records.len().saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::{Duration, TimeZone, Utc};

    use crate::config::OverlapScope;
    use crate::db::{
        load_lookups, AppointmentFilter, AppointmentRepository, CustomerRepository, Period, Session,
    };
    use crate::error::{PersistenceCause, ValidationReason};
    use crate::engine::Input;
    use crate::models::{Appointment, Customer, Record};
    use crate::time::BusinessHours;

    struct Fixture {
        session: Rc<Session>,
        lookups: Lookups,
        hours: BusinessHours,
        events: EventQueue,
    }

    impl Fixture {
        fn new() -> Self {
            let session = Rc::new(Session::open_in_memory("test").expect("open"));
            let lookups = load_lookups(&session).expect("lookups");
            Self {
                session,
                lookups,
                hours: BusinessHours::default(),
                events: EventQueue::new(),
            }
        }

        fn customers(&self) -> RecordController<Customer, CustomerRepository> {
            let mut controller = RecordController::new(
                CustomerRepository::new(Rc::clone(&self.session)),
                self.events.clone(),
            );
            controller.load(None).expect("load customers");
            controller
        }

        fn appointments(&self) -> RecordController<Appointment, AppointmentRepository> {
            let mut controller = RecordController::new(
                AppointmentRepository::new(Rc::clone(&self.session), OverlapScope::Global),
                self.events.clone(),
            );
            controller.load(None).expect("load appointments");
            controller
        }

        fn ctx(&self) -> ValidationContext<'_> {
            ValidationContext {
                hours: &self.hours,
                lookups: &self.lookups,
            }
        }
    }

    fn fill_customer(controller: &mut RecordController<Customer, CustomerRepository>, f: &Fixture) {
        let session = controller.session_mut().expect("session open");
        for value in ["Acme", "1 Main St", "00000", "555-0100"] {
            for ch in value.chars() {
                session.push_char(ch);
            }
            session.focus_next();
        }
        session.cycle(true, &f.lookups);
        session.focus_next();
        session.cycle(true, &f.lookups);
    }

    #[test]
    fn create_appends_one_record_with_generated_id() {
        let f = Fixture::new();
        let mut customers = f.customers();
        assert!(customers.begin_create(&f.lookups, DisplayZone::Local));
        fill_customer(&mut customers, &f);

        let id = customers
            .commit(&f.ctx())
            .expect("commit")
            .expect("saved id");
        assert!(id > 0);
        assert_eq!(customers.records().len(), 1);
        assert_eq!(customers.records()[0].id(), id);
        assert!(!customers.is_editing());
        assert_eq!(
            f.events.drain(),
            vec![Event::RecordSaved {
                kind: "Customer",
                id
            }]
        );
    }

    #[test]
    fn second_session_is_a_no_op() {
        let f = Fixture::new();
        let mut customers = f.customers();
        assert!(customers.begin_create(&f.lookups, DisplayZone::Local));
        customers
            .session_mut()
            .expect("session")
            .push_char('Z');

        assert!(!customers.begin_create(&f.lookups, DisplayZone::Local));
        assert!(!customers.begin_view(&f.lookups, DisplayZone::Local));
        assert_eq!(
            customers.session().expect("first session").form().text("name"),
            "Z"
        );
        assert_eq!(customers.delete_selected().expect("ignored"), None);
        assert!(customers.records().is_empty());
    }

    #[test]
    fn view_and_update_require_a_selection() {
        let f = Fixture::new();
        let mut customers = f.customers();
        assert!(!customers.begin_view(&f.lookups, DisplayZone::Local));
        assert!(!customers.begin_update(&f.lookups, DisplayZone::Local));
        assert!(!customers.is_editing());
    }

    #[test]
    fn validation_failure_keeps_session_open() {
        let f = Fixture::new();
        let mut customers = f.customers();
        customers.begin_create(&f.lookups, DisplayZone::Local);
        let err = customers.commit(&f.ctx()).expect_err("blank form");
        assert!(matches!(
            err,
            EngineError::ValidationFailed(ref v) if v.reason == ValidationReason::Empty
        ));
        assert!(customers.is_editing());
        assert_eq!(
            customers.session().and_then(|s| s.error()),
            Some("'Name' should not be empty.")
        );
        assert!(customers.records().is_empty());
    }

    #[test]
    fn cancel_leaves_list_untouched() {
        let f = Fixture::new();
        let mut customers = f.customers();
        customers.begin_create(&f.lookups, DisplayZone::Local);
        fill_customer(&mut customers, &f);
        assert!(customers.cancel());
        assert!(!customers.is_editing());
        assert!(customers.records().is_empty());
        assert!(customers.repository().find_all(None).expect("load").is_empty());
    }

    #[test]
    fn update_merges_in_place() {
        let f = Fixture::new();
        let mut customers = f.customers();
        customers.begin_create(&f.lookups, DisplayZone::Local);
        fill_customer(&mut customers, &f);
        let id = customers.commit(&f.ctx()).expect("create").expect("id");

        assert!(customers.begin_update(&f.lookups, DisplayZone::Local));
        {
            let session = customers.session_mut().expect("session");
            for ch in " Corp".chars() {
                session.push_char(ch);
            }
        }
        assert_eq!(customers.commit(&f.ctx()).expect("update"), Some(id));
        assert_eq!(customers.records().len(), 1);
        assert_eq!(customers.records()[0].name, "Acme Corp");
        assert_eq!(customers.records()[0].id(), id);
    }

    #[test]
    fn update_of_vanished_row_closes_session_without_mutation() {
        let f = Fixture::new();
        let mut customers = f.customers();
        customers.begin_create(&f.lookups, DisplayZone::Local);
        fill_customer(&mut customers, &f);
        let id = customers.commit(&f.ctx()).expect("create").expect("id");
        f.session
            .conn()
            .execute("DELETE FROM customers WHERE id = ?1", [id])
            .expect("remove behind the controller's back");

        customers.begin_update(&f.lookups, DisplayZone::Local);
        customers.session_mut().expect("session").push_char('!');
        let err = customers.commit(&f.ctx()).expect_err("row gone");
        assert!(matches!(
            err,
            EngineError::PersistenceFailed {
                cause: PersistenceCause::NoRowsAffected,
                ..
            }
        ));
        assert!(!customers.is_editing());
        assert_eq!(customers.records()[0].name, "Acme");
    }

    fn appointment_at(f: &Fixture, customer_id: i64, hour: u32, minute: u32) -> Appointment {
        let start = chrono_tz::US::Eastern
            .with_ymd_and_hms(2024, 3, 1, hour, minute, 0)
            .single()
            .expect("valid")
            .with_timezone(&Utc);
        Appointment::new(
            "Review",
            "Quarterly",
            "Room 1",
            "Planning",
            start,
            start + Duration::hours(1),
            customer_id,
            f.session.user().id,
            1,
        )
    }

    #[test]
    fn overlapping_appointment_is_rejected_before_writing() {
        let mut f = Fixture::new();
        let customers = CustomerRepository::new(Rc::clone(&f.session));
        let mut acme = Customer::new("Acme", "1 Main St", "00000", "555-0100", 1);
        customers.insert(&mut acme).expect("customer");
        f.lookups.customers.insert(acme.id(), acme.name.clone());

        let mut appointments = f.appointments();
        let first = appointment_at(&f, acme.id(), 9, 0);
        appointments.persist(first).expect("first");
        f.events.drain();

        let err = appointments
            .persist(appointment_at(&f, acme.id(), 9, 30))
            .expect_err("overlaps");
        match err {
            EngineError::ConflictDetected { kind, conflicting } => {
                assert_eq!(kind, "Appointment");
                assert_eq!(conflicting, vec![appointments.records()[0].id()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(appointments.records().len(), 1);
        assert!(f.events.is_empty());
    }

    #[test]
    fn inserted_record_matches_the_stored_row() {
        let f = Fixture::new();
        let mut customers = f.customers();
        let padded = Customer::new("  Acme  ", " 1 Main St ", "00000 ", " 555-0100", 1);
        customers.persist(padded).expect("persist");

        let stored = customers.repository().find_all(None).expect("reload");
        assert_eq!(customers.records(), stored.as_slice());
        assert_eq!(customers.records()[0].name, "Acme");
    }

    #[test]
    fn saves_respect_the_active_filter() {
        let mut f = Fixture::new();
        let customers = CustomerRepository::new(Rc::clone(&f.session));
        let mut acme = Customer::new("Acme", "1 Main St", "00000", "555-0100", 1);
        customers.insert(&mut acme).expect("customer");
        f.lookups.customers.insert(acme.id(), acme.name.clone());

        let mut appointments = f.appointments();
        appointments
            .load(Some(AppointmentFilter {
                year: 2024,
                period: Period::Month(3),
            }))
            .expect("filtered load");

        let march = appointment_at(&f, acme.id(), 9, 0);
        let march_id = appointments.persist(march).expect("march");
        assert_eq!(appointments.records().len(), 1);

        let mut april = appointment_at(&f, acme.id(), 13, 0);
        april.start += Duration::days(31);
        april.end += Duration::days(31);
        let april_id = appointments.persist(april).expect("april");
        assert_eq!(appointments.records().len(), 1);
        assert_eq!(appointments.records()[0].id(), march_id);

        let mut moved = appointments.records()[0].clone();
        moved.start += Duration::days(31);
        moved.end += Duration::days(31);
        appointments.persist(moved).expect("move to april");
        assert!(appointments.records().is_empty());

        appointments.load(None).expect("unfiltered");
        let ids: Vec<i64> = appointments.records().iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![march_id, april_id]);
    }

    #[test]
    fn conflict_keeps_session_open_with_message() {
        let mut f = Fixture::new();
        let customers = CustomerRepository::new(Rc::clone(&f.session));
        let mut acme = Customer::new("Acme", "1 Main St", "00000", "555-0100", 1);
        customers.insert(&mut acme).expect("customer");
        f.lookups.customers.insert(acme.id(), acme.name.clone());

        let mut appointments = f.appointments();
        appointments
            .persist(appointment_at(&f, acme.id(), 9, 0))
            .expect("first");

        let zone = DisplayZone::Named(chrono_tz::US::Eastern);
        assert!(appointments.begin_create(&f.lookups, zone));
        let clash = appointment_at(&f, acme.id(), 9, 30);
        {
            let session = appointments.session_mut().expect("session");
            let values = [
                clash.title.clone(),
                clash.description.clone(),
                clash.location.clone(),
                clash.kind.clone(),
            ];
            for value in values {
                for ch in value.chars() {
                    session.push_char(ch);
                }
                session.focus_next();
            }
            for instant in [clash.start, clash.end] {
                while session.form().active_input().map_or(0, Input::value_len) > 0 {
                    session.backspace();
                }
                for ch in zone.format(instant).chars() {
                    session.push_char(ch);
                }
                session.focus_next();
            }
            for _ in 0..3 {
                session.cycle(true, &f.lookups);
                session.focus_next();
            }
        }

        let err = appointments.commit(&f.ctx()).expect_err("overlap");
        assert!(matches!(err, EngineError::ConflictDetected { .. }));
        let session = appointments.session().expect("still open");
        assert!(session
            .error()
            .is_some_and(|message| message.starts_with("Appointment overlaps")));
        assert_eq!(appointments.records().len(), 1);
    }

    #[test]
    fn delete_removes_record_and_emits_event() {
        let f = Fixture::new();
        let mut customers = f.customers();
        customers.begin_create(&f.lookups, DisplayZone::Local);
        fill_customer(&mut customers, &f);
        let id = customers.commit(&f.ctx()).expect("create").expect("id");
        f.events.drain();

        let report = customers
            .delete_selected()
            .expect("delete")
            .expect("report");
        assert_eq!(report.id, id);
        assert!(customers.records().is_empty());
        assert_eq!(
            f.events.drain(),
            vec![Event::RecordDeleted {
                kind: "Customer",
                id,
                cascaded: Vec::new()
            }]
        );
        assert_eq!(customers.delete_selected().expect("nothing selected"), None);
    }

    /// Records which repository calls the controller makes.
    #[derive(Default)]
    struct RecordingRepository {
        calls: RefCell<Vec<&'static str>>,
    }

    impl Repository<Customer> for RecordingRepository {
        type Filter = ();

        fn find_all(&self, _filter: Option<&()>) -> EngineResult<Vec<Customer>> {
            self.calls.borrow_mut().push("find_all");
            Ok(Vec::new())
        }

        fn insert(&self, entity: &mut Customer) -> EngineResult<i64> {
            self.calls.borrow_mut().push("insert");
            entity.assign_id(41);
            Ok(41)
        }

        fn update(&self, _entity: &Customer) -> EngineResult<usize> {
            self.calls.borrow_mut().push("update");
            Ok(1)
        }

        fn delete(&self, entity: &mut Customer) -> EngineResult<DeleteReport> {
            self.calls.borrow_mut().push("delete");
            let id = entity.id();
            entity.assign_id(0);
            Ok(DeleteReport {
                kind: Customer::KIND,
                id,
                cascaded: Vec::new(),
            })
        }
    }

    #[test]
    fn id_zero_takes_the_insert_path_and_never_update() {
        let mut controller = RecordController::new(RecordingRepository::default(), EventQueue::new());
        let customer = Customer::new("Acme", "1 Main St", "00000", "555-0100", 1);
        assert_eq!(controller.persist(customer).expect("persist"), 41);
        assert_eq!(*controller.repository().calls.borrow(), vec!["insert"]);

        let mut edited = controller.records()[0].clone();
        edited.name = "Acme Corp".into();
        controller.persist(edited).expect("persist");
        assert_eq!(*controller.repository().calls.borrow(), vec!["insert", "update"]);
        assert_eq!(controller.records()[0].name, "Acme Corp");
    }
}
