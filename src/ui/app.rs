use std::mem;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::OverlapScope;
use crate::db::{
    load_lookups, AppointmentFilter, AppointmentRepository, CustomerRepository, Repository, Session,
};
use crate::engine::{EditSession, Event, EventQueue, FormBinding, InputKind, RecordController};
use crate::error::EngineResult;
use crate::models::{Appointment, Customer, Lookups, Record};
use crate::time::{BusinessHours, DisplayZone};
use crate::validation::ValidationContext;

use super::forms::{build_line, ConfirmDelete};
use super::helpers::{
    appointment_row, centered_rect, customer_row, surface_error, upcoming_message,
};
use super::screens::{FilterState, ReportKind, ReportScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Top-level screens, cycled with Tab.
enum Screen {
    Customers,
    Appointments,
    Reports(ReportScreen),
}

/// Fine-grained modes scoped to the current screen. While `Editing`, the
/// edit session itself lives inside the current screen's controller.
enum Mode {
    Normal,
    Editing,
    ConfirmDelete(ConfirmDelete),
    Filtering(FilterState),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// What a key press inside an edit session led to.
enum SessionStep {
    Open,
    Saved(i64),
    Closed,
    Cancelled,
}

/// Forward one key to the open session of `controller`.
fn drive_session<E, R>(
    controller: &mut RecordController<E, R>,
    code: KeyCode,
    ctx: &ValidationContext<'_>,
) -> EngineResult<SessionStep>
where
    E: FormBinding,
    R: Repository<E>,
{
    let Some(session) = controller.session_mut() else {
        return Ok(SessionStep::Closed);
    };
    match code {
        KeyCode::Esc => {
            controller.cancel();
            return Ok(SessionStep::Cancelled);
        }
        KeyCode::Enter => {
            return Ok(match controller.commit(ctx)? {
                Some(id) => SessionStep::Saved(id),
                None => SessionStep::Closed,
            });
        }
        KeyCode::Tab | KeyCode::Down => session.focus_next(),
        KeyCode::BackTab | KeyCode::Up => session.focus_previous(),
        KeyCode::Left => session.cycle(false, ctx.lookups),
        KeyCode::Right => session.cycle(true, ctx.lookups),
        KeyCode::Backspace => session.backspace(),
        KeyCode::Char(ch) => session.push_char(ch),
        _ => {}
    }
    Ok(SessionStep::Open)
}

/// Central application state shared across the TUI.
pub struct App {
    session: Rc<Session>,
    lookups: Lookups,
    hours: BusinessHours,
    zone: DisplayZone,
    events: EventQueue,
    customers: RecordController<Customer, CustomerRepository>,
    appointments: RecordController<Appointment, AppointmentRepository>,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(
        session: Rc<Session>,
        hours: BusinessHours,
        zone: DisplayZone,
        scope: OverlapScope,
    ) -> Result<Self> {
        let mut lookups = load_lookups(&session).context("failed to load reference data")?;
        let events = EventQueue::new();

        let mut customers =
            RecordController::new(CustomerRepository::new(Rc::clone(&session)), events.clone());
        customers.load(None).context("failed to load customers")?;
        lookups.set_customers(customers.records());

        let mut appointments = RecordController::new(
            AppointmentRepository::new(Rc::clone(&session), scope),
            events.clone(),
        );
        appointments
            .load(None)
            .context("failed to load appointments")?;

        Ok(Self {
            session,
            lookups,
            hours,
            zone,
            events,
            customers,
            appointments,
            screen: Screen::Customers,
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Show appointments starting within `window` of `now` in the footer.
    pub fn announce_upcoming(&mut self, now: DateTime<Utc>, window: Duration) -> Result<()> {
        let upcoming = self
            .appointments
            .repository()
            .upcoming(now, window)
            .context("failed to check upcoming appointments")?;
        log::info!(
            "{} appointment(s) starting within {} minutes",
            upcoming.len(),
            window.num_minutes()
        );
        self.set_status(upcoming_message(&upcoming, now, &self.zone), StatusKind::Info);
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        let mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Editing => self.handle_editing(code)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Filtering(state) => self.handle_filter(code, state)?,
        };

        self.mode = mode;
        self.apply_events();
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => {
                self.clear_status();
                self.next_screen();
                return Ok(Mode::Normal);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.clear_status();
                self.open_reports(ReportKind::Totals);
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        match self.screen {
            Screen::Customers | Screen::Appointments => self.handle_list_key(code),
            Screen::Reports(ref mut report) => {
                match code {
                    KeyCode::Up => report.scroll_by(-1),
                    KeyCode::Down => report.scroll_by(1),
                    KeyCode::PageUp => report.scroll_by(-10),
                    KeyCode::PageDown => report.scroll_by(10),
                    KeyCode::Left => {
                        let kind = report.kind.previous();
                        self.open_reports(kind);
                    }
                    KeyCode::Right => {
                        let kind = report.kind.next();
                        self.open_reports(kind);
                    }
                    KeyCode::Esc => self.screen = Screen::Customers,
                    _ => {}
                }
                Ok(Mode::Normal)
            }
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) -> Result<Mode> {
        let on_customers = matches!(self.screen, Screen::Customers);
        match code {
            KeyCode::Up => self.select(on_customers, false),
            KeyCode::Down => self.select(on_customers, true),
            KeyCode::Char('+') => {
                self.clear_status();
                let opened = if on_customers {
                    self.customers.begin_create(&self.lookups, self.zone)
                } else {
                    self.appointments.begin_create(&self.lookups, self.zone)
                };
                if opened {
                    return Ok(Mode::Editing);
                }
            }
            KeyCode::Enter | KeyCode::Char('v') | KeyCode::Char('V') => {
                let opened = if on_customers {
                    self.customers.begin_view(&self.lookups, self.zone)
                } else {
                    self.appointments.begin_view(&self.lookups, self.zone)
                };
                if opened {
                    self.clear_status();
                    return Ok(Mode::Editing);
                }
                self.set_status("Nothing selected to view.", StatusKind::Error);
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                let opened = if on_customers {
                    self.customers.begin_update(&self.lookups, self.zone)
                } else {
                    self.appointments.begin_update(&self.lookups, self.zone)
                };
                if opened {
                    self.clear_status();
                    return Ok(Mode::Editing);
                }
                self.set_status("Nothing selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') => {
                let confirm = if on_customers {
                    self.customers.selected_record().map(|customer| ConfirmDelete {
                        kind: Customer::KIND,
                        id: customer.id(),
                        label: customer.name.clone(),
                        warning: Some("This will also remove the customer's appointments."),
                    })
                } else {
                    self.appointments
                        .selected_record()
                        .map(|appointment| ConfirmDelete {
                            kind: Appointment::KIND,
                            id: appointment.id(),
                            label: format!("{} ({})", appointment.title, appointment.kind),
                            warning: None,
                        })
                };
                match confirm {
                    Some(confirm) => {
                        self.clear_status();
                        return Ok(Mode::ConfirmDelete(confirm));
                    }
                    None => self.set_status("Nothing selected to delete.", StatusKind::Error),
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') if !on_customers => {
                self.clear_status();
                match FilterState::load(self.appointments.repository(), self.appointments.filter())
                {
                    Ok(state) => return Ok(Mode::Filtering(state)),
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_editing(&mut self, code: KeyCode) -> Result<Mode> {
        let ctx = ValidationContext {
            hours: &self.hours,
            lookups: &self.lookups,
        };
        let (kind, step) = match self.screen {
            Screen::Customers => (
                Customer::KIND,
                drive_session(&mut self.customers, code, &ctx),
            ),
            Screen::Appointments => (
                Appointment::KIND,
                drive_session(&mut self.appointments, code, &ctx),
            ),
            Screen::Reports(_) => return Ok(Mode::Normal),
        };

        match step {
            Ok(SessionStep::Open) => Ok(Mode::Editing),
            Ok(SessionStep::Saved(id)) => {
                self.set_status(format!("{kind} #{id} saved."), StatusKind::Info);
                Ok(Mode::Normal)
            }
            Ok(SessionStep::Closed) => Ok(Mode::Normal),
            Ok(SessionStep::Cancelled) => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            Err(err) => {
                self.set_status(err.to_string(), StatusKind::Error);
                if err.keeps_session_open() {
                    Ok(Mode::Editing)
                } else {
                    Ok(Mode::Normal)
                }
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = if confirm.kind == Customer::KIND {
                    self.customers.delete_selected()
                } else {
                    self.appointments.delete_selected()
                };
                match result {
                    Ok(Some(report)) => {
                        self.set_status(report.message(), StatusKind::Info);
                        Ok(Mode::Normal)
                    }
                    Ok(None) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(err.to_string(), StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_filter(&mut self, code: KeyCode, mut state: FilterState) -> Result<Mode> {
        let repo = self.appointments.repository();
        let outcome = match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Up => state.cycle_year(repo, false),
            KeyCode::Down => state.cycle_year(repo, true),
            KeyCode::Left => {
                state.cycle_period(false);
                Ok(())
            }
            KeyCode::Right => {
                state.cycle_period(true);
                Ok(())
            }
            KeyCode::Tab => state.toggle_period_kind(repo),
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Backspace => {
                self.apply_filter(None);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                match state.filter() {
                    Some(filter) => self.apply_filter(Some(filter)),
                    None => self.set_status("No appointments to filter.", StatusKind::Error),
                }
                return Ok(Mode::Normal);
            }
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
        Ok(Mode::Filtering(state))
    }

    fn apply_filter(&mut self, filter: Option<AppointmentFilter>) {
        let description = filter.as_ref().map(|filter| filter.describe());
        match self.appointments.load(filter) {
            Ok(()) => {
                let text = match description {
                    Some(description) => format!(
                        "Showing {} appointment(s) for {description}.",
                        self.appointments.records().len()
                    ),
                    None => "Filter cleared.".to_string(),
                };
                self.set_status(text, StatusKind::Info);
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    /// React to what the controllers reported since the last key press.
    fn apply_events(&mut self) {
        for event in self.events.drain() {
            if event.kind() != Customer::KIND {
                continue;
            }
            self.lookups.set_customers(self.customers.records());
            if let Event::RecordDeleted { cascaded, .. } = &event {
                if cascaded.is_empty() {
                    continue;
                }
                if let Err(err) = self.appointments.reload() {
                    self.set_status(
                        format!("Appointments could not be reloaded: {err}"),
                        StatusKind::Error,
                    );
                }
            }
        }
    }

    fn select(&mut self, on_customers: bool, forward: bool) {
        match (on_customers, forward) {
            (true, true) => self.customers.select_next(),
            (true, false) => self.customers.select_previous(),
            (false, true) => self.appointments.select_next(),
            (false, false) => self.appointments.select_previous(),
        }
    }

    fn next_screen(&mut self) {
        match self.screen {
            Screen::Customers => self.screen = Screen::Appointments,
            Screen::Appointments => self.open_reports(ReportKind::Totals),
            Screen::Reports(_) => self.screen = Screen::Customers,
        }
    }

    fn open_reports(&mut self, kind: ReportKind) {
        match ReportScreen::load(&self.session, kind, &self.zone) {
            Ok(report) => self.screen = Screen::Reports(report),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Customers => self.draw_customers(frame, content_area),
            Screen::Appointments => self.draw_appointments(frame, content_area),
            Screen::Reports(report) => self.draw_report(frame, content_area, report),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Editing => match self.screen {
                Screen::Customers => {
                    if let Some(session) = self.customers.session() {
                        self.draw_form(frame, area, session);
                    }
                }
                Screen::Appointments => {
                    if let Some(session) = self.appointments.session() {
                        self.draw_form(frame, area, session);
                    }
                }
                Screen::Reports(_) => {}
            },
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Filtering(state) => self.draw_filter(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: String,
        rows: Vec<String>,
        selected: usize,
        empty_message: &str,
    ) {
        let block = Block::default().title(title).borders(Borders::ALL);
        if rows.is_empty() {
            let message = Paragraph::new(empty_message.to_string())
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = rows.into_iter().map(ListItem::new).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_customers(&self, frame: &mut Frame, area: Rect) {
        let rows = self
            .customers
            .records()
            .iter()
            .map(|customer| customer_row(customer, &self.lookups))
            .collect();
        self.draw_list(
            frame,
            area,
            format!("Customers ({})", self.customers.records().len()),
            rows,
            self.customers.selected(),
            "No customers yet. Press '+' to add one.",
        );
    }

    fn draw_appointments(&self, frame: &mut Frame, area: Rect) {
        let rows = self
            .appointments
            .records()
            .iter()
            .map(|appointment| appointment_row(appointment, &self.lookups, &self.zone))
            .collect();
        let scope = self
            .appointments
            .filter()
            .map(|filter| filter.describe())
            .unwrap_or_else(|| "all".to_string());
        self.draw_list(
            frame,
            area,
            format!(
                "Appointments ({}) • {scope} • times in {}",
                self.appointments.records().len(),
                self.zone.label()
            ),
            rows,
            self.appointments.selected(),
            "No appointments to display. Press '+' to add one.",
        );
    }

    fn draw_report(&self, frame: &mut Frame, area: Rect, report: &ReportScreen) {
        let block = Block::default()
            .title(format!("Reports • {}", report.kind.title()))
            .borders(Borders::ALL);
        let paragraph = Paragraph::new(report.lines.join("\n"))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((report.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Editing) => &[
                ("[Tab/↑↓]", " Field   "),
                ("[←→]", " Choose   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::ConfirmDelete(_)) => &[("[Y]", " Delete   "), ("[N/Esc]", " Keep")],
            (_, Mode::Filtering(_)) => &[
                ("[↑↓]", " Year   "),
                ("[←→]", " Period   "),
                ("[Tab]", " Month/Week   "),
                ("[Enter]", " Apply   "),
                ("[c]", " Clear   "),
                ("[Esc]", " Close"),
            ],
            (Screen::Reports(_), Mode::Normal) => &[
                ("[←→]", " Report   "),
                ("[↑↓]", " Scroll   "),
                ("[Tab]", " Customers   "),
                ("[q]", " Quit"),
            ],
            (Screen::Appointments, Mode::Normal) => &[
                ("[+]", " Add   "),
                ("[Enter]", " View   "),
                ("[e]", " Edit   "),
                ("[-]", " Delete   "),
                ("[f]", " Filter   "),
                ("[Tab]", " Reports   "),
                ("[q]", " Quit"),
            ],
            (Screen::Customers, Mode::Normal) => &[
                ("[+]", " Add   "),
                ("[Enter]", " View   "),
                ("[e]", " Edit   "),
                ("[-]", " Delete   "),
                ("[Tab]", " Appointments   "),
                ("[r]", " Reports   "),
                ("[q]", " Quit"),
            ],
        };
        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_form<E: FormBinding>(&self, frame: &mut Frame, area: Rect, session: &EditSession<E>) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(session.title())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let form = session.form();
        let mut lines: Vec<Line> = form
            .inputs
            .iter()
            .enumerate()
            .map(|(idx, input)| build_line(input, idx == form.active && !form.read_only))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = session.error() {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        } else if form.read_only {
            lines.push(Line::from(Span::styled(
                "Read only • Enter or Esc to close",
                Style::default().fg(Color::Gray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!(
                    "Enter to save • Tab to switch • ←→ to choose • Esc to cancel • times in {}",
                    self.zone.label()
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if form.read_only {
            return;
        }
        if let Some(input) = form.active_input() {
            if let InputKind::Text(_) = input.kind {
                let prefix = input.label.len() as u16 + 2;
                let cursor_x = inner.x + prefix + input.value_len() as u16;
                let cursor_y = inner.y + form.active as u16;
                frame.set_cursor_position((cursor_x, cursor_y));
            }
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(format!(
            "Remove {} #{} ({})?",
            confirm.kind, confirm.id, confirm.label
        ))];
        if let Some(warning) = confirm.warning {
            lines.push(Line::from(warning));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_filter(&self, frame: &mut Frame, area: Rect, state: &FilterState) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Filter Appointments")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let active = Style::default().fg(Color::Yellow);
        let year = state
            .year()
            .map(|year| year.to_string())
            .unwrap_or_else(|| "-".to_string());
        let lines = vec![
            Line::from(vec![Span::raw("Year: "), Span::styled(year, active)]),
            Line::from(vec![
                Span::raw(if state.by_week { "Week: " } else { "Month: " }),
                Span::styled(state.period_label(), active),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Weeks start on Monday and are counted in UTC.",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
