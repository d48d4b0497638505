use anyhow::{Context, Result};
use chrono::Month;

use crate::db::reports::{
    appointment_totals, contact_schedules, customers_by_division, AppointmentTotals,
    ContactSchedule, DivisionCustomers,
};
use crate::db::{AppointmentFilter, AppointmentRepository, Period, Session};
use crate::models::Record;
use crate::time::DisplayZone;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum ReportKind {
    Totals,
    Schedules,
    Divisions,
}

impl ReportKind {
    pub(crate) fn title(&self) -> &'static str {
        match self {
            ReportKind::Totals => "Appointments by Month and Type",
            ReportKind::Schedules => "Contact Schedules",
            ReportKind::Divisions => "Customers by Division",
        }
    }

    pub(crate) fn next(&self) -> Self {
        match self {
            ReportKind::Totals => ReportKind::Schedules,
            ReportKind::Schedules => ReportKind::Divisions,
            ReportKind::Divisions => ReportKind::Totals,
        }
    }

    pub(crate) fn previous(&self) -> Self {
        match self {
            ReportKind::Totals => ReportKind::Divisions,
            ReportKind::Schedules => ReportKind::Totals,
            ReportKind::Divisions => ReportKind::Schedules,
        }
    }
}

/// A rendered report plus its scroll offset.
pub(crate) struct ReportScreen {
    pub(crate) kind: ReportKind,
    pub(crate) lines: Vec<String>,
    pub(crate) scroll: u16,
}

impl ReportScreen {
    pub(crate) fn load(session: &Session, kind: ReportKind, zone: &DisplayZone) -> Result<Self> {
        let lines = match kind {
            ReportKind::Totals => {
                totals_lines(&appointment_totals(session).context("failed to build totals")?)
            }
            ReportKind::Schedules => schedule_lines(
                &contact_schedules(session).context("failed to build schedules")?,
                zone,
            ),
            ReportKind::Divisions => division_lines(
                &customers_by_division(session).context("failed to build division report")?,
            ),
        };
        Ok(Self {
            kind,
            lines,
            scroll: 0,
        })
    }

    pub(crate) fn scroll_by(&mut self, offset: i32) {
        let max = self.lines.len().saturating_sub(1) as i32;
        self.scroll = (self.scroll as i32 + offset).clamp(0, max) as u16;
    }
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| format!("Month {month}"))
}

pub(crate) fn totals_lines(totals: &AppointmentTotals) -> Vec<String> {
    if totals.by_month.is_empty() {
        return vec!["No appointments yet.".to_string()];
    }
    let mut lines = vec!["By month".to_string()];
    lines.extend(
        totals
            .by_month
            .iter()
            .map(|(month, count)| format!("  {:<10} {count:>4}", month_name(*month))),
    );
    lines.push(String::new());
    lines.push("By type".to_string());
    lines.extend(
        totals
            .by_type
            .iter()
            .map(|(kind, count)| format!("  {kind:<10} {count:>4}")),
    );
    lines
}

pub(crate) fn schedule_lines(schedules: &[ContactSchedule], zone: &DisplayZone) -> Vec<String> {
    if schedules.is_empty() {
        return vec!["No contact has appointments yet.".to_string()];
    }
    let mut lines = Vec::new();
    for schedule in schedules {
        lines.push(format!(
            "{} <{}>",
            schedule.contact.name, schedule.contact.email
        ));
        for appointment in &schedule.appointments {
            lines.push(format!(
                "  #{:<4} {} -> {}  {} ({}) customer #{}",
                appointment.id(),
                zone.format(appointment.start),
                zone.format(appointment.end),
                appointment.title,
                appointment.kind,
                appointment.customer_id
            ));
        }
        lines.push(String::new());
    }
    lines.pop();
    lines
}

pub(crate) fn division_lines(groups: &[DivisionCustomers]) -> Vec<String> {
    if groups.is_empty() {
        return vec!["No customers yet.".to_string()];
    }
    let mut lines = Vec::new();
    for group in groups {
        lines.push(format!(
            "{} ({})",
            group.division.name,
            group.customers.len()
        ));
        lines.extend(
            group
                .customers
                .iter()
                .map(|customer| format!("  #{:<4} {}", customer.id(), customer.name)),
        );
    }
    lines
}

/// State of the appointment filter dialog. Options come from the stored
/// appointments, so only periods that have data are offered.
pub(crate) struct FilterState {
    pub(crate) years: Vec<i32>,
    pub(crate) year_idx: usize,
    pub(crate) by_week: bool,
    pub(crate) periods: Vec<u32>,
    pub(crate) period_idx: usize,
}

impl FilterState {
    pub(crate) fn load(repo: &AppointmentRepository, current: Option<&AppointmentFilter>) -> Result<Self> {
        let years = repo
            .distinct_years()
            .context("failed to list appointment years")?;
        let year_idx = current
            .and_then(|filter| years.iter().position(|year| *year == filter.year))
            .unwrap_or(0);
        let by_week = matches!(current.map(|f| f.period), Some(Period::Week(_)));
        let mut state = Self {
            years,
            year_idx,
            by_week,
            periods: Vec::new(),
            period_idx: 0,
        };
        state.reload_periods(repo)?;
        if let Some(filter) = current {
            let wanted = match filter.period {
                Period::Month(value) | Period::Week(value) => value,
            };
            if let Some(idx) = state.periods.iter().position(|p| *p == wanted) {
                state.period_idx = idx;
            }
        }
        Ok(state)
    }

    pub(crate) fn year(&self) -> Option<i32> {
        self.years.get(self.year_idx).copied()
    }

    fn reload_periods(&mut self, repo: &AppointmentRepository) -> Result<()> {
        self.period_idx = 0;
        self.periods = match self.year() {
            Some(year) if self.by_week => repo
                .distinct_weeks(year)
                .context("failed to list appointment weeks")?,
            Some(year) => repo
                .distinct_months(year)
                .context("failed to list appointment months")?,
            None => Vec::new(),
        };
        Ok(())
    }

    pub(crate) fn cycle_year(&mut self, repo: &AppointmentRepository, forward: bool) -> Result<()> {
        if self.years.is_empty() {
            return Ok(());
        }
        let len = self.years.len();
        self.year_idx = if forward {
            (self.year_idx + 1) % len
        } else {
            (self.year_idx + len - 1) % len
        };
        self.reload_periods(repo)
    }

    pub(crate) fn toggle_period_kind(&mut self, repo: &AppointmentRepository) -> Result<()> {
        self.by_week = !self.by_week;
        self.reload_periods(repo)
    }

    pub(crate) fn cycle_period(&mut self, forward: bool) {
        if self.periods.is_empty() {
            return;
        }
        let len = self.periods.len();
        self.period_idx = if forward {
            (self.period_idx + 1) % len
        } else {
            (self.period_idx + len - 1) % len
        };
    }

    pub(crate) fn filter(&self) -> Option<AppointmentFilter> {
        let year = self.year()?;
        let value = *self.periods.get(self.period_idx)?;
        let period = if self.by_week {
            Period::Week(value)
        } else {
            Period::Month(value)
        };
        Some(AppointmentFilter { year, period })
    }

    pub(crate) fn period_label(&self) -> String {
        match self.periods.get(self.period_idx) {
            Some(value) if self.by_week => format!("Week {value}"),
            Some(value) => month_name(*value),
            None => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contact, Customer, Division};

    #[test]
    fn totals_use_month_names() {
        let totals = AppointmentTotals {
            by_month: vec![(3, 2)],
            by_type: vec![("Planning".into(), 2)],
        };
        let lines = totals_lines(&totals);
        assert_eq!(lines[1].trim(), "March         2");
        assert_eq!(lines.last().map(|l| l.trim()), Some("Planning      2"));
        assert_eq!(
            totals_lines(&AppointmentTotals::default()),
            vec!["No appointments yet.".to_string()]
        );
    }

    #[test]
    fn division_report_lists_customers_under_headers() {
        let groups = vec![DivisionCustomers {
            division: Division {
                id: 9,
                name: "Ohio".into(),
                country_id: 1,
            },
            customers: vec![Customer::new("Acme", "1 Main St", "00000", "555-0100", 9)],
        }];
        assert_eq!(
            division_lines(&groups),
            vec!["Ohio (1)".to_string(), "  #0    Acme".to_string()]
        );
    }

    #[test]
    fn schedule_report_has_one_block_per_contact() {
        let schedules = vec![ContactSchedule {
            contact: Contact {
                id: 1,
                name: "Li Lee".into(),
                email: "llee@company.com".into(),
            },
            appointments: Vec::new(),
        }];
        assert_eq!(
            schedule_lines(&schedules, &DisplayZone::Local),
            vec!["Li Lee <llee@company.com>".to_string()]
        );
    }

    #[test]
    fn empty_filter_state_yields_no_filter() {
        let state = FilterState {
            years: Vec::new(),
            year_idx: 0,
            by_week: false,
            periods: Vec::new(),
            period_idx: 0,
        };
        assert_eq!(state.filter(), None);
        assert_eq!(state.period_label(), "-");
    }
}
