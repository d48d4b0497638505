use anyhow::Error;
use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::{Appointment, Customer, Lookups, Record};
use crate::time::DisplayZone;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Pad or cut `text` to exactly `width` characters.
pub(crate) fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{text:<width$}")
    } else if width == 0 {
        String::new()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('~');
        cut
    }
}

/// One list row for a customer, with the division and its country resolved.
pub(crate) fn customer_row(customer: &Customer, lookups: &Lookups) -> String {
    let division = lookups
        .division(customer.division_id)
        .map(|division| division.name.as_str())
        .unwrap_or("?");
    let country = lookups
        .country_of_division(customer.division_id)
        .map(|country| country.name.as_str())
        .unwrap_or("?");
    format!(
        "{:>4}  {}  {}  {}  {}  {}, {}",
        customer.id(),
        fit(&customer.name, 20),
        fit(&customer.address, 24),
        fit(&customer.postal_code, 8),
        fit(&customer.phone, 14),
        division,
        country
    )
}

/// One list row for an appointment, times in the viewer's zone.
pub(crate) fn appointment_row(
    appointment: &Appointment,
    lookups: &Lookups,
    zone: &DisplayZone,
) -> String {
    format!(
        "{:>4}  {}  {}  {}  {} -> {}  {}  {}",
        appointment.id(),
        fit(&appointment.title, 16),
        fit(&appointment.kind, 12),
        fit(&appointment.location, 12),
        zone.format(appointment.start),
        zone.format(appointment.end),
        fit(lookups.customer_name(appointment.customer_id), 16),
        lookups.contact_name(appointment.contact_id)
    )
}

/// Startup alert text for appointments starting soon.
pub(crate) fn upcoming_message(
    upcoming: &[Appointment],
    now: DateTime<Utc>,
    zone: &DisplayZone,
) -> String {
    if upcoming.is_empty() {
        return "No upcoming appointments.".to_string();
    }
    let listed: Vec<String> = upcoming
        .iter()
        .map(|appointment| {
            let minutes = (appointment.start - now).num_minutes();
            format!(
                "#{} at {} (in {minutes} min)",
                appointment.id(),
                zone.format(appointment.start)
            )
        })
        .collect();
    format!("Upcoming: {}", listed.join("; "))
}
