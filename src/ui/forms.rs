use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::engine::{Input, InputKind};

/// Text shown for an input's current value, with a placeholder when empty.
pub(crate) fn display_value(input: &Input) -> (String, bool) {
    match &input.kind {
        InputKind::Text(value) if value.is_empty() => {
            let placeholder = if input.required {
                "<required>"
            } else {
                "<optional>"
            };
            (placeholder.to_string(), true)
        }
        InputKind::Text(value) => (value.clone(), false),
        InputKind::Choice(picker) if !picker.enabled => {
            ("<choose the field above first>".to_string(), true)
        }
        InputKind::Choice(picker) => match picker.selected_label() {
            Some(label) => (format!("< {label} >"), false),
            None => ("< choose >".to_string(), true),
        },
    }
}

/// Render a single line for the form widget.
pub(crate) fn build_line(input: &Input, is_active: bool) -> Line<'static> {
    let (display, is_placeholder) = display_value(input);

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if is_placeholder {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{}: ", input.label)),
        Span::styled(display, style),
    ])
}

/// The record awaiting a delete confirmation.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) kind: &'static str,
    pub(crate) id: i64,
    pub(crate) label: String,
    /// Extra warning, e.g. about dependents removed with the record.
    pub(crate) warning: Option<&'static str>,
}
