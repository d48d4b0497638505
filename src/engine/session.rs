//! A single modal edit of one record. The session works on its own copy of
//! the entity, so abandoning it never touches the caller's data.

use crate::error::ValidationError;
use crate::models::Lookups;
use crate::time::DisplayZone;
use crate::validation::{validate, ValidationContext};

use super::forms::{FormBinding, FormState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Read,
    Update,
}

impl Mode {
    pub fn verb(&self) -> &'static str {
        match self {
            Mode::Create => "Add",
            Mode::Read => "View",
            Mode::Update => "Edit",
        }
    }
}

/// How a submit ended when it did not fail validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<E> {
    Committed(E),
    /// Read-mode sessions close without producing anything.
    Closed,
}

#[derive(Debug, Clone)]
pub struct EditSession<E: FormBinding> {
    mode: Mode,
    draft: E,
    form: FormState,
    zone: DisplayZone,
    error: Option<String>,
}

impl<E: FormBinding> EditSession<E> {
    pub fn open(draft: E, mode: Mode, lookups: &Lookups, zone: DisplayZone) -> Self {
        let mut form = draft.build_form(lookups, &zone);
        form.read_only = mode == Mode::Read;
        Self {
            mode,
            draft,
            form,
            zone,
            error: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn draft(&self) -> &E {
        &self.draft
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// The last rejection shown to the user, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn title(&self) -> String {
        if self.draft.is_new() {
            format!("{} {}", self.mode.verb(), E::KIND)
        } else {
            format!("{} {} #{}", self.mode.verb(), E::KIND, self.draft.id())
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if self.form.push_char(ch) {
            self.error = None;
        }
    }

    pub fn backspace(&mut self) {
        if self.form.backspace() {
            self.error = None;
        }
    }

    pub fn focus_next(&mut self) {
        self.form.focus_next();
    }

    pub fn focus_previous(&mut self) {
        self.form.focus_previous();
    }

    /// Cycle the focused picker and re-derive anything that depends on it.
    pub fn cycle(&mut self, forward: bool, lookups: &Lookups) {
        if let Some(changed) = self.form.cycle(forward) {
            E::on_input_changed(&mut self.form, changed, lookups);
            self.error = None;
        }
    }

    /// Copy the inputs onto a fresh copy of the draft and validate it. On
    /// failure the error is remembered for display and the session stays
    /// usable.
    pub fn submit(&mut self, ctx: &ValidationContext<'_>) -> Result<Outcome<E>, ValidationError> {
        if self.mode == Mode::Read {
            return Ok(Outcome::Closed);
        }
        let mut candidate = self.draft.clone();
        let checked = candidate
            .apply_form(&self.form, &self.zone)
            .and_then(|()| validate(&candidate, ctx));
        match checked {
            Ok(()) => {
                self.error = None;
                Ok(Outcome::Committed(candidate))
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
