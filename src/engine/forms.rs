//! Toolkit-neutral form state. Each editable entity declares how its fields
//! map onto text inputs and pickers; the UI only renders a `FormState` and
//! forwards keystrokes to it.

use crate::error::{ValidationError, ValidationReason};
use crate::models::{Appointment, Customer, Entity, Lookups};
use crate::time::DisplayZone;

/// A single-choice list of `(id, label)` options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picker {
    pub options: Vec<(i64, String)>,
    pub selected: Option<usize>,
    pub enabled: bool,
}

impl Picker {
    /// Build an enabled picker, preselecting `selected_id` when it is one of
    /// the options.
    pub fn new(options: Vec<(i64, String)>, selected_id: i64) -> Self {
        let selected = options.iter().position(|(id, _)| *id == selected_id);
        Self {
            options,
            selected,
            enabled: true,
        }
    }

    /// An empty picker waiting on its parent selection.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Id of the chosen option, or `0` when nothing is chosen.
    pub fn selected_id(&self) -> i64 {
        self.selected
            .and_then(|idx| self.options.get(idx))
            .map(|(id, _)| *id)
            .unwrap_or(0)
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected
            .and_then(|idx| self.options.get(idx))
            .map(|(_, label)| label.as_str())
    }

    /// Move to the next (or previous) option, wrapping around. Returns whether
    /// the selection changed.
    pub fn cycle(&mut self, forward: bool) -> bool {
        if !self.enabled || self.options.is_empty() {
            return false;
        }
        let last = self.options.len() - 1;
        let next = match (self.selected, forward) {
            (None, true) => 0,
            (None, false) => last,
            (Some(idx), true) if idx >= last => 0,
            (Some(idx), true) => idx + 1,
            (Some(0), false) => last,
            (Some(idx), false) => idx - 1,
        };
        let changed = self.selected != Some(next);
        self.selected = Some(next);
        changed
    }

    /// Replace the option set and drop the current choice.
    pub fn reset(&mut self, options: Vec<(i64, String)>) {
        self.enabled = !options.is_empty();
        self.options = options;
        self.selected = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Text(String),
    Choice(Picker),
}

/// One labelled control in a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: InputKind,
}

impl Input {
    pub fn text(name: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            label,
            required: true,
            kind: InputKind::Text(value.into()),
        }
    }

    pub fn choice(name: &'static str, label: &'static str, picker: Picker) -> Self {
        Self {
            name,
            label,
            required: true,
            kind: InputKind::Choice(picker),
        }
    }

    /// Character count of a text input, or of the chosen label.
    pub fn value_len(&self) -> usize {
        match &self.kind {
            InputKind::Text(value) => value.chars().count(),
            InputKind::Choice(picker) => picker
                .selected_label()
                .map(|label| label.chars().count())
                .unwrap_or(0),
        }
    }
}

/// Ordered controls plus the focused index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub inputs: Vec<Input>,
    pub active: usize,
    pub read_only: bool,
}

impl FormState {
    pub fn new(inputs: Vec<Input>) -> Self {
        Self {
            inputs,
            active: 0,
            read_only: false,
        }
    }

    pub fn focus_next(&mut self) {
        if !self.inputs.is_empty() {
            self.active = (self.active + 1) % self.inputs.len();
        }
    }

    pub fn focus_previous(&mut self) {
        if !self.inputs.is_empty() {
            self.active = (self.active + self.inputs.len() - 1) % self.inputs.len();
        }
    }

    pub fn active_input(&self) -> Option<&Input> {
        self.inputs.get(self.active)
    }

    /// Append a character to the focused text input.
    pub fn push_char(&mut self, ch: char) -> bool {
        if self.read_only || ch.is_control() {
            return false;
        }
        match self.inputs.get_mut(self.active).map(|input| &mut input.kind) {
            Some(InputKind::Text(value)) => {
                value.push(ch);
                true
            }
            _ => false,
        }
    }

    /// Drop the last character of the focused text input. Returns whether
    /// anything was removed.
    pub fn backspace(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        match self.inputs.get_mut(self.active).map(|input| &mut input.kind) {
            Some(InputKind::Text(value)) => value.pop().is_some(),
            _ => false,
        }
    }

    /// Cycle the focused picker. Returns the input name when its selection
    /// changed so dependent inputs can be re-derived.
    pub fn cycle(&mut self, forward: bool) -> Option<&'static str> {
        if self.read_only {
            return None;
        }
        let input = self.inputs.get_mut(self.active)?;
        let name = input.name;
        match &mut input.kind {
            InputKind::Choice(picker) => picker.cycle(forward).then_some(name),
            InputKind::Text(_) => None,
        }
    }

    pub fn text(&self, name: &str) -> &str {
        match self.input(name).map(|input| &input.kind) {
            Some(InputKind::Text(value)) => value,
            _ => "",
        }
    }

    pub fn picker(&self, name: &str) -> Option<&Picker> {
        match self.input(name).map(|input| &input.kind) {
            Some(InputKind::Choice(picker)) => Some(picker),
            _ => None,
        }
    }

    pub fn picker_mut(&mut self, name: &str) -> Option<&mut Picker> {
        match self
            .inputs
            .iter_mut()
            .find(|input| input.name == name)
            .map(|input| &mut input.kind)
        {
            Some(InputKind::Choice(picker)) => Some(picker),
            _ => None,
        }
    }

    /// Selected id of a picker, `0` when unset or missing.
    pub fn choice(&self, name: &str) -> i64 {
        self.picker(name).map(Picker::selected_id).unwrap_or(0)
    }

    fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|input| input.name == name)
    }
}

/// How an entity is presented in, and read back from, a form.
pub trait FormBinding: Entity {
    fn build_form(&self, lookups: &Lookups, zone: &DisplayZone) -> FormState;

    /// Copy the form's values onto `self`. Only input that cannot be
    /// represented at all (for example an unparsable date) fails here;
    /// everything else is left to validation.
    fn apply_form(&mut self, form: &FormState, zone: &DisplayZone) -> Result<(), ValidationError>;

    /// Re-derive inputs that depend on `changed`.
    fn on_input_changed(_form: &mut FormState, _changed: &str, _lookups: &Lookups) {}
}

fn division_options(lookups: &Lookups, country_id: i64) -> Vec<(i64, String)> {
    lookups
        .divisions_in(country_id)
        .into_iter()
        .map(|division| (division.id, division.name.clone()))
        .collect()
}

impl FormBinding for Customer {
    fn build_form(&self, lookups: &Lookups, _zone: &DisplayZone) -> FormState {
        let countries: Vec<(i64, String)> = lookups
            .countries_with_divisions()
            .into_iter()
            .map(|country| (country.id, country.name.clone()))
            .collect();
        let country_id = lookups
            .country_of_division(self.division_id)
            .map(|country| country.id)
            .unwrap_or(0);

        let division = if country_id == 0 {
            Picker::disabled()
        } else {
            Picker::new(division_options(lookups, country_id), self.division_id)
        };

        FormState::new(vec![
            Input::text("name", "Name", self.name.clone()),
            Input::text("address", "Address", self.address.clone()),
            Input::text("postal_code", "Postal Code", self.postal_code.clone()),
            Input::text("phone", "Phone", self.phone.clone()),
            Input::choice("country", "Country", Picker::new(countries, country_id)),
            Input::choice("division_id", "Division", division),
        ])
    }

    fn apply_form(&mut self, form: &FormState, _zone: &DisplayZone) -> Result<(), ValidationError> {
        self.name = form.text("name").to_string();
        self.address = form.text("address").to_string();
        self.postal_code = form.text("postal_code").to_string();
        self.phone = form.text("phone").to_string();
        self.division_id = form.choice("division_id");
        Ok(())
    }

    fn on_input_changed(form: &mut FormState, changed: &str, lookups: &Lookups) {
        if changed != "country" {
            return;
        }
        let country_id = form.choice("country");
        if let Some(division) = form.picker_mut("division_id") {
            if country_id == 0 {
                *division = Picker::disabled();
            } else {
                division.reset(division_options(lookups, country_id));
            }
        }
    }
}

fn parse_instant(
    form: &FormState,
    name: &str,
    label: &'static str,
    zone: &DisplayZone,
) -> Result<chrono::DateTime<chrono::Utc>, ValidationError> {
    let raw = form.text(name);
    if raw.trim().is_empty() {
        return Err(ValidationError::new(label, ValidationReason::Empty));
    }
    zone.parse(raw).ok_or_else(|| {
        ValidationError::new(label, ValidationReason::Malformed)
            .with_detail("expected YYYY-MM-DD HH:MM")
    })
}

impl FormBinding for Appointment {
    fn build_form(&self, lookups: &Lookups, zone: &DisplayZone) -> FormState {
        let customers = lookups
            .customers
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect();
        let contacts = lookups
            .contacts
            .values()
            .map(|contact| (contact.id, contact.name.clone()))
            .collect();
        let users = lookups
            .users
            .values()
            .map(|user| (user.id, user.name.clone()))
            .collect();

        FormState::new(vec![
            Input::text("title", "Title", self.title.clone()),
            Input::text("description", "Description", self.description.clone()),
            Input::text("location", "Location", self.location.clone()),
            Input::text("kind", "Type", self.kind.clone()),
            Input::text("start", "Start", zone.format(self.start)),
            Input::text("end", "End", zone.format(self.end)),
            Input::choice("customer_id", "Customer", Picker::new(customers, self.customer_id)),
            Input::choice("contact_id", "Contact", Picker::new(contacts, self.contact_id)),
            Input::choice("user_id", "User", Picker::new(users, self.user_id)),
        ])
    }

    fn apply_form(&mut self, form: &FormState, zone: &DisplayZone) -> Result<(), ValidationError> {
        self.title = form.text("title").to_string();
        self.description = form.text("description").to_string();
        self.location = form.text("location").to_string();
        self.kind = form.text("kind").to_string();
        self.start = parse_instant(form, "start", "Start", zone)?;
        self.end = parse_instant(form, "end", "End", zone)?;
        self.customer_id = form.choice("customer_id");
        self.contact_id = form.choice("contact_id");
        self.user_id = form.choice("user_id");
        Ok(())
    }
}
