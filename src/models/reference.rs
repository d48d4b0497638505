//! Read-mostly reference rows. They are loaded once per session and never
//! written by the engine.

use std::collections::BTreeMap;
use std::fmt;

use super::{Customer, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub id: i64,
    pub name: String,
}

/// First-level division (state, province, region).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    pub id: i64,
    pub name: String,
    pub country_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// In-memory caches used to resolve foreign keys for display and pickers.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub contacts: BTreeMap<i64, Contact>,
    pub countries: BTreeMap<i64, Country>,
    pub divisions: BTreeMap<i64, Division>,
    pub users: BTreeMap<i64, User>,
    /// Derived from the customer list, not loaded from the database.
    pub customers: BTreeMap<i64, String>,
}

impl Lookups {
    pub fn division(&self, id: i64) -> Option<&Division> {
        self.divisions.get(&id)
    }

    pub fn country_of_division(&self, division_id: i64) -> Option<&Country> {
        self.division(division_id)
            .and_then(|division| self.countries.get(&division.country_id))
    }

    /// Countries that have at least one division, sorted by name.
    pub fn countries_with_divisions(&self) -> Vec<&Country> {
        let mut countries: Vec<&Country> = self
            .countries
            .values()
            .filter(|country| {
                self.divisions
                    .values()
                    .any(|division| division.country_id == country.id)
            })
            .collect();
        countries.sort_by(|a, b| a.name.cmp(&b.name));
        countries
    }

    /// Divisions of one country, sorted by name.
    pub fn divisions_in(&self, country_id: i64) -> Vec<&Division> {
        let mut divisions: Vec<&Division> = self
            .divisions
            .values()
            .filter(|division| division.country_id == country_id)
            .collect();
        divisions.sort_by(|a, b| a.name.cmp(&b.name));
        divisions
    }

    pub fn contact_name(&self, id: i64) -> &str {
        self.contacts
            .get(&id)
            .map(|contact| contact.name.as_str())
            .unwrap_or("?")
    }

    pub fn customer_name(&self, id: i64) -> &str {
        self.customers.get(&id).map(String::as_str).unwrap_or("?")
    }

    pub fn user_name(&self, id: i64) -> &str {
        self.users
            .get(&id)
            .map(|user| user.name.as_str())
            .unwrap_or("?")
    }

    /// Rebuild the customer name cache from the authoritative list.
    pub fn set_customers<'a>(&mut self, customers: impl IntoIterator<Item = &'a Customer>) {
        self.customers = customers
            .into_iter()
            .map(|customer| (customer.id(), customer.name.clone()))
            .collect();
    }
}
