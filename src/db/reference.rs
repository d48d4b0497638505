use crate::error::EngineResult;
use crate::models::{Contact, Country, Division, Lookups, User};

use super::connection::Session;

/// Load every reference table into a fresh cache. The customer name cache is
/// left empty; it is derived from the customer list by the caller.
pub fn load_lookups(session: &Session) -> EngineResult<Lookups> {
    let mut lookups = Lookups::default();

    for country in session.query(
        "load countries",
        "SELECT id, country FROM countries",
        &[],
        |row| {
            Ok(Country {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )? {
        lookups.countries.insert(country.id, country);
    }

    for division in session.query(
        "load divisions",
        "SELECT id, division, country_id FROM first_level_divisions",
        &[],
        |row| {
            Ok(Division {
                id: row.get(0)?,
                name: row.get(1)?,
                country_id: row.get(2)?,
            })
        },
    )? {
        lookups.divisions.insert(division.id, division);
    }

    for contact in session.query(
        "load contacts",
        "SELECT id, name, email FROM contacts",
        &[],
        |row| {
            Ok(Contact {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        },
    )? {
        lookups.contacts.insert(contact.id, contact);
    }

    for user in session.query("load users", "SELECT id, name FROM users", &[], |row| {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })? {
        lookups.users.insert(user.id, user);
    }

    log::info!(
        "loaded {} countries, {} divisions, {} contacts, {} users",
        lookups.countries.len(),
        lookups.divisions.len(),
        lookups.contacts.len(),
        lookups.users.len()
    );
    Ok(lookups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_reference_data_is_cached() {
        let session = Session::open_in_memory("test").expect("open");
        let lookups = load_lookups(&session).expect("load");
        assert_eq!(lookups.countries.len(), 3);
        assert_eq!(lookups.contacts.len(), 3);
        assert!(lookups.users.values().any(|u| u.name == "admin"));
        assert!(lookups.customers.is_empty());

        let canada = lookups
            .countries
            .values()
            .find(|c| c.name == "Canada")
            .expect("canada seeded");
        let provinces = lookups.divisions_in(canada.id);
        assert_eq!(provinces.first().map(|d| d.name.as_str()), Some("Alberta"));
    }
}
