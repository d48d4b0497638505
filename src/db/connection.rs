use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{EngineError, EngineResult};
use crate::models::User;

/// The one live database connection plus the acting user. Created at startup,
/// shared by every repository, dropped when the application exits.
pub struct Session {
    conn: Connection,
    user: User,
}

impl Session {
    /// Open (or create) the database file, run lazy migrations, seed the
    /// reference tables and resolve the acting user.
    pub fn open(path: &Path, user_name: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
        Self::from_connection(conn, user_name)
    }

    /// Same as [`Session::open`] against a private in-memory database.
    pub fn open_in_memory(user_name: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(conn, user_name)
    }

    fn from_connection(conn: Connection, user_name: &str) -> Result<Self> {
        ensure_schema(&conn)?;
        seed_reference_data(&conn)?;
        let user = resolve_user(&conn, user_name)?;
        log::info!("session opened for user '{}' (#{})", user.name, user.id);
        Ok(Self { conn, user })
    }

    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Run a SELECT with positional arguments and map every row. The prepared
    /// statement and its rows are released before this returns, whatever the
    /// outcome.
    pub fn query<T, F>(
        &self,
        operation: &'static str,
        sql: &str,
        args: &[Value],
        map: F,
    ) -> EngineResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|err| EngineError::sql(operation, err))?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), map)
            .map_err(|err| EngineError::sql(operation, err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| EngineError::sql(operation, err))
    }

    /// Run an INSERT and return the generated key.
    pub fn insert(&self, operation: &'static str, sql: &str, args: &[Value]) -> EngineResult<i64> {
        let inserted = self.execute(operation, sql, args)?;
        if inserted == 0 {
            return Err(EngineError::no_rows(operation));
        }
        Ok(self.conn.last_insert_rowid())
    }

    /// Run an UPDATE/DELETE and return the affected row count.
    pub fn execute(&self, operation: &'static str, sql: &str, args: &[Value]) -> EngineResult<usize> {
        self.conn
            .execute(sql, params_from_iter(args.iter()))
            .map_err(|err| EngineError::sql(operation, err))
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn transaction<T, F>(&self, operation: &'static str, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Self) -> EngineResult<T>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|err| EngineError::sql(operation, err))?;
        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|err| EngineError::sql(operation, err))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::error!("{operation}: rollback failed: {rollback}");
                }
                Err(err)
            }
        }
    }
}

/// Create every table the engine depends on. `PRAGMA foreign_keys = ON` makes
/// the references behave the same in tests and production runs.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS countries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            country TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create countries table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS first_level_divisions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            division TEXT NOT NULL,
            country_id INTEGER NOT NULL,
            FOREIGN KEY(country_id) REFERENCES countries(id)
        )",
        [],
    )
    .context("failed to create first_level_divisions table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )
    .context("failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create contacts table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            postal_code TEXT NOT NULL,
            phone TEXT NOT NULL,
            division_id INTEGER NOT NULL,
            create_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            created_by INTEGER,
            last_update TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_updated_by INTEGER,
            FOREIGN KEY(division_id) REFERENCES first_level_divisions(id),
            FOREIGN KEY(created_by) REFERENCES users(id),
            FOREIGN KEY(last_updated_by) REFERENCES users(id)
        )",
        [],
    )
    .context("failed to create customers table")?;

    // Dependent appointments are removed explicitly by the customer
    // repository, so the reference carries no ON DELETE action.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS appointments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            type TEXT NOT NULL,
            `start` TEXT NOT NULL,
            `end` TEXT NOT NULL,
            customer_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            contact_id INTEGER NOT NULL,
            create_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            created_by INTEGER,
            last_update TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_updated_by INTEGER,
            FOREIGN KEY(customer_id) REFERENCES customers(id),
            FOREIGN KEY(user_id) REFERENCES users(id),
            FOREIGN KEY(contact_id) REFERENCES contacts(id),
            FOREIGN KEY(created_by) REFERENCES users(id),
            FOREIGN KEY(last_updated_by) REFERENCES users(id)
        )",
        [],
    )
    .context("failed to create appointments table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS appointments_window ON appointments (`start`, `end`)",
        [],
    )
    .context("failed to create appointments index")?;

    Ok(())
}

const COUNTRIES: &[&str] = &["U.S", "UK", "Canada"];

/// (division, index into `COUNTRIES`)
const DIVISIONS: &[(&str, usize)] = &[
    ("Alabama", 0),
    ("Arizona", 0),
    ("California", 0),
    ("Colorado", 0),
    ("Florida", 0),
    ("Georgia", 0),
    ("Illinois", 0),
    ("New York", 0),
    ("Ohio", 0),
    ("Texas", 0),
    ("Washington", 0),
    ("England", 1),
    ("Wales", 1),
    ("Scotland", 1),
    ("Northern Ireland", 1),
    ("Alberta", 2),
    ("British Columbia", 2),
    ("Manitoba", 2),
    ("New Brunswick", 2),
    ("Newfoundland and Labrador", 2),
    ("Nova Scotia", 2),
    ("Ontario", 2),
    ("Prince Edward Island", 2),
    ("Québec", 2),
    ("Saskatchewan", 2),
];

const CONTACTS: &[(&str, &str)] = &[
    ("Anika Costa", "acoasta@company.com"),
    ("Daniel Garcia", "dgarcia@company.com"),
    ("Li Lee", "llee@company.com"),
];

const USERS: &[&str] = &["test", "admin"];

/// Fill the reference tables the first time the database is opened.
fn seed_reference_data(conn: &Connection) -> Result<()> {
    let countries: i64 = conn
        .query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
        .context("failed to count countries")?;
    if countries > 0 {
        return Ok(());
    }

    let mut country_ids = Vec::with_capacity(COUNTRIES.len());
    for country in COUNTRIES {
        conn.execute("INSERT INTO countries (country) VALUES (?1)", params![country])
            .context("failed to seed countries")?;
        country_ids.push(conn.last_insert_rowid());
    }

    for (division, country) in DIVISIONS {
        conn.execute(
            "INSERT INTO first_level_divisions (division, country_id) VALUES (?1, ?2)",
            params![division, country_ids[*country]],
        )
        .context("failed to seed divisions")?;
    }

    for (name, email) in CONTACTS {
        conn.execute(
            "INSERT INTO contacts (name, email) VALUES (?1, ?2)",
            params![name, email],
        )
        .context("failed to seed contacts")?;
    }

    for name in USERS {
        conn.execute("INSERT OR IGNORE INTO users (name) VALUES (?1)", params![name])
            .context("failed to seed users")?;
    }

    log::info!(
        "seeded {} countries, {} divisions, {} contacts",
        COUNTRIES.len(),
        DIVISIONS.len(),
        CONTACTS.len()
    );
    Ok(())
}

/// Find the configured user, creating the row when it does not exist yet.
fn resolve_user(conn: &Connection, name: &str) -> Result<User> {
    let existing = conn
        .query_row(
            "SELECT id, name FROM users WHERE name = ?1",
            params![name],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .context("failed to look up user")?;

    if let Some(user) = existing {
        return Ok(user);
    }

    conn.execute("INSERT INTO users (name) VALUES (?1)", params![name])
        .context("failed to create user")?;
    log::info!("created user '{name}'");
    Ok(User {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}
