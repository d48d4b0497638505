//! Binary entry point: read the config, open the log file and the database,
//! then drive the Ratatui event loop until the user exits.
use std::rc::Rc;

use anyhow::Context;
use chrono::Utc;
use customer_scheduler::config::{data_dir, default_config_path};
use customer_scheduler::{logging, run_app, App, Config, Session};

fn main() -> anyhow::Result<()> {
    let config_path = default_config_path()?;
    let config = Config::load(&config_path)?;
    logging::init(&data_dir()?)?;
    log::info!("configuration read from {}", config_path.display());

    let hours = config.business_hours()?;
    let zone = config.display_zone()?;
    let window = config.upcoming_window()?;
    let database = config.database_path()?;

    let session = Session::open(&database, &config.user_name)
        .with_context(|| format!("failed to open database {}", database.display()))?;
    let mut app = App::new(Rc::new(session), hours, zone, config.overlap_scope)?;
    app.announce_upcoming(Utc::now(), window)?;

    let result = run_app(&mut app);
    if let Err(err) = &result {
        log::error!("terminal loop failed: {err:#}");
    }
    result
}
