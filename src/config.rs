//! User-editable settings stored as JSON beneath the application data
//! directory. Every key is optional; a missing file means "all defaults" so a
//! fresh install starts without any setup.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::time::{BusinessHours, DisplayZone};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".customer-scheduler";
const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "scheduler.sqlite";
const CLOCK_FORMAT: &str = "%H:%M";

/// Which appointments an edited appointment is checked against for overlap.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OverlapScope {
    /// Every other appointment, whoever the customer.
    #[default]
    Global,
    /// Only other appointments of the same customer.
    SameCustomer,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub user_name: String,
    pub business_time_zone: String,
    pub business_open: String,
    pub business_close: String,
    /// IANA name; `None` uses the machine's local zone.
    pub display_time_zone: Option<String>,
    pub overlap_scope: OverlapScope,
    pub upcoming_window_minutes: i64,
    pub database_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: "test".to_string(),
            business_time_zone: "US/Eastern".to_string(),
            business_open: "08:00".to_string(),
            business_close: "22:00".to_string(),
            display_time_zone: None,
            overlap_scope: OverlapScope::Global,
            upcoming_window_minutes: 15,
            database_path: None,
        }
    }
}

/// `~/.customer-scheduler`
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(CONFIG_FILE_NAME))
}

impl Config {
    /// Read `path`, falling back to defaults when the file does not exist. A
    /// file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn business_hours(&self) -> Result<BusinessHours> {
        let zone = parse_zone(&self.business_time_zone)?;
        let open = parse_clock(&self.business_open)
            .context("businessOpen must be formatted as HH:MM")?;
        let close = parse_clock(&self.business_close)
            .context("businessClose must be formatted as HH:MM")?;
        if open >= close {
            return Err(anyhow!(
                "businessOpen ({}) must be earlier than businessClose ({})",
                self.business_open,
                self.business_close
            ));
        }
        Ok(BusinessHours { zone, open, close })
    }

    pub fn display_zone(&self) -> Result<DisplayZone> {
        match &self.display_time_zone {
            Some(name) => Ok(DisplayZone::Named(parse_zone(name)?)),
            None => Ok(DisplayZone::Local),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(DB_FILE_NAME)),
        }
    }

    pub fn upcoming_window(&self) -> Result<Duration> {
        if self.upcoming_window_minutes <= 0 {
            return Err(anyhow!(
                "upcomingWindowMinutes must be positive, got {}",
                self.upcoming_window_minutes
            ));
        }
        Ok(Duration::minutes(self.upcoming_window_minutes))
    }
}

fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|err| anyhow!("unknown time zone '{name}': {err}"))
}

fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), CLOCK_FORMAT)
        .with_context(|| format!("invalid time of day '{value}'"))
}
