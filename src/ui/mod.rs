//! Ratatui front-end. It forwards keystrokes to the record controllers and
//! renders their state; validation and persistence stay in the engine.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
