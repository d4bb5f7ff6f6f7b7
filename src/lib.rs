pub mod backend;
pub mod config;
pub mod doctor;
pub mod feed;
pub mod settings;
pub mod snapshot;
pub mod solve;
pub mod stats;
pub mod telemetry;
pub mod terminal_restore;
pub mod ui;

mod app;

pub use app::*;
pub use solve::{DisplayMode, SolveMode, SolveResult, Solution};
