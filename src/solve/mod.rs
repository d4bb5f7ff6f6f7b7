//! Display modes and the plate-solve lifecycle.

mod orchestrator;
mod poll;
mod readout;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use orchestrator::{SolveCounters, SolveOrchestrator, SolvePhase};
pub use poll::{PollHandle, RepeatingTask};
pub use readout::{SolveReadouts, BLACK_FRAME_PATH, COORD_PLACEHOLDER, FIELD_PLACEHOLDER};

/// Which image source the viewport shows. `Solved` also keeps the solver busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Live,
    Solved,
}

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Live => "live",
            DisplayMode::Solved => "solved",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "live" => Some(DisplayMode::Live),
            "solved" => Some(DisplayMode::Solved),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Live => DisplayMode::Solved,
            DisplayMode::Solved => DisplayMode::Live,
        }
    }

    pub fn frame_path(self) -> &'static str {
        match self {
            DisplayMode::Live => "/live_frame",
            DisplayMode::Solved => "/solved_frame",
        }
    }

    pub fn fps_path(self) -> &'static str {
        match self {
            DisplayMode::Live => "/live_fps",
            DisplayMode::Solved => "/solved_fps",
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DisplayMode::Live => "Live",
            DisplayMode::Solved => "Solved",
        };
        write!(f, "{label}")
    }
}

/// How a deployment drives the solver: back-to-back attempts polled quickly, or
/// operator-triggered attempts polled slowly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SolveMode {
    #[default]
    Continuous,
    Manual,
}

impl SolveMode {
    pub fn default_poll_interval(self) -> Duration {
        match self {
            SolveMode::Continuous => Duration::from_millis(200),
            SolveMode::Manual => Duration::from_millis(2000),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SolveMode::Continuous => "continuous",
            SolveMode::Manual => "manual",
        }
    }
}

/// A successful plate solve as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub ra: String,
    pub dec: String,
    pub ra_hms: Option<String>,
    pub dec_dms: Option<String>,
    pub roll: Option<String>,
    pub solution_time: Option<String>,
    pub constellation: Option<String>,
    pub image_url: Option<String>,
}

/// One status report for the current attempt. `Solved` and `Failed` are terminal;
/// `Solving` carries whatever non-terminal status the service reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    Solving { status: String },
    Solved(Solution),
    Failed { image_url: Option<String> },
}
