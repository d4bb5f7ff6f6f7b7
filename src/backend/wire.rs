//! JSON bodies exchanged with the camera service.

use serde::Deserialize;
use serde_json::Value;

use crate::solve::{SolveResult, Solution};

const STATUS_SOLVING: &str = "solving";
const STATUS_UNKNOWN: &str = "unknown";
const STATUS_SOLVED: &str = "solved";
const STATUS_FAILED: &str = "failed";

/// Reply to `POST /solve`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StartAck {
    #[serde(default)]
    pub status: String,
}

impl StartAck {
    /// Only an explicit `solving` means the backend took the request.
    pub fn accepted(&self) -> bool {
        self.status == STATUS_SOLVING
    }
}

/// Reply to `GET /solve_status`. Numeric fields arrive as numbers or strings
/// depending on the service build, so they are kept loose until rendering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ra: Option<Value>,
    #[serde(default)]
    pub dec: Option<Value>,
    #[serde(default)]
    pub ra_hms: Option<String>,
    #[serde(default)]
    pub dec_dms: Option<String>,
    #[serde(default)]
    pub roll: Option<Value>,
    #[serde(default)]
    pub solution_time: Option<Value>,
    #[serde(default)]
    pub constellation: Option<String>,
    #[serde(default)]
    pub solved_image_url: Option<String>,
}

impl StatusPayload {
    pub fn into_result(self) -> SolveResult {
        match self.status.as_str() {
            STATUS_SOLVED => SolveResult::Solved(Solution {
                ra: value_text(self.ra.as_ref()).unwrap_or_default(),
                dec: value_text(self.dec.as_ref()).unwrap_or_default(),
                ra_hms: non_empty(self.ra_hms),
                dec_dms: non_empty(self.dec_dms),
                roll: value_text(self.roll.as_ref()),
                solution_time: value_text(self.solution_time.as_ref()),
                constellation: non_empty(self.constellation),
                image_url: non_empty(self.solved_image_url),
            }),
            STATUS_FAILED => SolveResult::Failed {
                image_url: non_empty(self.solved_image_url),
            },
            // Anything else, `solving` included, keeps the attempt polling.
            other => SolveResult::Solving {
                status: non_empty(Some(other.to_string()))
                    .unwrap_or_else(|| STATUS_UNKNOWN.to_string()),
            },
        }
    }
}

/// Reply to the live and solved FPS endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FpsReading {
    pub fps: f64,
}

/// Reply to `GET /system-stats`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    cpu_temp: Option<Value>,
    #[serde(default)]
    cpu_load: Option<Value>,
}

impl SystemStats {
    pub fn new(cpu_temp: impl Into<String>, cpu_load: impl Into<String>) -> Self {
        Self {
            cpu_temp: Some(Value::String(cpu_temp.into())),
            cpu_load: Some(Value::String(cpu_load.into())),
        }
    }

    pub fn cpu_temp(&self) -> String {
        value_text(self.cpu_temp.as_ref()).unwrap_or_else(|| "--".to_string())
    }

    pub fn cpu_load(&self) -> String {
        value_text(self.cpu_load.as_ref()).unwrap_or_else(|| "--".to_string())
    }
}

/// Render a loose JSON scalar the way the service meant it to be read.
fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => non_empty(Some(text.trim().to_string())),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
