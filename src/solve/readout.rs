use crate::backend::absolute_url;
use crate::feed::CacheBuster;

use super::Solution;

/// Shown in coordinate readouts when no solution is on screen.
pub const COORD_PLACEHOLDER: &str = "--:--:--.-";
/// Shown in every other result readout when no solution is on screen.
pub const FIELD_PLACEHOLDER: &str = "--";
/// Served by the device as the failed-solve image when it has none of its own.
pub const BLACK_FRAME_PATH: &str = "/static/black_640x480.jpg";

/// Text the solve panel renders. Rebuilt from each status report and never used
/// to drive the solve lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveReadouts {
    solver_status: String,
    ra: String,
    dec: String,
    ra_hms: String,
    dec_dms: String,
    roll: String,
    solution_time: String,
    constellation: String,
    result_line: Option<String>,
    image_url: Option<String>,
}

impl Default for SolveReadouts {
    fn default() -> Self {
        Self {
            solver_status: "Idle".to_string(),
            ra: COORD_PLACEHOLDER.to_string(),
            dec: COORD_PLACEHOLDER.to_string(),
            ra_hms: COORD_PLACEHOLDER.to_string(),
            dec_dms: COORD_PLACEHOLDER.to_string(),
            roll: FIELD_PLACEHOLDER.to_string(),
            solution_time: FIELD_PLACEHOLDER.to_string(),
            constellation: FIELD_PLACEHOLDER.to_string(),
            result_line: None,
            image_url: None,
        }
    }
}

impl SolveReadouts {
    pub(super) fn set_solver_status(&mut self, status: impl Into<String>) {
        self.solver_status = status.into();
    }

    pub(super) fn show_solution(
        &mut self,
        solution: &Solution,
        base_url: &str,
        buster: &mut CacheBuster,
    ) {
        self.ra = or_placeholder(Some(&solution.ra), COORD_PLACEHOLDER);
        self.dec = or_placeholder(Some(&solution.dec), COORD_PLACEHOLDER);
        self.ra_hms = or_placeholder(solution.ra_hms.as_ref(), COORD_PLACEHOLDER);
        self.dec_dms = or_placeholder(solution.dec_dms.as_ref(), COORD_PLACEHOLDER);
        self.roll = or_placeholder(solution.roll.as_ref(), FIELD_PLACEHOLDER);
        self.solution_time = or_placeholder(solution.solution_time.as_ref(), FIELD_PLACEHOLDER);
        self.constellation = or_placeholder(solution.constellation.as_ref(), FIELD_PLACEHOLDER);
        self.result_line = Some(format!(
            "RA: {}, Dec: {}, Roll: {}, Solution Time: {} Constellation: {}",
            self.ra, self.dec, self.roll, self.solution_time, self.constellation
        ));
        self.image_url = solution
            .image_url
            .as_deref()
            .map(|url| buster.bust(&absolute_url(base_url, url)));
    }

    pub(super) fn show_failure(
        &mut self,
        image_url: Option<&str>,
        base_url: &str,
        buster: &mut CacheBuster,
    ) {
        let status = std::mem::take(&mut self.solver_status);
        *self = Self {
            solver_status: status,
            ..Self::default()
        };
        self.image_url = Some(match image_url {
            Some(url) => buster.bust(&absolute_url(base_url, url)),
            None => absolute_url(base_url, BLACK_FRAME_PATH),
        });
    }

    pub fn solver_status(&self) -> &str {
        &self.solver_status
    }

    pub fn ra(&self) -> &str {
        &self.ra
    }

    pub fn dec(&self) -> &str {
        &self.dec
    }

    pub fn ra_hms(&self) -> &str {
        &self.ra_hms
    }

    pub fn dec_dms(&self) -> &str {
        &self.dec_dms
    }

    pub fn roll(&self) -> &str {
        &self.roll
    }

    pub fn solution_time(&self) -> &str {
        &self.solution_time
    }

    pub fn constellation(&self) -> &str {
        &self.constellation
    }

    /// One-line summary of the last solution, `None` after a failure.
    pub fn result_line(&self) -> Option<&str> {
        self.result_line.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

fn or_placeholder(value: Option<&String>, placeholder: &str) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.clone(),
        _ => placeholder.to_string(),
    }
}
