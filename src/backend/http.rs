use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use super::{
    absolute_url, BackendError, FpsReading, SolveBackend, StartAck, StatusPayload, SystemStats,
    SNAPSHOT_PATH, SOLVE_PATH, SOLVE_STATUS_PATH, SYSTEM_STATS_PATH,
};
use crate::solve::{DisplayMode, SolveResult};

const USER_AGENT: &str = concat!("solvecam/", env!("CARGO_PKG_VERSION"));

/// Camera service reached over HTTP.
///
/// Solve calls use a client without any request timeout: a solve that never
/// answers keeps the orchestrator busy instead of being cut short. Frame, FPS,
/// stats and snapshot calls use the configured media timeout.
pub struct HttpBackend {
    base_url: String,
    solve_client: Client,
    media_client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, media_timeout: Duration) -> Result<Self> {
        let solve_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Option::<Duration>::None)
            .build()
            .context("failed to build solve HTTP client")?;
        let media_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(media_timeout)
            .build()
            .context("failed to build media HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            solve_client,
            media_client,
        })
    }

    fn url(&self, path: &str) -> String {
        absolute_url(&self.base_url, path)
    }
}

impl SolveBackend for HttpBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn begin_solve(&self) -> Result<StartAck, BackendError> {
        let response = self
            .solve_client
            .post(self.url(SOLVE_PATH))
            .send()
            .map_err(transport_error)?;
        // The service answers rejections with a JSON body and an error status,
        // so the body is read whatever the HTTP status is.
        decode_json(response)
    }

    fn solve_status(&self) -> Result<SolveResult, BackendError> {
        let response = self
            .solve_client
            .get(self.url(SOLVE_STATUS_PATH))
            .send()
            .map_err(transport_error)?;
        decode_json::<StatusPayload>(response).map(StatusPayload::into_result)
    }

    fn frame(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        let response = self.media_client.get(url).send().map_err(transport_error)?;
        read_bytes(response)
    }

    fn fps(&self, mode: DisplayMode) -> Result<f64, BackendError> {
        let response = self
            .media_client
            .get(self.url(mode.fps_path()))
            .send()
            .map_err(transport_error)?;
        let response = require_success(response)?;
        decode_json::<FpsReading>(response).map(|reading| reading.fps)
    }

    fn system_stats(&self) -> Result<SystemStats, BackendError> {
        let response = self
            .media_client
            .get(self.url(SYSTEM_STATS_PATH))
            .send()
            .map_err(transport_error)?;
        decode_json(require_success(response)?)
    }

    fn snapshot(&self) -> Result<Vec<u8>, BackendError> {
        let response = self
            .media_client
            .get(self.url(SNAPSHOT_PATH))
            .send()
            .map_err(transport_error)?;
        read_bytes(response)
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

fn require_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BackendError::Status(status.as_u16()))
    }
}

fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response.bytes().map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|err| BackendError::Decode(err.to_string()))
}

fn read_bytes(response: Response) -> Result<Vec<u8>, BackendError> {
    let response = require_success(response)?;
    response
        .bytes()
        .map(|bytes| bytes.to_vec())
        .map_err(transport_error)
}
