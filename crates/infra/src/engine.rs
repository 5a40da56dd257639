//! Forecast Engine orchestration.
//!
//! One forecast is a sequential chain: load the model (blocking worker),
//! fetch the full history (async IO), run the job (blocking worker), then
//! slice the result for the caller. Any failure aborts the chain; nothing is
//! retried.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use sensorcast_core::{Cancellation, ForecastError, ForecastResult, HorizonConfig, Reading, RunId, Tag};
use sensorcast_forecast::{ForecastJob, ForecastRecord, ForecastRequest};

use crate::history::HistorySource;
use crate::model_store::ModelLoader;

/// Output of one engine run, already filtered to the caller's request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRun {
    pub run_id: RunId,
    /// Last historical timestamp the forecast grid starts after.
    pub last_observed: DateTime<Utc>,
    pub records: Vec<ForecastRecord>,
}

pub struct ForecastEngine {
    history: Arc<dyn HistorySource>,
    models: Arc<dyn ModelLoader>,
    model_path: PathBuf,
    horizon: HorizonConfig,
    deadline: Option<Duration>,
}

impl ForecastEngine {
    pub fn new(
        history: Arc<dyn HistorySource>,
        models: Arc<dyn ModelLoader>,
        model_path: impl Into<PathBuf>,
        horizon: HorizonConfig,
    ) -> Self {
        Self {
            history,
            models,
            model_path: model_path.into(),
            horizon,
            deadline: None,
        }
    }

    /// Bound every [`ForecastEngine::forecast`] call by `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn horizon(&self) -> &HorizonConfig {
        &self.horizon
    }

    /// Produce a forecast and slice it per `request`.
    pub async fn forecast(&self, request: &ForecastRequest) -> ForecastResult<ForecastRun> {
        match self.deadline {
            Some(deadline) => self.forecast_with_deadline(request, deadline).await,
            None => self.run(RunId::new(), request, Cancellation::new()).await,
        }
    }

    /// Like [`ForecastEngine::forecast`], failing with
    /// [`ForecastError::DeadlineExceeded`] once `deadline` elapses.
    ///
    /// A pending history fetch is dropped; a running inference observes the
    /// cancellation flag at its next time step.
    pub async fn forecast_with_deadline(
        &self,
        request: &ForecastRequest,
        deadline: Duration,
    ) -> ForecastResult<ForecastRun> {
        let run_id = RunId::new();
        let cancel = Cancellation::new();
        match tokio::time::timeout(deadline, self.run(run_id, request, cancel.clone())).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                warn!(run_id = %run_id, deadline_ms = deadline.as_millis() as u64, "forecast deadline exceeded");
                Err(ForecastError::DeadlineExceeded)
            }
        }
    }

    /// Historical readings of `tags` within `[start, end]`.
    #[instrument(skip(self), err)]
    pub async fn history(
        &self,
        tags: &[Tag],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ForecastResult<Vec<Reading>> {
        if start > end {
            return Err(ForecastError::invalid_request(format!(
                "start {start} is after end {end}"
            )));
        }
        self.history.readings_between(tags, start, end).await
    }

    #[instrument(
        skip(self, request, cancel),
        fields(run_id = %run_id, model = %self.model_path.display()),
        err
    )]
    async fn run(
        &self,
        run_id: RunId,
        request: &ForecastRequest,
        cancel: Cancellation,
    ) -> ForecastResult<ForecastRun> {
        let started = Instant::now();

        let loader = Arc::clone(&self.models);
        let path = self.model_path.clone();
        let model = tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| ForecastError::model_load(format!("model loading task failed: {e}")))??;

        let history = self.history.fetch_history(&Tag::ALL).await?;
        let readings = history.len();

        let job = ForecastJob::new(self.horizon, model, history).with_cancellation(cancel);
        let forecast = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| ForecastError::inference(format!("inference task failed: {e}")))??;

        let records = request.apply(&forecast.records);
        info!(
            readings,
            horizon = forecast.records.len(),
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forecast completed"
        );

        Ok(ForecastRun {
            run_id,
            last_observed: forecast.last_observed,
            records,
        })
    }
}
