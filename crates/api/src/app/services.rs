use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use sensorcast_core::{ForecastResult, Reading, Tag};
use sensorcast_forecast::{ForecastRequest, PredictionCommand, Summary, leading, summarize};
use sensorcast_infra::{
    AppConfig, CachedModelLoader, FileModelLoader, ForecastEngine, ForecastRun, HistoryBackend, HistorySource,
    InMemoryHistorySource, ModelLoader, PostgresHistorySource,
};

/// Application services shared by all handlers.
pub struct AppServices {
    engine: ForecastEngine,
}

/// Result of answering a prediction command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub run: ForecastRun,
    pub command: PredictionCommand,
    pub tags: Vec<Tag>,
    pub summary: Summary,
}

impl AppServices {
    pub fn new(engine: ForecastEngine) -> Self {
        Self { engine }
    }

    pub async fn forecast(&self, request: &ForecastRequest) -> ForecastResult<ForecastRun> {
        self.engine.forecast(request).await
    }

    /// Forecast slice plus a summary of the selected tags.
    pub async fn forecast_summary(&self, request: &ForecastRequest) -> ForecastResult<(ForecastRun, Summary)> {
        let run = self.engine.forecast(request).await?;
        let summary = summarize(&run.records, &request.selected_tags());
        Ok((run, summary))
    }

    /// Parse `command`, pick tags from `question`, forecast and summarize.
    ///
    /// A question that names no tag summarizes every tag.
    pub async fn answer_command(&self, question: &str, command: &str) -> ForecastResult<CommandOutcome> {
        let command = PredictionCommand::parse(command)?;
        let mut tags = Tag::mentioned_in(question);
        if tags.is_empty() {
            tags = Tag::ALL.to_vec();
        }

        let names = tags.iter().map(|t| t.as_str().to_string()).collect();
        let mut run = self.engine.forecast(&command.to_request(Some(names))).await?;
        if let Some(horizon) = command.leading_horizon() {
            run.records = leading(std::mem::take(&mut run.records), run.last_observed, horizon);
        }

        let summary = summarize(&run.records, &tags);
        info!(run_id = %run.run_id, command = %command, records = run.records.len(), "command answered");
        Ok(CommandOutcome {
            run,
            command,
            tags,
            summary,
        })
    }

    pub async fn history(
        &self,
        tags: &[Tag],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ForecastResult<Vec<Reading>> {
        self.engine.history(tags, start, end).await
    }
}

/// Wire history storage, model loading and the engine from configuration.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let history: Arc<dyn HistorySource> = match &config.history {
        HistoryBackend::Postgres { database_url, table } => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            info!(table = %table, "using postgres history");
            Arc::new(PostgresHistorySource::new(pool, table.clone())?)
        }
        HistoryBackend::InMemory { seed_file: Some(path) } => {
            let source = InMemoryHistorySource::from_json_file(path)?;
            info!(path = %path.display(), readings = source.len(), "using in-memory history seeded from file");
            Arc::new(source)
        }
        HistoryBackend::InMemory { seed_file: None } => {
            warn!("DATABASE_URL not set; using empty in-memory history");
            Arc::new(InMemoryHistorySource::new())
        }
    };

    let loader: Arc<dyn ModelLoader> = if config.model_cache {
        Arc::new(CachedModelLoader::new(FileModelLoader::new(config.horizon)))
    } else {
        Arc::new(FileModelLoader::new(config.horizon))
    };

    let engine = ForecastEngine::new(history, loader, config.model_path.clone(), config.horizon)
        .with_deadline(config.request_timeout);
    Ok(AppServices::new(engine))
}
