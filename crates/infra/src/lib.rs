//! Infrastructure layer: history storage, model loading, configuration and
//! the Forecast Engine that wires them to the pipeline.

pub mod config;
pub mod engine;
pub mod history;
pub mod model_store;

pub use config::{AppConfig, ConfigError, HistoryBackend};
pub use engine::{ForecastEngine, ForecastRun};
pub use history::{HistorySource, InMemoryHistorySource, PostgresHistorySource};
pub use model_store::{CachedModelLoader, FileModelLoader, ModelLoader};
