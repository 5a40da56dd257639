//! Model artifact loading.
//!
//! By default every forecast reads the artifact from disk again, so a replaced
//! file takes effect on the next call. [`CachedModelLoader`] keeps optimized
//! models in memory instead, keyed by path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::debug;

use sensorcast_core::{ForecastError, ForecastResult, HorizonConfig};
use sensorcast_forecast::{SequenceModel, load_model};

/// Produces a ready-to-run model for an artifact path.
///
/// Loading is blocking file IO plus validation; the engine calls it from a
/// blocking worker thread.
pub trait ModelLoader: Send + Sync + 'static {
    fn load(&self, path: &Path) -> ForecastResult<Arc<dyn SequenceModel>>;
}

/// Reads and validates the artifact on every call.
#[derive(Debug, Clone, Copy)]
pub struct FileModelLoader {
    horizon: HorizonConfig,
}

impl FileModelLoader {
    pub fn new(horizon: HorizonConfig) -> Self {
        Self { horizon }
    }
}

impl ModelLoader for FileModelLoader {
    fn load(&self, path: &Path) -> ForecastResult<Arc<dyn SequenceModel>> {
        let model = load_model(path, &self.horizon)?;
        debug!(path = %path.display(), "onnx model loaded");
        Ok(Arc::new(model))
    }
}

/// Shares loaded models read-only across forecasts.
///
/// Failed loads are not cached.
pub struct CachedModelLoader<L = FileModelLoader> {
    inner: L,
    models: RwLock<HashMap<PathBuf, Arc<dyn SequenceModel>>>,
}

impl<L: ModelLoader> CachedModelLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every cached model (e.g. after deploying a new artifact).
    pub fn invalidate(&self) {
        if let Ok(mut models) = self.models.write() {
            models.clear();
        }
    }

    pub fn cached_len(&self) -> usize {
        self.models.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl<L: ModelLoader> ModelLoader for CachedModelLoader<L> {
    fn load(&self, path: &Path) -> ForecastResult<Arc<dyn SequenceModel>> {
        {
            let models = self
                .models
                .read()
                .map_err(|_| ForecastError::model_load("model cache lock poisoned"))?;
            if let Some(model) = models.get(path) {
                return Ok(Arc::clone(model));
            }
        }

        let model = self.inner.load(path)?;
        let mut models = self
            .models
            .write()
            .map_err(|_| ForecastError::model_load("model cache lock poisoned"))?;
        let entry = models.entry(path.to_path_buf()).or_insert(model);
        Ok(Arc::clone(entry))
    }
}
