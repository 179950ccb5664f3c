use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{config::Config, error::RuntimeError, subscribers::Subscribe};

use super::engine::QueueEngine;

/// Builder for constructing a [`QueueEngine`].
pub struct EngineBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
}

impl EngineBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            runtime: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive request lifecycle events through dedicated workers
    /// with bounded queues, once [`QueueEngine::init`] has run.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Runtime executors, wait timers and the ticker are spawned on.
    ///
    /// Defaults to the runtime `build` is called from.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the engine.
    ///
    /// Types listed in the config are registered up front; everything else
    /// follows the unknown-type policy at submission time.
    pub fn build(self) -> Result<Arc<QueueEngine>, RuntimeError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?,
        };
        Ok(Arc::new(QueueEngine::new_internal(
            self.cfg,
            self.subscribers,
            runtime,
        )))
    }
}
