use std::sync::Arc;
use std::time::Duration;

use chronicle_core::DisplayNameResolver;
use chronicle_store::entity::EntityStore;
use chronicle_store::store::RecordStore;

use crate::error::EngineError;
use crate::history::HistoryFeed;
use crate::normalize::SchemaNormalizer;
use crate::recorder::ActivityRecorder;
use crate::restore::{DEFAULT_STEP_TIMEOUT, RestorationEngine};

/// The assembled engine: recorder, history feed, and restoration, sharing
/// one pair of stores and one set of domain rules.
pub struct Chronicle {
    recorder: ActivityRecorder,
    history: HistoryFeed,
    restorer: RestorationEngine,
}

impl std::fmt::Debug for Chronicle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chronicle").finish_non_exhaustive()
    }
}

impl Chronicle {
    /// Start building an engine.
    #[must_use]
    pub fn builder() -> ChronicleBuilder {
        ChronicleBuilder::new()
    }

    /// The fire-and-forget write path.
    #[must_use]
    pub fn recorder(&self) -> &ActivityRecorder {
        &self.recorder
    }

    /// The read path.
    #[must_use]
    pub fn history(&self) -> &HistoryFeed {
        &self.history
    }

    /// The rollback path.
    #[must_use]
    pub fn restorer(&self) -> &RestorationEngine {
        &self.restorer
    }

    /// Drain in-flight record writes. Call once during service shutdown.
    pub async fn shutdown(&self) {
        self.recorder.shutdown().await;
    }
}

/// Fluent builder for constructing a [`Chronicle`] instance.
///
/// A [`RecordStore`] and an [`EntityStore`] must be supplied; display
/// rules, schema migrations, and the restore step timeout have defaults.
pub struct ChronicleBuilder {
    records: Option<Arc<dyn RecordStore>>,
    entities: Option<Arc<dyn EntityStore>>,
    display: Option<DisplayNameResolver>,
    normalizer: Option<SchemaNormalizer>,
    step_timeout: Duration,
}

impl ChronicleBuilder {
    /// Create a new builder with all optional fields at their defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: None,
            entities: None,
            display: None,
            normalizer: None,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Set the record store (required).
    #[must_use]
    pub fn record_store(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    /// Set the entity store (required).
    #[must_use]
    pub fn entity_store(mut self, entities: Arc<dyn EntityStore>) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Replace the default display-name rules.
    #[must_use]
    pub fn display_resolver(mut self, display: DisplayNameResolver) -> Self {
        self.display = Some(display);
        self
    }

    /// Replace the default schema-migration table.
    #[must_use]
    pub fn schema_normalizer(mut self, normalizer: SchemaNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Bound each store call within a restoration attempt.
    #[must_use]
    pub fn restore_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Assemble the engine.
    pub fn build(self) -> Result<Chronicle, EngineError> {
        let records = self
            .records
            .ok_or_else(|| EngineError::Configuration("a record store is required".to_owned()))?;
        let entities = self
            .entities
            .ok_or_else(|| EngineError::Configuration("an entity store is required".to_owned()))?;

        let display = Arc::new(self.display.unwrap_or_else(DisplayNameResolver::with_defaults));
        let normalizer = Arc::new(self.normalizer.unwrap_or_else(SchemaNormalizer::with_defaults));

        let recorder =
            ActivityRecorder::with_resolver(Arc::clone(&records), Arc::clone(&display));
        let history = HistoryFeed::new(Arc::clone(&records));
        let restorer = RestorationEngine::new(records, entities)
            .with_normalizer(normalizer)
            .with_resolver(display)
            .with_step_timeout(self.step_timeout);

        Ok(Chronicle {
            recorder,
            history,
            restorer,
        })
    }
}

impl Default for ChronicleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
