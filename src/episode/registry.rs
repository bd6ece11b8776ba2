//! Registry of concurrently hosted episodes, keyed by [`EpisodeId`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{BridgeSettings, EpisodeId};
use crate::error::LifecycleError;
use crate::rules::EngineFactory;

use super::controller::EpisodeController;

/// Hosts any number of independent episodes sharing one engine factory.
pub struct EpisodeRegistry {
    factory: Arc<dyn EngineFactory>,
    settings: BridgeSettings,
    episodes: RwLock<FxHashMap<EpisodeId, Arc<EpisodeController>>>,
    next: AtomicU64,
}

impl EpisodeRegistry {
    pub fn new(factory: impl EngineFactory + 'static, settings: BridgeSettings) -> Self {
        Self {
            factory: Arc::new(factory),
            settings,
            episodes: RwLock::new(FxHashMap::default()),
            next: AtomicU64::new(1),
        }
    }

    /// Register a fresh controller. It plays nothing until reset.
    pub fn create(&self) -> Arc<EpisodeController> {
        let id = EpisodeId::new(self.next.fetch_add(1, Ordering::Relaxed));
        let controller = Arc::new(EpisodeController::with_factory(
            id,
            Arc::clone(&self.factory),
            self.settings.clone(),
        ));
        self.episodes.write().insert(id, Arc::clone(&controller));
        log::debug!("[registry] created episode {}", id);
        controller
    }

    pub fn get(&self, id: EpisodeId) -> Result<Arc<EpisodeController>, LifecycleError> {
        self.episodes
            .read()
            .get(&id)
            .cloned()
            .ok_or(LifecycleError::UnknownEpisode(id))
    }

    /// Remove an episode and tear it down.
    pub fn close(&self, id: EpisodeId) -> Result<(), LifecycleError> {
        let controller = self
            .episodes
            .write()
            .remove(&id)
            .ok_or(LifecycleError::UnknownEpisode(id))?;
        controller.close();
        log::debug!("[registry] closed episode {}", id);
        Ok(())
    }

    /// Tear down every episode.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.episodes.write().drain().map(|(_, c)| c).collect();
        for controller in drained {
            controller.close();
        }
    }

    /// Hosted ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EpisodeId> {
        let mut ids: Vec<_> = self.episodes.read().keys().copied().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.read().is_empty()
    }
}
