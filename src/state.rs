use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::services::{BroadcastHub, ClassroomService, KeepaliveConfig, MemoryStore, SnapshotFanout};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    keepalive: KeepaliveConfig,
    service: Arc<ClassroomService>,
    hub: Arc<dyn SnapshotFanout>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new(config.max_history));
        let hub: Arc<dyn SnapshotFanout> =
            Arc::new(BroadcastHub::new(store.clone(), config.queue_capacity));
        let service = Arc::new(ClassroomService::new(
            config.analysis.clone(),
            store,
            Arc::clone(&hub),
        ));

        Self {
            started_at: Instant::now(),
            keepalive: config.keepalive(),
            service,
            hub,
        }
    }

    pub fn service(&self) -> &ClassroomService {
        &self.service
    }

    pub fn hub(&self) -> Arc<dyn SnapshotFanout> {
        Arc::clone(&self.hub)
    }

    pub fn keepalive(&self) -> KeepaliveConfig {
        self.keepalive
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
