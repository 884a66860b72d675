//! The in-process stand-in for an HTTP client transport.
//!
//! `request` sleeps for a jittered latency, then dispatches synchronously
//! under one lock. Nothing holds the lock across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use loopback_auth::TokenService;
use loopback_core::{ApiRequest, Rejection, RequestDescriptor, ResponseEnvelope};
use loopback_store::{FileStorage, MemoryStorage, Repository, StorageBackend, StoreSnapshot};
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::dispatcher::Dispatcher;

/// Async seam client code is written against.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<ResponseEnvelope, Rejection>;
}

pub struct Adapter {
    dispatcher: Mutex<Dispatcher>,
    latency: (Duration, Duration),
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Load (or seed) the store behind `storage` and build the route table.
    pub fn init(config: SimConfig, storage: Arc<dyn StorageBackend>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(config.tokens.clone())?;
        let repo = Repository::open(storage, config.storage_key.clone());
        let latency = (config.latency_min, config.latency_max.max(config.latency_min));
        let dispatcher = Dispatcher::new(config, repo, tokens)?;
        info!(
            min = %humantime::format_duration(latency.0),
            max = %humantime::format_duration(latency.1),
            "adapter initialized"
        );
        Ok(Self {
            dispatcher: Mutex::new(dispatcher),
            latency,
        })
    }

    /// File-backed storage when `storage.dir` is set, memory otherwise.
    pub fn from_config(config: SimConfig) -> anyhow::Result<Self> {
        let storage: Arc<dyn StorageBackend> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir.clone())),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::init(config, storage)
    }

    fn sample_latency(&self) -> Duration {
        let (min, max) = self.latency;
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    /// Simulate one HTTP call. Statuses of 400 and above reject.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<ResponseEnvelope, Rejection> {
        let delay = self.sample_latency();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = match ApiRequest::from_descriptor(descriptor) {
            Ok(request) => self.dispatcher.lock().dispatch(&request),
            Err(e) => ResponseEnvelope::new(e.status(), e.to_body()),
        };
        debug!(status = response.status, delay_ms = delay.as_millis() as u64, "request settled");

        if response.is_error() {
            Err(response.into_rejection())
        } else {
            Ok(response)
        }
    }

    /// Replace the store contents with the seeded dataset.
    pub fn reset(&self) {
        self.dispatcher.lock().reset();
    }

    pub fn shutdown(&self) {
        self.dispatcher.lock().shutdown();
    }

    pub fn dump(&self) -> StoreSnapshot {
        self.dispatcher.lock().dump()
    }

    pub fn config(&self) -> SimConfig {
        self.dispatcher.lock().config().clone()
    }
}

#[async_trait]
impl Transport for Adapter {
    async fn send(&self, request: RequestDescriptor) -> Result<ResponseEnvelope, Rejection> {
        self.request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_stays_inside_the_window() {
        let config = SimConfig::default()
            .with_latency(Duration::from_millis(5), Duration::from_millis(9));
        let adapter = Adapter::from_config(config).unwrap();
        for _ in 0..50 {
            let d = adapter.sample_latency();
            assert!(d >= Duration::from_millis(5) && d <= Duration::from_millis(9));
        }
    }

    #[test]
    fn zero_window_means_no_delay() {
        let adapter = Adapter::from_config(SimConfig::default().without_latency()).unwrap();
        assert_eq!(adapter.sample_latency(), Duration::ZERO);
    }
}
