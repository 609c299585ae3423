use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::publisher::{PagesSite, Publisher, RemoteStore};
use crate::render::QrRenderer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub renderer: Arc<QrRenderer>,
    pub publisher: Arc<Publisher>,
    pub metrics: Arc<Metrics>,
    /// Label of the backing store, reported by `/health`
    pub store_kind: &'static str,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RemoteStore>, store_kind: &'static str) -> Self {
        let renderer = QrRenderer::new(config.qr.clone());
        let publisher = Publisher::new(store, PagesSite::from(&config.github));

        Self {
            config: Arc::new(config),
            renderer: Arc::new(renderer),
            publisher: Arc::new(publisher),
            metrics: Arc::new(Metrics::new()),
            store_kind,
        }
    }
}
