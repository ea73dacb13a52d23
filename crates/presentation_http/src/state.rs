//! Application state shared across handlers

use std::{fmt, sync::Arc};

use application::{ClipStorePort, TurnController};
use infrastructure::TelephonyConfig;

use crate::handlers::metrics::MetricsCollector;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Turn state machine for every live call
    pub controller: Arc<TurnController>,
    /// Synthesized clips served on `/audio/{clip_id}`
    pub clips: Arc<dyn ClipStorePort>,
    /// Webhook secret, signature settings and public URL
    pub telephony: Arc<TelephonyConfig>,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(
        controller: TurnController,
        clips: Arc<dyn ClipStorePort>,
        telephony: TelephonyConfig,
    ) -> Self {
        Self {
            controller: Arc::new(controller),
            clips,
            telephony: Arc::new(telephony),
            metrics: Arc::new(MetricsCollector::new()),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("controller", &self.controller)
            .field("telephony", &self.telephony)
            .finish_non_exhaustive()
    }
}
