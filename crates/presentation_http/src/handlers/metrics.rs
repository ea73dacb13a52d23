//! Metrics handler
//!
//! JSON counters for webhooks, emitted directives, the synthesis cache and
//! live sessions.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use application::TurnResponse;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Metrics response containing all application metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub app: AppMetrics,
    pub webhooks: WebhookMetrics,
    pub actions: ActionMetrics,
    pub clips: ClipMetrics,
    pub sessions: SessionMetrics,
}

/// Application metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetrics {
    pub version: String,
    pub name: String,
    pub uptime_seconds: u64,
}

/// Inbound provider callbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMetrics {
    pub total: u64,
    /// Failed the secret or signature check
    pub rejected: u64,
    /// Answered with a previously emitted directive
    pub replayed: u64,
    /// Answered with fallback text or provider speech
    pub degraded: u64,
    pub status_callbacks: u64,
}

/// Directives by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMetrics {
    pub prompt: u64,
    pub reprompt: u64,
    #[serde(rename = "continue")]
    pub continued: u64,
    pub terminate: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipMetrics {
    pub held: usize,
    pub registered: u64,
    pub served: u64,
    pub evicted: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub active: u64,
}

/// Atomic counters for webhook traffic
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    webhooks: AtomicU64,
    rejected: AtomicU64,
    replayed: AtomicU64,
    degraded: AtomicU64,
    status_callbacks: AtomicU64,
    prompts: AtomicU64,
    reprompts: AtomicU64,
    continues: AtomicU64,
    terminates: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            webhooks: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            replayed: AtomicU64::new(0),
            degraded: AtomicU64::new(0),
            status_callbacks: AtomicU64::new(0),
            prompts: AtomicU64::new(0),
            reprompts: AtomicU64::new(0),
            continues: AtomicU64::new(0),
            terminates: AtomicU64::new(0),
        }
    }

    /// Record an inbound webhook before authentication
    pub fn webhook_received(&self) {
        self.webhooks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn webhook_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn status_callback(&self) {
        self.status_callbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the directive sent back for a webhook
    pub fn record_turn(&self, response: &TurnResponse) {
        if response.replayed {
            self.replayed.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if response.degraded {
            self.degraded.fetch_add(1, Ordering::Relaxed);
        }

        let counter = match response.action.kind() {
            "prompt" => &self.prompts,
            "reprompt" => &self.reprompts,
            "continue" => &self.continues,
            _ => &self.terminates,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    #[must_use]
    pub fn webhook_metrics(&self) -> WebhookMetrics {
        WebhookMetrics {
            total: self.webhooks.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            replayed: self.replayed.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            status_callbacks: self.status_callbacks.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn action_metrics(&self) -> ActionMetrics {
        ActionMetrics {
            prompt: self.prompts.load(Ordering::Relaxed),
            reprompt: self.reprompts.load(Ordering::Relaxed),
            continued: self.continues.load(Ordering::Relaxed),
            terminate: self.terminates.load(Ordering::Relaxed),
        }
    }
}

/// Get metrics endpoint
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = state.metrics.as_ref();
    let clips = state.clips.stats();

    Json(MetricsResponse {
        app: AppMetrics {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            uptime_seconds: metrics.uptime_seconds(),
        },
        webhooks: metrics.webhook_metrics(),
        actions: metrics.action_metrics(),
        clips: ClipMetrics {
            held: clips.held,
            registered: clips.registered,
            served: clips.served,
            evicted: clips.evicted,
            misses: clips.misses,
        },
        sessions: SessionMetrics {
            active: state.controller.active_sessions(),
        },
    })
}

#[cfg(test)]
mod tests {
    use domain::{CallSid, ClipId, NextAction, TerminationReason, Utterance};

    use super::*;

    fn response(action: NextAction, replayed: bool, degraded: bool) -> TurnResponse {
        TurnResponse {
            call_sid: CallSid::new("CA1").unwrap(),
            action,
            sequence: 1,
            replayed,
            degraded,
        }
    }

    #[test]
    fn collector_starts_at_zero() {
        let collector = MetricsCollector::default();
        let webhooks = collector.webhook_metrics();
        assert_eq!(webhooks.total, 0);
        assert_eq!(webhooks.rejected, 0);
        assert_eq!(collector.action_metrics().prompt, 0);
    }

    #[test]
    fn turns_are_counted_by_kind() {
        let collector = MetricsCollector::new();
        collector.record_turn(&response(
            NextAction::Prompt {
                text: "Hi".to_string(),
            },
            false,
            false,
        ));
        collector.record_turn(&response(
            NextAction::Continue {
                reply: "Sure".to_string(),
                utterance: Utterance::Clip(ClipId::new()),
            },
            false,
            false,
        ));
        collector.record_turn(&response(
            NextAction::Terminate {
                reason: TerminationReason::NoSpeechDetected,
                reply: None,
                farewell: Utterance::Text("Bye".to_string()),
            },
            false,
            true,
        ));

        let actions = collector.action_metrics();
        assert_eq!(actions.prompt, 1);
        assert_eq!(actions.continued, 1);
        assert_eq!(actions.terminate, 1);
        assert_eq!(actions.reprompt, 0);
        assert_eq!(collector.webhook_metrics().degraded, 1);
    }

    #[test]
    fn replays_are_not_counted_as_actions() {
        let collector = MetricsCollector::new();
        collector.record_turn(&response(
            NextAction::Reprompt {
                text: "Sorry?".to_string(),
            },
            true,
            false,
        ));
        assert_eq!(collector.webhook_metrics().replayed, 1);
        assert_eq!(collector.action_metrics().reprompt, 0);
    }

    #[test]
    fn continue_serializes_under_its_kind() {
        let collector = MetricsCollector::new();
        let json = serde_json::to_value(collector.action_metrics()).unwrap();
        assert_eq!(json["continue"], 0);
    }

    #[test]
    fn webhook_counters_increment() {
        let collector = MetricsCollector::new();
        collector.webhook_received();
        collector.webhook_received();
        collector.webhook_rejected();
        collector.status_callback();
        let webhooks = collector.webhook_metrics();
        assert_eq!(webhooks.total, 2);
        assert_eq!(webhooks.rejected, 1);
        assert_eq!(webhooks.status_callbacks, 1);
    }
}
