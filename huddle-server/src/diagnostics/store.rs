use chrono::{DateTime, Duration, Utc};
use huddle_core::DiagnosticRecord;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_RETENTION_HOURS: i64 = 2;
pub const DEFAULT_QUERY_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub session_id: String,
    pub timestamp: String,
    pub server_timestamp: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
    pub url: String,
    pub event_type: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ice_config: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsPage {
    pub count: usize,
    pub total_stored: usize,
    pub events: Vec<StoredEvent>,
}

/// In-memory ring of client diagnostics, pruned by age.
#[derive(Clone)]
pub struct DiagnosticsStore {
    events: Arc<Mutex<VecDeque<StoredEvent>>>,
    retention: Duration,
}

impl Default for DiagnosticsStore {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_RETENTION_HOURS))
    }
}

impl DiagnosticsStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            retention,
        }
    }

    pub async fn push(&self, record: DiagnosticRecord, client_ip: String) -> StoredEvent {
        self.push_at(record, client_ip, Utc::now()).await
    }

    pub async fn push_at(
        &self,
        record: DiagnosticRecord,
        client_ip: String,
        now: DateTime<Utc>,
    ) -> StoredEvent {
        let or_unknown = |value: Option<String>| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "unknown".to_owned())
        };

        let stored = StoredEvent {
            session_id: or_unknown(record.session_id),
            timestamp: record.timestamp.unwrap_or_else(|| now.to_rfc3339()),
            server_timestamp: now,
            client_ip,
            user_agent: or_unknown(record.user_agent),
            url: record.url.unwrap_or_default(),
            event_type: or_unknown(Some(record.event.kind)),
            details: record.event.detail,
            error: record.event.error,
            ice_config: record.event.profile,
        };

        let mut events = self.events.lock().await;
        events.push_back(stored.clone());
        Self::prune(&mut events, now - self.retention);
        stored
    }

    pub async fn query(&self, event_type: Option<&str>, limit: usize) -> DiagnosticsPage {
        self.query_at(event_type, limit, Utc::now()).await
    }

    pub async fn query_at(
        &self,
        event_type: Option<&str>,
        limit: usize,
        now: DateTime<Utc>,
    ) -> DiagnosticsPage {
        let mut events = self.events.lock().await;
        Self::prune(&mut events, now - self.retention);

        let filtered: Vec<StoredEvent> = events
            .iter()
            .filter(|e| event_type.is_none_or(|t| e.event_type == t))
            .cloned()
            .collect();
        let skip = filtered.len().saturating_sub(limit);
        let events_page: Vec<StoredEvent> = filtered.into_iter().skip(skip).collect();

        DiagnosticsPage {
            count: events_page.len(),
            total_stored: events.len(),
            events: events_page,
        }
    }

    fn prune(events: &mut VecDeque<StoredEvent>, cutoff: DateTime<Utc>) {
        while events
            .front()
            .is_some_and(|oldest| oldest.server_timestamp < cutoff)
        {
            events.pop_front();
        }
    }
}
