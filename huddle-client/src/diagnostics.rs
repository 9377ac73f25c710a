use chrono::Utc;
use huddle_core::{DiagnosticEvent, DiagnosticRecord};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Fire-and-forget observability sink. Must never block or fail the caller.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, event: DiagnosticEvent);
}

/// Writes every event to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&self, event: DiagnosticEvent) {
        match (&event.error, &event.profile) {
            (Some(error), _) => info!("[{}] {} ({})", event.kind, event.detail, error),
            (None, Some(profile)) => info!("[{}] {} [{}]", event.kind, event.detail, profile),
            (None, None) => info!("[{}] {}", event.kind, event.detail),
        }
    }
}

/// Posts events to the relay's diagnostics collector.
#[derive(Debug, Clone)]
pub struct HttpDiagnosticsSink {
    http: reqwest::Client,
    endpoint: String,
    origin: Option<String>,
    session_id: String,
}

impl HttpDiagnosticsSink {
    pub fn new(endpoint: impl Into<String>, origin: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            http,
            endpoint: endpoint.into(),
            origin,
            session_id: format!(
                "{}-{}",
                Utc::now().timestamp_millis(),
                Uuid::new_v4().simple()
            ),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn record(&self, event: DiagnosticEvent) -> DiagnosticRecord {
        DiagnosticRecord {
            session_id: Some(self.session_id.clone()),
            timestamp: Some(Utc::now().to_rfc3339()),
            user_agent: Some(format!("huddle/{}", env!("CARGO_PKG_VERSION"))),
            url: self.origin.clone(),
            event,
        }
    }
}

impl DiagnosticsSink for HttpDiagnosticsSink {
    fn report(&self, event: DiagnosticEvent) {
        // Outside a runtime there is nowhere to send from; drop silently.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let record = self.record(event);
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        runtime.spawn(async move {
            if let Err(e) = http.post(&endpoint).json(&record).send().await {
                debug!("Diagnostics post failed: {}", e);
            }
        });
    }
}

/// Forwards each event to every inner sink.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn DiagnosticsSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn DiagnosticsSink>>) -> Self {
        Self { sinks }
    }
}

impl DiagnosticsSink for FanoutSink {
    fn report(&self, event: DiagnosticEvent) {
        for sink in &self.sinks {
            sink.report(event.clone());
        }
    }
}

/// Keeps events in memory, for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.kind).collect()
    }
}

impl DiagnosticsSink for MemorySink {
    fn report(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
