use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::models::WebhookPayload;

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);

/// One POST of a payload. Returns the response status code; transport
/// failures (DNS, refused connection, ...) are errors.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, url: &str, payload: &WebhookPayload) -> anyhow::Result<u16>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(&self, url: &str, payload: &WebhookPayload) -> anyhow::Result<u16> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .context("failed to send webhook")?;

        Ok(response.status().as_u16())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryState {
    Attempting(u32),
    Backoff(u32),
    Succeeded,
    Exhausted,
}

/// What happened during one delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: bool,
    pub attempts: u32,
    pub waits: Vec<Duration>,
}

/// Best-effort webhook delivery with a bounded number of attempts.
///
/// Failed attempts are followed by a pause of `backoff_base * attempt`
/// (1x, 2x, ...) unless the attempt budget is spent. Nothing is ever
/// returned as an error: callers only learn whether delivery succeeded.
pub struct WebhookDispatcher {
    transport: Box<dyn WebhookTransport>,
    retries: u32,
    backoff_base: Duration,
}

impl WebhookDispatcher {
    pub fn new(transport: Box<dyn WebhookTransport>) -> Self {
        Self {
            transport,
            retries: DEFAULT_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub async fn send(&self, url: &str, payload: &WebhookPayload) -> bool {
        self.send_with_retries(url, payload, self.retries).await
    }

    pub async fn send_with_retries(&self, url: &str, payload: &WebhookPayload, retries: u32) -> bool {
        self.deliver(url, payload, retries).await.delivered
    }

    pub async fn deliver(&self, url: &str, payload: &WebhookPayload, retries: u32) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if !is_valid_url(url) {
            tracing::warn!(url = %url, "webhook URL not configured or invalid");
            return report;
        }

        let mut state = DeliveryState::Attempting(1);
        loop {
            state = match state {
                DeliveryState::Attempting(n) if n > retries => DeliveryState::Exhausted,
                DeliveryState::Attempting(n) => {
                    report.attempts = n;
                    match self.transport.post_json(url, payload).await {
                        Ok(status) if (200..300).contains(&status) => DeliveryState::Succeeded,
                        Ok(status) => {
                            tracing::error!(status, attempt = n, "webhook failed with status");
                            DeliveryState::Backoff(n)
                        }
                        Err(e) => {
                            tracing::error!(error = %e, attempt = n, "webhook attempt failed");
                            DeliveryState::Backoff(n)
                        }
                    }
                }
                DeliveryState::Backoff(n) if n >= retries => DeliveryState::Exhausted,
                DeliveryState::Backoff(n) => {
                    let wait = self.backoff_base * n;
                    report.waits.push(wait);
                    tokio::time::sleep(wait).await;
                    DeliveryState::Attempting(n + 1)
                }
                DeliveryState::Succeeded => {
                    report.delivered = true;
                    break;
                }
                DeliveryState::Exhausted => {
                    tracing::warn!(url = %url, attempts = report.attempts, "webhook delivery gave up");
                    break;
                }
            };
        }

        report
    }

    /// Fire-and-forget delivery on the runtime. The handle is only useful to
    /// tests; request handlers drop it.
    pub fn dispatch(self: &Arc<Self>, url: String, payload: WebhookPayload) -> JoinHandle<bool> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let delivered = dispatcher.send(&url, &payload).await;
            tracing::debug!(event = ?payload.event, delivered, "webhook dispatch finished");
            delivered
        })
    }
}

fn is_valid_url(url: &str) -> bool {
    !url.is_empty() && url.starts_with("http")
}
