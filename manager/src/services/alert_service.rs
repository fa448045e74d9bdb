use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::alerts;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum AlertType {
    BackupFailed,
    CycleError,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum AlertSeverity {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub timestamp: DateTime<Utc>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub hostname: String,
    pub details: Option<serde_json::Value>,
}

/// Posts backup alerts to a webhook. With an empty URL every alert is
/// dropped after a debug log.
#[derive(Clone)]
pub struct AlertService {
    webhook_url: String,
    hostname: String,
    client: Client,
}

impl AlertService {
    pub fn new(webhook_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(alerts::WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client for AlertService: {}", e))?;

        Ok(Self {
            webhook_url,
            hostname: local_hostname(),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    /// Delivery problems are logged and swallowed; an alert never fails the caller
    pub async fn send_alert(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
        details: Option<serde_json::Value>,
    ) {
        let payload = AlertPayload {
            timestamp: Utc::now(),
            alert_type,
            severity,
            message,
            hostname: self.hostname.clone(),
            details,
        };

        self.send_webhook(&payload).await;
    }

    async fn send_webhook(&self, payload: &AlertPayload) {
        if !self.is_enabled() {
            debug!("No webhook URL configured, skipping alert: {}", payload.message);
            return;
        }

        match self.client.post(&self.webhook_url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Alert sent: {:?} ({:?})", payload.alert_type, payload.severity);
            }
            Ok(response) => {
                warn!(
                    "Alert webhook returned status {} for {:?}",
                    response.status(),
                    payload.alert_type
                );
            }
            Err(e) if e.is_timeout() => {
                warn!("Alert webhook timeout for {:?}", payload.alert_type);
            }
            Err(e) => {
                warn!("Failed to send alert {:?}: {}", payload.alert_type, e);
            }
        }
    }
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
