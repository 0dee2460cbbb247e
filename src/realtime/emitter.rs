use super::protocol::{EmitRequest, RelayEvent};
use super::relay_http::RELAY_SECRET_HEADER;
use crate::config::RelayTarget;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fire-and-forget client for the relay's `/emit` endpoint.
/// Failures are logged and never reach the request that triggered them.
#[derive(Clone)]
pub struct RelayEmitter {
    client: reqwest::Client,
    endpoint: Option<String>,
    secret: Option<String>,
}

impl RelayEmitter {
    pub fn new(target: &RelayTarget) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: target
                .url
                .as_ref()
                .map(|url| format!("{}/emit", url.trim_end_matches('/'))),
            secret: target.secret.clone(),
        }
    }

    /// Emitter that drops every event
    pub fn disabled() -> Self {
        Self::new(&RelayTarget::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Push `event` into room `trip:{trip_id}` in the background
    pub fn emit(&self, trip_id: Uuid, event: RelayEvent, data: Value) {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => return,
        };

        let body = EmitRequest {
            trip_id: trip_id.to_string(),
            event: event.as_str().to_string(),
            data,
        };
        let client = self.client.clone();
        let secret = self.secret.clone();

        tokio::spawn(async move {
            let mut request = client.post(&endpoint).json(&body);
            if let Some(secret) = secret {
                request = request.header(RELAY_SECRET_HEADER, secret);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Relayed {} for trip {}", body.event, body.trip_id);
                }
                Ok(response) => {
                    warn!(
                        "Relay rejected {} for trip {}: {}",
                        body.event,
                        body.trip_id,
                        response.status()
                    );
                }
                Err(e) => {
                    warn!("Failed to reach relay for {}: {}", body.event, e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let emitter = RelayEmitter::new(&RelayTarget {
            url: Some("http://relay:3002/".into()),
            secret: None,
        });
        assert!(emitter.is_enabled());
        assert_eq!(emitter.endpoint.as_deref(), Some("http://relay:3002/emit"));
    }

    #[tokio::test]
    async fn disabled_emitter_is_a_no_op() {
        let emitter = RelayEmitter::disabled();
        assert!(!emitter.is_enabled());
        emitter.emit(Uuid::new_v4(), RelayEvent::MessageSent, serde_json::json!({}));
    }
}
