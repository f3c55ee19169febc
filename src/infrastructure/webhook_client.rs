//! Webhook delivery over the shared HTTP client

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::domain::errors::DeliveryError;
use crate::domain::services::WebhookSink;
use crate::domain::sync_batch::DeliveryPayload;
use crate::infrastructure::http_client::{HttpClient, HttpError};

/// Posts the whole batch as one JSON document; any non-2xx is a failure
pub struct WebhookClient {
    http: Arc<HttpClient>,
    url: Url,
}

impl WebhookClient {
    pub const fn new(http: Arc<HttpClient>, url: Url) -> Self {
        Self { http, url }
    }
}

impl From<HttpError> for DeliveryError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Cancelled => Self::Cancelled,
            HttpError::Status { status, .. } => Self::Status { status },
            other => Self::Transport(other.to_string()),
        }
    }
}

#[async_trait]
impl WebhookSink for WebhookClient {
    async fn deliver(&self, payload: &DeliveryPayload<'_>) -> Result<(), DeliveryError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        self.http.post_json(&self.url, headers, payload).await?;

        tracing::info!(
            records = payload.meta.total_records,
            mode = %payload.meta.mode,
            "Webhook accepted batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sync_batch::SyncBatch;
    use crate::infrastructure::http_client::HttpClientConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_util::sync::CancellationToken;

    /// Answers exactly one request with `status_line` and an empty body
    async fn spawn_one_shot_http(status_line: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request).await;
            let response =
                format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.flush().await;
        });
        Url::parse(&format!("http://{addr}/hook")).unwrap()
    }

    async fn deliver_to(url: Url) -> Result<(), DeliveryError> {
        let http = HttpClient::new(HttpClientConfig::default(), CancellationToken::new()).unwrap();
        let batch = SyncBatch::default();
        let payload = DeliveryPayload::new(&batch, "project_21_portal", 21, "2_hour_incremental");
        WebhookClient::new(Arc::new(http), url).deliver(&payload).await
    }

    #[tokio::test]
    async fn test_error_status_fails_delivery() {
        let url = spawn_one_shot_http("503 Service Unavailable").await;
        let result = deliver_to(url).await;
        assert!(matches!(result, Err(DeliveryError::Status { status: 503 })));
    }

    #[tokio::test]
    async fn test_success_status_delivers() {
        let url = spawn_one_shot_http("200 OK").await;
        assert!(deliver_to(url).await.is_ok());
    }

    #[test]
    fn test_http_errors_map_to_delivery_errors() {
        let status: DeliveryError = HttpError::Status {
            url: "https://hooks.example.com".to_string(),
            status: 503,
        }
        .into();
        assert!(matches!(status, DeliveryError::Status { status: 503 }));

        let cancelled: DeliveryError = HttpError::Cancelled.into();
        assert!(matches!(cancelled, DeliveryError::Cancelled));

        let build: DeliveryError = HttpError::Build("bad".to_string()).into();
        assert!(matches!(build, DeliveryError::Transport(reason) if reason.contains("bad")));
    }
}
