//! HttpNotifier - email API への通知
//!
//! Notify 系の email API（`POST {base_url}/v2/notifications/email`）に
//! template id と personalisation を JSON で送ります。
//! 宛先は namespace ごとの override、なければ default recipient。
//!
//! テンプレートの描画は API 側の責務です。ここでは変数を埋めて渡すだけ。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ReaperError;
use crate::ports::{Notice, Notifier};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DELETE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub base_url: String,
    pub api_key: String,
    pub template_id: String,
    pub default_recipient: Option<String>,

    /// namespace -> email address
    pub recipients: HashMap<String, String>,
}

impl EmailConfig {
    pub fn recipient_for(&self, namespace: &str) -> Option<&str> {
        self.recipients
            .get(namespace)
            .map(String::as_str)
            .or(self.default_recipient.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    email_address: &'a str,
    template_id: &'a str,
    personalisation: Personalisation<'a>,
}

#[derive(Debug, Serialize)]
struct Personalisation<'a> {
    namespace: &'a str,
    claim: &'a str,
    days_left: i64,
    grace_period: u32,
    delete_date: String,
}

pub struct HttpNotifier {
    client: Client,
    config: EmailConfig,
}

impl HttpNotifier {
    pub fn new(config: EmailConfig) -> Result<Self, ReaperError> {
        if config.base_url.is_empty() || config.template_id.is_empty() {
            return Err(ReaperError::Config(
                "email base_url and template_id are required".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReaperError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v2/notifications/email",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), ReaperError> {
        let namespace = notice.claim.namespace.as_str();
        let Some(recipient) = self.config.recipient_for(namespace) else {
            return Err(ReaperError::NotFound {
                kind: "recipient",
                namespace: namespace.to_string(),
                name: notice.claim.name.clone(),
            });
        };

        let body = EmailRequest {
            email_address: recipient,
            template_id: &self.config.template_id,
            personalisation: Personalisation {
                namespace,
                claim: &notice.claim.name,
                days_left: notice.days_left,
                grace_period: notice.grace_period_days,
                delete_date: notice.delete_after.format(DELETE_DATE_FORMAT).to_string(),
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("ApiKey-v1 {}", self.config.api_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ReaperError::Transport(format!("email request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ReaperError::Transport(format!(
                "email API error ({status}): {text}"
            )));
        }

        debug!(claim = %notice.claim, recipient, "email accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClaimKey;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one request with `status` and `body`; yields the raw request.
    async fn one_shot_server(
        status: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8(raw).unwrap()
        });

        (base_url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= end + 4 + content_length
    }

    fn notifier(base_url: String, recipient: Option<&str>) -> HttpNotifier {
        HttpNotifier::new(EmailConfig {
            base_url,
            api_key: "secret-key".to_string(),
            template_id: "tpl-1".to_string(),
            default_recipient: recipient.map(str::to_string),
            ..EmailConfig::default()
        })
        .unwrap()
    }

    fn notice() -> Notice {
        let orphaned_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Notice {
            claim: ClaimKey::new("team-a", "data-db-0"),
            checkpoint: 0,
            days_left: 6,
            grace_period_days: 10,
            orphaned_at,
            delete_after: orphaned_at + chrono::Duration::days(11),
        }
    }

    #[tokio::test]
    async fn accepted_email_posts_template_and_personalisation() {
        let (base_url, server) = one_shot_server("202 Accepted", "{}").await;

        notifier(base_url, Some("owner@example.com"))
            .send(&notice())
            .await
            .unwrap();

        let raw = server.await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let head = head.to_ascii_lowercase();
        assert!(head.starts_with("post /v2/notifications/email "));
        assert!(head.contains("authorization: apikey-v1 secret-key"));
        assert!(head.contains("content-type: application/json"));

        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "email_address": "owner@example.com",
                "template_id": "tpl-1",
                "personalisation": {
                    "namespace": "team-a",
                    "claim": "data-db-0",
                    "days_left": 6,
                    "grace_period": 10,
                    "delete_date": "2024-06-12",
                }
            })
        );
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let (base_url, server) =
            one_shot_server("500 Internal Server Error", r#"{"error":"boom"}"#).await;

        let err = notifier(base_url, Some("owner@example.com"))
            .send(&notice())
            .await
            .unwrap_err();
        assert!(matches!(&err, ReaperError::Transport(msg) if msg.contains("500")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_recipient_is_not_found_without_a_request() {
        let err = notifier("http://127.0.0.1:9".to_string(), None)
            .send(&notice())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn namespace_override_wins_over_default() {
        let config = EmailConfig {
            default_recipient: Some("ops@example.com".to_string()),
            recipients: HashMap::from([("team-a".to_string(), "a@example.com".to_string())]),
            ..EmailConfig::default()
        };
        assert_eq!(config.recipient_for("team-a"), Some("a@example.com"));
        assert_eq!(config.recipient_for("team-b"), Some("ops@example.com"));
    }

    #[test]
    fn missing_endpoint_is_config_error() {
        assert!(matches!(
            HttpNotifier::new(EmailConfig::default()),
            Err(ReaperError::Config(_))
        ));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let notifier = HttpNotifier::new(EmailConfig {
            base_url: "https://notify.example.com/".to_string(),
            template_id: "tpl".to_string(),
            ..EmailConfig::default()
        })
        .unwrap();
        assert_eq!(
            notifier.endpoint(),
            "https://notify.example.com/v2/notifications/email"
        );
    }
}
