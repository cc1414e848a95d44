//! HTTP client for the stats API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use progress_core::StatsRecord;

use super::{RemoteError, StatsRemote};
use crate::types::SessionReport;

/// Stats API client over `reqwest`.
///
/// Every request carries the configured timeout; a timed-out request surfaces
/// as [`RemoteError::Timeout`].
pub struct HttpStatsRemote {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpStatsRemote {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, RemoteError> {
        let base_url =
            Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_success_body(response: reqwest::Response) -> Result<String, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

/// Decode a stats document, with or without a `{"data": {...}}` envelope.
pub(crate) fn decode_record(body: &str) -> Result<StatsRecord, RemoteError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| RemoteError::Decode(format!("{e}. Raw response: {body}")))?;

    let document = match value {
        serde_json::Value::Object(mut map) if map.get("data").is_some_and(|d| d.is_object()) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };

    serde_json::from_value(document).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl StatsRemote for HttpStatsRemote {
    async fn fetch_stats(&self, user_id: &str) -> Result<StatsRecord, RemoteError> {
        let url = self.endpoint(&["user", "stats", user_id]);
        tracing::debug!("Fetching stats for {} from {}", user_id, url);

        let response = self.http_client.get(url).send().await?;
        let body = Self::read_success_body(response).await?;

        let mut record = decode_record(&body)?;
        if record.user_id.is_empty() {
            record.user_id = user_id.to_owned();
        }
        Ok(record)
    }

    async fn push_stats(&self, record: &StatsRecord) -> Result<StatsRecord, RemoteError> {
        let url = self.endpoint(&["user", "stats"]);
        tracing::debug!("Pushing stats for {} to {}", record.user_id, url);

        let response = self.http_client.post(url).json(record).send().await?;
        let body = Self::read_success_body(response).await?;

        // the write has landed even when the echo is unreadable
        match decode_record(&body) {
            Ok(mut stored) => {
                if stored.user_id.is_empty() {
                    stored.user_id = record.user_id.clone();
                }
                Ok(stored)
            }
            Err(err) => {
                tracing::debug!("Ignoring unreadable push response: {}", err);
                Ok(record.clone())
            }
        }
    }

    async fn finish_session(&self, report: &SessionReport) -> Result<(), RemoteError> {
        let url = self.endpoint(&["progress", "finish"]);
        tracing::debug!("Reporting finished session for {} to {}", report.user_id, url);

        let response = self.http_client.post(url).json(report).send().await?;
        Self::read_success_body(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_user_id() {
        let remote =
            HttpStatsRemote::new("https://api.example.com/v1/", Duration::from_secs(1)).unwrap();
        let url = remote.endpoint(&["user", "stats", "a b/c"]);
        assert_eq!(url.as_str(), "https://api.example.com/v1/user/stats/a%20b%2Fc");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(
            HttpStatsRemote::new("mailto:someone@example.com", Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn decodes_bare_and_enveloped_documents() {
        let bare = decode_record(r#"{"userId":"u1","xp":120}"#).unwrap();
        assert_eq!(bare.xp, Some(120));

        let wrapped = decode_record(r#"{"success":true,"data":{"userId":"u1","xp":120}}"#).unwrap();
        assert_eq!(wrapped, bare);

        assert!(matches!(decode_record("<html>"), Err(RemoteError::Decode(_))));
    }
}
