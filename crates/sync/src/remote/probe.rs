//! Reachability probe over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::{Reachability, RemoteError};
use crate::api::Connectivity;

/// Probes the API health endpoint, then a well-known fallback URL.
///
/// Any 2xx answer from either means online. Transport errors, timeouts and
/// non-success statuses fall through to the next URL and finally to offline.
pub struct HttpProbe {
    targets: Vec<Url>,
    http_client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(
        health_url: Option<&str>,
        fallback_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let targets = [health_url, fallback_url]
            .into_iter()
            .flatten()
            .map(|raw| Url::parse(raw).map_err(|e| RemoteError::InvalidUrl(format!("{raw}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            targets,
            http_client,
        })
    }
}

#[async_trait]
impl Reachability for HttpProbe {
    async fn probe(&self) -> Connectivity {
        for url in &self.targets {
            match self.http_client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::trace!("Probe {} answered {}", url, response.status());
                    return Connectivity::Online;
                }
                Ok(response) => {
                    tracing::debug!("Probe {} answered {}", url, response.status());
                }
                Err(err) => {
                    tracing::debug!("Probe {} failed: {}", url, RemoteError::from(err));
                }
            }
        }
        Connectivity::Offline
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve `status` with an empty body to every connection.
    async fn answering(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}/health")
    }

    /// Loopback servers must not be routed through an ambient `HTTP_PROXY`.
    fn loopback_reachability(
        health: &str,
        fallback: Option<&str>,
        timeout: Duration,
    ) -> HttpProbe {
        let mut probe = HttpProbe::new(Some(health), fallback, timeout).unwrap();
        probe.http_client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .unwrap();
        probe
    }

    /// Accept connections and never answer them.
    async fn silent() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        format!("http://{addr}/health")
    }

    #[tokio::test]
    async fn no_targets_means_offline() {
        let probe = HttpProbe::new(None, None, Duration::from_millis(50)).unwrap();
        assert_eq!(probe.probe().await, Connectivity::Offline);
    }

    #[test]
    fn invalid_target_is_rejected() {
        assert!(HttpProbe::new(Some("not a url"), None, Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn healthy_endpoint_means_online() {
        let health = answering("200 OK").await;
        let probe = loopback_reachability(&health, None, Duration::from_secs(2));
        assert_eq!(probe.probe().await, Connectivity::Online);
    }

    #[tokio::test]
    async fn failing_health_check_falls_back_to_second_url() {
        let health = answering("500 Internal Server Error").await;
        let fallback = answering("204 No Content").await;
        let probe = loopback_reachability(&health, Some(&fallback), Duration::from_secs(2));
        assert_eq!(probe.probe().await, Connectivity::Online);
    }

    #[tokio::test]
    async fn both_urls_failing_means_offline() {
        let health = answering("500 Internal Server Error").await;
        let fallback = answering("503 Service Unavailable").await;
        let probe = loopback_reachability(&health, Some(&fallback), Duration::from_secs(2));
        assert_eq!(probe.probe().await, Connectivity::Offline);
    }

    #[tokio::test]
    async fn unresponsive_server_times_out_as_offline() {
        let health = silent().await;
        let probe = loopback_reachability(&health, None, Duration::from_millis(50));

        let started = Instant::now();
        assert_eq!(probe.probe().await, Connectivity::Offline);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
