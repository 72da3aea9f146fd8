//! Probe logic.
//!
//! The target container is resolved to its address on the shared network
//! through the runtime. When the runtime does not know the container, the
//! identifier itself is used as a hostname.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ea_runtime::ContainerRuntime;
use http_body_util::{BodyExt, Full};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{ProbeError, ProbeResult};

#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Network whose container address is preferred.
    pub network: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Bound on handshake, send and body read together.
    pub request_timeout: Duration,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            network: "eas-net".to_string(),
            port: 1113,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves containers and sends one verification request.
#[derive(Clone)]
pub struct Prober {
    runtime: Arc<dyn ContainerRuntime>,
    config: ProberConfig,
}

impl Prober {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: ProberConfig) -> Self {
        Self { runtime, config }
    }

    pub fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// Host to contact for `container`: its shared-network address, or the
    /// identifier itself.
    pub async fn resolve_host(&self, container: &str) -> String {
        match self
            .runtime
            .container_address(container, &self.config.network)
            .await
        {
            Ok(Some(ip)) => ip.to_string(),
            Ok(None) => {
                debug!(%container, "not attached to shared network, using name as host");
                container.to_string()
            }
            Err(e) => {
                warn!(%container, error = %e, "address lookup failed, using name as host");
                container.to_string()
            }
        }
    }

    /// Probe on the configured default port.
    pub async fn probe(&self, container: &str, from: &str, to: &str) -> ProbeResult<String> {
        self.probe_on(container, self.config.port, from, to).await
    }

    pub async fn probe_on(
        &self,
        container: &str,
        port: u16,
        from: &str,
        to: &str,
    ) -> ProbeResult<String> {
        let host = self.resolve_host(container).await;
        let result = probe_endpoint(
            &host,
            port,
            from,
            to,
            self.config.connect_timeout,
            self.config.request_timeout,
        )
        .await?;
        info!(%container, %host, port, %from, %to, %result, "probe succeeded");
        Ok(result)
    }
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober").field("config", &self.config).finish_non_exhaustive()
    }
}

/// The JSON body sent to an adapter.
pub fn request_body(from: &str, to: &str) -> Value {
    json!({ "data": { "from": from, "to": to } })
}

/// Send one verification request to `host:port`.
pub async fn probe_endpoint(
    host: &str,
    port: u16,
    from: &str,
    to: &str,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> ProbeResult<String> {
    let address = format!("{host}:{port}");
    let unreachable = |reason: String| ProbeError::Unreachable {
        address: address.clone(),
        reason,
    };

    let stream = match tokio::time::timeout(
        connect_timeout,
        tokio::net::TcpStream::connect((host, port)),
    )
    .await
    {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => {
            debug!(error = %e, %address, "probe connection failed");
            return Err(unreachable(e.to_string()));
        }
        Err(_) => {
            debug!(%address, "probe connect timed out");
            return Err(unreachable(format!(
                "connect timed out after {connect_timeout:?}"
            )));
        }
    };

    let body = request_body(from, to).to_string();
    let exchange = async {
        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| unreachable(format!("handshake failed: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri("/")
            .header(http::header::HOST, address.as_str())
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::USER_AGENT, "ea-manager/0.1")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| unreachable(format!("bad request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| unreachable(format!("request failed: {e}")))?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| unreachable(format!("reading body failed: {e}")))?
            .to_bytes();
        Ok::<_, ProbeError>((status, bytes))
    };

    let (status, bytes) = match tokio::time::timeout(request_timeout, exchange).await {
        Ok(outcome) => outcome?,
        Err(_) => {
            debug!(%address, "probe request timed out");
            return Err(unreachable(format!(
                "no response within {request_timeout:?}"
            )));
        }
    };

    if !status.is_success() {
        debug!(%status, %address, "probe non-2xx");
    }
    extract_result(&bytes).map_err(|reason| ProbeError::MalformedResponse {
        address: address.clone(),
        reason: if status.is_success() {
            reason
        } else {
            format!("HTTP {status}: {reason}")
        },
    })
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    result: Option<Box<RawValue>>,
}

/// Pull `result` out of a reply body. Strings are returned without quotes;
/// other JSON values exactly as the adapter wrote them.
fn extract_result(body: &[u8]) -> Result<String, String> {
    let reply: Reply = serde_json::from_slice(body).map_err(|e| format!("not JSON: {e}"))?;
    let Some(raw) = reply.result else {
        return Err("missing \"result\" field".to_string());
    };
    let text = raw.get();
    if text.starts_with('"') {
        serde_json::from_str::<String>(text).map_err(|e| format!("bad result string: {e}"))
    } else {
        Ok(text.to_string())
    }
}
