// Shared transport configuration for building reqwest::Client instances.
//
// Emby, Jellyfin and Discord clients share TLS and timeout settings
// through this module, and the response-decoding path lives here too so
// every client maps HTTP statuses to `Error` the same way.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::Error;

const USER_AGENT: &str = concat!("streamcord/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed media servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    ///
    /// Each API surface injects its own auth header here
    /// (`X-Emby-Token`, `X-MediaBrowser-Token`, `Authorization: Bot ...`).
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Map a response status to an `Error`, or hand back the response on success.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication {
            message: format!("server answered {status}"),
        }),
        StatusCode::NOT_FOUND => Err(Error::NotFound {
            path: resp.url().path().to_owned(),
        }),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok())
                .map_or(1, |secs| secs.ceil() as u64);
            Err(Error::RateLimited { retry_after_secs })
        }
        _ => {
            let message = resp.text().await.unwrap_or_default();
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Check the status, then decode a JSON body into `T`.
///
/// An empty body (HTTP 204 or zero-length 200) decodes as JSON `null`, so
/// callers asking for `Option<T>` or `serde_json::Value` get a value
/// instead of an error.
pub(crate) async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = check_status(resp).await?;
    let body = resp.text().await.map_err(Error::Transport)?;
    let text = if body.trim().is_empty() { "null" } else { body.as_str() };

    serde_json::from_str(text).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
