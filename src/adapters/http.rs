use crate::config::TransportConfig;
use crate::domain::ports::{HttpMethod, HttpResponse, Transport};
use crate::utils::error::{RegistrationError, Result, TransportError, TransportErrorKind};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use std::fmt;
use std::time::Duration;
use url::{Origin, Url};

/// Client id and secret used for Basic authentication against the payment API.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// `Transport` backed by a shared `reqwest::Client`.
///
/// Requests whose origin differs from the configured one are cross-origin;
/// with no configured origin every request is.
pub struct ReqwestTransport {
    client: Client,
    credentials: Credentials,
    origin: Option<Origin>,
    cross_origin_supported: bool,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RegistrationError::ConfigError {
                message: format!("Cannot build HTTP client: {}", e),
            })?;

        let origin = match &config.origin {
            Some(origin) => Some(
                Url::parse(origin)
                    .map_err(|e| RegistrationError::InvalidConfigValueError {
                        field: "transport.origin".to_string(),
                        value: origin.clone(),
                        reason: format!("Invalid URL format: {}", e),
                    })?
                    .origin(),
            ),
            None => None,
        };

        Ok(Self {
            client,
            credentials,
            origin,
            cross_origin_supported: config.cross_origin_supported,
        })
    }

    /// Parses the target and decides whether it may be contacted at all.
    fn prepare(&self, url: &str) -> std::result::Result<(Url, bool), TransportError> {
        let url = Url::parse(url).map_err(|e| {
            TransportError::with_detail(TransportErrorKind::RequestFailed, e.to_string())
        })?;

        let cross_origin = self
            .origin
            .as_ref()
            .map_or(true, |origin| *origin != url.origin());

        if cross_origin && !self.cross_origin_supported {
            tracing::warn!("🚫 Cross-origin request to {} refused", url.origin().ascii_serialization());
            return Err(TransportError::new(
                TransportErrorKind::CrossOriginUnsupported,
            ));
        }

        Ok((url, cross_origin))
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        cross_origin: bool,
    ) -> std::result::Result<HttpResponse, TransportError> {
        // Send; timeouts and connection failures end up in send_error
        let response = request
            .send()
            .await
            .map_err(|e| send_error(cross_origin, &e))?;

        // Any status is a response here, the caller interprets it
        let status = response.status().as_u16();
        // The processor answers in plain text, so read the raw body
        let body = response
            .text()
            .await
            .map_err(|e| send_error(cross_origin, &e))?;

        Ok(HttpResponse::new(status, body))
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
    }
}

fn send_error(cross_origin: bool, error: &reqwest::Error) -> TransportError {
    let kind = if cross_origin {
        TransportErrorKind::CrossOriginRequestFailed
    } else {
        TransportErrorKind::RequestFailed
    };
    let detail = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    tracing::error!("❌ HTTP request failed: {}", detail);
    TransportError::with_detail(kind, detail)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn authenticated(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let (url, cross_origin) = self.prepare(url)?;

        let mut request = self
            .client
            .request(to_method(method), url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            );
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request, cross_origin).await
    }

    async fn unauthenticated(
        &self,
        method: HttpMethod,
        url: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<HttpResponse, TransportError> {
        let (url, cross_origin) = self.prepare(url)?;

        let request = self.client.request(to_method(method), url);
        let request = match method {
            HttpMethod::Get => request.query(form),
            _ => request.form(form),
        };

        self.execute(request, cross_origin).await
    }
}
