use crate::utils::error::TransportError;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// Raw outcome of one HTTP exchange. Interpreting the body is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status,
            body: (!body.is_empty()).then_some(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_str(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Request primitive the registration flow is written against.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Request carrying the client's Basic credentials and an optional JSON body.
    async fn authenticated(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse, TransportError>;

    /// Credential-free request with URL-form parameters, used for the processor.
    async fn unauthenticated(
        &self,
        method: HttpMethod,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn api_version(&self) -> &str;
    fn client_id(&self) -> &str;
    fn user_id(&self) -> &str;
    fn tag(&self) -> &str;
}
