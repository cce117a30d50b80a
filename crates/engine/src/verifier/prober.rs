//! Network probe of a single URL

use async_trait::async_trait;
use linkforge_common::config::VerifierConfig;
use linkforge_common::errors::Result;
use reqwest::{redirect, Client, Method, StatusCode};
use thiserror::Error;

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 5;

/// Failure of one probe attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ProbeError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProbeError::Timeout | ProbeError::Connect(_) => true,
            ProbeError::Status(code) => *code == 429 || (500..=599).contains(code),
            ProbeError::TooManyRedirects | ProbeError::Request(_) | ProbeError::InvalidUrl(_) => false,
        }
    }

    /// Status code carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProbeError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Transport used by the verifier.
///
/// Returns the HTTP status of the final response; transport failures are
/// errors. Status classification happens in the caller.
#[async_trait]
pub trait LinkProber: Send + Sync {
    async fn probe(&self, url: &str) -> std::result::Result<u16, ProbeError>;
}

/// reqwest-backed prober
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(config: &VerifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    async fn send(&self, method: Method, url: &str) -> std::result::Result<u16, ProbeError> {
        self.client
            .request(method, url)
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(classify)
    }
}

#[async_trait]
impl LinkProber for HttpProber {
    async fn probe(&self, url: &str) -> std::result::Result<u16, ProbeError> {
        let status = self.send(Method::HEAD, url).await?;

        // Some servers refuse HEAD outright
        if status == StatusCode::METHOD_NOT_ALLOWED.as_u16()
            || status == StatusCode::NOT_IMPLEMENTED.as_u16()
        {
            return self.send(Method::GET, url).await;
        }

        Ok(status)
    }
}

fn classify(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Timeout
    } else if err.is_connect() {
        ProbeError::Connect(err.to_string())
    } else if err.is_redirect() {
        ProbeError::TooManyRedirects
    } else if err.is_builder() {
        ProbeError::InvalidUrl(err.to_string())
    } else {
        ProbeError::Request(err.to_string())
    }
}
