use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use tnt_domain::TntError;
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with bounded retries and exponential backoff.
///
/// Retries 5xx responses and connect/timeout failures. Anything else is
/// returned to the caller on the first attempt.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

/// Outcome of a single attempt.
enum Attempt {
    Done(Response),
    Retry(Response),
    Failed(reqwest::Error),
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Total attempts per request, including the first.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder`, retrying transient failures.
    ///
    /// The body must be cloneable (JSON and string bodies are).
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, TntError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let request = Self::prepare(&builder)?;
            let last = attempt >= attempts;

            match self.attempt(request, attempt).await {
                Attempt::Done(response) => return Ok(response),
                Attempt::Retry(response) if last => return Ok(response),
                Attempt::Failed(err) if last || !is_retryable(&err) => {
                    return Err(InfraError::from(err).into());
                }
                Attempt::Retry(_) | Attempt::Failed(_) => {
                    self.sleep_with_backoff(attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    fn prepare(builder: &RequestBuilder) -> Result<Request, TntError> {
        let cloned = builder.try_clone().ok_or_else(|| {
            TntError::Internal("request body cannot be cloned; buffer it to enable retries".into())
        })?;
        cloned.build().map_err(|err| InfraError::from(err).into())
    }

    async fn attempt(&self, request: Request, attempt: usize) -> Attempt {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(attempt, %method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(attempt, %method, %url, %status, "received HTTP response");
                if status.is_server_error() {
                    Attempt::Retry(response)
                } else {
                    Attempt::Done(response)
                }
            }
            Err(err) => {
                debug!(attempt, %method, %url, error = %err, "HTTP request failed");
                Attempt::Failed(err)
            }
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let exponent = u32::try_from(retry_number.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1_u32 << exponent)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, TntError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| TntError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
